//! DiscountCodeStore interface tests.
//!
//! These tests verify the contract of the DiscountCodeStore trait.
//! Each storage implementation should run these tests.

use academy_promo::model::{CodeType, MatchType, NewDiscountCode};
use academy_promo::storage::{DiscountCodeStore, StorageError};

// =============================================================================
// insert / get tests
// =============================================================================

pub async fn test_insert_and_get<S: DiscountCodeStore>(store: &S) {
    let created = store
        .insert(
            NewDiscountCode::prefix("T_ROUND", 12.5, 7)
                .for_email_prefix("magnus")
                .normalized(),
        )
        .await
        .expect("insert should succeed");

    assert!(created.id > 0);
    assert_eq!(created.used_count, 0);
    assert!(!created.created_at.is_empty());

    let fetched = store
        .get(created.id)
        .await
        .expect("get should succeed")
        .expect("code should exist");

    assert_eq!(fetched, created);
    assert_eq!(fetched.code, "T_ROUND");
    assert_eq!(fetched.code_type, CodeType::Prefix);
    assert_eq!(fetched.match_type, Some(MatchType::EmailPrefix));
    assert_eq!(fetched.prefix.as_deref(), Some("T_ROUND"));
    assert_eq!(fetched.email_prefix.as_deref(), Some("magnus"));
    assert_eq!(fetched.email_domain, None);
    assert_eq!(fetched.discount_percent, 12.5);
    assert_eq!(fetched.usage_limit, 7);
    assert!(fetched.is_active);
}

pub async fn test_get_nonexistent<S: DiscountCodeStore>(store: &S) {
    let result = store.get(i64::MAX).await.expect("get should succeed");
    assert!(result.is_none(), "nonexistent code should be None");
}

pub async fn test_find_by_code<S: DiscountCodeStore>(store: &S) {
    let created = store
        .insert(NewDiscountCode::manual("t_find", 10.0, 1).normalized())
        .await
        .unwrap();

    let found = store
        .find_by_code("T_FIND")
        .await
        .unwrap()
        .expect("code should be found by canonical text");
    assert_eq!(found.id, created.id);

    let missing = store.find_by_code("T_FIND_NOT").await.unwrap();
    assert!(missing.is_none());
}

pub async fn test_duplicate_code_rejected<S: DiscountCodeStore>(store: &S) {
    store
        .insert(NewDiscountCode::manual("T_DUP", 10.0, 1).normalized())
        .await
        .unwrap();

    let err = store
        .insert(NewDiscountCode::manual("t_dup", 50.0, 9).normalized())
        .await
        .expect_err("duplicate code must be rejected");
    assert!(
        matches!(err, StorageError::DuplicateCode(ref code) if code == "T_DUP"),
        "unexpected error: {err}"
    );
}

pub async fn test_inactive_flag_persists<S: DiscountCodeStore>(store: &S) {
    let created = store
        .insert(NewDiscountCode::manual("T_INACTIVE", 10.0, 1).inactive().normalized())
        .await
        .unwrap();
    assert!(!created.is_active);
    assert!(!store.get(created.id).await.unwrap().unwrap().is_active);
}

// =============================================================================
// listing tests
// =============================================================================

pub async fn test_list_ordered_by_id<S: DiscountCodeStore>(store: &S) {
    let a = store
        .insert(NewDiscountCode::manual("T_LIST_A", 10.0, 1).normalized())
        .await
        .unwrap();
    let b = store
        .insert(NewDiscountCode::manual("T_LIST_B", 10.0, 1).normalized())
        .await
        .unwrap();

    let all = store.list().await.unwrap();
    let ids: Vec<i64> = all.iter().map(|c| c.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted, "list should be ordered by id");

    let pos_a = ids.iter().position(|id| *id == a.id).expect("a listed");
    let pos_b = ids.iter().position(|id| *id == b.id).expect("b listed");
    assert!(pos_a < pos_b);
}

pub async fn test_list_prefix_codes_only_prefix<S: DiscountCodeStore>(store: &S) {
    let manual = store
        .insert(NewDiscountCode::manual("T_PFX_MANUAL", 10.0, 1).normalized())
        .await
        .unwrap();
    let prefix = store
        .insert(
            NewDiscountCode::prefix("T_PFX_", 10.0, 1)
                .for_domain("Club.org")
                .inactive()
                .normalized(),
        )
        .await
        .unwrap();

    let prefixes = store.list_prefix_codes().await.unwrap();
    assert!(prefixes.iter().all(|c| c.code_type == CodeType::Prefix));
    assert!(prefixes.iter().all(|c| c.id != manual.id));

    let listed = prefixes
        .iter()
        .find(|c| c.id == prefix.id)
        .expect("inactive prefix codes are still listed");
    assert_eq!(listed.email_domain.as_deref(), Some("club.org"));
    assert_eq!(listed.match_type, Some(MatchType::Domain));
}

// =============================================================================
// usage counter tests
// =============================================================================

pub async fn test_increment_respects_limit<S: DiscountCodeStore>(store: &S) {
    let code = store
        .insert(NewDiscountCode::manual("T_INC", 10.0, 2).normalized())
        .await
        .unwrap();

    assert_eq!(store.increment_usage(code.id).await.unwrap(), 1);
    assert_eq!(store.increment_usage(code.id).await.unwrap(), 1);
    assert_eq!(
        store.increment_usage(code.id).await.unwrap(),
        0,
        "increment past the limit must change nothing"
    );

    let stored = store.get(code.id).await.unwrap().unwrap();
    assert_eq!(stored.used_count, 2);
    assert!(stored.is_exhausted());
}

pub async fn test_concurrent_increments<S: DiscountCodeStore>(store: &S) {
    let code = store
        .insert(NewDiscountCode::manual("T_RACE", 10.0, 3).normalized())
        .await
        .unwrap();
    let id = code.id;

    let results = tokio::join!(
        store.increment_usage(id),
        store.increment_usage(id),
        store.increment_usage(id),
        store.increment_usage(id),
        store.increment_usage(id),
        store.increment_usage(id),
    );
    let changed: u64 = [results.0, results.1, results.2, results.3, results.4, results.5]
        .into_iter()
        .map(|r| r.expect("increment should succeed"))
        .sum();

    assert_eq!(changed, 3, "exactly usage_limit increments may succeed");
    assert_eq!(store.get(id).await.unwrap().unwrap().used_count, 3);
}

pub async fn test_decrement_floor<S: DiscountCodeStore>(store: &S) {
    let code = store
        .insert(NewDiscountCode::manual("T_DEC", 10.0, 2).normalized())
        .await
        .unwrap();

    assert_eq!(store.decrement_usage(code.id).await.unwrap(), 0);
    store.increment_usage(code.id).await.unwrap();
    assert_eq!(store.decrement_usage(code.id).await.unwrap(), 1);
    assert_eq!(store.get(code.id).await.unwrap().unwrap().used_count, 0);
}

// =============================================================================
// admin write tests
// =============================================================================

pub async fn test_set_active<S: DiscountCodeStore>(store: &S) {
    let code = store
        .insert(NewDiscountCode::manual("T_TOGGLE", 10.0, 1).normalized())
        .await
        .unwrap();

    assert_eq!(store.set_active(code.id, false).await.unwrap(), 1);
    assert!(!store.get(code.id).await.unwrap().unwrap().is_active);
    assert_eq!(store.set_active(code.id, true).await.unwrap(), 1);
    assert!(store.get(code.id).await.unwrap().unwrap().is_active);

    assert_eq!(store.set_active(i64::MAX, false).await.unwrap(), 0);
}

pub async fn test_delete<S: DiscountCodeStore>(store: &S) {
    let code = store
        .insert(NewDiscountCode::manual("T_DELETE", 10.0, 1).normalized())
        .await
        .unwrap();

    assert_eq!(store.delete(code.id).await.unwrap(), 1);
    assert!(store.get(code.id).await.unwrap().is_none());
    assert_eq!(store.delete(code.id).await.unwrap(), 0);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all DiscountCodeStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_discount_code_store_tests {
    ($store:expr) => {
        use $crate::storage::discount_store_tests::*;

        test_insert_and_get($store).await;
        println!("  test_insert_and_get: PASSED");

        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_find_by_code($store).await;
        println!("  test_find_by_code: PASSED");

        test_duplicate_code_rejected($store).await;
        println!("  test_duplicate_code_rejected: PASSED");

        test_inactive_flag_persists($store).await;
        println!("  test_inactive_flag_persists: PASSED");

        test_list_ordered_by_id($store).await;
        println!("  test_list_ordered_by_id: PASSED");

        test_list_prefix_codes_only_prefix($store).await;
        println!("  test_list_prefix_codes_only_prefix: PASSED");

        test_increment_respects_limit($store).await;
        println!("  test_increment_respects_limit: PASSED");

        test_concurrent_increments($store).await;
        println!("  test_concurrent_increments: PASSED");

        test_decrement_floor($store).await;
        println!("  test_decrement_floor: PASSED");

        test_set_active($store).await;
        println!("  test_set_active: PASSED");

        test_delete($store).await;
        println!("  test_delete: PASSED");
    };
}
