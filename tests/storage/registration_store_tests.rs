//! RegistrationStore interface tests.
//!
//! These tests verify the contract of the RegistrationStore trait.
//! Each storage implementation should run these tests.

use academy_promo::model::{timestamp, NewRegistration, PaymentStatus};
use academy_promo::storage::RegistrationStore;

fn registration(email: &str) -> NewRegistration {
    NewRegistration {
        email: email.to_string(),
        amount_requested: 500.0,
        discount_code: None,
        discount_code_id: None,
        discount_amount: 0.0,
        amount_paid: 500.0,
    }
}

fn discounted(email: &str, code: &str, code_id: i64) -> NewRegistration {
    NewRegistration {
        email: email.to_string(),
        amount_requested: 500.0,
        discount_code: Some(code.to_string()),
        discount_code_id: Some(code_id),
        discount_amount: 50.0,
        amount_paid: 450.0,
    }
}

// =============================================================================
// insert / lookup tests
// =============================================================================

pub async fn test_insert_and_get<S: RegistrationStore>(store: &S) {
    let created = store
        .insert(discounted("  Insert@Club.ORG ", "TC1_STUDENT", 11))
        .await
        .expect("insert should succeed");

    assert!(created.id > 0);
    assert_eq!(created.email, "insert@club.org");
    assert_eq!(created.payment_status, PaymentStatus::Pending);
    assert_eq!(created.order_id, None);
    assert_eq!(created.payment_id, None);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store
        .get(created.id)
        .await
        .expect("get should succeed")
        .expect("registration should exist");
    assert_eq!(fetched, created);
    assert_eq!(fetched.discount_code.as_deref(), Some("TC1_STUDENT"));
    assert_eq!(fetched.discount_code_id, Some(11));
    assert_eq!(fetched.discount_amount, 50.0);
    assert_eq!(fetched.amount_paid, 450.0);

    assert!(store.get(i64::MAX).await.unwrap().is_none());
}

pub async fn test_find_by_gateway_references<S: RegistrationStore>(store: &S) {
    let created = store.insert(registration("refs@club.org")).await.unwrap();
    store.set_order_id(created.id, "order_refs").await.unwrap();
    store.set_payment_id(created.id, "pay_refs").await.unwrap();

    let by_order = store
        .find_by_order_id("order_refs")
        .await
        .unwrap()
        .expect("found by order id");
    assert_eq!(by_order.id, created.id);

    let by_payment = store
        .find_by_payment_id("pay_refs")
        .await
        .unwrap()
        .expect("found by payment id");
    assert_eq!(by_payment.id, created.id);

    assert!(store.find_by_order_id("order_none").await.unwrap().is_none());
    assert!(store.find_by_payment_id("pay_none").await.unwrap().is_none());
}

// =============================================================================
// guarded write tests
// =============================================================================

pub async fn test_set_order_id_only_while_pending<S: RegistrationStore>(store: &S) {
    let created = store.insert(registration("order@club.org")).await.unwrap();

    assert_eq!(store.set_order_id(created.id, "order_a").await.unwrap(), 1);
    assert_eq!(store.set_payment_id(created.id, "pay_order").await.unwrap(), 1);
    store
        .transition(created.id, PaymentStatus::Pending, PaymentStatus::Completed)
        .await
        .unwrap();

    assert_eq!(
        store.set_order_id(created.id, "order_b").await.unwrap(),
        0,
        "terminal rows keep their order"
    );
    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.order_id.as_deref(), Some("order_a"));

    assert_eq!(store.set_order_id(i64::MAX, "order_c").await.unwrap(), 0);
}

pub async fn test_set_payment_id_never_overwrites<S: RegistrationStore>(store: &S) {
    let created = store.insert(registration("payid@club.org")).await.unwrap();

    assert_eq!(store.set_payment_id(created.id, "pay_first").await.unwrap(), 1);
    assert_eq!(
        store.set_payment_id(created.id, "pay_first").await.unwrap(),
        1,
        "the same reference may be recorded again"
    );
    assert_eq!(
        store.set_payment_id(created.id, "pay_second").await.unwrap(),
        0,
        "a different reference must not replace the first"
    );

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_id.as_deref(), Some("pay_first"));
}

pub async fn test_transition_guards<S: RegistrationStore>(store: &S) {
    let created = store.insert(registration("guard@club.org")).await.unwrap();

    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await
            .unwrap(),
        0,
        "completion requires a payment reference"
    );

    store.set_payment_id(created.id, "pay_guard").await.unwrap();
    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Failed, PaymentStatus::Completed)
            .await
            .unwrap(),
        0,
        "the expected current status must match"
    );
    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await
            .unwrap(),
        0,
        "a second completion changes nothing"
    );

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Completed);
    assert!(stored.updated_at >= stored.created_at);
}

pub async fn test_fail_without_payment<S: RegistrationStore>(store: &S) {
    let created = store.insert(registration("fail@club.org")).await.unwrap();

    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Pending, PaymentStatus::Failed)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .transition(created.id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await
            .unwrap(),
        0
    );
    assert_eq!(store.set_payment_id(created.id, "pay_late").await.unwrap(), 0);

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Failed);
    assert_eq!(stored.payment_id, None);
}

pub async fn test_clear_discount_keeps_amount_paid<S: RegistrationStore>(store: &S) {
    let created = store
        .insert(discounted("clear@club.org", "CLEAR", 21))
        .await
        .unwrap();

    assert_eq!(store.clear_discount(created.id).await.unwrap(), 1);

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.discount_code, None);
    assert_eq!(stored.discount_code_id, None);
    assert_eq!(stored.discount_amount, 0.0);
    assert_eq!(stored.amount_paid, 450.0);
}

// =============================================================================
// listing tests
// =============================================================================

pub async fn test_list_by_email_newest_first<S: RegistrationStore>(store: &S) {
    let first = store.insert(registration("history@club.org")).await.unwrap();
    let second = store.insert(registration("HISTORY@club.org")).await.unwrap();
    store.insert(registration("other@club.org")).await.unwrap();

    let rows = store.list_by_email(" History@Club.org ").await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

pub async fn test_list_pending_with_payment<S: RegistrationStore>(store: &S) {
    let email = "stuck@club.org";
    let stuck = store.insert(registration(email)).await.unwrap();
    store.set_payment_id(stuck.id, "pay_stuck").await.unwrap();

    let unpaid = store.insert(registration(email)).await.unwrap();

    let done = store.insert(registration(email)).await.unwrap();
    store.set_payment_id(done.id, "pay_done").await.unwrap();
    store
        .transition(done.id, PaymentStatus::Pending, PaymentStatus::Completed)
        .await
        .unwrap();

    let failed = store.insert(registration(email)).await.unwrap();
    store.set_payment_id(failed.id, "pay_failed").await.unwrap();
    store
        .transition(failed.id, PaymentStatus::Pending, PaymentStatus::Failed)
        .await
        .unwrap();

    let rows = store.list_pending_with_payment(email).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![stuck.id]);
    assert!(!ids.contains(&unpaid.id));
}

pub async fn test_list_pending_without_payment_before<S: RegistrationStore>(store: &S) {
    let unpaid = store.insert(registration("stale@club.org")).await.unwrap();
    let paid = store.insert(registration("stale@club.org")).await.unwrap();
    store.set_payment_id(paid.id, "pay_stale").await.unwrap();

    let past = timestamp(chrono::Utc::now() - chrono::Duration::hours(1));
    let rows = store.list_pending_without_payment_before(&past).await.unwrap();
    assert!(rows.iter().all(|r| r.id != unpaid.id));

    let future = timestamp(chrono::Utc::now() + chrono::Duration::hours(1));
    let rows = store.list_pending_without_payment_before(&future).await.unwrap();
    assert!(rows.iter().any(|r| r.id == unpaid.id));
    assert!(rows.iter().all(|r| r.id != paid.id));
    assert!(rows
        .iter()
        .all(|r| r.payment_status == PaymentStatus::Pending && r.payment_id.is_none()));
}

pub async fn test_count_by_discount_code<S: RegistrationStore>(store: &S) {
    store
        .insert(discounted("count_a@club.org", "COUNTED", 31))
        .await
        .unwrap();
    let b = store
        .insert(discounted("count_b@club.org", "COUNTED", 31))
        .await
        .unwrap();

    assert_eq!(store.count_by_discount_code(31).await.unwrap(), 2);
    store.clear_discount(b.id).await.unwrap();
    assert_eq!(store.count_by_discount_code(31).await.unwrap(), 1);
    assert_eq!(store.count_by_discount_code(32).await.unwrap(), 0);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all RegistrationStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_registration_store_tests {
    ($store:expr) => {
        use $crate::storage::registration_store_tests::*;

        test_insert_and_get($store).await;
        println!("  test_insert_and_get: PASSED");

        test_find_by_gateway_references($store).await;
        println!("  test_find_by_gateway_references: PASSED");

        test_set_order_id_only_while_pending($store).await;
        println!("  test_set_order_id_only_while_pending: PASSED");

        test_set_payment_id_never_overwrites($store).await;
        println!("  test_set_payment_id_never_overwrites: PASSED");

        test_transition_guards($store).await;
        println!("  test_transition_guards: PASSED");

        test_fail_without_payment($store).await;
        println!("  test_fail_without_payment: PASSED");

        test_clear_discount_keeps_amount_paid($store).await;
        println!("  test_clear_discount_keeps_amount_paid: PASSED");

        test_list_by_email_newest_first($store).await;
        println!("  test_list_by_email_newest_first: PASSED");

        test_list_pending_with_payment($store).await;
        println!("  test_list_pending_with_payment: PASSED");

        test_list_pending_without_payment_before($store).await;
        println!("  test_list_pending_without_payment_before: PASSED");

        test_count_by_discount_code($store).await;
        println!("  test_count_by_discount_code: PASSED");
    };
}
