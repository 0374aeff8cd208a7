//! End-to-end checkout flows against in-memory SQLite.
//!
//! Run with: cargo test --test checkout_flow --features sqlite

use std::sync::Arc;

use academy_promo::config::{SqliteConfig, StorageConfig, StorageType};
use academy_promo::model::{NewDiscountCode, PaymentStatus};
use academy_promo::reconcile::PaymentConfirmation;
use academy_promo::services::{CodeValidation, DiscountSettlement, RegistrationSubmission};
use academy_promo::storage::{DiscountCodeStore, RegistrationStore};
use academy_promo::{init_storage, Config, PromoService};

async fn service() -> PromoService {
    let mut config = Config::for_test();
    config.storage = StorageConfig {
        storage_type: StorageType::Sqlite,
        sqlite: SqliteConfig {
            path: ":memory:".to_string(),
            ..SqliteConfig::default()
        },
        ..StorageConfig::default()
    };

    let stores = init_storage(&config.storage)
        .await
        .expect("Failed to initialize SQLite storage");
    PromoService::new(stores, &config)
}

fn submission(email: &str, amount: f64, code: Option<&str>) -> RegistrationSubmission {
    RegistrationSubmission {
        email: email.to_string(),
        amount,
        discount_code: code.map(str::to_string),
    }
}

async fn used_count(service: &PromoService, code_id: i64) -> i64 {
    service
        .stores()
        .codes
        .get(code_id)
        .await
        .unwrap()
        .unwrap()
        .used_count
}

#[tokio::test]
async fn test_separator_code_checkout() {
    let service = service().await;
    let code = service
        .create_code(NewDiscountCode::manual("TC1_", 10.0, 5))
        .await
        .unwrap();

    let validation = service
        .validate_code("tc1_student", 500.0, Some("pupil@school.edu"))
        .await
        .unwrap();
    let CodeValidation::Valid(quote) = validation else {
        panic!("expected the separator token to resolve");
    };
    assert_eq!(quote.resolved_code, "TC1_");
    assert_eq!(quote.discount_amount, 50.0);
    assert_eq!(quote.final_amount, 450.0);

    let reg = service
        .submit_registration(submission("pupil@school.edu", 500.0, Some("tc1_student")))
        .await
        .unwrap();
    assert_eq!(reg.discount_code.as_deref(), Some("TC1_STUDENT"));
    assert_eq!(reg.discount_code_id, Some(code.id));
    assert_eq!(reg.amount_paid, 450.0);

    service.attach_payment_order(reg.id, "order_tc1").await.unwrap();
    let outcome = service
        .confirm_payment(&PaymentConfirmation::for_order("order_tc1", "pay_tc1"))
        .await
        .unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.registration.payment_status, PaymentStatus::Completed);
    assert_eq!(outcome.discount, DiscountSettlement::Redeemed { code_id: code.id });
    assert_eq!(used_count(&service, code.id).await, 1);
}

#[tokio::test]
async fn test_concurrent_redemptions_respect_limit() {
    let service = Arc::new(service().await);
    let code = service
        .create_code(NewDiscountCode::manual("RUSH", 10.0, 4))
        .await
        .unwrap();
    let id = code.id;

    let handles: Vec<_> = (0..12)
        .map(move |_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.redeem_code(id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        if response.success {
            successes += 1;
        }
    }
    assert_eq!(successes, 4);
}

#[tokio::test]
async fn test_concurrent_confirmations_settle_within_limit() {
    let service = Arc::new(service().await);
    let code = service
        .create_code(NewDiscountCode::manual("FEW", 20.0, 2))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for i in 0..5 {
        let reg = service
            .submit_registration(submission(&format!("kid{i}@club.org"), 100.0, Some("FEW")))
            .await
            .unwrap();
        ids.push(reg.id);
    }

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .confirm_payment(&PaymentConfirmation::for_registration(id, format!("pay_{id}")))
                    .await
            })
        })
        .collect();

    let mut redeemed = 0;
    let mut revoked = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.registration.payment_status, PaymentStatus::Completed);
        match outcome.discount {
            DiscountSettlement::Redeemed { .. } => redeemed += 1,
            DiscountSettlement::Revoked { .. } => {
                assert_eq!(outcome.registration.discount_code, None);
                assert_eq!(outcome.registration.amount_paid, 80.0);
                revoked += 1;
            }
            DiscountSettlement::Untouched => panic!("every row carried a discount"),
        }
    }
    assert_eq!(redeemed, 2);
    assert_eq!(revoked, 3);
    assert_eq!(used_count(&service, code.id).await, 2);
}

#[tokio::test]
async fn test_duplicate_confirmation_writes_nothing() {
    let service = service().await;
    let reg = service
        .submit_registration(submission("dup@club.org", 300.0, None))
        .await
        .unwrap();
    service.attach_payment_order(reg.id, "order_dup").await.unwrap();

    let confirmation = PaymentConfirmation::for_order("order_dup", "pay_dup");
    let first = service.confirm_payment(&confirmation).await.unwrap();
    assert!(first.applied);

    let second = service.confirm_payment(&confirmation).await.unwrap();
    assert!(!second.applied);
    assert_eq!(second.registration.updated_at, first.registration.updated_at);

    let stored = service
        .stores()
        .registrations
        .get(reg.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, first.registration);
}

#[tokio::test]
async fn test_repair_only_touches_stuck_rows() {
    let service = service().await;
    let email = "family@club.org";

    let completed = service
        .submit_registration(submission(email, 100.0, None))
        .await
        .unwrap();
    service
        .confirm_payment(&PaymentConfirmation::for_registration(completed.id, "pay_done"))
        .await
        .unwrap();

    let failed = service
        .submit_registration(submission(email, 100.0, None))
        .await
        .unwrap();
    service.fail_payment(failed.id, "card declined").await.unwrap();

    let unpaid = service
        .submit_registration(submission(email, 100.0, None))
        .await
        .unwrap();

    let stuck = service
        .submit_registration(submission(email, 100.0, None))
        .await
        .unwrap();
    service
        .stores()
        .registrations
        .set_payment_id(stuck.id, "pay_stuck")
        .await
        .unwrap();

    let before = service.get_registrations_by_email(email).await.unwrap();
    assert_eq!(before.registrations.len(), 4);
    assert_eq!(before.counts.pending, 2);
    assert_eq!(before.stuck().count(), 1);

    let report = service
        .force_complete_pending_with_payment(email)
        .await
        .unwrap();
    assert_eq!(report.candidates, 1);
    assert_eq!(report.changed, 1);
    assert_eq!(report.completed[0].id, stuck.id);

    let after = service.get_registrations_by_email(email).await.unwrap();
    let status_of = |id: i64| {
        after
            .registrations
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.payment_status)
    };
    assert_eq!(status_of(completed.id), Some(PaymentStatus::Completed));
    assert_eq!(status_of(failed.id), Some(PaymentStatus::Failed));
    assert_eq!(status_of(unpaid.id), Some(PaymentStatus::Pending));
    assert_eq!(status_of(stuck.id), Some(PaymentStatus::Completed));

    let unchanged = |id: i64| {
        let old = before.registrations.iter().find(|r| r.id == id).unwrap();
        let new = after.registrations.iter().find(|r| r.id == id).unwrap();
        old == new
    };
    assert!(unchanged(completed.id));
    assert!(unchanged(failed.id));
    assert!(unchanged(unpaid.id));

    let again = service
        .force_complete_pending_with_payment(email)
        .await
        .unwrap();
    assert_eq!(again.candidates, 0);
    assert_eq!(again.changed, 0);
}

#[tokio::test]
async fn test_expire_stale_unpaid_registrations() {
    let service = service().await;
    let unpaid = service
        .submit_registration(submission("late@club.org", 100.0, None))
        .await
        .unwrap();
    let paid = service
        .submit_registration(submission("late@club.org", 100.0, None))
        .await
        .unwrap();
    service
        .stores()
        .registrations
        .set_payment_id(paid.id, "pay_late")
        .await
        .unwrap();

    let report = service.expire_stale_pending(chrono::Utc::now()).await.unwrap();
    assert!(report.expired.is_empty(), "fresh rows are left alone");

    let later = chrono::Utc::now() + chrono::Duration::days(2);
    let report = service.expire_stale_pending(later).await.unwrap();
    assert_eq!(report.expired, vec![unpaid.id]);
    assert!(report.failures.is_empty());

    let history = service.get_registrations_by_email("late@club.org").await.unwrap();
    assert_eq!(history.counts.failed, 1);
    assert_eq!(history.stuck().count(), 1);
}
