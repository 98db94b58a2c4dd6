//! PostgreSQL integration tests for the invoice store
//!
//! These run against a real database and are ignored by default. Point
//! `DATABASE_URL` at a disposable PostgreSQL instance and run with
//! `cargo test -p infra_db -- --ignored`.

use chrono::{Duration, TimeZone, Utc};

use core_kernel::Timezone;
use domain_invoicing::{advance, AdvanceContext, Frequency, InvoiceStatus, InvoiceStore};
use infra_db::{Lookups, PgInvoiceStore, MIGRATOR};
use test_utils::InvoiceBuilder;

async fn store() -> PgInvoiceStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = infra_db::create_pool_from_url(&url).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    let lookups = Lookups::load(&pool).await.unwrap();
    PgInvoiceStore::new(pool, lookups)
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn advancement_round_trips_through_postgres() {
    let store = store().await;
    let due = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let parent = InvoiceBuilder::new()
        .recurring(Frequency::Monthly, due)
        .build();
    let parent_id = parent.id;
    store.insert(&parent).await.unwrap();

    let candidates = store.due_candidates(due).await.unwrap();
    assert!(candidates.iter().any(|c| c.id == parent_id));

    let ctx = AdvanceContext::new(Timezone::default(), due, 1);
    let advancement = advance(&parent, &ctx).unwrap();
    store
        .persist_advancement(parent_id, &advancement)
        .await
        .unwrap();

    let reloaded = store.find(parent_id).await.unwrap();
    assert!(reloaded.completed_at.is_some());
    assert_eq!(reloaded.status, InvoiceStatus::Pending);
    assert_eq!(reloaded.next_occurrence_at, Some(due));

    let child = store.find(advancement.child.id).await.unwrap();
    assert_eq!(child.parent_invoice_id, Some(parent_id));
    assert_eq!(child.status, InvoiceStatus::Pending);

    // A second persist of the same advancement must conflict, not double-run
    let err = store
        .persist_advancement(parent_id, &advancement)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn completed_invoices_drop_out_of_the_candidate_query() {
    let store = store().await;
    let due = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

    let parent = InvoiceBuilder::new()
        .recurring(Frequency::Weekly, due)
        .build();
    let parent_id = parent.id;
    store.insert(&parent).await.unwrap();

    let ctx = AdvanceContext::new(Timezone::default(), due, 1);
    let advancement = advance(&parent, &ctx).unwrap();
    store
        .persist_advancement(parent_id, &advancement)
        .await
        .unwrap();

    let candidates = store.due_candidates(due + Duration::hours(1)).await.unwrap();
    assert!(!candidates.iter().any(|c| c.id == parent_id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn mark_sent_transitions_status() {
    let store = store().await;
    let due = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();

    let invoice = InvoiceBuilder::new()
        .recurring(Frequency::Monthly, due)
        .build();
    let id = invoice.id;
    store.insert(&invoice).await.unwrap();

    let sent_at = due + Duration::minutes(5);
    store.mark_sent(id, sent_at).await.unwrap();

    let reloaded = store.find(id).await.unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::Sent);
    assert_eq!(reloaded.last_sent_at, Some(sent_at));
}
