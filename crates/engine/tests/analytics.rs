use chrono::{Duration, Utc};
use engine::{CreateBillCmd, CreateExpenseCmd, ParticipantShare, SplitType};

mod support;

use support::engine_with_db;

#[tokio::test]
async fn dashboard_summary_tracks_owed_amounts_and_counts() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let category_id = engine.new_category("Shared").await.unwrap();

    // Bob's bill: alice owes her 30.00 share.
    engine
        .create_bill(
            CreateBillCmd::new(
                "Dinner",
                60_00,
                SplitType::Equal,
                Utc::now() - Duration::days(60),
                category_id,
            )
            .participant(ParticipantShare::new("alice")),
            "bob",
        )
        .await
        .unwrap();

    // Alice's bill: 90.00 outstanding across all three participants.
    let rent = engine
        .create_bill(
            CreateBillCmd::new("Rent", 90_00, SplitType::Equal, Utc::now(), category_id)
                .participant(ParticipantShare::new("bob"))
                .participant(ParticipantShare::new("carol")),
            "alice",
        )
        .await
        .unwrap();

    let summary = engine.dashboard_summary("alice").await.unwrap();
    assert_eq!(summary.you_owe_minor, 30_00 + 30_00);
    assert_eq!(summary.owed_to_you_minor, 90_00);
    assert_eq!(summary.active_bills, 2);
    assert_eq!(summary.bills_this_month, 1);

    // Bob settles his rent share: alice is owed less.
    let bob_row = rent
        .participants
        .iter()
        .find(|p| p.user_id == "bob")
        .unwrap();
    engine
        .mark_payment_paid(rent.bill.id, bob_row.id, "bob")
        .await
        .unwrap();

    let summary = engine.dashboard_summary("alice").await.unwrap();
    assert_eq!(summary.owed_to_you_minor, 60_00);
    assert_eq!(summary.active_bills, 2);
}

#[tokio::test]
async fn completed_bills_leave_the_active_count() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let category_id = engine.new_category("Shared").await.unwrap();

    let details = engine
        .create_bill(
            CreateBillCmd::new("Rent", 60_00, SplitType::Equal, Utc::now(), category_id)
                .participant(ParticipantShare::new("bob")),
            "alice",
        )
        .await
        .unwrap();

    for participant in &details.participants {
        engine
            .mark_payment_paid(details.bill.id, participant.id, &participant.user_id)
            .await
            .unwrap();
    }

    let summary = engine.dashboard_summary("alice").await.unwrap();
    assert_eq!(summary.active_bills, 0);
    assert_eq!(summary.you_owe_minor, 0);
    assert_eq!(summary.owed_to_you_minor, 0);
}

#[tokio::test]
async fn bill_progress_reports_partial_settlement() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let category_id = engine.new_category("Shared").await.unwrap();

    let details = engine
        .create_bill(
            CreateBillCmd::new("Rent", 90_00, SplitType::Equal, Utc::now(), category_id)
                .participant(ParticipantShare::new("bob"))
                .participant(ParticipantShare::new("carol")),
            "alice",
        )
        .await
        .unwrap();

    engine
        .mark_payment_paid(details.bill.id, details.participants[0].id, "alice")
        .await
        .unwrap();

    let progress = engine.bill_progress(details.bill.id, "alice").await.unwrap();
    assert_eq!(progress.paid, 1);
    assert_eq!(progress.total, 3);
    assert!((progress.percent - 100.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn category_breakdown_groups_and_sorts_by_spend() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let food = engine.new_category("Food").await.unwrap();
    let travel = engine.new_category("Travel").await.unwrap();

    let now = Utc::now();
    for (amount_minor, category) in [
        (10_00, Some(food)),
        (25_00, Some(food)),
        (80_00, Some(travel)),
        (5_00, None),
    ] {
        let mut cmd = CreateExpenseCmd::new(amount_minor, "spend", now);
        if let Some(category_id) = category {
            cmd = cmd.category_id(category_id);
        }
        engine.create_expense(cmd, "alice").await.unwrap();
    }

    // Outside the window; must not show up.
    engine
        .create_expense(
            CreateExpenseCmd::new(999_00, "old spend", now - Duration::days(30))
                .category_id(food),
            "alice",
        )
        .await
        .unwrap();

    let breakdown = engine
        .category_breakdown("alice", now - Duration::days(1), now + Duration::days(1))
        .await
        .unwrap();

    let rows: Vec<(Option<String>, i64)> = breakdown
        .iter()
        .map(|row| (row.name.clone(), row.total_minor))
        .collect();
    assert_eq!(
        rows,
        vec![
            (Some("Travel".to_string()), 80_00),
            (Some("Food".to_string()), 35_00),
            (None, 5_00),
        ]
    );
}

#[tokio::test]
async fn category_breakdown_rejects_inverted_windows() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let now = Utc::now();
    assert!(
        engine
            .category_breakdown("alice", now, now - Duration::days(1))
            .await
            .is_err()
    );
}
