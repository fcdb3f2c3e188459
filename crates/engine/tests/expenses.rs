use chrono::Utc;
use engine::{
    BucketTarget, CreateExpenseCmd, DistributionSpec, DistributionType, EngineError,
    GoalStatus, NotificationKind, UpdateExpenseCmd,
};
use uuid::Uuid;

mod support;

use support::{RecordingNotifier, count_rows, engine_with_db, engine_with_notifier};

fn spec(distribution: DistributionType, targets: &[Uuid]) -> DistributionSpec {
    targets.iter().fold(
        DistributionSpec::new(distribution),
        |spec, id| spec.target(BucketTarget::new(*id)),
    )
}

#[tokio::test]
async fn allocation_and_unlink_round_trip() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let budget = engine
        .new_budget("Groceries", 100_00, None, "alice")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            CreateExpenseCmd::new(50_00, "weekly shop", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[budget.id])),
            "alice",
        )
        .await
        .unwrap();

    let after_apply = engine.budget(budget.id, "alice").await.unwrap();
    assert_eq!(after_apply.spent_minor, 50_00);

    engine
        .unlink_expense(expense.id, "alice", &[budget.id], &[])
        .await
        .unwrap();
    let after_unlink = engine.budget(budget.id, "alice").await.unwrap();
    assert_eq!(after_unlink.spent_minor, 0);
}

#[tokio::test]
async fn delete_without_unlinking_reaches_the_same_end_state() {
    let (engine, _notifier, db) = engine_with_db().await;
    let budget = engine
        .new_budget("Groceries", 100_00, None, "alice")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            CreateExpenseCmd::new(50_00, "weekly shop", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[budget.id])),
            "alice",
        )
        .await
        .unwrap();

    engine.delete_expense(expense.id, "alice").await.unwrap();

    let after_delete = engine.budget(budget.id, "alice").await.unwrap();
    assert_eq!(after_delete.spent_minor, 0);
    assert_eq!(count_rows(&db, "expenses").await, 0);
    assert_eq!(count_rows(&db, "expense_budget_links").await, 0);
}

#[tokio::test]
async fn equal_split_hands_each_budget_the_full_amount() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let food = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();
    let shared = engine
        .new_budget("Shared", 100_00, None, "alice")
        .await
        .unwrap();

    engine
        .create_expense(
            CreateExpenseCmd::new(40_00, "takeaway", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[food.id, shared.id])),
            "alice",
        )
        .await
        .unwrap();

    // Both buckets claim the whole amount; that is the policy, not a bug.
    assert_eq!(engine.budget(food.id, "alice").await.unwrap().spent_minor, 40_00);
    assert_eq!(
        engine.budget(shared.id, "alice").await.unwrap().spent_minor,
        40_00
    );
}

#[tokio::test]
async fn half_distribution_halves_per_bucket() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let food = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();
    let shared = engine
        .new_budget("Shared", 100_00, None, "alice")
        .await
        .unwrap();

    engine
        .create_expense(
            CreateExpenseCmd::new(40_00, "takeaway", Utc::now())
                .budgets(spec(DistributionType::Half, &[food.id, shared.id])),
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(engine.budget(food.id, "alice").await.unwrap().spent_minor, 20_00);
    assert_eq!(
        engine.budget(shared.id, "alice").await.unwrap().spent_minor,
        20_00
    );
}

#[tokio::test]
async fn manual_distribution_sum_mismatch_is_rejected_with_no_side_effects() {
    let (engine, _notifier, db) = engine_with_db().await;
    let food = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();
    let shared = engine
        .new_budget("Shared", 100_00, None, "alice")
        .await
        .unwrap();

    let err = engine
        .create_expense(
            CreateExpenseCmd::new(100_00, "groceries", Utc::now()).budgets(
                DistributionSpec::new(DistributionType::Manual)
                    .target(BucketTarget::new(food.id).amount_minor(30_00))
                    .target(BucketTarget::new(shared.id).amount_minor(60_00)),
            ),
            "alice",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(count_rows(&db, "expenses").await, 0);
    assert_eq!(count_rows(&db, "expense_budget_links").await, 0);
    assert_eq!(engine.budget(food.id, "alice").await.unwrap().spent_minor, 0);
}

#[tokio::test]
async fn missing_bucket_mid_list_aborts_with_zero_side_effects() {
    let (engine, _notifier, db) = engine_with_db().await;
    let food = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();

    let err = engine
        .create_expense(
            CreateExpenseCmd::new(40_00, "takeaway", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[food.id, Uuid::new_v4()])),
            "alice",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound(_)));
    assert_eq!(count_rows(&db, "expenses").await, 0);
    assert_eq!(count_rows(&db, "expense_budget_links").await, 0);
    assert_eq!(engine.budget(food.id, "alice").await.unwrap().spent_minor, 0);
}

#[tokio::test]
async fn update_skips_already_linked_buckets() {
    let (engine, _notifier, db) = engine_with_db().await;
    let food = engine
        .new_budget("Food", 200_00, None, "alice")
        .await
        .unwrap();
    let shared = engine
        .new_budget("Shared", 200_00, None, "alice")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            CreateExpenseCmd::new(40_00, "takeaway", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[food.id])),
            "alice",
        )
        .await
        .unwrap();

    engine
        .update_expense(
            expense.id,
            UpdateExpenseCmd::new()
                .budgets(spec(DistributionType::EqualSplit, &[food.id, shared.id])),
            "alice",
        )
        .await
        .unwrap();

    // Resubmitting food applies nothing new; shared is linked once.
    assert_eq!(engine.budget(food.id, "alice").await.unwrap().spent_minor, 40_00);
    assert_eq!(
        engine.budget(shared.id, "alice").await.unwrap().spent_minor,
        40_00
    );
    assert_eq!(count_rows(&db, "expense_budget_links").await, 2);
}

#[tokio::test]
async fn update_patches_scalars_independently_of_links() {
    let (engine, _notifier, _db) = engine_with_db().await;

    let expense = engine
        .create_expense(CreateExpenseCmd::new(40_00, "takeaway", Utc::now()), "alice")
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            expense.id,
            UpdateExpenseCmd::new()
                .amount_minor(45_00)
                .description("late takeaway"),
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(updated.amount_minor, 45_00);
    assert_eq!(updated.description, "late takeaway");
}

#[tokio::test]
async fn budget_thresholds_notify_on_every_apply() {
    let (engine, notifier, _db) = engine_with_db().await;
    let budget = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();

    engine
        .create_expense(
            CreateExpenseCmd::new(85_00, "big shop", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[budget.id])),
            "alice",
        )
        .await
        .unwrap();
    engine
        .create_expense(
            CreateExpenseCmd::new(15_00, "top-up", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[budget.id])),
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(
        notifier.kinds(),
        vec![NotificationKind::BudgetAlert, NotificationKind::BudgetExceeded]
    );
}

#[tokio::test]
async fn notifier_failure_never_rolls_back_the_allocation() {
    let (engine, notifier, _db) = engine_with_notifier(RecordingNotifier::failing()).await;
    let budget = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();

    engine
        .create_expense(
            CreateExpenseCmd::new(90_00, "big shop", Utc::now())
                .budgets(spec(DistributionType::EqualSplit, &[budget.id])),
            "alice",
        )
        .await
        .unwrap();

    // The trigger fired and failed; the ledger mutation stands.
    assert_eq!(notifier.kinds(), vec![NotificationKind::BudgetAlert]);
    assert_eq!(engine.budget(budget.id, "alice").await.unwrap().spent_minor, 90_00);
}

#[tokio::test]
async fn goal_link_withdraws_and_reversal_restores_completion() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();
    engine
        .add_to_savings_goal(goal.id, 100_00, "alice")
        .await
        .unwrap();

    let expense = engine
        .create_expense(
            CreateExpenseCmd::new(30_00, "flight deposit", Utc::now())
                .savings_goals(spec(DistributionType::EqualSplit, &[goal.id])),
            "alice",
        )
        .await
        .unwrap();

    let drained = engine.savings_goal(goal.id, "alice").await.unwrap();
    assert_eq!(drained.current_minor, 70_00);
    assert_eq!(drained.status, GoalStatus::Active);

    engine.delete_expense(expense.id, "alice").await.unwrap();
    let restored = engine.savings_goal(goal.id, "alice").await.unwrap();
    assert_eq!(restored.current_minor, 100_00);
    assert_eq!(restored.status, GoalStatus::Completed);
}

#[tokio::test]
async fn unlinking_a_bucket_without_a_link_is_not_found() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let budget = engine
        .new_budget("Food", 100_00, None, "alice")
        .await
        .unwrap();

    let expense = engine
        .create_expense(CreateExpenseCmd::new(40_00, "takeaway", Utc::now()), "alice")
        .await
        .unwrap();

    let err = engine
        .unlink_expense(expense.id, "alice", &[budget.id], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn expense_mutations_are_owner_only() {
    let (engine, _notifier, _db) = engine_with_db().await;

    let expense = engine
        .create_expense(CreateExpenseCmd::new(40_00, "takeaway", Utc::now()), "alice")
        .await
        .unwrap();

    let err = engine.delete_expense(expense.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine
        .update_expense(expense.id, UpdateExpenseCmd::new().amount_minor(1), "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine
        .unlink_expense(expense.id, "bob", &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
