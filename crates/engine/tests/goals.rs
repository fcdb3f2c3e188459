use engine::{EngineError, GoalStatus, NotificationKind};

mod support;

use support::engine_with_db;

#[tokio::test]
async fn add_to_target_completes_and_withdraw_regresses() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();

    let funded = engine
        .add_to_savings_goal(goal.id, 100_00, "alice")
        .await
        .unwrap();
    assert_eq!(funded.status, GoalStatus::Completed);
    assert_eq!(funded.current_minor, 100_00);

    let drained = engine
        .withdraw_from_savings_goal(goal.id, 30_00, "alice")
        .await
        .unwrap();
    assert_eq!(drained.current_minor, 70_00);
    assert_eq!(drained.status, GoalStatus::Active);
}

#[tokio::test]
async fn milestones_fire_in_order_and_achievement_at_target() {
    let (engine, notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();

    for amount_minor in [25_00, 25_00, 25_00, 25_00] {
        engine
            .add_to_savings_goal(goal.id, amount_minor, "alice")
            .await
            .unwrap();
    }

    assert_eq!(
        notifier.kinds(),
        vec![
            NotificationKind::SavingsGoalMilestone,
            NotificationKind::SavingsGoalMilestone,
            NotificationKind::SavingsGoalMilestone,
            NotificationKind::SavingsGoalAchieved,
        ]
    );
    let milestones: Vec<Option<i64>> = notifier
        .events()
        .iter()
        .map(|(_, _, payload)| payload["milestone_percent"].as_i64())
        .collect();
    assert_eq!(milestones, vec![Some(25), Some(50), Some(75), None]);
}

#[tokio::test]
async fn withdraw_clamps_at_zero() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();
    engine
        .add_to_savings_goal(goal.id, 20_00, "alice")
        .await
        .unwrap();

    let drained = engine
        .withdraw_from_savings_goal(goal.id, 50_00, "alice")
        .await
        .unwrap();
    assert_eq!(drained.current_minor, 0);
}

#[tokio::test]
async fn goals_are_hidden_from_other_users() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();

    let err = engine
        .add_to_savings_goal(goal.id, 10_00, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine.savings_goal(goal.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_goal_name_per_owner_is_rejected() {
    let (engine, _notifier, _db) = engine_with_db().await;
    engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();

    let err = engine
        .new_savings_goal("Vacation", 200_00, None, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // A different owner may reuse the name.
    assert!(
        engine
            .new_savings_goal("Vacation", 200_00, None, "bob")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let goal = engine
        .new_savings_goal("Vacation", 100_00, None, "alice")
        .await
        .unwrap();

    let err = engine
        .add_to_savings_goal(goal.id, 0, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = engine
        .withdraw_from_savings_goal(goal.id, -5, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
