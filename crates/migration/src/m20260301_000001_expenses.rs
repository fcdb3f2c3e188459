use sea_orm_migration::prelude::*;

use crate::m20260210_000001_users::Users;
use crate::m20260210_000002_categories::Categories;
use crate::m20260215_000001_buckets::{Budgets, SavingsGoals};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Expenses {
    Table,
    Id,
    AmountMinor,
    Description,
    CategoryId,
    OccurredAt,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum ExpenseBudgetLinks {
    Table,
    Id,
    ExpenseId,
    BudgetId,
    AmountMinor,
}

#[derive(Iden)]
pub(crate) enum ExpenseGoalLinks {
    Table,
    Id,
    ExpenseId,
    SavingsGoalId,
    AmountMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).string())
                    .col(ColumnDef::new(Expenses::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-created_by")
                            .from(Expenses::Table, Expenses::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-created_by-occurred_at")
                    .table(Expenses::Table)
                    .col(Expenses::CreatedBy)
                    .col(Expenses::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // Link rows are owned by their expense (cascade); the bucket side
        // outlives the link and is never cascaded.
        manager
            .create_table(
                Table::create()
                    .table(ExpenseBudgetLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseBudgetLinks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBudgetLinks::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBudgetLinks::BudgetId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBudgetLinks::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_budget_links-expense_id")
                            .from(ExpenseBudgetLinks::Table, ExpenseBudgetLinks::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_budget_links-budget_id")
                            .from(ExpenseBudgetLinks::Table, ExpenseBudgetLinks::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_budget_links-expense_id-budget_id")
                    .table(ExpenseBudgetLinks::Table)
                    .col(ExpenseBudgetLinks::ExpenseId)
                    .col(ExpenseBudgetLinks::BudgetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseGoalLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseGoalLinks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseGoalLinks::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseGoalLinks::SavingsGoalId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseGoalLinks::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_goal_links-expense_id")
                            .from(ExpenseGoalLinks::Table, ExpenseGoalLinks::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_goal_links-savings_goal_id")
                            .from(ExpenseGoalLinks::Table, ExpenseGoalLinks::SavingsGoalId)
                            .to(SavingsGoals::Table, SavingsGoals::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_goal_links-expense_id-savings_goal_id")
                    .table(ExpenseGoalLinks::Table)
                    .col(ExpenseGoalLinks::ExpenseId)
                    .col(ExpenseGoalLinks::SavingsGoalId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpenseGoalLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseBudgetLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await
    }
}
