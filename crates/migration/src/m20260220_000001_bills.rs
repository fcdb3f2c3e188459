use sea_orm_migration::prelude::*;

use crate::m20260210_000001_users::Users;
use crate::m20260210_000002_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Bills {
    Table,
    Id,
    Name,
    TotalMinor,
    SplitType,
    DueDate,
    Status,
    CreatedBy,
    CategoryId,
    Note,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum BillParticipants {
    Table,
    Id,
    BillId,
    UserId,
    AmountOwedMinor,
    IsPaid,
    PaidAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Bills::Name).string().not_null())
                    .col(ColumnDef::new(Bills::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Bills::SplitType).string().not_null())
                    .col(ColumnDef::new(Bills::DueDate).timestamp().not_null())
                    .col(ColumnDef::new(Bills::Status).string().not_null())
                    .col(ColumnDef::new(Bills::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Bills::CategoryId).string().not_null())
                    .col(ColumnDef::new(Bills::Note).string())
                    .col(ColumnDef::new(Bills::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-created_by")
                            .from(Bills::Table, Bills::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-category_id")
                            .from(Bills::Table, Bills::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-created_by")
                    .table(Bills::Table)
                    .col(Bills::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Participants are owned by their bill: the cascade is explicit so
        // deleting a bill can never orphan settlement rows.
        manager
            .create_table(
                Table::create()
                    .table(BillParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillParticipants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillParticipants::BillId).string().not_null())
                    .col(ColumnDef::new(BillParticipants::UserId).string().not_null())
                    .col(
                        ColumnDef::new(BillParticipants::AmountOwedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillParticipants::IsPaid)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillParticipants::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_participants-bill_id")
                            .from(BillParticipants::Table, BillParticipants::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_participants-user_id")
                            .from(BillParticipants::Table, BillParticipants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bill_participants-bill_id-user_id")
                    .table(BillParticipants::Table)
                    .col(BillParticipants::BillId)
                    .col(BillParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await
    }
}
