//! Create penalty table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Penalty::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Penalty::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Penalty::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Penalty::Type).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Penalty::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Penalty::Reason).string_len(512).not_null())
                    .col(ColumnDef::new(Penalty::Description).text())
                    .col(ColumnDef::new(Penalty::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Penalty::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Penalty::ResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Penalty::IssuedBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_penalty_user")
                            .from(Penalty::Table, Penalty::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_penalty_issued_by")
                            .from(Penalty::Table, Penalty::IssuedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, status) - eligibility checks
        manager
            .create_index(
                Index::create()
                    .name("idx_penalty_user_status")
                    .table(Penalty::Table)
                    .col(Penalty::UserId)
                    .col(Penalty::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Penalty::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Penalty {
    Table,
    Id,
    UserId,
    Type,
    Status,
    Reason,
    Description,
    ExpiresAt,
    CreatedAt,
    ResolvedAt,
    IssuedBy,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
