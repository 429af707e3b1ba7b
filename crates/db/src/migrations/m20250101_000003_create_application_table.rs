//! Create application table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Application::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Application::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Application::VolunteerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Application::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Application::Message).text())
                    .col(
                        ColumnDef::new(Application::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Application::AttendanceStatus)
                            .string_len(16)
                            .not_null()
                            .default("NOT_MARKED"),
                    )
                    .col(ColumnDef::new(Application::AttendanceMarkedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Application::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_volunteer")
                            .from(Application::Table, Application::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_post")
                            .from(Application::Table, Application::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (volunteer_id, post_id) - one application per post
        manager
            .create_index(
                Index::create()
                    .name("idx_application_volunteer_post")
                    .table(Application::Table)
                    .col(Application::VolunteerId)
                    .col(Application::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (applications of a post, bulk certificate issuance)
        manager
            .create_index(
                Index::create()
                    .name("idx_application_post_id")
                    .table(Application::Table)
                    .col(Application::PostId)
                    .to_owned(),
            )
            .await?;

        // Index: (volunteer_id, attendance_status, attendance_marked_at) - absence window count
        manager
            .create_index(
                Index::create()
                    .name("idx_application_volunteer_attendance")
                    .table(Application::Table)
                    .col(Application::VolunteerId)
                    .col(Application::AttendanceStatus)
                    .col(Application::AttendanceMarkedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Application::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Application {
    Table,
    Id,
    VolunteerId,
    PostId,
    Message,
    Status,
    AttendanceStatus,
    AttendanceMarkedAt,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
