//! Create certificate table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Certificate::VolunteerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificate::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::OrganizationId).string_len(32))
                    .col(ColumnDef::new(Certificate::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Certificate::Description).text())
                    .col(ColumnDef::new(Certificate::CertificateUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Certificate::IssuedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Certificate::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_volunteer")
                            .from(Certificate::Table, Certificate::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_post")
                            .from(Certificate::Table, Certificate::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (volunteer_id, post_id) - one certificate per participation
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_volunteer_post")
                    .table(Certificate::Table)
                    .col(Certificate::VolunteerId)
                    .col(Certificate::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    VolunteerId,
    PostId,
    OrganizationId,
    Title,
    Description,
    CertificateUrl,
    IssuedDate,
    Verified,
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
