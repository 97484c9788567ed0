use sea_orm_migration::prelude::*;

use super::m20261018_000002_create_student_table::Student;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Avatar::Table)
                    .col(
                        ColumnDef::new(Avatar::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Avatar::StudentId).integer().not_null())
                    .col(ColumnDef::new(Avatar::FilePath).string().not_null())
                    .col(ColumnDef::new(Avatar::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Avatar::MediaType).string().not_null())
                    .col(ColumnDef::new(Avatar::Data).binary().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-avatar-student_id")
                            .from(Avatar::Table, Avatar::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one avatar per student
        manager
            .create_index(
                Index::create()
                    .name("idx_avatar_student_id")
                    .table(Avatar::Table)
                    .col(Avatar::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Avatar::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Avatar {
    Table,
    Id,
    StudentId,
    FilePath,
    FileSize,
    MediaType,
    Data,
}
