use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20261018_000001_create_faculty_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Faculty::Table)
                    .col(
                        ColumnDef::new(Faculty::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Faculty::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Faculty::NameKey).string_len(50).not_null())
                    .col(ColumnDef::new(Faculty::Color).string_len(30).not_null())
                    .col(ColumnDef::new(Faculty::ColorKey).string_len(30).not_null())
                    .to_owned(),
            )
            .await?;

        // Case-insensitive name uniqueness
        manager
            .create_index(
                Index::create()
                    .name("idx_faculty_name_key")
                    .table(Faculty::Table)
                    .col(Faculty::NameKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_faculty_color_key")
                    .table(Faculty::Table)
                    .col(Faculty::ColorKey)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Faculty::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Faculty {
    Table,
    Id,
    Name,
    NameKey,
    Color,
    ColorKey,
}
