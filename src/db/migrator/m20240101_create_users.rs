use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// The bootstrap admin is not seeded here: it needs a random secret key and a
/// key file on disk, which the credential service handles at startup.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).text().not_null())
                    .col(ColumnDef::new(Users::SecretKey).text().not_null())
                    .col(ColumnDef::new(Users::IsAdmin).integer().default(0))
                    .to_owned(),
            )
            .await?;

        // Rows written by older builds may carry a NULL role flag.
        manager
            .exec_stmt(
                Query::update()
                    .table(Users::Table)
                    .value(Users::IsAdmin, 0)
                    .and_where(Expr::col(Users::IsAdmin).is_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    SecretKey,
    IsAdmin,
}
