//! Create `cash_card` table.
//!
//! One row per card; `owner` is the login name of the caller who created it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashCard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashCard::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(double(CashCard::Amount).not_null())
                    .col(string_len(CashCard::Owner, 256).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CashCard::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum CashCard { Table, Id, Amount, Owner }
