//! Secondary indexes for owner-scoped queries.
use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_cash_card::CashCard;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Every read is filtered by owner, listings additionally sort by amount
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cash_card_owner_amount")
                    .table(CashCard::Table)
                    .col(CashCard::Owner)
                    .col(CashCard::Amount)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_cash_card_owner_amount").table(CashCard::Table).to_owned())
            .await
    }
}
