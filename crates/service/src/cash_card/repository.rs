use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order as DbOrder, QueryFilter, QueryOrder, QuerySelect};

use models::cash_card;

use super::domain::CashCard;
use crate::errors::ServiceError;
use crate::pagination::{Direction, PageRequest, SortField};

/// Storage seam for cash cards. Every lookup and mutation takes the owner, so
/// implementations filter by `(id, owner)` in the query itself.
#[async_trait]
pub trait CashCardRepository: Send + Sync {
    async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<CashCard>, ServiceError>;
    async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError>;
    /// One page of the owner's cards, ordered by `page.sort` plus an `id` tie-breaker.
    async fn find_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, ServiceError>;
    async fn insert(&self, amount: f64, owner: &str) -> Result<CashCard, ServiceError>;
    /// Returns false when no card with that id belongs to `owner`.
    async fn update_amount(&self, id: i64, owner: &str, amount: f64) -> Result<bool, ServiceError>;
    async fn delete_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmCashCardRepository {
    pub db: DatabaseConnection,
}

fn column_for(field: SortField) -> cash_card::Column {
    match field {
        SortField::Id => cash_card::Column::Id,
        SortField::Amount => cash_card::Column::Amount,
        SortField::Owner => cash_card::Column::Owner,
    }
}

#[async_trait]
impl CashCardRepository for SeaOrmCashCardRepository {
    async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<CashCard>, ServiceError> {
        let found = cash_card::find_by_id_and_owner(&self.db, id, owner).await?;
        Ok(found.map(CashCard::from))
    }

    async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError> {
        Ok(cash_card::exists_by_id_and_owner(&self.db, id, owner).await?)
    }

    async fn find_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, ServiceError> {
        let Some(offset) = page.checked_offset() else { return Ok(Vec::new()) };
        let mut finder = cash_card::Entity::find().filter(cash_card::Column::Owner.eq(owner));
        for o in page.sort.with_tie_breaker() {
            let dir = match o.direction { Direction::Asc => DbOrder::Asc, Direction::Desc => DbOrder::Desc };
            finder = finder.order_by(column_for(o.field), dir);
        }
        let rows = finder
            .limit(page.size)
            .offset(offset)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(rows.into_iter().map(CashCard::from).collect())
    }

    async fn insert(&self, amount: f64, owner: &str) -> Result<CashCard, ServiceError> {
        let created = cash_card::create(&self.db, amount, owner).await?;
        Ok(created.into())
    }

    async fn update_amount(&self, id: i64, owner: &str, amount: f64) -> Result<bool, ServiceError> {
        Ok(cash_card::update_amount(&self.db, id, owner, amount).await?)
    }

    async fn delete_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError> {
        Ok(cash_card::delete_by_id_and_owner(&self.db, id, owner).await?)
    }
}

/// In-process repository used by tests and the `memory` storage backend.
pub mod memory {
    use super::*;
    use std::cmp::Ordering;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    use crate::pagination::Order;

    struct Inner {
        cards: BTreeMap<i64, CashCard>,
        next_id: i64,
    }

    pub struct InMemoryCashCardRepository {
        inner: RwLock<Inner>,
    }

    impl Default for InMemoryCashCardRepository {
        fn default() -> Self { Self::with_cards(Vec::new()) }
    }

    impl InMemoryCashCardRepository {
        /// Start from existing cards, keeping their ids; new ids continue after the largest one.
        pub fn with_cards(cards: Vec<CashCard>) -> Self {
            let next_id = cards.iter().map(|c| c.id).max().unwrap_or(0) + 1;
            let cards = cards.into_iter().map(|c| (c.id, c)).collect();
            Self { inner: RwLock::new(Inner { cards, next_id }) }
        }
    }

    fn compare(a: &CashCard, b: &CashCard, orders: &[Order]) -> Ordering {
        for o in orders {
            let ord = match o.field {
                SortField::Id => a.id.cmp(&b.id),
                SortField::Amount => a.amount.total_cmp(&b.amount),
                SortField::Owner => a.owner.cmp(&b.owner),
            };
            let ord = match o.direction { Direction::Asc => ord, Direction::Desc => ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn owned<'a>(inner: &'a Inner, id: i64, owner: &str) -> Option<&'a CashCard> {
        inner.cards.get(&id).filter(|c| c.owner == owner)
    }

    #[async_trait]
    impl CashCardRepository for InMemoryCashCardRepository {
        async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<CashCard>, ServiceError> {
            let inner = self.inner.read().await;
            Ok(owned(&inner, id, owner).cloned())
        }

        async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError> {
            let inner = self.inner.read().await;
            Ok(owned(&inner, id, owner).is_some())
        }

        async fn find_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, ServiceError> {
            let inner = self.inner.read().await;
            let mut rows: Vec<CashCard> = inner.cards.values().filter(|c| c.owner == owner).cloned().collect();
            let orders = page.sort.with_tie_breaker();
            rows.sort_by(|a, b| compare(a, b, &orders));
            let Some(offset) = page.checked_offset() else { return Ok(Vec::new()) };
            let skip = usize::try_from(offset).unwrap_or(usize::MAX);
            let take = usize::try_from(page.size).unwrap_or(usize::MAX);
            Ok(rows.into_iter().skip(skip).take(take).collect())
        }

        async fn insert(&self, amount: f64, owner: &str) -> Result<CashCard, ServiceError> {
            cash_card::validate_amount(amount)?;
            cash_card::validate_owner(owner)?;
            let mut inner = self.inner.write().await;
            let id = inner.next_id;
            inner.next_id += 1;
            let card = CashCard { id, amount, owner: owner.to_string() };
            inner.cards.insert(id, card.clone());
            Ok(card)
        }

        async fn update_amount(&self, id: i64, owner: &str, amount: f64) -> Result<bool, ServiceError> {
            cash_card::validate_amount(amount)?;
            let mut inner = self.inner.write().await;
            match inner.cards.get_mut(&id) {
                Some(card) if card.owner == owner => {
                    card.amount = amount;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn delete_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, ServiceError> {
            let mut inner = self.inner.write().await;
            if owned(&inner, id, owner).is_none() {
                return Ok(false);
            }
            Ok(inner.cards.remove(&id).is_some())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryCashCardRepository;
    use super::*;
    use crate::pagination::{Order, PageLimits, Sort};

    fn card(id: i64, amount: f64, owner: &str) -> CashCard {
        CashCard { id, amount, owner: owner.into() }
    }

    #[tokio::test]
    async fn memory_ids_continue_after_seeded_rows() {
        let repo = InMemoryCashCardRepository::with_cards(vec![card(99, 1.0, "a"), card(101, 2.0, "a")]);
        let c = repo.insert(3.0, "a").await.unwrap();
        assert_eq!(c.id, 102);
    }

    #[tokio::test]
    async fn memory_equal_amounts_fall_back_to_id_order() {
        let repo = InMemoryCashCardRepository::with_cards(vec![
            card(3, 5.0, "a"),
            card(1, 5.0, "a"),
            card(2, 1.0, "a"),
        ]);
        let page = PageRequest::of(0, 10, Sort::by(vec![Order::desc(SortField::Amount)]));
        let ids: Vec<i64> = repo.find_by_owner("a", &page).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn memory_page_past_end_is_empty() {
        let repo = InMemoryCashCardRepository::with_cards(vec![card(1, 1.0, "a")]);
        let page = PageRequest::of(4, 10, Sort::unsorted());
        assert!(repo.find_by_owner("a", &page).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_unaddressable_page_is_empty() {
        let repo = InMemoryCashCardRepository::with_cards(vec![card(1, 1.0, "a")]);
        let page = PageRequest::of(u64::MAX, 100, Sort::unsorted());
        assert!(repo.find_by_owner("a", &page).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seaorm_unaddressable_page_is_empty_without_querying() {
        let repo = SeaOrmCashCardRepository { db: DatabaseConnection::Disconnected };
        let page = PageRequest::of(i64::MAX as u64, 100, Sort::by(vec![Order::desc(SortField::Amount)]));
        assert!(repo.find_by_owner("a", &page).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seaorm_capped_huge_page_is_empty() -> Result<(), anyhow::Error> {
        let Some(db) = crate::test_support::get_db().await? else { return Ok(()) };
        let repo = SeaOrmCashCardRepository { db };
        let owner = format!("repo_owner_{}", uuid::Uuid::new_v4());
        let c = repo.insert(5.0, &owner).await?;

        let page = PageRequest::from_params(Some(i64::MAX), Some(100), &["amount,desc"], PageLimits::default())?;
        assert!(repo.find_by_owner(&owner, &page).await?.is_empty());

        assert!(repo.delete_by_id_and_owner(c.id, &owner).await?);
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_repository_scopes_by_owner() -> Result<(), anyhow::Error> {
        let Some(db) = crate::test_support::get_db().await? else { return Ok(()) };
        let repo = SeaOrmCashCardRepository { db };
        let owner = format!("repo_owner_{}", uuid::Uuid::new_v4());

        let a = repo.insert(123.45, &owner).await?;
        let b = repo.insert(1.00, &owner).await?;
        let c = repo.insert(150.00, &owner).await?;

        let page = PageRequest::of(0, 2, Sort::by(vec![Order::desc(SortField::Amount)]));
        let amounts: Vec<f64> = repo.find_by_owner(&owner, &page).await?.iter().map(|x| x.amount).collect();
        assert_eq!(amounts, vec![150.00, 123.45]);

        assert!(repo.find_by_id_and_owner(a.id, "someone-else").await?.is_none());
        assert!(!repo.update_amount(a.id, "someone-else", 0.0).await?);

        for x in [a, b, c] {
            assert!(repo.delete_by_id_and_owner(x.id, &owner).await?);
        }
        Ok(())
    }
}
