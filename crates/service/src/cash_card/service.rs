use std::sync::Arc;
use tracing::{debug, info, instrument};

use models::cash_card::validate_amount;

use super::domain::{CashCard, CashCardInput};
use super::repository::CashCardRepository;
use crate::auth::domain::Caller;
use crate::errors::ServiceError;
use crate::pagination::{Order, PageRequest, Sort, SortField};

/// Application service for cash cards.
///
/// Holds no state besides the repository handed to it. Each operation is scoped
/// to the calling owner; a card owned by someone else is reported exactly like
/// a missing one.
pub struct CashCardService {
    repo: Arc<dyn CashCardRepository>,
}

impl CashCardService {
    pub fn new(repo: Arc<dyn CashCardRepository>) -> Self { Self { repo } }

    /// Order used when the caller asks for none: ascending amount.
    pub fn default_sort() -> Sort { Sort::by(vec![Order::asc(SortField::Amount)]) }

    #[instrument(skip(self, caller), fields(owner = %caller.name()))]
    pub async fn get(&self, caller: &Caller, id: i64) -> Result<CashCard, ServiceError> {
        self.repo
            .find_by_id_and_owner(id, caller.name())
            .await?
            .ok_or_else(|| ServiceError::not_found("cash_card"))
    }

    /// Create a card owned by the caller; the store assigns the id.
    #[instrument(skip(self, caller, input), fields(owner = %caller.name()))]
    pub async fn create(&self, caller: &Caller, input: CashCardInput) -> Result<CashCard, ServiceError> {
        validate_amount(input.amount)?;
        let created = self.repo.insert(input.amount, caller.name()).await?;
        info!(id = created.id, owner = %created.owner, "cash_card_created");
        Ok(created)
    }

    /// One page of the caller's cards. An empty sort means ascending amount.
    #[instrument(skip(self, caller), fields(owner = %caller.name()))]
    pub async fn list(&self, caller: &Caller, page: PageRequest) -> Result<Vec<CashCard>, ServiceError> {
        let page = page.with_sort_or(Self::default_sort());
        let rows = self.repo.find_by_owner(caller.name(), &page).await?;
        debug!(page = page.page, size = page.size, count = rows.len(), "cash_cards_listed");
        Ok(rows)
    }

    /// Replace the amount of an owned card; id and owner stay as they are.
    #[instrument(skip(self, caller, input), fields(owner = %caller.name()))]
    pub async fn update(&self, caller: &Caller, id: i64, input: CashCardInput) -> Result<(), ServiceError> {
        validate_amount(input.amount)?;
        if !self.repo.update_amount(id, caller.name(), input.amount).await? {
            return Err(ServiceError::not_found("cash_card"));
        }
        info!(id, "cash_card_updated");
        Ok(())
    }

    #[instrument(skip(self, caller), fields(owner = %caller.name()))]
    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<(), ServiceError> {
        if !self.repo.exists_by_id_and_owner(id, caller.name()).await? {
            return Err(ServiceError::not_found("cash_card"));
        }
        // A concurrent delete may win between the check and here
        if !self.repo.delete_by_id_and_owner(id, caller.name()).await? {
            return Err(ServiceError::not_found("cash_card"));
        }
        info!(id, "cash_card_deleted");
        Ok(())
    }
}
