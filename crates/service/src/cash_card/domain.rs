use serde::{Deserialize, Serialize};

/// A stored cash card as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashCard {
    pub id: i64,
    pub amount: f64,
    pub owner: String,
}

impl From<models::cash_card::Model> for CashCard {
    fn from(m: models::cash_card::Model) -> Self {
        Self { id: m.id, amount: m.amount, owner: m.owner }
    }
}

/// Body accepted on create and update. Only `amount` is read; any `id` or
/// `owner` sent by the client is dropped during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CashCardInput {
    pub amount: f64,
}
