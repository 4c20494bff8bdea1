use sea_orm::{entity::prelude::*, sea_query::Expr, DatabaseConnection, NotSet, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_card")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub owner: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Owner names are login names; they are never empty and must fit the column.
pub fn validate_owner(owner: &str) -> Result<(), errors::ModelError> {
    if owner.trim().is_empty() { return Err(errors::ModelError::Validation("owner required".into())); }
    if owner.len() > 256 { return Err(errors::ModelError::Validation("owner too long (<=256)".into())); }
    Ok(())
}

/// JSON cannot carry NaN or infinities, and neither may the table.
pub fn validate_amount(amount: f64) -> Result<(), errors::ModelError> {
    if !amount.is_finite() { return Err(errors::ModelError::Validation("amount must be a finite number".into())); }
    Ok(())
}

/// Insert a card; the id is assigned by the database.
pub async fn create(db: &DatabaseConnection, amount: f64, owner: &str) -> Result<Model, errors::ModelError> {
    validate_amount(amount)?;
    validate_owner(owner)?;
    let am = ActiveModel {
        id: NotSet,
        amount: Set(amount),
        owner: Set(owner.to_string()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Look up a card by id, visible only to its owner.
pub async fn find_by_id_and_owner(db: &DatabaseConnection, id: i64, owner: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Id.eq(id))
        .filter(Column::Owner.eq(owner))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn exists_by_id_and_owner(db: &DatabaseConnection, id: i64, owner: &str) -> Result<bool, errors::ModelError> {
    let n = Entity::find()
        .filter(Column::Id.eq(id))
        .filter(Column::Owner.eq(owner))
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(n > 0)
}

/// Replace the amount of an owned card. Returns false when no such card is owned by `owner`.
pub async fn update_amount(db: &DatabaseConnection, id: i64, owner: &str, amount: f64) -> Result<bool, errors::ModelError> {
    validate_amount(amount)?;
    let res = Entity::update_many()
        .col_expr(Column::Amount, Expr::value(amount))
        .filter(Column::Id.eq(id))
        .filter(Column::Owner.eq(owner))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Delete an owned card; returns true if a row was removed.
pub async fn delete_by_id_and_owner(db: &DatabaseConnection, id: i64, owner: &str) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::Owner.eq(owner))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
