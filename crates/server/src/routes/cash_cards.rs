use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::{Query, QueryRejection};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use service::auth::domain::Caller;
use service::cash_card::domain::{CashCard, CashCardInput};
use service::pagination::PageRequest;

use crate::{errors::ApiError, routes::auth::ServerState};

/// Listing parameters. `sort` may be repeated. A `page` or `size` that is not
/// an integer is treated as absent.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 0-based page index
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    /// Items per page
    #[serde(default, deserialize_with = "lenient_int")]
    pub size: Option<i64>,
    /// `property[,property...][,asc|desc]`; properties are `id`, `amount`, `owner`
    #[serde(default)]
    pub sort: Vec<String>,
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

fn card_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn card_body(payload: Result<Json<CashCardInput>, JsonRejection>) -> Result<CashCardInput, ApiError> {
    payload.map(|Json(input)| input).map_err(|e| ApiError::BadRequest(e.body_text()))
}

#[utoipa::path(
    get, path = "/cashcards/{id}", tag = "cashcards",
    params(("id" = i64, Path, description = "Cash card id")),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Card owned by the caller", body = crate::openapi::CashCardDoc),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller lacks the card owner role"),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CashCard>, ApiError> {
    let id = card_id(path)?;
    let card = state.cards.get(&caller, id).await?;
    Ok(Json(card))
}

#[utoipa::path(
    post, path = "/cashcards", tag = "cashcards",
    request_body = crate::openapi::CashCardInputDoc,
    security(("basic_auth" = [])),
    responses(
        (status = 201, description = "Created; Location points at the new card"),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller lacks the card owner role")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CashCardInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = card_body(payload)?;
    let created = state.cards.create(&caller, input).await?;
    let location = format!("/cashcards/{}", created.id);
    info!(id = created.id, location = %location, "cash_card_create_ok");
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

#[utoipa::path(
    get, path = "/cashcards", tag = "cashcards",
    params(ListQuery),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "One page of the caller's cards", body = [crate::openapi::CashCardDoc]),
        (status = 400, description = "Unknown sort property or malformed query"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller lacks the card owner role")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<CashCard>>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let page = PageRequest::from_params(q.page, q.size, &q.sort, state.page_limits)?;
    debug!(page = page.page, size = page.size, sort = ?page.sort, "cash_card_list_request");
    let rows = state.cards.list(&caller, page).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    put, path = "/cashcards/{id}", tag = "cashcards",
    params(("id" = i64, Path, description = "Cash card id")),
    request_body = crate::openapi::CashCardInputDoc,
    security(("basic_auth" = [])),
    responses(
        (status = 204, description = "Amount replaced"),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller lacks the card owner role"),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CashCardInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = card_id(path)?;
    let input = card_body(payload)?;
    state.cards.update(&caller, id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete, path = "/cashcards/{id}", tag = "cashcards",
    params(("id" = i64, Path, description = "Cash card id")),
    security(("basic_auth" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller lacks the card owner role"),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = card_id(path)?;
    state.cards.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
