use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// A cash card as returned to its owner.
#[derive(ToSchema)]
pub struct CashCardDoc {
    pub id: i64,
    pub amount: f64,
    pub owner: String,
}

/// Body for create and update. Other fields are ignored.
#[derive(ToSchema)]
pub struct CashCardInputDoc { pub amount: f64 }

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("basic_auth", SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::cash_cards::list,
        crate::routes::cash_cards::create,
        crate::routes::cash_cards::get,
        crate::routes::cash_cards::update,
        crate::routes::cash_cards::delete,
    ),
    components(schemas(HealthResponse, CashCardDoc, CashCardInputDoc)),
    modifiers(&BasicAuthScheme),
    tags(
        (name = "health"),
        (name = "cashcards")
    )
)]
pub struct ApiDoc;
