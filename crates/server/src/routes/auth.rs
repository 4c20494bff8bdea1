use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use tracing::warn;

use service::auth::{domain::LoginInput, errors::AuthError, AuthService};
use service::cash_card::CashCardService;
use service::pagination::PageLimits;

use crate::errors::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub cards: Arc<CashCardService>,
    pub auth: Arc<AuthService>,
    pub page_limits: PageLimits,
    /// Realm announced in `WWW-Authenticate` challenges.
    pub realm: Arc<str>,
}

impl ServerState {
    fn challenge(&self) -> ApiError {
        ApiError::Unauthorized { realm: self.realm.to_string() }
    }

    fn auth_failure(&self, e: AuthError) -> ApiError {
        match e {
            AuthError::Unauthorized => self.challenge(),
            other => other.into(),
        }
    }
}

/// Route middleware for the card routes: verify HTTP Basic credentials, require
/// the configured role, then hand the resolved `Caller` to handlers as a
/// request extension.
/// Missing or wrong credentials yield 401 with a Basic challenge; a valid user
/// without the role yields 403.
pub async fn require_basic_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();

    let Some(Authorization(basic)) = req.headers().typed_get::<Authorization<Basic>>() else {
        warn!(path = %path, "missing or malformed Basic Authorization header");
        return Err(state.challenge());
    };

    let caller = state
        .auth
        .authenticate(LoginInput::new(basic.username(), basic.password()))
        .await
        .map_err(|e| state.auth_failure(e))?;

    state.auth.authorize(&caller).map_err(|e| state.auth_failure(e))?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
