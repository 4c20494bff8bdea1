use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, PaginationConfig, SecurityConfig, StorageBackend, UserConfig};
use migration::MigratorTrait;
use tracing::{info, warn};

use service::auth::{
    domain::UserAccount,
    repository::{memory::InMemoryUserRepository, UserRepository},
    service::AuthConfig,
    AuthService,
};
use service::cash_card::{
    repository::{memory::InMemoryCashCardRepository, CashCardRepository, SeaOrmCashCardRepository},
    CashCardService,
};
use service::pagination::PageLimits;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

/// Turn configured logins into stored accounts, hashing plaintext passwords.
pub fn seed_accounts(users: &[UserConfig]) -> Result<Vec<UserAccount>, StartupError> {
    users
        .iter()
        .map(|u| {
            let account = match (&u.password, &u.password_hash) {
                (_, Some(phc)) => UserAccount::with_hash(&u.username, phc, u.roles.iter().cloned())?,
                (Some(plain), None) => UserAccount::with_password(&u.username, plain, u.roles.iter().cloned())?,
                (None, None) => {
                    return Err(StartupError::InvalidConfig(format!("user {} has no credential", u.username)));
                }
            };
            Ok(account)
        })
        .collect()
}

/// Wire services over the given stores.
pub fn assemble_state(
    cards: Arc<dyn CashCardRepository>,
    users: Arc<dyn UserRepository>,
    security: &SecurityConfig,
    pagination: &PaginationConfig,
) -> Result<ServerState, StartupError> {
    let auth = AuthService::new(users, AuthConfig { required_role: security.required_role.clone() })?;
    Ok(ServerState {
        cards: Arc::new(CashCardService::new(cards)),
        auth: Arc::new(auth),
        page_limits: PageLimits { default_size: pagination.default_size, max_size: pagination.max_size },
        realm: Arc::from(security.realm.as_str()),
    })
}

async fn card_repository(cfg: &AppConfig) -> Result<Arc<dyn CashCardRepository>, StartupError> {
    match cfg.storage.backend {
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None).await.map_err(anyhow::Error::from)?;
            info!("database migrations applied");
            Ok(Arc::new(SeaOrmCashCardRepository { db }))
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; cash cards are lost on restart");
            Ok(Arc::new(InMemoryCashCardRepository::default()))
        }
    }
}

/// Build the full application from configuration.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let cards = card_repository(cfg).await?;
    let users = Arc::new(InMemoryUserRepository::new(seed_accounts(&cfg.security.users)?)?);
    info!(users = cfg.security.users.len(), backend = ?cfg.storage.backend, "credential store seeded");
    let state = assemble_state(cards, users, &cfg.security, &cfg.pagination)?;
    Ok(routes::build_router(state))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {}", e)))
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, "cash card server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(anyhow::Error::from)?;
    info!("server drained");
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
    info!("shutdown signal received");
}
