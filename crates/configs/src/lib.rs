use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Where cash cards are persisted.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_size: u64,
}

fn default_page_size() -> u64 { 20 }
fn default_max_page_size() -> u64 { 100 }

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_size: default_page_size(), max_size: default_max_page_size() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default = "default_required_role")]
    pub required_role: String,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

fn default_realm() -> String { "cashcard".into() }
fn default_required_role() -> String { "CARD-OWNER".into() }

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { realm: default_realm(), required_role: default_required_role(), users: Vec::new() }
    }
}

/// A login seeded into the credential store at startup.
/// Exactly one of `password` (hashed on load) or `password_hash` (argon2 PHC string) is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default)]
    pub format: Option<String>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.apply_env_with(|k| std::env::var(k).ok())?;
        self.server.normalize()?;
        self.pagination.normalize();
        if self.storage.backend == StorageBackend::Postgres {
            self.database.normalize_from_env();
            self.database.validate()?;
        }
        self.security.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    /// `SERVER_HOST`, `SERVER_PORT` and `TOKIO_WORKER_THREADS` win over the file when set.
    pub fn apply_env_with<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("SERVER_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            self.port = port.trim().parse().map_err(|_| anyhow!("SERVER_PORT must be a port number, got {:?}", port))?;
        }
        if let Some(threads) = get("TOKIO_WORKER_THREADS") {
            let n: usize = threads
                .trim()
                .parse()
                .map_err(|_| anyhow!("TOKIO_WORKER_THREADS must be a positive integer, got {:?}", threads))?;
            self.worker_threads = Some(n);
        }
        Ok(())
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl PaginationConfig {
    fn normalize(&mut self) {
        if self.max_size == 0 {
            self.max_size = default_max_page_size();
        }
        if self.default_size == 0 {
            self.default_size = default_page_size();
        }
        self.default_size = self.default_size.min(self.max_size);
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // Fill the URL from the environment when the TOML leaves it out
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.realm.trim().is_empty() || self.realm.contains('"') {
            return Err(anyhow!("security.realm must be non-empty and must not contain quotes"));
        }
        if self.users.is_empty() {
            return Err(anyhow!("security.users is empty; nobody could log in"));
        }
        for u in &self.users {
            if u.username.trim().is_empty() || u.username.contains(':') {
                return Err(anyhow!("security.users: username must be non-empty and must not contain ':'"));
            }
            match (&u.password, &u.password_hash) {
                (Some(_), Some(_)) => {
                    return Err(anyhow!("security.users[{}]: set either password or password_hash, not both", u.username));
                }
                (None, None) => {
                    return Err(anyhow!("security.users[{}]: password or password_hash required", u.username));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = ""
        port = 9090
        worker_threads = 0

        [storage]
        backend = "memory"

        [pagination]
        default_size = 500
        max_size = 50

        [[security.users]]
        username = "sarah1"
        password = "abc123"
        roles = ["CARD-OWNER"]
    "#;

    #[test]
    fn memory_backend_skips_database_validation() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.security.realm, "cashcard");
        assert_eq!(cfg.security.required_role, "CARD-OWNER");
    }

    #[test]
    fn default_page_size_never_exceeds_max() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.pagination.max_size, 50);
        assert_eq!(cfg.pagination.default_size, 50);
    }

    #[test]
    fn pagination_defaults_when_section_missing() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.pagination.default_size, 20);
        assert_eq!(cfg.pagination.max_size, 100);
        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    }

    #[test]
    fn rejects_user_without_credential() {
        let sec = SecurityConfig {
            users: vec![UserConfig { username: "x".into(), password: None, password_hash: None, roles: vec![] }],
            ..SecurityConfig::default()
        };
        assert!(sec.validate().is_err());
    }

    #[test]
    fn rejects_empty_user_list() {
        assert!(SecurityConfig::default().validate().is_err());
    }

    #[test]
    fn server_env_overrides_file_values() {
        let mut server = ServerConfig::default();
        server
            .apply_env_with(|k| match k {
                "SERVER_HOST" => Some("0.0.0.0".into()),
                "SERVER_PORT" => Some("9000".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 9000);
        assert_eq!(server.worker_threads, Some(4));

        let bad = ServerConfig::default().apply_env_with(|k| (k == "SERVER_PORT").then(|| "http".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn database_url_must_be_postgres() {
        let db = DatabaseConfig { url: "mysql://x".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
        let ok = DatabaseConfig { url: "postgres://u@h/db".into(), ..db };
        assert!(ok.validate().is_ok());
    }
}
