use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use tracing::{debug, instrument, warn};

use super::domain::{Caller, LoginInput, UserAccount};
use super::errors::AuthError;
use super::repository::UserRepository;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Role a caller must hold to manage cash cards.
    pub required_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self { Self { required_role: "CARD-OWNER".into() } }
}

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Check a plaintext password against a PHC string. A malformed hash is an error,
/// a mismatch is `Ok(false)`.
pub fn verify_password(plain: &str, phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
}

/// `verify_password` on the blocking pool; argon2 is too slow for a runtime worker.
async fn verify_off_runtime(plain: String, phc: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &phc))
        .await
        .map_err(|e| AuthError::HashError(format!("verify task failed: {}", e)))?
}

impl UserAccount {
    /// Account whose password is hashed here.
    pub fn with_password<I, S>(username: &str, password: &str, roles: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if password.is_empty() {
            return Err(AuthError::Validation(format!("empty password for {}", username)));
        }
        Ok(Self { username: username.to_string(), password_hash: hash_password(password)?, roles: roles.into_iter().map(Into::into).collect() })
    }

    /// Account from an existing argon2 PHC string, which must parse.
    pub fn with_hash<I, S>(username: &str, phc: &str, roles: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PasswordHash::new(phc).map_err(|e| AuthError::Validation(format!("bad password hash for {}: {}", username, e)))?;
        Ok(Self { username: username.to_string(), password_hash: phc.to_string(), roles: roles.into_iter().map(Into::into).collect() })
    }
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    cfg: AuthConfig,
    // Verified against when the username is unknown, so both paths cost one argon2 run
    dummy_hash: String,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, cfg: AuthConfig) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("dummy-password-for-unknown-users")?;
        Ok(Self { repo, cfg, dummy_hash })
    }

    /// Verify a username and password and resolve the caller.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::memory::InMemoryUserRepository};
    /// use service::auth::domain::{LoginInput, UserAccount};
    /// use std::sync::Arc;
    /// let sarah = UserAccount::with_password("sarah1", "abc123", ["CARD-OWNER"]).unwrap();
    /// let repo = Arc::new(InMemoryUserRepository::new(vec![sarah]).unwrap());
    /// let svc = AuthService::new(repo, AuthConfig::default()).unwrap();
    /// let caller = tokio_test::block_on(svc.authenticate(LoginInput::new("sarah1", "abc123"))).unwrap();
    /// assert_eq!(caller.name(), "sarah1");
    /// assert!(tokio_test::block_on(svc.authenticate(LoginInput::new("sarah1", "nope"))).is_err());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn authenticate(&self, input: LoginInput) -> Result<Caller, AuthError> {
        let account = self.repo.find_by_username(&input.username).await?;

        let Some(account) = account else {
            let _ = verify_off_runtime(input.password, self.dummy_hash.clone()).await;
            warn!("unknown user");
            return Err(AuthError::Unauthorized);
        };

        if !verify_off_runtime(input.password, account.password_hash.clone()).await? {
            warn!("password mismatch");
            return Err(AuthError::Unauthorized);
        }

        debug!(roles = ?account.roles, "authenticated");
        Ok(Caller::new(account.username, account.roles))
    }

    /// Require the configured role.
    pub fn authorize(&self, caller: &Caller) -> Result<(), AuthError> {
        if caller.has_role(&self.cfg.required_role) {
            Ok(())
        } else {
            warn!(username = %caller.name(), required_role = %self.cfg.required_role, "caller lacks required role");
            Err(AuthError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::memory::InMemoryUserRepository;

    fn service() -> AuthService {
        let repo = InMemoryUserRepository::new(vec![
            UserAccount::with_password("sarah1", "abc123", ["CARD-OWNER"]).unwrap(),
            UserAccount::with_password("hank-owns-no-cards", "qrs456", ["NON-OWNER"]).unwrap(),
        ])
        .unwrap();
        AuthService::new(Arc::new(repo), AuthConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn good_credentials_resolve_caller_with_roles() {
        let svc = service();
        let caller = svc.authenticate(LoginInput::new("sarah1", "abc123")).await.unwrap();
        assert_eq!(caller.name(), "sarah1");
        assert!(svc.authorize(&caller).is_ok());
    }

    #[tokio::test]
    async fn bad_user_or_password_is_unauthorized() {
        let svc = service();
        let err = svc.authenticate(LoginInput::new("BAD-USER", "abc123")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
        let err = svc.authenticate(LoginInput::new("sarah1", "BAD-PASSWORD")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn caller_without_role_is_forbidden() {
        let svc = service();
        let hank = svc.authenticate(LoginInput::new("hank-owns-no-cards", "qrs456")).await.unwrap();
        assert!(matches!(svc.authorize(&hank), Err(AuthError::Forbidden)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn verification_leaves_runtime_free_for_other_tasks() {
        let svc = service();
        let mut side_done = None;
        let (auth, ()) = tokio::join!(
            async {
                let res = svc.authenticate(LoginInput::new("sarah1", "abc123")).await;
                (res, std::time::Instant::now())
            },
            async {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
                side_done = Some(std::time::Instant::now());
            }
        );
        let (res, auth_done) = auth;
        assert!(res.is_ok());
        // a verify running inline would finish before the other task got polled again
        assert!(side_done.unwrap() < auth_done);
    }

    #[test]
    fn hash_round_trip_and_malformed_hash() {
        let h = hash_password("Secret123").unwrap();
        assert!(verify_password("Secret123", &h).unwrap());
        assert!(!verify_password("secret123", &h).unwrap());
        assert!(matches!(verify_password("x", "not-a-phc"), Err(AuthError::HashError(_))));
    }

    #[test]
    fn with_hash_rejects_garbage() {
        assert!(UserAccount::with_hash("u", "plaintext", ["CARD-OWNER"]).is_err());
        let h = hash_password("pw").unwrap();
        let acc = UserAccount::with_hash("u", &h, ["CARD-OWNER"]).unwrap();
        assert_eq!(acc.roles, vec!["CARD-OWNER".to_string()]);
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(UserAccount::with_password("u", "", Vec::<String>::new()), Err(AuthError::Validation(_))));
    }
}
