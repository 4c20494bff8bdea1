use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// An authenticated principal. `username` is the owner recorded on cards it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl Caller {
    pub fn new<I, S>(username: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { username: username.into(), roles: roles.into_iter().map(Into::into).collect() }
    }

    pub fn name(&self) -> &str { &self.username }

    pub fn has_role(&self, role: &str) -> bool { self.roles.contains(role) }
}

/// Stored account (hashed)
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    /// argon2 PHC string
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Credentials presented with a request
#[derive(Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput").field("username", &self.username).field("password", &"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_debug_hides_password() {
        let s = format!("{:?}", LoginInput::new("sarah1", "abc123"));
        assert!(s.contains("sarah1"));
        assert!(!s.contains("abc123"));
    }

    #[test]
    fn caller_roles_are_deduplicated() {
        let c = Caller::new("kumar2", ["CARD-OWNER", "CARD-OWNER"]);
        assert_eq!(c.roles.len(), 1);
        assert!(c.has_role("CARD-OWNER"));
        assert!(!c.has_role("ADMIN"));
    }
}
