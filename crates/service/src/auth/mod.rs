//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Verifies HTTP Basic credentials against argon2 hashes and checks the role
//! that grants access to cash cards.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;

pub use service::AuthService;
