//! Service layer for cash cards.
//! - Owner-scoped record operations on top of a pluggable repository.
//! - Credential verification and role checks for callers.
//! - Paging and sort normalization shared by every listing.

pub mod errors;
pub mod auth;
pub mod cash_card;
pub mod pagination;
#[cfg(test)]
pub mod test_support;
