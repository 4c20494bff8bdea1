//! Cash card records: domain types, the storage seam and the owner-scoped service.
//!
//! Every read and write is filtered by `(id, owner)` at the repository level, so a
//! caller cannot tell another owner's card apart from one that does not exist.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CashCardService;
