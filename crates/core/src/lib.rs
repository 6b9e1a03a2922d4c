//! `vendorhub-core` — shared identifiers and error model.
//!
//! This crate contains **pure domain** primitives (no storage, no IO).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{UserId, is_absent_marker};
