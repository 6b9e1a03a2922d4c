//! `vendorhub-auth` — identities as seen by the dashboard client.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! accounts and parses what the authentication backend returns.

pub mod account;
pub mod envelope;
pub mod profile;
pub mod roles;

pub use account::{Account, Credentials, bearer_header};
pub use envelope::{AuthData, AuthEnvelope, AuthResponseError};
pub use profile::{UserProfile, Wallet};
pub use roles::Role;
