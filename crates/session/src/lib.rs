//! `vendorhub-session` — multi-account session store.
//!
//! **Responsibility:** remember every identity that signed in on this device,
//! track which one is acting, and keep cached server data from leaking
//! across an identity switch.
//!
//! Mutation entry points all live on [`SessionStore`]; the registry is the
//! single source of truth and the active session is computed from it on read.

pub mod config;
pub mod events;
pub mod invalidator;
pub mod persist;
pub mod registry;
pub mod stats;
pub mod store;

pub use config::{LogoutPolicy, PersistKeys, SessionConfig, UnknownLogoutPolicy};
pub use events::{SessionEvent, SessionEvents, Subscription};
pub use invalidator::{CacheInvalidator, DomainCaches};
pub use registry::AccountRegistry;
pub use stats::StatPatch;
pub use store::{CurrentSession, SessionStore};
