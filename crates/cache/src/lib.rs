//! `vendorhub-cache` — client-side caches of server query results.
//!
//! Each REST resource group (vendor, leads, admin, billing, blog) owns one
//! independent cache domain. Query keys are **not** namespaced by account,
//! so a domain must be flushed whenever the acting identity changes.

pub mod domain;
pub mod patch;
pub mod query;

pub use domain::{CacheDomain, CacheDomainId};
pub use patch::CachePatch;
pub use query::{FetchTicket, QueryCache, QueryKey};
