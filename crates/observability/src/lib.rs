//! Tracing/logging setup for processes and test harnesses embedding the
//! session store.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, init};
