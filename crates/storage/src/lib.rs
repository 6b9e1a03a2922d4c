//! `vendorhub-storage` — durable key/value boundary for client state.
//!
//! Stores here are deliberately dumb: string keys, string values, no
//! transactions. Callers serialize whole documents and treat every failure
//! as recoverable.

pub mod error;
pub mod file;
pub mod memory;

pub use error::StorageError;
pub use file::{FileStore, default_dir};
pub use memory::InMemoryStore;

use std::sync::Arc;

/// Device-local key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
