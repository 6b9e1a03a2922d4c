//! Session configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use vendorhub_storage::{FileStore, InMemoryStore, KeyValueStore};

/// Storage key names of the persisted session layout.
///
/// Defaults match what earlier dashboard builds wrote, so existing state is
/// picked up on upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistKeys {
    /// Serialized list of accounts.
    pub accounts: String,
    /// Id of the active account.
    pub active_user_id: String,
    /// Flat copy of the active token (bootstrap tier).
    pub token: String,
    /// Flat copy of the active role (bootstrap tier).
    pub role: String,
}

impl Default for PersistKeys {
    fn default() -> Self {
        Self {
            accounts: "accounts".to_string(),
            active_user_id: "activeUserId".to_string(),
            token: "token".to_string(),
            role: "role".to_string(),
        }
    }
}

/// What logging out does to the account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoutPolicy {
    /// Logout forgets the account; signing in again needs full credentials.
    #[default]
    Forget,
    /// Logout only deactivates; the account stays in the picker.
    Retain,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown logout policy {0:?} (expected \"forget\" or \"retain\")")]
pub struct UnknownLogoutPolicy(pub String);

impl FromStr for LogoutPolicy {
    type Err = UnknownLogoutPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forget" => Ok(LogoutPolicy::Forget),
            "retain" => Ok(LogoutPolicy::Retain),
            _ => Err(UnknownLogoutPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub keys: PersistKeys,
    pub logout_policy: LogoutPolicy,
    /// Where the file store lives; `None` uses the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl SessionConfig {
    pub const ENV_DATA_DIR: &'static str = "VENDORHUB_DATA_DIR";
    pub const ENV_LOGOUT_POLICY: &'static str = "VENDORHUB_LOGOUT_POLICY";

    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(Self::ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let logout_policy = match lookup(Self::ENV_LOGOUT_POLICY) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!("{err}; using default");
                LogoutPolicy::default()
            }),
            None => LogoutPolicy::default(),
        };

        Self {
            keys: PersistKeys::default(),
            logout_policy,
            data_dir,
        }
    }

    pub fn with_logout_policy(mut self, policy: LogoutPolicy) -> Self {
        self.logout_policy = policy;
        self
    }

    /// Open the durable store for this config.
    ///
    /// If the file store cannot be opened the session runs on an in-memory
    /// store instead; nothing survives a restart in that case.
    pub fn open_storage(&self) -> Arc<dyn KeyValueStore> {
        let opened = match &self.data_dir {
            Some(dir) => FileStore::open(dir.clone()),
            None => FileStore::open_default(),
        };

        match opened {
            Ok(store) => {
                tracing::debug!(dir = ?store.dir(), "session storage opened");
                Arc::new(store)
            }
            Err(err) => {
                tracing::warn!("session storage unavailable, state will not persist: {err}");
                Arc::new(InMemoryStore::new())
            }
        }
    }
}
