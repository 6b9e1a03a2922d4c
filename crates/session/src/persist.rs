//! Persisted session layout and cold-start reconstruction.
//!
//! Layout (key names from [`PersistKeys`]):
//! - `accounts`: JSON list of every registered account (structured tier)
//! - `activeUserId`: id of the acting account (structured tier)
//! - `token`, `role`: flat copy of the acting credentials (bootstrap tier)
//!
//! The structured tier always wins. The flat tier is only read when no
//! registry entry can be matched, e.g. state written before multi-account
//! support existed.

use std::sync::Arc;

use vendorhub_auth::Role;
use vendorhub_core::{UserId, is_absent_marker};
use vendorhub_storage::KeyValueStore;

use crate::{AccountRegistry, PersistKeys};

/// Which identity is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActiveMarker {
    /// An account in the registry.
    Registered(UserId),
    /// Only a flat token survived; there is no profile.
    Legacy { token: String, role: Option<Role> },
}

/// Storage front that never fails.
///
/// Errors are logged and remembered; the in-memory state stays authoritative.
pub(crate) struct Persistence {
    store: Arc<dyn KeyValueStore>,
    keys: PersistKeys,
    degraded: bool,
}

impl Persistence {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, keys: PersistKeys) -> Self {
        Self {
            store,
            keys,
            degraded: false,
        }
    }

    /// `true` when a storage operation failed since the last complete write.
    ///
    /// Only [`Persistence::save_all`] clears it.
    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub(crate) fn keys(&self) -> &PersistKeys {
        &self.keys
    }

    /// Read a value, treating the sentinels `"undefined"`, `"null"` and `""` as absent.
    pub(crate) fn read(&mut self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !is_absent_marker(v)),
            Err(err) => {
                tracing::warn!(key, "session storage read failed: {err}");
                self.degraded = true;
                None
            }
        }
    }

    pub(crate) fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            tracing::warn!(key, "session storage write failed; continuing in memory: {err}");
            self.degraded = true;
        }
    }

    pub(crate) fn erase(&mut self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            tracing::warn!(key, "session storage remove failed; continuing in memory: {err}");
            self.degraded = true;
        }
    }

    /// Write the registry and the active marker.
    ///
    /// Every key is rewritten, so a clean pass clears earlier failures.
    pub(crate) fn save_all(&mut self, registry: &AccountRegistry, active: Option<&ActiveMarker>) {
        self.degraded = false;
        self.save_registry(registry);
        self.save_active(registry, active);
        if self.degraded {
            tracing::warn!("session state only partially persisted");
        }
    }

    /// Write the whole registry (an empty registry removes the key).
    pub(crate) fn save_registry(&mut self, registry: &AccountRegistry) {
        let key = self.keys.accounts.clone();
        if registry.is_empty() {
            self.erase(&key);
            return;
        }
        match registry.to_json() {
            Ok(json) => {
                tracing::debug!(accounts = registry.len(), "persisting account registry");
                self.write(&key, &json);
            }
            Err(err) => {
                tracing::error!("failed to serialize account registry: {err}");
                self.degraded = true;
            }
        }
    }

    /// Write the active marker and its flat credential copy.
    pub(crate) fn save_active(&mut self, registry: &AccountRegistry, active: Option<&ActiveMarker>) {
        let keys = self.keys.clone();
        match active {
            Some(ActiveMarker::Registered(id)) => match registry.find_by_user_id(id) {
                Some(account) => {
                    self.write(&keys.active_user_id, id.as_str());
                    self.write(&keys.token, &account.token);
                    self.write(&keys.role, account.role.as_str());
                }
                None => self.clear_active(),
            },
            Some(ActiveMarker::Legacy { token, role }) => {
                self.erase(&keys.active_user_id);
                self.write(&keys.token, token);
                match role {
                    Some(role) => self.write(&keys.role, role.as_str()),
                    None => self.erase(&keys.role),
                }
            }
            None => self.clear_active(),
        }
    }

    pub(crate) fn clear_active(&mut self) {
        let keys = self.keys.clone();
        self.erase(&keys.token);
        self.erase(&keys.role);
        self.erase(&keys.active_user_id);
    }
}

/// State reconstructed on cold start.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bootstrap {
    pub(crate) registry: AccountRegistry,
    pub(crate) active: Option<ActiveMarker>,
}

impl Bootstrap {
    /// Precedence:
    /// 1. `activeUserId` naming a registered account;
    /// 2. with no `activeUserId`, the registered account holding the flat token;
    /// 3. the flat token/role pair alone (legacy session without profile);
    /// 4. no session.
    pub(crate) fn read(persistence: &mut Persistence) -> Self {
        let keys = persistence.keys().clone();

        let registry = persistence
            .read(&keys.accounts)
            .map(|raw| AccountRegistry::from_json(&raw))
            .unwrap_or_default();

        let active_id = persistence
            .read(&keys.active_user_id)
            .and_then(|raw| UserId::parse(&raw).ok());
        let flat_token = persistence.read(&keys.token);
        let flat_role = persistence.read(&keys.role).map(Role::new);

        let matched = match &active_id {
            Some(id) => registry.find_by_user_id(id),
            None => flat_token
                .as_deref()
                .and_then(|token| registry.find_by_token(token)),
        };

        let active = match (matched, flat_token) {
            (Some(account), _) => Some(ActiveMarker::Registered(account.user_id().clone())),
            (None, Some(token)) => Some(ActiveMarker::Legacy {
                token,
                role: flat_role,
            }),
            (None, None) => None,
        };

        if let Some(ActiveMarker::Legacy { .. }) = &active {
            tracing::info!("restored legacy session from flat token (no registry match)");
        }

        Self { registry, active }
    }
}
