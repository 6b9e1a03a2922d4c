//! The session store: account registry + active session selector.

use std::sync::Arc;

use chrono::Utc;

use vendorhub_auth::{Account, Credentials, Role, UserProfile, bearer_header};
use vendorhub_core::UserId;
use vendorhub_storage::KeyValueStore;

use crate::persist::{ActiveMarker, Bootstrap, Persistence};
use crate::{
    AccountRegistry, CacheInvalidator, LogoutPolicy, SessionConfig, SessionEvent, SessionEvents,
    StatPatch, Subscription,
};

/// The acting identity, as projected from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession {
    /// `None` for a legacy session restored from a bare token.
    pub user: Option<UserProfile>,
    pub token: String,
    pub role: Option<Role>,
}

impl CurrentSession {
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }

    /// `Authorization` header value for requests made in this session.
    pub fn authorization(&self) -> String {
        bearer_header(&self.token)
    }
}

impl From<&Account> for CurrentSession {
    fn from(account: &Account) -> Self {
        Self {
            user: Some(account.user.clone()),
            token: account.token.clone(),
            role: Some(account.role.clone()),
        }
    }
}

/// Multi-account session store.
///
/// # Invariants
/// - At most one account per user id.
/// - The active session is never stored separately from its registry entry;
///   [`SessionStore::current`] computes it on every call.
/// - Every identity change flushes all cache domains before the mutating
///   call returns.
/// - Storage failures never surface; state continues in memory.
///
/// Mutations take `&mut self`, so one mutation can never interleave with
/// another. Share the store behind a lock if several owners need it.
pub struct SessionStore {
    registry: AccountRegistry,
    active: Option<ActiveMarker>,
    persistence: Persistence,
    invalidator: CacheInvalidator,
    events: SessionEvents,
    logout_policy: LogoutPolicy,
}

impl SessionStore {
    /// Reconstruct the session from `storage`.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        invalidator: CacheInvalidator,
        config: &SessionConfig,
    ) -> Self {
        let mut persistence = Persistence::new(storage, config.keys.clone());
        let Bootstrap { registry, active } = Bootstrap::read(&mut persistence);

        tracing::info!(
            accounts = registry.len(),
            active = active.is_some(),
            "session store opened"
        );

        Self {
            registry,
            active,
            persistence,
            invalidator,
            events: SessionEvents::new(),
            logout_policy: config.logout_policy,
        }
    }

    /// Tear the store down, disconnecting every subscriber.
    ///
    /// If the last storage write failed, one final full write is attempted.
    pub fn dispose(mut self) {
        if self.persistence.is_degraded() {
            self.persist_all();
        }
        self.events.close();
        tracing::debug!("session store disposed");
    }

    // ── reads ────────────────────────────────────────────────────────────

    /// The acting identity, or `None` when nobody is signed in.
    pub fn current(&self) -> Option<CurrentSession> {
        match self.active.as_ref()? {
            ActiveMarker::Registered(id) => self.registry.find_by_user_id(id).map(CurrentSession::from),
            ActiveMarker::Legacy { token, role } => Some(CurrentSession {
                user: None,
                token: token.clone(),
                role: role.clone(),
            }),
        }
    }

    pub fn active_user_id(&self) -> Option<&UserId> {
        match self.active.as_ref()? {
            ActiveMarker::Registered(id) => Some(id),
            ActiveMarker::Legacy { .. } => None,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        self.registry.list()
    }

    pub fn find_account(&self, user_id: &UserId) -> Option<&Account> {
        self.registry.find_by_user_id(user_id)
    }

    /// Accounts the user could switch to.
    pub fn other_accounts(&self) -> Vec<&Account> {
        self.registry.others(self.active_user_id()).collect()
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// `true` when some state failed to persist and has not been written
    /// in full since.
    pub fn persistence_degraded(&self) -> bool {
        self.persistence.is_degraded()
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    // ── mutations ────────────────────────────────────────────────────────

    /// Register the outcome of a successful login/registration/OAuth exchange
    /// and make it the acting identity.
    ///
    /// Caches are flushed even when the same account signs in again.
    pub fn set_credentials_and_activate(&mut self, credentials: Credentials) {
        let account = credentials.into_account(Utc::now());
        let user_id = account.user_id().clone();

        let replaced = self.registry.upsert(account);
        tracing::info!(%user_id, replaced, "credentials stored");

        self.switch_to(user_id);
    }

    /// Make an already-registered account the acting identity.
    ///
    /// Unknown ids are a caller error: the call is logged and ignored.
    /// Re-activating the current account does not flush caches.
    pub fn activate(&mut self, user_id: &UserId) -> bool {
        if self.registry.find_by_user_id(user_id).is_none() {
            tracing::warn!(%user_id, "activate ignored: account is not registered");
            return false;
        }
        if self.active_user_id() == Some(user_id) {
            tracing::debug!(%user_id, "account already active");
            return true;
        }

        self.switch_to(user_id.clone());
        true
    }

    /// Log out the acting identity.
    ///
    /// Under [`LogoutPolicy::Forget`] the account is also removed from the
    /// registry. No other account becomes active.
    pub fn deactivate_current(&mut self) -> Option<UserId> {
        let previous = self.active.take()?;

        let user_id = match previous {
            ActiveMarker::Registered(id) => {
                if self.logout_policy == LogoutPolicy::Forget && self.registry.remove(&id).is_some() {
                    self.persistence.save_registry(&self.registry);
                }
                Some(id)
            }
            ActiveMarker::Legacy { .. } => None,
        };

        self.persistence.clear_active();
        tracing::info!(user_id = ?user_id, policy = ?self.logout_policy, "logged out");
        self.events.publish(SessionEvent::Deactivated {
            user_id: user_id.clone(),
        });

        user_id
    }

    /// Forget an account.
    ///
    /// Removing a non-active account leaves the session and caches untouched.
    /// Removing the active account also ends the session.
    pub fn remove(&mut self, user_id: &UserId) -> bool {
        if self.registry.remove(user_id).is_none() {
            return false;
        }
        self.persistence.save_registry(&self.registry);
        tracing::info!(%user_id, "account removed");
        self.events.publish(SessionEvent::AccountRemoved {
            user_id: user_id.clone(),
        });

        if self.active_user_id() == Some(user_id) {
            self.active = None;
            self.persistence.clear_active();
            self.events.publish(SessionEvent::Deactivated {
                user_id: Some(user_id.clone()),
            });
        }
        true
    }

    /// Merge server-confirmed balances into the acting account.
    ///
    /// No-op without a registered active account. Caches are not touched.
    pub fn apply_stats(&mut self, patch: StatPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(ActiveMarker::Registered(user_id)) = self.active.clone() else {
            tracing::debug!("stat patch ignored: no registered active account");
            return false;
        };
        let Some(account) = self.registry.find_mut(&user_id) else {
            return false;
        };

        patch.apply_to(&mut account.user);
        self.persistence.save_registry(&self.registry);
        self.events.publish(SessionEvent::StatsPatched { user_id });
        true
    }

    /// Replace the acting account's profile with a freshly fetched one.
    ///
    /// The token is kept; the role follows the profile when it carries one.
    /// A legacy session becomes a registered account. Caches are not touched:
    /// the identity did not change.
    pub fn refresh_profile(&mut self, profile: UserProfile) -> bool {
        let Some(active) = self.active.clone() else {
            return false;
        };

        let user_id = profile.id.clone();
        match active {
            ActiveMarker::Registered(id) => {
                if id != user_id {
                    tracing::warn!(active = %id, fetched = %user_id, "profile refresh ignored: id mismatch");
                    return false;
                }
                let Some(account) = self.registry.find_mut(&id) else {
                    return false;
                };
                if let Some(role) = profile.role.clone() {
                    account.role = role;
                }
                account.user = profile;
            }
            ActiveMarker::Legacy { token, role } => {
                let Some(role) = profile.role.clone().or(role) else {
                    tracing::warn!(%user_id, "profile refresh ignored: no role for legacy session");
                    return false;
                };
                self.registry
                    .upsert(Credentials::new(profile, token, role).into_account(Utc::now()));
                self.active = Some(ActiveMarker::Registered(user_id.clone()));
            }
        }

        self.persist_all();
        self.events.publish(SessionEvent::ProfileRefreshed { user_id });
        true
    }

    // ── internals ────────────────────────────────────────────────────────

    /// Flush caches, then point the session at `user_id` (which must be registered).
    fn switch_to(&mut self, user_id: UserId) {
        let domains = self.invalidator.invalidate_all();
        self.events.publish(SessionEvent::CachesInvalidated { domains });

        if let Some(account) = self.registry.find_mut(&user_id) {
            account.touch(Utc::now());
        }
        self.active = Some(ActiveMarker::Registered(user_id.clone()));
        self.persist_all();

        tracing::info!(%user_id, "account activated");
        self.events.publish(SessionEvent::Activated { user_id });
    }

    fn persist_all(&mut self) {
        self.persistence.save_all(&self.registry, self.active.as_ref());
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Tokens stay out of debug output.
        f.debug_struct("SessionStore")
            .field("accounts", &self.registry.len())
            .field("active_user_id", &self.active_user_id())
            .field("logout_policy", &self.logout_policy)
            .field("invalidator", &self.invalidator)
            .finish()
    }
}
