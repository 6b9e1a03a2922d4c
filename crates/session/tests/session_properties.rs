//! Black-box behavior of the session store across restarts, switches and logouts.

use std::sync::{Arc, Mutex};

use vendorhub_auth::{Credentials, Role, UserProfile};
use vendorhub_cache::{CacheDomain, CacheDomainId, QueryKey};
use vendorhub_core::UserId;
use vendorhub_session::{
    CacheInvalidator, SessionConfig, SessionEvent, SessionStore, StatPatch,
};
use vendorhub_storage::{FileStore, InMemoryStore, KeyValueStore};

/// Cache domain that records, for every reset, what storage said the active
/// account was at that moment.
struct SpyDomain {
    id: CacheDomainId,
    storage: Arc<InMemoryStore>,
    resets: Mutex<Vec<Option<String>>>,
}

impl SpyDomain {
    fn new(id: CacheDomainId, storage: Arc<InMemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            id,
            storage,
            resets: Mutex::new(Vec::new()),
        })
    }

    fn resets(&self) -> Vec<Option<String>> {
        self.resets.lock().unwrap().clone()
    }
}

impl CacheDomain for SpyDomain {
    fn id(&self) -> CacheDomainId {
        self.id
    }

    fn reset(&self) {
        let active = self.storage.get("activeUserId").unwrap();
        self.resets.lock().unwrap().push(active);
    }
}

struct Harness {
    storage: Arc<InMemoryStore>,
    spies: Vec<Arc<SpyDomain>>,
    store: SessionStore,
}

impl Harness {
    fn new() -> Self {
        Self::with_storage(Arc::new(InMemoryStore::new()))
    }

    fn with_storage(storage: Arc<InMemoryStore>) -> Self {
        vendorhub_observability::init();
        let spies: Vec<_> = CacheDomainId::ALL
            .into_iter()
            .map(|id| SpyDomain::new(id, storage.clone()))
            .collect();
        let invalidator = CacheInvalidator::new(
            spies
                .iter()
                .map(|s| s.clone() as Arc<dyn CacheDomain>)
                .collect(),
        );
        let store = SessionStore::open(storage.clone(), invalidator, &SessionConfig::default());
        Self {
            storage,
            spies,
            store,
        }
    }

    fn total_resets(&self) -> usize {
        self.spies.iter().map(|s| s.resets().len()).sum()
    }
}

fn vendor(id: &str, token: &str) -> Credentials {
    Credentials::new(
        UserProfile::new(UserId::new(id)).with_role(Role::vendor()),
        token,
        Role::vendor(),
    )
}

fn admin(id: &str, token: &str) -> Credentials {
    Credentials::new(
        UserProfile::new(UserId::new(id)).with_role(Role::admin()),
        token,
        Role::admin(),
    )
}

fn id(raw: &str) -> UserId {
    UserId::new(raw)
}

#[test]
fn upsert_twice_keeps_one_entry() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("a", "t1"));
    let first = h.store.find_account(&id("a")).cloned().unwrap();

    let mut registry = h.store.registry().clone();
    registry.upsert(first.clone());
    registry.upsert(first.clone());

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.find_by_user_id(&id("a")), Some(&first));
}

#[test]
fn switch_projects_target_credentials() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("a", "token-a"));
    h.store.set_credentials_and_activate(admin("b", "token-b"));

    assert!(h.store.activate(&id("a")));
    let current = h.store.current().unwrap();
    assert_eq!(current.token, "token-a");
    assert_eq!(current.role, Some(Role::vendor()));

    assert!(h.store.activate(&id("b")));
    let current = h.store.current().unwrap();
    assert_eq!(current.token, "token-b");
    assert_eq!(current.role, Some(Role::admin()));
    assert_eq!(current.authorization(), "Bearer token-b");
}

#[test]
fn login_invalidates_every_domain_before_activation() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("a", "ta"));

    for spy in &h.spies {
        // Reset ran while storage still had no active account.
        assert_eq!(spy.resets(), vec![None], "domain {}", spy.id);
    }

    h.store.set_credentials_and_activate(vendor("b", "tb"));
    for spy in &h.spies {
        assert_eq!(spy.resets(), vec![None, Some("a".to_string())], "domain {}", spy.id);
    }
    assert_eq!(h.storage.get("activeUserId").unwrap().as_deref(), Some("b"));
}

#[test]
fn switching_accounts_invalidates() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("a", "ta"));
    h.store.set_credentials_and_activate(vendor("b", "tb"));
    let before = h.total_resets();

    h.store.activate(&id("a"));

    assert_eq!(h.total_resets(), before + CacheDomainId::ALL.len());
}

#[test]
fn logout_removes_only_the_active_account() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("b", "tb"));
    h.store.set_credentials_and_activate(vendor("a", "ta"));

    assert_eq!(h.store.deactivate_current(), Some(id("a")));

    let ids: Vec<_> = h.store.accounts().iter().map(|a| a.user_id().clone()).collect();
    assert_eq!(ids, vec![id("b")]);
    assert_eq!(h.store.active_user_id(), None);
    assert_eq!(h.store.current(), None);

    assert_eq!(h.storage.get("activeUserId").unwrap(), None);
    assert_eq!(h.storage.get("token").unwrap(), None);
    assert_eq!(h.storage.get("role").unwrap(), None);
}

#[test]
fn logout_of_last_account_clears_registry_key() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("a", "ta"));
    h.store.deactivate_current();

    assert!(h.storage.is_empty());
}

#[test]
fn partial_stat_patch_preserves_other_fields() {
    let mut h = Harness::new();
    let mut profile = UserProfile::new(id("a")).with_role(Role::vendor());
    profile.lead_credits = Some(5);
    profile.set_wallet_balance(100.0);
    h.store
        .set_credentials_and_activate(Credentials::new(profile, "ta", Role::vendor()));
    let resets = h.total_resets();

    assert!(h.store.apply_stats(StatPatch::balance(150.0)));

    let user = h.store.current().unwrap().user.unwrap();
    assert_eq!(user.lead_credits, Some(5));
    assert_eq!(user.wallet_balance(), Some(150.0));

    // Registry entry and persisted copy carry the same values.
    let entry = &h.store.find_account(&id("a")).unwrap().user;
    assert_eq!(entry, &user);
    let persisted = h.storage.get("accounts").unwrap().unwrap();
    assert!(persisted.contains("\"balance\":150.0"));

    assert_eq!(h.total_resets(), resets);
}

#[test]
fn stat_patch_without_session_is_noop() {
    let mut h = Harness::new();
    assert!(!h.store.apply_stats(StatPatch::credits(9)));
    assert!(h.storage.is_empty());
}

#[test]
fn restart_restores_accounts_and_active_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..SessionConfig::default()
    };

    let mut store = SessionStore::open(config.open_storage(), CacheInvalidator::default(), &config);
    store.set_credentials_and_activate(vendor("a", "ta"));
    store.set_credentials_and_activate(admin("b", "tb"));
    let before: Vec<_> = store.accounts().to_vec();
    store.dispose();

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let restarted = SessionStore::open(storage, CacheInvalidator::default(), &config);

    let mut after: Vec<_> = restarted.accounts().to_vec();
    let mut expected = before;
    after.sort_by(|x, y| x.user_id().cmp(y.user_id()));
    expected.sort_by(|x, y| x.user_id().cmp(y.user_id()));
    assert_eq!(after, expected);

    assert_eq!(restarted.active_user_id(), Some(&id("b")));
    assert_eq!(restarted.current().unwrap().token, "tb");
}

#[test]
fn corrupt_registry_yields_empty_store() {
    let storage = Arc::new(InMemoryStore::with_entries([
        ("accounts", "[{\"user\": oops"),
        ("activeUserId", "a"),
    ]));
    let h = Harness::with_storage(storage);

    assert!(h.store.accounts().is_empty());
    assert_eq!(h.store.current(), None);
}

#[test]
fn removing_inactive_account_leaves_session_alone() {
    let mut h = Harness::new();
    h.store.set_credentials_and_activate(vendor("b", "tb"));
    h.store.set_credentials_and_activate(vendor("a", "ta"));
    let current = h.store.current();
    let resets = h.total_resets();
    let events = h.store.subscribe();

    assert!(h.store.remove(&id("b")));

    assert_eq!(h.store.current(), current);
    assert_eq!(h.total_resets(), resets);
    assert_eq!(
        events.drain(),
        vec![SessionEvent::AccountRemoved { user_id: id("b") }]
    );
    assert!(h.store.other_accounts().is_empty());
}

#[test]
fn legacy_token_bootstraps_without_profile() {
    let storage = Arc::new(InMemoryStore::with_entries([("token", "jwt-from-v1"), ("role", "admin")]));
    let h = Harness::with_storage(storage);

    let current = h.store.current().unwrap();
    assert_eq!(current.user, None);
    assert_eq!(current.token, "jwt-from-v1");
    assert!(current.is_admin());
    assert_eq!(h.total_resets(), 0);
}

#[test]
fn switch_drops_results_fetched_under_previous_account() {
    let (invalidator, caches) = CacheInvalidator::with_default_domains();
    let mut store = SessionStore::open(
        Arc::new(InMemoryStore::new()),
        invalidator,
        &SessionConfig::default(),
    );
    store.set_credentials_and_activate(vendor("a", "ta"));
    store.set_credentials_and_activate(vendor("b", "tb"));
    store.activate(&id("a"));

    let leads = caches.get(CacheDomainId::Leads);
    let wallet = QueryKey::endpoint("getWalletBalance");
    leads.insert(wallet.clone(), serde_json::json!({"data": {"balance": 10}}));
    let in_flight = leads.begin_fetch(QueryKey::endpoint("getMyLeads"));

    store.activate(&id("b"));

    assert!(leads.get(&wallet).is_none());
    assert!(!leads.complete_fetch(in_flight, serde_json::json!(["lead of a"])));
}
