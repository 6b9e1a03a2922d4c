//! Account registry: every identity known to this device.

use serde_json::Value;

use vendorhub_auth::Account;
use vendorhub_core::UserId;

/// Ordered list of accounts, at most one per user id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted registry.
    ///
    /// Never fails: a malformed document, a non-list value or an unreadable
    /// entry is logged and skipped, leaving whatever could be recovered.
    pub fn from_json(raw: &str) -> Self {
        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "persisted accounts are not a list; starting empty");
                return Self::new();
            }
            Err(err) => {
                tracing::warn!("persisted accounts are malformed; starting empty: {err}");
                return Self::new();
            }
        };

        let mut registry = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Account>(entry) {
                Ok(account) => {
                    registry.upsert(account);
                }
                Err(err) => tracing::warn!(index, "skipping unreadable persisted account: {err}"),
            }
        }
        registry
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.accounts)
    }

    /// Insert `account`, replacing any entry with the same user id.
    ///
    /// Returns `true` when an existing entry was replaced.
    pub fn upsert(&mut self, account: Account) -> bool {
        match self.position(account.user_id()) {
            Some(index) => {
                self.accounts[index] = account;
                true
            }
            None => {
                self.accounts.push(account);
                false
            }
        }
    }

    /// Remove the account for `user_id`, if present.
    pub fn remove(&mut self, user_id: &UserId) -> Option<Account> {
        let index = self.position(user_id)?;
        Some(self.accounts.remove(index))
    }

    pub fn list(&self) -> &[Account] {
        &self.accounts
    }

    pub fn find_by_user_id(&self, user_id: &UserId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user_id() == user_id)
    }

    pub(crate) fn find_mut(&mut self, user_id: &UserId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.user_id() == user_id)
    }

    /// Accounts other than `user_id` (the picker's "switch to" list).
    pub fn others<'a>(&'a self, user_id: Option<&'a UserId>) -> impl Iterator<Item = &'a Account> + 'a {
        self.accounts
            .iter()
            .filter(move |a| Some(a.user_id()) != user_id)
    }

    /// Account whose token equals `token`.
    pub fn find_by_token(&self, token: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.token == token)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn position(&self, user_id: &UserId) -> Option<usize> {
        self.accounts.iter().position(|a| a.user_id() == user_id)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
