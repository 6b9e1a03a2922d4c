use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use vendorhub_core::UserId;

use crate::{Role, UserProfile};

/// One authenticated identity known to this device.
///
/// # Invariants
/// - `user.id` is the registry key; at most one account per id is kept.
/// - `token` is opaque here and never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user: UserProfile,
    pub token: String,
    pub role: Role,

    /// Bookkeeping only; nothing orders or expires accounts by it.
    /// Millisecond precision, the same as on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_active: DateTime<Utc>,
}

impl Account {
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Record that this account was just used.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now.trunc_subsecs(3);
    }

    /// `Authorization` header value for requests made as this account.
    pub fn authorization(&self) -> String {
        bearer_header(&self.token)
    }
}

/// What a successful login, registration or OAuth code exchange yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub user: UserProfile,
    pub token: String,
    pub role: Role,
}

impl Credentials {
    pub fn new(user: UserProfile, token: impl Into<String>, role: Role) -> Self {
        Self {
            user,
            token: token.into(),
            role,
        }
    }

    pub fn into_account(self, now: DateTime<Utc>) -> Account {
        Account {
            user: self.user,
            token: self.token,
            role: self.role,
            last_active: now.trunc_subsecs(3),
        }
    }
}

/// Render a bearer `Authorization` header value.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}
