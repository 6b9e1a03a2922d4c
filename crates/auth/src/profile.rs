//! User profile as returned by the backend.
//!
//! The backend attaches many role-specific fields (business details, photos,
//! categories). Only the fields this layer reasons about are typed; the rest
//! are carried verbatim in `extra` so nothing is lost across persistence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vendorhub_core::UserId;

use crate::Role;

/// Wallet sub-document of a vendor profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profile of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_credits: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Wallet>,

    /// Every other field the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            vendor_name: None,
            role: None,
            lead_credits: None,
            wallet: None,
            extra: Map::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_vendor_name(mut self, name: impl Into<String>) -> Self {
        self.vendor_name = Some(name.into());
        self
    }

    /// Name shown in greetings and account pickers.
    pub fn display_name(&self) -> &str {
        match self.vendor_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "User",
        }
    }

    pub fn wallet_balance(&self) -> Option<f64> {
        self.wallet.as_ref().and_then(|w| w.balance)
    }

    /// Set the wallet balance, creating the wallet sub-document if needed.
    pub fn set_wallet_balance(&mut self, balance: f64) {
        self.wallet.get_or_insert_with(Wallet::default).balance = Some(balance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "_id": "v-1",
            "vendorName": "Marigold Venues",
            "role": "vendor",
            "leadCredits": 5,
            "wallet": { "balance": 100.0, "currency": "INR" },
            "email": "hello@marigold.example",
            "city": "Jaipur"
        });

        let profile: UserProfile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(profile.id.as_str(), "v-1");
        assert_eq!(profile.lead_credits, Some(5));
        assert_eq!(profile.wallet_balance(), Some(100.0));
        assert_eq!(profile.extra.get("city"), Some(&json!("Jaipur")));

        assert_eq!(serde_json::to_value(&profile).unwrap(), raw);
    }

    #[test]
    fn display_name_falls_back() {
        let profile = UserProfile::new(UserId::new("a"));
        assert_eq!(profile.display_name(), "User");
        assert_eq!(profile.with_vendor_name("Lotus").display_name(), "Lotus");
    }

    #[test]
    fn set_wallet_balance_creates_wallet() {
        let mut profile = UserProfile::new(UserId::new("a"));
        assert_eq!(profile.wallet_balance(), None);
        profile.set_wallet_balance(42.5);
        assert_eq!(profile.wallet_balance(), Some(42.5));
    }
}
