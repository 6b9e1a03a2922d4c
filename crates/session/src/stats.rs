//! Incremental account stats confirmed by the server.

use serde::Deserialize;

use vendorhub_auth::UserProfile;

/// Partial update of the active account's balances.
///
/// Deserializes straight from purchase and top-up responses: lead purchases
/// report `leadCredits`/`walletBalance`, payment verification reports
/// `updatedBalance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatPatch {
    #[serde(default)]
    pub lead_credits: Option<i64>,

    #[serde(default, alias = "updatedBalance")]
    pub wallet_balance: Option<f64>,
}

impl StatPatch {
    pub fn credits(credits: i64) -> Self {
        Self {
            lead_credits: Some(credits),
            ..Self::default()
        }
    }

    pub fn balance(balance: f64) -> Self {
        Self {
            wallet_balance: Some(balance),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lead_credits.is_none() && self.wallet_balance.is_none()
    }

    /// Merge present fields into `profile`; absent fields are left alone.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(credits) = self.lead_credits {
            profile.lead_credits = Some(credits);
        }
        if let Some(balance) = self.wallet_balance {
            profile.set_wallet_balance(balance);
        }
    }
}
