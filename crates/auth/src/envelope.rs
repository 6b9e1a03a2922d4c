//! Backend authentication responses.
//!
//! Password login, Google code exchange and vendor registration all answer
//! with the same `{ "data": { "vendor": ..., "token": ... } }` envelope. This
//! module turns that envelope into [`Credentials`] or explains why it can't.

use serde::Deserialize;
use thiserror::Error;

use crate::{Credentials, UserProfile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthResponseError {
    /// OAuth succeeded but no vendor exists for that identity yet.
    #[error("account not found; sign up first")]
    UnregisteredVendor,

    #[error("invalid server response: {0}")]
    InvalidResponse(&'static str),

    #[error("profile carries no role")]
    MissingRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthEnvelope {
    #[serde(default)]
    pub data: Option<AuthData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    #[serde(default)]
    pub vendor: Option<UserProfile>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub is_new_vendor: bool,
}

impl AuthEnvelope {
    /// Parse a raw response body.
    pub fn from_json(body: &str) -> Result<Self, AuthResponseError> {
        serde_json::from_str(body).map_err(|_| AuthResponseError::InvalidResponse("malformed body"))
    }

    pub fn into_credentials(self) -> Result<Credentials, AuthResponseError> {
        let data = self
            .data
            .ok_or(AuthResponseError::InvalidResponse("missing data"))?;

        if data.is_new_vendor {
            return Err(AuthResponseError::UnregisteredVendor);
        }

        let token = data
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthResponseError::InvalidResponse("missing token"))?;
        let user = data
            .vendor
            .ok_or(AuthResponseError::InvalidResponse("missing vendor"))?;
        let role = user.role.clone().ok_or(AuthResponseError::MissingRole)?;

        Ok(Credentials::new(user, token, role))
    }
}
