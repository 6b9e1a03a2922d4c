use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The fixed set of independently fetched resource groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDomainId {
    Vendor,
    Leads,
    Admin,
    Billing,
    Blog,
}

impl CacheDomainId {
    pub const ALL: [CacheDomainId; 5] = [
        CacheDomainId::Vendor,
        CacheDomainId::Leads,
        CacheDomainId::Admin,
        CacheDomainId::Billing,
        CacheDomainId::Blog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDomainId::Vendor => "vendor",
            CacheDomainId::Leads => "leads",
            CacheDomainId::Admin => "admin",
            CacheDomainId::Billing => "billing",
            CacheDomainId::Blog => "blog",
        }
    }
}

impl core::fmt::Display for CacheDomainId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cache that can be flushed as a unit.
pub trait CacheDomain: Send + Sync {
    fn id(&self) -> CacheDomainId;

    /// Drop every cached result and subscription, and orphan in-flight fetches.
    fn reset(&self);
}

impl<D> CacheDomain for Arc<D>
where
    D: CacheDomain + ?Sized,
{
    fn id(&self) -> CacheDomainId {
        (**self).id()
    }

    fn reset(&self) {
        (**self).reset()
    }
}
