//! Identity entity representing a registered member.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entitlement tier controlling the daily match quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementTier {
    #[default]
    Free,
    Premium,
}

impl EntitlementTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementTier::Free => "free",
            EntitlementTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for EntitlementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile attributes shown to other members; opaque to matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DisplayAttributes {
    pub name: String,
    pub age: Option<u8>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Identity record as held by the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier
    pub id: Uuid,

    /// Login handle
    pub email: String,

    /// Password hash; never serialized outward
    #[serde(skip_serializing, default)]
    pub credential_hash: String,

    /// Profile attributes
    pub display: DisplayAttributes,

    /// Entitlement tier
    pub tier: EntitlementTier,

    /// Whether the account is active
    pub is_active: bool,

    /// Whether the account has been verified
    pub is_verified: bool,

    /// Timestamp when the identity was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last activity; candidate pools are ordered by it
    pub last_active_at: DateTime<Utc>,
}

impl Identity {
    /// Creates a new, active but unverified identity on the free tier
    pub fn new(
        email: impl Into<String>,
        credential_hash: impl Into<String>,
        display: DisplayAttributes,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            credential_hash: credential_hash.into(),
            display,
            tier: EntitlementTier::Free,
            is_active: true,
            is_verified: false,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Whether this identity may request matches and appear as a candidate
    pub fn can_match(&self) -> bool {
        self.is_active && self.is_verified
    }

    /// Marks the identity as verified
    pub fn verify(&mut self) {
        self.is_verified = true;
    }

    /// Deactivates the account
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Changes the entitlement tier
    pub fn set_tier(&mut self, tier: EntitlementTier) {
        self.tier = tier;
    }

    /// Records activity
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }
}
