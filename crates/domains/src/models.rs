//! # Domain Models
//!
//! These structs represent the core entities of the donation exchange.
//! Identifiers are opaque strings: user ids come from the identity provider,
//! donation ids are assigned by the document store.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable account identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a donation document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(String);

impl DonationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DonationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A listing of an item offered for donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Image reference chosen at creation; never changed by an edit.
    #[serde(rename = "img")]
    pub image: String,
    pub creation_timestamp: DateTime<Utc>,
    pub owner_id: UserId,
    pub tags: Vec<String>,
    /// Every identity that reported this listing, each at most once.
    pub reports: Vec<UserId>,
}

impl Donation {
    pub fn is_owned_by(&self, uid: &UserId) -> bool {
        &self.owner_id == uid
    }

    pub fn has_report_from(&self, uid: &UserId) -> bool {
        self.reports.contains(uid)
    }
}

/// Caller-supplied fields for creating or editing a donation.
///
/// Unknown fields (`id`, `owner_id`, `reports`, ...) sent by clients are
/// ignored: those are owned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "img")]
    pub image: String,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A platform account record, one per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub uid: UserId,
    pub display_name: String,
    pub email: String,
    #[serde(rename = "registered_date")]
    pub registered_at: DateTime<Utc>,
    /// Provisioned out-of-band; no code path in this workspace sets it.
    pub admin: bool,
    pub donations_made: i64,
    /// Back-references to the donations this user owns.
    pub posts: Vec<DonationId>,
}

impl UserData {
    /// Builds the initial record for a freshly registered identity.
    pub fn from_identity(identity: &VerifiedIdentity) -> Self {
        Self {
            uid: identity.uid.clone(),
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            registered_at: identity.created_at,
            admin: false,
            donations_made: 0,
            posts: Vec::new(),
        }
    }
}

/// The outcome of a successful credential check, including the provider-side
/// profile used to seed a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub uid: UserId,
    pub display_name: String,
    pub email: String,
    /// When the provider-side account was created.
    pub created_at: DateTime<Utc>,
}

/// The global set of banned identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanList {
    users: BTreeSet<UserId>,
}

impl BanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uid: &UserId) -> bool {
        self.users.contains(uid)
    }

    /// Returns `false` when the identity was already present.
    pub fn insert(&mut self, uid: UserId) -> bool {
        self.users.insert(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<UserId> for BanList {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}
