//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Repositories speak in typed entities only; converting to and from the
//! document store's field maps is the adapter's job.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BanList, Donation, DonationId, UserData, UserId, VerifiedIdentity};

/// Persistence contract for donation listings.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DonationRepo: Send + Sync {
    /// Reserves a fresh id that no stored donation uses.
    fn allocate_id(&self) -> DonationId;

    async fn get_donation(&self, id: &DonationId) -> Result<Option<Donation>>;

    /// Every stored donation, in no particular order.
    async fn list_donations(&self) -> Result<Vec<Donation>>;

    /// Fails with `Conflict` if the id is already taken.
    async fn create_donation(&self, donation: &Donation) -> Result<()>;

    /// Overwrites every field of an existing record. Fails with `NotFound`
    /// once the donation is deleted, so a stale edit never recreates it.
    async fn replace_donation(&self, donation: &Donation) -> Result<()>;

    async fn set_reports(&self, id: &DonationId, reports: &[UserId]) -> Result<()>;

    async fn delete_donation(&self, id: &DonationId) -> Result<()>;
}

/// Persistence contract for account records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user(&self, uid: &UserId) -> Result<Option<UserData>>;

    /// Fails with `Conflict` if a record already exists for the uid.
    async fn create_user(&self, user: &UserData) -> Result<()>;

    async fn set_posts(&self, uid: &UserId, posts: &[DonationId]) -> Result<()>;

    async fn set_donations_made(&self, uid: &UserId, count: i64) -> Result<()>;

    async fn delete_user(&self, uid: &UserId) -> Result<()>;
}

/// The global ban registry.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BanRepo: Send + Sync {
    /// An absent registry reads as an empty list.
    async fn load_bans(&self) -> Result<BanList>;

    async fn add_ban(&self, uid: &UserId) -> Result<()>;
}

/// Identity verification contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validates a bearer credential. Errors are always `Unauthenticated`
    /// unless the provider itself is unreachable.
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity>;

    /// Removes the provider-side account so its credentials stop verifying.
    async fn delete_account(&self, uid: &UserId) -> Result<()>;
}
