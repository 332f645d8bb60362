//! Account operations: registration, lookups, bans and self-deletion.

use tracing::{info, instrument};

use domains::{AppError, Result, UserData, UserId, VerifiedIdentity};

use crate::deps::Deps;
use crate::executor::IntentExecutor;
use crate::lookup::Lookup;
use crate::policy;
use crate::validation::validate_identity;

pub struct UserService {
    deps: Deps,
    lookup: Lookup,
    executor: IntentExecutor,
}

impl UserService {
    pub fn new(deps: Deps) -> Self {
        Self {
            lookup: Lookup::new(deps.clone()),
            executor: IntentExecutor::new(deps.clone()),
            deps,
        }
    }

    /// Creates the account record for a verified identity from its
    /// provider-side profile.
    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    pub async fn create_account(&self, identity: &VerifiedIdentity) -> Result<UserData> {
        validate_identity(&identity.uid)?;
        let banned = self.lookup.is_banned(&identity.uid).await?;
        let existing = self.deps.users.get_user(&identity.uid).await?;

        let intent = policy::can_create_account(identity, banned, existing.is_some())
            .inspect_err(|err| info!(error = %err, "registration refused"))?;
        self.executor.apply(&intent).await?;
        info!("account created");
        Ok(UserData::from_identity(identity))
    }

    pub async fn get_user(&self, uid: &UserId) -> Result<UserData> {
        policy::can_read_user_data(self.lookup.is_banned(uid).await?)?;
        self.deps
            .users
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::not_found("user", uid))
    }

    pub async fn is_banned(&self, uid: &UserId) -> Result<bool> {
        self.lookup.is_banned(uid).await
    }

    /// Fails with `NotFound` for identities without an account and with an
    /// integrity error when the stored flag is unusable.
    pub async fn is_admin(&self, uid: &UserId) -> Result<bool> {
        self.deps
            .users
            .get_user(uid)
            .await?
            .map(|u| u.admin)
            .ok_or_else(|| AppError::not_found("user", uid))
    }

    /// Deletes the target's listings and account, then records the ban.
    #[instrument(skip(self), fields(acting = %acting, target = %target))]
    pub async fn ban_user(&self, acting: &UserId, target: &UserId) -> Result<()> {
        validate_identity(acting)?;
        validate_identity(target)?;
        let (actor, _) = self.lookup.actor(acting).await?;
        let target_banned = self.lookup.is_banned(target).await?;
        let record = if target_banned {
            None
        } else {
            self.deps.users.get_user(target).await?
        };

        let intent = policy::can_ban_user(&actor, target, record.as_ref(), target_banned)
            .inspect_err(|err| info!(error = %err, "ban refused"))?;
        self.executor.apply(&intent).await?;
        info!("user banned");
        Ok(())
    }

    /// Deletes the caller's listings, account record and provider account.
    /// The identity is not banned and may register again.
    #[instrument(skip(self), fields(acting = %acting, target = %target))]
    pub async fn delete_self(&self, acting: &UserId, target: &UserId) -> Result<()> {
        validate_identity(acting)?;
        let record = if acting == target {
            self.deps.users.get_user(target).await?
        } else {
            None
        };

        let intent = policy::can_delete_self(acting, target, record.as_ref())
            .inspect_err(|err| info!(error = %err, "account deletion refused"))?;
        self.executor.apply(&intent).await?;
        info!("account deleted");
        Ok(())
    }
}
