//! Applies an [`Intent`] against the repositories.
//!
//! Mutations run in order and the first failure aborts the rest, leaving
//! earlier steps applied. Cascaded donation purges and follow-ups never abort:
//! their failures are logged and skipped.

use tracing::{debug, warn};

use domains::{AppError, Result};

use crate::deps::Deps;
use crate::intent::{FollowUp, Intent, Mutation};

pub struct IntentExecutor {
    deps: Deps,
}

impl IntentExecutor {
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    pub async fn apply(&self, intent: &Intent) -> Result<()> {
        for mutation in &intent.mutations {
            self.apply_mutation(mutation).await?;
        }
        for follow_up in &intent.follow_ups {
            if let Err(err) = self.apply_follow_up(follow_up).await {
                warn!(?follow_up, error = %err, "follow-up failed, primary action kept");
            }
        }
        Ok(())
    }

    async fn apply_mutation(&self, mutation: &Mutation) -> Result<()> {
        debug!(?mutation, "applying");
        match mutation {
            Mutation::CreateUser(user) => self.deps.users.create_user(user).await,
            Mutation::CreateDonation(donation) => {
                self.deps.donations.create_donation(donation).await
            }
            Mutation::ReplaceDonation(donation) => {
                self.deps.donations.replace_donation(donation).await
            }
            Mutation::SetReports { donation, reports } => {
                self.deps.donations.set_reports(donation, reports).await
            }
            Mutation::DeleteDonation(id) => self.deps.donations.delete_donation(id).await,
            Mutation::PurgeDonation(id) => {
                match self.deps.donations.delete_donation(id).await {
                    Ok(()) | Err(AppError::NotFound(..)) => {}
                    Err(err) => warn!(donation = %id, error = %err, "failed deleting post"),
                }
                Ok(())
            }
            Mutation::SetPosts { uid, posts } => self.deps.users.set_posts(uid, posts).await,
            Mutation::DeleteUser(uid) => self.deps.users.delete_user(uid).await,
            Mutation::RegisterBan(uid) => self.deps.bans.add_ban(uid).await,
            Mutation::DeleteIdentity(uid) => self.deps.identity.delete_account(uid).await,
        }
    }

    async fn apply_follow_up(&self, follow_up: &FollowUp) -> Result<()> {
        match follow_up {
            FollowUp::IncrementDonationsMade(uid) => {
                let user = self
                    .deps
                    .users
                    .get_user(uid)
                    .await?
                    .ok_or_else(|| AppError::not_found("user", uid))?;
                self.deps
                    .users
                    .set_donations_made(uid, user.donations_made + 1)
                    .await
            }
        }
    }
}
