//! Donation listing operations: read, create, edit, delete, report.

use chrono::Utc;
use tracing::{info, instrument, warn};

use domains::{AppError, Donation, DonationDraft, DonationId, Result, UserId};

use crate::deps::Deps;
use crate::executor::IntentExecutor;
use crate::lookup::Lookup;
use crate::policy;
use crate::validation::{normalize_draft, validate_identity};

pub struct DonationService {
    deps: Deps,
    lookup: Lookup,
    executor: IntentExecutor,
}

impl DonationService {
    pub fn new(deps: Deps) -> Self {
        Self {
            lookup: Lookup::new(deps.clone()),
            executor: IntentExecutor::new(deps.clone()),
            deps,
        }
    }

    /// Every listing, newest first.
    pub async fn list_donations(&self) -> Result<Vec<Donation>> {
        let mut donations = self.deps.donations.list_donations().await?;
        donations.sort_by(|a, b| {
            b.creation_timestamp
                .cmp(&a.creation_timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(donations)
    }

    pub async fn get_donation(&self, id: &DonationId) -> Result<Donation> {
        self.deps
            .donations
            .get_donation(id)
            .await?
            .ok_or_else(|| AppError::not_found("donation", id))
    }

    /// Returns the id of the new listing. The owner's donation counter is
    /// bumped afterwards on a best-effort basis.
    #[instrument(skip(self, draft), fields(caller = %caller))]
    pub async fn create_donation(&self, caller: &UserId, draft: DonationDraft) -> Result<DonationId> {
        validate_identity(caller)?;
        let draft = normalize_draft(draft)?;
        let (actor, record) = self.lookup.actor(caller).await?;

        let id = self.deps.donations.allocate_id();
        let intent = policy::can_create_donation(&actor, record.as_ref(), id.clone(), draft, Utc::now())
            .inspect_err(|err| info!(error = %err, "donation creation refused"))?;
        self.executor.apply(&intent).await?;

        info!(donation = %id, "donation created");
        Ok(id)
    }

    #[instrument(skip(self, draft), fields(caller = %caller, donation = %id))]
    pub async fn edit_donation(
        &self,
        caller: &UserId,
        id: &DonationId,
        draft: DonationDraft,
    ) -> Result<()> {
        validate_identity(caller)?;
        let draft = normalize_draft(draft)?;
        let existing = self.get_donation(id).await?;
        let (actor, _) = self.lookup.actor(caller).await?;

        let intent = policy::can_edit_donation(&actor, &existing, draft)
            .inspect_err(|err| info!(error = %err, "edit refused"))?;
        self.executor.apply(&intent).await?;
        info!("donation edited");
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, donation = %id))]
    pub async fn delete_donation(&self, caller: &UserId, id: &DonationId) -> Result<()> {
        validate_identity(caller)?;
        let existing = self.get_donation(id).await?;
        let (actor, _) = self.lookup.actor(caller).await?;
        let owner = self.deps.users.get_user(&existing.owner_id).await?;
        if owner.is_none() {
            warn!(owner = %existing.owner_id, "owner record missing, post list left alone");
        }

        let intent = policy::can_delete_donation(&actor, &existing, owner.as_ref())
            .inspect_err(|err| info!(error = %err, "delete refused"))?;
        self.executor.apply(&intent).await?;
        info!("donation deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(caller = %caller, donation = %id))]
    pub async fn report_donation(&self, caller: &UserId, id: &DonationId) -> Result<()> {
        validate_identity(caller)?;
        let existing = self.get_donation(id).await?;
        let (actor, _) = self.lookup.actor(caller).await?;

        let intent = policy::can_report_donation(&actor, &existing)
            .inspect_err(|err| info!(error = %err, "report refused"))?;
        self.executor.apply(&intent).await?;
        info!("donation reported");
        Ok(())
    }
}
