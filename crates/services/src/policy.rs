//! # Authorization & Consistency Policy
//!
//! Pure decision functions. Each takes the freshly read state relevant to one
//! action and either refuses it or returns the [`Intent`] that applies it
//! while keeping the denormalized fields (posts, donation counters, report
//! and ban lists) consistent.
//!
//! Nothing here touches a repository; the caller is responsible for reading
//! current state right before deciding and for applying the returned intent.

use chrono::{DateTime, Utc};
use domains::{
    AppError, Denial, Donation, DonationDraft, DonationId, Result, UserData, UserId,
    VerifiedIdentity,
};

use crate::intent::{FollowUp, Intent, Mutation};

/// What the policy knows about the acting identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: UserId,
    pub banned: bool,
    /// `false` when the identity has no account record.
    pub admin: bool,
}

impl Actor {
    fn may_manage(&self, donation: &Donation) -> bool {
        donation.is_owned_by(&self.uid) || self.admin
    }
}

pub fn can_create_account(
    identity: &VerifiedIdentity,
    banned: bool,
    already_registered: bool,
) -> Result<Intent> {
    if banned {
        return Err(AppError::Forbidden(Denial::Banned));
    }
    if already_registered {
        return Err(AppError::Conflict(format!(
            "an account already exists for {}",
            identity.uid
        )));
    }
    Ok(Intent::new().with(Mutation::CreateUser(UserData::from_identity(identity))))
}

/// `owner` is the actor's own account record, which receives the
/// back-reference.
pub fn can_create_donation(
    actor: &Actor,
    owner: Option<&UserData>,
    id: DonationId,
    draft: DonationDraft,
    now: DateTime<Utc>,
) -> Result<Intent> {
    if actor.banned {
        return Err(AppError::Forbidden(Denial::Banned));
    }
    let owner = owner.ok_or_else(|| AppError::not_found("user", &actor.uid))?;

    let donation = Donation {
        id: id.clone(),
        title: draft.title,
        description: draft.description,
        location: draft.location,
        image: draft.image,
        creation_timestamp: draft.creation_timestamp.unwrap_or(now),
        owner_id: actor.uid.clone(),
        tags: draft.tags,
        reports: Vec::new(),
    };

    let mut posts = owner.posts.clone();
    posts.push(id);

    Ok(Intent::new()
        .with(Mutation::CreateDonation(donation))
        .with(Mutation::SetPosts {
            uid: actor.uid.clone(),
            posts,
        })
        .then(FollowUp::IncrementDonationsMade(actor.uid.clone())))
}

pub fn can_edit_donation(actor: &Actor, existing: &Donation, draft: DonationDraft) -> Result<Intent> {
    if !actor.may_manage(existing) {
        return Err(AppError::Forbidden(Denial::NotOwnerOrAdmin));
    }
    if actor.banned {
        return Err(AppError::Forbidden(Denial::Banned));
    }

    let edited = Donation {
        id: existing.id.clone(),
        title: draft.title,
        description: draft.description,
        location: draft.location,
        image: existing.image.clone(),
        creation_timestamp: existing.creation_timestamp,
        owner_id: existing.owner_id.clone(),
        tags: draft.tags,
        reports: Vec::new(),
    };
    Ok(Intent::new().with(Mutation::ReplaceDonation(edited)))
}

/// Ban status is not consulted. `owner` is `None` when the owner's record is
/// already gone.
pub fn can_delete_donation(
    actor: &Actor,
    existing: &Donation,
    owner: Option<&UserData>,
) -> Result<Intent> {
    if !actor.may_manage(existing) {
        return Err(AppError::Forbidden(Denial::NotOwnerOrAdmin));
    }

    let mut intent = Intent::new().with(Mutation::DeleteDonation(existing.id.clone()));
    if let Some(owner) = owner {
        let posts: Vec<DonationId> = owner
            .posts
            .iter()
            .filter(|p| **p != existing.id)
            .cloned()
            .collect();
        intent = intent.with(Mutation::SetPosts {
            uid: owner.uid.clone(),
            posts,
        });
    }
    Ok(intent)
}

pub fn can_report_donation(actor: &Actor, existing: &Donation) -> Result<Intent> {
    if actor.banned {
        return Err(AppError::Forbidden(Denial::Banned));
    }
    if existing.has_report_from(&actor.uid) {
        return Err(AppError::Conflict(format!(
            "{} has already reported donation {}",
            actor.uid, existing.id
        )));
    }

    let mut reports = existing.reports.clone();
    reports.push(actor.uid.clone());
    Ok(Intent::new().with(Mutation::SetReports {
        donation: existing.id.clone(),
        reports,
    }))
}

/// `target` is the target's account record; banned identities never have one,
/// so the ban check runs before the existence check.
pub fn can_ban_user(
    actor: &Actor,
    target_uid: &UserId,
    target: Option<&UserData>,
    target_banned: bool,
) -> Result<Intent> {
    if !actor.admin {
        return Err(AppError::Forbidden(Denial::NotAdmin));
    }
    if target_banned {
        return Err(AppError::Forbidden(Denial::AlreadyBanned));
    }
    let target = target.ok_or_else(|| AppError::not_found("user", target_uid))?;
    if target.admin {
        return Err(AppError::Forbidden(Denial::TargetIsAdmin));
    }

    Ok(purge_account(target).with(Mutation::RegisterBan(target.uid.clone())))
}

pub fn can_delete_self(
    acting: &UserId,
    target_uid: &UserId,
    target: Option<&UserData>,
) -> Result<Intent> {
    if acting != target_uid {
        return Err(AppError::Forbidden(Denial::NotSelf));
    }
    let target = target.ok_or_else(|| AppError::not_found("user", target_uid))?;

    Ok(purge_account(target).with(Mutation::DeleteIdentity(target.uid.clone())))
}

/// Reads are open to everyone, except account records of banned identities.
pub fn can_read_user_data(target_banned: bool) -> Result<()> {
    if target_banned {
        return Err(AppError::Forbidden(Denial::TargetBanned));
    }
    Ok(())
}

fn purge_account(target: &UserData) -> Intent {
    let mut intent = Intent::new();
    for post in &target.posts {
        intent = intent.with(Mutation::PurgeDonation(post.clone()));
    }
    intent.with(Mutation::DeleteUser(target.uid.clone()))
}
