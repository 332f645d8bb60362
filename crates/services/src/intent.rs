//! Entity-level descriptions of the writes a policy decision requires.

use domains::{Donation, DonationId, UserData, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateUser(UserData),
    CreateDonation(Donation),
    /// Full overwrite of an existing donation.
    ReplaceDonation(Donation),
    SetReports {
        donation: DonationId,
        reports: Vec<UserId>,
    },
    DeleteDonation(DonationId),
    /// Part of an account cascade: a failure is logged and the cascade goes on.
    PurgeDonation(DonationId),
    SetPosts {
        uid: UserId,
        posts: Vec<DonationId>,
    },
    DeleteUser(UserId),
    RegisterBan(UserId),
    DeleteIdentity(UserId),
}

/// Applied after every mutation has committed. Failures are logged only.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUp {
    IncrementDonationsMade(UserId),
}

/// The ordered set of writes an allowed action requires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    pub mutations: Vec<Mutation>,
    pub follow_ups: Vec<FollowUp>,
}

impl Intent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    pub fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_ups.push(follow_up);
        self
    }

    /// The id of the donation this intent creates, if any.
    pub fn created_donation(&self) -> Option<&DonationId> {
        self.mutations.iter().find_map(|m| match m {
            Mutation::CreateDonation(d) => Some(&d.id),
            _ => None,
        })
    }
}
