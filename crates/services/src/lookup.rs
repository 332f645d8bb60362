//! Fresh reads of the facts the policy decides on.

use domains::{Result, UserData, UserId};

use crate::deps::Deps;
use crate::policy::Actor;

pub(crate) struct Lookup {
    deps: Deps,
}

impl Lookup {
    pub(crate) fn new(deps: Deps) -> Self {
        Self { deps }
    }

    pub(crate) async fn is_banned(&self, uid: &UserId) -> Result<bool> {
        Ok(self.deps.bans.load_bans().await?.contains(uid))
    }

    /// Loads ban status and the account record in one go. An identity without
    /// a record cannot hold the admin flag.
    pub(crate) async fn actor(&self, uid: &UserId) -> Result<(Actor, Option<UserData>)> {
        let banned = self.is_banned(uid).await?;
        let record = self.deps.users.get_user(uid).await?;
        let actor = Actor {
            uid: uid.clone(),
            banned,
            admin: record.as_ref().is_some_and(|u| u.admin),
        };
        Ok((actor, record))
    }
}
