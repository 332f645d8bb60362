use std::sync::Arc;

use domains::{BanRepo, DonationRepo, IdentityProvider, UserRepo};

/// The collaborators every service needs, constructed once at startup.
#[derive(Clone)]
pub struct Deps {
    pub donations: Arc<dyn DonationRepo>,
    pub users: Arc<dyn UserRepo>,
    pub bans: Arc<dyn BanRepo>,
    pub identity: Arc<dyn IdentityProvider>,
}
