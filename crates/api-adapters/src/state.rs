//! Application state shared across all HTTP handlers.

use std::sync::Arc;

use domains::IdentityProvider;
use services::{Deps, DonationService, UserService};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub donations: Arc<DonationService>,
    pub users: Arc<UserService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(deps: Deps) -> Self {
        Self {
            identity: Arc::clone(&deps.identity),
            donations: Arc::new(DonationService::new(deps.clone())),
            users: Arc::new(UserService::new(deps)),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
