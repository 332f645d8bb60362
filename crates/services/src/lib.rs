//! # services
//!
//! The authorization and consistency policy, and the application services
//! that feed it fresh state and apply its decisions.

pub mod deps;
pub mod donations;
pub mod executor;
pub mod intent;
mod lookup;
pub mod policy;
pub mod users;
pub mod validation;

pub use deps::Deps;
pub use donations::DonationService;
pub use executor::IntentExecutor;
pub use intent::{FollowUp, Intent, Mutation};
pub use policy::Actor;
pub use users::UserService;
