//! relief-exchange/crates/domains/src/lib.rs
//!
//! The entities, error taxonomy and port definitions shared by every crate.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
