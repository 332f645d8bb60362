//! # auth-adapters
//!
//! Identity provider implementations for the `IdentityProvider` port.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityProvider, JwtSettings, JwtSetupError};
