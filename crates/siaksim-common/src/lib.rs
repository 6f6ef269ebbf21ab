//! # Siaksim Common
//!
//! Shared types, errors, and constants used across the siaksim portal.
//!
//! ## Modules
//! - `types` - Core data structures (Session, UserRecord, FaultDecision)
//! - `error` - Portal error taxonomy
//! - `constants` - Cookie names, route paths, template markers

pub mod constants;
pub mod error;
pub mod types;

pub use error::PortalError;
pub use types::*;
