//! # Siaksim - SIAK-NG Portal Mock
//!
//! A satirical replica of a notoriously unreliable university registration
//! portal. Every request under `/main/` passes the navigation gate, then the
//! fault injector, which may fabricate delays, overload pages, or forced
//! re-authentication before the real handler ever runs.
//!
//! ## Architecture
//! ```text
//! Client → Navigation Gate → Fault Injector → Course-Flow Handlers
//!                                                   ↓
//!                                            SQLite (records)
//! ```

pub mod captcha;
pub mod config;
pub mod error;
pub mod faults;
pub mod gate;
pub mod pages;
pub mod password;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod token;

pub use config::{AppConfig, Args};
pub use state::AppState;
