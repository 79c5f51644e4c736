//! Shared identifier types used across the registration service crates.

pub mod types;

pub use types::{RecordId, UserId};
