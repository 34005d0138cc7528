//! bdstream-core: shared types, IDs, errors, configuration, and disc-clock helpers.
//!
//! This crate is the foundational dependency for the other bdstream crates,
//! providing the unified error type, the navigation configuration, typed
//! session identifiers and the media-domain enums used on both sides of the
//! navigation engine boundary.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use config::NavConfig;
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
