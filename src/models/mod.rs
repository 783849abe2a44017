//! Domain models for floorwatch
//!
//! This module contains the core domain models used throughout the application.

pub mod pass;
pub mod record;

// Re-export commonly used types
pub use pass::{PassState, PassStatus};
pub use record::{CollectionRecord, NewCollectionRecord};
