//! Floor-price synchronization pipeline
//!
//! This module contains the scheduled sync pipeline: token-bucket rate
//! limiting for outbound calls, the upstream price fetcher, and the periodic
//! pass scheduler.
//!
//! # Components
//!
//! - [`limiter`]: Token-bucket admission gate bounding the outbound call rate
//! - [`fetcher`]: Floor-price fetcher for the upstream collection API
//! - [`scheduler`]: Periodic pass driver with overlap skipping

pub mod fetcher;
pub mod limiter;
pub mod scheduler;

// Re-export main types for convenience
pub use fetcher::{OpenSeaFetcher, PriceFetcher};
pub use limiter::{LimiterConfig, TokenBucket};
pub use scheduler::{
    run_one_pass, PassOutcome, SchedulerConfig, SchedulerHandle, SyncScheduler, TriggerError,
    TriggerOutcome,
};
