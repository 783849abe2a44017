//! Periodic sync scheduler for floor-price passes
//!
//! A pass iterates the configured collections in order, pacing each fetch
//! through the token bucket and upserting successes into the store. One
//! driver task fires passes on a fixed period; a firing that arrives while a
//! pass is still running is skipped and counted, never queued. The first
//! pass runs immediately at startup so the store is populated without
//! waiting a full period.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant};
use tracing::{error, info, warn};

use crate::database::RecordStore;
use crate::error::PassError;
use crate::models::PassStatus;
use crate::sync::fetcher::PriceFetcher;
use crate::sync::limiter::TokenBucket;

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between pass firings
    pub pass_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pass_interval_secs: 3600,
        }
    }
}

/// Result of a single sync pass
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Slugs upserted successfully, in pass order
    pub succeeded: Vec<String>,

    /// Failed slugs with the error that stopped them
    pub failed: HashMap<String, PassError>,
}

impl PassOutcome {
    /// Human-readable failure summary, None for a clean pass
    pub fn error_summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let total = self.succeeded.len() + self.failed.len();
        let mut slugs: Vec<&str> = self.failed.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        Some(format!(
            "{} of {} collections failed: {}",
            self.failed.len(),
            total,
            slugs.join(", ")
        ))
    }
}

/// Run one full pass over the collections
///
/// For each slug in order: acquire a token, fetch the floor price, upsert it.
/// A failure at the fetch or upsert step is recorded and the pass continues
/// with the next slug; nothing aborts the pass.
pub async fn run_one_pass<F, S>(
    collections: &[String],
    limiter: &TokenBucket,
    fetcher: &F,
    store: &S,
) -> PassOutcome
where
    F: PriceFetcher + ?Sized,
    S: RecordStore + ?Sized,
{
    let mut outcome = PassOutcome::default();

    for slug in collections {
        limiter.acquire().await;

        let price = match fetcher.fetch_floor_price(slug).await {
            Ok(price) => price,
            Err(err) => {
                warn!(
                    slug = %slug,
                    cause = %err.cause(),
                    error = %err,
                    "Fetch failed, skipping collection"
                );
                outcome.failed.insert(slug.clone(), err.into());
                continue;
            }
        };

        match store.upsert_floor_price(slug, price).await {
            Ok(()) => {
                info!(slug = %slug, floor_price = price, "Floor price updated");
                outcome.succeeded.push(slug.clone());
            }
            Err(err) => {
                warn!(slug = %slug, error = %err, "Upsert failed, skipping collection");
                outcome.failed.insert(slug.clone(), err.into());
            }
        }
    }

    outcome
}

/// Whether a requested firing started a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new pass was started
    Started,
    /// A pass was already running; the firing was skipped
    AlreadyRunning,
}

/// Errors from the manual-trigger handle
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriggerError {
    /// The scheduler is not running
    #[error("sync scheduler is not running")]
    SchedulerStopped,
}

/// Manual pass request
struct TriggerRequest {
    response: mpsc::Sender<TriggerOutcome>,
}

/// Handle for observing the scheduler and requesting passes
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<TriggerRequest>,
    pass_active: Arc<AtomicBool>,
    skipped_firings: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Request an immediate pass
    ///
    /// Subject to the same no-overlap rule as scheduled firings: if a pass is
    /// already running the request reports [`TriggerOutcome::AlreadyRunning`]
    /// instead of queueing.
    pub async fn trigger_pass(&self) -> Result<TriggerOutcome, TriggerError> {
        let (response_tx, mut response_rx) = mpsc::channel(1);

        self.trigger_tx
            .send(TriggerRequest {
                response: response_tx,
            })
            .await
            .map_err(|_| TriggerError::SchedulerStopped)?;

        response_rx
            .recv()
            .await
            .ok_or(TriggerError::SchedulerStopped)
    }

    /// Whether a pass is currently running
    pub fn pass_in_progress(&self) -> bool {
        self.pass_active.load(Ordering::SeqCst)
    }

    /// Count of firings skipped because a pass was still running
    pub fn skipped_firings(&self) -> u64 {
        self.skipped_firings.load(Ordering::SeqCst)
    }

    /// Create a handle that is not attached to a running scheduler
    ///
    /// Triggers through it report [`TriggerError::SchedulerStopped`]; useful
    /// for serving the CRUD surface without the pipeline.
    pub fn disconnected() -> Self {
        let (trigger_tx, _) = mpsc::channel(1);
        Self {
            trigger_tx,
            pass_active: Arc::new(AtomicBool::new(false)),
            skipped_firings: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Periodic driver for sync passes
pub struct SyncScheduler {
    config: SchedulerConfig,
    collections: Vec<String>,
    limiter: Arc<TokenBucket>,
    fetcher: Arc<dyn PriceFetcher>,
    store: Arc<dyn RecordStore>,
    pass_active: Arc<AtomicBool>,
    skipped_firings: Arc<AtomicU64>,
    shutdown_rx: broadcast::Receiver<()>,
    trigger_rx: mpsc::Receiver<TriggerRequest>,
    trigger_tx: mpsc::Sender<TriggerRequest>,
}

impl SyncScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - Scheduler configuration
    /// * `collections` - Ordered slugs to sync each pass
    /// * `limiter` - Token bucket pacing outbound fetches
    /// * `fetcher` - Floor-price source
    /// * `store` - Record store for upserts and pass status
    /// * `shutdown_rx` - Broadcast receiver for shutdown signal
    pub fn new(
        config: SchedulerConfig,
        collections: Vec<String>,
        limiter: Arc<TokenBucket>,
        fetcher: Arc<dyn PriceFetcher>,
        store: Arc<dyn RecordStore>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(8);

        Self {
            config,
            collections,
            limiter,
            fetcher,
            store,
            pass_active: Arc::new(AtomicBool::new(false)),
            skipped_firings: Arc::new(AtomicU64::new(0)),
            shutdown_rx,
            trigger_rx,
            trigger_tx,
        }
    }

    /// Get a handle for observation and manual triggering
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            trigger_tx: self.trigger_tx.clone(),
            pass_active: Arc::clone(&self.pass_active),
            skipped_firings: Arc::clone(&self.skipped_firings),
        }
    }

    /// Run the scheduler until the shutdown signal arrives
    pub async fn run(mut self) {
        info!(
            collections = self.collections.len(),
            interval_secs = self.config.pass_interval_secs,
            "Starting sync scheduler"
        );

        // Initial pass before the timer, so data is available within the
        // first period after startup.
        self.fire();

        let period = Duration::from_secs(self.config.pass_interval_secs);
        let mut timer = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping sync scheduler");
                    break;
                }
                _ = timer.tick() => {
                    self.fire();
                }
                Some(request) = self.trigger_rx.recv() => {
                    info!("Manual sync pass requested");
                    let outcome = self.fire();
                    let _ = request.response.send(outcome).await;
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    /// Start a pass unless one is already running
    fn fire(&self) -> TriggerOutcome {
        if self.pass_active.swap(true, Ordering::SeqCst) {
            let skipped = self.skipped_firings.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(
                skipped_total = skipped,
                "Pass still in progress, skipping this firing"
            );
            return TriggerOutcome::AlreadyRunning;
        }

        let collections = self.collections.clone();
        let limiter = Arc::clone(&self.limiter);
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let pass_active = Arc::clone(&self.pass_active);

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome =
                run_one_pass(&collections, &limiter, fetcher.as_ref(), store.as_ref()).await;

            let status = PassStatus::completed(
                outcome.succeeded.len() as u64,
                outcome.failed.len() as u64,
                outcome.error_summary(),
            );
            if let Err(err) = store.update_pass_status(&status).await {
                error!(error = %err, "Failed to persist pass status");
            }

            info!(
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pass complete"
            );

            pass_active.store(false, Ordering::SeqCst);
        });

        TriggerOutcome::Started
    }
}
