//! Sync pass status models
//!
//! A single persisted row summarizes the most recent sync pass. It is
//! informational only; the pipeline never reads it back to make decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome category of the most recent pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    /// No pass has completed yet
    Pending,
    /// A pass is currently running
    Running,
    /// The last pass completed with no failures
    Success,
    /// The last pass completed with at least one failed collection
    Failed,
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassState::Pending => write!(f, "pending"),
            PassState::Running => write!(f, "running"),
            PassState::Success => write!(f, "success"),
            PassState::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PassState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PassState::Pending),
            "running" => Ok(PassState::Running),
            "success" => Ok(PassState::Success),
            "failed" => Ok(PassState::Failed),
            other => Err(format!("unknown pass state: {}", other)),
        }
    }
}

/// Persisted summary of the most recent sync pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassStatus {
    /// When the last pass completed
    pub last_pass_at: Option<DateTime<Utc>>,

    /// Outcome of the last pass
    pub state: PassState,

    /// Human-readable summary of failures, if any
    pub error_message: Option<String>,

    /// Number of collections updated in the last pass
    pub succeeded: u64,

    /// Number of collections that failed in the last pass
    pub failed: u64,
}

impl Default for PassStatus {
    fn default() -> Self {
        Self {
            last_pass_at: None,
            state: PassState::Pending,
            error_message: None,
            succeeded: 0,
            failed: 0,
        }
    }
}

impl PassStatus {
    /// Build the status row for a completed pass
    pub fn completed(succeeded: u64, failed: u64, error_message: Option<String>) -> Self {
        Self {
            last_pass_at: Some(Utc::now()),
            state: if failed == 0 {
                PassState::Success
            } else {
                PassState::Failed
            },
            error_message,
            succeeded,
            failed,
        }
    }
}
