//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work
//! item inside a sprint, including its daily re-estimation ledger, time-spent
//! validation fields, and the append-only movement log.

use serde::{Deserialize, Serialize};

use crate::fields::Status;

/// Number of ledger slots per task, one per sprint day.
pub const SPRINT_SLOTS: usize = 10;

/// One entry in a task's status audit trail. Appended on every accepted
/// transition, never mutated or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub at_utc: i64,
    pub from: Status,
    pub to: Status,
    pub actor: String,
}

/// A work item tracked through the sprint workflow.
///
/// `daily_reestimates` always holds exactly [`SPRINT_SLOTS`] entries. Slot 0
/// has no independent meaning: reads resolve day 0 to `baseline_estimate`
/// (see `ledger::daily_value`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub sprint: String,
    pub status: Status,
    pub baseline_estimate: f64,
    pub daily_reestimates: Vec<f64>,
    #[serde(default)]
    pub time_spent: Option<f64>,
    #[serde(default)]
    pub time_spent_validated: bool,
    #[serde(default)]
    pub error_rate: Option<f64>,
    #[serde(default)]
    pub error_reason: Option<String>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
    pub status_changed_at_utc: i64,
    #[serde(default)]
    pub movements: Vec<Movement>,
}

impl Task {
    /// Create a task in Backlog with every ledger slot padded to the
    /// baseline estimate. A negative baseline is clamped to zero.
    pub fn new(id: u64, title: String, sprint: String, baseline_estimate: f64, now_utc: i64) -> Self {
        let baseline = baseline_estimate.max(0.0);
        Task {
            id,
            title,
            sprint,
            status: Status::Backlog,
            baseline_estimate: baseline,
            daily_reestimates: vec![baseline; SPRINT_SLOTS],
            time_spent: None,
            time_spent_validated: false,
            error_rate: None,
            error_reason: None,
            created_at_utc: now_utc,
            updated_at_utc: now_utc,
            status_changed_at_utc: now_utc,
            movements: Vec::new(),
        }
    }
}
