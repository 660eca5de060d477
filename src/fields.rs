//! Field types shared across the sprint board.
//!
//! This module defines the workflow `Status` enum whose declaration order is
//! the board's total order (Backlog → Prioritized → Doing → Done), plus the
//! small helpers built on that order.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status. The derive of `Ord` makes declaration order the board
/// order, which single-step moves and WIP gating rely on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "Backlog")]
    Backlog,
    #[serde(alias = "Prioritized")]
    Prioritized,
    #[serde(alias = "Doing")]
    Doing,
    #[serde(alias = "Done")]
    Done,
}

impl Status {
    /// Next status in board order, if any.
    pub fn forward(self) -> Option<Status> {
        match self {
            Status::Backlog => Some(Status::Prioritized),
            Status::Prioritized => Some(Status::Doing),
            Status::Doing => Some(Status::Done),
            Status::Done => None,
        }
    }

    /// Previous status in board order, if any.
    pub fn backward(self) -> Option<Status> {
        match self {
            Status::Backlog => None,
            Status::Prioritized => Some(Status::Backlog),
            Status::Doing => Some(Status::Prioritized),
            Status::Done => Some(Status::Doing),
        }
    }

    /// True for the statuses WIP limits can apply to. Backlog is unbounded
    /// and Done is gated by time validation instead.
    pub fn wip_limitable(self) -> bool {
        matches!(self, Status::Prioritized | Status::Doing)
    }
}

/// Format a status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Backlog => "Backlog",
        Status::Prioritized => "Prioritized",
        Status::Doing => "Doing",
        Status::Done => "Done",
    }
}
