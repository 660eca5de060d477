//! Typed rejections for the sprint board core.
//!
//! Every mutating operation either succeeds or returns one of these
//! recoverable rejections; the CLI surfaces the code and message to the user
//! and decides whether to retry with corrected input. Nothing here is fatal.

use thiserror::Error;

use crate::fields::{format_status, Status};

/// Structured rejection returned by the core validators and the ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Reject {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{}: {current} of {limit} WIP slots already in use", format_status(*status))]
    WipLimitExceeded {
        status: Status,
        current: usize,
        limit: u32,
    },

    #[error("time spent must be recorded and validated before completion")]
    TimeValidationRequired,

    #[error("time validation failed: {0}")]
    TimeValidationInvalid(String),
}

impl Reject {
    /// Stable machine-readable code, part of the consumer contract.
    pub fn code(&self) -> &'static str {
        match self {
            Reject::InvalidInput(_) => "INVALID_INPUT",
            Reject::WipLimitExceeded { .. } => "WIP_LIMIT_EXCEEDED",
            Reject::TimeValidationRequired => "TIME_VALIDATION_REQUIRED",
            Reject::TimeValidationInvalid(_) => "TIME_VALIDATION_INVALID",
        }
    }
}
