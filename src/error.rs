use crate::model::Period;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("{input}{}: {message}", row_suffix(*.row))]
    Parse {
        input: String,
        row: Option<usize>,
        message: String,
    },

    #[error("{input}: missing required column '{column}'")]
    MissingColumn { input: String, column: String },

    #[error("no bulk result for period {period}; run the bulk aggregation for it first")]
    MissingPrerequisite { period: Period },

    #[error("shift block {block} would receive {allocation} agents after reconciliation")]
    BlockReconciliation { block: usize, allocation: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by outer layers to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Parse,
    MissingPrerequisite,
    Internal,
}

impl PlanningError {
    pub fn parse(input: impl Into<String>, row: Option<usize>, message: impl Into<String>) -> Self {
        PlanningError::Parse {
            input: input.into(),
            row,
            message: message.into(),
        }
    }

    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        PlanningError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanningError::InvalidConfig { .. } | PlanningError::InvalidInput(_) => {
                ErrorKind::Configuration
            }
            PlanningError::Parse { .. }
            | PlanningError::MissingColumn { .. }
            | PlanningError::Csv(_)
            | PlanningError::Serialization(_) => ErrorKind::Parse,
            PlanningError::MissingPrerequisite { .. } => ErrorKind::MissingPrerequisite,
            PlanningError::BlockReconciliation { .. }
            | PlanningError::Io(_)
            | PlanningError::DataFrame(_) => ErrorKind::Internal,
        }
    }
}

fn row_suffix(row: Option<usize>) -> String {
    row.map(|r| format!(" (row {r})")).unwrap_or_default()
}

pub type PlanningResult<T> = Result<T, PlanningError>;
