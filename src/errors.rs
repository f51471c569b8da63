use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UsedVariable;
use crate::validation::ValidationReport;

/// Field-level failures reported by editors before a record is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    #[error("invalid format")]
    InvalidFormat,
    #[error("invalid month")]
    InvalidMonth,
    #[error("invalid day")]
    InvalidDay,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("invalid APR")]
    InvalidApr,
    #[error("invalid step count")]
    InvalidEveryN,
    #[error("expected a boolean")]
    InvalidBoolean,
    #[error("invalid period")]
    InvalidPeriod,
    #[error("unknown variable")]
    UnknownVariable,
    #[error("invalid account")]
    InvalidAccount,
    #[error("transfer accounts must differ")]
    SameAccount,
    #[error("invalid category")]
    InvalidCategory,
    #[error("name is required")]
    InvalidName,
}

pub type PlannerResult<T> = Result<T, PlannerError>;

/// Error type that captures planner failures across resolution, persistence and transport.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{field}: {error}")]
    Field {
        field: &'static str,
        error: FieldError,
    },
    #[error("record failed validation: {0}")]
    Validation(ValidationReport),
    #[error("variable `{name}` is used by {} record(s)", references.len())]
    VariableInUse {
        name: String,
        references: Vec<UsedVariable>,
    },
    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),
    #[error("the Default simulation cannot be renamed or removed")]
    DefaultSimulation,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("cannot address an unsaved {0}")]
    MissingId(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PlannerError {
    pub fn field(field: &'static str, error: FieldError) -> Self {
        PlannerError::Field { field, error }
    }

    /// Returns the field-level cause when the error came from resolution.
    pub fn field_error(&self) -> Option<FieldError> {
        match self {
            PlannerError::Field { error, .. } => Some(*error),
            _ => None,
        }
    }
}
