use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{active_ref, Record};
use crate::calendar::date::date_string;
use crate::calendar::today;
use crate::calendar::Period;
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::resolve::{resolve_date, resolve_number, RecordKind, SimulationContext};

/// An APR and compounding rule effective from `applicable_date` until the
/// next entry of the account's list takes over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub apr: f64,
    #[serde(default)]
    pub apr_is_variable: bool,
    #[serde(default)]
    pub apr_variable: Option<String>,
    pub compounded: Period,
    #[serde(default = "today", with = "date_string")]
    pub applicable_date: NaiveDate,
    #[serde(default)]
    pub applicable_date_is_variable: bool,
    #[serde(default)]
    pub applicable_date_variable: Option<String>,
}

impl Interest {
    pub fn template(applicable_date: NaiveDate) -> Self {
        Self {
            id: None,
            apr: 0.0,
            apr_is_variable: false,
            apr_variable: None,
            compounded: Period::Month,
            applicable_date,
            applicable_date_is_variable: false,
            applicable_date_variable: None,
        }
    }

    /// APR as a percentage, e.g. `12.0` for 12%.
    pub fn resolved_apr(&self, ctx: &SimulationContext<'_>) -> PlannerResult<f64> {
        resolve_number(
            self.apr,
            self.apr_is_variable,
            self.apr_variable.as_deref(),
            ctx,
        )
        .map_err(|err| match err {
            FieldError::InvalidAmount => PlannerError::field("apr", FieldError::InvalidApr),
            other => PlannerError::field("apr_variable", other),
        })
    }

    pub fn resolved_applicable_date(&self, ctx: &SimulationContext<'_>) -> PlannerResult<NaiveDate> {
        resolve_date(
            self.applicable_date,
            self.applicable_date_is_variable,
            self.applicable_date_variable.as_deref(),
            ctx,
        )
        .map_err(|err| PlannerError::field("applicable_date_variable", err))
    }
}

impl Record for Interest {
    const KIND: RecordKind = RecordKind::Interest;

    fn variable_refs(&self) -> Vec<&str> {
        [
            active_ref(self.apr_is_variable, &self.apr_variable),
            active_ref(self.applicable_date_is_variable, &self.applicable_date_variable),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
