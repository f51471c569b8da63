//! Resolution of `*_is_variable` fields against the selected simulation.
//!
//! Every resolver takes an explicit [`SimulationContext`]; nothing reads a
//! process-wide "current simulation".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::FieldError;
use crate::model::{Simulation, VariableType};

/// Bill-only sentinel: half of a reference amount computed by the backend.
pub const HALF: &str = "{HALF}";
/// Bill-only sentinel: the full reference amount computed by the backend.
pub const FULL: &str = "{FULL}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Bill,
    Activity,
    Interest,
}

impl RecordKind {
    /// Whether `{HALF}` / `{FULL}` are accepted on this record's amount field.
    pub fn allows_sentinels(&self) -> bool {
        matches!(self, RecordKind::Bill)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentinel {
    Half,
    Full,
}

impl Sentinel {
    pub fn parse(name: &str) -> Option<Sentinel> {
        match name {
            HALF => Some(Sentinel::Half),
            FULL => Some(Sentinel::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::Half => HALF,
            Sentinel::Full => FULL,
        }
    }

    /// Share of the backend's reference amount this sentinel stands for.
    pub fn share(&self) -> f64 {
        match self {
            Sentinel::Half => 0.5,
            Sentinel::Full => 1.0,
        }
    }
}

/// An amount after resolution. Sentinels stay symbolic because their value
/// is only known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResolvedAmount {
    Value(f64),
    Sentinel(Sentinel),
}

impl ResolvedAmount {
    pub fn value(&self) -> Option<f64> {
        match self {
            ResolvedAmount::Value(value) => Some(*value),
            ResolvedAmount::Sentinel(_) => None,
        }
    }

    /// Multiplies a concrete amount; sentinels are returned unchanged.
    pub fn scaled(&self, factor: f64) -> ResolvedAmount {
        match self {
            ResolvedAmount::Value(value) => ResolvedAmount::Value(value * factor),
            ResolvedAmount::Sentinel(sentinel) => ResolvedAmount::Sentinel(*sentinel),
        }
    }

    /// Resolves a sentinel once the backend's reference amount is known.
    pub fn with_reference(&self, reference: f64) -> f64 {
        match self {
            ResolvedAmount::Value(value) => *value,
            ResolvedAmount::Sentinel(sentinel) => reference * sentinel.share(),
        }
    }
}

/// The simulation that scopes every resolution and validation call.
#[derive(Debug, Clone, Copy)]
pub struct SimulationContext<'a> {
    simulation: &'a Simulation,
}

impl<'a> SimulationContext<'a> {
    pub fn new(simulation: &'a Simulation) -> Self {
        Self { simulation }
    }

    pub fn simulation(&self) -> &'a Simulation {
        self.simulation
    }

    /// Value appended as `?simulation=` to backend requests.
    pub fn name(&self) -> &'a str {
        &self.simulation.name
    }

    pub fn has_variable(&self, name: &str, kind: VariableType) -> bool {
        self.simulation
            .variable(name)
            .is_some_and(|variable| variable.kind() == kind)
    }

    /// Whether `name` may appear in an amount `*_variable` field of `record`.
    pub fn accepts_amount_name(&self, name: &str, record: RecordKind) -> bool {
        (record.allows_sentinels() && Sentinel::parse(name).is_some())
            || self.has_variable(name, VariableType::Amount)
    }
}

/// Resolves an amount field.
///
/// A literal must be finite; a variable must name an amount variable of the
/// active simulation, or one of the sentinels when `record` is a bill.
pub fn resolve_amount(
    value: f64,
    is_variable: bool,
    variable: Option<&str>,
    record: RecordKind,
    ctx: &SimulationContext<'_>,
) -> Result<ResolvedAmount, FieldError> {
    if !is_variable {
        return if value.is_finite() {
            Ok(ResolvedAmount::Value(value))
        } else {
            Err(FieldError::InvalidAmount)
        };
    }
    let name = variable.ok_or(FieldError::UnknownVariable)?;
    if record.allows_sentinels() {
        if let Some(sentinel) = Sentinel::parse(name) {
            return Ok(ResolvedAmount::Sentinel(sentinel));
        }
    }
    ctx.simulation()
        .amount(name)
        .map(ResolvedAmount::Value)
        .ok_or(FieldError::UnknownVariable)
}

/// Resolves a numeric field that never accepts sentinels (APR, escalation rate).
pub fn resolve_number(
    value: f64,
    is_variable: bool,
    variable: Option<&str>,
    ctx: &SimulationContext<'_>,
) -> Result<f64, FieldError> {
    let resolved = resolve_amount(value, is_variable, variable, RecordKind::Interest, ctx)?;
    resolved.value().ok_or(FieldError::UnknownVariable)
}

/// Resolves a date field against the active simulation's date variables.
pub fn resolve_date(
    value: NaiveDate,
    is_variable: bool,
    variable: Option<&str>,
    ctx: &SimulationContext<'_>,
) -> Result<NaiveDate, FieldError> {
    if !is_variable {
        return Ok(value);
    }
    let name = variable.ok_or(FieldError::UnknownVariable)?;
    ctx.simulation().date(name).ok_or(FieldError::UnknownVariable)
}

/// Like [`resolve_date`] for nullable dates; `None` stays open-ended.
pub fn resolve_optional_date(
    value: Option<NaiveDate>,
    is_variable: bool,
    variable: Option<&str>,
    ctx: &SimulationContext<'_>,
) -> Result<Option<NaiveDate>, FieldError> {
    if !is_variable {
        return Ok(value);
    }
    let name = variable.ok_or(FieldError::UnknownVariable)?;
    ctx.simulation()
        .date(name)
        .map(Some)
        .ok_or(FieldError::UnknownVariable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    fn simulation() -> Simulation {
        Simulation::new("Default")
            .with_variable("RENT", Variable::Amount(-1450.0))
            .with_variable(
                "MOVE_OUT",
                Variable::Date(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()),
            )
    }

    #[test]
    fn literal_amounts_must_be_finite() {
        let sim = simulation();
        let ctx = SimulationContext::new(&sim);
        assert_eq!(
            resolve_amount(12.5, false, None, RecordKind::Activity, &ctx),
            Ok(ResolvedAmount::Value(12.5))
        );
        assert_eq!(
            resolve_amount(f64::NAN, false, None, RecordKind::Activity, &ctx),
            Err(FieldError::InvalidAmount)
        );
        assert_eq!(
            resolve_amount(f64::INFINITY, false, None, RecordKind::Bill, &ctx),
            Err(FieldError::InvalidAmount)
        );
    }

    #[test]
    fn literal_wins_when_flag_is_off() {
        let sim = simulation();
        let ctx = SimulationContext::new(&sim);
        assert_eq!(
            resolve_amount(10.0, false, Some("MISSING"), RecordKind::Bill, &ctx),
            Ok(ResolvedAmount::Value(10.0))
        );
    }

    #[test]
    fn variables_resolve_by_type() {
        let sim = simulation();
        let ctx = SimulationContext::new(&sim);
        assert_eq!(
            resolve_amount(0.0, true, Some("RENT"), RecordKind::Bill, &ctx),
            Ok(ResolvedAmount::Value(-1450.0))
        );
        assert_eq!(
            resolve_amount(0.0, true, Some("MOVE_OUT"), RecordKind::Bill, &ctx),
            Err(FieldError::UnknownVariable)
        );
        let fallback = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(
            resolve_date(fallback, true, Some("MOVE_OUT"), &ctx),
            Ok(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap())
        );
        assert_eq!(
            resolve_date(fallback, true, Some("RENT"), &ctx),
            Err(FieldError::UnknownVariable)
        );
        assert_eq!(
            resolve_optional_date(None, true, None, &ctx),
            Err(FieldError::UnknownVariable)
        );
    }

    #[test]
    fn sentinels_are_bill_only() {
        let empty = Simulation::new("Empty");
        let ctx = SimulationContext::new(&empty);
        assert_eq!(
            resolve_amount(0.0, true, Some(HALF), RecordKind::Bill, &ctx),
            Ok(ResolvedAmount::Sentinel(Sentinel::Half))
        );
        assert_eq!(
            resolve_amount(0.0, true, Some(FULL), RecordKind::Activity, &ctx),
            Err(FieldError::UnknownVariable)
        );
        assert!(ctx.accepts_amount_name(FULL, RecordKind::Bill));
        assert!(!ctx.accepts_amount_name(HALF, RecordKind::Interest));
        assert_eq!(
            resolve_date(NaiveDate::MIN, true, Some(HALF), &ctx),
            Err(FieldError::UnknownVariable)
        );
    }

    #[test]
    fn sentinel_scales_against_reference() {
        let half = ResolvedAmount::Sentinel(Sentinel::Half);
        assert_eq!(half.value(), None);
        assert_eq!(half.with_reference(800.0), 400.0);
        assert_eq!(half.scaled(2.0), half);
        assert_eq!(ResolvedAmount::Value(10.0).scaled(1.5).value(), Some(15.0));
    }
}
