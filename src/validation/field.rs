use serde_json::Value;

use super::ValidationContext;
use crate::calendar::{parse_date, validate_month_day, Period};
use crate::errors::FieldError;
use crate::model::{find_account, VariableType};
use crate::resolve::RecordKind;

/// How an editor field is checked. Each variant owns its rule, so adding a
/// field kind forces a decision in the literal checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Required calendar date.
    Date,
    /// Nullable date; empty means open-ended.
    OptionalDate,
    Amount,
    Apr,
    EveryN,
    Boolean,
    Account,
    Category,
    Name,
    Period,
    /// Optional `MM/DD`; empty is valid.
    MonthDay,
    /// Name of an amount variable; `sentinels` admits `{HALF}`/`{FULL}`.
    AmountVariable { sentinels: bool },
    DateVariable,
}

impl FieldKind {
    pub fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Option<FieldError> {
        match self {
            FieldKind::Account => match value.as_str() {
                Some(id) if find_account(ctx.accounts, id).is_some() => None,
                _ => Some(FieldError::InvalidAccount),
            },
            FieldKind::Category => match value.as_str() {
                Some(path) if ctx.categories.contains(path) => None,
                _ => Some(FieldError::InvalidCategory),
            },
            FieldKind::Name => match value.as_str() {
                Some(name) if !name.trim().is_empty() => None,
                _ => Some(FieldError::InvalidName),
            },
            FieldKind::AmountVariable { sentinels } => {
                let record = if *sentinels {
                    RecordKind::Bill
                } else {
                    RecordKind::Activity
                };
                match value.as_str() {
                    Some(name) if ctx.simulation.accepts_amount_name(name, record) => None,
                    _ => Some(FieldError::UnknownVariable),
                }
            }
            FieldKind::DateVariable => match value.as_str() {
                Some(name) if ctx.simulation.has_variable(name, VariableType::Date) => None,
                _ => Some(FieldError::UnknownVariable),
            },
            _ => self.validate_literal(value),
        }
    }

    /// Whether `value` decodes into the record field, regardless of whether
    /// it refers to a known account, category, or variable.
    pub fn well_formed(&self, value: &Value) -> bool {
        match self {
            FieldKind::Account
            | FieldKind::Category
            | FieldKind::Name
            | FieldKind::AmountVariable { .. }
            | FieldKind::DateVariable => value.is_string(),
            _ => self.validate_literal(value).is_none(),
        }
    }

    /// Checks that need nothing beyond the value.
    fn validate_literal(&self, value: &Value) -> Option<FieldError> {
        match self {
            FieldKind::Date => match value {
                Value::String(raw) => parse_date(raw).err(),
                _ => Some(FieldError::InvalidFormat),
            },
            FieldKind::OptionalDate => match value {
                Value::Null => None,
                Value::String(raw) if raw.trim().is_empty() => None,
                other => FieldKind::Date.validate_literal(other),
            },
            FieldKind::Amount => finite_number(value, FieldError::InvalidAmount),
            FieldKind::Apr => finite_number(value, FieldError::InvalidApr),
            FieldKind::EveryN => match value.as_u64() {
                Some(n) if n >= 1 && n <= u64::from(u32::MAX) => None,
                _ => Some(FieldError::InvalidEveryN),
            },
            FieldKind::Boolean => (!value.is_boolean()).then_some(FieldError::InvalidBoolean),
            FieldKind::Period => match value.as_str().map(str::parse::<Period>) {
                Some(Ok(_)) => None,
                _ => Some(FieldError::InvalidPeriod),
            },
            FieldKind::MonthDay => match value {
                Value::Null => None,
                Value::String(raw) if raw.is_empty() => None,
                Value::String(raw) => validate_month_day(raw).err(),
                _ => Some(FieldError::InvalidFormat),
            },
            FieldKind::Account
            | FieldKind::Category
            | FieldKind::Name
            | FieldKind::AmountVariable { .. }
            | FieldKind::DateVariable => None,
        }
    }
}

/// serde_json never holds NaN or infinity, so any JSON number is finite.
fn finite_number(value: &Value, error: FieldError) -> Option<FieldError> {
    match value.as_f64() {
        Some(number) if number.is_finite() => None,
        _ => Some(error),
    }
}

/// When a field participates in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Only while the named `*_is_variable` flag is off.
    Literal(&'static str),
    /// Only while the named `*_is_variable` flag is on.
    Variable(&'static str),
    /// Only while `is_transfer` is on.
    Transfer,
}

impl Gate {
    pub fn applies(&self, draft: &serde_json::Map<String, Value>) -> bool {
        let flag = |name: &str| draft.get(name).and_then(Value::as_bool).unwrap_or(false);
        match self {
            Gate::Always => true,
            Gate::Literal(flag_name) => !flag(flag_name),
            Gate::Variable(flag_name) => flag(flag_name),
            Gate::Transfer => flag("is_transfer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub gate: Gate,
}

const fn spec(name: &'static str, kind: FieldKind, gate: Gate) -> FieldSpec {
    FieldSpec { name, kind, gate }
}

const BILL_FIELDS: &[FieldSpec] = &[
    spec("name", FieldKind::Name, Gate::Always),
    spec("category", FieldKind::Category, Gate::Always),
    spec("amount", FieldKind::Amount, Gate::Literal("amount_is_variable")),
    spec(
        "amount_variable",
        FieldKind::AmountVariable { sentinels: true },
        Gate::Variable("amount_is_variable"),
    ),
    spec("is_transfer", FieldKind::Boolean, Gate::Always),
    spec("from", FieldKind::Account, Gate::Transfer),
    spec("to", FieldKind::Account, Gate::Transfer),
    spec("start_date", FieldKind::Date, Gate::Literal("start_date_is_variable")),
    spec(
        "start_date_variable",
        FieldKind::DateVariable,
        Gate::Variable("start_date_is_variable"),
    ),
    spec("end_date", FieldKind::OptionalDate, Gate::Literal("end_date_is_variable")),
    spec(
        "end_date_variable",
        FieldKind::DateVariable,
        Gate::Variable("end_date_is_variable"),
    ),
    spec("every_n", FieldKind::EveryN, Gate::Always),
    spec("periods", FieldKind::Period, Gate::Always),
    spec("annual_start_date", FieldKind::MonthDay, Gate::Always),
    spec("annual_end_date", FieldKind::MonthDay, Gate::Always),
    spec("increase_by", FieldKind::Amount, Gate::Literal("increase_by_is_variable")),
    spec(
        "increase_by_variable",
        FieldKind::AmountVariable { sentinels: false },
        Gate::Variable("increase_by_is_variable"),
    ),
    spec("increase_by_date", FieldKind::MonthDay, Gate::Always),
];

const ACTIVITY_FIELDS: &[FieldSpec] = &[
    spec("name", FieldKind::Name, Gate::Always),
    spec("category", FieldKind::Category, Gate::Always),
    spec("amount", FieldKind::Amount, Gate::Literal("amount_is_variable")),
    spec(
        "amount_variable",
        FieldKind::AmountVariable { sentinels: false },
        Gate::Variable("amount_is_variable"),
    ),
    spec("is_transfer", FieldKind::Boolean, Gate::Always),
    spec("from", FieldKind::Account, Gate::Transfer),
    spec("to", FieldKind::Account, Gate::Transfer),
    spec("date", FieldKind::Date, Gate::Literal("date_is_variable")),
    spec(
        "date_variable",
        FieldKind::DateVariable,
        Gate::Variable("date_is_variable"),
    ),
];

const INTEREST_FIELDS: &[FieldSpec] = &[
    spec("apr", FieldKind::Apr, Gate::Literal("apr_is_variable")),
    spec(
        "apr_variable",
        FieldKind::AmountVariable { sentinels: false },
        Gate::Variable("apr_is_variable"),
    ),
    spec("compounded", FieldKind::Period, Gate::Always),
    spec(
        "applicable_date",
        FieldKind::Date,
        Gate::Literal("applicable_date_is_variable"),
    ),
    spec(
        "applicable_date_variable",
        FieldKind::DateVariable,
        Gate::Variable("applicable_date_is_variable"),
    ),
];

/// Validated fields of each record kind, in editor order.
pub fn fields(record: RecordKind) -> &'static [FieldSpec] {
    match record {
        RecordKind::Bill => BILL_FIELDS,
        RecordKind::Activity => ACTIVITY_FIELDS,
        RecordKind::Interest => INTEREST_FIELDS,
    }
}

pub fn field_spec(record: RecordKind, name: &str) -> Option<&'static FieldSpec> {
    fields(record).iter().find(|spec| spec.name == name)
}
