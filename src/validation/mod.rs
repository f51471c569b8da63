//! Field validation for bill, activity and interest editors.
//!
//! Validation works on JSON drafts so that an editor can hold values the
//! typed records would reject (a boolean in a numeric field, `"2/5"` in a
//! month/day field). Results are reported per field and never raised.

mod editor;
mod field;
mod guard;
mod report;

pub use editor::Editor;
pub use field::{field_spec, fields, FieldKind, FieldSpec, Gate};
pub use guard::{collect_used_variables, ensure_variable_unused, find_variable_usages, AccountRecords};
pub use report::ValidationReport;

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{FieldError, PlannerResult};
use crate::model::{Account, CategoryTree, Record};
use crate::resolve::{RecordKind, SimulationContext};
use crate::transfer;

/// Everything a field check may consult besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub simulation: SimulationContext<'a>,
    pub accounts: &'a [Account],
    pub categories: &'a CategoryTree,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        simulation: SimulationContext<'a>,
        accounts: &'a [Account],
        categories: &'a CategoryTree,
    ) -> Self {
        Self {
            simulation,
            accounts,
            categories,
        }
    }
}

/// Checks a single field value of `record`, ignoring whether the field is
/// currently active. Unknown field names are never in error.
pub fn validate(
    record: RecordKind,
    field: &str,
    value: &Value,
    ctx: &ValidationContext<'_>,
) -> Option<FieldError> {
    field_spec(record, field).and_then(|spec| spec.kind.validate(value, ctx))
}

/// Validates every active field of a draft plus the transfer endpoint pair.
pub fn validate_draft(
    record: RecordKind,
    draft: &Map<String, Value>,
    ctx: &ValidationContext<'_>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    for spec in fields(record) {
        if !spec.gate.applies(draft) {
            continue;
        }
        let value = draft.get(spec.name).unwrap_or(&Value::Null);
        if let Some(error) = spec.kind.validate(value, ctx) {
            report.insert(spec.name, error);
        }
    }

    let is_transfer = Gate::Transfer.applies(draft);
    if is_transfer && !report.contains("from") && !report.contains("to") {
        let endpoint = |name: &str| draft.get(name).and_then(Value::as_str);
        if let Err((field, error)) =
            transfer::check_endpoints(endpoint("from"), endpoint("to"), ctx.accounts)
        {
            report.insert(field, error);
        }
    }

    debug!(
        record = ?record,
        errors = report.len(),
        simulation = ctx.simulation.name(),
        "validated draft"
    );
    report
}

/// Validates a typed record by way of its wire form.
pub fn validate_record<R: Record>(
    record: &R,
    ctx: &ValidationContext<'_>,
) -> PlannerResult<ValidationReport> {
    let draft = to_draft(record)?;
    Ok(validate_draft(R::KIND, &draft, ctx))
}

pub(crate) fn to_draft<R: Record>(record: &R) -> PlannerResult<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::model::{Bill, Simulation, Variable};

    struct Fixture {
        simulation: Simulation,
        accounts: Vec<Account>,
        categories: CategoryTree,
    }

    impl Fixture {
        fn new() -> Self {
            let mut categories = CategoryTree::default();
            categories.insert("Housing", "Rent");
            categories.insert("Banking", "Transfer");
            Self {
                simulation: Simulation::new("Default")
                    .with_variable("RENT", Variable::Amount(-1450.0))
                    .with_variable(
                        "LEASE_END",
                        Variable::Date(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()),
                    ),
                accounts: vec![
                    Account::new("chk", "Checking"),
                    Account::new("sav", "Savings"),
                ],
                categories,
            }
        }

        fn ctx(&self) -> ValidationContext<'_> {
            ValidationContext::new(
                SimulationContext::new(&self.simulation),
                &self.accounts,
                &self.categories,
            )
        }
    }

    fn rent_bill() -> Bill {
        let mut bill = Bill::template(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        bill.name = "Rent".into();
        bill.category = "Housing.Rent".into();
        bill.amount = -1450.0;
        bill
    }

    #[test]
    fn single_field_checks() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let check = |field: &str, value: Value| validate(RecordKind::Bill, field, &value, &ctx);
        assert_eq!(check("annual_start_date", json!("2/5")), Some(FieldError::InvalidFormat));
        assert_eq!(check("annual_start_date", json!("02/05")), None);
        assert_eq!(check("annual_start_date", json!("02/30")), Some(FieldError::InvalidDay));
        assert_eq!(check("annual_end_date", json!("")), None);
        assert_eq!(check("amount", json!(true)), Some(FieldError::InvalidAmount));
        assert_eq!(check("every_n", json!(0)), Some(FieldError::InvalidEveryN));
        assert_eq!(check("every_n", json!(3)), None);
        assert_eq!(check("periods", json!("fortnight")), Some(FieldError::InvalidPeriod));
        assert_eq!(check("start_date", json!("2025-13-01")), Some(FieldError::InvalidDate));
        assert_eq!(check("end_date", Value::Null), None);
        assert_eq!(check("amount_variable", json!("{HALF}")), None);
        assert_eq!(check("end_date_variable", json!("RENT")), Some(FieldError::UnknownVariable));
        assert_eq!(check("no_such_field", json!(null)), None);
        assert_eq!(
            validate(RecordKind::Activity, "amount_variable", &json!("{HALF}"), &ctx),
            Some(FieldError::UnknownVariable)
        );
        assert_eq!(
            validate(RecordKind::Interest, "apr", &json!("5"), &ctx),
            Some(FieldError::InvalidApr)
        );
    }

    #[test]
    fn gates_follow_variable_flags() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut bill = rent_bill();
        bill.amount_is_variable = true;
        bill.amount_variable = Some("MISSING".into());
        let report = validate_record(&bill, &ctx).unwrap();
        assert_eq!(report.get("amount_variable"), Some(FieldError::UnknownVariable));

        bill.amount_is_variable = false;
        assert!(validate_record(&bill, &ctx).unwrap().all_valid());
    }

    #[test]
    fn transfer_endpoints_are_cross_checked() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut bill = rent_bill();
        bill.category = "Banking.Transfer".into();
        bill.is_transfer = true;
        bill.from = Some("chk".into());
        bill.to = Some("chk".into());
        let report = validate_record(&bill, &ctx).unwrap();
        assert_eq!(report.get("to"), Some(FieldError::SameAccount));

        bill.to = Some("brokerage".into());
        let report = validate_record(&bill, &ctx).unwrap();
        assert_eq!(report.get("to"), Some(FieldError::InvalidAccount));
        assert_eq!(report.len(), 1);

        bill.to = Some("sav".into());
        assert!(validate_record(&bill, &ctx).unwrap().all_valid());
    }

    #[test]
    fn non_transfer_ignores_endpoints() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut bill = rent_bill();
        bill.from = Some("nowhere".into());
        bill.category = "Unknown.Category".into();
        let report = validate_record(&bill, &ctx).unwrap();
        assert_eq!(report.get("category"), Some(FieldError::InvalidCategory));
        assert!(!report.contains("from"));
    }
}
