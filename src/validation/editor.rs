use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{fields, to_draft, validate_draft, ValidationContext, ValidationReport};
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::model::Record;

/// An open edit session over one record.
///
/// Every change revalidates the whole draft, since toggling a flag such as
/// `is_transfer` changes which other fields are checked.
#[derive(Debug, Clone)]
pub struct Editor<R: Record> {
    draft: Map<String, Value>,
    report: ValidationReport,
    record: PhantomData<R>,
}

impl<R: Record> Editor<R> {
    pub fn open(record: &R, ctx: &ValidationContext<'_>) -> PlannerResult<Self> {
        Ok(Self::from_draft(to_draft(record)?, ctx))
    }

    pub fn from_draft(draft: Map<String, Value>, ctx: &ValidationContext<'_>) -> Self {
        let report = validate_draft(R::KIND, &draft, ctx);
        Self {
            draft,
            report,
            record: PhantomData,
        }
    }

    pub fn draft(&self) -> &Map<String, Value> {
        &self.draft
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.draft.get(field)
    }

    /// Replaces one field and returns that field's error, if any.
    pub fn set(
        &mut self,
        field: &str,
        value: Value,
        ctx: &ValidationContext<'_>,
    ) -> Option<FieldError> {
        self.draft.insert(field.to_string(), value);
        self.revalidate(ctx);
        let error = self.report.get(field);
        debug!(record = ?R::KIND, field, error = ?error, "edited field");
        error
    }

    /// Re-runs validation, for example after the selected simulation changed.
    pub fn revalidate(&mut self, ctx: &ValidationContext<'_>) {
        self.report = validate_draft(R::KIND, &self.draft, ctx);
    }

    pub fn errors(&self) -> &ValidationReport {
        &self.report
    }

    pub fn error(&self, field: &str) -> Option<FieldError> {
        self.report.get(field)
    }

    pub fn all_valid(&self) -> bool {
        self.report.all_valid()
    }

    /// Produces the record to persist, with save-time normalisation applied.
    ///
    /// Null entries, and inactive fields holding values of the wrong shape,
    /// are dropped before decoding so they fall back to their defaults.
    pub fn finish(self) -> PlannerResult<R> {
        if !self.report.all_valid() {
            return Err(PlannerError::Validation(self.report));
        }
        let mut draft = self.draft;
        let discarded: Vec<&'static str> = fields(R::KIND)
            .iter()
            .filter(|spec| !spec.gate.applies(&draft))
            .filter(|spec| {
                draft
                    .get(spec.name)
                    .is_some_and(|value| !value.is_null() && !spec.kind.well_formed(value))
            })
            .map(|spec| spec.name)
            .collect();
        for name in &discarded {
            draft.remove(*name);
        }
        if !discarded.is_empty() {
            debug!(record = ?R::KIND, fields = ?discarded, "dropped inactive fields");
        }
        draft.retain(|_, value| !value.is_null());
        let mut record: R = serde_json::from_value(Value::Object(draft))?;
        record.normalize_for_save();
        info!(record = ?R::KIND, "draft ready to save");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::model::{Account, Activity, Bill, CategoryTree, Simulation, Variable};
    use crate::resolve::SimulationContext;

    fn categories() -> CategoryTree {
        let mut categories = CategoryTree::new();
        categories.insert("Banking", "Transfer");
        categories.insert("Food", "Groceries");
        categories
    }

    #[test]
    fn toggling_transfer_revalidates_endpoints() {
        let simulation = Simulation::new("Default");
        let accounts = [Account::new("chk", "Checking"), Account::new("sav", "Savings")];
        let categories = categories();
        let ctx = ValidationContext::new(SimulationContext::new(&simulation), &accounts, &categories);

        let mut bill = Bill::template(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        bill.name = "Move to savings".into();
        bill.category = "Banking.Transfer".into();
        bill.amount = -200.0;
        let mut editor = Editor::open(&bill, &ctx).unwrap();
        assert!(editor.all_valid());

        assert_eq!(editor.set("is_transfer", json!(true), &ctx), None);
        assert_eq!(editor.error("from"), Some(FieldError::InvalidAccount));
        editor.set("from", json!("chk"), &ctx);
        assert_eq!(editor.set("to", json!("chk"), &ctx), Some(FieldError::SameAccount));
        assert_eq!(editor.set("to", json!("sav"), &ctx), None);

        let saved = editor.finish().unwrap();
        assert_eq!(saved.amount, 200.0);
        assert_eq!(saved.to.as_deref(), Some("sav"));
    }

    #[test]
    fn inactive_field_with_wrong_shape_is_dropped_on_save() {
        let simulation =
            Simulation::new("Default").with_variable("RENT", Variable::Amount(-1500.0));
        let categories = categories();
        let ctx = ValidationContext::new(SimulationContext::new(&simulation), &[], &categories);

        let mut bill = Bill::template(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        bill.name = "Rent".into();
        bill.category = "Food.Groceries".into();
        let mut editor = Editor::open(&bill, &ctx).unwrap();
        editor.set("amount_is_variable", json!(true), &ctx);
        editor.set("amount_variable", json!("RENT"), &ctx);
        assert_eq!(editor.set("amount", json!("not a number"), &ctx), None);
        editor.set("is_transfer", json!(false), &ctx);
        editor.set("from", json!(42), &ctx);
        assert!(editor.all_valid());

        let saved = editor.finish().unwrap();
        assert_eq!(saved.amount, 0.0);
        assert!(saved.amount_is_variable);
        assert_eq!(saved.amount_variable.as_deref(), Some("RENT"));
        assert_eq!(saved.from, None);
    }

    #[test]
    fn inactive_literal_survives_save() {
        let simulation =
            Simulation::new("Default").with_variable("RENT", Variable::Amount(-1500.0));
        let categories = categories();
        let ctx = ValidationContext::new(SimulationContext::new(&simulation), &[], &categories);

        let mut bill = Bill::template(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        bill.name = "Rent".into();
        bill.category = "Food.Groceries".into();
        bill.amount = -1400.0;
        let mut editor = Editor::open(&bill, &ctx).unwrap();
        editor.set("amount_is_variable", json!(true), &ctx);
        editor.set("amount_variable", json!("RENT"), &ctx);

        let saved = editor.finish().unwrap();
        assert_eq!(saved.amount, -1400.0);
    }

    #[test]
    fn invalid_draft_cannot_finish() {
        let simulation = Simulation::new("Default");
        let categories = categories();
        let ctx = ValidationContext::new(SimulationContext::new(&simulation), &[], &categories);

        let mut activity = Activity::template(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        activity.name = "Groceries".into();
        activity.category = "Food.Groceries".into();
        let mut editor = Editor::open(&activity, &ctx).unwrap();
        assert_eq!(editor.set("amount", json!(false), &ctx), Some(FieldError::InvalidAmount));
        assert!(matches!(
            editor.finish(),
            Err(PlannerError::Validation(report)) if report.get("amount") == Some(FieldError::InvalidAmount)
        ));
    }
}
