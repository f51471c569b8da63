use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{active_ref, Activity, Record};
use crate::calendar::date::{date_string, optional_date_string};
use crate::calendar::month_day::optional_month_day;
use crate::calendar::{today, AnnualWindow, MonthDay, Period, TimeInterval};
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::resolve::{
    resolve_amount, resolve_date, resolve_number, resolve_optional_date, RecordKind,
    ResolvedAmount, Sentinel, SimulationContext,
};
use crate::schedule::{BillSchedule, Occurrences};
use crate::transfer;

/// A recurring obligation or transfer template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub amount_is_variable: bool,
    #[serde(default)]
    pub amount_variable: Option<String>,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "today", with = "date_string")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub start_date_is_variable: bool,
    #[serde(default)]
    pub start_date_variable: Option<String>,
    #[serde(default, with = "optional_date_string")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date_is_variable: bool,
    #[serde(default)]
    pub end_date_variable: Option<String>,
    pub every_n: u32,
    pub periods: Period,
    #[serde(default, with = "optional_month_day")]
    pub annual_start_date: Option<MonthDay>,
    #[serde(default, with = "optional_month_day")]
    pub annual_end_date: Option<MonthDay>,
    #[serde(default)]
    pub increase_by: f64,
    #[serde(default)]
    pub increase_by_is_variable: bool,
    #[serde(default)]
    pub increase_by_variable: Option<String>,
    #[serde(default, with = "optional_month_day")]
    pub increase_by_date: Option<MonthDay>,
    #[serde(default)]
    pub flag: bool,
    /// Occurrences on or before this date were skipped. The anchor stays at
    /// `start_date`, so later dates keep their day of month.
    #[serde(default, with = "optional_date_string")]
    pub skipped_until: Option<NaiveDate>,
}

impl Bill {
    /// A fresh monthly template starting on the date the user last edited.
    pub fn template(last_edited: NaiveDate) -> Self {
        Self {
            id: None,
            name: String::new(),
            category: String::new(),
            amount: 0.0,
            amount_is_variable: false,
            amount_variable: None,
            is_transfer: false,
            from: None,
            to: None,
            start_date: last_edited,
            start_date_is_variable: false,
            start_date_variable: None,
            end_date: None,
            end_date_is_variable: false,
            end_date_variable: None,
            every_n: 1,
            periods: Period::Month,
            annual_start_date: None,
            annual_end_date: None,
            increase_by: 0.0,
            increase_by_is_variable: false,
            increase_by_variable: None,
            increase_by_date: None,
            flag: false,
            skipped_until: None,
        }
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.every_n, self.periods)
    }

    /// The yearly restriction, if either bound is set. A missing bound
    /// defaults to the start (`01/01`) or end (`12/31`) of the year.
    pub fn annual_window(&self) -> Option<AnnualWindow> {
        if self.annual_start_date.is_none() && self.annual_end_date.is_none() {
            return None;
        }
        let start = self.annual_start_date.or(MonthDay::new(1, 1).ok())?;
        let end = self.annual_end_date.or(MonthDay::new(12, 31).ok())?;
        Some(AnnualWindow::new(start, end))
    }

    pub fn resolved_amount(&self, ctx: &SimulationContext<'_>) -> PlannerResult<ResolvedAmount> {
        let field = if self.amount_is_variable {
            "amount_variable"
        } else {
            "amount"
        };
        resolve_amount(
            self.amount,
            self.amount_is_variable,
            self.amount_variable.as_deref(),
            RecordKind::Bill,
            ctx,
        )
        .map_err(|err| PlannerError::field(field, err))
    }

    pub fn resolved_start(&self, ctx: &SimulationContext<'_>) -> PlannerResult<NaiveDate> {
        resolve_date(
            self.start_date,
            self.start_date_is_variable,
            self.start_date_variable.as_deref(),
            ctx,
        )
        .map_err(|err| PlannerError::field("start_date_variable", err))
    }

    pub fn resolved_end(&self, ctx: &SimulationContext<'_>) -> PlannerResult<Option<NaiveDate>> {
        resolve_optional_date(
            self.end_date,
            self.end_date_is_variable,
            self.end_date_variable.as_deref(),
            ctx,
        )
        .map_err(|err| PlannerError::field("end_date_variable", err))
    }

    pub fn resolved_increase(&self, ctx: &SimulationContext<'_>) -> PlannerResult<f64> {
        resolve_number(
            self.increase_by,
            self.increase_by_is_variable,
            self.increase_by_variable.as_deref(),
            ctx,
        )
        .map_err(|err| {
            let field = if self.increase_by_is_variable {
                "increase_by_variable"
            } else {
                "increase_by"
            };
            PlannerError::field(field, err)
        })
    }

    pub fn schedule(&self, ctx: &SimulationContext<'_>) -> PlannerResult<BillSchedule> {
        BillSchedule::from_bill(self, ctx)
    }

    /// Occurrences between `window_start` and `window_end`, both inclusive.
    pub fn occurrences(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Occurrences> {
        Ok(self.schedule(ctx)?.occurrences(window_start, window_end))
    }

    /// Builds the one-off activity for entering the first occurrence, leaving
    /// the template itself untouched. Returns `None` when nothing is scheduled.
    ///
    /// Sentinel amounts are resolved by the backend, so a bill using `{HALF}`
    /// or `{FULL}` must be entered through the `asActivity` endpoint instead.
    pub fn first_occurrence_activity(
        &self,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Option<Activity>> {
        let schedule = self.schedule(ctx)?;
        let Some(first) = schedule.iter().next() else {
            return Ok(None);
        };
        let mut activity = Activity::template(first.date);
        activity.name = self.name.clone();
        activity.category = self.category.clone();
        activity.flag = self.flag;
        activity.is_transfer = self.is_transfer;
        activity.from = self.from.clone();
        activity.to = self.to.clone();
        activity.bill_id = self.id.clone();
        activity.first_bill = true;
        match first.amount {
            ResolvedAmount::Sentinel(_) => {
                return Err(PlannerError::field(
                    "amount_variable",
                    FieldError::UnknownVariable,
                ));
            }
            ResolvedAmount::Value(value) if self.amount_is_variable => {
                activity.amount = value;
                activity.amount_is_variable = true;
                activity.amount_variable = self.amount_variable.clone();
            }
            ResolvedAmount::Value(value) => activity.amount = value,
        }
        activity.normalize_for_save();
        Ok(Some(activity))
    }

    /// Skips the next occurrence without moving the anchor. A variable start
    /// is pinned to its resolved date. Returns the next remaining occurrence,
    /// or `None` when nothing would remain and the template is left as is.
    pub fn skip_first_occurrence(
        &mut self,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Option<NaiveDate>> {
        let schedule = self.schedule(ctx)?;
        let mut remaining = schedule.iter();
        let (Some(skipped), Some(next)) = (remaining.next(), remaining.next()) else {
            return Ok(None);
        };
        self.start_date = schedule.start();
        self.start_date_is_variable = false;
        self.start_date_variable = None;
        self.skipped_until = Some(skipped.date);
        debug!(
            bill = self.name.as_str(),
            skipped = %skipped.date,
            next = %next.date,
            "skipped occurrence"
        );
        Ok(Some(next.date))
    }
}

impl Record for Bill {
    const KIND: RecordKind = RecordKind::Bill;

    fn normalize_for_save(&mut self) {
        self.amount = transfer::normalize_amount(self.amount, self.is_transfer);
    }

    fn variable_refs(&self) -> Vec<&str> {
        [
            active_ref(self.amount_is_variable, &self.amount_variable)
                .filter(|name| Sentinel::parse(name).is_none()),
            active_ref(self.start_date_is_variable, &self.start_date_variable),
            active_ref(self.end_date_is_variable, &self.end_date_variable),
            active_ref(self.increase_by_is_variable, &self.increase_by_variable),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Simulation, Variable};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn template_defaults() {
        let bill = Bill::template(date(2024, 5, 17));
        assert_eq!(bill.start_date, date(2024, 5, 17));
        assert_eq!(bill.every_n, 1);
        assert_eq!(bill.periods, Period::Month);
        assert_eq!(bill.amount, 0.0);
        assert!(bill.name.is_empty() && bill.category.is_empty());
        assert!(bill.id.is_none());
    }

    #[test]
    fn wire_shape_uses_snake_case_and_mm_dd() {
        let json = serde_json::json!({
            "id": "b-1",
            "name": "Winter heating",
            "category": "Home.Utilities",
            "amount": -120.0,
            "start_date": "2024-11-01",
            "end_date": "",
            "every_n": 1,
            "periods": "month",
            "annual_start_date": "11/01",
            "annual_end_date": "02/01",
            "increase_by_date": ""
        });
        let bill: Bill = serde_json::from_value(json).unwrap();
        assert_eq!(bill.end_date, None);
        assert_eq!(bill.increase_by_date, None);
        assert!(bill.annual_window().unwrap().wraps());

        let out = serde_json::to_value(&bill).unwrap();
        assert_eq!(out["annual_start_date"], "11/01");
        assert_eq!(out["start_date"], "2024-11-01");
        assert_eq!(out["end_date"], serde_json::Value::Null);
    }

    #[test]
    fn half_open_annual_window_fills_missing_bound() {
        let mut bill = Bill::template(date(2024, 1, 1));
        bill.annual_start_date = MonthDay::parse("06/01").ok();
        let window = bill.annual_window().unwrap();
        assert_eq!(window.end.to_string(), "12/31");
    }

    #[test]
    fn transfer_amount_normalized_on_save() {
        let mut bill = Bill::template(date(2024, 1, 1));
        bill.is_transfer = true;
        bill.amount = -250.0;
        bill.normalize_for_save();
        assert_eq!(bill.amount, 250.0);

        let mut plain = Bill::template(date(2024, 1, 1));
        plain.amount = -250.0;
        plain.normalize_for_save();
        assert_eq!(plain.amount, -250.0);
    }

    #[test]
    fn first_occurrence_becomes_linked_activity() {
        let sim = Simulation::new("Default");
        let ctx = SimulationContext::new(&sim);
        let mut bill = Bill::template(date(2024, 3, 15));
        bill.id = Some("rent".into());
        bill.name = "Rent".into();
        bill.amount = -1400.0;

        let activity = bill.first_occurrence_activity(&ctx).unwrap().unwrap();
        assert_eq!(activity.date, date(2024, 3, 15));
        assert_eq!(activity.amount, -1400.0);
        assert_eq!(activity.bill_id.as_deref(), Some("rent"));
        assert!(activity.first_bill);
        assert_eq!(bill.start_date, date(2024, 3, 15));
    }

    #[test]
    fn skip_pins_variable_start_and_keeps_anchor() {
        let sim = Simulation::new("Default")
            .with_variable("LEASE", Variable::Date(date(2024, 6, 1)));
        let ctx = SimulationContext::new(&sim);
        let mut bill = Bill::template(date(2000, 1, 1));
        bill.start_date_is_variable = true;
        bill.start_date_variable = Some("LEASE".into());

        assert_eq!(bill.skip_first_occurrence(&ctx).unwrap(), Some(date(2024, 7, 1)));
        assert_eq!(bill.start_date, date(2024, 6, 1));
        assert_eq!(bill.skipped_until, Some(date(2024, 6, 1)));
        assert!(!bill.start_date_is_variable);
    }

    #[test]
    fn skip_leaves_later_month_end_dates_alone() {
        let sim = Simulation::new("Default");
        let ctx = SimulationContext::new(&sim);
        let mut bill = Bill::template(date(2025, 1, 31));
        let expand = |bill: &Bill| -> Vec<NaiveDate> {
            bill.occurrences(date(2025, 1, 1), date(2025, 6, 30), &ctx)
                .unwrap()
                .map(|occ| occ.date)
                .collect()
        };
        let before = expand(&bill);
        assert_eq!(bill.skip_first_occurrence(&ctx).unwrap(), Some(date(2025, 2, 28)));
        assert_eq!(expand(&bill), before[1..].to_vec());

        assert_eq!(bill.skip_first_occurrence(&ctx).unwrap(), Some(date(2025, 3, 31)));
        assert_eq!(expand(&bill), before[2..].to_vec());
        assert_eq!(bill.start_date, date(2025, 1, 31));
    }

    #[test]
    fn skip_marker_round_trips_on_the_wire() {
        let mut bill = Bill::template(date(2025, 1, 31));
        let out = serde_json::to_value(&bill).unwrap();
        assert_eq!(out["skipped_until"], serde_json::Value::Null);

        bill.skipped_until = Some(date(2025, 1, 31));
        let back: Bill = serde_json::from_value(serde_json::to_value(&bill).unwrap()).unwrap();
        assert_eq!(back.skipped_until, Some(date(2025, 1, 31)));
    }

    #[test]
    fn skip_on_last_occurrence_leaves_template() {
        let sim = Simulation::new("Default");
        let ctx = SimulationContext::new(&sim);
        let mut bill = Bill::template(date(2024, 1, 10));
        bill.end_date = Some(date(2024, 1, 31));
        assert_eq!(bill.skip_first_occurrence(&ctx).unwrap(), None);
        assert_eq!(bill.start_date, date(2024, 1, 10));
    }

    #[test]
    fn variable_refs_skip_sentinels_and_inactive_names() {
        let mut bill = Bill::template(date(2024, 1, 1));
        bill.amount_is_variable = true;
        bill.amount_variable = Some("{HALF}".into());
        bill.increase_by_variable = Some("RAISE".into());
        assert!(bill.variable_refs().is_empty());

        bill.increase_by_is_variable = true;
        assert_eq!(bill.variable_refs(), vec!["RAISE"]);
    }
}
