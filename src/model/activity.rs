use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{active_ref, Record};
use crate::calendar::date::date_string;
use crate::calendar::today;
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::resolve::{resolve_amount, resolve_date, RecordKind, ResolvedAmount, SimulationContext};
use crate::transfer;

/// One dated financial event, freestanding or materialised from a bill or
/// interest occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "today", with = "date_string")]
    pub date: NaiveDate,
    #[serde(default)]
    pub date_is_variable: bool,
    #[serde(default)]
    pub date_variable: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub amount_is_variable: bool,
    #[serde(default)]
    pub amount_variable: Option<String>,
    #[serde(rename = "billId", default, skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<String>,
    #[serde(rename = "firstBill", default)]
    pub first_bill: bool,
    #[serde(rename = "interestId", default, skip_serializing_if = "Option::is_none")]
    pub interest_id: Option<String>,
    #[serde(rename = "firstInterest", default)]
    pub first_interest: bool,
    /// Running balance computed by the backend; never sent back.
    #[serde(default, skip_serializing)]
    pub balance: Option<f64>,
}

impl Activity {
    pub fn template(date: NaiveDate) -> Self {
        Self {
            id: None,
            name: String::new(),
            category: String::new(),
            flag: false,
            is_transfer: false,
            from: None,
            to: None,
            date,
            date_is_variable: false,
            date_variable: None,
            amount: 0.0,
            amount_is_variable: false,
            amount_variable: None,
            bill_id: None,
            first_bill: false,
            interest_id: None,
            first_interest: false,
            balance: None,
        }
    }

    /// Whether the activity was materialised from a bill or interest template.
    pub fn is_derived(&self) -> bool {
        self.bill_id.is_some() || self.interest_id.is_some()
    }

    pub fn resolved_amount(&self, ctx: &SimulationContext<'_>) -> PlannerResult<f64> {
        let field = if self.amount_is_variable {
            "amount_variable"
        } else {
            "amount"
        };
        let resolved = resolve_amount(
            self.amount,
            self.amount_is_variable,
            self.amount_variable.as_deref(),
            RecordKind::Activity,
            ctx,
        )
        .map_err(|err| PlannerError::field(field, err))?;
        match resolved {
            ResolvedAmount::Value(value) => Ok(value),
            ResolvedAmount::Sentinel(_) => Err(PlannerError::field(
                "amount_variable",
                FieldError::UnknownVariable,
            )),
        }
    }

    pub fn resolved_date(&self, ctx: &SimulationContext<'_>) -> PlannerResult<NaiveDate> {
        resolve_date(
            self.date,
            self.date_is_variable,
            self.date_variable.as_deref(),
            ctx,
        )
        .map_err(|err| PlannerError::field("date_variable", err))
    }
}

impl Record for Activity {
    const KIND: RecordKind = RecordKind::Activity;

    fn normalize_for_save(&mut self) {
        self.amount = transfer::normalize_amount(self.amount, self.is_transfer);
    }

    fn variable_refs(&self) -> Vec<&str> {
        [
            active_ref(self.amount_is_variable, &self.amount_variable),
            active_ref(self.date_is_variable, &self.date_variable),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
