use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::calendar::Period;
use crate::errors::PlannerResult;
use crate::model::{Activity, Interest};
use crate::resolve::SimulationContext;

/// Category given to activities materialised from interest accruals.
pub const INTEREST_CATEGORY: &str = "Banking.Interest";

/// Converts a compounding period into a fraction of a year.
pub trait DayCount: fmt::Debug {
    fn year_fraction(&self, start: NaiveDate, end: NaiveDate, period: Period) -> f64;
}

/// Exact days elapsed over a 365-day year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actual365Fixed;

impl DayCount for Actual365Fixed {
    fn year_fraction(&self, start: NaiveDate, end: NaiveDate, _period: Period) -> f64 {
        (end - start).num_days() as f64 / 365.0
    }
}

/// Nominal share of a year per period (1/365, 7/365, 1/12, 1), ignoring
/// the actual length of the month or year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodFraction;

impl DayCount for PeriodFraction {
    fn year_fraction(&self, _start: NaiveDate, _end: NaiveDate, period: Period) -> f64 {
        match period {
            Period::Day => 1.0 / 365.0,
            Period::Week => 7.0 / 365.0,
            Period::Month => 1.0 / 12.0,
            Period::Year => 1.0,
        }
    }
}

/// Account balance as a function of date.
pub trait BalanceSeries {
    fn balance_on(&self, date: NaiveDate) -> f64;
}

/// A flat balance.
impl BalanceSeries for f64 {
    fn balance_on(&self, _date: NaiveDate) -> f64 {
        *self
    }
}

/// Step function: the latest entry on or before `date`, zero before the first.
impl BalanceSeries for BTreeMap<NaiveDate, f64> {
    fn balance_on(&self, date: NaiveDate) -> f64 {
        self.range(..=date)
            .next_back()
            .map(|(_, balance)| *balance)
            .unwrap_or(0.0)
    }
}

/// Interest accrued for one compounding period ending on `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accrual {
    pub date: NaiveDate,
    pub period_start: NaiveDate,
    pub amount: f64,
    pub apr: f64,
    pub interest_id: Option<String>,
}

impl Accrual {
    /// Materialises the accrual as an activity linked back to its interest rule.
    pub fn into_activity(self, first: bool) -> Activity {
        let mut activity = Activity::template(self.date);
        activity.name = "Interest".into();
        activity.category = INTEREST_CATEGORY.into();
        activity.amount = self.amount;
        activity.interest_id = self.interest_id;
        activity.first_interest = first;
        activity
    }
}

struct Segment {
    from: NaiveDate,
    until: Option<NaiveDate>,
    apr: f64,
    period: Period,
    id: Option<String>,
}

/// [`accrue_with`] using the [`Actual365Fixed`] day count.
pub fn accrue<B: BalanceSeries + ?Sized>(
    interests: &[Interest],
    balances: &B,
    window_start: NaiveDate,
    window_end: NaiveDate,
    ctx: &SimulationContext<'_>,
) -> PlannerResult<Vec<Accrual>> {
    accrue_with(interests, balances, window_start, window_end, ctx, &Actual365Fixed)
}

/// Simple interest per compounding period for an account's interest list.
///
/// Entries are ordered by their resolved `applicable_date`. Each entry steps
/// its own `compounded` period from that date until the next entry's
/// `applicable_date`, where a final partial period closes it at its own rate.
/// A period ending inside `[window_start, window_end]` accrues
/// `balance(period_start) * apr / 100 * year_fraction`, prorated by days for
/// the closing period.
pub fn accrue_with<B: BalanceSeries + ?Sized>(
    interests: &[Interest],
    balances: &B,
    window_start: NaiveDate,
    window_end: NaiveDate,
    ctx: &SimulationContext<'_>,
    day_count: &dyn DayCount,
) -> PlannerResult<Vec<Accrual>> {
    let mut segments = interests
        .iter()
        .map(|interest| {
            Ok(Segment {
                from: interest.resolved_applicable_date(ctx)?,
                until: None,
                apr: interest.resolved_apr(ctx)?,
                period: interest.compounded,
                id: interest.id.clone(),
            })
        })
        .collect::<PlannerResult<Vec<_>>>()?;
    segments.sort_by_key(|segment| segment.from);
    for index in 1..segments.len() {
        let next_from = segments[index].from;
        segments[index - 1].until = Some(next_from);
    }

    let mut accruals = Vec::new();
    for segment in &segments {
        let mut period_start = segment.from;
        let mut step = 1i64;
        while let Some(boundary) = segment.period.shift(segment.from, step) {
            let closing = segment.until.is_some_and(|until| boundary >= until);
            let end = match segment.until {
                Some(until) if closing => until,
                _ => boundary,
            };
            if end > window_end {
                break;
            }
            if end >= window_start && end > period_start {
                let full = day_count.year_fraction(period_start, boundary, segment.period);
                let fraction = if end == boundary {
                    full
                } else {
                    full * (end - period_start).num_days() as f64
                        / (boundary - period_start).num_days() as f64
                };
                let balance = balances.balance_on(period_start);
                accruals.push(Accrual {
                    date: end,
                    period_start,
                    amount: balance * (segment.apr / 100.0) * fraction,
                    apr: segment.apr,
                    interest_id: segment.id.clone(),
                });
            }
            if closing {
                break;
            }
            period_start = boundary;
            step += 1;
        }
    }
    debug!(
        entries = interests.len(),
        accruals = accruals.len(),
        simulation = ctx.name(),
        "computed interest accruals"
    );
    Ok(accruals)
}
