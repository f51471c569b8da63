mod common;

use std::collections::BTreeMap;

use common::date;
use planner_core::{
    calendar::Period,
    model::{Interest, Simulation, Variable},
    resolve::SimulationContext,
    schedule::{accrue, accrue_with, PeriodFraction, INTEREST_CATEGORY},
    FieldError,
};

fn yearly(from: chrono::NaiveDate, apr: f64) -> Interest {
    let mut interest = Interest::template(from);
    interest.apr = apr;
    interest.compounded = Period::Year;
    interest
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[test]
fn common_year_accrues_full_rate() {
    let sim = Simulation::new("Default");
    let ctx = SimulationContext::new(&sim);
    let interests = [yearly(date(2023, 1, 1), 12.0)];
    let got = accrue(&interests, &1000.0, date(2023, 1, 1), date(2024, 1, 1), &ctx).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].date, date(2024, 1, 1));
    assert_eq!(cents(got[0].amount), 120.0);
}

#[test]
fn leap_year_depends_on_day_count() {
    let sim = Simulation::new("Default");
    let ctx = SimulationContext::new(&sim);
    let interests = [yearly(date(2024, 1, 1), 12.0)];
    let actual = accrue(&interests, &1000.0, date(2024, 1, 1), date(2025, 1, 1), &ctx).unwrap();
    assert_eq!(cents(actual[0].amount), 120.33);

    let nominal = accrue_with(
        &interests,
        &1000.0,
        date(2024, 1, 1),
        date(2025, 1, 1),
        &ctx,
        &PeriodFraction,
    )
    .unwrap();
    assert_eq!(cents(nominal[0].amount), 120.0);
}

#[test]
fn accrual_reads_balance_at_period_start() {
    let sim = Simulation::new("Default");
    let ctx = SimulationContext::new(&sim);
    let mut interest = Interest::template(date(2025, 1, 1));
    interest.apr = 12.0;
    interest.compounded = Period::Month;
    let balances: BTreeMap<_, _> = [(date(2025, 1, 1), 1000.0), (date(2025, 2, 15), 2000.0)].into();
    let got = accrue_with(
        &[interest],
        &balances,
        date(2025, 1, 1),
        date(2025, 4, 1),
        &ctx,
        &PeriodFraction,
    )
    .unwrap();
    let amounts: Vec<f64> = got.iter().map(|accrual| cents(accrual.amount)).collect();
    assert_eq!(amounts, vec![10.0, 10.0, 20.0]);
}

#[test]
fn window_excludes_earlier_boundaries() {
    let sim = Simulation::new("Default");
    let ctx = SimulationContext::new(&sim);
    let mut interest = Interest::template(date(2020, 1, 1));
    interest.apr = 6.0;
    interest.compounded = Period::Month;
    let got = accrue(&[interest], &500.0, date(2025, 3, 1), date(2025, 5, 31), &ctx).unwrap();
    let boundaries: Vec<_> = got.iter().map(|accrual| accrual.date).collect();
    assert_eq!(boundaries, vec![date(2025, 3, 1), date(2025, 4, 1), date(2025, 5, 1)]);
}

#[test]
fn variable_apr_resolves_through_simulation() {
    let sim = Simulation::new("Default").with_variable("HYSA", Variable::Amount(4.0));
    let ctx = SimulationContext::new(&sim);
    let mut interest = yearly(date(2024, 1, 1), 0.0);
    interest.apr_is_variable = true;
    interest.apr_variable = Some("HYSA".into());
    let got = accrue_with(
        &[interest.clone()],
        &1000.0,
        date(2024, 1, 1),
        date(2025, 1, 1),
        &ctx,
        &PeriodFraction,
    )
    .unwrap();
    assert_eq!(cents(got[0].amount), 40.0);

    let empty = Simulation::new("Other");
    let err = accrue(
        &[interest],
        &1000.0,
        date(2024, 1, 1),
        date(2025, 1, 1),
        &SimulationContext::new(&empty),
    )
    .unwrap_err();
    assert_eq!(err.field_error(), Some(FieldError::UnknownVariable));
}

#[test]
fn accruals_become_interest_activities() {
    let sim = Simulation::new("Default");
    let ctx = SimulationContext::new(&sim);
    let mut interest = yearly(date(2023, 1, 1), 12.0);
    interest.id = Some("int-9".into());
    let accrual = accrue(&[interest], &1000.0, date(2023, 1, 1), date(2024, 1, 1), &ctx)
        .unwrap()
        .remove(0);
    let activity = accrual.into_activity(true);
    assert_eq!(activity.category, INTEREST_CATEGORY);
    assert_eq!(activity.interest_id.as_deref(), Some("int-9"));
    assert!(activity.first_interest);
    assert_eq!(activity.date, date(2024, 1, 1));
}
