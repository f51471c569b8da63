use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::FieldError;

/// Calendar unit used both for bill cadence (`periods`) and interest compounding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Moves `from` by `steps` units, clamping the day-of-month when a month
    /// or year shift lands past the end of the target month.
    pub fn shift(&self, from: NaiveDate, steps: i64) -> Option<NaiveDate> {
        match self {
            Period::Day => from.checked_add_signed(Duration::try_days(steps)?),
            Period::Week => from.checked_add_signed(Duration::try_weeks(steps)?),
            Period::Month => shift_month(from, steps),
            Period::Year => shift_month(from, steps.checked_mul(12)?),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FieldError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(FieldError::InvalidPeriod),
        }
    }
}

/// `every` units of `period`, anchored on a start date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub period: Period,
}

impl TimeInterval {
    pub fn new(every: u32, period: Period) -> Self {
        Self { every, period }
    }

    /// The `index`-th date of the series starting at `anchor`.
    ///
    /// Always computed from the anchor, never by chaining, so a clamped step
    /// (Jan 31 -> Feb 29) does not drag later occurrences to the 29th.
    pub fn nth(&self, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
        let steps = i64::from(self.every).checked_mul(i64::from(index))?;
        self.period.shift(anchor, steps)
    }

    pub fn next_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.period.shift(from, i64::from(self.every))
    }

    pub fn previous_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.period.shift(from, -i64::from(self.every))
    }

    pub fn label(&self) -> String {
        match (self.every, self.period) {
            (1, Period::Day) => "Daily".into(),
            (1, Period::Week) => "Weekly".into(),
            (1, Period::Month) => "Monthly".into(),
            (1, Period::Year) => "Yearly".into(),
            (n, period) => format!("Every {} {}s", n, period),
        }
    }
}

fn shift_month(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in `month` of `year`; 0 for an out-of-range month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
