use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::date::parse_digits;
use super::interval::days_in_month;
use crate::errors::FieldError;

/// Leap year used to bound day-of-month so `02/29` stays valid.
const REFERENCE_LEAP_YEAR: i32 = 2000;

/// A `MM/DD` day of the year, used for annual windows and escalation dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self, FieldError> {
        if !(1..=12).contains(&month) {
            return Err(FieldError::InvalidMonth);
        }
        if day == 0 || day > days_in_month(REFERENCE_LEAP_YEAR, month) {
            return Err(FieldError::InvalidDay);
        }
        Ok(Self { month, day })
    }

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let bytes = raw.as_bytes();
        if bytes.len() != 5 || !raw.is_ascii() || bytes[2] != b'/' {
            return Err(FieldError::InvalidFormat);
        }
        let month = parse_digits(&raw[0..2])?;
        let day = parse_digits(&raw[3..5])?;
        Self::new(month, day)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// This day in `year`; `02/29` falls back to Feb 28 outside leap years.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        let day = self.day.min(days_in_month(year, self.month));
        NaiveDate::from_ymd_opt(year, self.month, day)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MonthDay::parse(&value)
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

/// Checks a `MM/DD` string: two zero-padded components, a real month, and a
/// day that exists in that month of a leap year.
pub fn validate_month_day(raw: &str) -> Result<MonthDay, FieldError> {
    MonthDay::parse(raw)
}

/// Inclusive yearly window; wraps past Dec 31 when `start` is after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl AnnualWindow {
    pub fn new(start: MonthDay, end: MonthDay) -> Self {
        Self { start, end }
    }

    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let md = MonthDay::of(date);
        if self.wraps() {
            md >= self.start || md <= self.end
        } else {
            md >= self.start && md <= self.end
        }
    }
}

/// Serde adapter for optional `MM/DD` fields; `null` and `""` both mean unset.
pub mod optional_month_day {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::MonthDay;

    pub fn serialize<S: Serializer>(
        value: &Option<MonthDay>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(md) => serializer.serialize_str(&md.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<MonthDay>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.is_empty() => {
                MonthDay::parse(&raw).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}
