use chrono::{Datelike, Local, NaiveDate};

use crate::errors::FieldError;

/// Canonical wire format for every date the backend exchanges.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a date as `YYYY-MM-DD` from its calendar fields.
pub fn to_date_string(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parses a `YYYY-MM-DD` string into a calendar date.
///
/// Only the calendar fields are read. A trailing `T...` time component, as
/// sent by some endpoints, is ignored rather than converted between zones, so
/// the parsed day never shifts with the local offset.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();
    if !raw.is_ascii() {
        return Err(FieldError::InvalidFormat);
    }
    let date_part = match raw.as_bytes().get(10) {
        Some(b'T') => &raw[..10],
        Some(_) => return Err(FieldError::InvalidFormat),
        None => raw,
    };
    let bytes = date_part.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(FieldError::InvalidFormat);
    }
    let year = parse_digits(&date_part[0..4])?;
    let month = parse_digits(&date_part[5..7])?;
    let day = parse_digits(&date_part[8..10])?;
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(FieldError::InvalidDate)
}

/// Today's date in the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_digits(part: &str) -> Result<u32, FieldError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::InvalidFormat);
    }
    part.parse().map_err(|_| FieldError::InvalidFormat)
}

/// Serde adapter for required `YYYY-MM-DD` fields.
pub mod date_string {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_date_string(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

/// Serde adapter for nullable dates; `null` and `""` both mean "no date".
pub mod optional_date_string {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&super::to_date_string(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                super::parse_date(&raw).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}
