//! Calendar helpers shared by the schedule engine, resolution and validation.

pub mod date;
pub mod interval;
pub mod month_day;

pub use date::{parse_date, to_date_string, today, DATE_FORMAT};
pub use interval::{days_in_month, Period, TimeInterval};
pub use month_day::{validate_month_day, AnnualWindow, MonthDay};
