//! Recurrence expansion for bills and accrual schedules for interest rules.

pub mod accrual;
pub mod recurrence;

pub use accrual::{
    accrue, accrue_with, Accrual, Actual365Fixed, BalanceSeries, DayCount, PeriodFraction,
    INTEREST_CATEGORY,
};
pub use recurrence::{BillSchedule, Occurrence, Occurrences, MAX_OCCURRENCES};
