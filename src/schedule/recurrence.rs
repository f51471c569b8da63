use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::calendar::{AnnualWindow, MonthDay, Period, TimeInterval};
use crate::errors::{FieldError, PlannerError, PlannerResult};
use crate::model::Bill;
use crate::resolve::{ResolvedAmount, SimulationContext};

/// Upper bound on occurrences yielded by a single expansion, enough for a
/// daily bill over two centuries.
pub const MAX_OCCURRENCES: usize = 100_000;
/// Upper bound on candidate dates examined, so an annual window that never
/// matches the cadence cannot spin forever on an open-ended bill.
const MAX_CANDIDATES: u64 = 1_000_000;

/// One generated date of a bill, with its escalation-adjusted amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    /// Position in the unfiltered series (`start + index * every_n`).
    pub index: u32,
    pub date: NaiveDate,
    /// `(1 + increase_by)^n` for the `n` escalation dates crossed so far.
    pub escalation: f64,
    pub amount: ResolvedAmount,
}

impl Occurrence {
    pub fn amount_value(&self) -> Option<f64> {
        self.amount.value()
    }
}

/// A bill with every variable resolved, ready to expand.
///
/// Holds no iteration state; each call to [`BillSchedule::occurrences`]
/// recomputes from the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillSchedule {
    start: NaiveDate,
    end: Option<NaiveDate>,
    interval: TimeInterval,
    annual: Option<AnnualWindow>,
    amount: ResolvedAmount,
    increase_by: f64,
    increase_by_date: Option<MonthDay>,
    skipped_until: Option<NaiveDate>,
}

impl BillSchedule {
    pub fn from_bill(bill: &Bill, ctx: &SimulationContext<'_>) -> PlannerResult<Self> {
        if bill.every_n == 0 {
            return Err(PlannerError::field("every_n", FieldError::InvalidEveryN));
        }
        let schedule = Self {
            start: bill.resolved_start(ctx)?,
            end: bill.resolved_end(ctx)?,
            interval: bill.interval(),
            annual: bill.annual_window(),
            amount: bill.resolved_amount(ctx)?,
            increase_by: bill.resolved_increase(ctx)?,
            increase_by_date: bill.increase_by_date,
            skipped_until: bill.skipped_until,
        };
        debug!(
            bill = bill.name.as_str(),
            simulation = ctx.name(),
            start = %schedule.start,
            interval = %schedule.interval.label(),
            "resolved bill schedule"
        );
        Ok(schedule)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    /// Every occurrence from the start date to the end date (if any).
    pub fn iter(&self) -> Occurrences {
        Occurrences::new(*self, self.start, self.end)
    }

    /// Occurrences in `[window_start, window_end]`, clipped to the bill's own end date.
    pub fn occurrences(&self, window_start: NaiveDate, window_end: NaiveDate) -> Occurrences {
        let limit = match self.end {
            Some(end) => end.min(window_end),
            None => window_end,
        };
        Occurrences::new(*self, window_start, Some(limit))
    }

    /// Compounded escalation for an occurrence on `date`: one factor of
    /// `1 + increase_by` per `increase_by_date` strictly after the start and
    /// on or before `date`.
    pub fn escalation_factor(&self, date: NaiveDate) -> f64 {
        let Some(anniversary) = self.increase_by_date else {
            return 1.0;
        };
        if self.increase_by == 0.0 || date <= self.start {
            return 1.0;
        }
        let crossed = (self.start.year()..=date.year())
            .filter_map(|year| anniversary.in_year(year))
            .filter(|day| *day > self.start && *day <= date)
            .count();
        (1.0 + self.increase_by).powi(crossed as i32)
    }

    /// Index of a series date known to fall before `target`, used to skip
    /// straight to a late window without walking the whole history.
    fn index_before(&self, target: NaiveDate) -> u32 {
        if target <= self.start {
            return 0;
        }
        let every = i64::from(self.interval.every);
        let months = |from: NaiveDate, to: NaiveDate| {
            (i64::from(to.year()) * 12 + i64::from(to.month0()))
                - (i64::from(from.year()) * 12 + i64::from(from.month0()))
        };
        let units = match self.interval.period {
            Period::Day => (target - self.start).num_days(),
            Period::Week => (target - self.start).num_days() / 7,
            Period::Month => months(self.start, target),
            Period::Year => months(self.start, target) / 12,
        };
        let index = units / every - 1;
        u32::try_from(index.max(0)).unwrap_or(u32::MAX)
    }
}

/// Lazy, finite sequence of [`Occurrence`]s.
#[derive(Debug, Clone)]
pub struct Occurrences {
    schedule: BillSchedule,
    window_start: NaiveDate,
    limit: Option<NaiveDate>,
    next_index: u32,
    emitted: usize,
    candidates: u64,
    truncated: bool,
    done: bool,
}

impl Occurrences {
    fn new(schedule: BillSchedule, window_start: NaiveDate, limit: Option<NaiveDate>) -> Self {
        let window_start = match schedule.skipped_until.and_then(|day| day.succ_opt()) {
            Some(after_skip) => window_start.max(after_skip),
            None => window_start,
        };
        Self {
            next_index: schedule.index_before(window_start),
            schedule,
            window_start,
            limit,
            emitted: 0,
            candidates: 0,
            truncated: false,
            done: false,
        }
    }

    /// Whether expansion stopped at a runaway limit while dates remained
    /// inside the window.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn truncate(&mut self, date: NaiveDate) {
        warn!(
            start = %self.schedule.start,
            at = %date,
            emitted = self.emitted,
            candidates = self.candidates,
            "occurrence expansion truncated"
        );
        self.truncated = true;
        self.done = true;
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        while !self.done {
            let index = self.next_index;
            let Some(date) = self.schedule.interval.nth(self.schedule.start, index) else {
                self.done = true;
                break;
            };
            if self.limit.is_some_and(|limit| date > limit) {
                self.done = true;
                break;
            }
            if self.candidates >= MAX_CANDIDATES {
                self.truncate(date);
                break;
            }
            self.candidates += 1;
            if date < self.window_start {
                self.advance(index);
                continue;
            }
            if self
                .schedule
                .annual
                .is_some_and(|window| !window.contains(date))
            {
                self.advance(index);
                continue;
            }
            if self.emitted >= MAX_OCCURRENCES {
                self.truncate(date);
                break;
            }
            self.advance(index);
            self.emitted += 1;
            let escalation = self.schedule.escalation_factor(date);
            return Some(Occurrence {
                index,
                date,
                escalation,
                amount: self.schedule.amount.scaled(escalation),
            });
        }
        None
    }
}

impl Occurrences {
    fn advance(&mut self, index: u32) {
        match index.checked_add(1) {
            Some(next) => self.next_index = next,
            None => self.done = true,
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}
