use chrono::NaiveDate;
use reqwest::Url;

use crate::calendar::to_date_string;
use crate::errors::{PlannerError, PlannerResult};
use crate::resolve::SimulationContext;

/// Backend routes under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Bills { account: &'a str },
    Bill { account: &'a str, bill: &'a str },
    Interests { account: &'a str },
    ConsolidatedActivity { account: &'a str },
    Activities { account: &'a str },
    Activity { account: &'a str, activity: &'a str },
    UsedVariables,
}

impl<'a> Endpoint<'a> {
    fn segments(&self) -> Vec<&'a str> {
        match *self {
            Endpoint::Bills { account } => vec!["accounts", account, "bills"],
            Endpoint::Bill { account, bill } => vec!["accounts", account, "bills", bill],
            Endpoint::Interests { account } => vec!["accounts", account, "interests"],
            Endpoint::ConsolidatedActivity { account } => {
                vec!["accounts", account, "consolidated_activity"]
            }
            Endpoint::Activities { account } => vec!["accounts", account, "activity"],
            Endpoint::Activity { account, activity } => {
                vec!["accounts", account, "activity", activity]
            }
            Endpoint::UsedVariables => vec!["simulations", "used_variables"],
        }
    }

    /// Full request URL. Path segments are percent-encoded and
    /// `simulation` is always the last query parameter.
    pub fn url(
        &self,
        base: &Url,
        query: &Query,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| PlannerError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(self.segments());
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.pairs() {
                pairs.append_pair(key, &value);
            }
            pairs.append_pair("simulation", ctx.name());
        }
        Ok(url)
    }
}

/// Optional query flags understood by the bill, interest and activity routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Query {
    pub is_transfer: Option<bool>,
    pub as_activity: bool,
    pub skip: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer(is_transfer: bool) -> Self {
        Self {
            is_transfer: Some(is_transfer),
            ..Self::default()
        }
    }

    pub fn window(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn as_activity(mut self) -> Self {
        self.as_activity = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(is_transfer) = self.is_transfer {
            pairs.push(("isTransfer", is_transfer.to_string()));
        }
        if self.as_activity {
            pairs.push(("asActivity", "true".to_string()));
        }
        if self.skip {
            pairs.push(("skip", "true".to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", to_date_string(start)));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", to_date_string(end)));
        }
        pairs
    }
}
