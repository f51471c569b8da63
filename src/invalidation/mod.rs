//! Dependency edges between mutations and the views that must reload.
//!
//! A view key with no account covers that view for every account.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::model::{Activity, Bill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Accounts,
    Activities,
    Bills,
    Interests,
    Graph,
    Calendar,
    Flow,
    Categories,
    Simulations,
    UsedVariables,
}

impl View {
    /// Views whose content is partitioned by account.
    pub fn is_account_scoped(&self) -> bool {
        matches!(
            self,
            View::Activities | View::Bills | View::Interests | View::Graph
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ViewKey {
    pub view: View,
    pub account: Option<String>,
}

impl ViewKey {
    pub fn global(view: View) -> Self {
        Self { view, account: None }
    }

    pub fn account(view: View, account: impl Into<String>) -> Self {
        Self {
            view,
            account: Some(account.into()),
        }
    }

    /// Whether reloading `self` also refreshes `other`.
    pub fn covers(&self, other: &ViewKey) -> bool {
        self.view == other.view && (self.account.is_none() || self.account == other.account)
    }
}

/// A persisted change, carrying every account it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Bill { accounts: BTreeSet<String> },
    /// A bill occurrence entered as an activity, or skipped.
    BillOccurrence { accounts: BTreeSet<String> },
    Activity { accounts: BTreeSet<String> },
    Interest { account: String },
    Simulation,
    Variable,
    Category,
}

fn touched(
    account: &str,
    is_transfer: bool,
    from: &Option<String>,
    to: &Option<String>,
) -> BTreeSet<String> {
    let mut accounts = BTreeSet::from([account.to_string()]);
    if is_transfer {
        let endpoints = from.iter().chain(to.iter());
        accounts.extend(endpoints.filter(|id| !id.is_empty()).cloned());
    }
    accounts
}

impl Mutation {
    pub fn bill(account: &str, bill: &Bill) -> Self {
        Mutation::Bill {
            accounts: touched(account, bill.is_transfer, &bill.from, &bill.to),
        }
    }

    pub fn bill_occurrence(account: &str, bill: &Bill) -> Self {
        Mutation::BillOccurrence {
            accounts: touched(account, bill.is_transfer, &bill.from, &bill.to),
        }
    }

    pub fn activity(account: &str, activity: &Activity) -> Self {
        Mutation::Activity {
            accounts: touched(account, activity.is_transfer, &activity.from, &activity.to),
        }
    }

    pub fn interest(account: impl Into<String>) -> Self {
        Mutation::Interest {
            account: account.into(),
        }
    }
}

fn per_account(views: &[View], accounts: &BTreeSet<String>, out: &mut BTreeSet<ViewKey>) {
    for view in views {
        for account in accounts {
            out.insert(ViewKey::account(*view, account.clone()));
        }
    }
}

fn global(views: &[View], out: &mut BTreeSet<ViewKey>) {
    out.extend(views.iter().copied().map(ViewKey::global));
}

/// The views a mutation makes stale.
pub fn affected_views(mutation: &Mutation) -> BTreeSet<ViewKey> {
    let mut views = BTreeSet::new();
    match mutation {
        Mutation::Bill { accounts } => {
            per_account(&[View::Bills, View::Activities, View::Graph], accounts, &mut views);
            global(&[View::Calendar, View::Flow, View::Categories, View::UsedVariables], &mut views);
        }
        Mutation::BillOccurrence { accounts } => {
            per_account(&[View::Bills, View::Activities, View::Graph], accounts, &mut views);
            global(&[View::Accounts, View::Calendar, View::Flow, View::Categories], &mut views);
        }
        Mutation::Activity { accounts } => {
            per_account(&[View::Activities, View::Graph], accounts, &mut views);
            global(
                &[
                    View::Accounts,
                    View::Calendar,
                    View::Flow,
                    View::Categories,
                    View::UsedVariables,
                ],
                &mut views,
            );
        }
        Mutation::Interest { account } => {
            let accounts = BTreeSet::from([account.clone()]);
            per_account(&[View::Interests, View::Activities, View::Graph], &accounts, &mut views);
            global(&[View::Accounts, View::Calendar, View::Flow, View::UsedVariables], &mut views);
        }
        Mutation::Simulation | Mutation::Variable => {
            global(
                &[
                    View::Accounts,
                    View::Activities,
                    View::Bills,
                    View::Interests,
                    View::Graph,
                    View::Calendar,
                    View::Flow,
                    View::Categories,
                    View::Simulations,
                    View::UsedVariables,
                ],
                &mut views,
            );
        }
        Mutation::Category => {
            global(&[View::Categories, View::Activities, View::Bills, View::Flow], &mut views);
        }
    }
    views
}

/// Accumulates stale views until the caller reloads them.
#[derive(Debug, Clone, Default)]
pub struct InvalidationTracker {
    pending: BTreeSet<ViewKey>,
}

impl InvalidationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mutation: &Mutation) {
        let views = affected_views(mutation);
        debug!(mutation = ?mutation, views = views.len(), "invalidated views");
        for key in views {
            self.invalidate(key);
        }
    }

    /// Marks one view stale, folding it into any broader pending key.
    pub fn invalidate(&mut self, key: ViewKey) {
        if self.pending.iter().any(|pending| pending.covers(&key)) {
            return;
        }
        if key.account.is_none() {
            self.pending.retain(|pending| pending.view != key.view);
        }
        self.pending.insert(key);
    }

    pub fn is_dirty(&self, key: &ViewKey) -> bool {
        self.pending.iter().any(|pending| pending.covers(key))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ViewKey> {
        self.pending.iter()
    }

    /// Drains the pending set; the caller owns reloading what it returns.
    pub fn take(&mut self) -> BTreeSet<ViewKey> {
        std::mem::take(&mut self.pending)
    }
}
