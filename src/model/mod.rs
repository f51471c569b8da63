//! Wire-compatible records exchanged with the planning backend.

pub mod account;
pub mod activity;
pub mod bill;
pub mod category;
pub mod interest;
pub mod simulation;
pub mod usage;

pub use account::{find_account, Account};
pub use activity::Activity;
pub use bill::Bill;
pub use category::CategoryTree;
pub use interest::Interest;
pub use simulation::{Simulation, SimulationSet, Variable, VariableType, DEFAULT_SIMULATION};
pub use usage::{UsageKind, UsedVariable, UsedVariables};

use serde::{de::DeserializeOwned, Serialize};

use crate::resolve::RecordKind;

/// Records that pass through an editor before being persisted.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;

    /// Applies save-time normalisation; the default leaves the record untouched.
    fn normalize_for_save(&mut self) {}

    /// Names of every variable the record currently references.
    fn variable_refs(&self) -> Vec<&str>;
}

pub(crate) fn active_ref<'a>(is_variable: bool, name: &'a Option<String>) -> Option<&'a str> {
    if is_variable {
        name.as_deref().filter(|name| !name.is_empty())
    } else {
        None
    }
}
