use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which kind of record holds a variable reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Bill,
    Activity,
    Interest,
}

/// One record referencing a simulation variable, as returned by
/// `GET /api/simulations/used_variables`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsedVariable {
    #[serde(rename = "type")]
    pub kind: UsageKind,
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Variable name -> every record that references it.
pub type UsedVariables = BTreeMap<String, Vec<UsedVariable>>;
