use tracing::warn;

use crate::errors::{PlannerError, PlannerResult};
use crate::model::{
    Account, Activity, Bill, Interest, Record, UsageKind, UsedVariable, UsedVariables,
};

/// Refuses to rename or delete a variable that any record still references.
pub fn ensure_variable_unused(name: &str, used: &UsedVariables) -> PlannerResult<()> {
    match used.get(name) {
        Some(references) if !references.is_empty() => {
            warn!(
                variable = name,
                references = references.len(),
                "variable is still referenced"
            );
            Err(PlannerError::VariableInUse {
                name: name.to_string(),
                references: references.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Records owned by one account, as loaded by the views.
#[derive(Debug, Clone, Copy)]
pub struct AccountRecords<'a> {
    pub account: &'a Account,
    pub bills: &'a [Bill],
    pub activities: &'a [Activity],
    pub interests: &'a [Interest],
}

impl<'a> AccountRecords<'a> {
    pub fn new(account: &'a Account) -> Self {
        Self {
            account,
            bills: &[],
            activities: &[],
            interests: &[],
        }
    }

    fn usages(&self) -> Vec<(&'a str, UsedVariable)> {
        let mut usages = Vec::new();
        for bill in self.bills {
            usages.extend(self.refs(bill, UsageKind::Bill, bill.id.as_deref(), &bill.name));
        }
        for activity in self.activities {
            usages.extend(self.refs(
                activity,
                UsageKind::Activity,
                activity.id.as_deref(),
                &activity.name,
            ));
        }
        for interest in self.interests {
            usages.extend(self.refs(
                interest,
                UsageKind::Interest,
                interest.id.as_deref(),
                "Interest",
            ));
        }
        usages
    }

    fn refs<R: Record>(
        &self,
        record: &'a R,
        kind: UsageKind,
        id: Option<&str>,
        name: &str,
    ) -> Vec<(&'a str, UsedVariable)> {
        record
            .variable_refs()
            .into_iter()
            .map(|variable| {
                (
                    variable,
                    UsedVariable {
                        kind,
                        account_id: self.account.id.clone(),
                        account_name: Some(self.account.name.clone()),
                        id: id.map(str::to_string),
                        name: name.to_string(),
                    },
                )
            })
            .collect()
    }
}

/// Local equivalent of the backend's used-variables index.
pub fn collect_used_variables(records: &[AccountRecords<'_>]) -> UsedVariables {
    let mut used = UsedVariables::new();
    for account in records {
        for (variable, usage) in account.usages() {
            let entries = used.entry(variable.to_string()).or_default();
            if !entries.contains(&usage) {
                entries.push(usage);
            }
        }
    }
    used
}

pub fn find_variable_usages(name: &str, records: &[AccountRecords<'_>]) -> Vec<UsedVariable> {
    collect_used_variables(records)
        .remove(name)
        .unwrap_or_default()
}
