use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::errors::{FieldError, PlannerError, PlannerResult};

/// Per-field outcome of validating a draft. Absent fields are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<&'static str, FieldError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` for `field`; the first error reported for a field wins.
    pub fn insert(&mut self, field: &'static str, error: FieldError) {
        self.errors.entry(field).or_insert(error);
    }

    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.errors.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// The save button is enabled only while this holds.
    pub fn all_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldError)> + '_ {
        self.errors.iter().map(|(field, error)| (*field, *error))
    }

    pub fn into_result(self) -> PlannerResult<()> {
        if self.all_valid() {
            Ok(())
        } else {
            Err(PlannerError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("no errors");
        }
        for (index, (field, error)) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_field_is_kept() {
        let mut report = ValidationReport::new();
        report.insert("to", FieldError::InvalidAccount);
        report.insert("to", FieldError::SameAccount);
        report.insert("amount", FieldError::InvalidAmount);
        assert_eq!(report.get("to"), Some(FieldError::InvalidAccount));
        assert_eq!(report.to_string(), "amount: invalid amount, to: invalid account");
        assert!(matches!(
            report.into_result(),
            Err(PlannerError::Validation(report)) if report.len() == 2
        ));
    }
}
