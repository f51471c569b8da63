//! Transfer invariants: two distinct known accounts and a balanced posting pair.

use serde::Serialize;

use crate::errors::FieldError;
use crate::model::{find_account, Account};

/// One side of a transfer as the backend materialises it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    pub account: String,
    pub amount: f64,
}

/// Transfers carry direction in `from`/`to`, so only the magnitude is stored.
pub fn normalize_amount(amount: f64, is_transfer: bool) -> f64 {
    if is_transfer {
        amount.abs()
    } else {
        amount
    }
}

/// Checks both endpoints of a transfer, reporting the offending field.
pub fn check_endpoints(
    from: Option<&str>,
    to: Option<&str>,
    accounts: &[Account],
) -> Result<(), (&'static str, FieldError)> {
    let known = |id: Option<&str>| {
        id.filter(|id| !id.is_empty())
            .and_then(|id| find_account(accounts, id))
    };
    let from_account = known(from).ok_or(("from", FieldError::InvalidAccount))?;
    let to_account = known(to).ok_or(("to", FieldError::InvalidAccount))?;
    if from_account.id == to_account.id {
        return Err(("to", FieldError::SameAccount));
    }
    Ok(())
}

/// The debit on `from` and the matching credit on `to`.
pub fn postings(amount: f64, from: &str, to: &str) -> [Posting; 2] {
    let magnitude = amount.abs();
    [
        Posting {
            account: from.to_string(),
            amount: -magnitude,
        },
        Posting {
            account: to.to_string(),
            amount: magnitude,
        },
    ]
}
