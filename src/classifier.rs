//! Maps submission and confirmation failures into a small taxonomy.
//!
//! Classification is diagnostic only: it changes how a failure is reported,
//! never whether anything is retried.

use crate::errors::ChainError;
use serde::Serialize;
use std::fmt;

pub const REPLACEMENT_UNDERPRICED: &str = "REPLACEMENT_UNDERPRICED";
pub const NONCE_EXPIRED: &str = "NONCE_EXPIRED";
pub const TRANSACTION_REPLACED: &str = "TRANSACTION_REPLACED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A competing transaction from the same identity offered too low a fee.
    ReplacementUnderpriced,
    /// The nonce was already consumed before inclusion.
    NonceExpired,
    /// A different transaction with the same nonce was mined instead.
    TransactionReplaced,
    Unclassified,
}

impl ErrorKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::ReplacementUnderpriced => "Replacement transaction underpriced",
            Self::NonceExpired => "Nonce expired",
            Self::TransactionReplaced => "Transaction replaced",
            Self::Unclassified => "Unclassified failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

pub fn classify_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some(REPLACEMENT_UNDERPRICED) => ErrorKind::ReplacementUnderpriced,
        Some(NONCE_EXPIRED) => ErrorKind::NonceExpired,
        Some(TRANSACTION_REPLACED) => ErrorKind::TransactionReplaced,
        _ => ErrorKind::Unclassified,
    }
}

pub fn classify(err: &ChainError) -> ErrorKind {
    classify_code(err.code())
}

/// Derive a failure code from a node's error text.
///
/// Nodes report these conditions only as free-form messages, so the
/// connector uses this to tag its errors before they reach [`classify`].
pub fn code_from_message(message: &str) -> Option<&'static str> {
    let m = message.to_ascii_lowercase();
    if m.contains("replacement transaction underpriced") || gas_price_too_low(&m) {
        Some(REPLACEMENT_UNDERPRICED)
    } else if m.contains("nonce too low")
        || m.contains("nonce is too low")
        || m.contains("nonce has already been used")
    {
        Some(NONCE_EXPIRED)
    } else {
        None
    }
}

/// `transaction gas price ... too low`, as reported when a same-nonce
/// replacement does not raise the fee enough.
fn gas_price_too_low(m: &str) -> bool {
    m.find("transaction gas price")
        .is_some_and(|at| m[at..].contains("too low"))
}
