//! Parser for checker stdout
//!
//! The protocol is deliberately narrow: exactly four comma-separated fields,
//! each `<label> <status>`, labels fixed in the order advisories, bans,
//! licenses, sources. Anything else fails the parse — partial output is never
//! trusted.

use crate::types::Verdict;
use thiserror::Error;

/// Labels required in checker output, in protocol order
const EXPECTED_LABELS: [&str; 4] = ["advisories", "bans", "licenses", "sources"];

/// Status token that marks a category as passing; any other token is a fail
const STATUS_OK: &str = "ok";

/// Why checker stdout failed to parse
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerdictParseError {
    /// The output did not split into exactly four comma-separated fields
    #[error("expected 4 comma-separated fields, found {0}")]
    WrongFieldCount(usize),

    /// A field was not of the form `<label> <status>`
    #[error("field {field:?} is not of the form '<label> <status>'")]
    MalformedField {
        /// The offending field text
        field: String,
    },

    /// A field carried a label other than the one required at its position
    #[error("expected label {expected:?}, found {found:?}")]
    UnexpectedLabel {
        /// The label required at this position
        expected: &'static str,
        /// The label actually present
        found: String,
    },
}

/// Parse one checker invocation's stdout into a [`Verdict`]
///
/// # Errors
///
/// Returns a [`VerdictParseError`] describing the first deviation from the
/// protocol; the caller records the offending text for diagnostics and skips
/// the item.
pub fn parse_verdict(stdout: &str) -> std::result::Result<Verdict, VerdictParseError> {
    let fields: Vec<&str> = stdout.trim().split(',').map(str::trim).collect();
    if fields.len() != EXPECTED_LABELS.len() {
        return Err(VerdictParseError::WrongFieldCount(fields.len()));
    }

    let mut statuses = [false; 4];
    for (slot, (field, expected)) in statuses
        .iter_mut()
        .zip(fields.iter().zip(EXPECTED_LABELS))
    {
        let mut tokens = field.split_whitespace();
        let (Some(label), Some(status), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(VerdictParseError::MalformedField {
                field: (*field).to_string(),
            });
        };

        if label != expected {
            return Err(VerdictParseError::UnexpectedLabel {
                expected,
                found: label.to_string(),
            });
        }

        *slot = status == STATUS_OK;
    }

    Ok(Verdict {
        advisories: statuses[0],
        bans: statuses[1],
        licenses: statuses[2],
        sources: statuses[3],
    })
}
