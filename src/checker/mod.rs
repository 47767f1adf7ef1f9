//! External policy checking
//!
//! The checker is an opaque subprocess with a fixed text protocol: run in the
//! unpacked package root with the policy configuration alongside, print four
//! comma-separated `<label> <status>` fields on stdout. This module provides
//! the trait seam, the CLI implementation, and the protocol parser.

mod cli;
mod parser;

// Re-exports
pub use cli::CliPolicyChecker;
pub use parser::{VerdictParseError, parse_verdict};

use crate::types::Outcome;
use async_trait::async_trait;
use std::path::Path;

/// Trait for policy compliance checking
///
/// Implementations can invoke an external binary or provide scripted
/// behavior for tests. A checker can never fail the run: anything short of a
/// parseable verdict is an [`Outcome::Skipped`] for that one item.
#[async_trait]
pub trait PolicyChecker: Send + Sync {
    /// Run the policy check against the unpacked package rooted at
    /// `package_dir`
    ///
    /// # Returns
    ///
    /// [`Outcome::Verdict`] when the checker ran and its output parsed;
    /// [`Outcome::Skipped`] with the reason otherwise.
    async fn check(&self, package_dir: &Path) -> Outcome;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
