//! Artifact handling: scratch directories, downloads, extraction
//!
//! Everything in this module is item-scoped. Failures never escape as errors;
//! they come back as [`crate::types::SkipReason`] values so one bad artifact
//! skips one item and nothing else.

mod extract;
mod fetch;
mod workdir;

// Re-exports
pub use extract::unpack_artifact;
pub use fetch::fetch_artifact;
pub use workdir::WorkingArea;
