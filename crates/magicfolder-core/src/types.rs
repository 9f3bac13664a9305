//! Shared data types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A classification result for a single backing-store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Absolute path of the file in the backing store.
    pub path: PathBuf,
    /// Category label assigned by the classifier.
    pub category: String,
}

/// Visibility of a filename in the virtual namespace.
///
/// Every filename known to the system is in exactly one of these states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Present in the backing store and listed at the root. Transient
    /// bootstrap state: files found on disk before any verdict.
    Visible,
    /// Suppressed from the root listing, awaiting or undergoing
    /// classification.
    Hidden,
    /// Suppressed from the root listing; appears under the named category
    /// directory instead.
    Classified(String),
}
