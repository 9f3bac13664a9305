//! Mapping between the virtual namespace and the flat backing store.
//!
//! The virtual hierarchy is cosmetic: regardless of which category a file
//! is listed under, the physical bytes live at the top level of the
//! backing directory. The router mechanically rewrites paths and never
//! consults visibility state.

use std::path::{Path, PathBuf};

/// Resolve a virtual path to its backing-store path.
///
/// `/` maps to the backing root itself, `/<name>` to `<root>/<name>`, and
/// `/<category>/<leaf>` to `<root>/<leaf>` with the category prefix
/// discarded. Only the first segment is treated as a category: deeper
/// paths keep the remainder intact, so `/a/b/c` maps to `<root>/b/c`.
pub fn resolve(root: &Path, vpath: &str) -> PathBuf {
    let trimmed = vpath.trim_start_matches('/');
    if trimmed.is_empty() {
        return root.to_path_buf();
    }
    match trimmed.split_once('/') {
        None => root.join(trimmed),
        Some((_category, rest)) => root.join(rest),
    }
}

/// True when the path names a direct child of the mount root: exactly one
/// separator and a non-empty leaf.
pub fn is_root_child(vpath: &str) -> bool {
    match vpath.strip_prefix('/') {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// Split a virtual path into its synthetic category prefix (if any) and
/// leaf name. `/` and root children have no category.
pub fn split(vpath: &str) -> (Option<&str>, &str) {
    let trimmed = vpath.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((category, rest)) => {
            let leaf = rest.rsplit('/').next().unwrap_or(rest);
            (Some(category), leaf)
        }
        None => (None, trimmed),
    }
}
