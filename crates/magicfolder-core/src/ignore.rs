//! Filenames the filesystem passes through untouched.

/// Returns true for macOS metadata names (`.DS_Store`, `._*`) that must
/// never be hidden, enqueued, or classified.
pub fn is_ignored(name: &str) -> bool {
    name == ".DS_Store" || name.starts_with("._")
}
