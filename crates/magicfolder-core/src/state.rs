//! In-memory authority over which backing files are hidden and which
//! category each classified file belongs to.
//!
//! All maps live behind one mutex. Readers copy out the minimal result
//! under the lock so filesystem handlers never hold it across syscalls.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::ignore::is_ignored;
use crate::types::Visibility;

/// View of the root listing, copied out under one lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct RootSnapshot {
    /// Category names in listing order.
    pub categories: Vec<String>,
    /// Filenames suppressed from the root listing (hidden or classified).
    pub suppressed: HashSet<String>,
}

#[derive(Debug, Default)]
struct StateInner {
    /// Filenames suppressed from the root listing, awaiting a verdict.
    hidden: HashSet<String>,
    /// Category name -> member filenames. Ordered so a readdir pass sees
    /// a stable listing. Empty categories are removed eagerly.
    categories: BTreeMap<String, Vec<String>>,
    /// Filename -> category, for quick lookups.
    file_category: HashMap<String, String>,
}

/// Visibility state, serialized by a single mutex.
#[derive(Debug, Default)]
pub struct VisibilityState {
    inner: Mutex<StateInner>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress a filename from the root listing. Idempotent. Ignored
    /// names and names that already have a category are rejected so a
    /// filename is never in two states at once.
    pub fn mark_hidden(&self, name: &str) -> bool {
        if is_ignored(name) {
            return false;
        }
        let mut inner = self.lock();
        if inner.file_category.contains_key(name) {
            return false;
        }
        inner.hidden.insert(name.to_string())
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.lock().hidden.contains(name)
    }

    /// Apply a classification verdict: Hidden -> Classified(category).
    ///
    /// The first verdict for a filename wins; later verdicts are ignored
    /// so listings do not thrash on reclassification.
    pub fn assign_category(&self, name: &str, category: &str) -> bool {
        if is_ignored(name) {
            return false;
        }
        let mut inner = self.lock();
        if inner.file_category.contains_key(name) {
            return false;
        }
        inner.hidden.remove(name);
        inner
            .categories
            .entry(category.to_string())
            .or_default()
            .push(name.to_string());
        inner
            .file_category
            .insert(name.to_string(), category.to_string());
        info!("classified '{name}' as '{category}'");
        true
    }

    /// Drop every record of a filename. Used by unlink.
    pub fn forget(&self, name: &str) {
        let mut inner = self.lock();
        inner.hidden.remove(name);
        if let Some(category) = inner.file_category.remove(name) {
            remove_member(&mut inner.categories, &category, name);
        }
    }

    /// Rewrite the key for a renamed file across the hidden set, the
    /// category members, and the file-to-category map, atomically under
    /// the state mutex. Any previous record under the new name is dropped
    /// first (last writer wins).
    pub fn rename_entry(&self, old: &str, new: &str) {
        if old == new {
            return;
        }
        let mut inner = self.lock();

        inner.hidden.remove(new);
        if let Some(category) = inner.file_category.remove(new) {
            remove_member(&mut inner.categories, &category, new);
        }

        if inner.hidden.remove(old) && !is_ignored(new) {
            inner.hidden.insert(new.to_string());
        }
        if let Some(category) = inner.file_category.remove(old) {
            remove_member(&mut inner.categories, &category, old);
            if !is_ignored(new) {
                inner
                    .categories
                    .entry(category.clone())
                    .or_default()
                    .push(new.to_string());
                inner.file_category.insert(new.to_string(), category);
            }
        }
    }

    /// Category names with at least one member, in listing order.
    pub fn list_categories(&self) -> Vec<String> {
        self.lock().categories.keys().cloned().collect()
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.lock().categories.contains_key(name)
    }

    /// Filenames assigned to a category, in assignment order.
    pub fn list_category(&self, category: &str) -> Vec<String> {
        self.lock()
            .categories
            .get(category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn category_of(&self, name: &str) -> Option<String> {
        self.lock().file_category.get(name).cloned()
    }

    pub fn visibility_of(&self, name: &str) -> Visibility {
        let inner = self.lock();
        if let Some(category) = inner.file_category.get(name) {
            Visibility::Classified(category.clone())
        } else if inner.hidden.contains(name) {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    /// Copy out everything a root readdir pass needs in one lock
    /// acquisition.
    pub fn root_snapshot(&self) -> RootSnapshot {
        let inner = self.lock();
        let mut suppressed = inner.hidden.clone();
        suppressed.extend(inner.file_category.keys().cloned());
        RootSnapshot {
            categories: inner.categories.keys().cloned().collect(),
            suppressed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove_member(categories: &mut BTreeMap<String, Vec<String>>, category: &str, name: &str) {
    if let Some(members) = categories.get_mut(category) {
        members.retain(|member| member != name);
        if members.is_empty() {
            categories.remove(category);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_hidden_and_is_hidden() {
        let state = VisibilityState::new();
        assert!(!state.is_hidden("a.txt"));
        assert!(state.mark_hidden("a.txt"));
        assert!(state.is_hidden("a.txt"));
    }

    #[test]
    fn test_mark_hidden_idempotent() {
        let state = VisibilityState::new();
        assert!(state.mark_hidden("a.txt"));
        assert!(!state.mark_hidden("a.txt"));
        assert!(state.is_hidden("a.txt"));
    }

    #[test]
    fn test_mark_hidden_rejects_ignored() {
        let state = VisibilityState::new();
        assert!(!state.mark_hidden(".DS_Store"));
        assert!(!state.mark_hidden("._resource"));
        assert!(!state.is_hidden(".DS_Store"));
    }

    #[test]
    fn test_mark_hidden_rejects_classified() {
        let state = VisibilityState::new();
        state.mark_hidden("a.txt");
        state.assign_category("a.txt", "Documents");
        assert!(!state.mark_hidden("a.txt"));
        assert!(!state.is_hidden("a.txt"));
        assert_eq!(state.category_of("a.txt"), Some("Documents".to_string()));
    }

    #[test]
    fn test_assign_category_moves_out_of_hidden() {
        let state = VisibilityState::new();
        state.mark_hidden("invoice.pdf");
        assert!(state.assign_category("invoice.pdf", "Documents"));

        assert!(!state.is_hidden("invoice.pdf"));
        assert_eq!(
            state.visibility_of("invoice.pdf"),
            Visibility::Classified("Documents".to_string())
        );
        assert_eq!(state.list_categories(), vec!["Documents".to_string()]);
        assert_eq!(
            state.list_category("Documents"),
            vec!["invoice.pdf".to_string()]
        );
    }

    #[test]
    fn test_assign_category_first_verdict_wins() {
        let state = VisibilityState::new();
        state.mark_hidden("a.txt");
        assert!(state.assign_category("a.txt", "Documents"));
        assert!(!state.assign_category("a.txt", "Images"));

        assert_eq!(state.category_of("a.txt"), Some("Documents".to_string()));
        assert_eq!(state.list_categories(), vec!["Documents".to_string()]);
        assert!(state.list_category("Images").is_empty());
    }

    #[test]
    fn test_assign_category_rejects_ignored() {
        let state = VisibilityState::new();
        assert!(!state.assign_category(".DS_Store", "Junk"));
        assert!(state.list_categories().is_empty());
    }

    #[test]
    fn test_assign_category_works_for_visible_files() {
        // Bootstrap files can be classified without ever being hidden.
        let state = VisibilityState::new();
        assert!(state.assign_category("old.txt", "Archive"));
        assert_eq!(
            state.visibility_of("old.txt"),
            Visibility::Classified("Archive".to_string())
        );
    }

    #[test]
    fn test_forget_hidden_file() {
        let state = VisibilityState::new();
        state.mark_hidden("tmp");
        state.forget("tmp");
        assert!(!state.is_hidden("tmp"));
        assert_eq!(state.visibility_of("tmp"), Visibility::Visible);
    }

    #[test]
    fn test_forget_classified_file_removes_empty_category() {
        let state = VisibilityState::new();
        state.assign_category("a.txt", "Documents");
        state.forget("a.txt");

        assert_eq!(state.category_of("a.txt"), None);
        assert!(state.list_categories().is_empty());
        assert!(!state.has_category("Documents"));
    }

    #[test]
    fn test_forget_keeps_category_with_other_members() {
        let state = VisibilityState::new();
        state.assign_category("a.txt", "Documents");
        state.assign_category("b.txt", "Documents");
        state.forget("a.txt");

        assert_eq!(state.list_category("Documents"), vec!["b.txt".to_string()]);
        assert!(state.has_category("Documents"));
    }

    #[test]
    fn test_rename_hidden_file() {
        let state = VisibilityState::new();
        state.mark_hidden("old.txt");
        state.rename_entry("old.txt", "new.txt");

        assert!(!state.is_hidden("old.txt"));
        assert!(state.is_hidden("new.txt"));
    }

    #[test]
    fn test_rename_classified_file() {
        let state = VisibilityState::new();
        state.assign_category("old.txt", "Documents");
        state.rename_entry("old.txt", "new.txt");

        assert_eq!(state.category_of("old.txt"), None);
        assert_eq!(state.category_of("new.txt"), Some("Documents".to_string()));
        assert_eq!(
            state.list_category("Documents"),
            vec!["new.txt".to_string()]
        );
    }

    #[test]
    fn test_rename_onto_existing_record_last_writer_wins() {
        let state = VisibilityState::new();
        state.assign_category("target.txt", "Images");
        state.mark_hidden("source.txt");
        state.rename_entry("source.txt", "target.txt");

        assert!(state.is_hidden("target.txt"));
        assert_eq!(state.category_of("target.txt"), None);
        assert!(!state.has_category("Images"));
    }

    #[test]
    fn test_rename_to_ignored_name_drops_record() {
        let state = VisibilityState::new();
        state.assign_category("a.txt", "Documents");
        state.rename_entry("a.txt", "._a.txt");

        assert_eq!(state.category_of("._a.txt"), None);
        assert!(!state.is_hidden("._a.txt"));
        assert!(state.list_categories().is_empty());
    }

    #[test]
    fn test_rename_same_name_is_noop() {
        let state = VisibilityState::new();
        state.mark_hidden("a.txt");
        state.rename_entry("a.txt", "a.txt");
        assert!(state.is_hidden("a.txt"));
    }

    #[test]
    fn test_list_categories_sorted_and_stable() {
        let state = VisibilityState::new();
        state.assign_category("z.txt", "Zeta");
        state.assign_category("a.txt", "Alpha");
        state.assign_category("m.txt", "Middle");

        assert_eq!(
            state.list_categories(),
            vec![
                "Alpha".to_string(),
                "Middle".to_string(),
                "Zeta".to_string()
            ]
        );
    }

    #[test]
    fn test_root_snapshot_suppresses_hidden_and_classified() {
        let state = VisibilityState::new();
        state.mark_hidden("pending.txt");
        state.assign_category("done.txt", "Documents");

        let snapshot = state.root_snapshot();
        assert!(snapshot.suppressed.contains("pending.txt"));
        assert!(snapshot.suppressed.contains("done.txt"));
        assert!(!snapshot.suppressed.contains("other.txt"));
        assert_eq!(snapshot.categories, vec!["Documents".to_string()]);
    }

    #[test]
    fn test_snapshot_never_lists_file_both_ways() {
        // A name in a category is always suppressed from the root view.
        let state = VisibilityState::new();
        state.mark_hidden("a.txt");
        state.assign_category("a.txt", "Documents");

        let snapshot = state.root_snapshot();
        for category in &snapshot.categories {
            for member in state.list_category(category) {
                assert!(snapshot.suppressed.contains(&member));
            }
        }
    }

    #[test]
    fn test_visibility_of_unknown_name() {
        let state = VisibilityState::new();
        assert_eq!(state.visibility_of("nobody"), Visibility::Visible);
    }
}
