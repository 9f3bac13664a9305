//! Inode management for the virtual namespace.

use std::collections::HashMap;

/// Inode of the mount root.
pub const ROOT_INO: u64 = 1;
/// First dynamically allocated inode.
pub const FIRST_DYNAMIC_INO: u64 = 1000;

/// What a virtual inode refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    /// Mount root.
    Root,
    /// Synthetic category directory.
    Category { name: String },
    /// A virtual path that resolves into the backing store.
    Entry { vpath: String },
}

/// Entry in the inode table.
#[derive(Debug, Clone)]
pub struct InodeEntry {
    /// Inode number
    pub ino: u64,
    /// Type of inode
    pub kind: InodeKind,
    /// Parent inode
    pub parent: u64,
    /// Lookup count (for FUSE reference counting)
    pub lookup_count: u64,
}

/// Table mapping virtual paths and category names to stable inodes.
pub struct InodeTable {
    inodes: HashMap<u64, InodeEntry>,
    vpath_to_ino: HashMap<String, u64>,
    category_to_ino: HashMap<String, u64>,
    next_ino: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut inodes = HashMap::new();
        inodes.insert(
            ROOT_INO,
            InodeEntry {
                ino: ROOT_INO,
                kind: InodeKind::Root,
                parent: ROOT_INO,
                lookup_count: 1,
            },
        );
        Self {
            inodes,
            vpath_to_ino: HashMap::new(),
            category_to_ino: HashMap::new(),
            next_ino: FIRST_DYNAMIC_INO,
        }
    }

    /// Get an inode entry.
    pub fn get(&self, ino: u64) -> Option<&InodeEntry> {
        self.inodes.get(&ino)
    }

    /// Get or create the inode for a virtual path.
    pub fn get_or_create_entry(&mut self, vpath: &str, parent: u64) -> u64 {
        if let Some(&ino) = self.vpath_to_ino.get(vpath) {
            return ino;
        }

        let ino = self.next_ino;
        self.next_ino += 1;

        self.inodes.insert(
            ino,
            InodeEntry {
                ino,
                kind: InodeKind::Entry {
                    vpath: vpath.to_string(),
                },
                parent,
                lookup_count: 0,
            },
        );
        self.vpath_to_ino.insert(vpath.to_string(), ino);

        ino
    }

    /// Get or create the inode for a synthetic category directory.
    pub fn get_or_create_category(&mut self, name: &str) -> u64 {
        if let Some(&ino) = self.category_to_ino.get(name) {
            return ino;
        }

        let ino = self.next_ino;
        self.next_ino += 1;

        self.inodes.insert(
            ino,
            InodeEntry {
                ino,
                kind: InodeKind::Category {
                    name: name.to_string(),
                },
                parent: ROOT_INO,
                lookup_count: 0,
            },
        );
        self.category_to_ino.insert(name.to_string(), ino);

        ino
    }

    /// Increment lookup count.
    pub fn lookup(&mut self, ino: u64) {
        if let Some(entry) = self.inodes.get_mut(&ino) {
            entry.lookup_count += 1;
        }
    }

    /// Decrement lookup count.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if let Some(entry) = self.inodes.get_mut(&ino) {
            entry.lookup_count = entry.lookup_count.saturating_sub(nlookup);
        }
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_inode_preinitialized() {
        let table = InodeTable::new();
        let root = table.get(ROOT_INO).expect("root should exist");
        assert_eq!(root.kind, InodeKind::Root);
        assert_eq!(root.parent, ROOT_INO);
        assert_eq!(root.lookup_count, 1);
    }

    #[test]
    fn test_get_nonexistent_inode() {
        let table = InodeTable::new();
        assert!(table.get(99999).is_none());
    }

    #[test]
    fn test_get_or_create_entry_new_path() {
        let mut table = InodeTable::new();
        let ino = table.get_or_create_entry("/invoice.pdf", ROOT_INO);

        assert!(ino >= FIRST_DYNAMIC_INO);
        let entry = table.get(ino).expect("entry should exist");
        assert_eq!(
            entry.kind,
            InodeKind::Entry {
                vpath: "/invoice.pdf".to_string()
            }
        );
        assert_eq!(entry.parent, ROOT_INO);
    }

    #[test]
    fn test_get_or_create_entry_returns_existing() {
        let mut table = InodeTable::new();
        let ino1 = table.get_or_create_entry("/a.txt", ROOT_INO);
        let ino2 = table.get_or_create_entry("/a.txt", ROOT_INO);
        assert_eq!(ino1, ino2);
    }

    #[test]
    fn test_category_and_entry_paths_are_distinct() {
        let mut table = InodeTable::new();
        let category_ino = table.get_or_create_category("Documents");
        let entry_ino = table.get_or_create_entry("/Documents/invoice.pdf", category_ino);

        assert_ne!(category_ino, entry_ino);
        assert_eq!(
            table.get(category_ino).unwrap().kind,
            InodeKind::Category {
                name: "Documents".to_string()
            }
        );
        assert_eq!(table.get(entry_ino).unwrap().parent, category_ino);
    }

    #[test]
    fn test_get_or_create_category_returns_existing() {
        let mut table = InodeTable::new();
        let ino1 = table.get_or_create_category("Documents");
        let ino2 = table.get_or_create_category("Documents");
        assert_eq!(ino1, ino2);
        assert_eq!(table.get(ino1).unwrap().parent, ROOT_INO);
    }

    #[test]
    fn test_inode_numbers_are_sequential() {
        let mut table = InodeTable::new();
        let ino1 = table.get_or_create_entry("/a.txt", ROOT_INO);
        let ino2 = table.get_or_create_category("Documents");
        let ino3 = table.get_or_create_entry("/b.txt", ROOT_INO);

        assert_eq!(ino2, ino1 + 1);
        assert_eq!(ino3, ino2 + 1);
    }

    #[test]
    fn test_lookup_increments_count() {
        let mut table = InodeTable::new();
        let ino = table.get_or_create_entry("/a.txt", ROOT_INO);

        table.lookup(ino);
        table.lookup(ino);
        assert_eq!(table.get(ino).unwrap().lookup_count, 2);
    }

    #[test]
    fn test_forget_saturates_at_zero() {
        let mut table = InodeTable::new();
        let ino = table.get_or_create_entry("/a.txt", ROOT_INO);
        table.lookup(ino);

        table.forget(ino, 100);
        assert_eq!(table.get(ino).unwrap().lookup_count, 0);
    }

    #[test]
    fn test_forget_nonexistent_does_nothing() {
        let mut table = InodeTable::new();
        table.forget(99999, 5); // must not panic
    }
}
