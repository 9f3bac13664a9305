//! FUSE filesystem implementation for MagicFolder.
//!
//! This crate composes a real backing directory with a synthetic
//! virtual-directory layer. Files written at the mount root are stored
//! flat in the backing store but vanish from the root listing until the
//! classifier returns a verdict, at which point they reappear under a
//! category directory that exists only in memory.
//!
//! # Virtual Directory Structure
//!
//! ```text
//! /mountpoint/
//! ├── report.txt            # freshly created: stored, hidden, queued
//! ├── Documents/            # synthetic: materialized from verdicts
//! │   └── invoice.pdf       # physically at <backing>/invoice.pdf
//! └── Images/
//!     └── photo.jpg         # physically at <backing>/photo.jpg
//! ```
//!
//! All physical files live flat at the top level of the backing store;
//! the category level is cosmetic and costs no I/O.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use magicfolder_classify::ClassifierClient;
//! use magicfolder_fuse::MagicFs;
//!
//! let classifier = ClassifierClient::new("/tmp/magic_brain.ipc");
//! let fs = MagicFs::new(backing_root, classifier, debounce);
//! fuser::mount2(fs, mountpoint, &options)?;
//! ```

pub mod backing;
pub mod filesystem;
pub mod inode;

pub use backing::BackingStore;
pub use filesystem::MagicFs;
pub use inode::{InodeKind, InodeTable};
