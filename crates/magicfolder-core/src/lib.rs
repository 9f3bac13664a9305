//! # magicfolder-core
//!
//! Core types and state for the MagicFolder self-organizing filesystem.
//!
//! This crate holds everything that is independent of the FUSE transport
//! and of the classifier wire protocol:
//!
//! - **Path routing**: [`router`] maps the virtual namespace (`/`,
//!   `/<Category>`, `/<Category>/<file>`, `/<file>`) onto the flat backing
//!   store where every physical file lives.
//! - **Visibility state**: [`VisibilityState`] is the in-memory authority
//!   over which backing files are hidden from the root listing and which
//!   category each classified file belongs to.
//! - **Ignore rules**: [`ignore`] names the metadata files the filesystem
//!   passes through untouched.
//! - **Errors**: [`Error`] and [`ClassifyError`] shared across the crates.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Visibility`] | Per-filename state: visible, hidden, or classified |
//! | [`Verdict`] | A `(path, category)` pair returned by the classifier |
//! | [`VisibilityState`] | Mutex-guarded maps driving the root listing |
//! | [`RootSnapshot`] | Copied-out view used by a single readdir pass |
//!
//! ## Related Crates
//!
//! - `magicfolder-classify`: classification queue, worker, and RPC client
//! - `magicfolder-fuse`: the `fuser::Filesystem` implementation
//! - `magicfolder`: CLI binary and mount bootstrap

pub mod error;
pub mod ignore;
pub mod router;
pub mod state;
pub mod types;

pub use error::{ClassifyError, Error, Result};
pub use state::{RootSnapshot, VisibilityState};
pub use types::{Verdict, Visibility};
