//! Asynchronous batched classification pipeline for MagicFolder.
//!
//! Filenames released at the mount root are pushed into an unbounded FIFO
//! ([`ClassifyQueue`]) with duplicate suppression. A single background
//! worker ([`worker::spawn`]) waits for work, debounces so a burst of
//! files coalesces into one batch, and sends the batch to the external
//! classifier over a local request/reply socket ([`ClassifierClient`]).
//! Verdicts flow back into the shared
//! [`VisibilityState`](magicfolder_core::VisibilityState).
//!
//! Failure is always soft: if the classifier is absent, slow, or returns
//! garbage, the batch is abandoned and the files simply stay hidden until
//! a later release re-enqueues them.

pub mod client;
pub mod queue;
pub mod worker;

pub use client::{ClassifierClient, RPC_TIMEOUT};
pub use queue::ClassifyQueue;
pub use worker::DEBOUNCE_WINDOW;
