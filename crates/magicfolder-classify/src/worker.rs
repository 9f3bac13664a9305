//! Background worker that drains the classification queue.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use magicfolder_core::VisibilityState;

use crate::client::ClassifierClient;
use crate::queue::ClassifyQueue;

/// Debounce window between the first queued file and the batch RPC. Lets
/// a multi-file copy coalesce into one request and gives writers time to
/// finish flushing before the classifier reads the bytes.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Spawn the single background worker thread.
///
/// The worker exits once [`ClassifyQueue::shutdown`] has been called and
/// the queue is drained; any in-flight RPC is bounded by the client's
/// timeouts, so joining the handle is bounded too.
pub fn spawn(
    queue: Arc<ClassifyQueue>,
    state: Arc<VisibilityState>,
    client: ClassifierClient,
    backing_root: PathBuf,
    debounce: Duration,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("magicfolder-classify".to_string())
        .spawn(move || run(&queue, &state, &client, &backing_root, debounce))
}

fn run(
    queue: &ClassifyQueue,
    state: &VisibilityState,
    client: &ClassifierClient,
    backing_root: &std::path::Path,
    debounce: Duration,
) {
    info!(
        "classification worker started (socket: {})",
        client.socket_path().display()
    );

    while let Some(batch) = queue.next_batch(debounce) {
        let paths: Vec<PathBuf> = batch.iter().map(|name| backing_root.join(name)).collect();
        debug!("sending batch of {} file(s) to classifier", paths.len());

        let verdicts = client.classify(&paths);
        for verdict in &verdicts {
            // The file may have been unlinked while the batch was out; a
            // verdict for a vanished file must not resurrect it.
            if !verdict.path.exists() {
                debug!("dropping verdict for removed file {:?}", verdict.path);
                continue;
            }
            match verdict.path.file_name().and_then(|name| name.to_str()) {
                Some(name) => {
                    state.assign_category(name, &verdict.category);
                }
                None => warn!("verdict names unusable path {:?}", verdict.path),
            }
        }

        if verdicts.len() < batch.len() {
            debug!(
                "{} of {} file(s) received no verdict and stay hidden",
                batch.len() - verdicts.len(),
                batch.len()
            );
        }

        queue.finish_batch(&batch);
    }

    info!("classification worker stopped");
}
