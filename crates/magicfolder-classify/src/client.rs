//! Request/reply client for the external classifier.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use magicfolder_core::error::ClassifyError;
use magicfolder_core::Verdict;

/// Default send/receive timeout. Classification can be slow (OCR and LLM
/// calls), so this is generous.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    files: &'a [PathBuf],
}

/// Client for the classifier's local request/reply socket.
///
/// Each batch opens a fresh connection: the request is written, the write
/// side is half-closed, and the reply is read to EOF. Both directions
/// carry a timeout so an absent or wedged classifier can never block the
/// worker past the deadline, including across shutdown.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    socket_path: PathBuf,
    send_timeout: Duration,
    recv_timeout: Duration,
}

impl ClassifierClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            send_timeout: RPC_TIMEOUT,
            recv_timeout: RPC_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, send: Duration, recv: Duration) -> Self {
        self.send_timeout = send;
        self.recv_timeout = recv;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// True when something is listening on the socket. Used for a startup
    /// log line; classification proceeds (and fails softly) either way.
    pub fn probe(&self) -> bool {
        UnixStream::connect(&self.socket_path).is_ok()
    }

    /// Classify a batch of backing-store paths.
    ///
    /// On any transport or parse failure the batch is abandoned: the
    /// error is logged once and an empty verdict set is returned, leaving
    /// the files hidden.
    pub fn classify(&self, paths: &[PathBuf]) -> Vec<Verdict> {
        if paths.is_empty() {
            return Vec::new();
        }
        match self.request(paths) {
            Ok(verdicts) => {
                debug!(
                    "classifier returned {} verdict(s) for {} file(s)",
                    verdicts.len(),
                    paths.len()
                );
                verdicts
            }
            Err(err) => {
                warn!(
                    "classification batch of {} file(s) abandoned: {err}",
                    paths.len()
                );
                Vec::new()
            }
        }
    }

    fn request(&self, paths: &[PathBuf]) -> Result<Vec<Verdict>, ClassifyError> {
        let mut stream =
            UnixStream::connect(&self.socket_path).map_err(|source| ClassifyError::Connect {
                path: self.socket_path.display().to_string(),
                source,
            })?;
        stream
            .set_write_timeout(Some(self.send_timeout))
            .map_err(ClassifyError::Send)?;
        stream
            .set_read_timeout(Some(self.recv_timeout))
            .map_err(ClassifyError::Recv)?;

        let request = serde_json::to_vec(&ClassifyRequest { files: paths })?;
        stream.write_all(&request).map_err(ClassifyError::Send)?;
        stream
            .shutdown(Shutdown::Write)
            .map_err(ClassifyError::Send)?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .map_err(ClassifyError::Recv)?;

        Ok(parse_verdicts(&response, paths)?)
    }
}

/// Extract `(path, category)` verdicts from a classifier reply.
///
/// The contract is deliberately lenient: any JSON object that carries a
/// string `"category"` field and names one of the batch paths in any
/// string field counts as the verdict for that path. Unknown fields are
/// ignored; paths with no matching object are omitted and stay hidden.
/// The first object naming a path wins.
pub fn parse_verdicts(
    response: &str,
    paths: &[PathBuf],
) -> Result<Vec<Verdict>, serde_json::Error> {
    let document: Value = serde_json::from_str(response)?;
    let mut remaining: Vec<PathBuf> = paths.to_vec();
    let mut verdicts = Vec::new();
    collect_verdicts(&document, &mut remaining, &mut verdicts);
    Ok(verdicts)
}

fn collect_verdicts(value: &Value, remaining: &mut Vec<PathBuf>, out: &mut Vec<Verdict>) {
    match value {
        Value::Object(fields) => {
            if let Some(category) = fields.get("category").and_then(Value::as_str) {
                let named: Vec<&str> = fields.values().filter_map(Value::as_str).collect();
                if let Some(pos) = remaining
                    .iter()
                    .position(|path| named.iter().any(|s| Path::new(s) == path))
                {
                    let path = remaining.swap_remove(pos);
                    out.push(Verdict {
                        path,
                        category: category.to_string(),
                    });
                }
            }
            for nested in fields.values() {
                collect_verdicts(nested, remaining, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_verdicts(item, remaining, out);
            }
        }
        _ => {}
    }
}
