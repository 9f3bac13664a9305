//! Configuration resolution for the MagicFolder mount.

use std::path::PathBuf;
use std::time::Duration;

use magicfolder_core::error::{Error, Result};

/// Default classifier socket endpoint.
pub const DEFAULT_SOCKET: &str = "/tmp/magic_brain.ipc";
/// Backing store location under the home directory.
pub const BACKING_SUBDIR: &str = ".magicFolder/raw";

#[derive(Debug, Clone)]
pub struct Config {
    /// Flat directory holding every physical file.
    pub backing_root: PathBuf,
    /// Classifier request/reply socket.
    pub socket_path: PathBuf,
    /// Debounce window before each classification batch.
    pub debounce: Duration,
    /// Send/receive timeout for classifier calls.
    pub rpc_timeout: Duration,
}

impl Config {
    /// Resolve configuration from the environment.
    ///
    /// `MAGICFOLDER_BACKING_DIR`, `MAGICFOLDER_SOCKET`, and
    /// `MAGICFOLDER_DEBOUNCE_MS` override the defaults; otherwise the
    /// backing root derives from `$HOME`.
    pub fn from_env() -> Result<Self> {
        let backing_root = match std::env::var_os("MAGICFOLDER_BACKING_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var_os("HOME").ok_or_else(|| {
                    Error::Config("HOME environment variable not set".to_string())
                })?;
                backing_root_under(PathBuf::from(home))
            }
        };

        let socket_path = std::env::var_os("MAGICFOLDER_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET));

        let debounce = match std::env::var("MAGICFOLDER_DEBOUNCE_MS") {
            Ok(raw) => Duration::from_millis(parse_millis(&raw)?),
            Err(_) => magicfolder_classify::DEBOUNCE_WINDOW,
        };

        Ok(Self {
            backing_root,
            socket_path,
            debounce,
            rpc_timeout: magicfolder_classify::RPC_TIMEOUT,
        })
    }
}

/// `<home>/.magicFolder/raw`.
fn backing_root_under(home: PathBuf) -> PathBuf {
    home.join(BACKING_SUBDIR)
}

fn parse_millis(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::Config(format!("invalid MAGICFOLDER_DEBOUNCE_MS: {raw}")))
}
