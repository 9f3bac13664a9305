//! # MagicFolder CLI
//!
//! Mounts a self-organizing FUSE filesystem. Files written to the mount
//! point are stored in a flat backing directory and vanish from the root
//! listing until an external classifier returns a verdict; they then
//! reappear under a synthetic category directory.
//!
//! ## Usage
//!
//! ```bash
//! # Mount (backing store defaults to ~/.magicFolder/raw)
//! magicfolder ~/Magic
//!
//! # Pass FUSE options through, with debug logging
//! magicfolder ~/Magic -o allow_other -v
//!
//! # Unmount
//! fusermount -u ~/Magic
//! ```
//!
//! The classifier is expected on `/tmp/magic_brain.ipc`; it is optional
//! at mount time, and new files simply stay hidden until it answers.

use anyhow::Context;
use clap::Parser;
use fuser::MountOption;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use magicfolder_classify::ClassifierClient;
use magicfolder_fuse::MagicFs;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "magicfolder")]
#[command(about = "A self-organizing FUSE filesystem")]
#[command(version)]
struct Cli {
    /// Where to mount the filesystem
    mountpoint: PathBuf,

    /// Extra FUSE mount options (comma separated, passed through)
    #[arg(short = 'o', long = "options", value_delimiter = ',')]
    options: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Argument and startup failures all exit with code 1; after that the
    // exit code reflects the FUSE session result.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Error: failed to set tracing subscriber");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to resolve configuration")?;

    std::fs::create_dir_all(&config.backing_root).with_context(|| {
        format!(
            "failed to create backing store at {}",
            config.backing_root.display()
        )
    })?;
    info!("backing store: {}", config.backing_root.display());
    info!("mount point: {}", cli.mountpoint.display());

    let classifier = ClassifierClient::new(&config.socket_path)
        .with_timeouts(config.rpc_timeout, config.rpc_timeout);
    let fs = MagicFs::new(config.backing_root.clone(), classifier, config.debounce);

    let mut options = vec![
        MountOption::FSName("magicfolder".to_string()),
        MountOption::AutoUnmount,
        MountOption::DefaultPermissions,
    ];
    options.extend(cli.options.iter().map(|opt| parse_mount_option(opt)));

    fuser::mount2(fs, &cli.mountpoint, &options).context("FUSE session failed")?;
    Ok(())
}

fn parse_mount_option(opt: &str) -> MountOption {
    match opt {
        "allow_other" => MountOption::AllowOther,
        "allow_root" => MountOption::AllowRoot,
        "ro" => MountOption::RO,
        "rw" => MountOption::RW,
        "exec" => MountOption::Exec,
        "noexec" => MountOption::NoExec,
        "suid" => MountOption::Suid,
        "nosuid" => MountOption::NoSuid,
        "dev" => MountOption::Dev,
        "nodev" => MountOption::NoDev,
        "sync" => MountOption::Sync,
        "async" => MountOption::Async,
        "atime" => MountOption::Atime,
        "noatime" => MountOption::NoAtime,
        "dirsync" => MountOption::DirSync,
        other => MountOption::CUSTOM(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_mount_options() {
        assert_eq!(parse_mount_option("allow_other"), MountOption::AllowOther);
        assert_eq!(parse_mount_option("ro"), MountOption::RO);
        assert_eq!(parse_mount_option("noatime"), MountOption::NoAtime);
    }

    #[test]
    fn test_parse_unknown_mount_option_is_custom() {
        assert_eq!(
            parse_mount_option("max_read=4096"),
            MountOption::CUSTOM("max_read=4096".to_string())
        );
    }

    #[test]
    fn test_cli_requires_mountpoint() {
        assert!(Cli::try_parse_from(["magicfolder"]).is_err());
    }

    #[test]
    fn test_cli_parses_options_list() {
        let cli = Cli::try_parse_from(["magicfolder", "/mnt/magic", "-o", "allow_other,ro"])
            .expect("should parse");
        assert_eq!(cli.mountpoint, PathBuf::from("/mnt/magic"));
        assert_eq!(cli.options, vec!["allow_other", "ro"]);
        assert!(!cli.verbose);
    }
}
