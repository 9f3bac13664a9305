//! Thin delegation to the host filesystem rooted at the backing directory.
//!
//! Every operation fails with the host error code; the handler layer
//! propagates it unchanged as the negative FUSE return.

use std::ffi::CString;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::sys::statvfs::{statvfs, Statvfs};
use nix::unistd::AccessFlags;

/// Façade over the flat real directory holding every physical file.
#[derive(Debug, Clone)]
pub struct BackingStore {
    root: PathBuf,
}

impl BackingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// lstat, so symlinks in the backing store are reported as such.
    pub fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::symlink_metadata(path)
    }

    pub fn open(&self, path: &Path, flags: i32) -> io::Result<File> {
        open_options(flags).open(path)
    }

    pub fn create(&self, path: &Path, flags: i32, mode: u32) -> io::Result<File> {
        let mut options = open_options(flags);
        options.create(true).mode(mode);
        options.open(path)
    }

    pub fn read_dir(&self, path: &Path) -> io::Result<fs::ReadDir> {
        fs::read_dir(path)
    }

    pub fn unlink(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    pub fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::DirBuilder::new().mode(mode).create(path)
    }

    pub fn rmdir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    pub fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    pub fn truncate(&self, path: &Path, size: u64) -> io::Result<()> {
        OpenOptions::new().write(true).open(path)?.set_len(size)
    }

    pub fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    pub fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        std::os::unix::fs::chown(path, uid, gid)
    }

    /// utimensat with `AT_SYMLINK_NOFOLLOW`; timestamps may carry
    /// `UTIME_NOW` / `UTIME_OMIT` markers.
    pub fn set_times(
        &self,
        path: &Path,
        atime: libc::timespec,
        mtime: libc::timespec,
    ) -> io::Result<()> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::from_raw_os_error(libc::EINVAL))?;
        let times = [atime, mtime];
        // SAFETY: c_path is a valid NUL-terminated string and times points
        // at two initialized timespec values.
        let rc = unsafe {
            libc::utimensat(
                libc::AT_FDCWD,
                c_path.as_ptr(),
                times.as_ptr(),
                libc::AT_SYMLINK_NOFOLLOW,
            )
        };
        if rc == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    pub fn access(&self, path: &Path, mask: i32) -> io::Result<()> {
        nix::unistd::access(path, AccessFlags::from_bits_truncate(mask))
            .map_err(|errno| io::Error::from_raw_os_error(errno as i32))
    }

    pub fn statfs(&self) -> io::Result<Statvfs> {
        statvfs(&self.root).map_err(|errno| io::Error::from_raw_os_error(errno as i32))
    }
}

/// Translate kernel open flags into `OpenOptions`.
fn open_options(flags: i32) -> OpenOptions {
    let mut options = OpenOptions::new();
    match flags & libc::O_ACCMODE {
        libc::O_WRONLY => {
            options.write(true);
        }
        libc::O_RDWR => {
            options.read(true).write(true);
        }
        _ => {
            options.read(true);
        }
    }
    if flags & libc::O_APPEND != 0 {
        options.append(true);
    }
    if flags & libc::O_TRUNC != 0 {
        options.truncate(true);
    }
    if flags & libc::O_EXCL != 0 {
        options.create_new(true);
    }
    options.custom_flags(
        flags & !(libc::O_ACCMODE | libc::O_APPEND | libc::O_TRUNC | libc::O_EXCL | libc::O_CREAT),
    );
    options
}
