//! FUSE filesystem implementation.

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, Request,
    TimeOrNow,
};
use libc::{EINVAL, EIO, ENOENT};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{File, Metadata};
use std::io;
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use magicfolder_classify::{worker, ClassifierClient, ClassifyQueue};
use magicfolder_core::ignore::is_ignored;
use magicfolder_core::router;
use magicfolder_core::VisibilityState;

use crate::backing::BackingStore;
use crate::inode::{InodeKind, InodeTable, ROOT_INO};

/// Zero TTL keeps the kernel from caching attributes and entries, so a
/// file reappearing under its category is visible immediately.
const TTL: Duration = Duration::ZERO;
const BLOCK_SIZE: u64 = 512;

/// An open backing file plus the virtual path it was opened through.
struct OpenHandle {
    file: File,
    vpath: String,
}

/// MagicFolder FUSE filesystem.
pub struct MagicFs {
    /// Flat directory holding every physical file
    backing: BackingStore,
    /// Which filenames are hidden or classified
    state: Arc<VisibilityState>,
    /// Filenames awaiting classification
    queue: Arc<ClassifyQueue>,
    /// Client for the classifier socket
    classifier: ClassifierClient,
    /// Debounce window handed to the worker
    debounce: Duration,
    /// Virtual path / category -> inode
    inodes: InodeTable,
    /// Open file handles
    handles: HashMap<u64, OpenHandle>,
    next_fh: u64,
    /// Background classification worker, spawned in init
    worker: Option<JoinHandle<()>>,
}

impl MagicFs {
    pub fn new(
        backing_root: impl Into<PathBuf>,
        classifier: ClassifierClient,
        debounce: Duration,
    ) -> Self {
        let state = Arc::new(VisibilityState::new());
        let queue = Arc::new(ClassifyQueue::new(Arc::clone(&state)));
        Self {
            backing: BackingStore::new(backing_root),
            state,
            queue,
            classifier,
            debounce,
            inodes: InodeTable::new(),
            handles: HashMap::new(),
            next_fh: 1,
            worker: None,
        }
    }

    pub fn state(&self) -> &Arc<VisibilityState> {
        &self.state
    }

    /// Virtual path of a directory entry, given its parent inode.
    fn vpath_of_child(&self, parent: u64, name: &str) -> Option<String> {
        match &self.inodes.get(parent)?.kind {
            InodeKind::Root => Some(format!("/{name}")),
            InodeKind::Category { name: category } => Some(format!("/{category}/{name}")),
            InodeKind::Entry { vpath } => Some(format!("{vpath}/{name}")),
        }
    }

    /// Backing-store path an inode's operations delegate to. Synthetic
    /// categories resolve like flat names, so real syscalls against them
    /// fail with the host's ENOENT.
    fn backing_target(&self, kind: &InodeKind) -> PathBuf {
        match kind {
            InodeKind::Root => self.backing.root().to_path_buf(),
            InodeKind::Category { name } => self.backing.root().join(name),
            InodeKind::Entry { vpath } => router::resolve(self.backing.root(), vpath),
        }
    }

    fn stash_handle(&mut self, file: File, vpath: String) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        self.handles.insert(fh, OpenHandle { file, vpath });
        fh
    }
}

impl Filesystem for MagicFs {
    fn init(
        &mut self,
        _req: &Request<'_>,
        _config: &mut KernelConfig,
    ) -> Result<(), libc::c_int> {
        info!("mounting over backing store {:?}", self.backing.root());
        if self.classifier.probe() {
            info!(
                "connected to classifier at {}",
                self.classifier.socket_path().display()
            );
        } else {
            warn!(
                "no classifier listening at {}; new files stay hidden until one appears",
                self.classifier.socket_path().display()
            );
        }

        match worker::spawn(
            Arc::clone(&self.queue),
            Arc::clone(&self.state),
            self.classifier.clone(),
            self.backing.root().to_path_buf(),
            self.debounce,
        ) {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                error!("failed to spawn classification worker: {err}");
                Err(EIO)
            }
        }
    }

    fn destroy(&mut self) {
        debug!("unmounting; stopping classification worker");
        self.queue.shutdown();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("classification worker panicked");
            }
        }
    }

    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str() else {
            reply.error(ENOENT);
            return;
        };
        debug!("lookup: parent={parent}, name={name}");

        // Categories shadow real entries at the root.
        if parent == ROOT_INO && self.state.has_category(name) {
            let ino = self.inodes.get_or_create_category(name);
            self.inodes.lookup(ino);
            reply.entry(&TTL, &category_attr(ino, req.uid(), req.gid()), 0);
            return;
        }

        let Some(vpath) = self.vpath_of_child(parent, name) else {
            reply.error(ENOENT);
            return;
        };
        let real = router::resolve(self.backing.root(), &vpath);
        match self.backing.metadata(&real) {
            Ok(metadata) => {
                let ino = self.inodes.get_or_create_entry(&vpath, parent);
                self.inodes.lookup(ino);
                reply.entry(&TTL, &attr_from_metadata(ino, &metadata), 0);
            }
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        self.inodes.forget(ino, nlookup);
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        debug!("getattr: ino={ino}");
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };

        if let InodeKind::Category { .. } = entry.kind {
            reply.attr(&TTL, &category_attr(ino, req.uid(), req.gid()));
            return;
        }

        let path = self.backing_target(&entry.kind);
        match self.backing.metadata(&path) {
            Ok(metadata) => reply.attr(&TTL, &attr_from_metadata(ino, &metadata)),
            Err(err) => reply.error(errno(&err)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!("setattr: ino={ino}, size={size:?}, mode={mode:?}");
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };
        let kind = entry.kind.clone();
        let path = self.backing_target(&kind);

        if let Some(size) = size {
            let result = match fh.and_then(|fh| self.handles.get(&fh)) {
                Some(handle) => handle.file.set_len(size),
                None => self.backing.truncate(&path, size),
            };
            if let Err(err) = result {
                reply.error(errno(&err));
                return;
            }
        }

        if let Some(mode) = mode {
            if let Err(err) = self.backing.chmod(&path, mode) {
                reply.error(errno(&err));
                return;
            }
        }

        if uid.is_some() || gid.is_some() {
            if let Err(err) = self.backing.chown(&path, uid, gid) {
                reply.error(errno(&err));
                return;
            }
        }

        if atime.is_some() || mtime.is_some() {
            if let Err(err) =
                self.backing
                    .set_times(&path, timespec_from(atime), timespec_from(mtime))
            {
                reply.error(errno(&err));
                return;
            }
        }

        match self.backing.metadata(&path) {
            Ok(metadata) => reply.attr(&TTL, &attr_from_metadata(ino, &metadata)),
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };

        // Synthetic directories are always accessible.
        if let InodeKind::Category { .. } = entry.kind {
            reply.ok();
            return;
        }

        let path = self.backing_target(&entry.kind);
        match self.backing.access(&path, mask) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };

        match &entry.kind {
            InodeKind::Root | InodeKind::Category { .. } => reply.opened(0, 0),
            InodeKind::Entry { vpath } => {
                let path = router::resolve(self.backing.root(), vpath);
                match self.backing.read_dir(&path) {
                    Ok(_) => reply.opened(0, 0),
                    Err(err) => reply.error(errno(&err)),
                }
            }
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir: ino={ino}, offset={offset}");
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };
        let kind = entry.kind.clone();
        let parent_ino = entry.parent;

        let mut entries: Vec<(u64, FileType, String)> = Vec::new();

        match kind {
            InodeKind::Root => {
                entries.push((ROOT_INO, FileType::Directory, ".".to_string()));
                entries.push((ROOT_INO, FileType::Directory, "..".to_string()));

                let snapshot = self.state.root_snapshot();
                for category in &snapshot.categories {
                    let category_ino = self.inodes.get_or_create_category(category);
                    entries.push((category_ino, FileType::Directory, category.clone()));
                }

                let read_dir = match self.backing.read_dir(self.backing.root()) {
                    Ok(read_dir) => read_dir,
                    Err(err) => {
                        reply.error(errno(&err));
                        return;
                    }
                };
                for dir_entry in read_dir.flatten() {
                    let name = dir_entry.file_name().to_string_lossy().to_string();
                    // The vanish trick: hidden and classified files are
                    // suppressed from the root listing.
                    if snapshot.suppressed.contains(&name) {
                        continue;
                    }
                    let kind = dir_entry
                        .file_type()
                        .map(dirent_kind)
                        .unwrap_or(FileType::RegularFile);
                    let entry_ino = self.inodes.get_or_create_entry(&format!("/{name}"), ROOT_INO);
                    entries.push((entry_ino, kind, name));
                }
            }
            InodeKind::Category { name } => {
                entries.push((ino, FileType::Directory, ".".to_string()));
                entries.push((ROOT_INO, FileType::Directory, "..".to_string()));

                for member in self.state.list_category(&name) {
                    let vpath = format!("/{name}/{member}");
                    let real = router::resolve(self.backing.root(), &vpath);
                    // Tolerate stale entries whose backing file is gone.
                    let Ok(metadata) = self.backing.metadata(&real) else {
                        continue;
                    };
                    let entry_ino = self.inodes.get_or_create_entry(&vpath, ino);
                    entries.push((entry_ino, file_kind(&metadata), member));
                }
            }
            InodeKind::Entry { vpath } => {
                // Degenerate case: a real directory inside the backing
                // store, enumerated as-is.
                entries.push((ino, FileType::Directory, ".".to_string()));
                entries.push((parent_ino, FileType::Directory, "..".to_string()));

                let path = router::resolve(self.backing.root(), &vpath);
                let read_dir = match self.backing.read_dir(&path) {
                    Ok(read_dir) => read_dir,
                    Err(err) => {
                        reply.error(errno(&err));
                        return;
                    }
                };
                for dir_entry in read_dir.flatten() {
                    let name = dir_entry.file_name().to_string_lossy().to_string();
                    let kind = dir_entry
                        .file_type()
                        .map(dirent_kind)
                        .unwrap_or(FileType::RegularFile);
                    let entry_ino = self
                        .inodes
                        .get_or_create_entry(&format!("{vpath}/{name}"), ino);
                    entries.push((entry_ino, kind, name));
                }
            }
        }

        for (i, (entry_ino, kind, name)) in entries.iter().enumerate().skip(offset as usize) {
            if reply.add(*entry_ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open: ino={ino}, flags={flags:#x}");
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };
        let kind = entry.kind.clone();
        let vpath = match &kind {
            InodeKind::Entry { vpath } => vpath.clone(),
            InodeKind::Root => "/".to_string(),
            InodeKind::Category { name } => format!("/{name}"),
        };

        let path = self.backing_target(&kind);
        match self.backing.open(&path, flags) {
            Ok(file) => {
                let fh = self.stash_handle(file, vpath);
                reply.opened(fh, 0);
            }
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        let Some(name) = name.to_str() else {
            reply.error(EINVAL);
            return;
        };
        debug!("create: parent={parent}, name={name}");

        let Some(vpath) = self.vpath_of_child(parent, name) else {
            reply.error(ENOENT);
            return;
        };
        let real = router::resolve(self.backing.root(), &vpath);

        let file = match self.backing.create(&real, flags, mode & !umask) {
            Ok(file) => file,
            Err(err) => {
                reply.error(errno(&err));
                return;
            }
        };
        let metadata = match self.backing.metadata(&real) {
            Ok(metadata) => metadata,
            Err(err) => {
                reply.error(errno(&err));
                return;
            }
        };

        // The vanish trick: a new root file is suppressed from listings
        // immediately, before any verdict exists.
        if router::is_root_child(&vpath) && !is_ignored(name) {
            self.state.mark_hidden(name);
        }

        let ino = self.inodes.get_or_create_entry(&vpath, parent);
        self.inodes.lookup(ino);
        let attr = attr_from_metadata(ino, &metadata);
        let fh = self.stash_handle(file, vpath);
        reply.created(&TTL, &attr, 0, fh, 0);
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read: ino={ino}, fh={fh}, offset={offset}, size={size}");
        if let Some(handle) = self.handles.get(&fh) {
            match read_chunk(&handle.file, offset as u64, size as usize) {
                Ok(buffer) => reply.data(&buffer),
                Err(err) => reply.error(errno(&err)),
            }
            return;
        }

        // No stashed handle: transient open, scoped to this call.
        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };
        let path = self.backing_target(&entry.kind);
        match self
            .backing
            .open(&path, libc::O_RDONLY)
            .and_then(|file| read_chunk(&file, offset as u64, size as usize))
        {
            Ok(buffer) => reply.data(&buffer),
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!("write: ino={ino}, fh={fh}, offset={offset}, len={}", data.len());
        if let Some(handle) = self.handles.get(&fh) {
            match handle.file.write_all_at(data, offset as u64) {
                Ok(()) => reply.written(data.len() as u32),
                Err(err) => reply.error(errno(&err)),
            }
            return;
        }

        let Some(entry) = self.inodes.get(ino) else {
            reply.error(ENOENT);
            return;
        };
        let path = self.backing_target(&entry.kind);
        match self
            .backing
            .open(&path, libc::O_WRONLY)
            .and_then(|file| file.write_all_at(data, offset as u64))
        {
            Ok(()) => reply.written(data.len() as u32),
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn flush(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _lock_owner: u64,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        if let Some(handle) = self.handles.remove(&fh) {
            drop(handle.file);

            // Classification is triggered on close, not on create, so the
            // classifier sees final bytes.
            let (_, leaf) = router::split(&handle.vpath);
            if router::is_root_child(&handle.vpath) && !is_ignored(leaf) {
                self.state.mark_hidden(leaf);
                if self.queue.enqueue(leaf) {
                    debug!("release: queued '{leaf}' for classification");
                }
            }
        }
        reply.ok();
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(name) = name.to_str() else {
            reply.error(ENOENT);
            return;
        };
        debug!("unlink: parent={parent}, name={name}");

        let Some(vpath) = self.vpath_of_child(parent, name) else {
            reply.error(ENOENT);
            return;
        };
        let real = router::resolve(self.backing.root(), &vpath);
        match self.backing.unlink(&real) {
            Ok(()) => {
                let (_, leaf) = router::split(&vpath);
                self.state.forget(leaf);
                reply.ok();
            }
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(name) = name.to_str() else {
            reply.error(EINVAL);
            return;
        };
        debug!("mkdir: parent={parent}, name={name}");

        let Some(vpath) = self.vpath_of_child(parent, name) else {
            reply.error(ENOENT);
            return;
        };
        let real = router::resolve(self.backing.root(), &vpath);
        if let Err(err) = self.backing.mkdir(&real, mode & !umask) {
            reply.error(errno(&err));
            return;
        }
        match self.backing.metadata(&real) {
            Ok(metadata) => {
                let ino = self.inodes.get_or_create_entry(&vpath, parent);
                self.inodes.lookup(ino);
                reply.entry(&TTL, &attr_from_metadata(ino, &metadata), 0);
            }
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(name) = name.to_str() else {
            reply.error(ENOENT);
            return;
        };
        debug!("rmdir: parent={parent}, name={name}");

        let Some(vpath) = self.vpath_of_child(parent, name) else {
            reply.error(ENOENT);
            return;
        };
        let real = router::resolve(self.backing.root(), &vpath);
        match self.backing.rmdir(&real) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        if flags != 0 {
            reply.error(EINVAL);
            return;
        }
        let (Some(name), Some(newname)) = (name.to_str(), newname.to_str()) else {
            reply.error(EINVAL);
            return;
        };
        debug!("rename: {name} -> {newname}");

        let (Some(old_vpath), Some(new_vpath)) = (
            self.vpath_of_child(parent, name),
            self.vpath_of_child(newparent, newname),
        ) else {
            reply.error(ENOENT);
            return;
        };
        let from = router::resolve(self.backing.root(), &old_vpath);
        let to = router::resolve(self.backing.root(), &new_vpath);

        match self.backing.rename(&from, &to) {
            Ok(()) => {
                let (_, old_leaf) = router::split(&old_vpath);
                let (_, new_leaf) = router::split(&new_vpath);
                self.state.rename_entry(old_leaf, new_leaf);
                reply.ok();
            }
            Err(err) => reply.error(errno(&err)),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        match self.backing.statfs() {
            Ok(stat) => reply.statfs(
                stat.blocks() as u64,
                stat.blocks_free() as u64,
                stat.blocks_available() as u64,
                stat.files() as u64,
                stat.files_free() as u64,
                stat.block_size() as u32,
                stat.name_max() as u32,
                stat.fragment_size() as u32,
            ),
            Err(err) => reply.error(errno(&err)),
        }
    }
}

/// Map an io error to the negative FUSE errno.
fn errno(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(EIO)
}

fn dirent_kind(file_type: std::fs::FileType) -> FileType {
    if file_type.is_dir() {
        FileType::Directory
    } else if file_type.is_symlink() {
        FileType::Symlink
    } else {
        FileType::RegularFile
    }
}

fn file_kind(metadata: &Metadata) -> FileType {
    match metadata.mode() & libc::S_IFMT {
        libc::S_IFDIR => FileType::Directory,
        libc::S_IFLNK => FileType::Symlink,
        libc::S_IFIFO => FileType::NamedPipe,
        libc::S_IFCHR => FileType::CharDevice,
        libc::S_IFBLK => FileType::BlockDevice,
        libc::S_IFSOCK => FileType::Socket,
        _ => FileType::RegularFile,
    }
}

/// Attributes of a real backing file.
fn attr_from_metadata(ino: u64, metadata: &Metadata) -> FileAttr {
    let atime = metadata.accessed().unwrap_or(UNIX_EPOCH);
    let mtime = metadata.modified().unwrap_or(UNIX_EPOCH);
    let ctime = UNIX_EPOCH + Duration::from_secs(metadata.ctime().max(0) as u64);

    FileAttr {
        ino,
        size: metadata.len(),
        blocks: (metadata.len() + BLOCK_SIZE - 1) / BLOCK_SIZE,
        atime,
        mtime,
        ctime,
        crtime: ctime,
        kind: file_kind(metadata),
        perm: (metadata.mode() & 0o7777) as u16,
        nlink: metadata.nlink() as u32,
        uid: metadata.uid(),
        gid: metadata.gid(),
        rdev: metadata.rdev() as u32,
        blksize: BLOCK_SIZE as u32,
        flags: 0,
    }
}

/// Synthetic attributes for a category directory: it exists only in
/// memory, owned by the caller, timestamped now.
fn category_attr(ino: u64, uid: u32, gid: u32) -> FileAttr {
    let now = SystemTime::now();
    FileAttr {
        ino,
        size: 4096,
        blocks: 8,
        atime: now,
        mtime: now,
        ctime: now,
        crtime: now,
        kind: FileType::Directory,
        perm: 0o755,
        nlink: 2,
        uid,
        gid,
        rdev: 0,
        blksize: BLOCK_SIZE as u32,
        flags: 0,
    }
}

/// Positional read that tolerates short reads from the host.
fn read_chunk(file: &File, offset: u64, size: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        match file.read_at(&mut buffer[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    buffer.truncate(filled);
    Ok(buffer)
}

fn timespec_from(time: Option<TimeOrNow>) -> libc::timespec {
    match time {
        None => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_OMIT,
        },
        Some(TimeOrNow::Now) => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_NOW,
        },
        Some(TimeOrNow::SpecificTime(stamp)) => {
            let since_epoch = stamp.duration_since(UNIX_EPOCH).unwrap_or_default();
            libc::timespec {
                tv_sec: since_epoch.as_secs() as libc::time_t,
                tv_nsec: i64::from(since_epoch.subsec_nanos()) as libc::c_long,
            }
        }
    }
}
