//! The driver's only window onto the outside world. Every filesystem
//! mutation goes through this trait, so the core can be exercised by tests
//! with an in-memory double instead of a real filesystem, and so
//! `--dry-run` can be implemented by simply not calling the mutating
//! methods.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// File permission bits and kind, enough for patch(1)'s mode handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub mode: u32,
    pub is_symlink: bool,
    pub readonly: bool,
}

pub trait Sink {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn metadata(&self, path: &Path) -> io::Result<FileMeta>;
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()>;
    fn write_symlink(&mut self, path: &Path, target: &Path) -> io::Result<()>;
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&mut self, path: &Path) -> io::Result<()>;
    fn set_mode(&mut self, path: &Path, mode: u32) -> io::Result<()>;
    fn set_readonly(&mut self, path: &Path, readonly: bool) -> io::Result<()>;
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Remove `path`'s parent directories while they remain empty, walking
    /// upward one level at a time.
    fn remove_empty_parents(&mut self, path: &Path) {
        let mut current = path.parent().map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            if !self.dir_is_empty(&dir) {
                break;
            }
            if self.remove_dir(&dir).is_err() {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
    }

    fn dir_is_empty(&self, path: &Path) -> bool;
    fn remove_dir(&mut self, path: &Path) -> io::Result<()>;
}

/// Real filesystem [`Sink`].
pub struct FsSink;

impl Sink for FsSink {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        let meta = std::fs::symlink_metadata(path)?;
        let is_symlink = meta.file_type().is_symlink();
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o7777
        };
        #[cfg(not(unix))]
        let mode = if meta.permissions().readonly() { 0o444 } else { 0o644 };
        Ok(FileMeta {
            mode,
            is_symlink,
            readonly: meta.permissions().readonly(),
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        std::fs::write(path, data)
    }

    fn write_symlink(&mut self, path: &Path, target: &Path) -> io::Result<()> {
        if path.exists() || std::fs::symlink_metadata(path).is_ok() {
            let _ = std::fs::remove_file(path);
        }
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, path)
        }
        #[cfg(not(unix))]
        {
            std::fs::write(path, target.to_string_lossy().as_bytes())
        }
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn set_mode(&mut self, path: &Path, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
            Ok(())
        }
    }

    fn set_readonly(&mut self, path: &Path, readonly: bool) -> io::Result<()> {
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(readonly);
        std::fs::set_permissions(path, perms)
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn dir_is_empty(&self, path: &Path) -> bool {
        std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }

    fn remove_dir(&mut self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}

/// In-memory [`Sink`] used by driver tests so they don't need a real
/// filesystem.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<PathBuf, Vec<u8>>,
    symlinks: BTreeMap<PathBuf, PathBuf>,
    modes: BTreeMap<PathBuf, u32>,
    readonly: BTreeMap<PathBuf, bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), data.into());
        self
    }

    pub fn file(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }
}

impl Sink for MemorySink {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.symlinks.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        if !self.exists(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()));
        }
        Ok(FileMeta {
            mode: *self.modes.get(path).unwrap_or(&0o644),
            is_symlink: self.symlinks.contains_key(path),
            readonly: *self.readonly.get(path).unwrap_or(&false),
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.symlinks
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn write_symlink(&mut self, path: &Path, target: &Path) -> io::Result<()> {
        self.symlinks.insert(path.to_path_buf(), target.to_path_buf());
        Ok(())
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(data) = self.files.remove(from) {
            self.files.insert(to.to_path_buf(), data);
        }
        if let Some(mode) = self.modes.remove(from) {
            self.modes.insert(to.to_path_buf(), mode);
        }
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        self.files.remove(path);
        self.symlinks.remove(path);
        Ok(())
    }

    fn set_mode(&mut self, path: &Path, mode: u32) -> io::Result<()> {
        self.modes.insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn set_readonly(&mut self, path: &Path, readonly: bool) -> io::Result<()> {
        self.readonly.insert(path.to_path_buf(), readonly);
        Ok(())
    }

    fn create_dir_all(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn dir_is_empty(&self, _path: &Path) -> bool {
        true
    }

    fn remove_dir(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
