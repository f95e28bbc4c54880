//! Backup-file naming and creation, deduplicated across a whole run so a
//! file touched by more than one patch in the same patch set is only
//! backed up once.

use crate::sink::Sink;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct Backup {
    prefix: Option<String>,
    suffix: Option<String>,
    already_backed_up: HashSet<PathBuf>,
}

impl Backup {
    pub fn new(prefix: Option<String>, suffix: Option<String>) -> Self {
        Backup {
            prefix,
            suffix,
            already_backed_up: HashSet::new(),
        }
    }

    /// The backup path for `path`: `prefix + path + suffix` when either is
    /// set, otherwise `path.orig`.
    pub fn backup_name(&self, path: &Path) -> PathBuf {
        match (&self.prefix, &self.suffix) {
            (None, None) => {
                let mut name = path.as_os_str().to_os_string();
                name.push(".orig");
                PathBuf::from(name)
            }
            (prefix, suffix) => {
                let dir = path.parent();
                let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                let mut name = String::new();
                if let Some(p) = prefix {
                    name.push_str(p);
                }
                name.push_str(&file_name);
                if let Some(s) = suffix {
                    name.push_str(s);
                }
                match dir {
                    Some(d) if !d.as_os_str().is_empty() => d.join(name),
                    _ => PathBuf::from(name),
                }
            }
        }
    }

    /// Back up `path` if this is the first time it has been seen this run.
    /// A target that doesn't exist yet still gets an (empty) backup file,
    /// so that reversing the patch later can tell the file didn't exist
    /// before.
    pub fn make_backup_for(&mut self, sink: &mut dyn Sink, path: &Path) -> std::io::Result<()> {
        if !self.already_backed_up.insert(path.to_path_buf()) {
            return Ok(());
        }
        let backup_path = self.backup_name(path);
        if sink.exists(path) {
            let data = sink.read(path)?;
            sink.write(&backup_path, &data)
        } else {
            sink.write(&backup_path, &[])
        }
    }
}
