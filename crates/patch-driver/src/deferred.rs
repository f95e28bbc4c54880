//! Git-format patch sets can rename, copy and delete files in addition to
//! changing their content. Those operations are staged here and only
//! committed to the [`Sink`] once every patch in the set has parsed and
//! applied successfully, so a later failure doesn't leave the tree with a
//! file renamed away but no replacement written — the same atomicity the
//! reference implementation gives git-format commits.

use crate::sink::Sink;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum DeferredAction {
    Write { path: PathBuf, data: Vec<u8> },
    WriteSymlink { path: PathBuf, target: PathBuf },
    Rename { from: PathBuf, to: PathBuf },
    Remove { path: PathBuf },
    SetMode { path: PathBuf, mode: u32 },
}

#[derive(Debug, Default)]
pub struct DeferredWriter {
    actions: Vec<DeferredAction>,
}

impl DeferredWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: DeferredAction) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply every staged action, in the order it was queued.
    pub fn finalize(self, sink: &mut dyn Sink) -> std::io::Result<()> {
        for action in self.actions {
            match action {
                DeferredAction::Write { path, data } => sink.write(&path, &data)?,
                DeferredAction::WriteSymlink { path, target } => sink.write_symlink(&path, &target)?,
                DeferredAction::Rename { from, to } => sink.rename(&from, &to)?,
                DeferredAction::Remove { path } => sink.remove_file(&path)?,
                DeferredAction::SetMode { path, mode } => sink.set_mode(&path, mode)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::path::Path;

    #[test]
    fn actions_apply_in_queued_order() {
        let mut sink = MemorySink::new().with_file("a.txt", "content");
        let mut writer = DeferredWriter::new();
        writer.push(DeferredAction::Rename {
            from: PathBuf::from("a.txt"),
            to: PathBuf::from("b.txt"),
        });
        writer.push(DeferredAction::Write {
            path: PathBuf::from("b.txt"),
            data: b"updated".to_vec(),
        });
        writer.finalize(&mut sink).unwrap();
        assert_eq!(sink.file(Path::new("b.txt")), Some(&b"updated"[..]));
        assert!(!sink.exists(Path::new("a.txt")));
    }
}
