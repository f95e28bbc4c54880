//! Ties target selection, hunk application, backups and git-extended
//! operations together into the per-patch-set state machine `patch-cli`
//! drives: for every [`Patch`] in a parsed set, find its target, apply its
//! hunks, write back (or reject) the result, and only commit file renames,
//! copies and deletes once every patch in the set has gone through cleanly.

pub mod backup;
pub mod deferred;
pub mod options;
pub mod sink;
pub mod target;

pub use backup::Backup;
pub use deferred::{DeferredAction, DeferredWriter};
pub use options::{Options, PrerequisitePolicy, ReadOnlyHandling, RejectFormat};
pub use sink::{FileMeta, FsSink, MemorySink, Sink};

use patch_apply::{apply, apply_with, format::should_write_as_unified, ifdef, reverse_patch, write_reject_file_as, LineWriter};
use patch_line::{BufferLineSource, Line};
use patch_syntax::{Format, Operation, Patch};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Parse(#[from] patch_parser::ParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    PolicyAbort(String),
}

/// How one file-patch in the set was disposed of.
#[derive(Debug, Clone, Default)]
pub struct PatchOutcome {
    pub path: Option<PathBuf>,
    pub hunks_succeeded: usize,
    pub hunks_failed: usize,
    pub reversed: bool,
    pub skipped: Option<String>,
    pub messages: Vec<String>,
}

impl PatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_none() && self.hunks_failed == 0
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<PatchOutcome>,
}

impl RunSummary {
    pub fn all_clean(&self) -> bool {
        self.outcomes.iter().all(PatchOutcome::is_clean)
    }
}

/// Asks the caller for an interactive yes/no decision. `patch-cli` implements
/// this against a real terminal; anything non-interactive should use
/// [`NeverPrompt`], which always takes the given default.
pub trait Prompter {
    fn confirm(&mut self, question: &str, default_yes: bool) -> bool;
}

pub struct NeverPrompt;

impl Prompter for NeverPrompt {
    fn confirm(&mut self, _question: &str, default_yes: bool) -> bool {
        default_yes
    }
}

fn read_lines(sink: &dyn Sink, path: &Path) -> std::io::Result<Vec<Line>> {
    if !sink.exists(path) {
        return Ok(Vec::new());
    }
    let data = sink.read(path)?;
    Ok(BufferLineSource::new(data).into_lines())
}

fn is_symlink_mode(mode: u32) -> bool {
    mode & 0o170000 == 0o120000
}

pub struct Driver<'a> {
    options: Options,
    sink: &'a mut dyn Sink,
    backup: Backup,
    deferred: DeferredWriter,
}

impl<'a> Driver<'a> {
    pub fn new(options: Options, sink: &'a mut dyn Sink) -> Self {
        let backup = Backup::new(options.backup_prefix.clone(), options.backup_suffix.clone());
        Driver {
            options,
            sink,
            backup,
            deferred: DeferredWriter::new(),
        }
    }

    /// Apply every patch in `patches`, in order, then commit any deferred
    /// git-extended operations (renames, copies, deletes, mode changes).
    /// Deferred actions are skipped entirely under `--dry-run`.
    pub fn run(&mut self, patches: &[Patch], prompter: &mut dyn Prompter) -> Result<RunSummary, DriverError> {
        let mut summary = RunSummary::default();
        for patch in patches {
            summary.outcomes.push(self.run_one(patch, prompter)?);
        }
        if !self.options.dry_run {
            std::mem::take(&mut self.deferred).finalize(self.sink)?;
        }
        Ok(summary)
    }

    fn run_one(&mut self, patch: &Patch, prompter: &mut dyn Prompter) -> Result<PatchOutcome, DriverError> {
        let mut messages = Vec::new();

        if patch.format == Some(Format::Ed) {
            return Ok(PatchOutcome {
                skipped: Some("ignoring ed format patch (not supported)".to_string()),
                ..PatchOutcome::default()
            });
        }
        if patch.operation == Operation::Binary {
            return Ok(PatchOutcome {
                skipped: Some("ignoring binary patch (not supported)".to_string()),
                ..PatchOutcome::default()
            });
        }

        let Some((path, strip)) = target::guess_filepath(patch, self.options.strip, self.sink, self.options.strict_posix_guess) else {
            return Ok(PatchOutcome {
                skipped: Some("can't find file to patch".to_string()),
                ..PatchOutcome::default()
            });
        };

        if let Ok(meta) = self.sink.metadata(&path) {
            if meta.readonly {
                match self.options.read_only_handling {
                    ReadOnlyHandling::Fail => {
                        return Ok(PatchOutcome {
                            skipped: Some(format!("{} is read-only; refusing to patch", path_display(&path))),
                            path: Some(path),
                            ..PatchOutcome::default()
                        });
                    }
                    ReadOnlyHandling::Warn => {
                        messages.push(format!("{} is read-only; patching anyway", path_display(&path)));
                        self.sink.set_readonly(&path, false)?;
                    }
                    ReadOnlyHandling::Ignore => {
                        self.sink.set_readonly(&path, false)?;
                    }
                }
            }
        }

        if let Some(prereq) = &patch.prerequisite {
            let token = prereq.to_string();
            match self.options.prerequisite_policy {
                PrerequisitePolicy::Force => {
                    messages.push(format!("ignoring unverified prerequisite {token:?}"));
                }
                PrerequisitePolicy::Batch => {
                    return Ok(PatchOutcome {
                        path: Some(path),
                        skipped: Some(format!("unable to verify prerequisite {token:?}")),
                        ..PatchOutcome::default()
                    });
                }
                PrerequisitePolicy::Ask => {
                    let proceed = prompter.confirm(&format!("This file doesn't appear to be the {token} version -- proceed anyway?"), false);
                    if !proceed {
                        return Ok(PatchOutcome {
                            path: Some(path),
                            skipped: Some("skipped due to unverified prerequisite".to_string()),
                            ..PatchOutcome::default()
                        });
                    }
                }
            }
        }

        let original = read_lines(self.sink, &path)?;

        let (effective, reversed) = self.resolve_direction(patch, &original, prompter);
        if effective.is_none() {
            return Ok(PatchOutcome {
                path: Some(path),
                skipped: Some("skipped patch (reversed, and ignore-reversed is set)".to_string()),
                messages,
                ..PatchOutcome::default()
            });
        }
        let effective = effective.unwrap();

        // `path` is always where input content is read from (for a rename,
        // still the old location, since the file hasn't moved yet when its
        // hunks are located against it). `output_target` is where the
        // patched result is written -- the new-side path for a rename or
        // copy, `path` itself for every other operation, or the user's
        // `-o`/`--output` override regardless of operation.
        let output_target = match &self.options.output_file {
            Some(explicit) => explicit.clone(),
            None => match effective.operation {
                Operation::Rename | Operation::Copy => {
                    target::rename_target(&effective, strip, reversed).unwrap_or_else(|| path.clone())
                }
                _ => path.clone(),
            },
        };
        let already_renamed = output_target == path;

        if !effective.hunks.is_empty() {
            self.maybe_backup(&output_target)?;
        }

        let report = if let Some(macro_name) = self.options.define_macro.clone() {
            apply_with(&original, &effective, self.options.max_fuzz, self.options.ignore_whitespace, move |hunk| {
                ifdef::materialize(hunk, &macro_name)
            })
        } else {
            apply(&original, &effective, self.options.max_fuzz, self.options.ignore_whitespace)
        };

        for result in &report.results {
            let hunk_no = result.hunk_index + 1;
            if result.succeeded() {
                let mut line = format!("Hunk #{hunk_no} succeeded at {}", result.location.line_number);
                if result.location.fuzz > 0 {
                    line.push_str(&format!(" with fuzz {}", result.location.fuzz));
                }
                if result.location.offset != 0 {
                    line.push_str(&format!(" (offset {} line{})", result.location.offset, if result.location.offset.abs() == 1 { "" } else { "s" }));
                }
                line.push('.');
                messages.push(line);
            } else {
                messages.push(format!("Hunk #{hunk_no} FAILED at {}.", expected_line_for_hunk(&effective, result.hunk_index)));
            }
        }

        let hunks_succeeded = report.results.iter().filter(|r| r.succeeded()).count();
        let hunks_failed = report.results.len() - hunks_succeeded;

        if hunks_failed > 0 {
            let failed = report.failed_hunks(&effective);
            messages.push(format!(
                "{hunks_failed} out of {} hunks failed--saving rejects to file {}.rej",
                report.results.len(),
                path_display(&output_target)
            ));
            let as_unified = match self.options.reject_format {
                RejectFormat::Unified => true,
                RejectFormat::Context => false,
                RejectFormat::Default => should_write_as_unified(effective.format),
            };
            let reject_bytes = write_reject_file_as(&effective, &failed, as_unified);
            if !self.options.dry_run {
                let reject_path = reject_path_for(&output_target);
                self.sink.write(&reject_path, &reject_bytes)?;
            }
        }

        let mut writer = LineWriter::new(self.options.newline_output);
        writer.write_all(&report.lines);
        let patched = writer.finish();

        // A git-format `Delete` is an explicit instruction, honoured once its
        // hunks (if any) confirm the file's content still matches; a plain
        // `Change` patch that happens to remove every line only gets deleted
        // when the caller opted into `--remove-empty-files`. Either way, a
        // removal is only attempted once every hunk in this patch actually
        // applied -- a partial failure leaves the (partially patched)
        // content in place for the user to reconcile alongside the reject.
        let is_git_delete = effective.is_delete_file();
        let is_git_symlink = effective.format == Some(Format::Git) && effective.new_mode.map(is_symlink_mode).unwrap_or(false);
        let wants_removal = hunks_failed == 0 && (is_git_delete || (self.options.remove_empty_files && patched.is_empty()));
        if wants_removal {
            if !patched.is_empty() {
                messages.push(format!("not removing {} as content differs from patch", path_display(&output_target)));
                self.write_output(&output_target, &patched)?;
            } else if self.options.dry_run {
                messages.push(format!("would remove {}", path_display(&output_target)));
            } else if is_git_delete {
                self.deferred.push(DeferredAction::Remove { path: output_target.to_path_buf() });
                messages.push(format!("removed {}", path_display(&output_target)));
            } else {
                self.sink.remove_file(&output_target)?;
                self.sink.remove_empty_parents(&output_target);
                messages.push(format!("removed {}", path_display(&output_target)));
            }
        } else if is_git_symlink {
            // The patched content itself is the link target; a symlink
            // patch's write is never deferred since it needs the bytes
            // this run just computed, not whatever the sink holds.
            if !self.options.dry_run {
                let target = String::from_utf8_lossy(&patched).trim_end().to_string();
                self.sink.write_symlink(&output_target, Path::new(&target))?;
            }
        } else if effective.format == Some(Format::Git) {
            // A git-format patch set is an atomic unit: content lands on
            // disk only once every patch in the set has applied, so a
            // later failure in the same set doesn't leave half the files
            // renamed with the rest untouched.
            if !self.options.dry_run {
                self.deferred.push(DeferredAction::Write {
                    path: output_target.clone(),
                    data: patched,
                });
            }
        } else {
            self.write_output(&output_target, &patched)?;
        }

        if matches!(effective.operation, Operation::Rename) && !already_renamed && !self.options.dry_run && hunks_failed == 0 {
            self.sink.remove_file(&path)?;
            self.sink.remove_empty_parents(&path);
        }
        if matches!(effective.operation, Operation::Rename) {
            if already_renamed {
                messages.push(format!("(already renamed from {})", path_display(&path)));
            } else {
                messages.push(format!("(renamed from {})", path_display(&path)));
            }
        } else if effective.operation == Operation::Copy {
            messages.push(format!("(copied from {})", path_display(&path)));
        }

        self.apply_git_metadata(&effective, &output_target)?;

        Ok(PatchOutcome {
            path: Some(path),
            hunks_succeeded,
            hunks_failed,
            reversed,
            skipped: None,
            messages,
        })
    }

    /// Decide whether `patch` (or its reverse) is the one that actually
    /// matches `original`, mirroring the reference implementation's
    /// "reversed (or previously applied) patch" detection: only the first
    /// hunk is probed, and only when the caller hasn't already forced a
    /// direction with `-R`/`--force`.
    ///
    /// Returns `None` when the patch should be skipped outright (a reversed
    /// patch detected while `--ignore-reversed` is set).
    fn resolve_direction(&self, patch: &Patch, original: &[Line], prompter: &mut dyn Prompter) -> (Option<Patch>, bool) {
        if self.options.reverse_patch {
            return (Some(reverse_patch(patch)), true);
        }
        if self.options.force || patch.hunks.is_empty() {
            return (Some(patch.clone()), false);
        }

        let forward_found = patch
            .hunks
            .first()
            .map(|hunk| patch_locate::locate(original, hunk, self.options.max_fuzz, self.options.ignore_whitespace, 0).is_found())
            .unwrap_or(true);
        if forward_found {
            return (Some(patch.clone()), false);
        }

        let reversed = reverse_patch(patch);
        let reverse_found = reversed
            .hunks
            .first()
            .map(|hunk| patch_locate::locate(original, hunk, self.options.max_fuzz, self.options.ignore_whitespace, 0).is_found())
            .unwrap_or(false);

        if !reverse_found {
            return (Some(patch.clone()), false);
        }

        if self.options.ignore_reversed {
            return (None, false);
        }

        let accept = prompter.confirm("Reversed (or previously applied) patch detected!  Assume -R?", false);
        if accept {
            (Some(reversed), true)
        } else {
            (Some(patch.clone()), false)
        }
    }

    fn maybe_backup(&mut self, path: &Path) -> std::io::Result<()> {
        if self.options.dry_run {
            return Ok(());
        }
        let needs_backup = self.options.backup || (self.options.backup_if_mismatch && self.sink.exists(path));
        if needs_backup {
            self.backup.make_backup_for(self.sink, path)?;
        }
        Ok(())
    }

    fn write_output(&mut self, path: &Path, patched: &[u8]) -> std::io::Result<()> {
        if self.options.dry_run {
            return Ok(());
        }
        let target = self.options.output_file.clone().unwrap_or_else(|| path.to_path_buf());
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                self.sink.create_dir_all(parent)?;
            }
        }
        self.sink.write(&target, patched)
    }

    /// Queue a permission-bit change for `path` once the whole patch set has
    /// applied. Renames, copies and symlink materialisation are handled
    /// directly in `run_one`, where the just-computed patched bytes (and the
    /// input path they were read from) are still at hand; by the time this
    /// runs, only a plain mode bit to carry forward is left to do.
    fn apply_git_metadata(&mut self, patch: &Patch, path: &Path) -> std::io::Result<()> {
        if self.options.dry_run {
            return Ok(());
        }

        if let Some(mode) = patch.new_mode {
            if !is_symlink_mode(mode) {
                self.deferred.push(DeferredAction::SetMode {
                    path: path.to_path_buf(),
                    mode: mode & 0o7777,
                });
            }
        }

        Ok(())
    }
}

fn path_display(path: &Path) -> String {
    path.display().to_string()
}

fn reject_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".rej");
    PathBuf::from(name)
}

fn expected_line_for_hunk(patch: &Patch, hunk_index: usize) -> i64 {
    patch.hunks.get(hunk_index).map(|h| h.old_range.start_line).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patch_syntax::{Hunk, PatchLine, Range};

    fn line(s: &str) -> Line {
        Line::new(s, patch_line::NewLine::Lf)
    }

    fn change_patch(path: &str, old: &str, new: &str) -> Patch {
        Patch {
            format: Some(Format::Unified),
            old_path: Some(path.into()),
            new_path: Some(path.into()),
            hunks: vec![Hunk {
                old_range: Range::new(1, 1),
                new_range: Range::new(1, 1),
                lines: vec![PatchLine::new('-', line(old)), PatchLine::new('+', line(new))],
            }],
            ..Patch::default()
        }
    }

    #[test]
    fn applies_a_clean_change_in_place() {
        let mut sink = MemorySink::new().with_file("foo.txt", "old\n");
        let mut driver = Driver::new(Options::default(), &mut sink);
        let patch = change_patch("foo.txt", "old", "new");
        let summary = driver.run(&[patch], &mut NeverPrompt).unwrap();
        assert!(summary.all_clean());
        assert_eq!(sink.file(Path::new("foo.txt")), Some(&b"new\n"[..]));
    }

    #[test]
    fn backup_is_written_before_patching() {
        let mut sink = MemorySink::new().with_file("foo.txt", "old\n");
        let mut options = Options::default();
        options.backup = true;
        let mut driver = Driver::new(options, &mut sink);
        driver.run(&[change_patch("foo.txt", "old", "new")], &mut NeverPrompt).unwrap();
        assert_eq!(sink.file(Path::new("foo.txt.orig")), Some(&b"old\n"[..]));
    }

    #[test]
    fn failed_hunk_writes_a_reject_file() {
        let mut sink = MemorySink::new().with_file("foo.txt", "totally different\n");
        let mut driver = Driver::new(Options::default(), &mut sink);
        let summary = driver.run(&[change_patch("foo.txt", "old", "new")], &mut NeverPrompt).unwrap();
        assert!(!summary.all_clean());
        assert!(sink.file(Path::new("foo.txt.rej")).is_some());
    }

    #[test]
    fn missing_target_is_skipped_with_a_message() {
        let mut sink = MemorySink::new();
        let mut driver = Driver::new(Options::default(), &mut sink);
        let summary = driver.run(&[change_patch("missing.txt", "old", "new")], &mut NeverPrompt).unwrap();
        assert_eq!(summary.outcomes[0].skipped.as_deref(), Some("can't find file to patch"));
    }

    #[test]
    fn already_applied_patch_is_detected_and_skipped_under_ignore_reversed() {
        let mut sink = MemorySink::new().with_file("foo.txt", "new\n");
        let mut options = Options::default();
        options.ignore_reversed = true;
        let mut driver = Driver::new(options, &mut sink);
        let summary = driver.run(&[change_patch("foo.txt", "old", "new")], &mut NeverPrompt).unwrap();
        assert!(summary.outcomes[0].skipped.is_some());
        assert_eq!(sink.file(Path::new("foo.txt")), Some(&b"new\n"[..]));
    }

    #[test]
    fn dry_run_never_touches_the_sink() {
        let mut sink = MemorySink::new().with_file("foo.txt", "old\n");
        let mut options = Options::default();
        options.dry_run = true;
        let mut driver = Driver::new(options, &mut sink);
        driver.run(&[change_patch("foo.txt", "old", "new")], &mut NeverPrompt).unwrap();
        assert_eq!(sink.file(Path::new("foo.txt")), Some(&b"old\n"[..]));
    }

    #[test]
    fn ifdef_output_wraps_both_variants_instead_of_replacing() {
        let mut sink = MemorySink::new().with_file("foo.txt", "old\n");
        let mut options = Options::default();
        options.define_macro = Some("FEATURE".to_string());
        let mut driver = Driver::new(options, &mut sink);
        driver.run(&[change_patch("foo.txt", "old", "new")], &mut NeverPrompt).unwrap();
        let text = String::from_utf8(sink.file(Path::new("foo.txt")).unwrap().to_vec()).unwrap();
        assert!(text.contains("#ifndef FEATURE"));
        assert!(text.contains("old"));
        assert!(text.contains("#else"));
        assert!(text.contains("new"));
    }

    #[test]
    fn git_rename_with_a_hunk_moves_content_and_removes_the_old_path() {
        let mut sink = MemorySink::new().with_file("thing", "a\nb\nc\n");
        let mut driver = Driver::new(Options::default(), &mut sink);
        let patch = Patch {
            format: Some(Format::Git),
            operation: Operation::Rename,
            old_path: Some("thing".into()),
            new_path: Some("test".into()),
            hunks: vec![Hunk {
                old_range: Range::new(2, 1),
                new_range: Range::new(1, 0),
                lines: vec![PatchLine::new('-', line("b"))],
            }],
            ..Patch::default()
        };
        let summary = driver.run(&[patch], &mut NeverPrompt).unwrap();
        assert!(summary.all_clean());
        assert!(sink.file(Path::new("thing")).is_none());
        assert_eq!(sink.file(Path::new("test")), Some(&b"a\nc\n"[..]));
    }

    #[test]
    fn rename_with_no_hunks_leaves_target_content_unchanged() {
        let mut sink = MemorySink::new().with_file("thing", "a\nb\nc\n");
        let mut driver = Driver::new(Options::default(), &mut sink);
        let patch = Patch {
            format: Some(Format::Git),
            operation: Operation::Rename,
            old_path: Some("thing".into()),
            new_path: Some("test".into()),
            ..Patch::default()
        };
        let summary = driver.run(&[patch], &mut NeverPrompt).unwrap();
        assert!(summary.all_clean());
        assert!(sink.file(Path::new("thing")).is_none());
        assert_eq!(sink.file(Path::new("test")), Some(&b"a\nb\nc\n"[..]));
    }
}
