//! Applies a parsed [`Patch`] to a target file's lines, using
//! `patch-locate` to find each hunk and reporting enough detail for the
//! driver to print progress, write rejects, and track the line-number
//! drift later hunks in the same file need to account for.

pub mod format;
pub mod ifdef;
pub mod reverse;

use patch_line::{Line, NewLine};
use patch_locate::{locate, old_view, Location};
use patch_syntax::{Hunk, Patch};

pub use reverse::{reverse_hunk, reverse_patch};

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("corrupt patch: {0}")]
    Corrupt(String),
}

/// Controls what terminator gets written for every output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlinePolicy {
    /// Use the platform's native line ending (`\n` on Unix, `\r\n` on
    /// Windows).
    #[default]
    Native,
    Lf,
    CrLf,
    /// Reproduce each line's own terminator unchanged.
    Keep,
}

impl NewlinePolicy {
    pub fn apply(self, line: &Line) -> Line {
        let newline = match self {
            NewlinePolicy::Keep => line.newline,
            NewlinePolicy::Lf => {
                if line.newline == NewLine::None {
                    NewLine::None
                } else {
                    NewLine::Lf
                }
            }
            NewlinePolicy::CrLf => {
                if line.newline == NewLine::None {
                    NewLine::None
                } else {
                    NewLine::CrLf
                }
            }
            NewlinePolicy::Native => {
                if line.newline == NewLine::None {
                    NewLine::None
                } else if cfg!(windows) {
                    NewLine::CrLf
                } else {
                    NewLine::Lf
                }
            }
        };
        Line::new(line.content.clone(), newline)
    }
}

/// Writes lines to a byte buffer applying a [`NewlinePolicy`] uniformly.
pub struct LineWriter {
    policy: NewlinePolicy,
    out: Vec<u8>,
}

impl LineWriter {
    pub fn new(policy: NewlinePolicy) -> Self {
        LineWriter {
            policy,
            out: Vec::new(),
        }
    }

    pub fn write_line(&mut self, line: &Line) {
        let line = self.policy.apply(line);
        self.out.extend_from_slice(&line.content);
        self.out.extend_from_slice(line.newline.as_bytes());
    }

    pub fn write_all(&mut self, lines: &[Line]) {
        for line in lines {
            self.write_line(line);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Outcome of trying to apply one hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkResult {
    pub hunk_index: usize,
    pub location: Location,
    /// Net line-count change (`new - old`) accumulated from every earlier
    /// hunk in this file that applied successfully. A failed hunk's range
    /// is reported to the reject writer shifted by this much, so its
    /// header reflects the file's position as already patched rather than
    /// its original numbering.
    pub new_file_offset: i64,
}

impl HunkResult {
    pub fn succeeded(&self) -> bool {
        self.location.is_found()
    }
}

/// Result of applying a whole patch to one file's content.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub lines: Vec<Line>,
    pub results: Vec<HunkResult>,
}

impl ApplyReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(HunkResult::succeeded)
    }

    /// The hunks that failed to locate, with their ranges shifted to
    /// reflect the file's position as already patched by earlier hunks
    /// (see [`HunkResult::new_file_offset`]).
    pub fn failed_hunks(&self, patch: &Patch) -> Vec<Hunk> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| {
                let mut hunk = patch.hunks[r.hunk_index].clone();
                hunk.old_range.start_line += r.new_file_offset;
                hunk.new_range.start_line += r.new_file_offset;
                hunk
            })
            .collect()
    }
}

fn new_view(hunk: &Hunk) -> Vec<Line> {
    hunk.lines
        .iter()
        .filter(|pl| pl.operation != '-')
        .map(|pl| pl.line.clone())
        .collect()
}

/// Apply every hunk of `patch` against `original_lines` in order.
///
/// Each hunk is located independently via `patch-locate`, seeded by the
/// line-number drift accumulated from hunks that matched earlier in the
/// same file (`patch_locate`'s `offset_hint`). A hunk that can't be located
/// at any fuzz level up to `max_fuzz` leaves its region of the file
/// untouched and is reported as failed; it does not change the offset hint
/// used by subsequent hunks, matching the reference implementation's
/// separate bookkeeping for "next search hint" versus "net lines changed
/// so far".
pub fn apply(original_lines: &[Line], patch: &Patch, max_fuzz: i64, ignore_whitespace: bool) -> ApplyReport {
    apply_with(original_lines, patch, max_fuzz, ignore_whitespace, new_view)
}

/// Like [`apply`], but the replacement content for each located hunk comes
/// from `content_for_hunk` instead of always being the hunk's new-side view.
/// `patch-driver` uses this for `-D MACRO` output, where a located hunk's
/// region is replaced by an `#ifdef`-wrapped block containing both sides
/// rather than just the new one.
pub fn apply_with(
    original_lines: &[Line],
    patch: &Patch,
    max_fuzz: i64,
    ignore_whitespace: bool,
    content_for_hunk: impl Fn(&Hunk) -> Vec<Line>,
) -> ApplyReport {
    let mut output = Vec::new();
    let mut cursor = 0usize;
    let mut offset_hint = 0i64;
    let mut offset_old_to_new = 0i64;
    let mut results = Vec::new();

    for (index, hunk) in patch.hunks.iter().enumerate() {
        let location = locate(original_lines, hunk, max_fuzz, ignore_whitespace, offset_hint);

        if !location.is_found() {
            results.push(HunkResult {
                hunk_index: index,
                location,
                new_file_offset: offset_old_to_new,
            });
            continue;
        }

        let start = (location.line_number - 1).max(0) as usize;
        let old_len = old_view(hunk).len();
        let safe_start = start.min(original_lines.len());
        let safe_end = (start + old_len).min(original_lines.len());

        output.extend_from_slice(&original_lines[cursor.min(safe_start)..safe_start]);
        output.extend(content_for_hunk(hunk));
        cursor = safe_end;
        offset_hint = location.offset;
        offset_old_to_new += hunk.new_range.number_of_lines - hunk.old_range.number_of_lines;

        results.push(HunkResult {
            hunk_index: index,
            location,
            new_file_offset: offset_old_to_new,
        });
    }

    output.extend_from_slice(&original_lines[cursor.min(original_lines.len())..]);

    ApplyReport {
        lines: output,
        results,
    }
}

/// Write the hunks that failed to apply back out as a `.rej` file, in the
/// same format family (unified or context) the input patch used.
pub fn write_reject_file(patch: &Patch, failed_hunks: &[Hunk]) -> Vec<u8> {
    write_reject_file_as(patch, failed_hunks, format::should_write_as_unified(patch.format))
}

/// Like [`write_reject_file`], but the format family is chosen by the
/// caller (`patch-driver`'s `--reject-format` override) instead of derived
/// from the source patch.
pub fn write_reject_file_as(patch: &Patch, failed_hunks: &[Hunk], as_unified: bool) -> Vec<u8> {
    let mut out = Vec::new();
    if as_unified {
        out.extend(format::format_patch_header_unified(patch));
        for hunk in failed_hunks {
            out.extend(format::format_hunk_unified(hunk));
        }
    } else {
        out.extend(format::format_patch_header_context(patch));
        for hunk in failed_hunks {
            if let Ok(body) = format::format_hunk_context(hunk) {
                out.extend(body);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use patch_syntax::{PatchLine, Range};

    fn line(s: &str) -> Line {
        Line::new(s, NewLine::Lf)
    }

    fn lines(strs: &[&str]) -> Vec<Line> {
        strs.iter().map(|s| line(s)).collect()
    }

    #[test]
    fn applies_single_hunk_cleanly() {
        let original = lines(&["a", "b", "c"]);
        let patch = Patch {
            hunks: vec![Hunk {
                old_range: Range::new(2, 1),
                new_range: Range::new(2, 1),
                lines: vec![PatchLine::new('-', line("b")), PatchLine::new('+', line("B"))],
            }],
            ..Patch::default()
        };
        let report = apply(&original, &patch, 0, false);
        assert!(report.all_succeeded());
        assert_eq!(report.lines, lines(&["a", "B", "c"]));
    }

    #[test]
    fn failed_hunk_leaves_region_untouched() {
        let original = lines(&["a", "X", "c"]);
        let patch = Patch {
            hunks: vec![Hunk {
                old_range: Range::new(2, 1),
                new_range: Range::new(2, 1),
                lines: vec![PatchLine::new('-', line("b")), PatchLine::new('+', line("B"))],
            }],
            ..Patch::default()
        };
        let report = apply(&original, &patch, 0, false);
        assert!(!report.all_succeeded());
        assert_eq!(report.lines, original);
    }

    #[test]
    fn later_hunk_uses_offset_from_earlier_success() {
        let original = lines(&["x", "a", "b", "c", "d"]);
        let patch = Patch {
            hunks: vec![
                Hunk {
                    old_range: Range::new(1, 1),
                    new_range: Range::new(1, 1),
                    lines: vec![PatchLine::new('-', line("a")), PatchLine::new('+', line("A"))],
                },
                Hunk {
                    old_range: Range::new(3, 1),
                    new_range: Range::new(3, 1),
                    lines: vec![PatchLine::new('-', line("c")), PatchLine::new('+', line("C"))],
                },
            ],
            ..Patch::default()
        };
        let report = apply(&original, &patch, 0, false);
        assert!(report.all_succeeded());
        assert_eq!(report.lines, lines(&["x", "A", "b", "C", "d"]));
    }

    #[test]
    fn reject_file_contains_only_failed_hunks_in_unified_form() {
        let original = lines(&["a", "X", "c"]);
        let patch = Patch {
            old_path: Some("foo.txt".into()),
            new_path: Some("foo.txt".into()),
            hunks: vec![Hunk {
                old_range: Range::new(2, 1),
                new_range: Range::new(2, 1),
                lines: vec![PatchLine::new('-', line("b")), PatchLine::new('+', line("B"))],
            }],
            ..Patch::default()
        };
        let report = apply(&original, &patch, 0, false);
        let failed = report.failed_hunks(&patch);
        let rej = write_reject_file(&patch, &failed);
        let text = String::from_utf8(rej).unwrap();
        assert!(text.starts_with("--- foo.txt\n+++ foo.txt\n"));
        assert!(text.contains("@@ -2 +2 @@"));
    }

    #[test]
    fn line_writer_forces_requested_newline() {
        let mut w = LineWriter::new(NewlinePolicy::CrLf);
        w.write_line(&line("hello"));
        assert_eq!(w.finish(), b"hello\r\n");
    }
}
