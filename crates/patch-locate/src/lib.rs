//! Finds where a [`Hunk`] actually belongs in a target file, tolerating
//! drift (an `offset`) and imperfect context (`fuzz`), the way `patch(1)`
//! has always done: search outward from the hunk's recorded line number,
//! first trying an exact match, then re-trying with progressively more of
//! the hunk's leading/trailing context lines ignored.

use patch_line::Line;
use patch_syntax::{Hunk, PatchLine};

/// Where a hunk was found (or not) in a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line at which the hunk's old content starts, or `-1` if no
    /// match was found at any fuzz level up to the configured maximum.
    pub line_number: i64,
    /// How many leading/trailing context lines were ignored to find this
    /// match (0 for an exact match).
    pub fuzz: i64,
    /// Signed distance in lines between where the hunk's header said it
    /// would be and where it was actually found.
    pub offset: i64,
}

impl Location {
    pub fn not_found(fuzz: i64, offset: i64) -> Self {
        Location {
            line_number: -1,
            fuzz,
            offset,
        }
    }

    pub fn is_found(&self) -> bool {
        self.line_number >= 0
    }
}

fn collapse_whitespace(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut in_space = false;
    for &b in content {
        if b == b' ' || b == b'\t' {
            if !in_space && !out.is_empty() {
                out.push(b' ');
            }
            in_space = true;
        } else {
            out.push(b);
            in_space = false;
        }
    }
    while out.last() == Some(&b' ') {
        out.pop();
    }
    out
}

fn lines_equal(file_line: &Line, hunk_line: &Line, ignore_whitespace: bool) -> bool {
    if ignore_whitespace {
        collapse_whitespace(file_line.content.as_slice())
            == collapse_whitespace(hunk_line.content.as_slice())
    } else {
        file_line.content == hunk_line.content
    }
}

/// Walk `window` against `file_lines` starting at `start`, advancing the
/// file cursor only for lines that exist on the old side -- an added (`+`)
/// line contributes no content to match and is skipped without consuming a
/// file line, mirroring the reference matcher's treatment of the hunk as a
/// single ordered sequence rather than a pre-filtered old-side view.
fn window_matches(file_lines: &[Line], start: usize, window: &[PatchLine], ignore_whitespace: bool) -> bool {
    let mut cursor = start;
    for patch_line in window {
        if patch_line.operation == '+' {
            continue;
        }
        let Some(file_line) = file_lines.get(cursor) else {
            return false;
        };
        if !lines_equal(file_line, &patch_line.line, ignore_whitespace) {
            return false;
        }
        cursor += 1;
    }
    true
}

/// The old-side view of a hunk: context and removed lines, in order, which
/// is what must literally appear in the target file for the hunk to apply.
pub fn old_view(hunk: &Hunk) -> Vec<&PatchLine> {
    hunk.lines.iter().filter(|l| l.operation != '+').collect()
}

/// Locate `hunk` in `file_lines`.
///
/// `offset_hint` is the cumulative line-number drift carried over from
/// already-applied hunks in the same file (see `patch-apply`); it seeds
/// where the search starts before any fuzz is tried.
///
/// A hunk whose old range is empty (`old_range.number_of_lines == 0`, a
/// pure insertion with no context at all) has nothing to match against —
/// there is no content that could be wrong — so it is always "found" at its
/// expected position with zero fuzz. This preserves the reference
/// implementation's long-standing behaviour of never assigning fuzz to a
/// pure insertion, even when `offset_hint` is nonzero.
///
/// Fuzz is applied asymmetrically: a hunk with unequal leading/trailing
/// context (say two lines of context before the change and none after)
/// should give up its front context before it starts eating into content
/// that actually matters at the back. `prefix_fuzz`/`suffix_fuzz` are
/// derived from the hunk's actual leading/trailing all-context run lengths
/// (`prefix_content`/`suffix_content`) relative to the larger of the two
/// (`context`), so the shorter side reaches its full trim first and the
/// longer side only starts shrinking once fuzz exceeds `context`. Treating
/// both sides the same regardless of how much context each one actually
/// has would silently accept matches the reference implementation rejects,
/// and under-report how much fuzz a hunk really needed.
pub fn locate(file_lines: &[Line], hunk: &Hunk, max_fuzz: i64, ignore_whitespace: bool, offset_hint: i64) -> Location {
    if hunk.old_range.number_of_lines == 0 {
        let start = hunk.old_range.start_line + offset_hint;
        return Location {
            line_number: start.max(0),
            fuzz: 0,
            offset: offset_hint,
        };
    }

    let expected_0based = hunk.old_range.start_line - 1 + offset_hint;

    let prefix_content = hunk.lines.iter().take_while(|l| l.operation == ' ').count() as i64;
    let suffix_content = hunk.lines.iter().rev().take_while(|l| l.operation == ' ').count() as i64;
    let context = prefix_content.max(suffix_content);

    let total = hunk.lines.len() as i64;
    let max_fuzz = max_fuzz.max(0);

    for fuzz in 0..=max_fuzz {
        let prefix_fuzz = (fuzz + prefix_content - context).max(0);
        let suffix_fuzz = (fuzz + suffix_content - context).max(0);

        // Once the fuzz trimmed from both ends would swallow the whole
        // hunk, any file content could be made to "match" what's left --
        // stop here rather than reporting a meaningless success.
        if prefix_fuzz + suffix_fuzz >= total {
            return Location::not_found(fuzz, offset_hint);
        }

        let window = &hunk.lines[prefix_fuzz as usize..(total - suffix_fuzz) as usize];

        let try_candidate = |candidate: i64| -> bool {
            if candidate < 0 {
                return false;
            }
            let window_start = candidate + prefix_fuzz;
            window_matches(file_lines, window_start as usize, window, ignore_whitespace)
        };

        // Forward first, all the way to the end of the file, then backward
        // to the start -- this biases an ambiguous match (found both ahead
        // of and behind the expected position) to the later one, matching
        // historical `patch(1)` behaviour.
        if expected_0based >= 0 {
            for candidate in expected_0based..file_lines.len() as i64 {
                if try_candidate(candidate) {
                    return Location {
                        line_number: candidate + 1,
                        fuzz,
                        offset: candidate - (hunk.old_range.start_line - 1),
                    };
                }
            }
        }
        for candidate in (0..expected_0based).rev() {
            if try_candidate(candidate) {
                return Location {
                    line_number: candidate + 1,
                    fuzz,
                    offset: candidate - (hunk.old_range.start_line - 1),
                };
            }
        }
    }

    Location::not_found(max_fuzz, offset_hint)
}
