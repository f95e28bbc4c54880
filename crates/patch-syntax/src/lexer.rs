//! Pure text-to-structure helpers: range headers, normal-format commands,
//! git header paths and the `-p`/`--strip` path-stripping rule.
//!
//! None of these functions consume a [`patch_line::LineSource`] directly —
//! they operate on an already-extracted line of text, so `patch-parser` can
//! drive format detection and error reporting around them.

use crate::Range;
use bstr::{BStr, BString, ByteSlice};

/// A parsed normal-format command line: `LaR`, `LdR` or `LcR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalCommand {
    pub old_range: Range,
    pub operation: char,
    pub new_range: Range,
}

fn parse_range_pair(s: &str) -> Option<(i64, i64)> {
    match s.split_once(',') {
        Some((a, b)) => Some((a.parse().ok()?, b.parse().ok()?)),
        None => {
            let a: i64 = s.parse().ok()?;
            Some((a, a))
        }
    }
}

/// Parse `A`, or `A,B`, into a [`Range`]. `default_count` is used when only
/// a single number is given (unified ranges default to a count of 1; a
/// missing count is only legal there).
fn parse_single_range(s: &str) -> Option<Range> {
    match s.split_once(',') {
        Some((a, b)) => {
            let start: i64 = a.parse().ok()?;
            let count: i64 = b.parse().ok()?;
            Some(Range::new(start, count))
        }
        None => {
            let start: i64 = s.parse().ok()?;
            Some(Range::new(start, 1))
        }
    }
}

/// Parse a unified hunk range header: `@@ -A[,B] +C[,D] @@[ section heading]`.
pub fn parse_unified_range_line(line: &BStr) -> Option<(Range, Range)> {
    let text = line.to_str().ok()?;
    let text = text.strip_prefix("@@ ")?;
    let (old, rest) = text.split_once(" +")?;
    let old = old.strip_prefix('-')?;
    let new_end = rest.find(" @@")?;
    let new = &rest[..new_end];
    let old_range = parse_single_range(old)?;
    let new_range = parse_single_range(new)?;
    Some((old_range, new_range))
}

/// Parse a normal-format command line: `3a4,5`, `3,4d5`, or `3,4c5,6`.
pub fn parse_normal_command(line: &BStr) -> Option<NormalCommand> {
    let text = line.to_str().ok()?;
    let op_index = text.find(['a', 'd', 'c'])?;
    let (old, rest) = text.split_at(op_index);
    let operation = rest.as_bytes()[0] as char;
    let new = &rest[1..];
    let (old_start, old_count) = parse_range_pair(old)?;
    let (new_start, new_count) = parse_range_pair(new)?;

    // Normal format ranges describe an inclusive line span; turn the pair
    // into (start, number_of_lines) the same way unified ranges are stored.
    let old_range = match operation {
        'a' => Range::new(old_start, 0),
        _ => Range::new(old_start, old_count - old_start + 1),
    };
    let new_range = match operation {
        'd' => Range::new(new_start, 0),
        _ => Range::new(new_start, new_count - new_start + 1),
    };

    Some(NormalCommand {
        old_range,
        operation,
        new_range,
    })
}

/// Parse a context hunk's leading range line: `*** A[,B] ****` (old) or
/// `--- C[,D] ----` (new).
pub fn parse_context_range_line(line: &BStr, marker: &str, trailer: &str) -> Option<Range> {
    let text = line.to_str().ok()?;
    let text = text.strip_prefix(marker)?.trim_end();
    let text = text.strip_suffix(trailer)?;
    let text = text.trim();
    match text.split_once(',') {
        Some((a, b)) => {
            let start: i64 = a.trim().parse().ok()?;
            let end: i64 = b.trim().parse().ok()?;
            Some(Range::new(start, (end - start + 1).max(0)))
        }
        None => {
            let start: i64 = text.parse().ok()?;
            Some(Range::new(start, 1))
        }
    }
}

/// Extract the two paths named by a `diff --git a/X b/Y` header line.
///
/// Both quoted (`"a/with spaces"`) and bare paths are accepted; a bare path
/// is split on the literal `" b/"` separator, matching the reference
/// implementation's handling of unquoted git header paths.
pub fn parse_git_header_paths(line: &BStr) -> Option<(BString, BString)> {
    let text = line.strip_prefix(b"diff --git ")?;
    let text = BStr::new(text);

    if text.starts_with(b"\"") {
        let (first, rest) = crate::quote::split_one_quoted(text)?;
        let rest = rest.strip_prefix(b" ")?;
        let rest = BStr::new(rest);
        let second = if rest.starts_with(b"\"") {
            crate::quote::split_one_quoted(rest)?.0
        } else {
            BString::from(rest.to_vec())
        };
        return Some((first, second));
    }

    let text_str = text.to_str().ok()?;
    let idx = text_str.find(" b/")?;
    let a = &text_str[..idx];
    let b = &text_str[idx + 3..];
    Some((BString::from(a), BString::from(format!("b/{b}"))))
}

/// Apply the `-p`/`--strip` rule to a path.
///
/// `strip == -1` means "strip everything but the basename". `strip >= 0`
/// removes that many leading `/`-separated components (a leading component
/// is everything up to and including the next `/`); once the path is
/// exhausted the remainder (possibly empty) is returned unchanged, matching
/// the reference implementation rather than erroring.
pub fn strip_path(path: &BStr, strip: i32) -> BString {
    if strip < 0 {
        return match path.rfind(b"/") {
            Some(idx) => BString::from(&path[idx + 1..]),
            None => BString::from(path.to_vec()),
        };
    }

    let mut rest = path;
    for _ in 0..strip {
        match rest.find(b"/") {
            Some(idx) => rest = BStr::new(&rest[idx + 1..]),
            None => break,
        }
    }
    BString::from(rest.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::ByteSlice;

    #[test]
    fn unified_range_with_counts() {
        let (old, new) = parse_unified_range_line(BStr::new(b"@@ -1,3 +1,4 @@")).unwrap();
        assert_eq!(old, Range::new(1, 3));
        assert_eq!(new, Range::new(1, 4));
    }

    #[test]
    fn unified_range_defaults_count_to_one() {
        let (old, new) = parse_unified_range_line(BStr::new(b"@@ -5 +5 @@")).unwrap();
        assert_eq!(old, Range::new(5, 1));
        assert_eq!(new, Range::new(5, 1));
    }

    #[test]
    fn unified_range_with_section_heading() {
        let (old, new) = parse_unified_range_line(BStr::new(b"@@ -1,2 +1,2 @@ fn main() {")).unwrap();
        assert_eq!(old, Range::new(1, 2));
        assert_eq!(new, Range::new(1, 2));
    }

    #[test]
    fn normal_add_command() {
        let cmd = parse_normal_command(BStr::new(b"3a4,5")).unwrap();
        assert_eq!(cmd.operation, 'a');
        assert_eq!(cmd.old_range, Range::new(3, 0));
        assert_eq!(cmd.new_range, Range::new(4, 2));
    }

    #[test]
    fn normal_delete_command() {
        let cmd = parse_normal_command(BStr::new(b"3,4d5")).unwrap();
        assert_eq!(cmd.operation, 'd');
        assert_eq!(cmd.old_range, Range::new(3, 2));
        assert_eq!(cmd.new_range, Range::new(5, 0));
    }

    #[test]
    fn normal_change_command() {
        let cmd = parse_normal_command(BStr::new(b"3,4c5,6")).unwrap();
        assert_eq!(cmd.old_range, Range::new(3, 2));
        assert_eq!(cmd.new_range, Range::new(5, 2));
    }

    #[test]
    fn context_range_with_span() {
        let r = parse_context_range_line(BStr::new(b"*** 1,4 ****"), "*** ", " ****").unwrap();
        assert_eq!(r, Range::new(1, 4));
    }

    #[test]
    fn context_range_single_line() {
        let r = parse_context_range_line(BStr::new(b"--- 5 ----"), "--- ", " ----").unwrap();
        assert_eq!(r, Range::new(5, 1));
    }

    #[test]
    fn git_header_bare_paths() {
        let (a, b) = parse_git_header_paths(BStr::new(b"diff --git a/foo.rs b/bar.rs")).unwrap();
        assert_eq!(a, "a/foo.rs");
        assert_eq!(b, "b/bar.rs");
    }

    #[test]
    fn strip_basename_only() {
        assert_eq!(strip_path(BStr::new(b"a/b/c.rs"), -1), "c.rs");
    }

    #[test]
    fn strip_one_component() {
        assert_eq!(strip_path(BStr::new(b"a/b/c.rs"), 1), "b/c.rs");
    }

    #[test]
    fn strip_beyond_available_components_keeps_remainder() {
        assert_eq!(strip_path(BStr::new(b"c.rs"), 5), "c.rs");
    }
}
