//! Turns raw patch bytes into a sequence of [`patch_syntax::Patch`] records.
//!
//! The parser is a small state machine: it skips non-patch "garbage" lines
//! looking for a format-identifying header, then dispatches to a
//! format-specific body parser. Ed-format bodies are recognised (so a
//! multi-file patch set containing one doesn't silently misparse) but their
//! body is never interpreted; the driver rejects them when it gets there.

mod cursor;
mod context;
mod git;
mod normal;
mod unified;

use bstr::{BString, ByteSlice};
use patch_syntax::{Format, Operation, Patch};

pub use cursor::LineCursor;

/// Fatal parse errors: patch text that cannot be turned into a [`Patch`] at
/// all. These always abort the whole run (spec §7 "Parse-fatal").
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("corrupt patch at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error(transparent)]
    Quote(#[from] patch_syntax::QuoteError),

    #[error("invalid mode string {0:?}: expected 6 octal digits")]
    InvalidMode(String),

    #[error("unexpected end of file in patch")]
    UnexpectedEof,
}

/// One complete patch set: every file-patch found in the input, in order.
pub fn parse(data: &[u8]) -> Result<Vec<Patch>, ParseError> {
    let mut cursor = LineCursor::new(data);
    let mut patches = Vec::new();

    let mut pending_prerequisite: Option<BString> = None;
    let mut pending_index: Option<BString> = None;

    while !cursor.is_eof() {
        if let Some(token) = capture_prereq_line(&cursor) {
            pending_prerequisite = Some(token);
            cursor.advance();
            continue;
        }
        if let Some(path) = capture_index_line(&cursor) {
            pending_index = Some(path);
            cursor.advance();
            continue;
        }

        if git::looks_like_start(&cursor) {
            let mut patch = git::parse(&mut cursor)?;
            patch.prerequisite = pending_prerequisite.take();
            patch.index_path = pending_index.take().or(patch.index_path.clone());
            patches.push(patch);
            continue;
        }

        if unified::looks_like_start(&cursor) {
            let mut patch = unified::parse(&mut cursor)?;
            patch.prerequisite = pending_prerequisite.take();
            patch.index_path = pending_index.take();
            patches.push(patch);
            continue;
        }

        if context::looks_like_start(&cursor) {
            let mut patch = context::parse(&mut cursor)?;
            patch.prerequisite = pending_prerequisite.take();
            patch.index_path = pending_index.take();
            patches.push(patch);
            continue;
        }

        if normal::looks_like_start(&cursor) {
            let mut patch = normal::parse(&mut cursor)?;
            patch.prerequisite = pending_prerequisite.take();
            patch.index_path = pending_index.take();
            patches.push(patch);
            continue;
        }

        if ed::looks_like_start(&cursor) {
            let patch = ed::parse(&mut cursor);
            patches.push(patch);
            continue;
        }

        // Garbage line preceding the next recognised header; skip it.
        cursor.advance();
    }

    Ok(patches)
}

fn capture_prereq_line(cursor: &LineCursor) -> Option<BString> {
    let line = cursor.peek()?;
    let text = line.content.to_str().ok()?;
    let rest = text.strip_prefix("Prereq:")?;
    Some(BString::from(rest.trim()))
}

fn capture_index_line(cursor: &LineCursor) -> Option<BString> {
    let line = cursor.peek()?;
    let text = line.content.to_str().ok()?;
    let rest = text.strip_prefix("Index:")?;
    Some(BString::from(rest.trim()))
}

mod ed {
    use super::*;
    use bstr::ByteSlice;

    /// Ed scripts open with `<range><command>` where command is one of
    /// `a`, `c`, `d`, `i` with *no* trailing count, unlike normal format's
    /// `LaR`/`LdR`/`LcR`. This is a recognise-only detector.
    pub fn looks_like_start(cursor: &LineCursor) -> bool {
        let Some(line) = cursor.peek() else { return false };
        let Ok(text) = line.content.to_str() else { return false };
        let digits_end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
        if digits_end == 0 {
            return false;
        }
        let (digits, rest) = text.split_at(digits_end);
        if digits.is_empty() {
            return false;
        }
        let rest = rest.strip_prefix(',').and_then(|r| {
            let end = r.find(|c: char| !c.is_ascii_digit())?;
            Some(&r[end..])
        }).unwrap_or(rest);
        matches!(rest, "a" | "c" | "d" | "i")
    }

    /// Consume the whole ed script body opaquely, up to a lone `.` line or
    /// the next recognised patch header.
    pub fn parse(cursor: &mut LineCursor) -> Patch {
        cursor.advance();
        while let Some(line) = cursor.peek() {
            let is_terminator = line.content.as_slice() == b".";
            cursor.advance();
            if is_terminator {
                break;
            }
        }
        Patch {
            format: Some(Format::Ed),
            operation: Operation::Change,
            ..Patch::default()
        }
    }
}
