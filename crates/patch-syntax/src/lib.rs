//! Data model, range/path lexing and path quoting shared by every diff
//! format `patch(1)` understands.
//!
//! This crate is pure: it has no knowledge of the filesystem, no I/O, and
//! no notion of which hunk actually matches a target file. It only knows
//! how to describe a patch's structure and how to pull ranges and paths out
//! of the textual forms the four formats use.

mod lexer;
mod quote;

pub use lexer::{parse_context_range_line, parse_git_header_paths, parse_normal_command,
    parse_unified_range_line, strip_path, NormalCommand};
pub use quote::{quote_c_style, unquote_c_style, QuoteError};

use patch_line::Line;

/// A 1-based line range. `start_line == 0` with `number_of_lines == 0`
/// conventionally means "insert after the given line" for add-only hunks in
/// the normal format (`LaR` with an empty old range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start_line: i64,
    pub number_of_lines: i64,
}

impl Range {
    pub fn new(start_line: i64, number_of_lines: i64) -> Self {
        Range {
            start_line,
            number_of_lines,
        }
    }

    /// One-past-the-end line number of this range.
    pub fn end_line(&self) -> i64 {
        self.start_line + self.number_of_lines
    }
}

/// One line of a hunk body, tagged with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    pub operation: char,
    pub line: Line,
}

impl PatchLine {
    pub fn new(operation: char, line: Line) -> Self {
        PatchLine { operation, line }
    }

    pub fn is_context(&self) -> bool {
        self.operation == ' '
    }

    pub fn is_addition(&self) -> bool {
        self.operation == '+'
    }

    pub fn is_removal(&self) -> bool {
        self.operation == '-'
    }
}

/// A single `@@ ... @@`-delimited (or equivalent) change.
///
/// Invariant: the number of [`PatchLine`]s tagged context-or-removal equals
/// `old_range.number_of_lines`, and the number tagged context-or-addition
/// equals `new_range.number_of_lines`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hunk {
    pub old_range: Range,
    pub new_range: Range,
    pub lines: Vec<PatchLine>,
}

impl Hunk {
    /// Number of lines tagged `+`.
    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.is_addition()).count()
    }

    /// Number of lines tagged `-`.
    pub fn removals(&self) -> usize {
        self.lines.iter().filter(|l| l.is_removal()).count()
    }
}

/// The textual form a patch was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Unified,
    Context,
    Normal,
    Git,
    Ed,
    Unknown,
}

/// What a single file-patch within a patch set does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Change,
    Rename,
    Copy,
    Delete,
    Add,
    Binary,
}

/// One file's worth of changes: the header metadata plus its hunks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    pub format: Option<Format>,
    pub operation: Operation,
    pub index_path: Option<bstr::BString>,
    pub prerequisite: Option<bstr::BString>,
    pub old_path: Option<bstr::BString>,
    pub new_path: Option<bstr::BString>,
    pub old_file_time: Option<String>,
    pub new_file_time: Option<String>,
    pub old_mode: Option<u32>,
    pub new_mode: Option<u32>,
    pub hunks: Vec<Hunk>,
}

impl Default for Format {
    fn default() -> Self {
        Format::Unknown
    }
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Change
    }
}

impl Patch {
    pub fn is_new_file(&self) -> bool {
        matches!(self.operation, Operation::Add)
    }

    pub fn is_delete_file(&self) -> bool {
        matches!(self.operation, Operation::Delete)
    }
}
