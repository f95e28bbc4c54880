//! Byte-oriented line reading with newline classification.
//!
//! A patch and the files it is applied to are read line-by-line without any
//! assumption of UTF-8 encoding. [`Line`] carries its own [`NewLine`]
//! terminator (or the absence of one, for a final unterminated line) so that
//! later stages can reproduce the exact bytes of an unmodified line.

use bstr::BString;

/// How a [`Line`] was terminated in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewLine {
    Lf,
    CrLf,
    /// The line was the last in its source and had no trailing terminator.
    None,
}

impl NewLine {
    /// The literal bytes this terminator is made of.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            NewLine::Lf => b"\n",
            NewLine::CrLf => b"\r\n",
            NewLine::None => b"",
        }
    }
}

/// A single line of text, without its terminator, plus the terminator it had.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Line {
    pub content: BString,
    pub newline: NewLine,
}

impl Default for NewLine {
    fn default() -> Self {
        NewLine::Lf
    }
}

impl Line {
    pub fn new(content: impl Into<BString>, newline: NewLine) -> Self {
        Line {
            content: content.into(),
            newline,
        }
    }

    /// Render the line back to bytes, content followed by its terminator.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.content.len() + 2);
        out.extend_from_slice(&self.content);
        out.extend_from_slice(self.newline.as_bytes());
        out
    }
}

/// An opaque cursor into a [`LineSource`], saved and later restored so a
/// parser can speculatively read ahead (e.g. while probing which diff format
/// a file uses) and back out cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(usize);

/// A rewindable source of [`Line`]s.
///
/// Reading past the end of the source is not an error: [`LineSource::next`]
/// keeps returning `None` forever once exhausted, so callers can probe
/// "is there another line" without tracking EOF themselves.
pub trait LineSource {
    /// Read and consume the next line, or `None` at end of input.
    fn next(&mut self) -> Option<Line>;

    /// Current cursor position, suitable for [`LineSource::seek`].
    fn position(&self) -> Position;

    /// Rewind (or fast-forward) to a previously observed [`Position`].
    fn seek(&mut self, position: Position);

    /// True if there are no more lines to read.
    fn is_eof(&self) -> bool;

    /// Read a line without consuming it.
    fn peek(&mut self) -> Option<Line> {
        let mark = self.position();
        let line = self.next();
        self.seek(mark);
        line
    }
}

/// A [`LineSource`] over an in-memory byte buffer.
///
/// This is the only [`LineSource`] implementation needed by the core: patch
/// text and target file content are both read fully into memory before
/// being split into lines, matching the reference implementation's
/// line-buffered `File` abstraction.
#[derive(Debug, Clone)]
pub struct BufferLineSource {
    data: Vec<u8>,
    cursor: usize,
}

impl BufferLineSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        BufferLineSource {
            data: data.into(),
            cursor: 0,
        }
    }

    /// Split the whole buffer into lines up-front.
    pub fn into_lines(mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        while let Some(line) = self.next() {
            lines.push(line);
        }
        lines
    }
}

impl LineSource for BufferLineSource {
    fn next(&mut self) -> Option<Line> {
        if self.cursor >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.cursor..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(idx) => {
                let (newline, content_end) = if idx > 0 && rest[idx - 1] == b'\r' {
                    (NewLine::CrLf, idx - 1)
                } else {
                    (NewLine::Lf, idx)
                };
                let content = BString::from(&rest[..content_end]);
                self.cursor += idx + 1;
                Some(Line::new(content, newline))
            }
            None => {
                let content = BString::from(rest);
                self.cursor = self.data.len();
                Some(Line::new(content, NewLine::None))
            }
        }
    }

    fn position(&self) -> Position {
        Position(self.cursor)
    }

    fn seek(&mut self, position: Position) {
        self.cursor = position.0.min(self.data.len());
    }

    fn is_eof(&self) -> bool {
        self.cursor >= self.data.len()
    }
}

/// Re-join lines into bytes, each followed by its own terminator.
pub fn lines_to_bytes(lines: &[Line]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(&line.to_bytes());
    }
    out
}
