use crate::{LineCursor, ParseError};
use bstr::{BStr, BString};
use patch_line::{Line, NewLine};
use patch_syntax::{parse_context_range_line, Format, Hunk, Operation, Patch, PatchLine};

pub fn looks_like_start(cursor: &LineCursor) -> bool {
    let Some(old) = cursor.peek() else { return false };
    let Some(new) = cursor.peek_at(1) else { return false };
    let Some(sep) = cursor.peek_at(2) else { return false };
    old.content.starts_with(b"*** ")
        && !old.content.ends_with(b" ****")
        && new.content.starts_with(b"--- ")
        && sep.content.as_slice() == b"***************"
}

fn split_path_and_time(content: &[u8], marker: &[u8]) -> (BString, Option<String>) {
    let rest = &content[marker.len()..];
    match rest.iter().position(|&b| b == b'\t') {
        Some(idx) => (
            BString::from(&rest[..idx]),
            Some(String::from_utf8_lossy(&rest[idx + 1..]).into_owned()),
        ),
        None => (BString::from(rest), None),
    }
}

pub fn parse(cursor: &mut LineCursor) -> Result<Patch, ParseError> {
    let old_header = cursor.advance().expect("checked by looks_like_start");
    let new_header = cursor.advance().expect("checked by looks_like_start");
    cursor.advance(); // "***************"

    let (old_path, old_file_time) = split_path_and_time(&old_header.content, b"*** ");
    let (new_path, new_file_time) = split_path_and_time(&new_header.content, b"--- ");

    let mut hunks = Vec::new();
    while let Some(line) = cursor.peek() {
        if !(line.content.starts_with(b"*** ") && line.content.ends_with(b" ****")) {
            break;
        }
        hunks.push(parse_hunk(cursor)?);
    }

    let operation = if old_path.as_slice() == b"/dev/null" {
        Operation::Add
    } else if new_path.as_slice() == b"/dev/null" {
        Operation::Delete
    } else {
        Operation::Change
    };

    Ok(Patch {
        format: Some(Format::Context),
        operation,
        old_path: Some(old_path),
        new_path: Some(new_path),
        old_file_time,
        new_file_time,
        hunks,
        ..Patch::default()
    })
}

/// Read a context block of `"<op> <content>"` lines, where `<op>` is one of
/// `allowed`. Stops as soon as a line's second byte isn't a space, or its
/// first byte isn't in `allowed` — both the block's own headers and the
/// next block's headers fail that test naturally.
fn read_block(cursor: &mut LineCursor, allowed: &[u8]) -> Result<Vec<(char, Line)>, ParseError> {
    let mut out: Vec<(char, Line)> = Vec::new();
    while let Some(line) = cursor.peek() {
        if line.content.as_slice() == b"\\ No newline at end of file" {
            cursor.advance();
            if let Some((_, last)) = out.last_mut() {
                last.newline = NewLine::None;
            }
            continue;
        }
        let bytes = line.content.as_slice();
        if bytes.len() < 2 || bytes[1] != b' ' || !allowed.contains(&bytes[0]) {
            break;
        }
        let op = bytes[0] as char;
        let content = BString::from(&bytes[2..]);
        let newline = line.newline;
        cursor.advance();
        out.push((op, Line::new(content, newline)));
    }
    Ok(out)
}

/// Merge independently-tagged old and new blocks into the canonical
/// `' '`/`'+'`/`'-'` line sequence used everywhere else in this codebase.
/// A context diff's `!` marks a changed line in both blocks at once; it is
/// split back out here into a run of removals followed by a run of
/// additions, mirroring how the reference formatter folds them together
/// when writing context output from the canonical form.
fn merge_blocks(old_lines: Vec<(char, Line)>, new_lines: Vec<(char, Line)>) -> Vec<PatchLine> {
    let mut out = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < old_lines.len() || j < new_lines.len() {
        while i < old_lines.len() && old_lines[i].0 != ' ' {
            out.push(PatchLine::new('-', old_lines[i].1.clone()));
            i += 1;
        }
        while j < new_lines.len() && new_lines[j].0 != ' ' {
            out.push(PatchLine::new('+', new_lines[j].1.clone()));
            j += 1;
        }
        if i < old_lines.len() && old_lines[i].0 == ' ' {
            out.push(PatchLine::new(' ', old_lines[i].1.clone()));
            i += 1;
            if j < new_lines.len() && new_lines[j].0 == ' ' {
                j += 1;
            }
        } else if j < new_lines.len() && new_lines[j].0 == ' ' {
            out.push(PatchLine::new(' ', new_lines[j].1.clone()));
            j += 1;
        }
    }
    out
}

fn parse_hunk(cursor: &mut LineCursor) -> Result<Hunk, ParseError> {
    let header = cursor.advance().expect("caller checked prefix/suffix");
    let old_range = parse_context_range_line(BStr::new(header.content.as_slice()), "*** ", " ****")
        .ok_or_else(|| ParseError::Corrupt {
            line: cursor.line_number(),
            reason: format!("malformed context hunk range {:?}", header.content),
        })?;

    let old_lines = read_block(cursor, b" -!")?;

    let Some(new_header) = cursor.advance() else {
        return Err(ParseError::UnexpectedEof);
    };
    if !new_header.content.starts_with(b"--- ") {
        return Err(ParseError::Corrupt {
            line: cursor.line_number(),
            reason: "expected '--- N,M ----' new-range header in context hunk".into(),
        });
    }
    let new_range = parse_context_range_line(BStr::new(new_header.content.as_slice()), "--- ", " ----")
        .ok_or_else(|| ParseError::Corrupt {
            line: cursor.line_number(),
            reason: format!("malformed context hunk range {:?}", new_header.content),
        })?;

    let new_lines = read_block(cursor, b" +!")?;

    let lines = merge_blocks(old_lines, new_lines);

    Ok(Hunk {
        old_range,
        new_range,
        lines,
    })
}
