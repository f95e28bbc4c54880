use crate::{LineCursor, ParseError};
use bstr::{BStr, BString};
use patch_line::{Line, NewLine};
use patch_syntax::{parse_unified_range_line, Format, Hunk, Operation, Patch, PatchLine, Range};

pub fn looks_like_start(cursor: &LineCursor) -> bool {
    let Some(old) = cursor.peek() else { return false };
    let Some(new) = cursor.peek_at(1) else { return false };
    old.content.starts_with(b"--- ") && new.content.starts_with(b"+++ ")
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
    let old_line = cursor.advance().expect("checked by looks_like_start");
    let new_line = cursor.advance().expect("checked by looks_like_start");

    let (old_path, old_file_time) = split_path_and_time(&old_line.content, b"--- ");
    let (new_path, new_file_time) = split_path_and_time(&new_line.content, b"+++ ");

    let mut hunks = Vec::new();
    while let Some(line) = cursor.peek() {
        if !line.content.starts_with(b"@@ ") {
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
        format: Some(Format::Unified),
        operation,
        index_path: None,
        prerequisite: None,
        old_path: Some(old_path),
        new_path: Some(new_path),
        old_file_time,
        new_file_time,
        old_mode: None,
        new_mode: None,
        hunks,
    })
}

pub fn parse_hunk(cursor: &mut LineCursor) -> Result<Hunk, ParseError> {
    let header = cursor.advance().expect("caller checked @@ prefix");
    let (old_range, new_range) = parse_unified_range_line(BStr::new(header.content.as_slice()))
        .ok_or_else(|| ParseError::Corrupt {
            line: cursor.line_number(),
            reason: format!("malformed unified hunk range {:?}", header.content),
        })?;

    let mut lines = Vec::new();
    let mut old_count: i64 = 0;
    let mut new_count: i64 = 0;

    while old_count < old_range.number_of_lines || new_count < new_range.number_of_lines {
        let Some(line) = cursor.peek() else {
            return Err(ParseError::UnexpectedEof);
        };

        if line.content.as_slice() == b"\\ No newline at end of file" {
            cursor.advance();
            if let Some(last) = lines.last_mut() {
                let last: &mut PatchLine = last;
                last.line.newline = NewLine::None;
            }
            continue;
        }

        let Some(&op) = line.content.as_slice().first() else {
            return Err(ParseError::Corrupt {
                line: cursor.line_number(),
                reason: "empty line inside hunk body".into(),
            });
        };
        let op = op as char;
        if !matches!(op, ' ' | '+' | '-') {
            return Err(ParseError::Corrupt {
                line: cursor.line_number(),
                reason: format!("unexpected line inside hunk body: {:?}", line.content),
            });
        }

        let content = BString::from(&line.content.as_slice()[1..]);
        let newline = line.newline;
        cursor.advance();

        match op {
            ' ' => {
                old_count += 1;
                new_count += 1;
            }
            '-' => old_count += 1,
            '+' => new_count += 1,
            _ => unreachable!(),
        }

        lines.push(PatchLine::new(op, Line::new(content, newline)));
    }

    Ok(Hunk {
        old_range,
        new_range,
        lines,
    })
}
