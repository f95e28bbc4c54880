use crate::{LineCursor, ParseError};
use bstr::{BStr, BString};
use patch_line::Line;
use patch_syntax::{parse_normal_command, Format, Hunk, Operation, Patch, PatchLine};

pub fn looks_like_start(cursor: &LineCursor) -> bool {
    let Some(line) = cursor.peek() else { return false };
    parse_normal_command(BStr::new(line.content.as_slice())).is_some()
}

pub fn parse(cursor: &mut LineCursor) -> Result<Patch, ParseError> {
    let mut hunks = Vec::new();
    while looks_like_start(cursor) {
        hunks.push(parse_hunk(cursor)?);
    }
    Ok(Patch {
        format: Some(Format::Normal),
        operation: Operation::Change,
        hunks,
        ..Patch::default()
    })
}

fn read_tagged_lines(cursor: &mut LineCursor, tag: &[u8], count: i64) -> Result<Vec<Line>, ParseError> {
    let mut out = Vec::new();
    for _ in 0..count {
        let Some(line) = cursor.peek() else {
            return Err(ParseError::UnexpectedEof);
        };
        if !line.content.starts_with(tag) {
            return Err(ParseError::Corrupt {
                line: cursor.line_number(),
                reason: format!("expected line starting with {:?}", BString::from(tag)),
            });
        }
        let content = BString::from(&line.content.as_slice()[tag.len()..]);
        let newline = line.newline;
        cursor.advance();
        out.push(Line::new(content, newline));
    }
    Ok(out)
}

fn parse_hunk(cursor: &mut LineCursor) -> Result<Hunk, ParseError> {
    let header = cursor.advance().expect("caller checked looks_like_start");
    let command = parse_normal_command(BStr::new(header.content.as_slice()))
        .expect("caller checked looks_like_start");

    let mut lines = Vec::new();

    match command.operation {
        'a' => {
            for line in read_tagged_lines(cursor, b"> ", command.new_range.number_of_lines)? {
                lines.push(PatchLine::new('+', line));
            }
        }
        'd' => {
            for line in read_tagged_lines(cursor, b"< ", command.old_range.number_of_lines)? {
                lines.push(PatchLine::new('-', line));
            }
        }
        'c' => {
            for line in read_tagged_lines(cursor, b"< ", command.old_range.number_of_lines)? {
                lines.push(PatchLine::new('-', line));
            }
            match cursor.peek() {
                Some(sep) if sep.content.as_slice() == b"---" => {
                    cursor.advance();
                }
                _ => {
                    return Err(ParseError::Corrupt {
                        line: cursor.line_number(),
                        reason: "expected '---' separator in normal change command".into(),
                    })
                }
            }
            for line in read_tagged_lines(cursor, b"> ", command.new_range.number_of_lines)? {
                lines.push(PatchLine::new('+', line));
            }
        }
        other => {
            return Err(ParseError::Corrupt {
                line: cursor.line_number(),
                reason: format!("unknown normal-format command {other:?}"),
            })
        }
    }

    Ok(Hunk {
        old_range: command.old_range,
        new_range: command.new_range,
        lines,
    })
}
