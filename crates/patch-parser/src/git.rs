use crate::{unified, LineCursor, ParseError};
use bstr::{BStr, ByteSlice};
use patch_syntax::{parse_git_header_paths, Format, Operation, Patch};

pub fn looks_like_start(cursor: &LineCursor) -> bool {
    cursor
        .peek()
        .is_some_and(|line| line.content.starts_with(b"diff --git "))
}

fn parse_mode(text: &str) -> Result<u32, ParseError> {
    if text.len() != 6 || !text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(ParseError::InvalidMode(text.to_string()));
    }
    u32::from_str_radix(text, 8).map_err(|_| ParseError::InvalidMode(text.to_string()))
}

pub fn parse(cursor: &mut LineCursor) -> Result<Patch, ParseError> {
    let header = cursor.advance().expect("checked by looks_like_start");
    let (a_path, b_path) = parse_git_header_paths(BStr::new(header.content.as_slice()))
        .ok_or_else(|| ParseError::Corrupt {
            line: cursor.line_number(),
            reason: format!("malformed git diff header {:?}", header.content),
        })?;

    let mut patch = Patch {
        format: Some(Format::Git),
        operation: Operation::Change,
        old_path: Some(a_path),
        new_path: Some(b_path),
        ..Patch::default()
    };

    loop {
        let Some(line) = cursor.peek() else { break };
        let Ok(text) = line.content.to_str() else { break };

        if let Some(rest) = text.strip_prefix("old mode ") {
            patch.old_mode = Some(parse_mode(rest)?);
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("new mode ") {
            patch.new_mode = Some(parse_mode(rest)?);
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("deleted file mode ") {
            patch.operation = Operation::Delete;
            patch.old_mode = Some(parse_mode(rest)?);
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("new file mode ") {
            patch.operation = Operation::Add;
            patch.new_mode = Some(parse_mode(rest)?);
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("copy from ") {
            patch.operation = Operation::Copy;
            patch.old_path = Some(rest.into());
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("copy to ") {
            patch.new_path = Some(rest.into());
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("rename from ") {
            patch.operation = Operation::Rename;
            patch.old_path = Some(rest.into());
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("rename to ") {
            patch.new_path = Some(rest.into());
            cursor.advance();
        } else if text.starts_with("similarity index ") || text.starts_with("dissimilarity index ") {
            cursor.advance();
        } else if let Some(rest) = text.strip_prefix("index ") {
            patch.index_path = Some(rest.into());
            cursor.advance();
        } else if text.starts_with("Binary files ") && text.ends_with(" differ") {
            patch.operation = Operation::Binary;
            cursor.advance();
        } else if text == "GIT binary patch" {
            patch.operation = Operation::Binary;
            cursor.advance();
            skip_binary_block(cursor);
        } else if text.starts_with("--- ") {
            let Some(plus_line) = cursor.peek_at(1) else { break };
            if !plus_line.content.starts_with(b"+++ ") {
                break;
            }
            let old_text = text.strip_prefix("--- ").unwrap_or(text);
            let new_text = plus_line
                .content
                .to_str()
                .ok()
                .and_then(|s| s.strip_prefix("+++ "))
                .unwrap_or_default()
                .to_string();
            if old_text != "/dev/null" {
                patch.old_path = Some(old_text.into());
            }
            if new_text != "/dev/null" {
                patch.new_path = Some(new_text.into());
            }
            cursor.advance();
            cursor.advance();
        } else {
            break;
        }
    }

    while unified_hunk_follows(cursor) {
        patch.hunks.push(unified::parse_hunk(cursor)?);
    }

    Ok(patch)
}

fn unified_hunk_follows(cursor: &LineCursor) -> bool {
    cursor.peek().is_some_and(|line| line.content.starts_with(b"@@ "))
}

/// `GIT binary patch` bodies are base85-encoded and opaque to this
/// implementation; skip both literal/delta blocks up to the blank line
/// that terminates them.
fn skip_binary_block(cursor: &mut LineCursor) {
    loop {
        match cursor.peek() {
            Some(line) if line.content.is_empty() => {
                cursor.advance();
                break;
            }
            Some(_) => {
                cursor.advance();
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_git_change() {
        let mut cursor = LineCursor::new(
            b"diff --git a/foo.rs b/foo.rs\nindex abc123..def456 100644\n--- a/foo.rs\n+++ b/foo.rs\n@@ -1 +1 @@\n-old\n+new\n",
        );
        let patch = parse(&mut cursor).unwrap();
        assert_eq!(patch.operation, Operation::Change);
        assert_eq!(patch.hunks.len(), 1);
    }

    #[test]
    fn parses_rename_with_no_hunks() {
        let mut cursor = LineCursor::new(
            b"diff --git a/old.rs b/new.rs\nsimilarity index 100%\nrename from old.rs\nrename to new.rs\n",
        );
        let patch = parse(&mut cursor).unwrap();
        assert_eq!(patch.operation, Operation::Rename);
        assert_eq!(patch.old_path.unwrap(), "old.rs");
        assert_eq!(patch.new_path.unwrap(), "new.rs");
        assert!(patch.hunks.is_empty());
    }

    #[test]
    fn parses_new_file_mode() {
        let mut cursor = LineCursor::new(
            b"diff --git a/new.rs b/new.rs\nnew file mode 100644\nindex 0000000..abc123\n--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1 @@\n+hello\n",
        );
        let patch = parse(&mut cursor).unwrap();
        assert_eq!(patch.operation, Operation::Add);
        assert_eq!(patch.new_mode, Some(0o100644));
    }
}
