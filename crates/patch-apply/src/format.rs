//! Serialises [`Hunk`]s and patch headers back to text, in either unified
//! or context style. Used both by the reject writer (failed hunks are
//! written back out for the user to resolve by hand) and by `--ifdef`
//! output, which otherwise reuses the unified hunk body format.

use bstr::BString;
use patch_line::NewLine;
use patch_syntax::{Format, Hunk, Patch};

fn push_line(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(b'\n');
}

pub fn format_hunk_unified(hunk: &Hunk) -> Vec<u8> {
    let mut out = Vec::new();
    let old = &hunk.old_range;
    let new = &hunk.new_range;
    let mut header = format!("@@ -{}", old.start_line);
    if old.number_of_lines != 1 {
        header.push_str(&format!(",{}", old.number_of_lines));
    }
    header.push_str(&format!(" +{}", new.start_line));
    if new.number_of_lines != 1 {
        header.push_str(&format!(",{}", new.number_of_lines));
    }
    header.push_str(" @@");
    push_line(&mut out, &header);

    for patch_line in &hunk.lines {
        out.push(patch_line.operation as u8);
        out.extend_from_slice(&patch_line.line.content);
        out.push(b'\n');
        if patch_line.line.newline == NewLine::None {
            push_line(&mut out, "\\ No newline at end of file");
        }
    }
    out
}

/// Reclassify a hunk's canonical `' '`/`'+'`/`'-'` lines into the context
/// format's two-block-with-`!` presentation, mirroring the reference
/// formatter's `write_hunk_as_context`.
pub fn format_hunk_context(hunk: &Hunk) -> Result<Vec<u8>, String> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Op {
        Context,
        Change,
        Remove,
        Add,
    }

    let mut old_lines: Vec<(Op, &patch_syntax::PatchLine)> = Vec::new();
    let mut new_lines: Vec<(Op, &patch_syntax::PatchLine)> = Vec::new();
    let mut old_run_start = 0usize;
    let mut new_run_start = 0usize;
    let mut current = Op::Context;
    let mut is_all_insertions = true;
    let mut is_all_deletions = true;

    let make_change = |old_lines: &mut Vec<(Op, &patch_syntax::PatchLine)>,
                        new_lines: &mut Vec<(Op, &patch_syntax::PatchLine)>,
                        old_run_start: usize,
                        new_run_start: usize| {
        for slot in old_lines.iter_mut().skip(old_run_start) {
            slot.0 = Op::Change;
        }
        for slot in new_lines.iter_mut().skip(new_run_start) {
            slot.0 = Op::Change;
        }
    };

    for pl in &hunk.lines {
        match pl.operation {
            ' ' => {
                if old_lines.len() == hunk.old_range.number_of_lines as usize && hunk.old_range.number_of_lines >= 0
                {
                    return Err("corrupt patch, more old lines than expected".into());
                }
                if new_lines.len() == hunk.new_range.number_of_lines as usize && hunk.new_range.number_of_lines >= 0
                {
                    return Err("corrupt patch, more new lines than expected".into());
                }
                current = Op::Context;
                old_lines.push((Op::Context, pl));
                new_lines.push((Op::Context, pl));
                old_run_start = old_lines.len();
                new_run_start = new_lines.len();
            }
            '+' => {
                if current != Op::Context {
                    make_change(&mut old_lines, &mut new_lines, old_run_start, new_run_start);
                    current = Op::Change;
                } else {
                    current = Op::Add;
                }
                new_lines.push((current, pl));
                is_all_deletions = false;
            }
            '-' => {
                if current != Op::Context {
                    make_change(&mut old_lines, &mut new_lines, old_run_start, new_run_start);
                    current = Op::Change;
                } else {
                    current = Op::Remove;
                }
                old_lines.push((current, pl));
                is_all_insertions = false;
            }
            _ => return Err("invalid patch operation given".into()),
        }
    }

    let symbol = |op: Op| match op {
        Op::Context => ' ',
        Op::Change => '!',
        Op::Remove => '-',
        Op::Add => '+',
    };

    let mut out = Vec::new();
    let old = &hunk.old_range;
    let new = &hunk.new_range;

    push_line(
        &mut out,
        &if old.number_of_lines > 1 {
            format!("*** {},{} ****", old.start_line, old.start_line + old.number_of_lines - 1)
        } else {
            format!("*** {} ****", old.start_line)
        },
    );

    if !is_all_insertions && !old_lines.is_empty() {
        for (op, pl) in &old_lines {
            out.push(symbol(*op) as u8);
            out.push(b' ');
            out.extend_from_slice(&pl.line.content);
            out.push(b'\n');
        }
        if let Some((_, last)) = old_lines.last() {
            if last.line.newline == NewLine::None {
                push_line(&mut out, "\\ No newline at end of file");
            }
        }
    }

    push_line(
        &mut out,
        &if new.number_of_lines > 1 {
            format!("--- {},{} ----", new.start_line, new.start_line + new.number_of_lines - 1)
        } else {
            format!("--- {} ----", new.start_line)
        },
    );

    if !is_all_deletions && !new_lines.is_empty() {
        for (op, pl) in &new_lines {
            out.push(symbol(*op) as u8);
            out.push(b' ');
            out.extend_from_slice(&pl.line.content);
            out.push(b'\n');
        }
        if let Some((_, last)) = new_lines.last() {
            if last.line.newline == NewLine::None {
                push_line(&mut out, "\\ No newline at end of file");
            }
        }
    }

    Ok(out)
}

fn path_or_dev_null(path: &Option<BString>) -> String {
    path.as_ref().map(|p| p.to_string()).unwrap_or_else(|| "/dev/null".to_string())
}

pub fn format_patch_header_unified(patch: &Patch) -> Vec<u8> {
    let mut out = Vec::new();
    let mut old = format!("--- {}", path_or_dev_null(&patch.old_path));
    if let Some(t) = &patch.old_file_time {
        old.push('\t');
        old.push_str(t);
    }
    push_line(&mut out, &old);

    let mut new = format!("+++ {}", path_or_dev_null(&patch.new_path));
    if let Some(t) = &patch.new_file_time {
        new.push('\t');
        new.push_str(t);
    }
    push_line(&mut out, &new);
    out
}

pub fn format_patch_header_context(patch: &Patch) -> Vec<u8> {
    let mut out = Vec::new();
    let mut old = format!("*** {}", path_or_dev_null(&patch.old_path));
    if let Some(t) = &patch.old_file_time {
        old.push('\t');
        old.push_str(t);
    }
    push_line(&mut out, &old);

    let mut new = format!("--- {}", path_or_dev_null(&patch.new_path));
    if let Some(t) = &patch.new_file_time {
        new.push('\t');
        new.push_str(t);
    }
    push_line(&mut out, &new);
    push_line(&mut out, "***************");
    out
}

/// Which family a patch's rejects should be written in: context-format
/// input stays context, everything else (unified, git) is written unified.
pub fn should_write_as_unified(format: Option<Format>) -> bool {
    !matches!(format, Some(Format::Context))
}
