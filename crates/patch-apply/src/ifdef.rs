//! `-D MACRO` output: instead of replacing old lines with new ones, wrap
//! both versions in preprocessor conditionals so either can be compiled by
//! defining or not defining `MACRO`.

use patch_line::{Line, NewLine};
use patch_syntax::Hunk;

fn directive(text: String) -> Line {
    Line::new(text, NewLine::Lf)
}

/// Materialise a hunk's changes as `#ifdef`/`#ifndef` guarded blocks around
/// unchanged context, returning the full replacement line sequence for the
/// hunk's region.
pub fn materialize(hunk: &Hunk, macro_name: &str) -> Vec<Line> {
    let mut out = Vec::new();
    let mut i = 0;
    let lines = &hunk.lines;

    while i < lines.len() {
        if lines[i].operation == ' ' {
            out.push(lines[i].line.clone());
            i += 1;
            continue;
        }

        let removed_start = i;
        while i < lines.len() && lines[i].operation == '-' {
            i += 1;
        }
        let removed = &lines[removed_start..i];

        let added_start = i;
        while i < lines.len() && lines[i].operation == '+' {
            i += 1;
        }
        let added = &lines[added_start..i];

        match (removed.is_empty(), added.is_empty()) {
            (false, false) => {
                out.push(directive(format!("#ifndef {macro_name}")));
                out.extend(removed.iter().map(|pl| pl.line.clone()));
                out.push(directive("#else".to_string()));
                out.extend(added.iter().map(|pl| pl.line.clone()));
                out.push(directive(format!("#endif /* {macro_name} */")));
            }
            (false, true) => {
                out.push(directive(format!("#ifndef {macro_name}")));
                out.extend(removed.iter().map(|pl| pl.line.clone()));
                out.push(directive(format!("#endif /* !{macro_name} */")));
            }
            (true, false) => {
                out.push(directive(format!("#ifdef {macro_name}")));
                out.extend(added.iter().map(|pl| pl.line.clone()));
                out.push(directive(format!("#endif /* {macro_name} */")));
            }
            (true, true) => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use patch_syntax::{PatchLine, Range};

    fn line(s: &str) -> Line {
        Line::new(s, NewLine::Lf)
    }

    #[test]
    fn change_run_wraps_both_variants() {
        let hunk = Hunk {
            old_range: Range::new(1, 1),
            new_range: Range::new(1, 1),
            lines: vec![
                PatchLine::new('-', line("old")),
                PatchLine::new('+', line("new")),
            ],
        };
        let out = materialize(&hunk, "FEATURE");
        let texts: Vec<_> = out.iter().map(|l| l.content.to_string()).collect();
        assert_eq!(
            texts,
            vec!["#ifndef FEATURE", "old", "#else", "new", "#endif /* FEATURE */"]
        );
    }

    #[test]
    fn pure_addition_only_wraps_ifdef() {
        let hunk = Hunk {
            old_range: Range::new(1, 0),
            new_range: Range::new(1, 1),
            lines: vec![PatchLine::new('+', line("new"))],
        };
        let out = materialize(&hunk, "FEATURE");
        let texts: Vec<_> = out.iter().map(|l| l.content.to_string()).collect();
        assert_eq!(texts, vec!["#ifdef FEATURE", "new", "#endif /* FEATURE */"]);
    }

    #[test]
    fn context_lines_pass_through() {
        let hunk = Hunk {
            old_range: Range::new(1, 1),
            new_range: Range::new(1, 1),
            lines: vec![PatchLine::new(' ', line("same"))],
        };
        let out = materialize(&hunk, "FEATURE");
        assert_eq!(out, vec![line("same")]);
    }
}
