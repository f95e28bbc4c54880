//! Concrete input/output scenarios spanning the parser and the applier
//! together, one per diff format plus the two applier-only behaviours
//! (#ifdef materialisation, offset-adjusted rejects).

use patch_apply::{apply, apply_with, ifdef, write_reject_file};
use patch_line::{lines_to_bytes, BufferLineSource, LineSource};

fn lines(data: &[u8]) -> Vec<patch_line::Line> {
    BufferLineSource::new(data.to_vec()).into_lines()
}

fn parse_one(data: &[u8]) -> patch_syntax::Patch {
    let mut patches = patch_parser::parse(data).expect("patch parses");
    assert_eq!(patches.len(), 1);
    patches.remove(0)
}

#[test]
fn unified_add_one_line() {
    let p = b"--- f\n+++ f\n@@ -1,3 +1,4 @@\n int main()\n {\n+    return 0;\n }\n";
    let t = b"int main()\n{\n}\n";
    let patch = parse_one(p);
    let report = apply(&lines(t), &patch, 0, false);
    assert!(report.all_succeeded());
    assert_eq!(lines_to_bytes(&report.lines), b"int main()\n{\n    return 0;\n}\n".to_vec());
}

#[test]
fn normal_delete_one_line() {
    let p = b"3d2\n< 3\n";
    let t = b"1\n2\n3\n";
    let patch = parse_one(p);
    let report = apply(&lines(t), &patch, 0, false);
    assert!(report.all_succeeded());
    assert_eq!(lines_to_bytes(&report.lines), b"1\n2\n".to_vec());
}

#[test]
fn context_change_with_fuzz_zero() {
    let p = b"*** a\n--- b\n***************\n*** 1,3 ****\n--- 1,4 ----\n  int main()\n  {\n+     return 0;\n  }\n";
    let t = b"int main()\n{\n}\n";
    let patch = parse_one(p);
    let report = apply(&lines(t), &patch, 0, false);
    assert!(report.all_succeeded());
    assert_eq!(lines_to_bytes(&report.lines), b"int main()\n{\n    return 0;\n}\n".to_vec());
}

#[test]
fn second_hunk_failure_yields_a_reject_containing_only_that_hunk() {
    let p = b"--- f\n+++ f\n@@ -1,2 +1,3 @@\n a\n+b\n c\n@@ -10,1 +11,1 @@\n-nonexistent\n+replacement\n";
    let t = b"a\nc\n";
    let patch = parse_one(p);
    let report = apply(&lines(t), &patch, 0, false);
    assert_eq!(report.results[0].succeeded(), true);
    assert_eq!(report.results[1].succeeded(), false);

    let failed = report.failed_hunks(&patch);
    assert_eq!(failed.len(), 1);
    let rej = write_reject_file(&patch, &failed);
    let text = String::from_utf8(rej).unwrap();
    assert!(text.contains("-nonexistent"));
    assert!(!text.contains("+b"));
}

#[test]
fn failed_hunk_range_is_bumped_by_earlier_successful_hunks_net_growth() {
    // Hunk 1 applies cleanly and adds one line (old len 2, new len 3), so
    // hunk 2's originally-declared "-10,1 +11,1" range should come back
    // shifted by +1 in the reject: "-11,1 +12,1".
    let p = b"--- f\n+++ f\n@@ -1,2 +1,3 @@\n a\n+b\n c\n@@ -10,1 +11,1 @@\n-nonexistent\n+replacement\n";
    let t = b"a\nc\n";
    let patch = parse_one(p);
    let report = apply(&lines(t), &patch, 0, false);
    assert_eq!(report.results[1].new_file_offset, 1);

    let failed = report.failed_hunks(&patch);
    let rej = write_reject_file(&patch, &failed);
    let text = String::from_utf8(rej).unwrap();
    assert!(text.contains("@@ -11,1 +12,1 @@"), "unexpected reject body: {text}");
}

#[test]
fn conditional_materialisation_wraps_the_addition() {
    let p = b"--- f\n+++ f\n@@ -1,3 +1,4 @@\n int main()\n {\n+    return 1;\n }\n";
    let t = b"int main()\n{\n}\n";
    let patch = parse_one(p);
    let report = apply_with(&lines(t), &patch, 0, false, |hunk| ifdef::materialize(hunk, "TEST"));
    assert!(report.all_succeeded());
    let text = String::from_utf8(lines_to_bytes(&report.lines)).unwrap();
    assert!(text.contains("#ifdef TEST\n    return 1;\n#endif"));
}
