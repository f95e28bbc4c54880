//! End-to-end exercise of a git rename patch straight from diff text,
//! through the parser and into the driver, matching the concrete
//! scenario of a rename that also drops a line from the renamed file.

use patch_driver::{Driver, MemorySink, NeverPrompt, Options};
use std::path::Path;

fn diff() -> Vec<u8> {
    b"diff --git a/thing b/test\nsimilarity index 66%\nrename from thing\nrename to test\nindex 1111111..2222222 100644\n--- a/thing\n+++ b/test\n@@ -1,3 +1,2 @@\n a\n-b\n c\n".to_vec()
}

#[test]
fn git_rename_with_hunk_moves_content_to_the_new_path() {
    let patches = patch_parser::parse(&diff()).expect("patch parses");
    assert_eq!(patches.len(), 1);

    let mut sink = MemorySink::new().with_file("thing", "a\nb\nc\n");
    let mut driver = Driver::new(Options::default(), &mut sink);
    let summary = driver.run(&patches, &mut NeverPrompt).expect("driver runs");

    assert!(summary.all_clean());
    assert!(sink.file(Path::new("thing")).is_none(), "old path should be gone");
    assert_eq!(sink.file(Path::new("test")), Some(&b"a\nc\n"[..]));
}

#[test]
fn dry_run_reports_without_touching_the_filesystem() {
    let patches = patch_parser::parse(&diff()).expect("patch parses");
    let mut sink = MemorySink::new().with_file("thing", "a\nb\nc\n");
    let mut options = Options::default();
    options.dry_run = true;
    let mut driver = Driver::new(options, &mut sink);
    let summary = driver.run(&patches, &mut NeverPrompt).expect("driver runs");

    assert!(summary.all_clean());
    assert_eq!(sink.file(Path::new("thing")), Some(&b"a\nb\nc\n"[..]));
    assert!(sink.file(Path::new("test")).is_none());
}
