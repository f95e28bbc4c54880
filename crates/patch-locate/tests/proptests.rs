//! Property test for the locator's fuzz search: raising the fuzz budget can
//! only ever turn a miss into a hit, never the reverse, since every match
//! found at a lower fuzz level is still a valid match at a higher one.

use patch_line::{Line, NewLine};
use patch_locate::locate;
use patch_syntax::{Hunk, PatchLine, Range};
use proptest::prelude::*;

fn line(s: &str) -> Line {
    Line::new(s, NewLine::Lf)
}

fn word() -> impl Strategy<Value = String> {
    "[a-c]{1,3}"
}

proptest! {
    #[test]
    fn more_fuzz_never_loses_a_match(
        file_words in proptest::collection::vec(word(), 1..12),
        hunk_words in proptest::collection::vec(word(), 1..6),
        start in 1i64..8,
        low_fuzz in 0i64..3,
        extra_fuzz in 0i64..3,
    ) {
        let file_lines: Vec<Line> = file_words.iter().map(|w| line(w)).collect();
        let hunk = Hunk {
            old_range: Range::new(start, hunk_words.len() as i64),
            new_range: Range::new(start, 0),
            lines: hunk_words.iter().map(|w| PatchLine::new(' ', line(w))).collect(),
        };

        let high_fuzz = low_fuzz + extra_fuzz;
        let low = locate(&file_lines, &hunk, low_fuzz, false, 0);
        let high = locate(&file_lines, &hunk, high_fuzz, false, 0);

        if low.is_found() {
            prop_assert!(high.is_found(), "found at fuzz {} but lost at fuzz {}", low_fuzz, high_fuzz);
            prop_assert!(high.fuzz <= low.fuzz, "higher budget should never report needing more fuzz than a lower one already found");
        }
    }

    /// A hunk that matches the file exactly at its expected position is
    /// always found with zero fuzz, no matter how large the fuzz budget is.
    #[test]
    fn exact_match_never_needs_fuzz(
        file_words in proptest::collection::vec(word(), 3..12),
        max_fuzz in 0i64..4,
    ) {
        let file_lines: Vec<Line> = file_words.iter().map(|w| line(w)).collect();
        let start = 1i64;
        let window_len = file_words.len().min(3);
        let hunk = Hunk {
            old_range: Range::new(start, window_len as i64),
            new_range: Range::new(start, 0),
            lines: file_words[..window_len].iter().map(|w| PatchLine::new(' ', line(w))).collect(),
        };

        let loc = locate(&file_lines, &hunk, max_fuzz, false, 0);
        prop_assert!(loc.is_found());
        prop_assert_eq!(loc.fuzz, 0);
        prop_assert_eq!(loc.line_number, 1);
    }
}
