//! Property tests for the path-lexing invariants that the rest of the
//! workspace leans on: stripping never runs past a bare filename, and
//! quoting always round-trips back to the original bytes.

use bstr::{BStr, BString};
use patch_syntax::{quote_c_style, strip_path, unquote_c_style};
use proptest::prelude::*;

fn path_component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,8}"
}

fn slash_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(path_component(), 1..6).prop_map(|parts| parts.join("/"))
}

proptest! {
    /// Stripping more components than a path has left just the bare
    /// filename, and stripping that same amount again is a no-op -- there
    /// is nothing left to strip once only one component remains.
    #[test]
    fn strip_path_is_idempotent_once_it_bottoms_out(path in slash_path(), strip in 0i32..20) {
        let once = strip_path(BStr::new(path.as_bytes()), strip);
        let twice = strip_path(BStr::new(once.as_slice()), strip);
        prop_assert_eq!(once, twice);
    }

    /// Stripping never produces a path with more `/`-separated components
    /// than the leftover tail of the original actually has.
    #[test]
    fn strip_path_never_strips_more_than_available(path in slash_path(), strip in 0i32..20) {
        let total_components = path.matches('/').count() + 1;
        let stripped = strip_path(BStr::new(path.as_bytes()), strip);
        let remaining = stripped.as_slice().iter().filter(|&&b| b == b'/').count() + 1;
        let expected_remaining = total_components.saturating_sub(strip.max(0) as usize).max(1);
        prop_assert_eq!(remaining, expected_remaining);
    }

    /// A negative strip count takes the basename regardless of how negative
    /// it is -- `-1` and `-100` behave identically.
    #[test]
    fn negative_strip_always_yields_the_basename(path in slash_path(), extra in 0i32..50) {
        let a = strip_path(BStr::new(path.as_bytes()), -1);
        let b = strip_path(BStr::new(path.as_bytes()), -1 - extra);
        prop_assert_eq!(a, b);
    }

    /// Any byte string, once quoted, unquotes back to exactly the bytes
    /// that went in -- this is what lets a patch header round-trip an
    /// arbitrary path through `diff --git "a/weird name" "b/weird name"`.
    #[test]
    fn quote_then_unquote_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let original = BString::from(bytes);
        let quoted = quote_c_style(BStr::new(original.as_slice()));

        if quoted.starts_with(b"\"") && quoted.ends_with(b"\"") && quoted.len() >= 2 {
            let body = BStr::new(&quoted.as_slice()[1..quoted.len() - 1]);
            let unquoted = unquote_c_style(body).expect("quote_c_style always emits valid escapes");
            prop_assert_eq!(unquoted, original);
        } else {
            // No quoting was needed; the content must be unchanged.
            prop_assert_eq!(BString::from(quoted.as_slice().to_vec()), original);
        }
    }
}
