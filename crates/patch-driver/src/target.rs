//! Target-file selection: turning a [`Patch`]'s header paths into an actual
//! path on disk, applying `-p`/`--strip` (or guessing it).

use crate::sink::Sink;
use bstr::{BStr, BString};
use patch_syntax::{strip_path, Patch};
use std::path::PathBuf;

fn to_path(b: &BString) -> PathBuf {
    PathBuf::from(b.to_string())
}

/// Where a rename/copy patch's output actually lands, as distinct from
/// [`guess_filepath`]'s result (which is always where the *input* content
/// is read from — for a rename, that's still the old path, since the
/// file hasn't moved yet when hunks are located against it). Stripped
/// with the same count `guess_filepath` resolved the input with.
pub fn rename_target(patch: &Patch, strip: i32, reversed: bool) -> Option<PathBuf> {
    let dest = if reversed { &patch.old_path } else { &patch.new_path };
    dest.as_ref().map(|p| to_path(&strip_path(BStr::new(p.as_slice()), strip)))
}

fn candidates(patch: &Patch, posix: bool) -> Vec<&BString> {
    if posix {
        // `--posix`: only the unified/context header paths count, matching
        // strict POSIX `patch` rather than GNU patch's `Index:`-line fallback.
        [&patch.old_path, &patch.new_path].into_iter().flatten().collect()
    } else {
        [&patch.old_path, &patch.new_path, &patch.index_path]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Resolve the file a patch should be applied to, along with the strip
/// count that was used (either the caller-provided one, or the first one
/// that produced an existing file).
///
/// Mirrors the reference implementation's ordering: old path, then new
/// path, then the `Index:`-line path, each tried against the filesystem
/// before falling back to the next. A patch that adds a file has nothing
/// to find on disk, so it resolves to its (stripped) new path regardless.
/// `posix` drops the `Index:`-line fallback, matching `--posix`.
pub fn guess_filepath(patch: &Patch, strip: Option<i32>, sink: &dyn Sink, posix: bool) -> Option<(PathBuf, i32)> {
    let paths = candidates(patch, posix);

    let try_strip = |s: i32| -> Option<PathBuf> {
        for c in &paths {
            let stripped = strip_path(BStr::new(c.as_slice()), s);
            let path = to_path(&stripped);
            if sink.exists(&path) {
                return Some(path);
            }
        }
        None
    };

    if let Some(s) = strip {
        if let Some(path) = try_strip(s) {
            return Some((path, s));
        }
        if patch.is_new_file() {
            if let Some(new_path) = &patch.new_path {
                return Some((to_path(&strip_path(BStr::new(new_path.as_slice()), s)), s));
            }
        }
        return None;
    }

    for s in 0..=16 {
        if let Some(path) = try_strip(s) {
            return Some((path, s));
        }
    }

    if patch.is_new_file() {
        if let Some(new_path) = &patch.new_path {
            let guessed_strip = if paths.iter().any(|p| p.starts_with(b"a/") || p.starts_with(b"b/")) {
                1
            } else {
                0
            };
            return Some((
                to_path(&strip_path(BStr::new(new_path.as_slice()), guessed_strip)),
                guessed_strip,
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn finds_existing_file_with_explicit_strip() {
        let sink = MemorySink::new().with_file("foo.txt", "content");
        let patch = Patch {
            old_path: Some("a/foo.txt".into()),
            new_path: Some("b/foo.txt".into()),
            ..Patch::default()
        };
        let (path, strip) = guess_filepath(&patch, Some(1), &sink, false).unwrap();
        assert_eq!(path, PathBuf::from("foo.txt"));
        assert_eq!(strip, 1);
    }

    #[test]
    fn guesses_strip_when_unset() {
        let sink = MemorySink::new().with_file("src/foo.txt", "content");
        let patch = Patch {
            old_path: Some("a/src/foo.txt".into()),
            new_path: Some("b/src/foo.txt".into()),
            ..Patch::default()
        };
        let (path, strip) = guess_filepath(&patch, None, &sink, false).unwrap();
        assert_eq!(path, PathBuf::from("src/foo.txt"));
        assert_eq!(strip, 1);
    }

    #[test]
    fn new_file_resolves_even_without_existing_target() {
        let sink = MemorySink::new();
        let patch = Patch {
            operation: patch_syntax::Operation::Add,
            old_path: Some("/dev/null".into()),
            new_path: Some("b/new.txt".into()),
            ..Patch::default()
        };
        let (path, _) = guess_filepath(&patch, Some(1), &sink, false).unwrap();
        assert_eq!(path, PathBuf::from("new.txt"));
    }
}
