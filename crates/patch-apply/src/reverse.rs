//! Turns a patch (or a single hunk) into the patch that would undo it.

use patch_syntax::{Hunk, Operation, Patch, PatchLine};

pub fn reverse_hunk(hunk: &Hunk) -> Hunk {
    let lines = hunk
        .lines
        .iter()
        .map(|pl| {
            let op = match pl.operation {
                '+' => '-',
                '-' => '+',
                other => other,
            };
            PatchLine::new(op, pl.line.clone())
        })
        .collect();

    Hunk {
        old_range: hunk.new_range,
        new_range: hunk.old_range,
        lines,
    }
}

pub fn reverse_operation(operation: Operation) -> Operation {
    match operation {
        Operation::Add => Operation::Delete,
        Operation::Delete => Operation::Add,
        other => other,
    }
}

pub fn reverse_patch(patch: &Patch) -> Patch {
    Patch {
        format: patch.format,
        operation: reverse_operation(patch.operation),
        index_path: patch.index_path.clone(),
        prerequisite: patch.prerequisite.clone(),
        old_path: patch.new_path.clone(),
        new_path: patch.old_path.clone(),
        old_file_time: patch.new_file_time.clone(),
        new_file_time: patch.old_file_time.clone(),
        old_mode: patch.new_mode,
        new_mode: patch.old_mode,
        hunks: patch.hunks.iter().map(reverse_hunk).collect(),
    }
}
