use patch_apply::NewlinePolicy;

/// How a patch set's `Prereq:` line should be enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrerequisitePolicy {
    /// Refuse (fatal) on any prerequisite mismatch.
    Batch,
    /// Warn and continue regardless of the prerequisite.
    Force,
    /// Default interactive behaviour: ask the caller via the prompt
    /// callback; non-interactive callers should treat this the same as
    /// `Batch`.
    #[default]
    Ask,
}

/// How to handle a target file that is marked read-only on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadOnlyHandling {
    #[default]
    Warn,
    Ignore,
    Fail,
}

/// Which format family to write `.rej` files in, or follow the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectFormat {
    #[default]
    Default,
    Context,
    Unified,
}

/// Structured configuration consumed by [`crate::Driver::run`].
///
/// This is the whole of the CLI's contract with the core: nothing here
/// reads environment variables or talks to a terminal. `patch-cli` is
/// responsible for turning `argv`/env into one of these.
#[derive(Debug, Clone)]
pub struct Options {
    /// Number of leading path components to strip (`-p`). `None` means
    /// guess by trying successively fewer components until a candidate
    /// exists on disk.
    pub strip: Option<i32>,
    pub reverse_patch: bool,
    pub ignore_reversed: bool,
    pub force: bool,
    pub batch: bool,
    pub dry_run: bool,
    pub max_fuzz: i64,
    pub ignore_whitespace: bool,
    pub define_macro: Option<String>,
    pub newline_output: NewlinePolicy,
    pub reject_format: RejectFormat,
    pub read_only_handling: ReadOnlyHandling,
    pub prerequisite_policy: PrerequisitePolicy,
    pub remove_empty_files: bool,
    pub backup: bool,
    pub backup_if_mismatch: bool,
    pub backup_prefix: Option<String>,
    pub backup_suffix: Option<String>,
    /// `-o`: send patched output here instead of overwriting the target
    /// (all targets across the patch set share this one destination).
    pub output_file: Option<std::path::PathBuf>,
    /// `--posix`: narrows `guess_filepath`'s fallback ordering.
    pub strict_posix_guess: bool,
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            strip: None,
            reverse_patch: false,
            ignore_reversed: false,
            force: false,
            batch: false,
            dry_run: false,
            max_fuzz: 2,
            ignore_whitespace: false,
            define_macro: None,
            newline_output: NewlinePolicy::default(),
            reject_format: RejectFormat::default(),
            read_only_handling: ReadOnlyHandling::default(),
            prerequisite_policy: PrerequisitePolicy::default(),
            remove_empty_files: false,
            backup: false,
            backup_if_mismatch: false,
            backup_prefix: None,
            backup_suffix: None,
            output_file: None,
            strict_posix_guess: false,
            verbose: false,
        }
    }
}
