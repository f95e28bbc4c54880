use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use patch_apply::NewlinePolicy;
use patch_driver::{Driver, DriverError, FsSink, NeverPrompt, Options, PrerequisitePolicy, ReadOnlyHandling, RejectFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NewlineArg {
    Native,
    Lf,
    Crlf,
    Keep,
}

impl From<NewlineArg> for NewlinePolicy {
    fn from(value: NewlineArg) -> Self {
        match value {
            NewlineArg::Native => NewlinePolicy::Native,
            NewlineArg::Lf => NewlinePolicy::Lf,
            NewlineArg::Crlf => NewlinePolicy::CrLf,
            NewlineArg::Keep => NewlinePolicy::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RejectFormatArg {
    Default,
    Context,
    Unified,
}

impl From<RejectFormatArg> for RejectFormat {
    fn from(value: RejectFormatArg) -> Self {
        match value {
            RejectFormatArg::Default => RejectFormat::Default,
            RejectFormatArg::Context => RejectFormat::Context,
            RejectFormatArg::Unified => RejectFormat::Unified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReadOnlyArg {
    Warn,
    Ignore,
    Fail,
}

impl From<ReadOnlyArg> for ReadOnlyHandling {
    fn from(value: ReadOnlyArg) -> Self {
        match value {
            ReadOnlyArg::Warn => ReadOnlyHandling::Warn,
            ReadOnlyArg::Ignore => ReadOnlyHandling::Ignore,
            ReadOnlyArg::Fail => ReadOnlyHandling::Fail,
        }
    }
}

/// Apply a diff to one or more files.
#[derive(Parser, Debug)]
#[command(name = "patch", version, about = "Apply a unified, context, normal or git diff")]
struct Cli {
    /// Read the patch from this file instead of standard input.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Strip NUM leading path components from file names in the patch.
    #[arg(short = 'p', long = "strip")]
    strip: Option<i32>,

    /// Maximum fuzz (ignored leading/trailing context lines) to try per hunk.
    #[arg(short = 'F', long = "fuzz", default_value_t = 2)]
    fuzz: i64,

    /// Ignore whitespace differences when matching context.
    #[arg(short = 'l', long = "ignore-whitespace")]
    ignore_whitespace: bool,

    /// Assume patches were created with old and new files swapped.
    #[arg(short = 'R', long = "reverse")]
    reverse: bool,

    /// Don't check (or correct for) a reversed or already-applied patch.
    #[arg(long = "ignore-reversed")]
    ignore_reversed: bool,

    /// Assume the patch is correct and don't prompt; implies skipping the
    /// reversed-patch check.
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Same as --force for prompts raised outside the reversed-patch check
    /// (e.g. an unverifiable prerequisite).
    #[arg(short = 't', long = "batch")]
    batch: bool,

    /// Print what would happen without changing any file.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Make merged if-then-else output, conditional on MACRO, instead of
    /// the usual two-way merge.
    #[arg(short = 'D', long = "ifdef", value_name = "MACRO")]
    ifdef: Option<String>,

    /// Force output line endings regardless of what the target file used.
    #[arg(long = "newline-output", value_enum, default_value = "keep")]
    newline_output: NewlineArg,

    /// Write .rej files in this format instead of following the patch.
    #[arg(long = "reject-format", value_enum, default_value = "default")]
    reject_format: RejectFormatArg,

    /// How to handle a target that is marked read-only.
    #[arg(long = "read-only", value_enum, default_value = "warn")]
    read_only: ReadOnlyArg,

    /// Remove output files that become empty after patching.
    #[arg(short = 'E', long = "remove-empty-files")]
    remove_empty_files: bool,

    /// Back up every file before patching, even if the patch is clean.
    #[arg(short = 'b', long = "backup")]
    backup: bool,

    /// Back up a file only if the patch doesn't apply cleanly.
    #[arg(long = "backup-if-mismatch")]
    backup_if_mismatch: bool,

    /// Prepend PREFIX to backup file names.
    #[arg(short = 'B', long = "prefix")]
    backup_prefix: Option<String>,

    /// Append SUFFIX to backup file names instead of the default `.orig`.
    #[arg(short = 'z', long = "suffix")]
    backup_suffix: Option<String>,

    /// Write all patched output here instead of overwriting each target.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Restrict target guessing to strict POSIX path ordering.
    #[arg(long = "posix")]
    posix: bool,

    /// Print the name of each file as it is patched.
    #[arg(short = 's', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,

    /// Print extra detail about hunk offsets and fuzz.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    process::exit(run(cli).unwrap_or_else(|err| {
        eprintln!("patch: {err:#}");
        2
    }));
}

fn run(cli: Cli) -> Result<i32> {
    let data = read_patch_input(cli.input.as_deref())?;
    let patches = patch_parser::parse(&data).map_err(|e| anyhow::anyhow!("{e}"))?;

    if patches.is_empty() {
        eprintln!("patch: **** Only garbage was found in the patch input.");
        return Ok(2);
    }

    let prerequisite_policy = if cli.force {
        PrerequisitePolicy::Force
    } else if cli.batch {
        PrerequisitePolicy::Batch
    } else {
        PrerequisitePolicy::Ask
    };

    let options = Options {
        strip: cli.strip,
        reverse_patch: cli.reverse,
        ignore_reversed: cli.ignore_reversed,
        force: cli.force,
        batch: cli.batch,
        dry_run: cli.dry_run,
        max_fuzz: cli.fuzz,
        ignore_whitespace: cli.ignore_whitespace,
        define_macro: cli.ifdef,
        newline_output: cli.newline_output.into(),
        reject_format: cli.reject_format.into(),
        read_only_handling: cli.read_only.into(),
        prerequisite_policy,
        remove_empty_files: cli.remove_empty_files,
        backup: cli.backup,
        backup_if_mismatch: cli.backup_if_mismatch,
        backup_prefix: cli.backup_prefix,
        backup_suffix: cli.backup_suffix,
        output_file: cli.output,
        strict_posix_guess: cli.posix,
        verbose: cli.verbose,
    };

    let mut sink = FsSink;
    let mut driver = Driver::new(options, &mut sink);
    let mut prompter = NeverPrompt;

    let summary = match driver.run(&patches, &mut prompter) {
        Ok(summary) => summary,
        Err(DriverError::Parse(e)) => {
            eprintln!("patch: **** {e}");
            return Ok(2);
        }
        Err(DriverError::PolicyAbort(msg)) => {
            eprintln!("patch: **** {msg}");
            return Ok(2);
        }
        Err(DriverError::Io(e)) => {
            eprintln!("patch: **** {e}");
            return Ok(2);
        }
    };

    for outcome in &summary.outcomes {
        if !cli.quiet {
            if let Some(path) = &outcome.path {
                if let Some(reason) = &outcome.skipped {
                    eprintln!("patch: **** {}: {reason}", path.display());
                } else {
                    println!("patching file {}", path.display());
                }
            }
        }
        for message in &outcome.messages {
            if cli.verbose || message.contains("FAILED") || message.contains("failed") {
                println!("{message}");
            }
        }
    }

    if summary.all_clean() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn read_patch_input(path: Option<&std::path::Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("can't open patch file {}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).context("reading patch from standard input")?;
            Ok(buf)
        }
    }
}
