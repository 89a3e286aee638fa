// Command-line front end for bsdelta.
//
// Subcommands: `diff` builds a patch, `patch` applies one, `info` dumps a
// patch's header and control triples, `config` prints build details.

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::compress::DEFAULT_LEVEL;
use crate::delta::{ControlTriple, PatchOptions};
use crate::engine::{DecodeOptions, EncodeOptions};
use crate::format::{self, PatchHeader};
use crate::io::{self, IoError};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Suffix-array binary delta encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "bsdelta",
    version,
    about = "Binary delta encoder/decoder (bzip2 patch container)",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a patch that turns OLD into NEW.
    Diff(DiffArgs),
    /// Apply PATCH to OLD, writing NEW.
    Patch(PatchArgs),
    /// Print a patch's header and control stream summary.
    Info(InfoArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Updated file.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Patch file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// bzip2 block size level (1-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=9), default_value_t = DEFAULT_LEVEL)]
    level: u32,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Patch file to apply.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Output file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Reject copies that reach outside the old file.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Patch file to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// List every control triple.
    #[arg(long)]
    triples: bool,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Diff,
    Patch,
    Info,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    level: u32,
    strict: bool,
    list_triples: bool,
    old_file: Option<PathBuf>,
    new_file: Option<PathBuf>,
    patch_file: Option<PathBuf>,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            level: DEFAULT_LEVEL,
            strict: false,
            list_triples: false,
            old_file: None,
            new_file: None,
            patch_file: None,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Diff(args) => Options {
            level: args.level,
            old_file: Some(args.old.clone()),
            new_file: Some(args.new.clone()),
            patch_file: Some(args.patch.clone()),
            ..Options::new(Command::Diff, &cli)
        },
        Cmd::Patch(args) => Options {
            strict: args.strict,
            old_file: Some(args.old.clone()),
            new_file: Some(args.new.clone()),
            patch_file: Some(args.patch.clone()),
            ..Options::new(Command::Patch, &cli)
        },
        Cmd::Info(args) => Options {
            list_triples: args.triples,
            patch_file: Some(args.patch.clone()),
            ..Options::new(Command::Info, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bsdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The three paths every file command needs, or an exit code.
fn paths(opts: &Options) -> Result<(&Path, &Path, &Path), i32> {
    match (&opts.old_file, &opts.new_file, &opts.patch_file) {
        (Some(old), Some(new), Some(patch)) => Ok((old.as_path(), new.as_path(), patch.as_path())),
        _ => {
            eprintln!("bsdelta: missing file arguments");
            Err(1)
        }
    }
}

fn refuse_overwrite(path: &Path, opts: &Options) -> bool {
    if !opts.force && path.exists() {
        eprintln!(
            "bsdelta: {}: file exists, use --force to overwrite",
            path.display()
        );
        return true;
    }
    false
}

fn report_error(e: &IoError) {
    eprintln!("bsdelta: {e}");
    let mut source = e.source();
    while let Some(cause) = source {
        log::debug!("caused by: {cause}");
        source = cause.source();
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("bsdelta: json: {e}"),
    }
}

fn hex_digest(digest: Option<[u8; 32]>) -> Option<String> {
    digest.map(|d| d.iter().map(|b| format!("{b:02x}")).collect())
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("bsdelta version {version} (Rust)");
    eprintln!("Licensed under the BSD 2-Clause License");

    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("PATCH_MAGIC={}", String::from_utf8_lossy(&format::PATCH_MAGIC));
    eprintln!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn cmd_diff(opts: &Options) -> i32 {
    let (old, new, patch) = match paths(opts) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if refuse_overwrite(patch, opts) {
        return 1;
    }

    let encode_opts = EncodeOptions { level: opts.level };
    let stats = match io::diff_file(old, new, patch, &encode_opts) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e);
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bsdelta: diff: old size: {}, new size: {}, patch size: {}, triples: {}",
            stats.old_size, stats.new_size, stats.patch_size, stats.triples
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "diff",
            "old_size": stats.old_size,
            "new_size": stats.new_size,
            "patch_size": stats.patch_size,
            "triples": stats.triples,
            "diff_len": stats.diff_len,
            "extra_len": stats.extra_len,
            "level": opts.level,
            "new_sha256": hex_digest(stats.new_sha256),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    let (old, new, patch) = match paths(opts) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if refuse_overwrite(new, opts) {
        return 1;
    }

    let decode_opts = DecodeOptions {
        patch: PatchOptions {
            strict_old_bounds: opts.strict,
        },
    };
    let stats = match io::patch_file(old, patch, new, &decode_opts) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e);
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bsdelta: patch: old size: {}, patch size: {}, output size: {}, triples: {}",
            stats.old_size, stats.patch_size, stats.output_size, stats.triples
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "patch",
            "old_size": stats.old_size,
            "patch_size": stats.patch_size,
            "output_size": stats.output_size,
            "triples": stats.triples,
            "strict": opts.strict,
            "output_sha256": hex_digest(stats.output_sha256),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options) -> i32 {
    let Some(path) = opts.patch_file.as_deref() else {
        eprintln!("bsdelta: info requires a patch file");
        return 1;
    };
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("bsdelta: {}: {e}", path.display());
            return 1;
        }
    };

    let (header, header_len) = match PatchHeader::decode(&bytes) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("bsdelta: invalid patch header: {e}");
            return 1;
        }
    };
    let delta = match format::deserialize(&bytes) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("bsdelta: {}: {e}", path.display());
            return 1;
        }
    };
    let summary = match delta.summary() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("bsdelta: control stream: {e}");
            return 1;
        }
    };

    println!("patch header size:       {header_len}");
    println!("compressed payload:      {}", bytes.len() - header_len);
    println!("control stream length:   {}", header.control_len);
    println!("diff stream length:      {}", header.diff_len);
    println!("extra stream length:     {}", header.extra_len);
    println!("new size:                {}", header.new_size);
    println!("control triples:         {}", summary.triples);
    println!("bytes copied:            {}", summary.copied);
    println!("bytes inserted:          {}", summary.inserted);

    if opts.list_triples {
        println!();
        println!("  Index      Copy    Insert    Offset");
        for (i, triple) in delta.triples().enumerate() {
            // The summary above already decoded the whole stream.
            let Ok(ControlTriple {
                copy_len,
                insert_len,
                offset_delta,
            }) = triple
            else {
                break;
            };
            println!("{i:>7} {copy_len:>9} {insert_len:>9} {offset_delta:>9}");
        }
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "info",
            "control_len": header.control_len,
            "diff_len": header.diff_len,
            "extra_len": header.extra_len,
            "new_size": header.new_size,
            "triples": summary.triples,
            "copied": summary.copied,
            "inserted": summary.inserted,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Diff => cmd_diff(&opts),
        Command::Patch => cmd_patch(&opts),
        Command::Info => cmd_info(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
