//! Binary entrypoint for the glob protocol handler.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use jn_handlers::glob::{self, GlobOptions};
use jn_handlers::{LoggingArgs, finish, print_capabilities};
use jn_stream::Flow;

const NAME: &str = "glob_";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Read,
}

/// Reads every file matching a glob pattern as NDJSON.
#[derive(Debug, Parser)]
#[command(name = NAME, version)]
struct Args {
    /// Print the handler's capabilities as JSON and exit.
    #[arg(long)]
    jn_meta: bool,

    /// Direction of the run; only `read` is supported.
    #[arg(long, value_enum, default_value = "read")]
    mode: Mode,

    /// Pattern such as `logs/**/*.jsonl`, optionally prefixed `glob://`.
    #[arg(required_unless_present = "jn_meta")]
    pattern: Option<String>,

    /// Directory relative patterns are expanded from.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Include hidden files and directories.
    #[arg(long)]
    hidden: bool,

    /// Stop after this many records.
    #[arg(long)]
    limit: Option<u64>,

    /// Stop after this many files.
    #[arg(long)]
    file_limit: Option<u64>,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = args.logging.initialise().and_then(|_telemetry| {
        let output = io::stdout().lock();
        if args.jn_meta {
            return print_capabilities(&glob::CAPABILITIES, output).map(|()| Flow::Continue);
        }
        let Mode::Read = args.mode;
        let options = GlobOptions {
            // clap guarantees a pattern once --jn-meta is absent.
            pattern: args.pattern.clone().unwrap_or_default(),
            root: args.root.clone(),
            hidden: args.hidden,
            limit: args.limit,
            file_limit: args.file_limit,
        };
        glob::run(&options, output)
    });
    finish(NAME, result)
}
