//! Binary entrypoint for the head filter.

use std::io::{self, BufReader};
use std::process::ExitCode;

use clap::Parser;
use jn_handlers::{LoggingArgs, finish, head, print_capabilities};
use jn_stream::Flow;

const NAME: &str = "head_";

/// Passes through the first lines of its input.
#[derive(Debug, Parser)]
#[command(name = NAME, version)]
struct Args {
    /// Print the handler's capabilities as JSON and exit.
    #[arg(long)]
    jn_meta: bool,

    /// Number of lines to keep.
    #[arg(short = 'n', long, value_name = "N", default_value_t = head::DEFAULT_LINES)]
    lines: u64,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = args.logging.initialise().and_then(|_telemetry| {
        let output = io::stdout().lock();
        if args.jn_meta {
            return print_capabilities(&head::CAPABILITIES, output).map(|()| Flow::Continue);
        }
        head::run(BufReader::new(io::stdin().lock()), output, args.lines)
    });
    finish(NAME, result)
}
