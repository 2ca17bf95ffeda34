//! Binary entrypoint for the JSON Lines format handler.

use std::io::{self, BufReader};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use jn_handlers::{LoggingArgs, finish, jsonl, print_capabilities};
use jn_stream::Flow;

const NAME: &str = "jsonl_";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Read,
    Write,
}

/// Reads and writes newline-delimited JSON.
#[derive(Debug, Parser)]
#[command(name = NAME, version)]
struct Args {
    /// Print the handler's capabilities as JSON and exit.
    #[arg(long)]
    jn_meta: bool,

    /// Direction of the run.
    #[arg(long, value_enum, required_unless_present = "jn_meta")]
    mode: Option<Mode>,

    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = args.logging.initialise().and_then(|_telemetry| {
        let output = io::stdout().lock();
        if args.jn_meta {
            return print_capabilities(&jsonl::CAPABILITIES, output).map(|()| Flow::Continue);
        }
        let input = BufReader::new(io::stdin().lock());
        // clap guarantees a mode once --jn-meta is absent.
        match args.mode {
            Some(Mode::Write) => jsonl::write(input, output),
            Some(Mode::Read) | None => jsonl::read(input, output),
        }
    });
    finish(NAME, result)
}
