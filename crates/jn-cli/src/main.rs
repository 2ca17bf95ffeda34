//! Entrypoint for the `jn` binary.
//!
//! All behaviour lives in [`jn_cli::run`]; this wrapper only binds the
//! process's standard streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    jn_cli::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
