//! Command-line definitions for `jn`.

use clap::{Parser, Subcommand};

use crate::commands::head::DEFAULT_LINES;

/// Streams records between files, URLs and services through plugin
/// pipelines.
///
/// Configuration flags (`--home`, `--project-dir`, `--bundled-plugins`,
/// `--log-filter`, `--log-format`, `--introspect-timeout-ms`,
/// `--config-path`) go before the subcommand; each also reads its `JN_*`
/// variable.
#[derive(Debug, Parser)]
#[command(name = "jn", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Reads an address and writes NDJSON to stdout.
    Cat {
        /// Source address, for example `data.csv` or `-~csv`.
        address: String,
        /// Arguments after `--`, handed to the selected handler.
        #[arg(last = true, value_name = "ARG")]
        args: Vec<String>,
    },
    /// Writes NDJSON from stdin to an address.
    Put {
        /// Destination address.
        address: String,
        /// Arguments after `--`, handed to the selected handler.
        #[arg(last = true, value_name = "ARG")]
        args: Vec<String>,
    },
    /// Reads one address, applies filters and writes another.
    Run {
        /// Source address.
        input: String,
        /// Destination address.
        output: String,
        /// Filter expression applied between read and write; repeatable.
        #[arg(long = "filter", value_name = "EXPR")]
        filters: Vec<String>,
    },
    /// Applies one filter expression to NDJSON on stdin.
    Filter {
        /// Filter expression.
        expression: String,
    },
    /// Prints the first records of stdin or of an address.
    Head {
        /// Number of records to keep.
        #[arg(short = 'n', long, value_name = "N", default_value_t = DEFAULT_LINES)]
        lines: u64,
        /// Source address; stdin when omitted.
        address: Option<String>,
    },
    /// Prints the last records of stdin or of an address.
    Tail {
        /// Number of records to keep.
        #[arg(value_name = "N", default_value_t = DEFAULT_LINES)]
        lines: u64,
        /// Source address; stdin when omitted.
        address: Option<String>,
    },
    /// Inspects and invokes installed plugins.
    Plugin {
        #[command(subcommand)]
        action: PluginAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum PluginAction {
    /// Lists every discovered plugin.
    List {
        /// Print one JSON object per plugin instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Shows the full capability record of one plugin.
    Info {
        /// Plugin name, with or without the trailing `_`.
        name: String,
    },
    /// Runs one plugin directly on the real stdin and stdout.
    ///
    /// Exits with the plugin's own status.
    Call {
        /// Plugin name, with or without the trailing `_`.
        name: String,
        /// Arguments handed to the plugin unchanged.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARG")]
        args: Vec<String>,
    },
}
