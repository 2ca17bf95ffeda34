//! `jn plugin list`, `jn plugin info` and `jn plugin call`.

use std::io::{BufRead, Write};

use jn_pipeline::{Pipeline, PipelineStage, Sink, Source, StageMode};
use jn_plugins::PluginMetadata;
use tracing::debug;

use super::Session;
use crate::cli::PluginAction;
use crate::errors::AppError;

const PLUGIN_TARGET: &str = "jn_cli::commands::plugin";

pub(super) fn plugin<R: BufRead, W: Write>(
    session: &Session,
    action: &PluginAction,
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    match action {
        PluginAction::List { json: true } => {
            for plugin in session.registry() {
                serde_json::to_writer(&mut *stdout, plugin).map_err(AppError::Serialise)?;
                writeln!(stdout)?;
            }
        }
        PluginAction::List { json: false } => {
            for plugin in session.registry() {
                writeln!(stdout, "{}", summary_line(plugin))?;
            }
        }
        PluginAction::Info { name } => {
            let plugin = session.registry().require(name)?;
            serde_json::to_writer_pretty(&mut *stdout, plugin).map_err(AppError::Serialise)?;
            writeln!(stdout)?;
        }
        PluginAction::Call { name, args } => return call(session, name, args, stdin, stdout),
    }
    stdout.flush()?;
    Ok(())
}

/// Runs `name` as a lone stage with no mode flag, so the plugin sees exactly
/// `args`. A failing status surfaces as [`AppError::Stage`].
fn call<R: BufRead, W: Write>(
    session: &Session,
    name: &str,
    args: &[String],
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let plugin = session.registry().require(name)?;
    debug!(target: PLUGIN_TARGET, plugin = plugin.name(), args = args.len(), "calling plugin");
    let stage = PipelineStage::for_plugin(plugin, StageMode::Filter).args(args);
    session.run_pipeline(
        Pipeline::new(Source::Inherit, vec![stage], Sink::Inherit),
        stdin,
        stdout,
    )
}

/// One table row: name, role, kind, scope, modes and location.
fn summary_line(plugin: &PluginMetadata) -> String {
    let modes = plugin
        .supported_modes()
        .iter()
        .map(|mode| mode.as_ref())
        .collect::<Vec<&str>>()
        .join(",");
    let role = plugin.role();
    let role: &str = role.as_ref();
    let kind = plugin.kind();
    let kind: &str = kind.as_ref();
    format!(
        "{:<16} {:<11} {:<6} {:<8} {:<16} {}",
        plugin.name(),
        role,
        kind,
        plugin.scope().as_str(),
        if modes.is_empty() { "-" } else { &modes },
        plugin.location().display()
    )
}
