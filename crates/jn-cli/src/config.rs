//! Configuration loading for the `jn` runtime.
//!
//! Configuration flags lead the argument list, before the subcommand. They
//! are split off and handed to `ortho_config`; the rest goes to the clap
//! command parser.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use jn_config::{CONFIG_FILE_NAME, CONFIG_PATH_ENV, Config, HOME_ENV, default_home};
use ortho_config::OrthoConfig;
use tracing::debug;

use crate::errors::AppError;

const CONFIG_TARGET: &str = "jn_cli::config";

const CONFIG_PATH_FLAG: &str = "--config-path";
const HOME_FLAG: &str = "--home";

/// Flags consumed by the configuration loader.
///
/// Must match the fields of [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    CONFIG_PATH_FLAG,
    HOME_FLAG,
    "--project-dir",
    "--bundled-plugins",
    "--log-filter",
    "--log-format",
    "--introspect-timeout-ms",
];

pub(crate) trait ConfigLoader {
    /// Builds the configuration from the leading configuration flags.
    fn load(&self, config_arguments: Vec<OsString>) -> Result<Config, AppError>;
}

/// Loads through `ortho_config`, adding `<home>/config.toml` when present.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, config_arguments: Vec<OsString>) -> Result<Config, AppError> {
        let with_file = with_home_config_file(config_arguments, env::var_os(HOME_ENV));
        Config::load_from_iter(with_file).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// The argument list divided at the first non-configuration token.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the configuration flags and their values.
    pub(crate) config_arguments: Vec<OsString>,
    /// Program name followed by the subcommand and everything after it.
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: Vec<OsString>) -> ConfigArgumentSplit {
    let mut remaining = args.into_iter();
    let Some(program) = remaining.next() else {
        return ConfigArgumentSplit::default();
    };
    let mut config_arguments = vec![program.clone()];
    let mut command_arguments = vec![program];
    let mut expecting_value = false;
    for argument in remaining.by_ref() {
        if expecting_value {
            config_arguments.push(argument);
            expecting_value = false;
            continue;
        }
        match classify(&argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument);
                expecting_value = needs_value;
            }
            FlagAction::Stop => {
                command_arguments.push(argument);
                break;
            }
        }
    }
    command_arguments.extend(remaining);
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

/// Appends `--config-path <home>/config.toml` when no file was named and
/// that file exists.
///
/// `env_home` is the value of `JN_HOME`; a `--home` flag wins over it.
fn with_home_config_file(
    mut config_arguments: Vec<OsString>,
    env_home: Option<OsString>,
) -> Vec<OsString> {
    if flag_value(&config_arguments, CONFIG_PATH_FLAG).is_some()
        || env::var_os(CONFIG_PATH_ENV).is_some()
    {
        return config_arguments;
    }
    let home = flag_value(&config_arguments, HOME_FLAG)
        .or(env_home)
        .map_or_else(default_home, PathBuf::from);
    let file = home.join(CONFIG_FILE_NAME);
    if file.is_file() {
        debug!(target: CONFIG_TARGET, path = %file.display(), "using home configuration file");
        config_arguments.push(OsString::from(CONFIG_PATH_FLAG));
        config_arguments.push(file.into_os_string());
    }
    config_arguments
}

/// The last value given for `flag`, in either `--flag value` or
/// `--flag=value` form.
fn flag_value(arguments: &[OsString], flag: &str) -> Option<OsString> {
    let mut found = None;
    for (index, argument) in arguments.iter().enumerate() {
        let text = argument.to_string_lossy();
        if text == flag {
            found = arguments.get(index + 1).cloned();
        } else if let Some((name, value)) = text.split_once('=')
            && name == flag
        {
            found = Some(OsString::from(value));
        }
    }
    found
}
