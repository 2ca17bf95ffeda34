//! Turns resolved addresses into pipelines.
//!
//! Reading produces NDJSON on the pipeline's output; writing consumes
//! NDJSON on its input. The planner decides which handlers run, in which
//! mode, with which arguments, and what the first and last stage are bound
//! to:
//!
//! | address     | read source       | write sink           |
//! |-------------|-------------------|----------------------|
//! | standard    | stdin             | stdout               |
//! | local file  | the opened file   | the created file     |
//! | remote      | nothing (URL arg) | stdout (URL arg)     |
//! | profile     | nothing (ref arg) | stdout (ref arg)     |
//! | glob        | nothing (glob arg)| rejected             |
//!
//! Standard streams without an explicit format need no handler at all and
//! plan to a passthrough.

use jn_address::{Address, AddressKind};
use jn_plugins::{PluginError, PluginMetadata, PluginMode, PluginRegistry, PluginRole};
use tracing::debug;

use crate::error::PipelineError;
use crate::stage::{Pipeline, PipelineStage, Sink, Source, StageMode};

const PLANNER_TARGET: &str = "jn_pipeline::planner";

/// Name of the filter plugin that evaluates `--filter` expressions.
pub const FILTER_PLUGIN: &str = "jq_";

/// Builds pipelines from addresses using a registry.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> Planner<'a> {
    /// Creates a planner over `registry`.
    #[must_use]
    pub const fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    /// Plans reading `address` into NDJSON.
    ///
    /// `raw_args` are the user's trailing arguments, given to the handler
    /// selected for the address.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Plugin`] when no handler fits and
    /// [`PipelineError::InvalidArgument`] when `raw_args` cannot be passed
    /// on.
    pub fn read(&self, address: &Address, raw_args: &[String]) -> Result<Pipeline, PipelineError> {
        let pipeline = match address.kind() {
            AddressKind::StdStream if address.explicit_format().is_none() => Pipeline::default(),
            AddressKind::StdStream => {
                let stage = self.address_stage(address, Direction::Read, raw_args, None)?;
                Pipeline::new(Source::Inherit, vec![stage], Sink::Inherit)
            }
            AddressKind::LocalFile => {
                let mut stages = self.decompression(address)?;
                stages.push(self.address_stage(address, Direction::Read, raw_args, None)?);
                Pipeline::new(
                    Source::File(address.raw_path().into()),
                    stages,
                    Sink::Inherit,
                )
            }
            AddressKind::Remote => self.read_remote(address, raw_args)?,
            AddressKind::Profile | AddressKind::Glob => {
                let stage = self.address_stage(
                    address,
                    Direction::Read,
                    raw_args,
                    Some(address.raw_path()),
                )?;
                Pipeline::new(Source::Null, vec![stage], Sink::Inherit)
            }
        };
        debug!(target: PLANNER_TARGET, address = %address, %pipeline, "planned read");
        Ok(pipeline)
    }

    /// Plans writing NDJSON to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Address`] for glob outputs,
    /// [`PipelineError::CompressedOutput`] for compressed paths, and the
    /// errors of [`Planner::read`].
    pub fn write(&self, address: &Address, raw_args: &[String]) -> Result<Pipeline, PipelineError> {
        address.ensure_writable()?;
        if address.compression().is_some() {
            return Err(PipelineError::CompressedOutput {
                address: address.raw().to_owned(),
            });
        }
        let pipeline = match address.kind() {
            AddressKind::StdStream if address.explicit_format().is_none() => Pipeline::default(),
            AddressKind::StdStream => {
                let stage = self.address_stage(address, Direction::Write, raw_args, None)?;
                Pipeline::new(Source::Inherit, vec![stage], Sink::Inherit)
            }
            AddressKind::LocalFile => {
                let stage = self.address_stage(address, Direction::Write, raw_args, None)?;
                Pipeline::new(
                    Source::Inherit,
                    vec![stage],
                    Sink::File(address.raw_path().into()),
                )
            }
            AddressKind::Remote | AddressKind::Profile | AddressKind::Glob => {
                let stage = self.address_stage(
                    address,
                    Direction::Write,
                    raw_args,
                    Some(address.raw_path()),
                )?;
                Pipeline::new(Source::Inherit, vec![stage], Sink::Inherit)
            }
        };
        debug!(target: PLANNER_TARGET, address = %address, %pipeline, "planned write");
        Ok(pipeline)
    }

    /// Plans one filter stage evaluating `expression`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Plugin`] when the filter plugin is not
    /// installed.
    pub fn filter(&self, expression: &str) -> Result<PipelineStage, PipelineError> {
        let plugin = self.registry.require(FILTER_PLUGIN)?;
        Ok(PipelineStage::for_plugin(plugin, StageMode::Filter).arg(expression))
    }

    /// Plans `input`, then each filter in order, then `output`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Planner::read`], [`Planner::filter`] and
    /// [`Planner::write`].
    pub fn run(
        &self,
        input: &Address,
        filters: &[String],
        output: &Address,
    ) -> Result<Pipeline, PipelineError> {
        let read = self.read(input, &[])?;
        let filter_stages = filters
            .iter()
            .map(|expression| self.filter(expression))
            .collect::<Result<Vec<_>, _>>()?;
        let write = self.write(output, &[])?;
        let filtered = Pipeline::new(Source::Inherit, filter_stages, Sink::Inherit);
        Ok(read.then(filtered).then(write))
    }

    fn read_remote(&self, address: &Address, raw_args: &[String]) -> Result<Pipeline, PipelineError> {
        let locator = address.raw_path();
        let protocol = self
            .registry
            .match_address(address, Some(PluginRole::Protocol), PluginMode::Raw)
            .ok();
        let format = address.effective_format().and_then(|name| {
            self.registry.get(name).filter(|plugin| {
                plugin.role() == PluginRole::Format && plugin.supports(PluginMode::Read)
            })
        });

        let stages = match (protocol, format) {
            (Some(fetcher), Some(parser)) => {
                let fetch = PipelineStage::for_plugin(fetcher, StageMode::Raw).arg(locator);
                let mut chain = vec![fetch];
                chain.extend(self.decompression(address)?);
                chain.push(configured_stage(parser, StageMode::Read, address, raw_args, None)?);
                chain
            }
            _ => vec![self.address_stage(address, Direction::Read, raw_args, Some(locator))?],
        };
        Ok(Pipeline::new(Source::Null, stages, Sink::Inherit))
    }

    /// The decompression stage for a compressed address, if any.
    fn decompression(&self, address: &Address) -> Result<Vec<PipelineStage>, PipelineError> {
        let Some(codec) = address.compression() else {
            return Ok(Vec::new());
        };
        let plugin = self.registry.require(codec.extension())?;
        if !plugin.supports(PluginMode::Raw) {
            return Err(PluginError::UnsupportedMode {
                name: plugin.name().to_owned(),
                mode: PluginMode::Raw,
            }
            .into());
        }
        Ok(vec![PipelineStage::for_plugin(plugin, StageMode::Raw)])
    }

    /// The stage for the handler selected by `address` itself.
    fn address_stage(
        &self,
        address: &Address,
        direction: Direction,
        raw_args: &[String],
        positional: Option<&str>,
    ) -> Result<PipelineStage, PipelineError> {
        let plugin = self
            .registry
            .match_address(address, None, direction.plugin_mode())
            .map_err(|error| unmatched(address, error))?;
        configured_stage(plugin, direction.stage_mode(), address, raw_args, positional)
    }
}

/// A local file no handler claims fails on its format when it has none.
fn unmatched(address: &Address, error: PluginError) -> PipelineError {
    match (&error, address.kind(), address.require_format()) {
        (PluginError::NotFound { .. }, AddressKind::LocalFile, Err(unknown)) => unknown.into(),
        _ => error.into(),
    }
}

/// Builds a stage with synthesised flags or the user's raw arguments.
fn configured_stage(
    plugin: &PluginMetadata,
    mode: StageMode,
    address: &Address,
    raw_args: &[String],
    positional: Option<&str>,
) -> Result<PipelineStage, PipelineError> {
    let base = PipelineStage::for_plugin(plugin, mode);
    let stage = if plugin.manages_own_parameters() {
        base.args(raw_args.iter().cloned())
    } else {
        validate_flags(plugin, raw_args)?;
        base.args(
            address
                .format_params()
                .iter()
                .map(|(key, value)| format!("--{key}={value}")),
        )
        .args(raw_args.iter().cloned())
    };
    Ok(stage.args(positional))
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Read,
    Write,
}

impl Direction {
    const fn stage_mode(self) -> StageMode {
        match self {
            Self::Read => StageMode::Read,
            Self::Write => StageMode::Write,
        }
    }

    const fn plugin_mode(self) -> PluginMode {
        match self {
            Self::Read => PluginMode::Read,
            Self::Write => PluginMode::Write,
        }
    }
}

/// Accepts only `--name` and `--name=value` arguments.
fn validate_flags(plugin: &PluginMetadata, raw_args: &[String]) -> Result<(), PipelineError> {
    for argument in raw_args {
        let name = argument
            .strip_prefix("--")
            .map(|flag| flag.split_once('=').map_or(flag, |(name, _)| name))
            .unwrap_or_default();
        let well_formed = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(PipelineError::InvalidArgument {
                plugin: plugin.name().to_owned(),
                argument: argument.clone(),
            });
        }
    }
    Ok(())
}
