//! Capability headers embedded in interpreted scripts.
//!
//! Scripts declare themselves in an inline metadata block: comment lines
//! between `# /// script` and `# ///`, holding TOML once the leading `#` is
//! stripped. `jn` keys live under `[tool.jn]`:
//!
//! ```text
//! # /// script
//! # dependencies = ["openpyxl"]
//! # [tool.jn]
//! # matches = [".*\\.xlsx$"]
//! # modes = ["read"]
//! # ///
//! ```
//!
//! A script without a readable block still registers, with no patterns, so
//! it can be invoked by name.

use serde::Deserialize;
use tracing::debug;

use crate::manifest::IntrospectionRecord;

const SCRIPT_TARGET: &str = "jn_plugins::script";

const BLOCK_OPEN: &str = "# /// script";
const BLOCK_CLOSE: &str = "# ///";

/// Script file extensions recognised as interpreted plugins.
pub const SCRIPT_EXTENSIONS: [&str; 4] = ["py", "sh", "rb", "js"];

#[derive(Debug, Default, Deserialize)]
struct ScriptHeader {
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    tool: ToolTable,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    #[serde(default)]
    jn: Option<JnTable>,
}

#[derive(Debug, Default, Deserialize)]
struct JnTable {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    matches: Vec<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    modes: Option<Vec<String>>,
    #[serde(default)]
    supports_raw: bool,
    #[serde(default)]
    manages_parameters: bool,
    #[serde(default)]
    supports_container: bool,
    #[serde(default)]
    container_mode: Option<String>,
}

/// Extracts the TOML body of the first `script` metadata block.
#[must_use]
pub fn extract_block(source: &str) -> Option<String> {
    let mut lines = source.lines();
    lines.by_ref().find(|line| line.trim_end() == BLOCK_OPEN)?;

    let mut body = String::new();
    for raw in lines {
        let line = raw.trim_end();
        if line == BLOCK_CLOSE {
            return Some(body);
        }
        let content = line
            .strip_prefix("# ")
            .or_else(|| line.strip_prefix('#'))?;
        body.push_str(content);
        body.push('\n');
    }
    None
}

/// Reads the capability record declared by a script.
///
/// `label` names the script in debug logs. Missing or malformed headers
/// yield an empty record.
#[must_use]
pub fn parse_header(label: &str, source: &str) -> IntrospectionRecord {
    let Some(body) = extract_block(source) else {
        debug!(target: SCRIPT_TARGET, script = label, "no metadata block");
        return IntrospectionRecord::default();
    };
    let header: ScriptHeader = match toml::from_str(&body) {
        Ok(header) => header,
        Err(error) => {
            debug!(target: SCRIPT_TARGET, script = label, %error, "unparsable metadata block");
            return IntrospectionRecord::default();
        }
    };

    let jn = header.tool.jn.unwrap_or_default();
    IntrospectionRecord {
        name: None,
        version: jn.version,
        description: jn.description,
        matches: jn.matches,
        role: jn.role,
        modes: jn.modes,
        supports_raw: jn.supports_raw,
        manages_parameters: jn.manages_parameters,
        supports_container: jn.supports_container,
        container_mode: jn.container_mode,
        dependencies: header.dependencies,
    }
}
