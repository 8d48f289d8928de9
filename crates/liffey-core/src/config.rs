//! Configuration file discovery and parsing.
//!
//! Loads `liffey.config.json` from the project root:
//!
//! ```json
//! {
//!   "server": { "port": 3000, "host": "localhost", "open": false },
//!   "entry": "src/main.js"
//! }
//! ```
//!
//! CLI flags take precedence over config values; config values take
//! precedence over built-in defaults.

use crate::error::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default dev server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default application entry point, relative to the project root.
pub const DEFAULT_ENTRY: &str = "src/main.js";

/// Config file names in priority order.
const CONFIG_FILES: &[&str] = &["liffey.config.json"];

/// Configuration loaded from a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiffeyConfig {
    /// Server options.
    pub server: ServerSection,
    /// Application entry point, relative to the project root.
    pub entry: Option<String>,
}

/// Server options from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Port to listen on.
    pub port: Option<u16>,
    /// Host to bind to.
    pub host: Option<String>,
    /// Open the browser automatically.
    pub open: Option<bool>,
}

/// Find a config file in the given root directory.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.exists())
}

/// Load configuration from the project root.
///
/// If `config_path` is `Some`, that file is required to exist; otherwise the
/// file is auto-discovered and `Ok(None)` means no config file is present.
pub fn load_config(
    root: &Path,
    config_path: Option<&Path>,
) -> Result<Option<(PathBuf, LiffeyConfig)>, Error> {
    let path = match config_path {
        Some(p) => {
            let abs = if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            };
            if !abs.exists() {
                return Err(Error::other(format!(
                    "Config file not found: {}",
                    abs.display()
                )));
            }
            abs
        }
        None => match find_config_file(root) {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    let raw = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
        path: path.clone(),
        source,
    })?;
    Ok(Some((path, config)))
}
