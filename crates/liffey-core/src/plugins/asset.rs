//! Static-asset passthrough plugin.
//!
//! A reference like `import logo from "./logo.svg"` was rewritten with an
//! `?import` tag by import analysis; this plugin serves that request as a
//! JS module exporting the asset's URL.

use crate::paths::{clean_url, get_short_name, is_asset_specifier, remove_import_query};
use crate::plugin::{HookResult, LoadOutput, Plugin, PluginContext};
use std::path::PathBuf;

pub struct AssetPlugin {
    root: PathBuf,
}

impl AssetPlugin {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Plugin for AssetPlugin {
    fn name(&self) -> &str {
        "liffey:asset"
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
        let cleaned = remove_import_query(clean_url(id));
        if !is_asset_specifier(cleaned) {
            return Ok(None);
        }
        let url = format!("/{}", get_short_name(cleaned, &self.root));
        let url_lit = serde_json::to_string(&url).unwrap_or_else(|_| String::from("\"\""));
        Ok(Some(LoadOutput::code(format!("export default {url_lit};"))))
    }
}
