//! Client runtime injection plugin.
//!
//! Owns the reserved internal client path: resolves and loads the embedded
//! HMR runtime, and injects its `<script type="module">` tag into the entry
//! HTML.

use crate::hmr::client_runtime;
use crate::paths::{clean_url, CLIENT_PATH};
use crate::plugin::{HookResult, LoadOutput, Plugin, PluginContext, ResolvedId};

pub struct ClientInjectPlugin {
    hmr_port: u16,
}

impl ClientInjectPlugin {
    #[must_use]
    pub fn new(hmr_port: u16) -> Self {
        Self { hmr_port }
    }
}

impl Plugin for ClientInjectPlugin {
    fn name(&self) -> &str {
        "liffey:client-inject"
    }

    fn resolve_id(
        &self,
        specifier: &str,
        _importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolvedId>> {
        if clean_url(specifier) == CLIENT_PATH {
            Ok(Some(ResolvedId::new(CLIENT_PATH)))
        } else {
            Ok(None)
        }
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
        if clean_url(id) == CLIENT_PATH {
            Ok(Some(LoadOutput::code(client_runtime(self.hmr_port))))
        } else {
            Ok(None)
        }
    }

    fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
        if html.contains(CLIENT_PATH) {
            return Ok(None);
        }
        let tag = format!("<script type=\"module\" src=\"{CLIENT_PATH}\"></script>");
        let injected = if let Some(pos) = html.find("</head>") {
            let mut out = html.to_string();
            out.insert_str(pos, &format!("  {tag}\n  "));
            out
        } else {
            format!("{tag}\n{html}")
        };
        Ok(Some(injected))
    }
}
