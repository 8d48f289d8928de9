//! Compiler adapter plugin.
//!
//! Loads script sources from disk and runs them through a
//! [`TranspileBackend`]. The actual source-to-target transformation is an
//! external collaborator; [`PassthroughBackend`] serves standard ES modules
//! unchanged, and a TypeScript/JSX-capable backend plugs in behind the same
//! trait.

use crate::paths::{clean_url, is_script_request};
use crate::plugin::{HookResult, LoadOutput, Plugin, PluginContext, PluginError, TransformResult};
use std::path::Path;

/// Error from a transpile backend. Fatal for the current request.
#[derive(Debug)]
pub struct TranspileError {
    pub message: String,
}

impl TranspileError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TranspileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TranspileError {}

/// Seam for the external compiler.
pub trait TranspileBackend: Send + Sync {
    /// Backend name for error messages.
    fn name(&self) -> &'static str;

    /// Compile `source` (identified by `id`) to standard browser-ready ESM.
    fn transpile(&self, source: &str, id: &str) -> Result<String, TranspileError>;
}

/// Identity backend: the input is already standard ESM.
pub struct PassthroughBackend;

impl TranspileBackend for PassthroughBackend {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn transpile(&self, source: &str, _id: &str) -> Result<String, TranspileError> {
        Ok(source.to_string())
    }
}

pub struct TranspilePlugin {
    backend: Box<dyn TranspileBackend>,
}

impl TranspilePlugin {
    #[must_use]
    pub fn new(backend: Box<dyn TranspileBackend>) -> Self {
        Self { backend }
    }
}

impl Plugin for TranspilePlugin {
    fn name(&self) -> &str {
        "liffey:transpile"
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
        if !is_script_request(id) || id.starts_with('\0') {
            return Ok(None);
        }
        // An unreadable file is a pass-through "not found", not a failure
        match liffey_util::fs::read_to_string_lossy(Path::new(clean_url(id))) {
            Ok(code) => Ok(Some(LoadOutput::code(code))),
            Err(_) => Ok(None),
        }
    }

    fn transform(
        &self,
        code: &str,
        id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        if !is_script_request(id) || id.starts_with('\0') {
            return Ok(None);
        }
        let compiled = self
            .backend
            .transpile(code, id)
            .map_err(|e| PluginError::new(self.name(), "transform", e.message))?;
        Ok(Some(TransformResult::code(compiled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginContainer;
    use tempfile::tempdir;

    #[test]
    fn test_load_reads_script_sources() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("main.js");
        std::fs::write(&file, "export const x = 1;").unwrap();

        let container = PluginContainer::new(vec![Box::new(TranspilePlugin::new(Box::new(
            PassthroughBackend,
        )))]);
        let loaded = container
            .load(&file.display().to_string())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.code, "export const x = 1;");
    }

    #[test]
    fn test_load_missing_file_passes_through() {
        let container = PluginContainer::new(vec![Box::new(TranspilePlugin::new(Box::new(
            PassthroughBackend,
        )))]);
        assert!(container.load("/nope/missing.js").unwrap().is_none());
    }

    #[test]
    fn test_transform_passthrough() {
        let container = PluginContainer::new(vec![Box::new(TranspilePlugin::new(Box::new(
            PassthroughBackend,
        )))]);
        let out = container
            .transform("export const x = 1;", "/src/main.js")
            .unwrap();
        assert_eq!(out.code, "export const x = 1;");
    }

    #[test]
    fn test_backend_error_is_fatal() {
        struct Failing;
        impl TranspileBackend for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn transpile(&self, _source: &str, _id: &str) -> Result<String, TranspileError> {
                Err(TranspileError::new("syntax error"))
            }
        }

        let container =
            PluginContainer::new(vec![Box::new(TranspilePlugin::new(Box::new(Failing)))]);
        let err = container.transform("x", "/src/main.js").unwrap_err();
        assert!(err.message.contains("syntax error"));
    }

    #[test]
    fn test_non_script_declined() {
        let container = PluginContainer::new(vec![Box::new(TranspilePlugin::new(Box::new(
            PassthroughBackend,
        )))]);
        assert!(container.load("/src/style.css").unwrap().is_none());
    }
}
