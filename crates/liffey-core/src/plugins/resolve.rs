//! Path resolution plugin.
//!
//! Maps request URLs and import specifiers onto real filesystem paths:
//! absolute URLs are probed against the project root, relative specifiers
//! against their importer's directory, with extension and index-file
//! guessing for extension-less specifiers.

use crate::paths::{
    clean_url, is_internal_request, normalize_path, remove_import_query, DEFAULT_EXTENSIONS,
};
use crate::plugin::{HookResult, Plugin, PluginContext, PluginError, ResolvedId};
use std::path::{Path, PathBuf};

const INDEX_FILES: &[&str] = &["index.js", "index.mjs", "index.jsx", "index.ts", "index.tsx"];

/// Probe a candidate path: exact file, then guessed extensions, then
/// directory index files.
pub(crate) fn probe(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    for ext in DEFAULT_EXTENSIONS {
        let with_ext = PathBuf::from(format!("{}{ext}", path.display()));
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    if path.is_dir() {
        for index in INDEX_FILES {
            let index_path = path.join(index);
            if index_path.is_file() {
                return Some(index_path);
            }
        }
    }
    None
}

pub struct ResolvePlugin {
    root: PathBuf,
}

impl ResolvePlugin {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Plugin for ResolvePlugin {
    fn name(&self) -> &str {
        "liffey:resolve"
    }

    fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolvedId>> {
        let id = remove_import_query(clean_url(specifier));
        if is_internal_request(id) {
            return Ok(None);
        }

        if id.starts_with('/') {
            // Absolute: try as a real filesystem path, then relative to the
            // project root (the /src/main.js case).
            if let Some(found) = probe(Path::new(id)) {
                return Ok(Some(ResolvedId::new(found.display().to_string())));
            }
            let rooted = self.root.join(id.trim_start_matches('/'));
            if let Some(found) = probe(&normalize_path(&rooted)) {
                return Ok(Some(ResolvedId::new(found.display().to_string())));
            }
            return Ok(None);
        }

        if id.starts_with('.') {
            let Some(importer) = importer else {
                return Err(PluginError::new(
                    self.name(),
                    "resolve_id",
                    format!("relative specifier {id:?} has no importer"),
                ));
            };
            let base = Path::new(clean_url(importer))
                .parent()
                .unwrap_or(Path::new("/"));
            let candidate = normalize_path(&base.join(id));
            if let Some(found) = probe(&candidate) {
                return Ok(Some(ResolvedId::new(found.display().to_string())));
            }
            return Ok(None);
        }

        // Bare specifiers are someone else's concern
        Ok(None)
    }
}
