//! Import analysis and specifier rewriting.
//!
//! Runs after the compile stage has produced standard import/export syntax.
//! Each specifier is classified and rewritten in place using the byte
//! offsets captured by the lexical scan:
//!
//! - bare package specifiers point at the pre-bundled artifact path
//! - relative and absolute specifiers resolve through the plugin pipeline
//!   and carry a `?t=` cache-busting query when the target is stale
//! - internal runtime specifiers are left alone and never become edges
//!
//! Project-source modules get a runtime-registration prologue binding
//! `import.meta.hot` before any other statement, and the module's full edge
//! set replaces its previous edges in the graph, including the empty set
//! for a module with no imports left.

use crate::graph::ModuleGraph;
use crate::imports::{parse_import_spans, SpanEdits};
use crate::paths::{
    clean_url, get_short_name, is_asset_specifier, is_bare_specifier, is_internal_request,
    is_script_request, normalize_path, package_name_from_specifier, CLIENT_PATH,
};
use crate::plugin::{HookResult, Plugin, PluginContext, TransformResult};
use crate::prebundle::PreBundler;
use crate::server::ServerContext;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

struct AnalysisState {
    graph: Arc<ModuleGraph>,
    root: PathBuf,
}

#[derive(Default)]
pub struct ImportAnalysisPlugin {
    state: OnceLock<AnalysisState>,
}

impl ImportAnalysisPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for ImportAnalysisPlugin {
    fn name(&self) -> &str {
        "liffey:import-analysis"
    }

    fn configure_server(&self, server: &ServerContext) -> HookResult<()> {
        let _ = self.state.set(AnalysisState {
            graph: Arc::clone(&server.graph),
            root: server.root.clone(),
        });
        Ok(())
    }

    fn transform(
        &self,
        code: &str,
        id: &str,
        ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        if !is_script_request(id) || is_internal_request(id) {
            return Ok(None);
        }
        let Some(state) = self.state.get() else {
            return Ok(None);
        };

        let spans = parse_import_spans(code);
        let mut edits = SpanEdits::new();
        let mut imported = Vec::new();

        for span in &spans {
            let specifier = span.specifier.as_str();

            // The injected runtime never participates in the graph
            if is_internal_request(specifier) {
                continue;
            }

            if is_asset_specifier(specifier) {
                // Tag asset references so static fallback won't double-serve
                let abs = if specifier.starts_with('.') {
                    let dir = Path::new(clean_url(id)).parent().unwrap_or(Path::new("/"));
                    normalize_path(&dir.join(specifier))
                } else {
                    normalize_path(&state.root.join(specifier.trim_start_matches('/')))
                };
                let url = format!(
                    "/{}?import",
                    get_short_name(&abs.display().to_string(), &state.root)
                );
                edits.overwrite(span.start, span.end, url);
                continue;
            }

            if is_bare_specifier(specifier) {
                let pkg = package_name_from_specifier(specifier);
                let url = PreBundler::artifact_url(&pkg);
                edits.overwrite(span.start, span.end, url.clone());
                imported.push(url);
                continue;
            }

            if specifier.starts_with('.') || specifier.starts_with('/') {
                // Delegate to the rest of the pipeline; a failed resolution
                // leaves the specifier unmodified.
                if let Some(resolved) = ctx.resolve(specifier, Some(id))? {
                    let cleaned = clean_url(&resolved.id).to_string();
                    let mut url = format!("/{}", get_short_name(&cleaned, &state.root));
                    if let Some(module) = state.graph.module_by_id(&cleaned) {
                        let timestamp = state.graph.last_invalidation(module);
                        if timestamp > 0 {
                            url.push_str(&format!("?t={timestamp}"));
                        }
                    }
                    edits.overwrite(span.start, span.end, url.clone());
                    imported.push(url);
                }
            }
        }

        let module = match state.graph.module_by_id(clean_url(id)) {
            Some(module) => module,
            None => {
                let url = format!("/{}", get_short_name(clean_url(id), &state.root));
                state.graph.ensure_entry_from_url(&url)
            }
        };

        // Pre-bundled dependency artifacts don't get a hot context
        if !id.contains("node_modules") {
            let owner = serde_json::to_string(&state.graph.url(module))
                .unwrap_or_else(|_| String::from("\"\""));
            edits.prepend(format!(
                "import {{ createHotContext as __liffey__createHotContext }} from \"{CLIENT_PATH}\";\n\
                 import.meta.hot = __liffey__createHotContext({owner});\n"
            ));
        }

        state.graph.update_module_imports(module, &imported);

        Ok(Some(TransformResult {
            code: edits.apply(code),
            map: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::resolve::ResolvePlugin;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        server: ServerContext,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/main.js"), "").unwrap();
        std::fs::write(root.join("src/local.js"), "export const y = 1;").unwrap();
        std::fs::write(root.join("src/logo.svg"), "<svg/>").unwrap();

        let server = ServerContext::new(
            root.clone(),
            vec![
                Box::new(ResolvePlugin::new(root.clone())),
                Box::new(ImportAnalysisPlugin::new()),
            ],
            3001,
        )
        .unwrap();
        Fixture {
            _dir: dir,
            root,
            server,
        }
    }

    fn main_id(f: &Fixture) -> String {
        f.root.join("src/main.js").display().to_string()
    }

    #[test]
    fn test_rewrite_bare_and_relative() {
        let f = fixture();
        let id = main_id(&f);
        let module = f.server.graph.ensure_entry_from_url("/src/main.js");

        let code = "import x from \"pkg\"; import y from \"./local\";";
        let out = f.server.container.transform(code, &id).unwrap();

        assert!(out.code.contains("from \"/node_modules/.liffey/pkg.js\""));
        assert!(out.code.contains("from \"/src/local.js\""));

        // The edge set is exactly {artifact, resolved local}
        let edges = f.server.graph.imported_modules(module);
        assert_eq!(edges.len(), 2);
        let urls: Vec<String> = edges.iter().map(|&m| f.server.graph.url(m)).collect();
        assert!(urls.contains(&"/node_modules/.liffey/pkg.js".to_string()));
        assert!(urls.contains(&"/src/local.js".to_string()));
    }

    #[test]
    fn test_unrelated_substring_untouched() {
        let f = fixture();
        let id = main_id(&f);
        f.server.graph.ensure_entry_from_url("/src/main.js");

        let code = "import x from \"pkg\";\nconst s = \"pkg\";\nconst t = \"./local\";";
        let out = f.server.container.transform(code, &id).unwrap();

        assert!(out.code.contains("const s = \"pkg\";"));
        assert!(out.code.contains("const t = \"./local\";"));
    }

    #[test]
    fn test_cache_busting_timestamp() {
        let f = fixture();
        let id = main_id(&f);
        f.server.graph.ensure_entry_from_url("/src/main.js");

        let code = "import y from \"./local\";";

        // Before any invalidation: no query parameter
        let out = f.server.container.transform(code, &id).unwrap();
        assert!(out.code.contains("from \"/src/local.js\""));
        assert!(!out.code.contains("?t="));

        // After invalidating the target, the rewrite carries its timestamp
        let local_id = f.root.join("src/local.js").display().to_string();
        f.server.graph.invalidate(&local_id);
        let local = f.server.graph.module_by_id(&local_id).unwrap();
        let timestamp = f.server.graph.last_invalidation(local);
        assert!(timestamp > 0);

        let out = f.server.container.transform(code, &id).unwrap();
        assert!(out
            .code
            .contains(&format!("from \"/src/local.js?t={timestamp}\"")));
    }

    #[test]
    fn test_runtime_prologue_binds_hot_context() {
        let f = fixture();
        let id = main_id(&f);
        f.server.graph.ensure_entry_from_url("/src/main.js");

        let out = f.server.container.transform("console.log(1);", &id).unwrap();
        assert!(out.code.starts_with("import { createHotContext"));
        assert!(out
            .code
            .contains("import.meta.hot = __liffey__createHotContext(\"/src/main.js\")"));
        // Prologue runs before the original first statement
        let prologue_end = out.code.find("console.log(1);").unwrap();
        assert!(out.code[..prologue_end].contains("import.meta.hot"));
    }

    #[test]
    fn test_no_prologue_for_prebundled_artifact() {
        let f = fixture();
        let deps = f.root.join("node_modules/.liffey");
        std::fs::create_dir_all(&deps).unwrap();
        let artifact = deps.join("pkg.js");
        std::fs::write(&artifact, "export default 1;").unwrap();
        let id = artifact.display().to_string();
        f.server
            .graph
            .ensure_entry_from_url("/node_modules/.liffey/pkg.js");

        let out = f.server.container.transform("export default 1;", &id).unwrap();
        assert!(!out.code.contains("createHotContext"));
    }

    #[test]
    fn test_internal_specifier_untouched_and_untracked() {
        let f = fixture();
        let id = main_id(&f);
        let module = f.server.graph.ensure_entry_from_url("/src/main.js");

        let code = format!("import {{ createHotContext }} from \"{CLIENT_PATH}\";");
        let out = f.server.container.transform(&code, &id).unwrap();
        assert!(out.code.contains(&format!("from \"{CLIENT_PATH}\"")));
        assert!(f.server.graph.imported_modules(module).is_empty());
    }

    #[test]
    fn test_asset_import_tagged() {
        let f = fixture();
        let id = main_id(&f);
        f.server.graph.ensure_entry_from_url("/src/main.js");

        let module = f.server.graph.module_by_url("/src/main.js").unwrap();
        let code = "import logo from \"./logo.svg\";";
        let out = f.server.container.transform(code, &id).unwrap();
        assert!(out.code.contains("from \"/src/logo.svg?import\""));
        // Asset references are not tracked as graph edges
        assert!(f.server.graph.imported_modules(module).is_empty());
    }

    #[test]
    fn test_zero_imports_clears_previous_edges() {
        let f = fixture();
        let id = main_id(&f);
        let module = f.server.graph.ensure_entry_from_url("/src/main.js");

        let out = f
            .server
            .container
            .transform("import y from \"./local\";", &id)
            .unwrap();
        assert!(out.code.contains("/src/local.js"));
        assert_eq!(f.server.graph.imported_modules(module).len(), 1);

        let _ = f.server.container.transform("const x = 1;", &id).unwrap();
        assert!(f.server.graph.imported_modules(module).is_empty());
    }

    #[test]
    fn test_unresolvable_specifier_left_alone() {
        let f = fixture();
        let id = main_id(&f);
        f.server.graph.ensure_entry_from_url("/src/main.js");

        let code = "import z from \"./does-not-exist\";";
        let out = f.server.container.transform(code, &id).unwrap();
        assert!(out.code.contains("from \"./does-not-exist\""));
    }
}
