//! Per-request transform pipeline.
//!
//! Runs resolve → load → transform through the plugin container for one
//! request URL. Compiled output is cached on the module's graph node and
//! served from there until invalidation clears it.
//!
//! Failure semantics: a specifier that no plugin resolves, or a module no
//! plugin loads, yields `Ok(None)` so the caller can fall through to static
//! serving; a transform hook error is fatal for this one request only.

use crate::paths::clean_url;
use crate::plugin::{HookResult, TransformResult};
use crate::server::ServerContext;

/// Transform one request URL into servable module code.
pub fn transform_request(url: &str, server: &ServerContext) -> HookResult<Option<TransformResult>> {
    let cleaned = clean_url(url);

    // Cached output survives until the node is invalidated.
    if let Some(module) = server.graph.module_by_url(cleaned) {
        if let Some(cached) = server.graph.cached_output(module) {
            return Ok(Some(cached));
        }
    }

    let Some(resolved) = server.container.resolve_id(cleaned, None)? else {
        return Ok(None);
    };

    // Index the node under both the request URL and the resolved id before
    // the transform runs; import analysis looks it up by id.
    let module = server.graph.ensure_entry_from_url(cleaned);

    let Some(loaded) = server.container.load(&resolved.id)? else {
        return Ok(None);
    };

    let result = server.container.transform(&loaded.code, &resolved.id)?;
    server.graph.set_cached_output(module, result.clone());
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{LoadOutput, Plugin, PluginContext, ResolvedId};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct VirtualModules;

    impl Plugin for VirtualModules {
        fn name(&self) -> &str {
            "virtual"
        }

        fn resolve_id(
            &self,
            specifier: &str,
            _importer: Option<&str>,
            _ctx: &PluginContext,
        ) -> HookResult<Option<ResolvedId>> {
            if specifier.starts_with("/virtual/") {
                Ok(Some(ResolvedId::new(format!("\0{specifier}"))))
            } else {
                Ok(None)
            }
        }

        fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
            if id.starts_with("\0/virtual/") {
                Ok(Some(LoadOutput::code("export const v = 1;")))
            } else {
                Ok(None)
            }
        }
    }

    struct CountingTransform {
        runs: Arc<AtomicUsize>,
    }

    impl Plugin for CountingTransform {
        fn name(&self) -> &str {
            "counting"
        }

        fn transform(
            &self,
            code: &str,
            _id: &str,
            _ctx: &PluginContext,
        ) -> HookResult<Option<TransformResult>> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TransformResult::code(format!("{code} // t"))))
        }
    }

    fn server_with(plugins: Vec<Box<dyn Plugin>>) -> ServerContext {
        ServerContext::new(PathBuf::from("/project"), plugins, 3001).unwrap()
    }

    #[test]
    fn test_pipeline_and_cache() {
        let runs = Arc::new(AtomicUsize::new(0));
        let server = server_with(vec![
            Box::new(VirtualModules),
            Box::new(CountingTransform {
                runs: Arc::clone(&runs),
            }),
        ]);

        let first = transform_request("/virtual/a.js", &server).unwrap().unwrap();
        assert_eq!(first.code, "export const v = 1; // t");
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Second request is served from the node cache
        let second = transform_request("/virtual/a.js", &server).unwrap().unwrap();
        assert_eq!(second.code, first.code);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Invalidation clears the cached output and the pipeline reruns
        server.graph.invalidate("\0/virtual/a.js");
        let third = transform_request("/virtual/a.js", &server).unwrap().unwrap();
        assert_eq!(third.code, first.code);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unresolved_passes_through() {
        let server = server_with(vec![Box::new(VirtualModules)]);
        assert!(transform_request("/not-virtual.js", &server)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_cache_busting_query_hits_same_node() {
        let server = server_with(vec![Box::new(VirtualModules)]);
        let a = transform_request("/virtual/a.js", &server).unwrap().unwrap();
        let b = transform_request("/virtual/a.js?t=1712", &server)
            .unwrap()
            .unwrap();
        assert_eq!(a.code, b.code);
        assert_eq!(server.graph.module_count(), 1);
    }
}
