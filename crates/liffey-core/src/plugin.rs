//! Plugin system for the dev server pipeline.
//!
//! Plugins are capability objects held in one ordered list that is immutable
//! after server startup. Resolution and loading are first-match-wins;
//! transformation chains every capable plugin in list order. Every hook
//! receives a [`PluginContext`] whose `resolve` re-enters the container, so
//! a plugin can delegate path logic to the rest of the pipeline.

use crate::server::ServerContext;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook. Aborts the current request.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    #[must_use]
    pub fn new(plugin: &str, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.to_string(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Result of the resolve hook, normalized to a canonical id shape.
#[derive(Debug, Clone)]
pub struct ResolvedId {
    /// Resolved module id (usually an absolute file path).
    pub id: String,
}

impl ResolvedId {
    /// Create a resolved module result.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<String> for ResolvedId {
    fn from(id: String) -> Self {
        Self { id }
    }
}

/// Result of the load hook.
#[derive(Debug, Clone)]
pub struct LoadOutput {
    /// Module source code.
    pub code: String,
}

impl LoadOutput {
    /// Create a load result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Result of the transform hook.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl TransformResult {
    /// Create a transform result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// Context passed by parameter into every hook call.
///
/// Exposes a `resolve` callback that closes over the container, replacing
/// the dynamic receiver of rollup-style plugin contexts.
pub struct PluginContext<'a> {
    container: &'a PluginContainer,
}

impl PluginContext<'_> {
    /// Delegate resolution to the whole pipeline.
    pub fn resolve(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolvedId>> {
        self.container.resolve_id(specifier, importer)
    }
}

/// The plugin trait.
///
/// All hooks have default no-op implementations; a plugin implements only
/// the capabilities it owns. Returning `Ok(None)` is the normal
/// "not applicable" signal, not a failure.
pub trait Plugin: Send + Sync {
    /// Plugin name for error messages.
    fn name(&self) -> &str;

    /// Called once at server startup with the assembled server context.
    fn configure_server(&self, _server: &ServerContext) -> HookResult<()> {
        Ok(())
    }

    /// Resolve a specifier to a module id. First non-`None` result wins.
    fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolvedId>> {
        Ok(None)
    }

    /// Load a module by id. First non-`None` result wins.
    fn load(&self, _id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
        Ok(None)
    }

    /// Transform module source. Every capable plugin runs, each receiving
    /// the previous plugin's output.
    fn transform(
        &self,
        _code: &str,
        _id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }

    /// Transform the entry HTML page (chained).
    fn transform_index_html(&self, _html: &str) -> HookResult<Option<String>> {
        Ok(None)
    }
}

/// Ordered plugin list plus the orchestration operations.
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    /// Create a container over an ordered plugin list. The list is fixed
    /// for the lifetime of the server.
    #[must_use]
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    fn context(&self) -> PluginContext<'_> {
        PluginContext { container: self }
    }

    /// Run `configure_server` on every plugin in list order.
    pub fn configure_server(&self, server: &ServerContext) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.configure_server(server)?;
        }
        Ok(())
    }

    /// Resolve a specifier through the plugins; the first plugin returning
    /// a result short-circuits the rest.
    pub fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolvedId>> {
        let ctx = self.context();
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve_id(specifier, importer, &ctx)? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    /// Load a module through the plugins; exactly one plugin is expected to
    /// own a given module kind.
    pub fn load(&self, id: &str) -> HookResult<Option<LoadOutput>> {
        let ctx = self.context();
        for plugin in &self.plugins {
            if let Some(output) = plugin.load(id, &ctx)? {
                return Ok(Some(output));
            }
        }
        Ok(None)
    }

    /// Transform code through all plugins in list order. A hook error is
    /// fatal for the request; a `None` passes the input through unchanged.
    pub fn transform(&self, code: &str, id: &str) -> HookResult<TransformResult> {
        let ctx = self.context();
        let mut current = TransformResult::code(code);
        for plugin in &self.plugins {
            if let Some(result) = plugin.transform(&current.code, id, &ctx)? {
                current = result;
            }
        }
        Ok(current)
    }

    /// Transform the entry HTML through all plugins (chained).
    pub fn transform_index_html(&self, html: &str) -> HookResult<String> {
        let mut current = html.to_string();
        for plugin in &self.plugins {
            if let Some(transformed) = plugin.transform_index_html(&current)? {
                current = transformed;
            }
        }
        Ok(current)
    }

    /// Iterate the plugin list.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(|p| &**p)
    }
}
