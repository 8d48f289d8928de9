//! Server context shared by plugins and request handlers.

use crate::graph::ModuleGraph;
use crate::plugin::{HookResult, Plugin, PluginContainer};
use crate::prebundle::PreBundler;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a plugin may need from the running server, handed to
/// `configure_server` hooks at startup. Components are passed explicitly; there is
/// no ambient global state, and the graph's lifecycle is bound to one
/// server instance.
pub struct ServerContext {
    /// Project root directory.
    pub root: PathBuf,
    /// The module dependency graph.
    pub graph: Arc<ModuleGraph>,
    /// The plugin container (for recursive resolution).
    pub container: Arc<PluginContainer>,
    /// The dependency pre-bundler.
    pub prebundler: Arc<PreBundler>,
    /// Port the HMR websocket transport listens on.
    pub hmr_port: u16,
}

impl ServerContext {
    /// Assemble a server context: container over the plugin list, graph
    /// resolving through the container, pre-bundler bound to the root, then
    /// one `configure_server` pass over every plugin.
    pub fn new(
        root: PathBuf,
        plugins: Vec<Box<dyn Plugin>>,
        hmr_port: u16,
    ) -> HookResult<Self> {
        let container = Arc::new(PluginContainer::new(plugins));
        let resolver = {
            let container = Arc::clone(&container);
            Box::new(move |url: &str| {
                container.resolve_id(url, None).ok().flatten().map(|r| r.id)
            })
        };
        let graph = Arc::new(ModuleGraph::new(resolver));
        let prebundler = Arc::new(PreBundler::new(root.clone()));

        let server = Self {
            root,
            graph,
            container,
            prebundler,
            hmr_port,
        };
        server.container.configure_server(&server)?;
        Ok(server)
    }
}
