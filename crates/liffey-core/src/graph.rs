//! Module dependency graph.
//!
//! One node per logical module, indexed by both the request-facing URL and
//! the resolved absolute id. Edges are replaced wholesale on every transform
//! of a module; invalidation walks the importer back-references with a
//! visited set so cyclic import graphs terminate.

use crate::paths::clean_url;
use crate::plugin::TransformResult;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Resolver callback used to normalize a request URL into a resolved id
/// before any lookup. Must not re-enter the graph.
pub type ResolverFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Handle to a node in the module graph.
///
/// Indices into the graph's arena; both the URL index and the id index map
/// to the same handle for a given module, so cached output and edges stay
/// coherent across lookup paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(usize);

#[derive(Debug, Default)]
struct Node {
    url: String,
    id: Option<String>,
    importers: HashSet<ModuleId>,
    imported_modules: HashSet<ModuleId>,
    cached_output: Option<TransformResult>,
    last_invalidation: u64,
}

#[derive(Default)]
struct GraphInner {
    nodes: Vec<Node>,
    url_to_module: HashMap<String, ModuleId>,
    id_to_module: HashMap<String, ModuleId>,
}

/// The module graph owned by one server instance.
///
/// Interior locking keeps the `&self` API usable from concurrent request
/// handlers; no critical section suspends, so each mutation is atomic with
/// respect to other requests.
pub struct ModuleGraph {
    inner: RwLock<GraphInner>,
    resolver: Box<ResolverFn>,
}

impl ModuleGraph {
    /// Create an empty graph with the given resolver callback.
    #[must_use]
    pub fn new(resolver: Box<ResolverFn>) -> Self {
        Self {
            inner: RwLock::new(GraphInner::default()),
            resolver,
        }
    }

    /// Get or create the node for a request URL.
    ///
    /// Idempotent: repeated calls with equivalent raw inputs return the same
    /// handle. A URL whose resolved id is already indexed aliases the
    /// existing node rather than creating a duplicate.
    pub fn ensure_entry_from_url(&self, raw_url: &str) -> ModuleId {
        let url = clean_url(raw_url).to_string();

        if let Some(&module) = self.inner.read().unwrap().url_to_module.get(&url) {
            return module;
        }

        // Resolve outside the lock; the resolver may do filesystem probes.
        let resolved = (self.resolver)(&url).unwrap_or_else(|| url.clone());

        let mut inner = self.inner.write().unwrap();
        if let Some(&module) = inner.url_to_module.get(&url) {
            return module;
        }
        if let Some(&module) = inner.id_to_module.get(&resolved) {
            inner.url_to_module.insert(url, module);
            return module;
        }

        let module = ModuleId(inner.nodes.len());
        inner.nodes.push(Node {
            url: url.clone(),
            id: Some(resolved.clone()),
            ..Node::default()
        });
        inner.url_to_module.insert(url, module);
        inner.id_to_module.insert(resolved, module);
        module
    }

    /// Look up a node by resolved id.
    #[must_use]
    pub fn module_by_id(&self, id: &str) -> Option<ModuleId> {
        self.inner.read().unwrap().id_to_module.get(id).copied()
    }

    /// Look up a node by request URL (cleans the URL first).
    #[must_use]
    pub fn module_by_url(&self, raw_url: &str) -> Option<ModuleId> {
        self.inner
            .read()
            .unwrap()
            .url_to_module
            .get(clean_url(raw_url))
            .copied()
    }

    /// Replace a module's dependency edges with exactly the given set.
    ///
    /// Each import URL is resolved to a node (creating as needed); the
    /// module is added to each new dependency's importers and removed from
    /// the importers of any previously-imported node no longer present.
    pub fn update_module_imports(&self, module: ModuleId, imports: &[String]) {
        // Resolve first: ensure takes its own locks.
        let deps: HashSet<ModuleId> = imports
            .iter()
            .map(|url| self.ensure_entry_from_url(url))
            .collect();

        let mut inner = self.inner.write().unwrap();
        let prev = std::mem::replace(&mut inner.nodes[module.0].imported_modules, deps.clone());
        for dep in &deps {
            inner.nodes[dep.0].importers.insert(module);
        }
        for stale in prev.difference(&deps) {
            inner.nodes[stale.0].importers.remove(&module);
        }
    }

    /// Mark the node for `id` stale and propagate to its importers.
    ///
    /// Bumps the invalidation timestamp and clears the cached output of
    /// every reachable importer, each at most once; a cyclic importer graph
    /// terminates. Returns the invalidated handles in visit order.
    pub fn invalidate(&self, id: &str) -> Vec<ModuleId> {
        let mut inner = self.inner.write().unwrap();
        let Some(&start) = inner.id_to_module.get(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(module) = queue.pop_front() {
            if !visited.insert(module) {
                continue;
            }
            let node = &mut inner.nodes[module.0];
            node.last_invalidation = now_ms().max(node.last_invalidation + 1);
            node.cached_output = None;
            order.push(module);
            queue.extend(inner.nodes[module.0].importers.iter().copied());
        }
        order
    }

    /// The request-facing URL of a node.
    #[must_use]
    pub fn url(&self, module: ModuleId) -> String {
        self.inner.read().unwrap().nodes[module.0].url.clone()
    }

    /// The resolved id of a node, if resolution has completed.
    #[must_use]
    pub fn resolved_id(&self, module: ModuleId) -> Option<String> {
        self.inner.read().unwrap().nodes[module.0].id.clone()
    }

    /// The node's invalidation timestamp; 0 means never invalidated.
    #[must_use]
    pub fn last_invalidation(&self, module: ModuleId) -> u64 {
        self.inner.read().unwrap().nodes[module.0].last_invalidation
    }

    /// The node's cached compiled output, if still valid.
    #[must_use]
    pub fn cached_output(&self, module: ModuleId) -> Option<TransformResult> {
        self.inner.read().unwrap().nodes[module.0].cached_output.clone()
    }

    /// Store compiled output on a node.
    pub fn set_cached_output(&self, module: ModuleId, output: TransformResult) {
        self.inner.write().unwrap().nodes[module.0].cached_output = Some(output);
    }

    /// Current importers of a node.
    #[must_use]
    pub fn importers(&self, module: ModuleId) -> HashSet<ModuleId> {
        self.inner.read().unwrap().nodes[module.0].importers.clone()
    }

    /// Current dependencies of a node.
    #[must_use]
    pub fn imported_modules(&self, module: ModuleId) -> HashSet<ModuleId> {
        self.inner.read().unwrap().nodes[module.0]
            .imported_modules
            .clone()
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.inner.read().unwrap().nodes.len()
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
