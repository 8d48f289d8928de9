//! Hot-module-replacement protocol and browser client runtime.
//!
//! Server side: a file change invalidates the corresponding graph node and
//! its importers, then one update notice is broadcast to every connected
//! transport client. Clients with no open connection miss the notice; there
//! is no queued replay.
//!
//! Client side: the embedded runtime (served at the internal client path)
//! registers hot modules per owner path, re-fetches updated modules with a
//! cache-busting timestamp, and runs accept callbacks with the fresh module
//! objects.

use crate::graph::{now_ms, ModuleGraph};
use crate::paths::get_short_name;
use serde::Serialize;
use std::path::Path;

/// Kind of module update pushed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateKind {
    #[serde(rename = "script-update")]
    Script,
    #[serde(rename = "style-update")]
    Style,
}

/// A single update entry in an update notice.
#[derive(Debug, Clone, Serialize)]
pub struct HmrUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    /// Request-facing path of the changed module.
    pub path: String,
    /// Path whose accept callbacks should run. Equal to `path` in the
    /// direct self-accept case.
    #[serde(rename = "acceptedPath")]
    pub accepted_path: String,
    /// Cache-busting timestamp for the client's re-fetch.
    pub timestamp: u64,
}

/// Message pushed from the server over the transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Handshake sent immediately on connect.
    Connected,
    /// One or more module updates after a file change.
    Update { updates: Vec<HmrUpdate> },
}

impl ServerMessage {
    /// Serialize for the wire.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Invalidate the graph for a changed file and compose the update notice.
///
/// The changed module's node (looked up by resolved id) and all its
/// importers are marked stale; the returned notice carries the changed
/// module's request-facing path as both `path` and `acceptedPath`.
pub fn updates_for_file_change(graph: &ModuleGraph, root: &Path, file: &str) -> Vec<HmrUpdate> {
    graph.invalidate(file);

    let kind = if file.ends_with(".css") {
        UpdateKind::Style
    } else {
        UpdateKind::Script
    };
    let path = format!("/{}", get_short_name(file, root));
    vec![HmrUpdate {
        kind,
        path: path.clone(),
        accepted_path: path,
        timestamp: now_ms(),
    }]
}

/// Render the client runtime for the given transport port.
#[must_use]
pub fn client_runtime(hmr_port: u16) -> String {
    CLIENT_RUNTIME.replace("__HMR_PORT__", &hmr_port.to_string())
}

/// The browser-side HMR client runtime.
///
/// Served at the internal client path and imported by every served module's
/// runtime prologue. Provides `createHotContext` (the `import.meta.hot`
/// implementation), the update handler, and the style-injection helpers
/// used by CSS modules.
const CLIENT_RUNTIME: &str = r#"// liffey HMR client runtime
console.log('[liffey] connecting...');

const socket = new WebSocket(`ws://${location.hostname}:__HMR_PORT__/__hmr`);

socket.addEventListener('message', async ({ data }) => {
  handleMessage(JSON.parse(data)).catch(console.error);
});

async function handleMessage(payload) {
  switch (payload.type) {
    case 'connected':
      console.log('[liffey] connected.');
      // keep-alive; the server does not acknowledge
      setInterval(() => socket.send('ping'), 1000);
      break;

    case 'update':
      payload.updates.forEach((update) => {
        if (update.type === 'script-update' || update.type === 'style-update') {
          fetchUpdate(update);
        }
      });
      break;
  }
}

// owner path -> { id, callbacks: [{ deps, fn }] }
const hotModulesMap = new Map();
// owner path -> teardown callback
const pruneMap = new Map();

export const createHotContext = (ownerPath) => {
  // Re-registration replaces the callback list rather than appending
  const mod = hotModulesMap.get(ownerPath);
  if (mod) {
    mod.callbacks = [];
  }

  function acceptDeps(deps, callback) {
    const entry = hotModulesMap.get(ownerPath) || {
      id: ownerPath,
      callbacks: [],
    };
    entry.callbacks.push({ deps, fn: callback });
    hotModulesMap.set(ownerPath, entry);
  }

  return {
    accept(deps, callback) {
      // Only direct self-acceptance is supported
      if (typeof deps === 'function' || !deps) {
        acceptDeps([ownerPath], ([mod]) => deps && deps(mod));
      }
    },

    prune(cb) {
      pruneMap.set(ownerPath, cb);
    },
  };
};

async function fetchUpdate({ path, timestamp }) {
  const mod = hotModulesMap.get(path);
  if (!mod) return;

  const moduleMap = new Map();
  const modulesToUpdate = new Set();
  for (const { deps } of mod.callbacks) {
    deps.forEach((dep) => modulesToUpdate.add(dep));
  }

  await Promise.all(
    Array.from(modulesToUpdate).map(async (dep) => {
      const [depPath, query] = dep.split('?');
      try {
        const newMod = await import(
          depPath + `?t=${timestamp}${query ? `&${query}` : ''}`
        );
        moduleMap.set(dep, newMod);
      } catch (e) {
        // a failed fetch is excluded from the callback pass
      }
    })
  );

  for (const { deps, fn } of mod.callbacks) {
    fn(deps.map((dep) => moduleMap.get(dep)));
  }
  console.log(`[liffey] hot updated: ${path}`);
}

// style id -> <style> element
const sheetsMap = new Map();

export function updateStyle(id, content) {
  let style = sheetsMap.get(id);
  if (!style) {
    style = document.createElement('style');
    style.setAttribute('type', 'text/css');
    style.textContent = content;
    document.head.appendChild(style);
  } else {
    style.textContent = content;
  }
  sheetsMap.set(id, style);
}

export function removeStyle(id) {
  const style = sheetsMap.get(id);
  if (style) {
    document.head.removeChild(style);
  }
  sheetsMap.delete(id);
}
"#;
