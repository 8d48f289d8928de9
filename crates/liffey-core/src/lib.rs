#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]

//! Unbundled development server core.
//!
//! Serves individual ES modules on demand instead of a single bundle. Each
//! request runs a resolve → load → transform pipeline through an ordered
//! plugin list; the import-analysis stage rewrites specifiers for the
//! browser's native module loader and records dependency edges in the module
//! graph. File changes invalidate graph nodes and are pushed to connected
//! browsers over a websocket transport.

pub mod config;
pub mod error;
pub mod graph;
pub mod hmr;
pub mod imports;
pub mod paths;
pub mod plugin;
pub mod plugins;
pub mod prebundle;
pub mod server;
pub mod transform;

pub use config::{find_config_file, load_config, LiffeyConfig};
pub use error::Error;
pub use graph::{ModuleGraph, ModuleId};
pub use hmr::{updates_for_file_change, HmrUpdate, ServerMessage, UpdateKind};
pub use imports::{parse_import_spans, ImportSpan, SpanEdits};
pub use plugin::{
    HookResult, LoadOutput, Plugin, PluginContainer, PluginContext, PluginError, ResolvedId,
    TransformResult,
};
pub use prebundle::PreBundler;
pub use server::ServerContext;
pub use transform::transform_request;
