//! Built-in plugins, registered in pipeline order.

pub mod asset;
pub mod client_inject;
pub mod css;
pub mod import_analysis;
pub mod resolve;
pub mod transpile;

pub use asset::AssetPlugin;
pub use client_inject::ClientInjectPlugin;
pub use css::CssPlugin;
pub use import_analysis::ImportAnalysisPlugin;
pub use resolve::ResolvePlugin;
pub use transpile::{PassthroughBackend, TranspileBackend, TranspileError, TranspilePlugin};

use crate::plugin::Plugin;
use std::path::Path;

/// Assemble the default plugin list for a dev server instance.
///
/// Order matters: the client runtime resolves first, path resolution before
/// loading, compilation before import analysis (which needs standard module
/// syntax), CSS and asset handling last.
#[must_use]
pub fn default_plugins(root: &Path, hmr_port: u16) -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(ClientInjectPlugin::new(hmr_port)),
        Box::new(ResolvePlugin::new(root.to_path_buf())),
        Box::new(TranspilePlugin::new(Box::new(PassthroughBackend))),
        Box::new(ImportAnalysisPlugin::new()),
        Box::new(CssPlugin::new(root.to_path_buf())),
        Box::new(AssetPlugin::new(root.to_path_buf())),
    ]
}
