//! Request-path classification and URL helpers.
//!
//! The dev server routes by suffix and query string: script and style
//! requests go through the plugin pipeline, `?import` marks references that
//! came from import statements, everything else falls through to static
//! serving.

use std::path::Path;

/// Well-known path of the injected browser-side HMR client runtime.
pub const CLIENT_PATH: &str = "/@liffey/client";

/// Internal paths that are never treated as project source and never
/// participate in the module graph.
pub const INTERNAL_PATHS: &[&str] = &[CLIENT_PATH];

/// Pre-bundle output directory, relative to the project root.
pub const PRE_BUNDLE_DIR: &str = "node_modules/.liffey";

/// Script file extensions served through the transform pipeline.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx"];

/// Extensions guessed for extension-less specifiers, in probe order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".jsx", ".ts", ".tsx"];

/// Asset extensions passed through as `export default "<url>"` modules.
pub const ASSET_EXTENSIONS: &[&str] = &["svg", "png"];

/// Strip query string and hash fragment from a URL.
#[must_use]
pub fn clean_url(url: &str) -> &str {
    let url = url.split('#').next().unwrap_or(url);
    url.split('?').next().unwrap_or(url)
}

/// Strip a trailing `?import` marker, leaving other queries intact.
#[must_use]
pub fn remove_import_query(url: &str) -> &str {
    url.strip_suffix("?import").unwrap_or(url)
}

/// Whether a request addresses a script module.
///
/// Extension-less paths that are not directory requests count as scripts so
/// that `import "./App"` resolves through the pipeline.
#[must_use]
pub fn is_script_request(url: &str) -> bool {
    let cleaned = clean_url(url);
    if let Some(ext) = extension(cleaned) {
        return SCRIPT_EXTENSIONS.contains(&ext);
    }
    !cleaned.ends_with('/')
}

/// Whether a request addresses a stylesheet.
#[must_use]
pub fn is_css_request(url: &str) -> bool {
    clean_url(url).ends_with(".css")
}

/// Whether a request carries the `?import` marker added to rewritten asset
/// specifiers.
#[must_use]
pub fn is_import_request(url: &str) -> bool {
    url.ends_with("?import")
}

/// Whether a specifier names a known asset kind.
#[must_use]
pub fn is_asset_specifier(specifier: &str) -> bool {
    extension(clean_url(specifier)).is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext))
}

/// Whether a URL addresses the injected client runtime or another reserved
/// internal path.
#[must_use]
pub fn is_internal_request(url: &str) -> bool {
    INTERNAL_PATHS.contains(&clean_url(url))
}

/// Whether a specifier is a bare package import (not relative, not absolute,
/// not a scheme-prefixed or virtual id).
#[must_use]
pub fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.starts_with('.')
        && !specifier.starts_with('/')
        && !specifier.starts_with('\0')
        && !specifier.contains("://")
        && !specifier.starts_with("node:")
        && !specifier.starts_with("data:")
}

/// Get the package name from a bare specifier (handles subpaths and scoped
/// packages).
#[must_use]
pub fn package_name_from_specifier(specifier: &str) -> String {
    if specifier.starts_with('@') {
        // Scoped: @scope/pkg or @scope/pkg/subpath
        let mut parts = specifier.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some(scope), Some(name)) => format!("{scope}/{name}"),
            _ => specifier.to_string(),
        }
    } else {
        specifier.split('/').next().unwrap_or(specifier).to_string()
    }
}

/// Sanitize a package name for use as an artifact filename.
#[must_use]
pub fn sanitize_pkg_name(pkg: &str) -> String {
    pkg.replace('/', "__").replace('@', "")
}

/// Project-relative short name for an absolute file path.
///
/// `/project/src/App.tsx` with root `/project` becomes `src/App.tsx`.
#[must_use]
pub fn get_short_name(file: &str, root: &Path) -> String {
    Path::new(file).strip_prefix(root).map_or_else(
        |_| file.trim_start_matches('/').to_string(),
        |rel| rel.display().to_string(),
    )
}

/// Normalize `.` and `..` segments without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> std::path::PathBuf {
    use std::path::Component;
    let mut out = std::path::PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_clean_url() {
        assert_eq!(clean_url("/src/App.tsx?t=123"), "/src/App.tsx");
        assert_eq!(clean_url("/src/App.tsx#frag"), "/src/App.tsx");
        assert_eq!(clean_url("/src/App.tsx?t=123#frag"), "/src/App.tsx");
        assert_eq!(clean_url("/src/App.tsx"), "/src/App.tsx");
    }

    #[test]
    fn test_remove_import_query() {
        assert_eq!(remove_import_query("/logo.svg?import"), "/logo.svg");
        assert_eq!(remove_import_query("/logo.svg?t=1"), "/logo.svg?t=1");
    }

    #[test]
    fn test_is_script_request() {
        assert!(is_script_request("/src/main.ts"));
        assert!(is_script_request("/src/App.jsx?t=42"));
        assert!(is_script_request("/src/App")); // extension guessed later
        assert!(!is_script_request("/src/"));
        assert!(!is_script_request("/style.css"));
        assert!(!is_script_request("/logo.svg"));
    }

    #[test]
    fn test_is_css_and_import_request() {
        assert!(is_css_request("/style.css"));
        assert!(is_css_request("/style.css?t=9"));
        assert!(is_import_request("/logo.svg?import"));
        assert!(!is_import_request("/logo.svg"));
    }

    #[test]
    fn test_internal_request() {
        assert!(is_internal_request(CLIENT_PATH));
        assert!(is_internal_request("/@liffey/client?t=1"));
        assert!(!is_internal_request("/src/main.js"));
    }

    #[test]
    fn test_is_bare_specifier() {
        assert!(is_bare_specifier("react"));
        assert!(is_bare_specifier("@scope/pkg"));
        assert!(!is_bare_specifier("./local"));
        assert!(!is_bare_specifier("../parent"));
        assert!(!is_bare_specifier("/absolute"));
        assert!(!is_bare_specifier("node:fs"));
        assert!(!is_bare_specifier("https://cdn.example/mod.js"));
    }

    #[test]
    fn test_package_name_from_specifier() {
        assert_eq!(package_name_from_specifier("react"), "react");
        assert_eq!(package_name_from_specifier("react/jsx-runtime"), "react");
        assert_eq!(package_name_from_specifier("@scope/pkg"), "@scope/pkg");
        assert_eq!(package_name_from_specifier("@scope/pkg/util"), "@scope/pkg");
    }

    #[test]
    fn test_sanitize_pkg_name() {
        assert_eq!(sanitize_pkg_name("react"), "react");
        assert_eq!(sanitize_pkg_name("@scope/pkg"), "scope__pkg");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/project/src/../logo.svg")),
            PathBuf::from("/project/logo.svg")
        );
        assert_eq!(
            normalize_path(Path::new("/project/src/./App.js")),
            PathBuf::from("/project/src/App.js")
        );
    }

    #[test]
    fn test_get_short_name() {
        let root = PathBuf::from("/project");
        assert_eq!(get_short_name("/project/src/App.tsx", &root), "src/App.tsx");
        assert_eq!(get_short_name("/elsewhere/x.js", &root), "elsewhere/x.js");
    }
}
