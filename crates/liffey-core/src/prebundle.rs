//! Dependency pre-bundling.
//!
//! Runs once at server startup without blocking the first request. The scan
//! phase walks the import graph from the application entry and collects
//! every reachable bare package specifier; the bundle phase emits one flat
//! ESM artifact per package under `node_modules/.liffey/` so a later
//! request for that package hits exactly one file.
//!
//! Pre-bundling is best-effort: a package whose proxy generation fails is
//! skipped for the pass and falls back to per-file resolution at request
//! time. A readiness flag lets the request path surface a retryable
//! not-ready signal instead of silently racing the pass.

use crate::imports::{
    parse_import_spans, scan_export_statements, has_esm_syntax, ExportKind, ImportKind, SpanEdits,
};
use crate::paths::{
    is_bare_specifier, package_name_from_specifier, sanitize_pkg_name, PRE_BUNDLE_DIR,
};
use crate::plugins::resolve::probe;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use thiserror::Error;

/// Fingerprint of the last completed pass, used to reuse artifacts across
/// restarts.
const MANIFEST_FILE: &str = "_manifest.txt";

/// Error during pre-bundling, isolated per package.
#[derive(Debug, Error)]
pub enum PreBundleError {
    #[error("package not found in node_modules: {0}")]
    PackageNotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported construct in '{package}': {message}")]
    Unsupported { package: String, message: String },
}

impl PreBundleError {
    fn unsupported(package: &str, message: impl Into<String>) -> Self {
        Self::Unsupported {
            package: package.to_string(),
            message: message.into(),
        }
    }
}

/// Dependency pre-bundler bound to one project root.
pub struct PreBundler {
    root: PathBuf,
    deps_dir: PathBuf,
    ready: AtomicBool,
    artifacts: RwLock<HashMap<String, PathBuf>>,
}

impl PreBundler {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let deps_dir = root.join(PRE_BUNDLE_DIR);
        Self {
            root,
            deps_dir,
            ready: AtomicBool::new(false),
            artifacts: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the startup pass has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Whether a package was bundled in this pass.
    #[must_use]
    pub fn has(&self, pkg: &str) -> bool {
        self.artifacts.read().unwrap().contains_key(pkg)
    }

    /// Bundled package names.
    #[must_use]
    pub fn packages(&self) -> Vec<String> {
        self.artifacts.read().unwrap().keys().cloned().collect()
    }

    /// Request-facing URL of a package's artifact.
    #[must_use]
    pub fn artifact_url(pkg: &str) -> String {
        format!("/{PRE_BUNDLE_DIR}/{}.js", sanitize_pkg_name(pkg))
    }

    /// Scan source text for bare package imports.
    #[must_use]
    pub fn scan_bare_imports(&self, source: &str) -> HashSet<String> {
        parse_import_spans(source)
            .iter()
            .filter(|span| is_bare_specifier(&span.specifier))
            .map(|span| package_name_from_specifier(&span.specifier))
            .collect()
    }

    /// Walk the import graph from `entry`, following relative imports, and
    /// collect every reachable bare package specifier.
    #[must_use]
    pub fn scan_entry_recursive(&self, entry: &Path) -> HashSet<String> {
        let mut packages = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue = vec![entry.to_path_buf()];

        while let Some(path) = queue.pop() {
            if !visited.insert(path.display().to_string()) {
                continue;
            }
            let Ok(source) = liffey_util::fs::read_to_string_lossy(&path) else {
                continue;
            };
            for span in parse_import_spans(&source) {
                if is_bare_specifier(&span.specifier) {
                    packages.insert(package_name_from_specifier(&span.specifier));
                } else if span.specifier.starts_with('.') {
                    if let Some(parent) = path.parent() {
                        if let Some(dep) = probe(&parent.join(&span.specifier)) {
                            queue.push(dep);
                        }
                    }
                }
            }
        }

        packages
    }

    /// Run the full pass: scan from `entry`, then bundle each discovered
    /// package. Per-package failures are logged and skipped.
    pub fn run(&self, entry: &Path) -> Result<usize, crate::error::Error> {
        let packages = self.scan_entry_recursive(entry);
        if packages.is_empty() {
            self.ready.store(true, Ordering::SeqCst);
            return Ok(0);
        }

        std::fs::create_dir_all(&self.deps_dir)?;

        let fingerprint = self.fingerprint(&packages);
        if self.try_reuse(&packages, &fingerprint) {
            self.ready.store(true, Ordering::SeqCst);
            return Ok(packages.len());
        }

        let mut bundled = 0;
        for pkg in &packages {
            match self.bundle_package(pkg) {
                Ok(artifact) => {
                    self.artifacts.write().unwrap().insert(pkg.clone(), artifact);
                    bundled += 1;
                }
                Err(e) => {
                    eprintln!("  Warning: failed to pre-bundle '{pkg}': {e}");
                }
            }
        }

        let _ = liffey_util::fs::atomic_write(
            &self.deps_dir.join(MANIFEST_FILE),
            fingerprint.as_bytes(),
        );
        self.ready.store(true, Ordering::SeqCst);
        Ok(bundled)
    }

    /// Fingerprint the dependency set: the lockfile-adjacent `package.json`
    /// when present, else the sorted package list itself.
    fn fingerprint(&self, packages: &HashSet<String>) -> String {
        let manifest = self.root.join("package.json");
        if manifest.is_file() {
            if let Ok(hash) = liffey_util::hash::blake3_file(&manifest) {
                return hash;
            }
        }
        let mut sorted: Vec<_> = packages.iter().cloned().collect();
        sorted.sort();
        liffey_util::hash::blake3_bytes(sorted.join(",").as_bytes())
    }

    /// Reuse artifacts from a previous pass when the fingerprint matches and
    /// every artifact is intact.
    fn try_reuse(&self, packages: &HashSet<String>, fingerprint: &str) -> bool {
        let manifest = self.deps_dir.join(MANIFEST_FILE);
        let matches = std::fs::read_to_string(&manifest)
            .is_ok_and(|stored| stored.trim() == fingerprint);
        if !matches {
            return false;
        }

        let mut map = HashMap::new();
        for pkg in packages {
            let artifact = self.deps_dir.join(format!("{}.js", sanitize_pkg_name(pkg)));
            if !artifact.is_file() {
                return false;
            }
            map.insert(pkg.clone(), artifact);
        }
        *self.artifacts.write().unwrap() = map;
        true
    }

    /// Bundle one package into a flat artifact.
    fn bundle_package(&self, pkg: &str) -> Result<PathBuf, PreBundleError> {
        let entry = self.resolve_package_entry(pkg)?;
        let source =
            liffey_util::fs::read_to_string_lossy(&entry).map_err(|source| PreBundleError::Read {
                path: entry.clone(),
                source,
            })?;

        // An entry already using standard export syntax flattens directly;
        // an older-convention entry gets a key-enumerating proxy.
        let code = if has_esm_syntax(&source) {
            self.flatten_esm(pkg, &entry)?
        } else {
            cjs_proxy(pkg, &source)?
        };

        let artifact = self.deps_dir.join(format!("{}.js", sanitize_pkg_name(pkg)));
        liffey_util::fs::atomic_write(&artifact, code.as_bytes()).map_err(|source| {
            PreBundleError::Write {
                path: artifact.clone(),
                source,
            }
        })?;
        Ok(artifact)
    }

    /// Resolve a package's entry point from its `package.json` (`module`
    /// then `main`, falling back to `index.js`).
    fn resolve_package_entry(&self, pkg: &str) -> Result<PathBuf, PreBundleError> {
        let dir = self.root.join("node_modules").join(pkg);
        if !dir.is_dir() {
            return Err(PreBundleError::PackageNotFound(pkg.to_string()));
        }

        let entry_rel = std::fs::read_to_string(dir.join("package.json"))
            .ok()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .and_then(|json| {
                json.get("module")
                    .or_else(|| json.get("main"))
                    .and_then(|v| v.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| String::from("index.js"));

        probe(&dir.join(&entry_rel))
            .ok_or_else(|| PreBundleError::unsupported(pkg, format!("entry '{entry_rel}' not found")))
    }

    /// Flatten an ESM package by topological concatenation of its relative
    /// import graph. Constructs the flattener cannot express abort the
    /// package (dynamic imports, default/namespace imports of internal
    /// modules, external dependencies, colliding export names).
    fn flatten_esm(&self, pkg: &str, entry: &Path) -> Result<String, PreBundleError> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        self.flatten_visit(pkg, entry, &mut visited, &mut ordered)?;

        let mut export_names: HashSet<String> = HashSet::new();
        let mut parts = Vec::new();
        let last = ordered.len() - 1;

        for (idx, path) in ordered.iter().enumerate() {
            let is_entry = idx == last;
            let source = liffey_util::fs::read_to_string_lossy(path).map_err(|source| {
                PreBundleError::Read {
                    path: path.clone(),
                    source,
                }
            })?;
            let mut edits = SpanEdits::new();

            for span in parse_import_spans(&source) {
                let specifier = span.specifier.as_str();
                if specifier.starts_with('.') {
                    if span.kind == ImportKind::Dynamic {
                        return Err(PreBundleError::unsupported(pkg, "dynamic internal import"));
                    }
                    if span.kind == ImportKind::Static {
                        // The bindings of `import { a } from './x'` survive
                        // concatenation; default and namespace bindings don't.
                        let clause = source[span.stmt_start + 6..span.start - 1].trim_start();
                        if !clause.is_empty()
                            && !clause.starts_with('{')
                            && !clause.starts_with('"')
                            && !clause.starts_with('\'')
                        {
                            let message = if clause.contains('*') {
                                "namespace import of internal module"
                            } else {
                                "default import of internal module"
                            };
                            return Err(PreBundleError::unsupported(pkg, message));
                        }
                    }
                    edits.overwrite(span.stmt_start, span.stmt_end, "");
                } else if is_bare_specifier(specifier) {
                    return Err(PreBundleError::unsupported(
                        pkg,
                        format!("depends on external package '{specifier}'"),
                    ));
                } else {
                    return Err(PreBundleError::unsupported(
                        pkg,
                        format!("absolute import '{specifier}'"),
                    ));
                }
            }

            for export in scan_export_statements(&source) {
                match export.kind {
                    ExportKind::Default if !is_entry => {
                        return Err(PreBundleError::unsupported(
                            pkg,
                            "default export outside the entry module",
                        ));
                    }
                    ExportKind::Declaration { decl_start } => {
                        if let Some(name) = declaration_name(&source, decl_start) {
                            if !export_names.insert(name.clone()) {
                                return Err(PreBundleError::unsupported(
                                    pkg,
                                    format!("colliding export '{name}'"),
                                ));
                            }
                        }
                    }
                    ExportKind::Named { end } => {
                        for name in named_export_names(&source[export.start..end]) {
                            if !export_names.insert(name.clone()) {
                                return Err(PreBundleError::unsupported(
                                    pkg,
                                    format!("colliding export '{name}'"),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }

            parts.push(edits.apply(&source));
        }

        Ok(parts.join("\n"))
    }

    fn flatten_visit(
        &self,
        pkg: &str,
        path: &Path,
        visited: &mut HashSet<String>,
        ordered: &mut Vec<PathBuf>,
    ) -> Result<(), PreBundleError> {
        if !visited.insert(path.display().to_string()) {
            return Ok(());
        }
        let source = liffey_util::fs::read_to_string_lossy(path).map_err(|source| {
            PreBundleError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        for span in parse_import_spans(&source) {
            if span.specifier.starts_with('.') && span.kind != ImportKind::Dynamic {
                let parent = path.parent().unwrap_or(Path::new("/"));
                let dep = probe(&parent.join(&span.specifier)).ok_or_else(|| {
                    PreBundleError::unsupported(
                        pkg,
                        format!("unresolvable internal import '{}'", span.specifier),
                    )
                })?;
                self.flatten_visit(pkg, &dep, visited, ordered)?;
            }
        }
        ordered.push(path.to_path_buf());
        Ok(())
    }
}

/// Synthesize an ESM proxy for an older-convention (CJS) single-file entry.
///
/// The module's own keys are enumerated lexically from its export
/// assignments; the proxy emits one named re-export per key plus a default
/// re-export, normalizing both styles to a single predictable shape.
fn cjs_proxy(pkg: &str, source: &str) -> Result<String, PreBundleError> {
    if source.contains("require(") {
        return Err(PreBundleError::unsupported(pkg, "require() call"));
    }

    let keys = scan_cjs_export_keys(source);
    let mut out = String::with_capacity(source.len() + 256);
    out.push_str("const __module = { exports: {} };\n");
    out.push_str("const module = __module;\n");
    out.push_str("const exports = __module.exports;\n\n");
    out.push_str(source);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\nexport default __module.exports;\n");
    for key in &keys {
        out.push_str(&format!(
            "const __liffey_export_{key} = __module.exports.{key};\nexport {{ __liffey_export_{key} as {key} }};\n"
        ));
    }
    Ok(out)
}

/// Lexically enumerate the export keys of a CJS module: `exports.k = …`,
/// `module.exports.k = …`, and the top-level keys of a
/// `module.exports = { … }` object literal.
fn scan_cjs_export_keys(source: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |name: &str| {
        if is_valid_ident(name) && seen.insert(name.to_string()) {
            keys.push(name.to_string());
        }
    };

    // exports.k = / module.exports.k =
    for (idx, _) in source.match_indices("exports.") {
        let after = &source[idx + "exports.".len()..];
        let name: String = after
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        let rest = after[name.len()..].trim_start();
        if rest.starts_with('=') && !rest.starts_with("==") {
            push(&name);
        }
    }

    // module.exports = { a, b: …, c() {} }
    if let Some(idx) = source.find("module.exports") {
        let after = source[idx + "module.exports".len()..].trim_start();
        if let Some(rest) = after.strip_prefix('=') {
            let rest = rest.trim_start();
            if let Some(body) = rest.strip_prefix('{') {
                for name in object_literal_keys(body) {
                    push(&name);
                }
            }
        }
    }

    keys.sort();
    keys
}

/// Shallow keys of an object literal body (up to the matching close brace).
fn object_literal_keys(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    let mut at_key = true;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'{' | b'[' | b'(' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' | b')' => {
                if b == b'}' && depth == 0 {
                    break;
                }
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b'"' | b'\'' | b'`' => {
                // String-keyed entries are skipped
                let quote = b;
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b',' if depth == 0 => {
                at_key = true;
                i += 1;
            }
            b':' if depth == 0 => {
                at_key = false;
                i += 1;
            }
            _ if at_key && depth == 0 && (b.is_ascii_alphabetic() || b == b'_' || b == b'$') => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
                {
                    i += 1;
                }
                keys.push(body[start..i].to_string());
                at_key = false;
            }
            _ => {
                i += 1;
            }
        }
    }

    keys
}

fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Name of the binding introduced by `export const|let|var|function|class`.
/// Destructuring patterns yield `None`.
fn declaration_name(source: &str, decl_start: usize) -> Option<String> {
    let mut rest = source[decl_start..].trim_start();
    loop {
        let word: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        if word.is_empty() {
            return None;
        }
        match word.as_str() {
            "const" | "let" | "var" | "function" | "class" | "async" => {
                rest = rest[word.len()..].trim_start().trim_start_matches('*');
                rest = rest.trim_start();
            }
            _ => return Some(word),
        }
    }
}

/// Names exported by an `export { a, b as c }` statement slice.
fn named_export_names(stmt: &str) -> Vec<String> {
    let Some(open) = stmt.find('{') else {
        return Vec::new();
    };
    let Some(close) = stmt[open..].find('}') else {
        return Vec::new();
    };
    stmt[open + 1..open + close]
        .split(',')
        .filter_map(|segment| {
            let words: Vec<&str> = segment.split_whitespace().collect();
            match words.as_slice() {
                [] => None,
                [.., "as", alias] => Some((*alias).to_string()),
                [name, ..] => Some((*name).to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn project() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        (dir, root)
    }

    fn write_pkg(root: &Path, pkg: &str, files: &[(&str, &str)]) {
        let dir = root.join("node_modules").join(pkg);
        std::fs::create_dir_all(&dir).unwrap();
        for (name, contents) in files {
            std::fs::write(dir.join(name), contents).unwrap();
        }
    }

    #[test]
    fn test_scan_bare_imports() {
        let (_dir, root) = project();
        let prebundler = PreBundler::new(root);
        let source = r#"
import React from 'react';
import { useState } from 'react';
import helper from '@scope/utils/deep';
import './local.js';
import path from 'node:path';
const lazy = import('lazy-module');
"#;
        let packages = prebundler.scan_bare_imports(source);
        assert!(packages.contains("react"));
        assert!(packages.contains("@scope/utils"));
        assert!(packages.contains("lazy-module"));
        assert!(!packages.iter().any(|p| p.starts_with('.')));
        assert!(!packages.contains("node:path"));
    }

    #[test]
    fn test_scan_entry_recursive() {
        let (_dir, root) = project();
        std::fs::write(
            root.join("src/main.js"),
            "import \"alpha\";\nimport \"./second.js\";\n",
        )
        .unwrap();
        std::fs::write(root.join("src/second.js"), "import \"beta\";\n").unwrap();

        let prebundler = PreBundler::new(root.clone());
        let packages = prebundler.scan_entry_recursive(&root.join("src/main.js"));
        assert!(packages.contains("alpha"));
        assert!(packages.contains("beta"));
        assert_eq!(packages.len(), 2);
    }

    #[test]
    fn test_bundle_esm_package_flattens() {
        let (_dir, root) = project();
        write_pkg(
            &root,
            "esm-lib",
            &[
                (
                    "package.json",
                    r#"{"name":"esm-lib","module":"index.js"}"#,
                ),
                (
                    "index.js",
                    "import { helper } from './helper.js';\nexport const main = () => helper();\nexport default main;\n",
                ),
                ("helper.js", "export const helper = () => 1;\n"),
            ],
        );
        std::fs::write(root.join("src/main.js"), "import \"esm-lib\";\n").unwrap();

        let prebundler = PreBundler::new(root.clone());
        let bundled = prebundler.run(&root.join("src/main.js")).unwrap();
        assert_eq!(bundled, 1);
        assert!(prebundler.is_ready());
        assert!(prebundler.has("esm-lib"));

        let artifact = root.join("node_modules/.liffey/esm-lib.js");
        let code = std::fs::read_to_string(&artifact).unwrap();
        // One flat file: both modules inlined, internal import removed
        assert!(code.contains("export const helper"));
        assert!(code.contains("export const main"));
        assert!(code.contains("export default main;"));
        assert!(!code.contains("from './helper.js'"));
    }

    #[test]
    fn test_bundle_cjs_package_proxies_keys() {
        let (_dir, root) = project();
        write_pkg(
            &root,
            "old-lib",
            &[
                ("package.json", r#"{"name":"old-lib","main":"index.js"}"#),
                (
                    "index.js",
                    "exports.alpha = () => 1;\nmodule.exports.beta = 2;\n",
                ),
            ],
        );
        std::fs::write(root.join("src/main.js"), "import old from \"old-lib\";\n").unwrap();

        let prebundler = PreBundler::new(root.clone());
        let bundled = prebundler.run(&root.join("src/main.js")).unwrap();
        assert_eq!(bundled, 1);

        let code =
            std::fs::read_to_string(root.join("node_modules/.liffey/old-lib.js")).unwrap();
        assert!(code.contains("export default __module.exports;"));
        assert!(code.contains("as alpha }"));
        assert!(code.contains("as beta }"));
    }

    #[test]
    fn test_failed_package_is_skipped() {
        let (_dir, root) = project();
        // ok-lib bundles; broken-lib requires, which the proxy rejects
        write_pkg(
            &root,
            "ok-lib",
            &[("index.js", "export const ok = true;\n")],
        );
        write_pkg(
            &root,
            "broken-lib",
            &[("index.js", "const x = require('inner');\nexports.x = x;\n")],
        );
        std::fs::write(
            root.join("src/main.js"),
            "import \"ok-lib\";\nimport \"broken-lib\";\n",
        )
        .unwrap();

        let prebundler = PreBundler::new(root.clone());
        let bundled = prebundler.run(&root.join("src/main.js")).unwrap();
        assert_eq!(bundled, 1);
        assert!(prebundler.has("ok-lib"));
        assert!(!prebundler.has("broken-lib"));
        // The pass as a whole still completes
        assert!(prebundler.is_ready());
    }

    #[test]
    fn test_manifest_reuse_across_restart() {
        let (_dir, root) = project();
        std::fs::write(root.join("package.json"), r#"{"name":"app"}"#).unwrap();
        write_pkg(&root, "esm-lib", &[("index.js", "export const a = 1;\n")]);
        std::fs::write(root.join("src/main.js"), "import \"esm-lib\";\n").unwrap();

        let first = PreBundler::new(root.clone());
        assert_eq!(first.run(&root.join("src/main.js")).unwrap(), 1);

        // A second instance (a restart) reuses the intact artifacts
        let second = PreBundler::new(root.clone());
        assert_eq!(second.run(&root.join("src/main.js")).unwrap(), 1);
        assert!(second.has("esm-lib"));
    }

    #[test]
    fn test_not_ready_until_run() {
        let (_dir, root) = project();
        let prebundler = PreBundler::new(root);
        assert!(!prebundler.is_ready());
    }

    #[test]
    fn test_artifact_url() {
        assert_eq!(
            PreBundler::artifact_url("react"),
            "/node_modules/.liffey/react.js"
        );
        assert_eq!(
            PreBundler::artifact_url("@scope/pkg"),
            "/node_modules/.liffey/scope__pkg.js"
        );
    }

    #[test]
    fn test_scan_cjs_export_keys() {
        let keys = scan_cjs_export_keys(
            "exports.alpha = 1;\nmodule.exports.beta = () => {};\nif (exports.alpha === 2) {}\n",
        );
        assert_eq!(keys, vec!["alpha", "beta"]);

        let keys = scan_cjs_export_keys("module.exports = { a, b: 1, c() {} };");
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_object_literal_keys_nested() {
        let keys = object_literal_keys(" a: { inner: 1 }, b: [1, 2], c };");
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_declaration_name() {
        assert_eq!(
            declaration_name("const alpha = 1;", 0).as_deref(),
            Some("alpha")
        );
        assert_eq!(
            declaration_name("async function beta() {}", 0).as_deref(),
            Some("beta")
        );
        assert_eq!(
            declaration_name("function* gen() {}", 0).as_deref(),
            Some("gen")
        );
    }

    #[test]
    fn test_named_export_names() {
        assert_eq!(
            named_export_names("export { a, b as c }"),
            vec!["a", "c"]
        );
    }
}
