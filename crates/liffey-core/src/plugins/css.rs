//! CSS loading plugin.
//!
//! An imported stylesheet is served as a JS module that injects a `<style>`
//! tag through the client runtime, self-accepts hot updates, and registers
//! a prune callback that removes the tag on teardown.

use crate::paths::{clean_url, get_short_name, CLIENT_PATH};
use crate::plugin::{HookResult, LoadOutput, Plugin, PluginContext, TransformResult};
use std::path::{Path, PathBuf};

pub struct CssPlugin {
    root: PathBuf,
}

impl CssPlugin {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Plugin for CssPlugin {
    fn name(&self) -> &str {
        "liffey:css"
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadOutput>> {
        let cleaned = clean_url(id);
        if !cleaned.ends_with(".css") {
            return Ok(None);
        }
        match liffey_util::fs::read_to_string_lossy(Path::new(cleaned)) {
            Ok(css) => Ok(Some(LoadOutput::code(css))),
            Err(_) => Ok(None),
        }
    }

    fn transform(
        &self,
        code: &str,
        id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        let cleaned = clean_url(id);
        if !cleaned.ends_with(".css") {
            return Ok(None);
        }

        let url = format!("/{}", get_short_name(cleaned, &self.root));
        let url_lit = serde_json::to_string(&url).unwrap_or_else(|_| String::from("\"\""));
        let id_lit = serde_json::to_string(cleaned).unwrap_or_else(|_| String::from("\"\""));
        let css_lit = serde_json::to_string(code).unwrap_or_else(|_| String::from("\"\""));

        let wrapped = format!(
            "import {{ createHotContext as __liffey__createHotContext }} from \"{CLIENT_PATH}\";\n\
             import.meta.hot = __liffey__createHotContext({url_lit});\n\
             import {{ updateStyle, removeStyle }} from \"{CLIENT_PATH}\";\n\
             \n\
             const id = {id_lit};\n\
             const css = {css_lit};\n\
             \n\
             updateStyle(id, css);\n\
             import.meta.hot.accept();\n\
             export default css;\n\
             import.meta.hot.prune(() => removeStyle(id));\n"
        );

        Ok(Some(TransformResult::code(wrapped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginContainer;
    use tempfile::tempdir;

    #[test]
    fn test_css_becomes_self_accepting_module() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let css_path = root.join("app.css");
        std::fs::write(&css_path, "body { color: red; }").unwrap();

        let container = PluginContainer::new(vec![Box::new(CssPlugin::new(root.clone()))]);
        let id = css_path.display().to_string();

        let loaded = container.load(&id).unwrap().unwrap();
        assert_eq!(loaded.code, "body { color: red; }");

        let out = container.transform(&loaded.code, &id).unwrap();
        assert!(out.code.contains("createHotContext(\"/app.css\")"));
        assert!(out.code.contains("updateStyle(id, css)"));
        assert!(out.code.contains("import.meta.hot.accept();"));
        assert!(out.code.contains("export default css;"));
        assert!(out.code.contains("prune(() => removeStyle(id))"));
        assert!(out.code.contains("body { color: red; }"));
    }

    #[test]
    fn test_css_text_is_escaped() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let css_path = root.join("q.css");
        std::fs::write(&css_path, "a::before { content: \"x\"; }").unwrap();

        let container = PluginContainer::new(vec![Box::new(CssPlugin::new(root.clone()))]);
        let id = css_path.display().to_string();
        let loaded = container.load(&id).unwrap().unwrap();
        let out = container.transform(&loaded.code, &id).unwrap();

        // Embedded quotes must be escaped into the string literal
        assert!(out.code.contains("content: \\\"x\\\""));
    }

    #[test]
    fn test_non_css_declined() {
        let dir = tempdir().unwrap();
        let container =
            PluginContainer::new(vec![Box::new(CssPlugin::new(dir.path().to_path_buf()))]);
        assert!(container.load("/src/main.js").unwrap().is_none());
    }
}
