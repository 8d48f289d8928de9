//! `liffey dev` command implementation.
//!
//! On-demand development server: instead of bundling the application ahead
//! of time, individual ES modules are resolved, compiled, and served as the
//! browser requests them.
//!
//! ```text
//! Browser requests GET /src/App.js
//!   → resolve (plugin hooks + file system)
//!   → load (plugin hooks + file system)
//!   → transform (compiler seam, then import rewriting)
//!   → serve as application/javascript
//! ```
//!
//! Bare package imports are pre-bundled on startup into
//! `node_modules/.liffey/` and served as single flat artifacts. A file
//! watcher invalidates the module graph on change and pushes update notices
//! over a websocket transport on a dedicated port; the browser client
//! re-fetches only the invalidated modules.

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path as AxumPath, RawQuery, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use liffey_core::config::{load_config, DEFAULT_ENTRY};
use liffey_core::paths::{
    get_short_name, is_css_request, is_import_request, is_script_request, PRE_BUNDLE_DIR,
};
use liffey_core::plugins::default_plugins;
use liffey_core::{transform_request, updates_for_file_change, ServerContext, ServerMessage};
use miette::{IntoDiagnostic, Result};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Dev server action.
#[derive(Debug, Clone)]
pub struct DevAction {
    /// Entry point file (relative to the working directory).
    pub entry: Option<PathBuf>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Open browser automatically.
    pub open: bool,
    /// Explicit config file path (overrides auto-discovery).
    pub config: Option<PathBuf>,
}

/// Shared server state.
struct DevState {
    /// Core server context: graph, plugin container, pre-bundler.
    server: ServerContext,
    /// Broadcast channel feeding every connected transport client.
    hmr_tx: broadcast::Sender<ServerMessage>,
    /// Entry URL used by the generated fallback page.
    entry_url: String,
}

/// Run the dev server.
pub async fn run(action: DevAction) -> Result<()> {
    let cwd = action.cwd.canonicalize().into_diagnostic()?;

    // Load config file; CLI flags override config values
    let config = match load_config(&cwd, action.config.as_deref()) {
        Ok(Some((config_path, config))) => {
            let rel_path = config_path.strip_prefix(&cwd).unwrap_or(&config_path);
            println!("  Loaded config from {}", rel_path.display());
            Some(config)
        }
        Ok(None) => None,
        Err(e) => {
            eprintln!("  Warning: Failed to load config: {}", e);
            None
        }
    };

    let effective_port = if action.port != liffey_core::config::DEFAULT_PORT {
        action.port
    } else {
        config
            .as_ref()
            .and_then(|c| c.server.port)
            .unwrap_or(action.port)
    };

    let effective_host = if action.host != "localhost" {
        action.host.clone()
    } else {
        config
            .as_ref()
            .and_then(|c| c.server.host.clone())
            .unwrap_or(action.host)
    };

    let effective_open = action.open
        || config
            .as_ref()
            .and_then(|c| c.server.open)
            .unwrap_or(false);

    let entry = action
        .entry
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.entry.clone().map(PathBuf::from)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENTRY));
    let entry_path = if entry.is_absolute() {
        entry.clone()
    } else {
        cwd.join(&entry)
    };
    let entry_url = format!("/{}", get_short_name(&entry_path.display().to_string(), &cwd));

    // The transport gets its own port so a stale listener from a previous
    // run can be tolerated without taking the whole server down
    let hmr_port = effective_port + 1;

    let server = ServerContext::new(cwd.clone(), default_plugins(&cwd, hmr_port), hmr_port)
        .map_err(|e| miette::miette!("plugin setup failed: {e}"))?;

    // Fire-and-forget pre-bundle pass; requests arriving before it
    // completes get a retryable not-ready response
    {
        let prebundler = Arc::clone(&server.prebundler);
        let entry_path = entry_path.clone();
        tokio::task::spawn_blocking(move || match prebundler.run(&entry_path) {
            Ok(0) => {}
            Ok(count) => println!("  Pre-bundled {count} dependencies"),
            Err(e) => eprintln!("  Warning: pre-bundle pass failed: {}", e),
        });
    }

    // Broadcast channel for HMR update notices
    let (hmr_tx, _) = broadcast::channel::<ServerMessage>(16);

    let state = Arc::new(DevState {
        server,
        hmr_tx: hmr_tx.clone(),
        entry_url,
    });

    // File watcher on a dedicated thread, feeding the async change handler
    let (file_change_tx, mut file_change_rx) = mpsc::channel::<Vec<String>>(16);
    let watch_cwd = cwd.clone();
    std::thread::spawn(move || {
        if let Err(e) = watch_files(watch_cwd, file_change_tx) {
            eprintln!("  File watcher error: {}", e);
        }
    });

    let change_state = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(changed) = file_change_rx.recv().await {
            handle_file_change(&change_state, &changed);
        }
    });

    // Transport listener on its own port; an already-bound port is logged
    // and swallowed, leaving the server up without HMR push
    let host_ip = if effective_host == "localhost" {
        "127.0.0.1".to_string()
    } else {
        effective_host.clone()
    };
    let hmr_addr: SocketAddr = format!("{}:{}", host_ip, hmr_port)
        .parse()
        .into_diagnostic()?;
    match tokio::net::TcpListener::bind(hmr_addr).await {
        Ok(listener) => {
            let hmr_app = Router::new()
                .route("/__hmr", get(hmr_websocket))
                .with_state(Arc::clone(&state));
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, hmr_app).await {
                    tracing::error!("transport server error: {e}");
                }
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::warn!("transport port {hmr_port} already in use; HMR push disabled");
        }
        Err(e) => return Err(e).into_diagnostic(),
    }

    let app = Router::new()
        .route("/", get(serve_index))
        .route("/*path", get(serve_path))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host_ip, effective_port)
        .parse()
        .into_diagnostic()?;

    println!();
    println!(
        "  Dev server running at http://{}:{}",
        effective_host, effective_port
    );
    println!("  Unbundled ES module serving enabled");
    println!("  Hot Module Replacement enabled");
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    if effective_open {
        let _ = open_browser(&format!("http://{}:{}", effective_host, effective_port));
    }

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Serve the entry HTML page through the `transform_index_html` hooks.
async fn serve_index(State(state): State<Arc<DevState>>) -> impl IntoResponse {
    let index_path = state.server.root.join("index.html");
    let raw = liffey_util::fs::read_to_string_lossy(&index_path)
        .unwrap_or_else(|_| generate_index_html(&state.entry_url));
    let html = state
        .server
        .container
        .transform_index_html(&raw)
        .unwrap_or(raw);
    Html(html)
}

/// Serve everything else: script/style/import-tagged requests through the
/// transform pipeline, the rest as static files.
async fn serve_path(
    State(state): State<Arc<DevState>>,
    AxumPath(path): AxumPath<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let url_path = format!("/{path}");
    let full_url = match &query {
        Some(q) => format!("{url_path}?{q}"),
        None => url_path.clone(),
    };

    // A request for a package artifact racing the startup pre-bundle pass
    // gets a retryable signal instead of a confusing 404
    if url_path.starts_with(&format!("/{PRE_BUNDLE_DIR}/")) && !state.server.prebundler.is_ready()
    {
        return Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .header("Retry-After", "1")
            .header("Content-Type", "application/javascript")
            .body(Body::from("// pre-bundling in progress, retry shortly\n"))
            .unwrap();
    }

    if is_script_request(&full_url) || is_css_request(&full_url) || is_import_request(&full_url) {
        match transform_request(&full_url, &state.server) {
            Ok(Some(result)) => {
                return Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/javascript")
                    .header("Cache-Control", "no-cache")
                    .body(Body::from(result.code))
                    .unwrap();
            }
            // Resolution or load failure: fall through to static serving
            Ok(None) => {}
            // Transform failure is fatal for this one request only
            Err(e) => {
                tracing::debug!("transform failed for {full_url}: {e}");
                let message = serde_json::to_string(&e.to_string())
                    .unwrap_or_else(|_| String::from("\"transform error\""));
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header("Content-Type", "application/javascript")
                    .body(Body::from(format!("console.error({message});")))
                    .unwrap();
            }
        }
    }

    // Import-tagged requests never reach static fallback
    if is_import_request(&full_url) {
        return not_found(&path);
    }

    serve_static(&state.server.root, &path)
}

/// Serve a file from disk with a best-effort content type.
fn serve_static(root: &Path, path: &str) -> Response {
    let file_path = root.join(path);
    if !file_path.is_file() {
        return not_found(path);
    }

    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let content_type = match ext {
        "html" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    };

    match std::fs::read(&file_path) {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type)
            .body(Body::from(bytes))
            .unwrap(),
        Err(_) => not_found(path),
    }
}

fn not_found(path: &str) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::from(format!("Not found: {path}")))
        .unwrap()
}

// ============================================================================
// WebSocket transport
// ============================================================================

/// Upgrade a transport connection.
async fn hmr_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DevState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_hmr_socket(socket, state))
}

/// One connected transport client: handshake, then forward update notices.
/// Incoming `"ping"` keep-alives need no acknowledgment.
async fn handle_hmr_socket(mut socket: WebSocket, state: Arc<DevState>) {
    let mut rx = state.hmr_tx.subscribe();

    if socket
        .send(Message::Text(ServerMessage::Connected.to_json()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    if socket.send(Message::Text(msg.to_json())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}

// ============================================================================
// File Watching
// ============================================================================

/// Check if a path should be ignored by the file watcher.
fn should_ignore(path: &Path) -> bool {
    let path_str = path.to_string_lossy();

    if path_str.contains("/node_modules/")
        || path_str.contains("/target/")
        || path_str.contains("/.git/")
        || path_str.contains("/dist/")
        || path_str.contains("/.liffey/")
    {
        return true;
    }

    if let Some(name) = path.file_name() {
        if name.to_string_lossy().starts_with('.') {
            return true;
        }
    }

    false
}

/// Watch files for changes, debounced, forwarding batches to the handler.
fn watch_files(cwd: PathBuf, file_change_tx: mpsc::Sender<Vec<String>>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(tx, Config::default()).into_diagnostic()?;
    watcher
        .watch(&cwd, RecursiveMode::Recursive)
        .into_diagnostic()?;

    let mut debounce_set: HashSet<PathBuf> = HashSet::new();
    let mut last_change = std::time::Instant::now();

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                let relevant = event.paths.iter().any(|p| {
                    if should_ignore(p) {
                        return false;
                    }
                    let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
                    matches!(
                        ext,
                        "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "css" | "json" | "html"
                    )
                });

                if !relevant {
                    continue;
                }

                for path in event.paths {
                    if !should_ignore(&path) {
                        debounce_set.insert(path);
                    }
                }

                let now = std::time::Instant::now();
                if now.duration_since(last_change).as_millis() < 50 {
                    continue;
                }

                if debounce_set.is_empty() {
                    continue;
                }

                let changed: Vec<String> = debounce_set
                    .drain()
                    .map(|p| p.display().to_string())
                    .collect();

                last_change = now;

                if file_change_tx.blocking_send(changed).is_err() {
                    break;
                }
            }
            Ok(Err(e)) => {
                eprintln!("  Watch error: {}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Handle file changes: invalidate the graph and broadcast update notices.
fn handle_file_change(state: &DevState, changed: &[String]) {
    let mut updates = Vec::new();

    for file_path in changed {
        println!(
            "  File changed: {}",
            get_short_name(file_path, &state.server.root)
        );
        updates.extend(updates_for_file_change(
            &state.server.graph,
            &state.server.root,
            file_path,
        ));
    }

    if !updates.is_empty() {
        // No connected clients is fine; they simply miss the notice
        let _ = state.hmr_tx.send(ServerMessage::Update { updates });
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Generate a fallback page when the project has no `index.html`. The
/// client runtime tag is injected by the client-inject plugin.
fn generate_index_html(entry_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>liffey dev</title>
</head>
<body>
  <div id="root"></div>
  <script type="module" src="{entry_url}"></script>
</body>
</html>"#
    )
}

/// Open a URL in the default browser.
fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_ignore() {
        assert!(should_ignore(Path::new("/p/node_modules/react/index.js")));
        assert!(should_ignore(Path::new(
            "/p/node_modules/.liffey/react.js"
        )));
        assert!(should_ignore(Path::new("/p/.git/HEAD")));
        assert!(should_ignore(Path::new("/p/src/.main.js.swp")));
        assert!(!should_ignore(Path::new("/p/src/main.js")));
    }

    #[test]
    fn test_generate_index_html() {
        let html = generate_index_html("/src/main.js");
        assert!(html.contains("<script type=\"module\" src=\"/src/main.js\"></script>"));
    }
}
