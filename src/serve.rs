//! Preview server.
//!
//! A small `tiny_http` static server over the output directory:
//!
//! - `/` and directories resolve to `index.html`
//! - URLs are percent-decoded, so `/%E7%B4%A2%E5%BC%95.html` finds `索引.html`
//! - HTML responses get the live-reload client injected before `</body>`
//! - anything else is a 404
//!
//! The request loop polls a shutdown flag between requests so Ctrl+C ends it
//! cleanly.

use crate::config::Config;
use crate::{debug, log};
use std::fs;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Reload client, with `__RELOAD_PORT__` replaced by the hub's port.
const RELOAD_JS: &str = include_str!("../static/reload.js");

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("invalid interface address {0:?}")]
    Interface(String),
    #[error("failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        first: u16,
        last: u16,
        attempts: u16,
        message: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bound preview server. Call [`PreviewServer::run`] or [`PreviewServer::spawn`].
pub struct PreviewServer {
    server: Server,
    addr: SocketAddr,
    root: PathBuf,
    reload_port: Option<u16>,
}

/// Parse `serve.interface`.
pub fn interface(config: &Config) -> Result<IpAddr, ServeError> {
    config
        .serve
        .interface
        .parse()
        .map_err(|_| ServeError::Interface(config.serve.interface.clone()))
}

impl PreviewServer {
    /// Bind on `serve.interface:serve.port`, moving up on conflict.
    ///
    /// `reload_port` enables script injection for HTML responses.
    pub fn bind(config: &Config, reload_port: Option<u16>) -> Result<Self, ServeError> {
        let interface = interface(config)?;
        let (server, addr) = try_bind_port(interface, config.serve.port)?;
        Ok(Self {
            server,
            addr,
            root: config.output_dir(),
            reload_port,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve requests until `shutdown` is set.
    pub fn run(&self, shutdown: &AtomicBool) -> Result<(), ServeError> {
        log!("serve"; "http://{}", self.addr);
        while !shutdown.load(Ordering::Relaxed) {
            if let Some(request) = self.server.recv_timeout(Duration::from_millis(100))? {
                if let Err(e) = self.handle(request) {
                    log!("serve"; "request error: {e}");
                }
            }
        }
        debug!("serve"; "stopped");
        Ok(())
    }

    /// Run on a background thread.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            if let Err(e) = self.run(&shutdown) {
                crate::logger::log_error("serve", "server stopped", &e);
            }
        })
    }

    fn handle(&self, request: Request) -> std::io::Result<()> {
        let Some(path) = resolve_path(&self.root, request.url()) else {
            debug!("serve"; "404 {}", request.url());
            return request.respond(not_found());
        };

        let content_type = guess_content_type(&path);
        let mut body = fs::read(&path)?;
        if let Some(port) = self.reload_port
            && content_type.starts_with("text/html")
        {
            body = inject_reload(&body, port);
        }
        request.respond(with_content_type(Response::from_data(body), content_type))
    }
}

fn try_bind_port(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::new();
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let requested = SocketAddr::new(interface, port);
        match Server::http(requested) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(requested);
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServeError::Bind {
        first: base_port,
        last: base_port.saturating_add(MAX_PORT_RETRIES - 1),
        attempts: MAX_PORT_RETRIES,
        message: last_error,
    })
}

// ============================================================================
// Request resolution
// ============================================================================

/// Map a request URL to a file under `root`.
///
/// Query strings are ignored. Paths escaping the root resolve to nothing.
pub fn resolve_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = urlencoding::decode(path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let local = root.join(relative);
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_reload(html: &[u8], port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";
    let script = format!(
        "<script>{}</script>",
        RELOAD_JS.replace("__RELOAD_PORT__", &port.to_string())
    );

    let at = html
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(html.len());
    let mut out = Vec::with_capacity(html.len() + script.len());
    out.extend_from_slice(&html[..at]);
    out.extend_from_slice(script.as_bytes());
    out.extend_from_slice(&html[at..]);
    out
}

// ============================================================================
// Responses
// ============================================================================

fn with_content_type<R: Read>(response: Response<R>, content_type: &str) -> Response<R> {
    match Header::from_bytes("Content-Type", content_type) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn not_found() -> Response<std::io::Cursor<Vec<u8>>> {
    with_content_type(
        Response::from_string("404 Not Found").with_status_code(StatusCode(404)),
        "text/plain; charset=utf-8",
    )
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json" | "map") => "application/json; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}
