//! Live reload over WebSocket.
//!
//! The preview server injects a small client script into every HTML page.
//! It connects here; after each rebuild [`Reloader::broadcast`] tells every
//! connected page to reload itself.
//!
//! ```text
//! watch loop ──rebuild──▶ Reloader::broadcast ──"reload"──▶ browser tabs
//!                              ▲
//!          acceptor thread ────┘ (handshake, register client)
//! ```

use crate::{debug, log};
use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Text frame sent to clients after a rebuild.
pub const RELOAD_MESSAGE: &str = "reload";

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("failed to bind WebSocket server after {attempts} attempts from port {base_port}: {source}")]
    Bind {
        base_port: u16,
        attempts: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket hub for connected preview pages.
pub struct Reloader {
    clients: Clients,
    port: u16,
}

impl Reloader {
    /// Bind the hub and start accepting clients on a background thread.
    ///
    /// The acceptor exits once `shutdown` is set.
    pub fn bind(
        interface: IpAddr,
        base_port: u16,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, ReloadError> {
        let listener = try_bind_port(interface, base_port)?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;

        let clients: Clients = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::clone(&clients);
        std::thread::spawn(move || accept_loop(listener, accepted, shutdown));

        debug!("reload"; "ws://{}:{}", interface, port);
        Ok(Self { clients, port })
    }

    /// Port actually bound, which may differ from the requested one.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Tell every client to reload. Clients that fail to receive are dropped.
    ///
    /// Returns the number of clients reached.
    pub fn broadcast(&self) -> usize {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            debug!("reload"; "no clients connected");
            return 0;
        }

        clients.retain_mut(|ws| match ws.send(Message::text(RELOAD_MESSAGE)) {
            Ok(()) => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        debug!("reload"; "reloaded {} clients", clients.len());
        clients.len()
    }
}

fn try_bind_port(interface: IpAddr, base_port: u16) -> Result<TcpListener, ReloadError> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                if offset > 0 {
                    log!("reload"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok(listener);
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(ReloadError::Bind {
        base_port,
        attempts: MAX_PORT_RETRIES,
        source: last_error.unwrap_or_else(|| std::io::Error::other("no ports tried")),
    })
}

fn accept_loop(listener: TcpListener, clients: Clients, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!("reload"; "client connected: {}", addr);
                // Handshake needs a blocking stream
                let _ = stream.set_nonblocking(false);
                match tungstenite::accept(stream) {
                    Ok(ws) => clients.lock().push(ws),
                    Err(e) => log!("reload"; "handshake failed: {}", e),
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                log!("reload"; "accept error: {}", e);
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}
