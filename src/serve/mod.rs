// src/serve/mod.rs

//! Dev server: serves the Build Output Tree over HTTP and pushes reload
//! notifications to connected websocket clients after successful runs.
//!
//! Both listeners are bound up front so that a taken port surfaces as
//! [`AssetflowError::Bind`] immediately. The caller treats that as fatal for
//! the serve capability only — watching and building continue without it.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use axum::Router;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};
use tungstenite::WebSocket;

use crate::errors::{AssetflowError, Result};

/// Running dev server. Dropping the handle does not stop the threads; they
/// live for the watch session.
pub struct ServeHandle {
    pub port: u16,
    /// Fire-and-forget reload channel for the runtime.
    pub reload_tx: Sender<()>,
    _threads: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ServeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeHandle").field("port", &self.port).finish()
    }
}

/// Start serving `output_dir` on `port`; the reload websocket listens on
/// `port + 1`.
pub fn start(output_dir: PathBuf, port: u16) -> Result<ServeHandle> {
    let http_listener = bind(port)?;
    let ws_listener = bind(port.wrapping_add(1))?;

    let clients = Arc::new(Mutex::new(Vec::new()));

    let accept_thread = spawn_ws_incoming(ws_listener, Arc::clone(&clients));
    let (reload_tx, reload_thread) = spawn_ws_reload(clients);
    let http_thread = spawn_http(http_listener, output_dir, port);

    info!(port, "dev server listening on http://localhost:{port}/");

    Ok(ServeHandle {
        port,
        reload_tx,
        _threads: vec![accept_thread, reload_thread, http_thread],
    })
}

fn bind(port: u16) -> Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).map_err(AssetflowError::Bind)
}

/// Accepts websocket clients and parks them for the reload broadcaster.
fn spawn_ws_incoming(
    listener: TcpListener,
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!("websocket accept failed: {e}");
                    continue;
                }
            };
            match tungstenite::accept(stream) {
                Ok(socket) => clients.lock().expect("client list lock").push(socket),
                Err(e) => warn!("websocket handshake failed: {e}"),
            }
        }
    })
}

/// Broadcasts "reload" to every connected client; broken connections are
/// pruned, and only the most recent connections are kept around.
fn spawn_ws_reload(
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
) -> (Sender<()>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();

    let thread = std::thread::spawn(move || {
        while rx.recv().is_ok() {
            let mut clients = clients.lock().expect("client list lock");
            let mut broken = vec![];

            for (i, socket) in clients.iter_mut().enumerate() {
                match socket.send("reload".into()) {
                    Ok(_) => {}
                    Err(tungstenite::error::Error::Io(e))
                        if e.kind() == std::io::ErrorKind::BrokenPipe =>
                    {
                        broken.push(i);
                    }
                    Err(e) => {
                        warn!("reload push failed: {e}");
                    }
                }
            }

            for i in broken.into_iter().rev() {
                clients.remove(i);
            }

            let len = clients.len();
            if len > 10 {
                for mut socket in clients.drain(0..len - 10) {
                    socket.close(None).ok();
                }
            }

            debug!("reload pushed to clients");
        }
    });

    (tx, thread)
}

fn spawn_http(listener: TcpListener, output_dir: PathBuf, port: u16) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(anyhow::Error::from)
            .and_then(|rt| rt.block_on(serve(listener, output_dir)));

        if let Err(e) = result {
            warn!(port, "http server stopped: {e}");
        }
    })
}

async fn serve(listener: TcpListener, output_dir: PathBuf) -> anyhow::Result<()> {
    listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(listener)?;

    let router = Router::new().fallback_service(ServeDir::new(output_dir));

    axum::serve(listener, router).await?;

    Ok(())
}
