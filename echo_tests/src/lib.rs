//! Shared helpers for the socket-level integration tests.

use std::net::SocketAddr;

use echo_server::server::bind_ephemeral;
use echo_shared::config::EchoConfig;
use tokio::{sync::oneshot, task::JoinHandle};

/// A backend running on an ephemeral localhost port.
pub struct RunningServer {
    pub cfg: EchoConfig,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl RunningServer {
    /// Binds and starts serving in a background task.
    pub async fn start() -> anyhow::Result<Self> {
        let (server, cfg) = bind_ephemeral().await?;
        let addr = server.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async move {
            let _ = rx.await;
        }));
        Ok(Self {
            cfg,
            addr,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stops the server and waits for it to drain.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await?
    }
}

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}
