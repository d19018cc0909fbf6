// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Service;

/// Builder pattern so `main.rs` can inject its request handler and shutdown signal.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
    shutdown: Option<BoxFuture<'static, ()>>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            handler: None,
            shutdown: None,
        }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Stop accepting connections once `signal` resolves.
    pub fn with_shutdown<F>(mut self, signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(signal));
        self
    }

    /// Bind the configured address, then serve until shutdown.
    pub async fn serve(self) -> Result<()> {
        let listener = bind_tcp(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let handler = self
            .handler
            .ok_or_else(|| anyhow!("handler must be set via with_handler()"))?;
        let mut shutdown = self
            .shutdown
            .unwrap_or_else(|| futures::future::pending().boxed());

        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            tracing::warn!(%err, "failed to accept connection");
                            continue;
                        }
                    };
                    let svc = handler.clone();

                    // One Tokio task per connection.
                    tokio::spawn(async move {
                        let http = Http::new();
                        if let Err(err) = http.serve_connection(stream, svc).await {
                            tracing::warn!(%peer, %err, "connection error");
                        }
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("HTTP server no longer accepting connections");
                    return Ok(());
                }
            }
        }
    }
}
