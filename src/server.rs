//! Listener lifecycle: bind, serve, stop.
//!
//! [`Server::start`] binds the socket and spawns the accept loop; the returned
//! [`ServerHandle`] is the only way to stop it. Each accepted connection is
//! driven by its own tokio task. How many requests may run at once is a
//! [`ConcurrencyPolicy`] chosen by the caller.
//!
//! ```text
//! Starting ──bind──▶ Serving ──stop() / accept loop exit──▶ Stopped
//! Starting ──bind error──▶ Stopped
//! ```
//!
//! Stopping drops the accept loop, which closes the listening socket. Requests
//! already in flight finish on their own tasks and are not awaited.

use std::{fmt, net::SocketAddr, num::NonZeroUsize};

use axum::Router;
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::{debug, info};

use crate::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Binding the listening socket.
    Starting,
    /// Accept loop running.
    Serving,
    /// Listening socket closed. Terminal.
    Stopped,
}

/// Limit on requests handled at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// One task per connection, no limit.
    #[default]
    Unbounded,
    /// At most `n` requests in flight; further requests wait for a slot.
    Bounded(NonZeroUsize),
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Bounded(n) => write!(f, "bounded({n})"),
        }
    }
}

/// A router that has not been bound yet.
pub struct Server {
    app: Router,
    policy: ConcurrencyPolicy,
    lifecycle: watch::Sender<Lifecycle>,
}

impl Server {
    pub fn new(app: Router) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::Starting);
        Self { app, policy: ConcurrencyPolicy::default(), lifecycle }
    }

    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Watch the lifecycle from before the bind. Reads `Starting` until
    /// [`start`](Self::start) is called; a failed bind ends in `Stopped`.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    /// Bind `host:port` and start accepting connections.
    ///
    /// `host` may be a name; it is resolved before binding. Port `0` picks an
    /// ephemeral port, see [`ServerHandle::local_addr`].
    pub async fn start(self, host: &str, port: u16) -> Result<ServerHandle, ServerError> {
        let Self { app, policy, lifecycle: state_tx } = self;

        let bind_err = |source: std::io::Error| ServerError::Bind {
            addr: format!("{host}:{port}"),
            source,
        };
        let bound = match TcpListener::bind((host, port)).await {
            Ok(listener) => listener.local_addr().map(|addr| (listener, addr)),
            Err(e) => Err(e),
        };
        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                state_tx.send_replace(Lifecycle::Stopped);
                return Err(bind_err(e));
            }
        };
        let state_rx = state_tx.subscribe();

        let app = match policy {
            ConcurrencyPolicy::Unbounded => app,
            ConcurrencyPolicy::Bounded(max) => {
                app.layer(GlobalConcurrencyLimitLayer::new(max.get()))
            }
        };

        let shutdown = CancellationToken::new();
        let cancelled = shutdown.clone();

        state_tx.send_replace(Lifecycle::Serving);
        info!(%local_addr, %policy, "accepting connections");

        let task = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            let result = tokio::select! {
                result = axum::serve(listener, service) => result.map_err(ServerError::Serve),
                () = cancelled.cancelled() => Ok(()),
            };
            // The serve future, and the listener it owns, is dropped by now.
            state_tx.send_replace(Lifecycle::Stopped);
            debug!(%local_addr, "listening socket closed");
            result
        });

        Ok(ServerHandle { local_addr, shutdown, task, lifecycle: state_rx })
    }
}

/// Running server. Dropping the handle without calling [`stop`](Self::stop)
/// leaves the accept loop running until the runtime shuts down.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), ServerError>>,
    lifecycle: watch::Receiver<Lifecycle>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Watch lifecycle transitions, e.g. to notice the accept loop ending.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.clone()
    }

    /// Stop accepting, close the listening socket, and wait for the accept
    /// loop to exit. Returns the loop's error if it had already failed.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.cancel();
        self.task.await??;
        Ok(())
    }
}
