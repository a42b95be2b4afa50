//! Server lifecycle.
//!
//! A [`Server`] owns the routing table, the session store and the codec. It
//! binds and starts accepting on [`Server::start`] and stops accepting on
//! [`Server::stop`]; connections already being served finish their current
//! exchange and close once idle.

pub mod listener;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::codec::BodyCodec;
use crate::config::Config;
use crate::routing::{Endpoint, Router, StatusHandler};
use crate::session::SessionStore;

/// Everything a connection worker needs, shared by all of them.
pub struct ServerContext {
    pub config: Config,
    pub router: Router,
    pub sessions: Arc<SessionStore>,
    pub codec: Arc<dyn BodyCodec>,
}

/// Lifecycle flags.
///
/// `started` is set from the moment `start` is called until the accept loop
/// exits; `initializing` only until the socket is bound; `errored` once
/// binding failed.
#[derive(Debug, Default)]
pub struct EngineState {
    started: AtomicBool,
    initializing: AtomicBool,
    errored: AtomicBool,
}

impl EngineState {
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::SeqCst)
    }

    pub fn is_errored(&self) -> bool {
        self.errored.load(Ordering::SeqCst)
    }

    fn finish(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.initializing.store(false, Ordering::SeqCst);
    }
}

pub struct Server {
    ctx: Arc<ServerContext>,
    state: Arc<EngineState>,
    /// Shutdown signal of the current run; every `start` installs a new one
    shutdown: Mutex<watch::Sender<bool>>,
    local_addr: Mutex<Option<SocketAddr>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self::with_sessions(config, Arc::new(SessionStore::new()))
    }

    /// Creates a server on top of an existing session store.
    pub fn with_sessions(config: Config, sessions: Arc<SessionStore>) -> Self {
        let codec = config.codec.build();
        let (shutdown, _) = watch::channel(true);
        Self {
            ctx: Arc::new(ServerContext {
                config,
                router: Router::new(),
                sessions,
                codec,
            }),
            state: Arc::new(EngineState::default()),
            shutdown: Mutex::new(shutdown),
            local_addr: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    pub fn router(&self) -> &Router {
        &self.ctx.router
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.ctx.sessions
    }

    pub fn codec(&self) -> &Arc<dyn BodyCodec> {
        &self.ctx.codec
    }

    /// Registers an endpoint. Refused once the server failed to start.
    pub fn add_endpoint(&self, endpoint: Endpoint) -> &Self {
        if self.is_errored() {
            warn!(path = %endpoint.path, "server is errored, endpoint not registered");
            return self;
        }
        self.ctx.router.register(endpoint);
        self
    }

    /// Registers a status handler. Refused once the server failed to start.
    pub fn set_response_handler(&self, handler: StatusHandler) -> &Self {
        if self.is_errored() {
            warn!(status = handler.status.as_u16(), "server is errored, handler not registered");
            return self;
        }
        self.ctx.router.register_status_handler(handler);
        self
    }

    /// Binds the configured address and starts accepting connections.
    ///
    /// Returns once the socket is bound. Calling it on a running server only
    /// logs a warning. After a [`Server::stop`] the previous accept loop is
    /// awaited first, so its socket is closed before a new one is bound.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.is_started() || self.is_initializing() {
            warn!("{} is already started", self.ctx.config.server_name);
            return Ok(());
        }
        self.stopped().await;

        let begun = Instant::now();
        self.state.started.store(true, Ordering::SeqCst);
        self.state.initializing.store(true, Ordering::SeqCst);
        self.state.errored.store(false, Ordering::SeqCst);

        let (stop_tx, shutdown) = watch::channel(false);
        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner) = stop_tx;

        let (ready_tx, ready_rx) = oneshot::channel();
        let ctx = self.ctx.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            let addr = ctx.config.listen_addr();
            let bound = TcpListener::bind(&addr)
                .await
                .and_then(|listener| listener.local_addr().map(|local| (listener, local)));
            let listener = match bound {
                Ok((listener, local)) => {
                    state.initializing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Ok(local));
                    listener
                }
                Err(e) => {
                    error!(addr = %addr, error = %e, "failed to bind");
                    state.errored.store(true, Ordering::SeqCst);
                    state.finish();
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            listener::run(listener, ctx, shutdown).await;
            state.finish();
        });
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        let local = ready_rx
            .await
            .context("accept loop exited before binding")?
            .with_context(|| format!("failed to bind {}", self.ctx.config.listen_addr()))?;

        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = Some(local);
        info!(
            "{} started on {} in {:?}",
            self.ctx.config.server_name,
            local,
            begun.elapsed()
        );
        Ok(())
    }

    /// Stops accepting connections. Idle keep-alive connections close.
    pub fn stop(&self) {
        if !self.is_started() {
            warn!("{} cannot be stopped as it has not been started", self.ctx.config.server_name);
            return;
        }
        info!("Stopping {}", self.ctx.config.server_name);
        self.state.started.store(false, Ordering::SeqCst);
        self.shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send_replace(true);
    }

    /// Waits until the accept loop has exited.
    pub async fn stopped(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "accept loop failed");
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    pub fn is_initializing(&self) -> bool {
        self.state.is_initializing()
    }

    pub fn is_errored(&self) -> bool {
        self.state.is_errored()
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
