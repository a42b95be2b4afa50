use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::server::ServerContext;

/// Accepts connections until `shutdown` turns true, one task per connection.
///
/// The listener is dropped on return. Connections keep their own receiver and
/// wind down once idle.
pub async fn run(listener: TcpListener, ctx: Arc<ServerContext>, mut shutdown: watch::Receiver<bool>) {
    info!("Listening on {}", ctx.config.listen_addr());
    let workers = shutdown.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!("Accepted connection from {}", peer);

                    let ctx = ctx.clone();
                    let shutdown = workers.clone();
                    tokio::spawn(async move {
                        let mut conn = Connection::new(socket, peer, ctx, shutdown);
                        if let Err(e) = conn.run().await {
                            tracing::error!("Connection error from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            },
            // a dropped sender counts as a stop too
            _ = async { shutdown.wait_for(|stop| *stop).await.map(|_| ()) } => break,
        }
    }

    info!("{} no longer accepting connections", ctx.config.server_name);
}
