use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower::Layer;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::handlers::http::build_router;
use crate::tower_middle::TimeoutLayer;

/// Accept connections until `shutdown` resolves.
///
/// At most `server.max_connections` connections are served at once; further
/// clients wait in the listen backlog.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let router = Arc::new(build_router());
    let limit = Arc::new(Semaphore::new(state.config.server.max_connections));
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    info!(
        "Listening on http://{}",
        listener.local_addr().context("Listener has no local address")?
    );

    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = limit.clone().acquire_owned() => {
                permit.context("Connection limiter closed")?
            }
        };

        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            },
        };

        debug!("Accepted connection from {}", peer);

        let svc = {
            let router = router.clone();
            let state = state.clone();
            tower::service_fn(move |req: Request<Incoming>| {
                let router = router.clone();
                let state = state.clone();
                async move { Ok::<_, Infallible>(router.dispatch(req, state).await) }
            })
        };
        let svc = TowerToHyperService::new(TimeoutLayer::new(timeout).layer(svc));
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, svc)
                .await
            {
                error!("Error serving connection from {}: {:?}", peer, err);
            }
            drop(permit);
        });
    }

    info!("Server shutting down");
    Ok(())
}

/// Serve until the process receives Ctrl-C.
pub async fn run(listener: TcpListener, state: AppState) -> Result<()> {
    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
