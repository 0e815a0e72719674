//! Listener loop, per-connection tasks and graceful shutdown.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::Layer;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::auth::SessionStore;
use crate::handlers::http::utils::{deliver_message_json, empty};
use crate::handlers::http::{HttpResponse, Router, build_router};
use crate::tower_middle::{CorsLayer, TimeoutLayer};

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run(state: AppState, shutdown: impl Future<Output = ()>) -> Result<()> {
    let addr = state.config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    serve(listener, state, shutdown).await
}

/// Serve on an already-bound listener.
///
/// On shutdown: stop accepting, give open connections up to
/// `server.shutdown_grace_secs` to finish, then close the pool.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let router = Arc::new(build_router());
    let graceful = GracefulShutdown::new();
    let purge = spawn_session_purge(
        Arc::clone(&state.sessions),
        Duration::from_secs(state.config.session.cleanup_interval_secs),
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let service = TowerToHyperService::new(app_service(Arc::clone(&router), state.clone()));
                let conn = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .serve_connection(io, service);
                let conn = graceful.watch(conn);

                tokio::spawn(async move {
                    if let Err(err) = conn.await {
                        debug!("Connection {} ended with error: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);

    let grace = Duration::from_secs(state.config.server.shutdown_grace_secs);
    tokio::select! {
        _ = graceful.shutdown() => info!("All connections drained"),
        _ = tokio::time::sleep(grace) => {
            warn!("Grace period of {:?} elapsed with connections still open", grace);
        }
    }

    purge.abort();
    state.db.close().await;
    info!("Database pool closed");
    Ok(())
}

/// Router wrapped in the CORS and timeout layers.
pub fn app_service(
    router: Arc<Router>,
    state: AppState,
) -> impl tower::Service<
    Request<Incoming>,
    Response = HttpResponse,
    Error = Infallible,
    Future = impl Future<Output = Result<HttpResponse, Infallible>> + Send,
> + Clone
+ Send
+ 'static {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let origins = state.config.server.allowed_origins.clone();

    let base = tower::service_fn(move |req: Request<Incoming>| {
        let router = Arc::clone(&router);
        let state = state.clone();
        async move { Ok::<_, Infallible>(dispatch(&router, req, state).await) }
    });

    TimeoutLayer::new(timeout).layer(CorsLayer::new(origins).layer(base))
}

/// Route one request; an internal failure becomes a plain 500.
async fn dispatch(router: &Router, req: Request<Incoming>, state: AppState) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match router.route(req, state).await {
        Ok(response) => {
            debug!("{} {} -> {}", method, path, response.status());
            response
        }
        Err(e) => {
            error!("{} {} failed: {:#}", method, path, e);
            internal_error()
        }
    }
}

fn internal_error() -> HttpResponse {
    deliver_message_json(
        crate::error::INTERNAL_ERROR,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .unwrap_or_else(|_| {
        let mut response = HttpResponse::new(empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Periodically drop expired sessions until aborted.
pub fn spawn_session_purge(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Purged {} expired sessions", n),
                Err(e) => warn!("Session purge failed: {}", e),
            }
        }
    })
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
