//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all relay handler
//! - Wire up middleware (tracing, request ID, timeout, panic catcher)
//! - Answer the `?q=` shorthand
//! - Dispatch each request to the proxy engine, a mirror redirect or the
//!   static asset origin
//! - Serve over plain TCP or TLS with graceful shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{relay_path, request_host, request_id, shorthand_target};
use crate::http::response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::error::internal_error;
use crate::proxy::{HttpUpstream, ProxyEngine, RelayError, StaticAssets, Upstream, UpstreamError};
use crate::routing::{Route, Router as RelayRouter};

/// How long in-flight TLS connections may drain after shutdown is requested.
const TLS_DRAIN_SECS: u64 = 30;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RelayRouter>,
    pub engine: ProxyEngine,
    pub assets: StaticAssets,
    pub prefix: Arc<str>,
}

impl AppState {
    pub fn new(config: &ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            router: Arc::new(RelayRouter::new(config.mirror.clone())),
            engine: ProxyEngine::new(upstream.clone(), &config.relay),
            assets: StaticAssets::new(upstream, config.relay.asset_url.clone()),
            prefix: Arc::from(config.relay.prefix.as_str()),
        }
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that reaches upstream over the network.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(
            Duration::from_secs(config.timeouts.connect_secs),
            config.relay.max_redirect_hops,
        )?;
        Ok(Self::with_upstream(config, Arc::new(upstream)))
    }

    /// Create a server with a caller-supplied upstream transport.
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState::new(&config, upstream);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, prefix = %self.config.relay.prefix, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, prefix = %self.config.relay.prefix, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Main relay handler.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let request_id = request_id(&parts.headers).to_string();

    let (label, result) = dispatch(&state, parts, body).await;
    let response = result.unwrap_or_else(IntoResponse::into_response);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        route = label,
        status = response.status().as_u16(),
        "Request complete"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), label, start);
    response
}

async fn dispatch(
    state: &AppState,
    parts: Parts,
    body: Body,
) -> (&'static str, Result<Response, RelayError>) {
    if let Some(target) = shorthand_target(&parts.uri) {
        return ("shorthand", shorthand_redirect(state, &parts, &target));
    }

    let route = match relay_path(&parts.uri, &state.prefix) {
        Some(path) => state.router.route(&path),
        None => {
            let target = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
            Route::StaticFallback {
                path: target.trim_start_matches('/').to_string(),
            }
        }
    };
    let label = route.label();

    tracing::debug!(
        request_id = %request_id(&parts.headers),
        method = %parts.method,
        uri = %parts.uri,
        route = label,
        "Routing request"
    );

    let result = match route {
        Route::Proxy { path, .. } => {
            state
                .engine
                .handle(&path, parts.method, &parts.headers, body)
                .await
        }
        Route::Redirect { location, .. } => response::redirect(StatusCode::FOUND, &location)
            .map(response::transform)
            .map_err(RelayError::from),
        Route::StaticFallback { path } => state.assets.fetch(&path).await,
    };
    (label, result)
}

/// `?q=<target>` → 301 to `https://<host><prefix><target>`.
fn shorthand_redirect(state: &AppState, parts: &Parts, target: &str) -> Result<Response, RelayError> {
    let host = request_host(&parts.headers, &parts.uri).ok_or(RelayError::InvalidUrl)?;
    let location = format!("https://{host}{}{target}", state.prefix);
    response::redirect(StatusCode::MOVED_PERMANENTLY, &location).map_err(|_| RelayError::InvalidUrl)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    internal_error(&detail)
}
