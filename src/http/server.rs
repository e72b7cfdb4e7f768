//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all edge handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Buffer the body, run the content-hash injector, forward upstream
//! - Observability (metrics, correlation IDs)

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        uri::{Authority, InvalidUri},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::edge::{process_request, ContentHashError};
use crate::http::request::{self, MakeEdgeRequestId, RequestConversionError, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Failures while proxying a single request.
#[derive(Debug, Error)]
enum ProxyError {
    #[error("failed to read request body: {0}")]
    BodyRead(axum::Error),

    #[error(transparent)]
    Conversion(#[from] RequestConversionError),

    #[error(transparent)]
    ContentHash(#[from] ContentHashError),

    #[error("failed to build upstream uri: {0}")]
    UpstreamUri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::BodyRead(_) | ProxyError::Conversion(_) | ProxyError::ContentHash(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::UpstreamUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}

/// HTTP server for the edge proxy.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a new server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, InvalidUri> {
        let upstream: Authority = config.upstream.address.parse()?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState { client, upstream };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(edge_handler))
            .route("/{*path}", any(edge_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeEdgeRequestId))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "Edge server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Edge server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Catch-all handler: hash eligible bodies, then forward.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Handling request"
    );

    let response = match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request failed");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    // Size is already capped by RequestBodyLimitLayer.
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(ProxyError::BodyRead)?;

    let mut record = request::to_record(&parts, &bytes, client_ip)?;
    process_request(&mut record)?;
    let headers = request::to_header_map(&record.headers)?;

    let uri = upstream_uri(&state.upstream, &parts.uri)?;

    let mut upstream = Request::new(Body::from(bytes));
    *upstream.method_mut() = parts.method;
    *upstream.uri_mut() = uri;
    *upstream.headers_mut() = headers;

    let response = state.client.request(upstream).await?;
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}

/// Point the incoming path and query at the upstream authority.
fn upstream_uri(upstream: &Authority, incoming: &Uri) -> Result<Uri, axum::http::Error> {
    let path_and_query = incoming
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Uri::builder()
        .scheme("http")
        .authority(upstream.as_str())
        .path_and_query(path_and_query)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_uri_keeps_path_and_query() {
        let upstream: Authority = "origin.internal:9000".parse().unwrap();
        let incoming: Uri = "/bucket/key?partNumber=2".parse().unwrap();

        let uri = upstream_uri(&upstream, &incoming).unwrap();

        assert_eq!(uri.to_string(), "http://origin.internal:9000/bucket/key?partNumber=2");
    }

    #[test]
    fn test_upstream_uri_defaults_to_root() {
        let upstream: Authority = "127.0.0.1:1".parse().unwrap();
        let incoming: Uri = "http://edge.local".parse().unwrap();

        let uri = upstream_uri(&upstream, &incoming).unwrap();

        assert_eq!(uri.path(), "/");
        assert_eq!(uri.authority().unwrap().as_str(), "127.0.0.1:1");
    }

    #[test]
    fn test_new_rejects_bad_upstream() {
        let mut config = EdgeConfig::default();
        config.upstream.address = "bad address".into();
        assert!(EdgeServer::new(config).is_err());
    }

    #[test]
    fn test_errors_map_to_status_codes() {
        let decode = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, "***")
            .unwrap_err();
        let response = ProxyError::ContentHash(ContentHashError::Decode(decode)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ProxyError::Conversion(RequestConversionError::NonUtf8Header("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
