//! Router assembly and the HTTP listener lifecycle
//!
//! Layer order, outermost first:
//!
//! 1. CORS
//! 2. access logging (`TraceLayer`)
//! 3. Problem rendering (stamps `instance` with the original URI)
//! 4. per-request timeout
//! 5. for `<base>/v1/*` only: schema gate, then identity verification
//!
//! Both gates run before any handler, so a request that fails either is
//! answered without touching storage.

pub mod problem;

use axum::{
    extract::State,
    http::{header, Uri},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, sync::Notify};
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use utoipa_swagger_ui::{Config as SwaggerConfig, SwaggerUi};

use crate::auth::{middleware::require_identity, TokenVerifier};
use crate::config::{Config, ServerConfig};
use crate::contract::ApiContract;
use crate::db::ItemStore;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware::{cors_layer, schema_gate, tracing_layer};

/// Process-wide dependencies handed to the router
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemStore>,
    pub verifier: Arc<TokenVerifier>,
    pub contract: Arc<ApiContract>,
}

/// Where Swagger UI is mounted
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

/// Where the contract document is served
pub const OPENAPI_PATH: &str = "/openapi.yaml";

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let v1 = features::router(FeatureState::new(state.items.clone()))
        .route_layer(from_fn_with_state(state.verifier.clone(), require_identity))
        .layer(from_fn_with_state(state.contract.clone(), schema_gate));

    let public = Router::new()
        .route("/healthz", get(healthz))
        .route(OPENAPI_PATH, get(openapi_document))
        .with_state(state.contract.clone())
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).config(SwaggerConfig::from(OPENAPI_PATH)));

    let router = if config.server.base_path.is_empty() {
        public.merge(v1)
    } else {
        public.nest(&config.server.base_path, v1)
    };

    with_edge_layers(router.fallback(not_found), config)
}

/// Timeout, Problem rendering, access log and CORS, innermost first
fn with_edge_layers(router: Router, config: &Config) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(from_fn(problem::render_problems))
        .layer(tracing_layer())
        .layer(cors_layer(&config.cors))
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn openapi_document(State(contract): State<Arc<ApiContract>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/yaml")],
        contract.document().to_string(),
    )
        .into_response()
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route matches '{}'", uri.path()))
}

/// Bind and serve until SIGINT/SIGTERM, then drain for at most the
/// configured shutdown timeout
pub async fn serve(app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    serve_until(
        listener,
        app,
        Duration::from_secs(config.shutdown_timeout_secs),
        shutdown_signal(),
    )
    .await
}

/// Serve on `listener` until `signal` resolves. In-flight requests get
/// `grace` to finish before the server task is aborted.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let stop = Arc::new(Notify::new());
    let stopped = stop.clone();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stopped.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = signal => {},
    }

    info!("Waiting up to {} seconds for connections to close", grace.as_secs());
    stop.notify_one();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result??;
            info!("Server shut down gracefully");
        },
        Err(_) => {
            tracing::warn!("Shutdown grace period elapsed, closing remaining connections");
            server.abort();
        },
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request, http::StatusCode};
    use tokio::sync::oneshot;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_serve_until_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/healthz", get(healthz));
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve_until(listener, app, Duration::from_secs(1), async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop after the signal")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out_as_problem() {
        let mut config = Config::default();
        config.server.request_timeout_secs = 1;

        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "done"
            }),
        );

        let response = with_edge_layers(slow, &config)
            .oneshot(Request::builder().uri("/slow?wait=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            problem::PROBLEM_JSON
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let problem: problem::Problem = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem.status, 408);
        assert_eq!(problem.title, "Request Timeout");
        assert_eq!(problem.instance, "/slow?wait=1");
    }

    #[tokio::test]
    async fn test_fallback_is_problem() {
        let app = Router::new()
            .fallback(not_found)
            .layer(from_fn(problem::render_problems));

        let response = app
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            problem::PROBLEM_JSON
        );
    }
}
