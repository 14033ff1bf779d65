//! HTTP server setup and middleware wiring.
//!
//! # Responsibilities
//! - Build the shield state from configuration (explicit construction,
//!   no globals)
//! - Wire the check chain: rate limits, then signature, then content
//! - Spawn the abuse-table sweeper
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ShieldConfig;
use crate::content::{content_safety_middleware, ContentAudit, ContentGuard, ContentState};
use crate::filter::WordFilter;
use crate::http::request::RequestIdLayer;
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::ratelimit::{
    rate_limit_middleware, spawn_sweeper, EscalatingLimiter, RateLimiterState, RateSpecError,
};
use crate::signature::{signature_middleware, NonceStore, ReplayGuard, SignatureState};

/// HTTP server fronting the forum backend.
///
/// Owns every check engine. Engines are built here from the config and
/// injected into their middleware; nothing reaches for global state.
pub struct ShieldServer {
    router: Router,
    config: ShieldConfig,
    abuse: Arc<EscalatingLimiter>,
    filter: Arc<WordFilter>,
}

impl ShieldServer {
    /// Build the server and all check engines from the configuration.
    ///
    /// The nonce store is injected so deployments can swap the in-memory
    /// store for a shared one without touching the verification path.
    pub fn new(config: ShieldConfig, store: Arc<dyn NonceStore>) -> Result<Self, RateSpecError> {
        let filter = Arc::new(WordFilter::new(
            config.content.words.iter(),
            config.content.replacement.clone(),
        ));
        let replay = Arc::new(ReplayGuard::new(config.signature.clone(), store));
        let abuse = Arc::new(EscalatingLimiter::from_config(&config.abuse));
        let limiters = Arc::new(RateLimiterState::new(
            &config.rate_limit,
            &config.abuse,
            Some(abuse.clone()),
        )?);
        let guard = Arc::new(ContentGuard::new(config.content.clone(), filter.clone()));

        let router = Self::build_router(
            &config,
            limiters,
            SignatureState { guard: replay },
            ContentState { guard },
        );

        Ok(Self {
            router,
            config,
            abuse,
            filter,
        })
    }

    /// Build the Axum router with the full middleware chain.
    ///
    /// Request order is outermost first: trace, request id, timeout,
    /// rate limits, signature, content. Cheap volume checks run before
    /// anything that buffers a body.
    fn build_router(
        config: &ShieldConfig,
        limiters: Arc<RateLimiterState>,
        signature: SignatureState,
        content: ContentState,
    ) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .layer(middleware::from_fn_with_state(
                content,
                content_safety_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                signature,
                signature_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                limiters,
                rate_limit_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The live word filter, for runtime word-list management.
    pub fn filter(&self) -> &Arc<WordFilter> {
        &self.filter
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = Shutdown::new();
        let sweeper = self.config.abuse.enabled.then(|| {
            spawn_sweeper(self.abuse.clone(), &self.config.abuse, shutdown.subscribe())
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        shutdown.trigger();
        if let Some(handle) = sweeper {
            let _ = handle.await;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Stand-in for the forum backend. Echoes back what survived the check
/// chain, which is exactly what a real upstream would receive.
async fn forward_handler(request: Request<Body>) -> Response {
    let audit = request.extensions().get::<ContentAudit>().cloned();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, 2 * 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };
    let payload: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "payload": payload,
        "filtered_words": audit.map(|a| a.matched_words).unwrap_or_default(),
    }))
    .into_response()
}
