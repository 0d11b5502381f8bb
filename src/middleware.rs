//! Shared state and HTTP middleware
//! Request tracing and the request counter

use crate::{
    config::AppConfig,
    db,
    error::AppError,
    repository::{AuthRepository, CredentialStore, RefreshTokenStore, UserRepository},
    services::AuthService,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Application state, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: Arc<AuthService>,
    pub request_counter: Arc<RequestCounter>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let auth_service = AuthService::new(credentials, refresh_store, &config.security);

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            request_counter: Arc::new(RequestCounter::new()),
        }
    }

    /// Build state backed by PostgreSQL
    pub async fn connect(config: AppConfig) -> Result<Self, AppError> {
        let pool = db::create_pool(&config.database)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self::new(
            config,
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(AuthRepository::new(pool)),
        ))
    }
}

/// Process-wide hit counter, owned by the state and injected where needed.
#[derive(Debug, Default)]
pub struct RequestCounter {
    hits: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request, returning the new total
    pub fn increment(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Reset to zero, returning the count before the reset
    pub fn reset(&self) -> u64 {
        self.hits.swap(0, Ordering::Relaxed)
    }
}

/// Count every request passing through
pub async fn count_requests(
    State(counter): State<Arc<RequestCounter>>,
    req: Request,
    next: Next,
) -> Response {
    counter.increment();
    metrics::counter!("http_requests_total").increment(1);
    next.run(req).await
}

/// Wrap each request in a span carrying trace and request IDs
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
