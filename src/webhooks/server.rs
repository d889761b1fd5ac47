//! Admission webhook server.
//!
//! Serves the mutating webhook over HTTPS. To enable it in a cluster:
//! 1. Issue a serving certificate for the webhook Service (e.g. cert-manager)
//! 2. Point `MUTATOR_CERT` / `MUTATOR_KEY` at the mounted PEM files
//! 3. Create a MutatingWebhookConfiguration targeting `/mutator`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::MalformedRequest;
use super::policies::{self, Decision, MutationPolicy};
use super::review::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use crate::config::WebhookConfig;
use crate::health::{HealthState, OUTCOME_MALFORMED};

/// Route served by the mutating webhook
pub const MUTATE_PATH: &str = "/mutator";
/// Fixed diagnostic returned for any review that cannot be interpreted
pub const BAD_REQUEST_MESSAGE: &str =
    "Invalid AdmissionReview: expected request.uid, request.kind.kind and request.object.spec.template.spec";

/// Largest review body accepted. An UPDATE review carries both `object` and
/// `oldObject`, each of which may approach the 1.5 MiB object size limit.
pub const MAX_REVIEW_BYTES: usize = 8 * 1024 * 1024;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub policy: MutationPolicy,
    pub health: Arc<HealthState>,
}

impl WebhookState {
    pub fn new(policy: MutationPolicy, health: Arc<HealthState>) -> Self {
        Self { policy, health }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(MUTATE_PATH, post(mutate).get(probe))
        .layer(DefaultBodyLimit::max(MAX_REVIEW_BYTES))
        .with_state(state)
}

/// `GET /mutator`, so load balancers can probe the webhook port
async fn probe() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Parse and resolve an admission review body
fn read_request(body: &[u8]) -> Result<AdmissionRequest, MalformedRequest> {
    AdmissionReview::from_slice(body).and_then(AdmissionRequest::from_review)
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(AdmissionResponse::invalid(BAD_REQUEST_MESSAGE).into_review()),
    )
        .into_response()
}

/// Mutating admission handler for workload objects
async fn mutate(State(state): State<Arc<WebhookState>>, body: Bytes) -> Response {
    let started = Instant::now();
    let metrics = &state.health.metrics;

    debug!(request = %String::from_utf8_lossy(&body), "Received admission review");

    let request = match read_request(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed admission review");
            metrics.record_admission(OUTCOME_MALFORMED, started.elapsed().as_secs_f64());
            return bad_request();
        }
    };

    let Decision { mutation, response } = match policies::decide(&request, &state.policy) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(uid = %request.uid, kind = %request.kind, error = %e, "Rejecting malformed admission review");
            metrics.record_admission(OUTCOME_MALFORMED, started.elapsed().as_secs_f64());
            return bad_request();
        }
    };

    info!(
        uid = %request.uid,
        kind = %request.kind,
        namespace = ?request.namespace,
        name = ?request.name,
        mutation = mutation.label(),
        "{} {}",
        request.kind,
        mutation
    );

    let review = response.into_review();
    debug!(uid = %request.uid, response = ?review, "Sending admission response");
    metrics.record_admission(mutation.label(), started.elapsed().as_secs_f64());

    (StatusCode::OK, Json(review)).into_response()
}

/// Errors that can occur when running the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Certificate or key could not be loaded
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] std::io::Error),

    /// The listener failed
    #[error("Webhook server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Run the webhook server with TLS.
///
/// Binds to `config.bind` and serves [`MUTATE_PATH`] until `handle` is told
/// to shut down. Certificates are read from `config.cert_path` and
/// `config.key_path` (PEM).
pub async fn run_webhook_server(
    config: &WebhookConfig,
    state: Arc<WebhookState>,
    handle: Handle,
) -> Result<(), WebhookError> {
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(WebhookError::TlsConfig)?;

    let addr: SocketAddr = config.bind;
    info!(addr = %addr, path = MUTATE_PATH, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(WebhookError::Server)?;

    Ok(())
}
