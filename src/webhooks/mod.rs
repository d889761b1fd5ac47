//! Mutating admission webhook.
//!
//! - `review`: AdmissionReview wire envelope and typed request/response
//! - `path`: explicit lookups into untyped admission objects
//! - `policies`: the zone placement decision engine
//! - `server`: HTTPS transport mapping reviews to decisions

pub mod error;
pub mod path;
pub mod policies;
pub mod review;
mod server;

pub use error::MalformedRequest;
pub use policies::{
    DEFAULT_WORKLOAD_KIND, Decision, Mutation, MutationPolicy, NoPatchReason, decide, evaluate,
};
pub use review::{AdmissionRequest, AdmissionResponse, AdmissionReview, PatchType};
pub use server::{
    BAD_REQUEST_MESSAGE, MAX_REVIEW_BYTES, MUTATE_PATH, WebhookError, WebhookState,
    create_webhook_router, run_webhook_server,
};
