//! nodeselector-mutator library crate
//!
//! A mutating admission webhook that pins workloads using `emptyDir` volumes
//! to the internal zone, and releases workloads that no longer need it.

pub mod config;
pub mod health;
pub mod webhooks;

pub use config::{ConfigError, WebhookConfig};
pub use health::{HealthState, run_health_server};
pub use webhooks::{
    AdmissionRequest, AdmissionResponse, AdmissionReview, Decision, MUTATE_PATH, MalformedRequest,
    Mutation, MutationPolicy, NoPatchReason, WebhookError, WebhookState, create_webhook_router,
    decide, run_webhook_server,
};
