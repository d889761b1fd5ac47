// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the webhook HTTP surface.
//!
//! These tests drive the axum router in-process, exactly as the API server
//! would over TLS, WITHOUT binding sockets or loading certificates.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//! ```

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use nodeselector_mutator::webhooks::review::{META_API_VERSION_V1, META_API_VERSION_V1BETA1};
use nodeselector_mutator::webhooks::{BAD_REQUEST_MESSAGE, MAX_REVIEW_BYTES, MUTATE_PATH};
use nodeselector_mutator::{HealthState, MutationPolicy, WebhookState, create_webhook_router};

use common::decode_wire_patch;
use common::fixtures::ReviewBuilder;

struct Harness {
    router: Router,
    health: Arc<HealthState>,
}

impl Harness {
    fn new() -> Self {
        Self::with_policy(MutationPolicy::default())
    }

    fn with_policy(policy: MutationPolicy) -> Self {
        let health = Arc::new(HealthState::new());
        let state = Arc::new(WebhookState::new(policy, health.clone()));
        Self {
            router: create_webhook_router(state),
            health,
        }
    }

    async fn call(&self, method: Method, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(MUTATE_PATH)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn post(&self, body: Vec<u8>) -> (StatusCode, Value) {
        let (status, bytes) = self.call(Method::POST, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn test_add_patch_end_to_end() {
    let harness = Harness::new();
    let body = ReviewBuilder::new("abc-123")
        .volume(json!({"emptyDir": {}}))
        .empty_node_selector()
        .to_bytes();

    let (status, review) = harness.post(body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["kind"], "AdmissionReview");
    assert_eq!(review["apiVersion"], META_API_VERSION_V1BETA1);

    let response = &review["response"];
    assert_eq!(response["uid"], "abc-123");
    assert_eq!(response["allowed"], true);
    assert_eq!(response["patchType"], "JSONPatch");
    assert_eq!(
        decode_wire_patch(response).unwrap(),
        json!([{
            "op": "add",
            "path": "/spec/template/spec/nodeSelector",
            "value": {"zone": "internal"}
        }])
    );
}

#[tokio::test]
async fn test_remove_patch_end_to_end() {
    let harness = Harness::new();
    let body = ReviewBuilder::new("def-456")
        .config_map("settings")
        .node_selector("zone", "internal")
        .to_bytes();

    let (status, review) = harness.post(body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["response"]["uid"], "def-456");
    assert_eq!(
        decode_wire_patch(&review["response"]).unwrap(),
        json!([{"op": "remove", "path": "/spec/template/spec/nodeSelector/zone"}])
    );
    assert_eq!(harness.health.metrics.admissions("remove"), 1);
}

#[tokio::test]
async fn test_no_patch_fields_when_unchanged() {
    let harness = Harness::new();

    for body in [
        ReviewBuilder::new("u-1").to_bytes(),
        ReviewBuilder::new("u-2")
            .empty_dir("scratch")
            .node_selector("zone", "internal")
            .to_bytes(),
    ] {
        let (status, review) = harness.post(body).await;
        assert_eq!(status, StatusCode::OK);

        let response = review["response"].as_object().unwrap();
        assert_eq!(response["allowed"], true);
        assert!(!response.contains_key("patch"));
        assert!(!response.contains_key("patchType"));
    }

    assert_eq!(harness.health.metrics.admissions("none"), 2);
}

#[tokio::test]
async fn test_v1_envelope_is_echoed() {
    let harness = Harness::new();
    let body = ReviewBuilder::new("v1-uid")
        .api_version(META_API_VERSION_V1)
        .empty_dir("scratch")
        .to_bytes();

    let (_, review) = harness.post(body).await;
    assert_eq!(review["apiVersion"], META_API_VERSION_V1);
    assert_eq!(review["response"]["uid"], "v1-uid");
}

#[tokio::test]
async fn test_unrecognized_kind_passes_through() {
    let harness = Harness::new();
    let body = ReviewBuilder::new("k-1")
        .kind("Deployment")
        .empty_dir("scratch")
        .to_bytes();

    let (status, review) = harness.post(body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["response"]["allowed"], true);
    assert!(review["response"].get("patch").is_none());
}

#[tokio::test]
async fn test_configured_kinds_are_mutated() {
    let harness = Harness::with_policy(MutationPolicy::new(["Deployment"]));
    let body = ReviewBuilder::new("k-2")
        .kind("Deployment")
        .empty_dir("scratch")
        .to_bytes();

    let (_, review) = harness.post(body).await;
    assert_eq!(review["response"]["patchType"], "JSONPatch");
}

#[tokio::test]
async fn test_malformed_bodies_get_fixed_bad_request() {
    let harness = Harness::new();
    let bodies = [
        b"not json at all".to_vec(),
        b"{}".to_vec(),
        ReviewBuilder::new("x").without_uid().to_bytes(),
        ReviewBuilder::new("x").without_kind().to_bytes(),
        json!({"request": {"uid": "x", "kind": {"kind": "DeploymentConfig"}, "object": {"spec": {}}}})
            .to_string()
            .into_bytes(),
    ];
    let count = bodies.len() as u64;

    for body in bodies {
        let (status, review) = harness.post(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let response = &review["response"];
        assert_eq!(response["allowed"], false);
        assert_eq!(response["status"]["message"], BAD_REQUEST_MESSAGE);
        assert!(response.get("patch").is_none());
        assert!(response.get("patchType").is_none());
    }

    assert_eq!(harness.health.metrics.admissions("malformed"), count);
}

#[tokio::test]
async fn test_large_update_review_is_mutated() {
    let harness = Harness::new();
    let builder = ReviewBuilder::new("big-1").empty_dir("scratch");

    // Object and oldObject each near the 1.5 MiB object size limit
    let filler = "x".repeat(1_200_000);
    let mut object = builder.object();
    object["metadata"]["annotations"] = json!({"example.com/blob": filler});
    let mut review = builder.build();
    review["request"]["operation"] = json!("UPDATE");
    review["request"]["object"] = object.clone();
    review["request"]["oldObject"] = object;

    let body = review.to_string().into_bytes();
    assert!(body.len() > 2 * 1024 * 1024);
    assert!(body.len() < MAX_REVIEW_BYTES);

    let (status, review) = harness.post(body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["response"]["uid"], "big-1");
    assert_eq!(review["response"]["patchType"], "JSONPatch");
    assert_eq!(harness.health.metrics.admissions("add"), 1);
}

#[tokio::test]
async fn test_oversized_review_is_refused() {
    let harness = Harness::new();
    let (status, _) = harness
        .call(Method::POST, vec![b' '; MAX_REVIEW_BYTES + 1])
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_get_is_tolerated() {
    let harness = Harness::new();
    let (status, body) = harness.call(Method::GET, Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let harness = Harness::new();
    let (status, _) = harness.call(Method::PUT, Vec::new()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let harness = Arc::new(Harness::new());
    let mut tasks = Vec::new();

    for i in 0..32 {
        let harness = harness.clone();
        tasks.push(tokio::spawn(async move {
            let uid = format!("uid-{i}");
            let builder = if i % 2 == 0 {
                ReviewBuilder::new(&uid).empty_dir("scratch")
            } else {
                ReviewBuilder::new(&uid).node_selector("zone", "internal")
            };
            let (status, review) = harness.post(builder.to_bytes()).await;
            (i, uid, status, review)
        }));
    }

    for task in tasks {
        let (i, uid, status, review) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(review["response"]["uid"], uid.as_str());
        let op = decode_wire_patch(&review["response"]).unwrap()[0]["op"].clone();
        assert_eq!(op, if i % 2 == 0 { "add" } else { "remove" });
    }

    assert_eq!(harness.health.metrics.admissions("add"), 16);
    assert_eq!(harness.health.metrics.admissions("remove"), 16);
}
