//! Shared helpers for the integration test binaries.

#![allow(dead_code)]


use base64::{Engine, engine::general_purpose::STANDARD};
use nodeselector_mutator::AdmissionResponse;
use serde_json::Value;

/// Decode a response patch into its JSON Patch document.
pub fn patch_document(response: &AdmissionResponse) -> Option<Value> {
    response
        .patch
        .as_deref()
        .map(|bytes| serde_json::from_slice(bytes).expect("patch is JSON"))
}

/// Decode the base64 `patch` field of a serialized response.
pub fn decode_wire_patch(response: &Value) -> Option<Value> {
    response.get("patch").and_then(Value::as_str).map(|encoded| {
        let bytes = STANDARD.decode(encoded).expect("patch is base64");
        serde_json::from_slice(&bytes).expect("patch is JSON")
    })
}

/// Apply a response's patch to a workload object, as the API server would.
pub fn apply_patch(object: &mut Value, response: &AdmissionResponse) {
    if let Some(document) = patch_document(response) {
        let patch: json_patch::Patch =
            serde_json::from_value(document).expect("patch is a JSON Patch");
        json_patch::patch(object, &patch.0).expect("patch applies");
    }
}
