//! Mutation policy for workload admission requests.
//!
//! A request is evaluated in two steps:
//! - Structural: the pod template spec must resolve (otherwise `MalformedRequest`)
//! - Placement: workloads with `emptyDir` volumes are pinned to the internal
//!   zone, and workloads without them are released from it
//!
//! Evaluation is pure. It performs no I/O, holds no state and never logs; the
//! transport decides what to record about each [`Decision`].

pub mod node_selector;
pub mod pod_spec;

use std::fmt;

use super::error::MalformedRequest;
use super::review::{AdmissionRequest, AdmissionResponse};
use pod_spec::PodSpecView;

/// Workload kind mutated when no other kinds are configured
pub const DEFAULT_WORKLOAD_KIND: &str = "DeploymentConfig";

/// Which workload kinds the placement policy applies to.
///
/// Requests for any other kind are admitted unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationPolicy {
    workload_kinds: Vec<String>,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self::new([DEFAULT_WORKLOAD_KIND])
    }
}

impl MutationPolicy {
    pub fn new<I, S>(workload_kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            workload_kinds: workload_kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn workload_kinds(&self) -> &[String] {
        &self.workload_kinds
    }

    pub fn recognizes(&self, kind: &str) -> bool {
        self.workload_kinds.iter().any(|k| k == kind)
    }
}

/// Why a valid request produced no patch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoPatchReason {
    /// Has `emptyDir` and is already pinned to the internal zone
    AlreadyPinned,
    /// Has no `emptyDir` and is not pinned to the internal zone
    NotApplicable,
    /// The request kind is not a configured workload kind
    UnrecognizedKind,
}

/// The single change (if any) made to a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Replace the pod template `nodeSelector` with `{zone: internal}`
    AddZoneSelector,
    /// Remove only the `zone` key from the pod template `nodeSelector`
    RemoveZoneSelector,
    Unchanged(NoPatchReason),
}

impl Mutation {
    /// The JSON Patch document this mutation emits
    pub fn patch(&self) -> Option<&'static str> {
        match self {
            Mutation::AddZoneSelector => Some(node_selector::ADD_ZONE_PATCH),
            Mutation::RemoveZoneSelector => Some(node_selector::REMOVE_ZONE_PATCH),
            Mutation::Unchanged(_) => None,
        }
    }

    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::AddZoneSelector => "add",
            Mutation::RemoveZoneSelector => "remove",
            Mutation::Unchanged(_) => "none",
        }
    }

    pub fn is_patch(&self) -> bool {
        self.patch().is_some()
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddZoneSelector => {
                write!(f, "contains emptyDir, patching to add nodeSelector")
            }
            Mutation::RemoveZoneSelector => {
                write!(f, "does not contain emptyDir, patching to remove nodeSelector")
            }
            Mutation::Unchanged(NoPatchReason::AlreadyPinned) => {
                write!(f, "contains emptyDir and is already pinned, no patch")
            }
            Mutation::Unchanged(NoPatchReason::NotApplicable) => {
                write!(f, "does not contain emptyDir and is not pinned, no patch")
            }
            Mutation::Unchanged(NoPatchReason::UnrecognizedKind) => {
                write!(f, "is not a mutated workload kind, no patch")
            }
        }
    }
}

/// Outcome of [`decide`]: what was chosen and the response carrying it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub mutation: Mutation,
    pub response: AdmissionResponse,
}

/// Choose the mutation for a request.
///
/// The pod spec is resolved before the kind is consulted, so a request whose
/// object has no `spec.template.spec` is malformed whatever its kind.
pub fn evaluate(
    request: &AdmissionRequest,
    policy: &MutationPolicy,
) -> Result<Mutation, MalformedRequest> {
    let pod_spec = PodSpecView::resolve(&request.object)?;

    if !policy.recognizes(&request.kind) {
        return Ok(Mutation::Unchanged(NoPatchReason::UnrecognizedKind));
    }

    Ok(node_selector::evaluate(&pod_spec))
}

/// Evaluate a request and build its admission response.
///
/// The response always copies the request uid and is always allowed; patch
/// fields are present only when the mutation emits a patch.
pub fn decide(
    request: &AdmissionRequest,
    policy: &MutationPolicy,
) -> Result<Decision, MalformedRequest> {
    let mutation = evaluate(request, policy)?;

    let response = AdmissionResponse::from(request);
    let response = match mutation.patch() {
        Some(document) => response.with_patch(document),
        None => response,
    };

    Ok(Decision { mutation, response })
}
