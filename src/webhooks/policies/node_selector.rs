//! Zone placement policy.
//!
//! Pods using node-local scratch space (`emptyDir`) must run in the internal
//! zone; pods without it must not be pinned there.
//!
//! | emptyDir | zone=internal | mutation            |
//! |----------|---------------|---------------------|
//! | yes      | no            | add selector        |
//! | no       | yes           | remove `zone` key   |
//! | yes      | yes           | none                |
//! | no       | no            | none                |

use super::pod_spec::PodSpecView;
use super::{Mutation, NoPatchReason};

/// Node selector label that pins a pod to a zone
pub const ZONE_LABEL: &str = "zone";
/// Zone required by pods with `emptyDir` volumes
pub const INTERNAL_ZONE: &str = "internal";

/// Replaces the whole `nodeSelector`; any other selector keys are dropped.
pub const ADD_ZONE_PATCH: &str =
    r#"[{"op":"add","path":"/spec/template/spec/nodeSelector","value":{"zone":"internal"}}]"#;

/// Removes only the `zone` key, keeping any other selector keys.
pub const REMOVE_ZONE_PATCH: &str =
    r#"[{"op":"remove","path":"/spec/template/spec/nodeSelector/zone"}]"#;

/// Apply the placement table to a resolved pod spec
pub fn evaluate(pod_spec: &PodSpecView<'_>) -> Mutation {
    match (pod_spec.has_empty_dir(), pod_spec.has_internal_zone()) {
        (true, false) => Mutation::AddZoneSelector,
        (false, true) => Mutation::RemoveZoneSelector,
        (true, true) => Mutation::Unchanged(NoPatchReason::AlreadyPinned),
        (false, false) => Mutation::Unchanged(NoPatchReason::NotApplicable),
    }
}
