//! Read-only view over a workload's pod template spec.

use serde_json::Value;

use super::node_selector::{INTERNAL_ZONE, ZONE_LABEL};
use crate::webhooks::error::MalformedRequest;
use crate::webhooks::path::Lookup;

/// Location of the pod spec inside a workload object
pub const POD_SPEC_PATH: [&str; 3] = ["spec", "template", "spec"];

/// A resolved `object.spec.template.spec`.
///
/// `volumes` and `nodeSelector` are optional; when absent (or not the
/// expected shape) they read as empty.
#[derive(Clone, Debug)]
pub struct PodSpecView<'a> {
    spec: Lookup<'a>,
}

impl<'a> PodSpecView<'a> {
    /// Resolve the pod spec of a workload object, which must be a JSON object.
    pub fn resolve(object: &'a Value) -> Result<Self, MalformedRequest> {
        let spec = Lookup::root("request.object", object).at(&POD_SPEC_PATH);
        spec.require_object()?;
        Ok(Self { spec })
    }

    /// Whether any volume carries an `emptyDir` key, whatever its value
    pub fn has_empty_dir(&self) -> bool {
        self.spec
            .clone()
            .at(&["volumes"])
            .as_array()
            .is_some_and(|volumes| {
                volumes
                    .iter()
                    .filter_map(Value::as_object)
                    .any(|volume| volume.contains_key("emptyDir"))
            })
    }

    /// Whether `nodeSelector.zone` is exactly `internal`
    pub fn has_internal_zone(&self) -> bool {
        self.spec.clone().at(&["nodeSelector", ZONE_LABEL]).as_str() == Some(INTERNAL_ZONE)
    }
}
