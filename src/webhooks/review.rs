//! AdmissionReview wire types.
//!
//! The envelope is parsed leniently and then resolved into a typed
//! [`AdmissionRequest`] so every structural problem surfaces as a
//! [`MalformedRequest`] naming the offending field. Responses carry the JSON
//! Patch as standard base64, which is how the API server decodes `[]byte`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::MalformedRequest;
use super::path::Lookup;

/// The `kind` of every AdmissionReview envelope
pub const META_KIND: &str = "AdmissionReview";
/// `apiVersion` for the v1 admission API
pub const META_API_VERSION_V1: &str = "admission.k8s.io/v1";
/// `apiVersion` for the v1beta1 admission API (used when none is given)
pub const META_API_VERSION_V1BETA1: &str = "admission.k8s.io/v1beta1";

fn default_api_version() -> String {
    META_API_VERSION_V1BETA1.to_string()
}

fn default_kind() -> String {
    META_KIND.to_string()
}

/// The AdmissionReview envelope, used for both directions.
///
/// `request` is kept untyped until [`AdmissionRequest::from_review`] resolves
/// the fields this webhook needs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Parse a raw HTTP body
    pub fn from_slice(body: &[u8]) -> Result<Self, MalformedRequest> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// The parts of an admission request this webhook reads.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionRequest {
    /// Envelope version, echoed back on the response
    pub api_version: String,
    /// Correlation id, copied verbatim onto the response
    pub uid: String,
    /// `request.kind.kind`, e.g. `DeploymentConfig`
    pub kind: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub operation: Option<String>,
    /// `request.object`, guaranteed to be a JSON object
    pub object: Value,
}

impl AdmissionRequest {
    /// Resolve the required request fields out of a parsed envelope.
    ///
    /// Requires `request.uid`, `request.kind.kind` and an object at
    /// `request.object`. The pod spec path inside the object is checked by the
    /// decision engine, not here.
    pub fn from_review(review: AdmissionReview) -> Result<Self, MalformedRequest> {
        let AdmissionReview {
            api_version,
            request,
            ..
        } = review;
        let request = request.ok_or_else(|| MalformedRequest::missing("request"))?;
        let root = Lookup::root("request", &request);
        root.require_object()?;

        let uid = root.clone().at(&["uid"]).require_str()?.to_string();
        let kind = root.clone().at(&["kind", "kind"]).require_str()?.to_string();
        let object = root.clone().at(&["object"]);
        object.require_object()?;

        Ok(Self {
            api_version,
            uid,
            kind,
            name: root.clone().at(&["name"]).as_str().map(str::to_string),
            namespace: root.clone().at(&["namespace"]).as_str().map(str::to_string),
            operation: root.at(&["operation"]).as_str().map(str::to_string),
            object: object.require()?.clone(),
        })
    }
}

/// The only patch format the API server accepts from webhooks
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    JsonPatch,
}

/// `metav1.Status` subset returned on rejected reviews
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub status: String,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

/// The response half of an AdmissionReview.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Envelope version this response will be wrapped in
    #[serde(skip)]
    pub api_version: String,
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
    /// Raw JSON Patch bytes; base64 on the wire
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub patch: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl From<&AdmissionRequest> for AdmissionResponse {
    fn from(request: &AdmissionRequest) -> Self {
        Self {
            api_version: request.api_version.clone(),
            uid: request.uid.clone(),
            allowed: true,
            patch_type: None,
            patch: None,
            status: None,
        }
    }
}

impl AdmissionResponse {
    /// Response for a review that could not be read. There is no request to
    /// copy a uid from, so it is left empty.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            uid: String::new(),
            allowed: false,
            patch_type: None,
            patch: None,
            status: Some(Status {
                status: "Failure".to_string(),
                message: message.into(),
                reason: "BadRequest".to_string(),
                code: 400,
            }),
        }
    }

    /// Attach a JSON Patch document
    #[must_use]
    pub fn with_patch(mut self, document: &'static str) -> Self {
        self.patch = Some(document.as_bytes().to_vec());
        self.patch_type = Some(PatchType::JsonPatch);
        self
    }

    pub fn into_review(self) -> AdmissionReview {
        let api_version = if self.api_version.is_empty() {
            default_api_version()
        } else {
            self.api_version.clone()
        };
        AdmissionReview {
            api_version,
            kind: default_kind(),
            request: None,
            response: Some(self),
        }
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
