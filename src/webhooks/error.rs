//! Error type for admission reviews that cannot be interpreted.

use thiserror::Error;

/// An inbound AdmissionReview that cannot be evaluated.
///
/// The transport maps every variant to the same fixed `400 Bad Request`
/// response; the variants exist so logs say exactly what was wrong.
#[derive(Debug, Error)]
pub enum MalformedRequest {
    /// The body is not a JSON AdmissionReview envelope
    #[error("request body is not a valid AdmissionReview: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required field is absent (or explicitly null)
    #[error("missing required field `{path}`")]
    MissingField { path: String },

    /// A required field is present but has the wrong JSON type
    #[error("field `{path}` must be {expected}")]
    WrongType { path: String, expected: &'static str },
}

impl MalformedRequest {
    pub fn missing(path: impl Into<String>) -> Self {
        MalformedRequest::MissingField { path: path.into() }
    }

    pub fn wrong_type(path: impl Into<String>, expected: &'static str) -> Self {
        MalformedRequest::WrongType {
            path: path.into(),
            expected,
        }
    }

    /// Dotted path of the offending field, if the error is field-scoped
    pub fn path(&self) -> Option<&str> {
        match self {
            MalformedRequest::InvalidJson(_) => None,
            MalformedRequest::MissingField { path } | MalformedRequest::WrongType { path, .. } => {
                Some(path)
            }
        }
    }
}
