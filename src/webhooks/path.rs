//! Explicit lookups into untyped JSON documents.
//!
//! Admission objects arrive as arbitrary JSON. Rather than defaulting missing
//! levels to empty maps, every walk ends in either [`Lookup::Found`] or
//! [`Lookup::Absent`], and the caller decides whether absence is an error
//! (`require_*`) or an empty default (`as_*`).
//!
//! ```
//! use nodeselector_mutator::webhooks::path::Lookup;
//! use serde_json::json;
//!
//! let doc = json!({"spec": {"template": {"spec": {}}}});
//! let spec = Lookup::root("object", &doc).at(&["spec", "template", "spec"]);
//! assert!(spec.as_object().is_some());
//!
//! let missing = Lookup::root("object", &doc).at(&["status", "phase"]);
//! assert_eq!(missing.path(), "object.status");
//! ```

use serde_json::{Map, Value};

use super::error::MalformedRequest;

/// Outcome of resolving a dotted path through a JSON document.
///
/// `path` always records how far resolution got: the full path for
/// `Found`, and the first missing segment for `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found { path: String, value: &'a Value },
    Absent { path: String },
}

impl<'a> Lookup<'a> {
    /// Start a lookup at `value`, reporting paths relative to `name`.
    pub fn root(name: &str, value: &'a Value) -> Self {
        if value.is_null() {
            Lookup::Absent {
                path: name.to_string(),
            }
        } else {
            Lookup::Found {
                path: name.to_string(),
                value,
            }
        }
    }

    /// Descend through object keys. JSON `null` is treated as absent, as is
    /// indexing into anything that is not an object.
    pub fn at(self, segments: &[&str]) -> Lookup<'a> {
        let mut lookup = self;
        for segment in segments {
            lookup = match lookup {
                Lookup::Found { path, value } => {
                    let path = join(&path, segment);
                    match value.get(*segment) {
                        None | Some(Value::Null) => Lookup::Absent { path },
                        Some(next) => Lookup::Found { path, value: next },
                    }
                }
                absent @ Lookup::Absent { .. } => return absent,
            };
        }
        lookup
    }

    pub fn path(&self) -> &str {
        match self {
            Lookup::Found { path, .. } | Lookup::Absent { path } => path,
        }
    }

    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Lookup::Found { value, .. } => Some(value),
            Lookup::Absent { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }

    pub fn as_object(&self) -> Option<&'a Map<String, Value>> {
        self.value().and_then(Value::as_object)
    }

    pub fn as_array(&self) -> Option<&'a Vec<Value>> {
        self.value().and_then(Value::as_array)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }

    /// The value, or `MissingField` naming the first absent segment
    pub fn require(&self) -> Result<&'a Value, MalformedRequest> {
        match self {
            Lookup::Found { value, .. } => Ok(value),
            Lookup::Absent { path } => Err(MalformedRequest::missing(path.as_str())),
        }
    }

    pub fn require_object(&self) -> Result<&'a Map<String, Value>, MalformedRequest> {
        self.require()?
            .as_object()
            .ok_or_else(|| MalformedRequest::wrong_type(self.path(), "an object"))
    }

    pub fn require_str(&self) -> Result<&'a str, MalformedRequest> {
        self.require()?
            .as_str()
            .ok_or_else(|| MalformedRequest::wrong_type(self.path(), "a string"))
    }
}

fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}
