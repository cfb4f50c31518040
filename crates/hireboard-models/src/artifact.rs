//! Artifact references.

use serde::{Deserialize, Serialize};

/// Opaque handle to a file stored in the external object store.
///
/// Ownership belongs to whichever parent record holds the ref; replacing a
/// ref must release the previous object from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Object key in the external store, used for deletion.
    pub public_id: String,
    /// Publicly reachable URL for the object.
    pub url: String,
}

impl ArtifactRef {
    pub fn new(public_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            url: url.into(),
        }
    }
}
