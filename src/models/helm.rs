//! Helm release identities

use kube::core::DynamicObject;

/// Name and namespace of a live HelmRelease
///
/// Only membership matters, so duplicates in a pool are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HelmReleaseIdentity {
    pub name: String,
    pub namespace: String,
}

impl HelmReleaseIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl From<&DynamicObject> for HelmReleaseIdentity {
    fn from(obj: &DynamicObject) -> Self {
        Self {
            name: obj.metadata.name.clone().unwrap_or_default(),
            namespace: obj.metadata.namespace.clone().unwrap_or_default(),
        }
    }
}
