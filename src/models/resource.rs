//! Helpers over `DynamicObject`
//!
//! Resources arrive as untyped `DynamicObject`s. Missing type information or
//! metadata never fails here; it reads as an empty string so that filters
//! simply do not match.

use kube::ResourceExt;
use kube::core::DynamicObject;

/// API group of a resource, taken from its `apiVersion`
///
/// - `apps/v1` -> `apps`
/// - `v1` -> `` (core group)
/// - missing type information -> ``
pub fn api_group(obj: &DynamicObject) -> &str {
    match obj.types.as_ref() {
        Some(types) => match types.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        },
        None => "",
    }
}

/// Full `apiVersion` of a resource, empty when missing
pub fn api_version(obj: &DynamicObject) -> &str {
    obj.types
        .as_ref()
        .map(|t| t.api_version.as_str())
        .unwrap_or_default()
}

/// Kind of a resource, empty when missing
pub fn kind(obj: &DynamicObject) -> &str {
    obj.types
        .as_ref()
        .map(|t| t.kind.as_str())
        .unwrap_or_default()
}

/// Build the ID Flux records in a Kustomization inventory for this resource
///
/// Format: `<namespace>_<name>_<group>_<Kind>`. Namespace and name come from
/// the resource's own metadata. Cluster-scoped resources start with `_` and
/// core-group resources contain `__`, exactly like the IDs Flux writes.
pub fn inventory_id(obj: &DynamicObject) -> String {
    format!(
        "{}_{}_{}_{}",
        obj.metadata.namespace.as_deref().unwrap_or_default(),
        obj.metadata.name.as_deref().unwrap_or_default(),
        api_group(obj),
        kind(obj)
    )
}

/// Short human-readable description used in log lines
pub fn describe(obj: &DynamicObject) -> String {
    format!(
        "{} {} {}",
        obj.name_any(),
        obj.namespace().unwrap_or_default(),
        api_version(obj)
    )
}
