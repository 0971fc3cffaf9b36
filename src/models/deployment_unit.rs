//! Deployment units and their inventories
//!
//! A deployment unit is a Kustomization-like object. After each successful
//! reconciliation Flux records every object it applied in
//! `status.inventory.entries[]`, which is what membership checks run against.

use kube::core::DynamicObject;
use serde_json::Value;

/// A single inventory record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InventoryEntry {
    /// Object ID, `<namespace>_<name>_<group>_<Kind>`
    pub id: String,
    /// API version the object was applied with, if recorded
    pub version: Option<String>,
}

impl InventoryEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }
}

/// A Kustomization-like object reduced to what zombie detection needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentUnit {
    pub name: String,
    pub namespace: String,
    /// `None` when the unit never reconciled successfully
    pub inventory: Option<Vec<InventoryEntry>>,
}

impl DeploymentUnit {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        inventory: Option<Vec<InventoryEntry>>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            inventory,
        }
    }

    /// Whether the last recorded inventory lists `id`
    ///
    /// An absent inventory never contains anything.
    pub fn contains(&self, id: &str) -> bool {
        self.inventory
            .as_deref()
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }
}

impl From<&DynamicObject> for DeploymentUnit {
    fn from(obj: &DynamicObject) -> Self {
        Self {
            name: obj.metadata.name.clone().unwrap_or_default(),
            namespace: obj.metadata.namespace.clone().unwrap_or_default(),
            inventory: extract_inventory(&obj.data),
        }
    }
}

/// Extract `status.inventory.entries` from an object's body
///
/// Returns `None` when the object carries no inventory at all, which is the
/// case for units that never reconciled.
pub fn extract_inventory(data: &Value) -> Option<Vec<InventoryEntry>> {
    let entries = data
        .get("status")
        .and_then(|s| s.get("inventory"))
        .and_then(|i| i.get("entries"))
        .and_then(|e| e.as_array())?;

    tracing::debug!(
        "Found status.inventory.entries with {} items",
        entries.len()
    );

    let mut parsed = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match entry.get("id").and_then(|i| i.as_str()) {
            Some(id) => parsed.push(InventoryEntry {
                id: id.to_string(),
                version: entry.get("v").and_then(|v| v.as_str()).map(str::to_string),
            }),
            None => tracing::warn!("Skipping inventory entry {} without id: {:?}", idx, entry),
        }
    }

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_inventory_entries() {
        let data = json!({
            "status": {
                "inventory": {
                    "entries": [
                        { "id": "_cabot-book__Namespace", "v": "v1" },
                        { "id": "cabot-book_cabot-book_apps_Deployment", "v": "v1" },
                        { "v": "v1" }
                    ]
                }
            }
        });

        let entries = extract_inventory(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "_cabot-book__Namespace");
        assert_eq!(entries[0].version.as_deref(), Some("v1"));
        assert_eq!(entries[1].id, "cabot-book_cabot-book_apps_Deployment");
    }

    #[test]
    fn test_missing_inventory_is_none() {
        assert!(extract_inventory(&json!({ "status": {} })).is_none());
        assert!(extract_inventory(&json!({})).is_none());
    }

    #[test]
    fn test_unit_from_kustomization() {
        let ks: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "kustomize.toolkit.fluxcd.io/v1",
            "kind": "Kustomization",
            "metadata": { "name": "apps", "namespace": "flux-system" },
            "spec": { "path": "./apps" },
            "status": {
                "inventory": {
                    "entries": [{ "id": "default_web_apps_Deployment", "v": "v1" }]
                }
            }
        }))
        .unwrap();

        let unit = DeploymentUnit::from(&ks);
        assert_eq!(unit.name, "apps");
        assert_eq!(unit.namespace, "flux-system");
        assert!(unit.contains("default_web_apps_Deployment"));
        assert!(!unit.contains("default_web__Service"));
    }

    #[test]
    fn test_contains_without_inventory() {
        let unit = DeploymentUnit::new("apps", "flux-system", None);
        assert!(!unit.contains("default_web_apps_Deployment"));

        let empty = DeploymentUnit::new("apps", "flux-system", Some(Vec::new()));
        assert!(!empty.contains("default_web_apps_Deployment"));
    }
}
