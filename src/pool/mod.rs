//! Resource pools
//!
//! Builds the three inputs of a discovery pass from manifests on disk: the
//! candidate resources, the live HelmReleases and the Kustomizations with
//! their inventories. Accepts YAML (multi-document) or JSON, and unwraps
//! core `v1` `List` objects such as the output of `kubectl get -o yaml`.

use std::path::Path;

use anyhow::{Context, Result};
use kube::ResourceExt;
use kube::core::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    self, DeploymentUnit, HELM_GROUP, HelmReleaseIdentity, KUSTOMIZE_GROUP, LabelSelector,
};

/// Read-only snapshot consumed by one discovery pass
#[derive(Debug, Clone, Default)]
pub struct ResourcePools {
    /// Every object found, Flux objects included
    pub resources: Vec<DynamicObject>,
    /// `HelmRelease` objects
    pub helm_releases: Vec<DynamicObject>,
    /// `Kustomization` objects
    pub kustomizations: Vec<DynamicObject>,
}

impl ResourcePools {
    /// Load and merge manifests from several files
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut pools = Self::default();
        for path in paths {
            let path = path.as_ref();
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
            let objects = parse_manifests(&contents)
                .with_context(|| format!("Failed to parse manifest file: {}", path.display()))?;

            tracing::debug!("Loaded {} objects from {}", objects.len(), path.display());
            pools.extend(objects);
        }
        Ok(pools)
    }

    /// Build pools from manifest text
    pub fn from_manifests(contents: &str) -> Result<Self> {
        let mut pools = Self::default();
        pools.extend(parse_manifests(contents)?);
        Ok(pools)
    }

    /// Add objects, sorting Flux objects into their pools as well
    pub fn extend(&mut self, objects: impl IntoIterator<Item = DynamicObject>) {
        for obj in objects {
            match (models::api_group(&obj), models::kind(&obj)) {
                (HELM_GROUP, "HelmRelease") => self.helm_releases.push(obj.clone()),
                (KUSTOMIZE_GROUP, "Kustomization") => self.kustomizations.push(obj.clone()),
                _ => {}
            }
            self.resources.push(obj);
        }
    }

    /// Keep only the candidate resources matching `selector`
    ///
    /// HelmReleases and Kustomizations stay pooled, so membership checks still
    /// see every release and inventory.
    pub fn retain_candidates(&mut self, selector: &LabelSelector) {
        let before = self.resources.len();
        self.resources.retain(|obj| selector.matches(obj.labels()));
        tracing::debug!(
            "Label selector kept {} of {} resources",
            self.resources.len(),
            before
        );
    }

    /// Helm release identities for the helm release filter
    pub fn helm_release_identities(&self) -> Vec<HelmReleaseIdentity> {
        self.helm_releases
            .iter()
            .map(HelmReleaseIdentity::from)
            .collect()
    }

    /// Deployment units for the kustomization filter
    pub fn deployment_units(&self) -> Vec<DeploymentUnit> {
        self.kustomizations
            .iter()
            .map(DeploymentUnit::from)
            .collect()
    }
}

/// Parse every object in a YAML or JSON document stream
pub fn parse_manifests(contents: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();

    for (idx, document) in serde_yaml::Deserializer::from_str(contents).enumerate() {
        let value = Value::deserialize(document)
            .with_context(|| format!("Invalid document at index {}", idx))?;
        collect_objects(value, &mut objects)
            .with_context(|| format!("Invalid object in document {}", idx))?;
    }

    Ok(objects)
}

fn collect_objects(value: Value, objects: &mut Vec<DynamicObject>) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(mut map) => {
            if is_list(&map) {
                if let Some(Value::Array(items)) = map.remove("items") {
                    for item in items {
                        collect_objects(item, objects)?;
                    }
                }
                return Ok(());
            }

            let obj: DynamicObject = serde_json::from_value(Value::Object(map))
                .context("Object is not a Kubernetes resource")?;
            objects.push(obj);
            Ok(())
        }
        other => Err(anyhow::anyhow!(
            "Expected a Kubernetes object, found {}",
            other
        )),
    }
}

/// `List` or a typed list such as `ConfigMapList`, as served by the core API.
/// Custom resources whose kind ends in `List` are kept as objects.
fn is_list(map: &serde_json::Map<String, Value>) -> bool {
    map.get("apiVersion").and_then(Value::as_str) == Some("v1")
        && map
            .get("kind")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind.ends_with("List"))
        && map.get("items").is_some_and(Value::is_array)
}
