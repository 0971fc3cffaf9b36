//! Resource filters
//!
//! Each filter answers one question: "is this resource accounted for by
//! mechanism X?". A `true` result means managed; the engine stops evaluating
//! further filters for that resource. Filters never fail. Missing labels,
//! annotations or type information simply mean the filter does not apply.

use kube::ResourceExt;
use kube::core::DynamicObject;

use super::DiagnosticSink;
use super::lookup::{find_identity, find_unit};
use crate::config::ExcludeRule;
use crate::models::{
    self, DeploymentUnit, HELM_NAME_LABEL, HELM_NAMESPACE_LABEL, HelmReleaseIdentity,
    KUSTOMIZE_NAME_LABEL, KUSTOMIZE_NAMESPACE_LABEL, SERVICE_ACCOUNT_ANNOTATION,
};

/// A single classification strategy
pub trait ResourceFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns true if the resource is managed by the mechanism this filter knows about
    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool;
}

fn is_core_secret(obj: &DynamicObject) -> bool {
    models::kind(obj) == "Secret" && models::api_version(obj) == "v1"
}

/// Matches any resource with at least one owner reference
///
/// The owner's kind, group and controller flag are irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnedResourceFilter;

impl ResourceFilter for OwnedResourceFilter {
    fn name(&self) -> &'static str {
        "owned-resource"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        if obj.owner_references().is_empty() {
            return false;
        }

        log.debug(&format!(
            "ignore resource owned by parent {}",
            models::describe(obj)
        ));
        true
    }
}

/// Matches `v1` Secrets created for a service account
///
/// The service account controller does not set owner references on these.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceAccountSecretFilter;

impl ResourceFilter for ServiceAccountSecretFilter {
    fn name(&self) -> &'static str {
        "service-account-secret"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        if !is_core_secret(obj) || !obj.annotations().contains_key(SERVICE_ACCOUNT_ANNOTATION) {
            return false;
        }

        log.debug(&format!(
            "ignore service account secret {}",
            models::describe(obj)
        ));
        true
    }
}

/// Matches `v1` Secrets Helm uses to store release state (`owner=helm`)
#[derive(Debug, Clone, Copy, Default)]
pub struct HelmSecretFilter;

impl ResourceFilter for HelmSecretFilter {
    fn name(&self) -> &'static str {
        "helm-secret"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        if !is_core_secret(obj) || obj.labels().get("owner").map(String::as_str) != Some("helm") {
            return false;
        }

        log.debug(&format!("ignore helm storage secret {}", models::describe(obj)));
        true
    }
}

/// Matches resources labeled for a HelmRelease that still exists
///
/// Both the name and the namespace label must be present. A resource labeled
/// for a release missing from the pool is an orphan and does not match.
#[derive(Debug, Clone, Default)]
pub struct HelmReleaseFilter {
    releases: Vec<HelmReleaseIdentity>,
}

impl HelmReleaseFilter {
    pub fn new(releases: Vec<HelmReleaseIdentity>) -> Self {
        Self { releases }
    }
}

impl ResourceFilter for HelmReleaseFilter {
    fn name(&self) -> &'static str {
        "helm-release"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        let labels = obj.labels();
        let (Some(name), Some(namespace)) =
            (labels.get(HELM_NAME_LABEL), labels.get(HELM_NAMESPACE_LABEL))
        else {
            return false;
        };

        if find_identity(&self.releases, name, namespace) {
            return true;
        }

        log.debug(&format!(
            "helmrelease [{}.{}] not found from resource {}",
            name,
            namespace,
            models::describe(obj)
        ));
        false
    }
}

/// Matches resources recorded in the inventory of the Kustomization they are labeled for
///
/// Carrying the labels is not enough: the resource must appear in the unit's
/// last recorded inventory. Resources removed from the source but not yet
/// pruned carry valid labels and still do not match.
#[derive(Debug, Clone, Default)]
pub struct KustomizationFilter {
    units: Vec<DeploymentUnit>,
}

impl KustomizationFilter {
    pub fn new(units: Vec<DeploymentUnit>) -> Self {
        Self { units }
    }
}

impl ResourceFilter for KustomizationFilter {
    fn name(&self) -> &'static str {
        "kustomization"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        let labels = obj.labels();
        let (Some(ks_name), Some(ks_namespace)) = (
            labels.get(KUSTOMIZE_NAME_LABEL),
            labels.get(KUSTOMIZE_NAMESPACE_LABEL),
        ) else {
            return false;
        };

        let Some(unit) = find_unit(&self.units, ks_name, ks_namespace) else {
            log.debug(&format!(
                "kustomization [{}.{}] not found from resource {}",
                ks_name,
                ks_namespace,
                models::describe(obj)
            ));
            return false;
        };

        let id = models::inventory_id(obj);
        log.debug(&format!(
            "lookup kustomization [{}.{}] inventory for {}",
            ks_name, ks_namespace, id
        ));

        if unit.contains(&id) {
            return true;
        }

        log.debug(&format!(
            "resource {} is not part of the kustomization [{}.{}] inventory",
            models::describe(obj),
            ks_name,
            ks_namespace
        ));
        false
    }
}

/// Matches resources selected by a user exclusion rule
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    rules: Vec<ExcludeRule>,
    cluster: Option<String>,
}

impl ExclusionFilter {
    /// Rules bound to a cluster only apply when `cluster` names that cluster
    pub fn new(rules: Vec<ExcludeRule>, cluster: Option<String>) -> Self {
        Self { rules, cluster }
    }
}

impl ResourceFilter for ExclusionFilter {
    fn name(&self) -> &'static str {
        "exclusion"
    }

    fn evaluate(&self, obj: &DynamicObject, log: &dyn DiagnosticSink) -> bool {
        let cluster = self.cluster.as_deref();
        let Some(index) = self
            .rules
            .iter()
            .position(|rule| rule.applies_to_cluster(cluster) && rule.matches(obj))
        else {
            return false;
        };

        log.debug(&format!(
            "ignore resource {} excluded by rule {}",
            models::describe(obj),
            index
        ));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockDiagnosticSink, NullSink};
    use crate::models::InventoryEntry;
    use serde_json::json;

    fn object(value: serde_json::Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    fn secret(name: &str) -> serde_json::Value {
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": { "name": name, "namespace": "default" }
        })
    }

    #[test]
    fn test_owned_resource_filter() {
        let owned = object(json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": {
                "name": "web-7d9f",
                "namespace": "default",
                "ownerReferences": [{
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "name": "web",
                    "uid": "1234"
                }]
            }
        }));
        let unowned = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "web", "namespace": "default" }
        }));

        assert!(OwnedResourceFilter.evaluate(&owned, &NullSink));
        assert!(!OwnedResourceFilter.evaluate(&unowned, &NullSink));
    }

    #[test]
    fn test_service_account_secret_filter() {
        let mut sa_secret = secret("sa-token");
        sa_secret["metadata"]["annotations"] =
            json!({ SERVICE_ACCOUNT_ANNOTATION: "" });
        assert!(ServiceAccountSecretFilter.evaluate(&object(sa_secret), &NullSink));

        assert!(!ServiceAccountSecretFilter.evaluate(&object(secret("plain")), &NullSink));

        // Annotation on something that is not a core Secret
        let cm = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "cm",
                "annotations": { SERVICE_ACCOUNT_ANNOTATION: "sa" }
            }
        }));
        assert!(!ServiceAccountSecretFilter.evaluate(&cm, &NullSink));
    }

    #[test]
    fn test_helm_secret_filter() {
        let mut helm_secret = secret("sh.helm.release.v1.app.v1");
        helm_secret["metadata"]["labels"] = json!({ "owner": "helm" });
        assert!(HelmSecretFilter.evaluate(&object(helm_secret), &NullSink));

        let mut other_owner = secret("other");
        other_owner["metadata"]["labels"] = json!({ "owner": "someone" });
        assert!(!HelmSecretFilter.evaluate(&object(other_owner), &NullSink));
    }

    #[test]
    fn test_helm_release_filter_requires_both_labels() {
        let filter = HelmReleaseFilter::new(vec![HelmReleaseIdentity::new("release", "test")]);
        let only_name = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "cm", "labels": { HELM_NAME_LABEL: "release" } }
        }));

        let mut log = MockDiagnosticSink::new();
        log.expect_debug().times(0);
        assert!(!filter.evaluate(&only_name, &log));
    }

    #[test]
    fn test_helm_release_filter_logs_missing_release() {
        let filter = HelmReleaseFilter::new(vec![HelmReleaseIdentity::new("release", "test")]);
        let orphan = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "cm",
                "labels": { HELM_NAME_LABEL: "release", HELM_NAMESPACE_LABEL: "prod" }
            }
        }));

        let mut log = MockDiagnosticSink::new();
        log.expect_debug()
            .withf(|msg| msg.contains("helmrelease [release.prod] not found"))
            .times(1)
            .return_const(());
        assert!(!filter.evaluate(&orphan, &log));
    }

    fn labeled_deployment(ks_name: &str, ks_namespace: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "web",
                "namespace": "default",
                "labels": {
                    KUSTOMIZE_NAME_LABEL: ks_name,
                    KUSTOMIZE_NAMESPACE_LABEL: ks_namespace
                }
            }
        }))
    }

    #[test]
    fn test_kustomization_filter_inventory_member() {
        let filter = KustomizationFilter::new(vec![DeploymentUnit::new(
            "apps",
            "flux-system",
            Some(vec![InventoryEntry::new("default_web_apps_Deployment")]),
        )]);

        assert!(filter.evaluate(&labeled_deployment("apps", "flux-system"), &NullSink));
    }

    #[test]
    fn test_kustomization_filter_pruned_candidate() {
        let filter = KustomizationFilter::new(vec![DeploymentUnit::new(
            "apps",
            "flux-system",
            Some(vec![InventoryEntry::new("default_web__Service")]),
        )]);

        let mut log = MockDiagnosticSink::new();
        log.expect_debug()
            .withf(|msg| msg.starts_with("lookup kustomization"))
            .times(1)
            .return_const(());
        log.expect_debug()
            .withf(|msg| msg.contains("is not part of the kustomization [apps.flux-system]"))
            .times(1)
            .return_const(());

        assert!(!filter.evaluate(&labeled_deployment("apps", "flux-system"), &log));
    }

    #[test]
    fn test_kustomization_filter_missing_unit() {
        let filter = KustomizationFilter::new(vec![DeploymentUnit::new(
            "apps",
            "flux-system",
            Some(vec![InventoryEntry::new("default_web_apps_Deployment")]),
        )]);

        let mut log = MockDiagnosticSink::new();
        log.expect_debug()
            .withf(|msg| msg.contains("kustomization [apps.other] not found"))
            .times(1)
            .return_const(());
        assert!(!filter.evaluate(&labeled_deployment("apps", "other"), &log));
    }

    #[test]
    fn test_kustomization_filter_never_reconciled() {
        let filter =
            KustomizationFilter::new(vec![DeploymentUnit::new("apps", "flux-system", None)]);
        assert!(!filter.evaluate(&labeled_deployment("apps", "flux-system"), &NullSink));
    }

    #[test]
    fn test_exclusion_filter_cluster_binding() {
        let rule = ExcludeRule {
            kind: Some("ConfigMap".to_string()),
            cluster: Some("staging".to_string()),
            ..Default::default()
        };
        let cm = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "kube-root-ca.crt", "namespace": "default" }
        }));

        let staging = ExclusionFilter::new(vec![rule.clone()], Some("staging".to_string()));
        assert!(staging.evaluate(&cm, &NullSink));

        let prod = ExclusionFilter::new(vec![rule.clone()], Some("prod".to_string()));
        assert!(!prod.evaluate(&cm, &NullSink));

        let unnamed = ExclusionFilter::new(vec![rule], None);
        assert!(!unnamed.evaluate(&cm, &NullSink));
    }
}
