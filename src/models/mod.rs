//! Flux Zombies Model Layer
//!
//! Typed views over the Kubernetes objects the discovery engine consumes.
//!
//! Structure:
//! - `resource.rs` - Helpers over `DynamicObject` (group, kind, inventory IDs)
//! - `helm.rs` - Helm release identities
//! - `deployment_unit.rs` - Kustomization-like units and their inventories
//! - `selector.rs` - Label selectors restricting the scanned resources

pub mod deployment_unit;
pub mod helm;
pub mod resource;
pub mod selector;

pub use deployment_unit::{DeploymentUnit, InventoryEntry};
pub use helm::HelmReleaseIdentity;
pub use resource::{api_group, api_version, describe, inventory_id, kind};
pub use selector::{LabelSelector, SelectorError};

/// Label carrying the name of the HelmRelease that installed a resource
pub const HELM_NAME_LABEL: &str = "helm.toolkit.fluxcd.io/name";
/// Label carrying the namespace of the HelmRelease that installed a resource
pub const HELM_NAMESPACE_LABEL: &str = "helm.toolkit.fluxcd.io/namespace";
/// Label carrying the name of the Kustomization that applied a resource
pub const KUSTOMIZE_NAME_LABEL: &str = "kustomize.toolkit.fluxcd.io/name";
/// Label carrying the namespace of the Kustomization that applied a resource
pub const KUSTOMIZE_NAMESPACE_LABEL: &str = "kustomize.toolkit.fluxcd.io/namespace";
/// Annotation set on token secrets created for a service account
pub const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";

/// API group of Flux HelmRelease objects
pub const HELM_GROUP: &str = "helm.toolkit.fluxcd.io";
/// API group of Flux Kustomization objects
pub const KUSTOMIZE_GROUP: &str = "kustomize.toolkit.fluxcd.io";
