//! Flux Zombies Library
//!
//! Finds Kubernetes resources that nothing manages anymore: no owner
//! reference, no live HelmRelease, and no Kustomization whose last applied
//! inventory lists them.
//!
//! The engine lives in [`collector`]; [`pool`] builds its inputs from
//! manifests and [`config`] holds the user's exclusion rules.

pub mod collector;
pub mod config;
pub mod models;
pub mod pool;

// Re-export commonly used types for convenience
pub use collector::{
    CancelHandle, CancelToken, DiagnosticSink, Discovery, DiscoveryError, ResourceFilter,
    cancellation, default_filters,
};
pub use models::{DeploymentUnit, HelmReleaseIdentity, InventoryEntry, LabelSelector, inventory_id};
pub use pool::ResourcePools;
