//! Zombie discovery
//!
//! Runs an ordered chain of filters against every resource. A resource is a
//! zombie iff no filter recognizes it as managed. Zombies are handed to the
//! caller over a bounded `tokio::sync::mpsc` channel.
//!
//! ## Consumer contract
//!
//! Every emission is an awaited `send` on the caller's channel. With a channel
//! of capacity `n`, a pass producing more than `n` zombies only completes if a
//! consumer drains the receiver concurrently (typically a spawned task). The
//! engine never closes the channel: the caller owns the sender, so several
//! passes may feed the same receiver.

mod cancel;
mod diagnostics;
mod filter;
mod lookup;

pub use cancel::{CancelHandle, CancelToken, cancellation};
#[cfg(test)]
pub use diagnostics::MockDiagnosticSink;
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink};
pub use filter::{
    ExclusionFilter, HelmReleaseFilter, HelmSecretFilter, KustomizationFilter,
    OwnedResourceFilter, ResourceFilter, ServiceAccountSecretFilter,
};
pub use lookup::{find_identity, find_unit};

use std::sync::Arc;

use kube::core::DynamicObject;
use tokio::sync::mpsc;

use crate::models;
use crate::pool::ResourcePools;

/// Channel capacity used by the CLI when none is configured
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Reasons a discovery pass stops early
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery cancelled")]
    Cancelled,

    #[error("zombie consumer closed the channel")]
    ConsumerClosed,
}

/// The standard filter chain for a set of pools
///
/// Order: owned, service account secret, helm secret, helm release, kustomization.
pub fn default_filters(pools: &ResourcePools) -> Vec<Box<dyn ResourceFilter>> {
    vec![
        Box::new(OwnedResourceFilter),
        Box::new(ServiceAccountSecretFilter),
        Box::new(HelmSecretFilter),
        Box::new(HelmReleaseFilter::new(pools.helm_release_identities())),
        Box::new(KustomizationFilter::new(pools.deployment_units())),
    ]
}

/// Classifies resources with an ordered filter chain
pub struct Discovery {
    filters: Vec<Box<dyn ResourceFilter>>,
    log: Arc<dyn DiagnosticSink>,
}

impl Discovery {
    /// Create an engine without filters. Every resource is a zombie until filters are added.
    pub fn new(log: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            filters: Vec::new(),
            log,
        }
    }

    /// Append a filter to the end of the chain
    pub fn with_filter(mut self, filter: impl ResourceFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append several filters, keeping their order
    pub fn with_filters(mut self, filters: Vec<Box<dyn ResourceFilter>>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Names of the configured filters in evaluation order
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Whether any filter recognizes the resource. Stops at the first match.
    pub fn is_managed(&self, obj: &DynamicObject) -> bool {
        self.log
            .debug(&format!("validate resource {}", models::describe(obj)));

        self.filters
            .iter()
            .any(|filter| filter.evaluate(obj, self.log.as_ref()))
    }

    /// Lazily yield the zombies among `resources`, in input order
    pub fn zombies<'a, I>(&'a self, resources: I) -> impl Iterator<Item = &'a DynamicObject> + 'a
    where
        I: IntoIterator<Item = &'a DynamicObject>,
        I::IntoIter: 'a,
    {
        resources.into_iter().filter(|obj| !self.is_managed(obj))
    }

    /// Send every zombie in `resources` to `tx`, in input order
    ///
    /// Cancellation is checked before each resource and while waiting on a
    /// full channel. On cancellation no further resources are sent and
    /// `DiscoveryError::Cancelled` is returned. `tx` is left open either way.
    pub async fn discover(
        &self,
        cancel: &CancelToken,
        resources: &[DynamicObject],
        tx: &mpsc::Sender<DynamicObject>,
    ) -> Result<(), DiscoveryError> {
        for obj in resources {
            if cancel.is_cancelled() {
                tracing::debug!("Discovery cancelled before {}", models::describe(obj));
                return Err(DiscoveryError::Cancelled);
            }

            if self.is_managed(obj) {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                sent = tx.send(obj.clone()) => {
                    sent.map_err(|_| DiscoveryError::ConsumerClosed)?;
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("filters", &self.filter_names())
            .finish()
    }
}
