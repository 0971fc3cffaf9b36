//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kube::ResourceExt;
use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};

use crate::collector::DEFAULT_CHANNEL_CAPACITY;
use crate::models::{self, LabelSelector, SelectorError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Resources that are never reported, even when unmanaged
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_resources: Vec<ExcludeRule>,

    /// Clusters that are never scanned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_clusters: Vec<String>,

    /// Only resources matching this label selector are checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,

    /// Print zombies after the pass instead of as they are found
    #[serde(default)]
    pub no_stream: bool,

    /// Exit with a failure status when zombies are found
    #[serde(default)]
    pub fail: bool,

    /// How zombies are printed
    #[serde(default)]
    pub output: OutputFormat,

    /// Capacity of the channel between discovery and the printer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Config {
    /// Parsed `labelSelector`, if one is set
    pub fn label_selector(&self) -> Result<Option<LabelSelector>, SelectorError> {
        self.label_selector.as_deref().map(str::parse).transpose()
    }

    /// Whether the named cluster is listed in `excludeClusters`
    pub fn excludes_cluster(&self, cluster: Option<&str>) -> bool {
        cluster.is_some_and(|cluster| self.exclude_clusters.iter().any(|c| c == cluster))
    }
}

/// Selects resources to exclude from zombie reports
///
/// Every field that is set must match. Labels and annotations match when the
/// resource carries each listed key with the same value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExcludeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Only apply this rule when scanning the named cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl ExcludeRule {
    /// Whether the rule selects anything at all
    pub fn has_selector(&self) -> bool {
        self.api_version.is_some()
            || self.kind.is_some()
            || self.name.is_some()
            || self.namespace.is_some()
            || !self.labels.is_empty()
            || !self.annotations.is_empty()
    }

    pub fn applies_to_cluster(&self, cluster: Option<&str>) -> bool {
        match self.cluster.as_deref() {
            Some(wanted) => cluster == Some(wanted),
            None => true,
        }
    }

    /// Whether the resource satisfies every criterion of this rule
    pub fn matches(&self, obj: &DynamicObject) -> bool {
        if !self.has_selector() {
            return false;
        }

        let field_matches = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().is_none_or(|wanted| wanted == actual)
        };

        field_matches(&self.api_version, models::api_version(obj))
            && field_matches(&self.kind, models::kind(obj))
            && field_matches(&self.name, obj.metadata.name.as_deref().unwrap_or_default())
            && field_matches(
                &self.namespace,
                obj.metadata.namespace.as_deref().unwrap_or_default(),
            )
            && is_subset(&self.labels, obj.labels())
            && is_subset(&self.annotations, obj.annotations())
    }
}

fn is_subset(wanted: &BTreeMap<String, String>, actual: &BTreeMap<String, String>) -> bool {
    wanted
        .iter()
        .all(|(key, value)| actual.get(key) == Some(value))
}

/// Output format for reported zombies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `Kind/namespace/name` line per zombie
    #[default]
    Name,
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(OutputFormat::Name),
            "yaml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Name => "name",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        };
        f.write_str(s)
    }
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_resources: Vec::new(),
            exclude_clusters: Vec::new(),
            label_selector: None,
            no_stream: false,
            fail: false,
            output: OutputFormat::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}
