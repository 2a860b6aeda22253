//! Metrics source abstraction.
//!
//! This module defines the `MetricsSource` trait through which the poller and
//! the detail pane reach the cluster:
//! - `ClusterSource`: real data from the API server via the `kube` client
//! - `MockSource`: scripted responses for tests and a synthetic demo cluster

mod cluster;
mod mock;

pub use cluster::{ClusterOptions, ClusterSource};
pub use mock::MockSource;

use crate::error::FetchError;
use crate::model::{EntityRef, MetricRecord, ResourceKind};

/// What to fetch. Kind-specific options live inside the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Pods in one namespace, or in all namespaces when `namespace` is `None`.
    Pods { namespace: Option<String> },
    Nodes,
}

/// A fully resolved metrics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub target: Target,
    /// Label selector (`key=value,key2!=value2`).
    pub selector: Option<String>,
}

impl Query {
    pub fn pods(namespace: Option<&str>) -> Self {
        Self {
            target: Target::Pods {
                namespace: namespace.map(str::to_string),
            },
            selector: None,
        }
    }

    pub fn nodes() -> Self {
        Self {
            target: Target::Nodes,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        self.selector = selector.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        match self.target {
            Target::Pods { .. } => ResourceKind::Pod,
            Target::Nodes => ResourceKind::Node,
        }
    }

    /// Message shown when a fetch succeeds but returns no entities.
    pub fn empty_message(&self) -> String {
        match &self.target {
            Target::Pods {
                namespace: Some(ns),
            } => format!("No resources found in {} namespace.", ns),
            _ => "No resources found".to_string(),
        }
    }

    /// Short scope description for the header bar.
    pub fn scope_label(&self) -> String {
        match &self.target {
            Target::Pods {
                namespace: Some(ns),
            } => format!("ns:{}", ns),
            Target::Pods { namespace: None } => "all namespaces".to_string(),
            Target::Nodes => "cluster".to_string(),
        }
    }
}

/// Source of metric snapshots and entity manifests.
///
/// Implementations are called from background threads and must not hold
/// session state between calls.
pub trait MetricsSource: Send + Sync {
    /// Fetches one snapshot of metric records for `query`.
    fn fetch_metrics(&self, query: &Query) -> Result<Vec<MetricRecord>, FetchError>;

    /// Fetches the manifest of one entity as formatted text.
    fn fetch_detail(&self, entity: &EntityRef) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_mentions_namespace() {
        assert_eq!(
            Query::pods(Some("dev")).empty_message(),
            "No resources found in dev namespace."
        );
        assert_eq!(Query::pods(None).empty_message(), "No resources found");
        assert_eq!(Query::nodes().empty_message(), "No resources found");
    }

    #[test]
    fn test_blank_selector_dropped() {
        let q = Query::nodes().with_selector(Some("  ".to_string()));
        assert_eq!(q.selector, None);
        assert_eq!(q.kind(), ResourceKind::Node);
    }
}
