//! Normalized metric records shared by the source, the series store and the UI.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Kind of entity being monitored. Resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Node,
}

impl ResourceKind {
    /// Singular lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Node => "node",
        }
    }

    /// Plural uppercase label for titles.
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "PODS",
            ResourceKind::Node => "NODES",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display fields that only exist for pods.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodDetails {
    pub namespace: String,
    pub status: String,
    pub node: String,
    pub restarts: u32,
    /// Ready containers.
    pub ready: u32,
    /// Total containers.
    pub total: u32,
    /// Human-readable age (`5d`, `3h`, ...).
    pub age: String,
}

/// Kind-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDetails {
    Pod(PodDetails),
    Node,
}

/// One entity's resource usage at one tick.
///
/// CPU values are millicores, memory values are MiB. A zero limit means no
/// limit is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub cpu_usage: u64,
    pub cpu_limit: u64,
    pub mem_usage: u64,
    pub mem_limit: u64,
    pub details: EntityDetails,
}

impl MetricRecord {
    /// Creates a node record.
    pub fn node(name: &str, cpu_usage: u64, cpu_limit: u64, mem_usage: u64, mem_limit: u64) -> Self {
        Self {
            name: name.to_string(),
            cpu_usage,
            cpu_limit,
            mem_usage,
            mem_limit,
            details: EntityDetails::Node,
        }
    }

    /// Creates a pod record.
    pub fn pod(
        name: &str,
        details: PodDetails,
        cpu_usage: u64,
        cpu_limit: u64,
        mem_usage: u64,
        mem_limit: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            cpu_usage,
            cpu_limit,
            mem_usage,
            mem_limit,
            details: EntityDetails::Pod(details),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self.details {
            EntityDetails::Pod(_) => ResourceKind::Pod,
            EntityDetails::Node => ResourceKind::Node,
        }
    }

    /// Namespace for pods, `None` for nodes.
    pub fn namespace(&self) -> Option<&str> {
        match &self.details {
            EntityDetails::Pod(p) => Some(p.namespace.as_str()),
            EntityDetails::Node => None,
        }
    }

    /// CPU usage as a percentage of the limit; `None` when no limit is set.
    pub fn cpu_percent(&self) -> Option<f64> {
        percent(self.cpu_usage, self.cpu_limit)
    }

    /// Memory usage as a percentage of the limit; `None` when no limit is set.
    pub fn mem_percent(&self) -> Option<f64> {
        percent(self.mem_usage, self.mem_limit)
    }

    /// Identity across refreshes: `namespace/name` for pods, the bare name
    /// for nodes. Pod names repeat across namespaces.
    pub fn key(&self) -> String {
        entity_key(self.namespace(), &self.name)
    }

    /// Reference used to look up this entity's manifest.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind(),
            name: self.name.clone(),
            namespace: self.namespace().map(str::to_string),
        }
    }
}

fn percent(usage: u64, limit: u64) -> Option<f64> {
    if limit == 0 {
        None
    } else {
        Some(usage as f64 / limit as f64 * 100.0)
    }
}

fn entity_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}/{}", ns, name),
        None => name.to_string(),
    }
}

/// Identifies one entity for a manifest lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: ResourceKind,
    pub name: String,
    /// Required for pods, absent for nodes.
    pub namespace: Option<String>,
}

impl EntityRef {
    /// Same identity as [`MetricRecord::key`].
    pub fn key(&self) -> String {
        entity_key(self.namespace.as_deref(), &self.name)
    }
}

/// List ordering selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Order returned by the metrics source.
    #[default]
    Natural,
    Name,
    /// Highest CPU usage first.
    Cpu,
    /// Highest memory usage first.
    Memory,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortBy::Natural),
            "name" => Ok(SortBy::Name),
            "cpu" => Ok(SortBy::Cpu),
            "mem" | "memory" => Ok(SortBy::Memory),
            other => Err(format!(
                "invalid sort key '{}' (expected name, cpu or memory)",
                other
            )),
        }
    }
}

impl SortBy {
    /// Sorts records in place. Stable; ties are broken by name so the order
    /// does not flicker between ticks.
    pub fn apply(&self, records: &mut [MetricRecord]) {
        let by_name = |a: &MetricRecord, b: &MetricRecord| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.namespace().cmp(&b.namespace()))
        };
        match self {
            SortBy::Natural => {}
            SortBy::Name => records.sort_by(by_name),
            SortBy::Cpu => records.sort_by(|a, b| {
                desc(a.cpu_usage, b.cpu_usage).then_with(|| by_name(a, b))
            }),
            SortBy::Memory => records.sort_by(|a, b| {
                desc(a.mem_usage, b.mem_usage).then_with(|| by_name(a, b))
            }),
        }
    }
}

fn desc(a: u64, b: u64) -> Ordering {
    b.cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(ns: &str, name: &str, cpu: u64, mem: u64) -> MetricRecord {
        MetricRecord::pod(
            name,
            PodDetails {
                namespace: ns.to_string(),
                ..PodDetails::default()
            },
            cpu,
            0,
            mem,
            0,
        )
    }

    fn names(records: &[MetricRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_percent_undefined_without_limit() {
        let r = MetricRecord::node("n1", 500, 0, 100, 400);
        assert_eq!(r.cpu_percent(), None);
        assert_eq!(r.mem_percent(), Some(25.0));
    }

    #[test]
    fn test_namespace_only_for_pods() {
        assert_eq!(pod("kube-system", "dns", 1, 1).namespace(), Some("kube-system"));
        assert_eq!(MetricRecord::node("n1", 0, 0, 0, 0).namespace(), None);
    }

    #[test]
    fn test_key_is_qualified_for_pods() {
        let dev = pod("dev", "postgres-0", 1, 1);
        let prod = pod("prod", "postgres-0", 1, 1);
        assert_eq!(dev.key(), "dev/postgres-0");
        assert_ne!(dev.key(), prod.key());
        assert_eq!(prod.entity_ref().key(), prod.key());
        assert_eq!(MetricRecord::node("n1", 0, 0, 0, 0).key(), "n1");
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!("cpu".parse::<SortBy>(), Ok(SortBy::Cpu));
        assert_eq!("Memory".parse::<SortBy>(), Ok(SortBy::Memory));
        assert_eq!("".parse::<SortBy>(), Ok(SortBy::Natural));
        assert!("disk".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_sort_cpu_ties_broken_by_name() {
        let mut records = vec![
            pod("a", "zeta", 100, 1),
            pod("a", "alpha", 100, 1),
            pod("a", "busy", 900, 1),
        ];
        SortBy::Cpu.apply(&mut records);
        assert_eq!(names(&records), ["busy", "alpha", "zeta"]);
    }

    #[test]
    fn test_sort_natural_keeps_source_order() {
        let mut records = vec![pod("b", "x", 1, 1), pod("a", "y", 5, 5)];
        SortBy::Natural.apply(&mut records);
        assert_eq!(names(&records), ["x", "y"]);
    }

    #[test]
    fn test_sort_is_stable_across_ticks() {
        let mut first = vec![pod("a", "c", 1, 7), pod("a", "a", 1, 7), pod("a", "b", 2, 7)];
        let mut second = vec![pod("a", "b", 2, 7), pod("a", "c", 1, 7), pod("a", "a", 1, 7)];
        SortBy::Memory.apply(&mut first);
        SortBy::Memory.apply(&mut second);
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first), ["a", "b", "c"]);
    }
}
