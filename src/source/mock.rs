//! Mock metrics source for tests and demo mode.
//!
//! Two modes:
//! - scripted: a queue of fetch results, replayed in order (the last one
//!   repeats once the queue is exhausted)
//! - demo: a synthetic cluster whose usage moves a little on every fetch

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FetchError;
use crate::model::{EntityRef, MetricRecord, PodDetails, ResourceKind};

use super::{MetricsSource, Query, Target};

type FetchResult = Result<Vec<MetricRecord>, FetchError>;

#[derive(Debug)]
enum Mode {
    Scripted {
        script: Mutex<VecDeque<FetchResult>>,
        last: Mutex<Option<FetchResult>>,
    },
    Demo(ResourceKind),
}

/// In-memory `MetricsSource`.
#[derive(Debug)]
pub struct MockSource {
    mode: Mode,
    details: HashMap<String, Result<String, FetchError>>,
    calls: AtomicUsize,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Scripted source with an empty script (every fetch returns no records).
    pub fn new() -> Self {
        Self {
            mode: Mode::Scripted {
                script: Mutex::new(VecDeque::new()),
                last: Mutex::new(None),
            },
            details: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Synthetic cluster for `--demo`.
    pub fn demo(kind: ResourceKind) -> Self {
        Self {
            mode: Mode::Demo(kind),
            details: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Appends a successful fetch to the script.
    pub fn with_records(self, records: Vec<MetricRecord>) -> Self {
        self.push(Ok(records))
    }

    /// Appends a failed fetch to the script.
    pub fn with_failure(self, message: &str) -> Self {
        self.push(Err(FetchError::Mock(message.to_string())))
    }

    /// Registers the manifest returned for the entity with `key`
    /// (`namespace/name` for pods, the name for nodes).
    pub fn with_detail(mut self, key: &str, manifest: &str) -> Self {
        self.details.insert(key.to_string(), Ok(manifest.to_string()));
        self
    }

    /// Registers a manifest lookup failure for the entity with `key`.
    pub fn with_detail_error(mut self, key: &str, message: &str) -> Self {
        self.details
            .insert(key.to_string(), Err(FetchError::Mock(message.to_string())));
        self
    }

    /// Number of `fetch_metrics` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(self, result: FetchResult) -> Self {
        if let Mode::Scripted { script, .. } = &self.mode {
            script
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push_back(result);
        }
        self
    }
}

impl MetricsSource for MockSource {
    fn fetch_metrics(&self, query: &Query) -> Result<Vec<MetricRecord>, FetchError> {
        let tick = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            Mode::Scripted { script, last } => {
                let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(next) = script.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
                    *last = Some(next);
                }
                last.clone().unwrap_or_else(|| Ok(Vec::new()))
            }
            Mode::Demo(kind) => Ok(demo_records(*kind, query, tick)),
        }
    }

    fn fetch_detail(&self, entity: &EntityRef) -> Result<String, FetchError> {
        if let Some(found) = self.details.get(&entity.key()) {
            return found.clone();
        }
        match self.mode {
            Mode::Demo(_) => Ok(demo_manifest(entity)),
            Mode::Scripted { .. } => Err(FetchError::Mock(format!(
                "{} \"{}\" not found",
                entity.kind, entity.name
            ))),
        }
    }
}

const DEMO_PODS: &[(&str, &str, u64, u64)] = &[
    // namespace, name, cpu limit (m), mem limit (Mi)
    ("default", "frontend-7d9c5b6f4-2xkqp", 500, 512),
    ("default", "frontend-7d9c5b6f4-9lmnz", 500, 512),
    ("default", "checkout-5c8d7f9b8-q4w2e", 1000, 1024),
    ("default", "redis-0", 0, 0),
    ("kube-system", "coredns-76f75df574-hx8tb", 0, 170),
    ("kube-system", "metrics-server-6d94bc8694-vv7pp", 100, 200),
    ("monitoring", "prometheus-0", 2000, 4096),
];

const DEMO_NODES: &[(&str, u64, u64)] = &[
    ("worker-a", 4000, 15_872),
    ("worker-b", 4000, 15_872),
    ("worker-c", 8000, 31_744),
];

/// Smooth pseudo-random wave in `0.0..=1.0` for entity `seed` at `tick`.
fn wave(seed: usize, tick: usize) -> f64 {
    let t = tick as f64 * 0.35 + seed as f64 * 1.7;
    0.5 + 0.35 * t.sin() + 0.15 * (t * 2.3).cos()
}

fn scaled(limit: u64, fallback: u64, factor: f64) -> u64 {
    let base = if limit == 0 { fallback } else { limit };
    (base as f64 * factor.clamp(0.02, 1.2)) as u64
}

fn demo_records(kind: ResourceKind, query: &Query, tick: usize) -> Vec<MetricRecord> {
    match kind {
        ResourceKind::Pod => {
            let namespace = match &query.target {
                Target::Pods { namespace } => namespace.as_deref(),
                Target::Nodes => None,
            };
            DEMO_PODS
                .iter()
                .enumerate()
                .filter(|(_, (ns, ..))| namespace.is_none_or(|want| want == *ns))
                .map(|(i, (ns, name, cpu_limit, mem_limit))| {
                    let details = PodDetails {
                        namespace: ns.to_string(),
                        status: "Running".to_string(),
                        node: DEMO_NODES[i % DEMO_NODES.len()].0.to_string(),
                        restarts: (i as u32 * 3) % 5,
                        ready: 1,
                        total: 1,
                        age: format!("{}d", 3 + i),
                    };
                    MetricRecord::pod(
                        name,
                        details,
                        scaled(*cpu_limit, 250, wave(i, tick)),
                        *cpu_limit,
                        scaled(*mem_limit, 128, 0.6 + 0.2 * wave(i + 11, tick)),
                        *mem_limit,
                    )
                })
                .collect()
        }
        ResourceKind::Node => DEMO_NODES
            .iter()
            .enumerate()
            .map(|(i, (name, cpu, mem))| {
                MetricRecord::node(
                    name,
                    scaled(*cpu, 0, 0.3 + 0.5 * wave(i, tick)),
                    *cpu,
                    scaled(*mem, 0, 0.4 + 0.3 * wave(i + 7, tick)),
                    *mem,
                )
            })
            .collect(),
    }
}

fn demo_manifest(entity: &EntityRef) -> String {
    let mut out = String::new();
    out.push_str("apiVersion: v1\n");
    out.push_str(match entity.kind {
        ResourceKind::Pod => "kind: Pod\n",
        ResourceKind::Node => "kind: Node\n",
    });
    out.push_str("metadata:\n");
    out.push_str(&format!("  name: {}\n", entity.name));
    if let Some(ns) = &entity.namespace {
        out.push_str(&format!("  namespace: {}\n", ns));
    }
    out.push_str("  labels:\n    kubetop.demo/synthetic: \"true\"\n");
    match entity.kind {
        ResourceKind::Pod => {
            out.push_str("spec:\n  containers:\n  - name: main\n    image: registry.local/demo:latest\n");
            out.push_str("status:\n  phase: Running\n");
        }
        ResourceKind::Node => {
            out.push_str("status:\n  conditions:\n  - type: Ready\n    status: \"True\"\n");
        }
    }
    out
}
