//! Cluster-backed metrics source built on the `kube` client.
//!
//! Usage comes from the `metrics.k8s.io` API, limits and status from the core
//! `Pod`/`Node` lists, manifests from a single `get` rendered as YAML. The
//! source owns a small tokio runtime and blocks on it, so callers stay
//! synchronous.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, Resource, ResourceExt};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::{EntityRef, MetricRecord, PodDetails, ResourceKind};
use crate::util::{QuantityParseError, cpu_millis, format_age, mem_mebibytes};

use super::{MetricsSource, Query, Target};

const METRICS_GROUP: &str = "metrics.k8s.io";
const METRICS_VERSION: &str = "v1beta1";
/// Upper bound for one API round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to find the cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Kubeconfig context; the current context when `None`.
    pub context: Option<String>,
    /// Explicit kubeconfig file; otherwise `KUBECONFIG`, `~/.kube/config`
    /// or the in-cluster service account.
    pub kubeconfig: Option<PathBuf>,
    /// Keep `metadata.managedFields` in fetched manifests.
    pub show_managed_fields: bool,
}

/// Metrics source talking to the API server.
pub struct ClusterSource {
    runtime: Runtime,
    client: Client,
    default_namespace: String,
    show_managed_fields: bool,
    pod_metrics: ApiResource,
    node_metrics: ApiResource,
}

impl ClusterSource {
    /// Loads the client configuration and builds the client. No request is
    /// sent until the first fetch.
    pub fn connect(options: &ClusterOptions) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("kubetop-client")
            .enable_all()
            .build()
            .map_err(connect_error)?;

        let mut config = runtime.block_on(load_config(options))?;
        config.connect_timeout = Some(REQUEST_TIMEOUT);
        config.read_timeout = Some(REQUEST_TIMEOUT);
        info!(
            "using cluster {} (namespace {})",
            config.cluster_url, config.default_namespace
        );
        let default_namespace = config.default_namespace.clone();

        let client = {
            let _guard = runtime.enter();
            Client::try_from(config).map_err(connect_error)?
        };

        let pod_gvk = GroupVersionKind::gvk(METRICS_GROUP, METRICS_VERSION, "PodMetrics");
        let node_gvk = GroupVersionKind::gvk(METRICS_GROUP, METRICS_VERSION, "NodeMetrics");
        Ok(Self {
            runtime,
            client,
            default_namespace,
            show_managed_fields: options.show_managed_fields,
            pod_metrics: ApiResource::from_gvk_with_plural(&pod_gvk, "pods"),
            node_metrics: ApiResource::from_gvk_with_plural(&node_gvk, "nodes"),
        })
    }

    /// Namespace of the selected context (`default` when the context sets
    /// none).
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    async fn fetch_pods(
        &self,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<MetricRecord>, FetchError> {
        let (metrics_api, pods_api): (Api<DynamicObject>, Api<Pod>) = match namespace {
            Some(ns) => (
                Api::namespaced_with(self.client.clone(), ns, &self.pod_metrics),
                Api::namespaced(self.client.clone(), ns),
            ),
            None => (
                Api::all_with(self.client.clone(), &self.pod_metrics),
                Api::all(self.client.clone()),
            ),
        };

        let metrics = metrics_api
            .list(params)
            .await
            .map_err(|e| api_error("pod metrics", e))?;
        if metrics.items.is_empty() {
            return Ok(Vec::new());
        }
        let pods = pods_api
            .list(params)
            .await
            .map_err(|e| api_error("pods", e))?;
        pod_records(metrics.items, pods.items, Utc::now())
    }

    async fn fetch_nodes(&self, params: &ListParams) -> Result<Vec<MetricRecord>, FetchError> {
        let metrics_api: Api<DynamicObject> =
            Api::all_with(self.client.clone(), &self.node_metrics);
        let metrics = metrics_api
            .list(params)
            .await
            .map_err(|e| api_error("node metrics", e))?;
        if metrics.items.is_empty() {
            return Ok(Vec::new());
        }
        let nodes_api: Api<Node> = Api::all(self.client.clone());
        let nodes = nodes_api
            .list(params)
            .await
            .map_err(|e| api_error("nodes", e))?;
        node_records(metrics.items, nodes.items)
    }

    async fn fetch_manifest(&self, entity: &EntityRef) -> Result<String, FetchError> {
        match entity.kind {
            ResourceKind::Pod => {
                let ns = entity
                    .namespace
                    .as_deref()
                    .unwrap_or(&self.default_namespace);
                let api: Api<Pod> = Api::namespaced(self.client.clone(), ns);
                let pod = api
                    .get(&entity.name)
                    .await
                    .map_err(|e| api_error("pod", e))?;
                manifest_yaml(pod, self.show_managed_fields)
            }
            ResourceKind::Node => {
                let api: Api<Node> = Api::all(self.client.clone());
                let node = api
                    .get(&entity.name)
                    .await
                    .map_err(|e| api_error("node", e))?;
                manifest_yaml(node, self.show_managed_fields)
            }
        }
    }
}

impl MetricsSource for ClusterSource {
    fn fetch_metrics(&self, query: &Query) -> Result<Vec<MetricRecord>, FetchError> {
        let started = Instant::now();
        let params = list_params(query.selector.as_deref());
        let result = self.runtime.block_on(async {
            match &query.target {
                Target::Pods { namespace } => self.fetch_pods(namespace.as_deref(), &params).await,
                Target::Nodes => self.fetch_nodes(&params).await,
            }
        });
        debug!("{} metrics fetched in {:?}", query.kind(), started.elapsed());
        result
    }

    fn fetch_detail(&self, entity: &EntityRef) -> Result<String, FetchError> {
        self.runtime.block_on(self.fetch_manifest(entity))
    }
}

async fn load_config(options: &ClusterOptions) -> Result<Config, FetchError> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        cluster: None,
        user: None,
    };
    match (&options.kubeconfig, &options.context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(connect_error)?;
            Config::from_custom_kubeconfig(kubeconfig, &kube_options)
                .await
                .map_err(connect_error)
        }
        (None, Some(_)) => Config::from_kubeconfig(&kube_options)
            .await
            .map_err(connect_error),
        (None, None) => Config::infer().await.map_err(connect_error),
    }
}

fn connect_error(e: impl Display) -> FetchError {
    FetchError::Connect(e.to_string())
}

fn api_error(what: &str, e: kube::Error) -> FetchError {
    warn!("listing {} failed: {}", what, e);
    FetchError::Api {
        what: what.to_string(),
        message: e.to_string(),
    }
}

fn list_params(selector: Option<&str>) -> ListParams {
    match selector {
        Some(sel) => ListParams::default().labels(sel),
        None => ListParams::default(),
    }
}

/// Renders an object the way `kubectl get -o yaml` would.
fn manifest_yaml<K>(mut object: K, show_managed_fields: bool) -> Result<String, FetchError>
where
    K: Resource + Serialize,
{
    if !show_managed_fields {
        object.meta_mut().managed_fields = None;
    }
    serde_yaml::to_string(&object).map_err(|e| FetchError::Render(e.to_string()))
}

type Parse = fn(&str) -> Result<u64, QuantityParseError>;

fn parse_raw(raw: &str, parse: Parse) -> Result<u64, FetchError> {
    parse(raw).map_err(|e| FetchError::Quantity(e.input))
}

/// `(cpu millicores, memory MiB)` of a metrics `usage` object.
fn usage_of(usage: &Value) -> Result<(u64, u64), FetchError> {
    let field = |key: &str, parse: Parse| match usage[key].as_str() {
        Some(raw) => parse_raw(raw, parse),
        None => Ok(0),
    };
    Ok((field("cpu", cpu_millis)?, field("memory", mem_mebibytes)?))
}

/// Sum of container usage in a `PodMetrics` object.
fn container_usage(data: &Value) -> Result<(u64, u64), FetchError> {
    let containers = data["containers"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();
    containers.iter().try_fold((0u64, 0u64), |(cpu, mem), c| {
        let (c_cpu, c_mem) = usage_of(&c["usage"])?;
        Ok((cpu.saturating_add(c_cpu), mem.saturating_add(c_mem)))
    })
}

fn quantity(
    map: Option<&BTreeMap<String, Quantity>>,
    key: &str,
    parse: Parse,
) -> Result<u64, FetchError> {
    match map.and_then(|m| m.get(key)) {
        Some(q) => parse_raw(&q.0, parse),
        None => Ok(0),
    }
}

/// Sum of container limits; containers without one count as zero.
fn limit_totals(pod: &Pod) -> Result<(u64, u64), FetchError> {
    let containers = pod
        .spec
        .as_ref()
        .map(|s| s.containers.as_slice())
        .unwrap_or_default();
    containers.iter().try_fold((0u64, 0u64), |(cpu, mem), c| {
        let limits = c.resources.as_ref().and_then(|r| r.limits.as_ref());
        let c_cpu = quantity(limits, "cpu", cpu_millis)?;
        let c_mem = quantity(limits, "memory", mem_mebibytes)?;
        Ok((cpu.saturating_add(c_cpu), mem.saturating_add(c_mem)))
    })
}

fn pod_details(namespace: String, pod: &Pod, now: DateTime<Utc>) -> PodDetails {
    let status = pod.status.as_ref();
    let statuses = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();
    let init_statuses = status
        .and_then(|s| s.init_container_statuses.as_deref())
        .unwrap_or_default();
    let restarts = statuses
        .iter()
        .chain(init_statuses)
        .map(|s| u32::try_from(s.restart_count).unwrap_or(0))
        .fold(0u32, u32::saturating_add);

    PodDetails {
        namespace,
        status: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
        node: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
        restarts,
        ready: statuses.iter().filter(|s| s.ready).count() as u32,
        total: statuses.len() as u32,
        age: format_age(pod.creation_timestamp().map(|t| t.0), now),
    }
}

/// Joins pod metrics with pod specs. Ordered by namespace, then name.
fn pod_records(
    metrics: Vec<DynamicObject>,
    pods: Vec<Pod>,
    now: DateTime<Utc>,
) -> Result<Vec<MetricRecord>, FetchError> {
    let by_key: HashMap<(String, String), Pod> = pods
        .into_iter()
        .map(|p| ((p.namespace().unwrap_or_default(), p.name_any()), p))
        .collect();

    let mut records = Vec::with_capacity(metrics.len());
    for item in metrics {
        let namespace = item.namespace().unwrap_or_default();
        let name = item.name_any();
        let (cpu_usage, mem_usage) = container_usage(&item.data)?;

        let joined = by_key.get(&(namespace.clone(), name.clone()));
        let (cpu_limit, mem_limit, details) = match joined {
            Some(pod) => {
                let (cpu_limit, mem_limit) = limit_totals(pod)?;
                (cpu_limit, mem_limit, pod_details(namespace, pod, now))
            }
            None => (
                0,
                0,
                PodDetails {
                    namespace,
                    age: "<unknown>".to_string(),
                    ..PodDetails::default()
                },
            ),
        };

        records.push(MetricRecord::pod(
            &name, details, cpu_usage, cpu_limit, mem_usage, mem_limit,
        ));
    }

    records.sort_by(|a, b| {
        a.namespace()
            .cmp(&b.namespace())
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(records)
}

/// Joins node metrics with allocatable capacity. Ordered by name.
fn node_records(
    metrics: Vec<DynamicObject>,
    nodes: Vec<Node>,
) -> Result<Vec<MetricRecord>, FetchError> {
    let allocatable: HashMap<String, Option<BTreeMap<String, Quantity>>> = nodes
        .into_iter()
        .map(|n| {
            let name = n.name_any();
            (name, n.status.and_then(|s| s.allocatable))
        })
        .collect();

    let mut records = Vec::with_capacity(metrics.len());
    for item in metrics {
        let name = item.name_any();
        let (cpu_usage, mem_usage) = usage_of(&item.data["usage"])?;
        let alloc = allocatable.get(&name).and_then(Option::as_ref);
        records.push(MetricRecord::node(
            &name,
            cpu_usage,
            quantity(alloc, "cpu", cpu_millis)?,
            mem_usage,
            quantity(alloc, "memory", mem_mebibytes)?,
        ));
    }
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}
