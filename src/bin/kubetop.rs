//! kubetop - live CPU and memory dashboard for Kubernetes pods and nodes.
//!
//! Usage:
//!   kubetop pod                     # pods in the context namespace
//!   kubetop pod -n kube-system      # pods in one namespace
//!   kubetop pod -A -l app=web       # matching pods in all namespaces
//!   kubetop node --sort-by cpu      # nodes, busiest first
//!   kubetop --demo pod              # synthetic cluster, no API server needed

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use kubetop::config::{self, Config, ErrorPolicy};
use kubetop::model::{ResourceKind, SortBy};
use kubetop::source::{ClusterOptions, ClusterSource, MetricsSource, MockSource, Query};
use kubetop::tui::App;
use kubetop::{ConfigError, Error};

/// Live resource usage dashboard for Kubernetes.
#[derive(Parser)]
#[command(name = "kubetop", about = "Live CPU/memory dashboard for pods and nodes", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Refresh interval in seconds.
    #[arg(long, global = true, default_value_t = config::DEFAULT_INTERVAL_SECS)]
    interval: u64,

    /// Label selector to filter on (e.g. app=web,tier!=cache).
    #[arg(short = 'l', long, global = true)]
    selector: Option<String>,

    /// List order: name, cpu or memory. Default keeps the source order.
    #[arg(long, global = true, value_parser = parse_sort)]
    sort_by: Option<SortBy>,

    /// Keep metadata.managedFields in manifests.
    #[arg(short = 'm', long, global = true)]
    show_managed_fields: bool,

    /// kubeconfig context to use.
    #[arg(long, global = true)]
    context: Option<String>,

    /// Path to the kubeconfig file.
    #[arg(long, global = true, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Theme file (default: $XDG_CONFIG_HOME/kubetop/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file. The terminal is owned by the UI, so nothing
    /// is logged without it.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Exit on the first failed refresh instead of retrying.
    #[arg(long, global = true)]
    exit_on_error: bool,

    /// Use a synthetic cluster instead of the API server.
    #[arg(long, global = true)]
    demo: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show pod metrics.
    #[command(alias = "pods", alias = "po")]
    Pod {
        /// Namespace to show (default: the context namespace).
        #[arg(short, long, conflicts_with = "all_namespaces")]
        namespace: Option<String>,

        /// Show pods in every namespace.
        #[arg(short = 'A', long)]
        all_namespaces: bool,
    },
    /// Show node metrics.
    #[command(alias = "nodes", alias = "no")]
    Node,
}

impl Command {
    fn kind(&self) -> ResourceKind {
        match self {
            Command::Pod { .. } => ResourceKind::Pod,
            Command::Node => ResourceKind::Node,
        }
    }
}

fn parse_sort(s: &str) -> Result<SortBy, String> {
    s.parse()
}

fn init_logging(path: &Path, verbose: u8, quiet: bool) -> std::io::Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("kubetop={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// `context_namespace` applies to pods when neither `-n` nor `-A` is given.
fn build_query(args: &Args, context_namespace: &str) -> Query {
    let query = match &args.command {
        Command::Pod {
            all_namespaces: true,
            ..
        } => Query::pods(None),
        Command::Pod {
            namespace: Some(ns),
            ..
        } => Query::pods(Some(ns.as_str())),
        Command::Pod { .. } => Query::pods(Some(context_namespace)),
        Command::Node => Query::nodes(),
    };
    query.with_selector(args.selector.clone())
}

fn build_config(args: &Args, query: Query) -> Result<Config, ConfigError> {
    let theme = match args.config.clone().or_else(config::default_config_path) {
        Some(path) => config::load_theme(&path)?,
        None => config::Theme::default(),
    };
    let policy = if args.exit_on_error {
        ErrorPolicy::Fatal
    } else {
        ErrorPolicy::Continue
    };
    Config::new(query)
        .with_interval(args.interval)?
        .with_sort(args.sort_by.unwrap_or_default())
        .with_error_policy(policy)
        .with_theme(&theme)
}

fn run(args: Args) -> Result<(), Error> {
    let (source, namespace): (Arc<dyn MetricsSource>, String) = if args.demo {
        let source = MockSource::demo(args.command.kind());
        (Arc::new(source), "default".to_string())
    } else {
        let source = ClusterSource::connect(&ClusterOptions {
            context: args.context.clone(),
            kubeconfig: args.kubeconfig.clone(),
            show_managed_fields: args.show_managed_fields,
        })?;
        let namespace = source.default_namespace().to_string();
        (Arc::new(source), namespace)
    };

    let query = build_query(&args, &namespace);
    let config = build_config(&args, query)?;
    info!(
        "kubetop {} starting: {} ({}), interval {:?}, sort {:?}",
        env!("CARGO_PKG_VERSION"),
        config.query.kind(),
        config.query.scope_label(),
        config.interval,
        config.sort_by
    );

    let (tx, rx) = mpsc::channel();
    App::new(config, source, tx).run(rx)
}

fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        if let Err(e) = init_logging(path, args.verbose, args.quiet) {
            eprintln!("Error: cannot open log file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_pod_flags() {
        let args = Args::parse_from(["kubetop", "pods", "-A", "-l", "app=web", "--interval", "5"]);
        assert!(matches!(
            args.command,
            Command::Pod {
                all_namespaces: true,
                ..
            }
        ));
        assert_eq!(args.selector.as_deref(), Some("app=web"));
        assert_eq!(args.interval, 5);
    }

    #[test]
    fn test_namespace_conflicts_with_all() {
        assert!(Args::try_parse_from(["kubetop", "pod", "-n", "x", "-A"]).is_err());
    }

    #[test]
    fn test_invalid_sort_rejected() {
        assert!(Args::try_parse_from(["kubetop", "node", "--sort-by", "disk"]).is_err());
        let args = Args::try_parse_from(["kubetop", "node", "--sort-by", "memory"]).unwrap();
        assert_eq!(args.sort_by, Some(SortBy::Memory));
    }

    #[test]
    fn test_demo_pod_query_uses_default_namespace() {
        let args = Args::parse_from(["kubetop", "--demo", "pod"]);
        let query = build_query(&args, "default");
        assert_eq!(query.kind(), ResourceKind::Pod);
        assert_eq!(query.scope_label(), "ns:default");
    }

    #[test]
    fn test_explicit_namespace_beats_context_namespace() {
        let args = Args::parse_from(["kubetop", "pod", "-n", "prod", "-l", "app=db"]);
        let query = build_query(&args, "dev");
        assert_eq!(query.scope_label(), "ns:prod");
        assert_eq!(query.selector.as_deref(), Some("app=db"));

        let args = Args::parse_from(["kubetop", "node"]);
        assert_eq!(args.command.kind(), ResourceKind::Node);
        assert_eq!(build_query(&args, "dev"), Query::nodes());
    }

    #[test]
    fn test_zero_interval_is_a_config_error() {
        let args = Args::parse_from([
            "kubetop",
            "node",
            "--interval",
            "0",
            "--config",
            "/nonexistent/kubetop.toml",
        ]);
        assert!(matches!(
            build_config(&args, Query::nodes()),
            Err(ConfigError::Interval)
        ));
    }
}
