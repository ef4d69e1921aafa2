//! smfctl: command-line entry point for the SMF operator.
//!
//! # Usage
//!
//! ```text
//! smfctl render --nrf-url http://nrf:29510 --database-url mongodb://db:27017 --pod-ip 10.1.2.3
//! smfctl plan --pod-ip 10.1.2.3 --with-routing
//! smfctl event --root ./workload --relations relations.yaml --pod-ip 10.1.2.3 workload-ready
//! smfctl event --root ./workload --pod-ip 10.1.2.3 url-available nrf http://nrf:29510
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`).

mod local;

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use smf_operator_core::dispatch::{Dispatcher, Handled};
use smf_operator_core::error::{OperatorError, Result};
use smf_operator_core::infrastructure::fs::DirectoryWorkload;
use smf_operator_core::infrastructure::host::HookToolHost;
use smf_operator_core::infrastructure::relations::StaticRelations;
use smf_operator_core::infrastructure::runner::ProcessRunner;
use smf_operator_core::infrastructure::HostRuntime;
use smf_operator_core::reconcile::{build_plan, Collaborators, Reconciler};
use smf_operator_core::render::{self, RenderInputs};
use smf_operator_core::settings;
use smf_operator_core::types::config::{OperatorSettings, PeerRole};
use smf_operator_core::types::event::Event;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use local::LocalHost;

/// Drive the SMF operator's reconcile engine.
#[derive(Parser, Debug)]
#[command(name = "smfctl", version, about, long_about = None)]
struct Cli {
    /// Operator settings file (YAML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the rendered smfcfg.yaml
    Render {
        /// NRF URL
        #[arg(long)]
        nrf_url: String,
        /// Database URL (first entry of a comma separated list is used)
        #[arg(long)]
        database_url: String,
        /// Pod IPv4 address
        #[arg(long)]
        pod_ip: Ipv4Addr,
        /// UPF node, required when the settings declare a UPF relation
        #[arg(long)]
        upf_url: Option<String>,
    },
    /// Print the supervisor layer as YAML
    Plan {
        /// Pod IPv4 address
        #[arg(long)]
        pod_ip: Ipv4Addr,
        /// Include the UE routing file flag
        #[arg(long)]
        with_routing: bool,
    },
    /// Deliver one event against a directory-backed workload
    Event(EventArgs),
}

#[derive(Args, Debug)]
struct EventArgs {
    /// Directory standing in for the container filesystem
    #[arg(long)]
    root: PathBuf,
    /// YAML relation table (`relation: {key: value}`)
    #[arg(long)]
    relations: Option<PathBuf>,
    /// Pod IPv4 address
    #[arg(long, required_unless_present = "hook_tools")]
    pod_ip: Option<Ipv4Addr>,
    /// Report through hook tools (status-set, open-port, ...) instead of logging
    #[arg(long)]
    hook_tools: bool,
    /// Keep re-delivering a deferred event until it settles or its retries run out
    #[arg(long)]
    follow: bool,
    #[command(subcommand)]
    event: EventKind,
}

#[derive(Subcommand, Debug, Clone)]
enum EventKind {
    /// Unit installed
    Install,
    /// Workload container became reachable
    WorkloadReady,
    /// Relation established
    RelationJoined { relation: String },
    /// Database provider created the database
    DatabaseCreated { relation: String, uris: String },
    /// Peer published its URL
    UrlAvailable { relation: String, url: String },
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Install => Event::Install,
            EventKind::WorkloadReady => Event::WorkloadReady,
            EventKind::RelationJoined { relation } => Event::RelationJoined { relation },
            EventKind::DatabaseCreated { relation, uris } => {
                Event::DatabaseCreated { relation, uris }
            }
            EventKind::UrlAvailable { relation, url } => Event::UrlAvailable { relation, url },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("smfctl: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let settings = load_settings(cli.settings.as_deref())?;
    match cli.command {
        Commands::Render {
            nrf_url,
            database_url,
            pod_ip,
            upf_url,
        } => render_config(&settings, nrf_url, &database_url, pod_ip, upf_url),
        Commands::Plan {
            pod_ip,
            with_routing,
        } => Ok(build_plan(pod_ip, with_routing).to_yaml()?),
        Commands::Event(args) => run_event(settings, args),
    }
}

fn load_settings(path: Option<&Path>) -> Result<OperatorSettings> {
    match path {
        Some(path) => settings::load(path),
        None => Ok(OperatorSettings::default()),
    }
}

fn render_config(
    settings: &OperatorSettings,
    nrf_url: String,
    database_url: &str,
    pod_ip: Ipv4Addr,
    upf_url: Option<String>,
) -> Result<String> {
    let upf_node = match (upf_url, settings.dependency(PeerRole::Upf)) {
        (Some(url), _) => url,
        (None, Some(dep)) => {
            return Err(OperatorError::Settings(format!(
                "--upf-url is required when the '{}' relation is declared",
                dep.relation
            )))
        }
        (None, None) => settings.upf_node.clone(),
    };
    let database_url = database_url
        .split(',')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let rendered = render::render(&RenderInputs {
        database_url,
        nrf_url,
        upf_node,
        pod_ip,
        hostname: settings.hostname(),
    })?;
    Ok(rendered.into_string())
}

fn run_event(settings: OperatorSettings, args: EventArgs) -> Result<String> {
    let relations = match &args.relations {
        Some(path) => StaticRelations::load(path)?,
        None => StaticRelations::new(),
    };
    let mut workload = DirectoryWorkload::new(&args.root);
    let mut host: Box<dyn HostRuntime> = match (args.hook_tools, args.pod_ip) {
        (true, Some(ip)) => Box::new(HookToolHost::with_pod_ip(ProcessRunner, ip)),
        (true, None) => Box::new(HookToolHost::new(ProcessRunner)),
        (false, ip) => Box::new(LocalHost::new(ip)),
    };
    let mut ctx = Collaborators {
        workload: &mut workload,
        relations: &relations,
        host: host.as_mut(),
    };

    let mut dispatcher = Dispatcher::from_reconciler(Reconciler::new(settings));
    let started = Instant::now();
    let mut handled = dispatcher.deliver(args.event.into(), 0, &mut ctx)?;

    if args.follow {
        while let Some(due) = dispatcher.queue().next_due_ms() {
            let elapsed = started.elapsed().as_millis() as u64;
            if due > elapsed {
                debug!(wait_ms = due - elapsed, "waiting for deferred event");
                std::thread::sleep(Duration::from_millis(due - elapsed));
            }
            let now = started.elapsed().as_millis() as u64;
            handled.extend(dispatcher.tick(now, &mut ctx)?);
        }
    }

    Ok(summarize(&handled))
}

/// One line per processed event: `<event key>: <status>[ (deferred)]`.
fn summarize(handled: &[Handled]) -> String {
    handled
        .iter()
        .map(|h| {
            let status = match &h.outcome.status {
                Some(status) => status.to_string(),
                None => "unchanged".to_string(),
            };
            let deferred = if h.outcome.deferred { " (deferred)" } else { "" };
            format!("{}: {}{}", h.event.key(), status, deferred)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
