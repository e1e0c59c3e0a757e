use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::api::Api;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coherence_operator::controller::naming::full_role_name;
use coherence_operator::controller::{
    apply_role_resources, is_satisfied, plan_scaling, quorum_status, resolve_cluster_roles,
    synthesize_cluster, ResolvedRole,
};
use coherence_operator::crd::CoherenceCluster;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resources synthesized for every role as YAML
    Render(ClusterArgs),
    /// Show the effective scaling policy of every role
    Policy(PolicyArgs),
    /// Evaluate the start quorum of every role against ready member counts
    Quorum(QuorumArgs),
    /// Apply the resources of every role whose start quorum is met
    Apply(ApplyArgs),
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct ClusterArgs {
    /// CoherenceCluster manifest
    #[arg(long, short = 'f', env = "COHERENCE_CLUSTER_FILE")]
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct PolicyArgs {
    #[command(flatten)]
    cluster: ClusterArgs,

    /// Current replica count, used to show the scaling plan towards the desired count
    #[arg(long)]
    current: Option<i32>,
}

#[derive(Parser, Debug)]
struct QuorumArgs {
    #[command(flatten)]
    cluster: ClusterArgs,

    /// Ready members of a role, as `role=count`; may be repeated
    #[arg(long = "ready", value_parser = parse_ready)]
    ready: Vec<(String, i32)>,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    cluster: ClusterArgs,

    /// Namespace the resources are applied to
    #[arg(long, env = "COHERENCE_NAMESPACE", default_value = "default")]
    namespace: String,
}

fn parse_ready(value: &str) -> Result<(String, i32), String> {
    let (role, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected role=count, got {value}"))?;
    let count = count
        .trim()
        .parse()
        .map_err(|e| format!("invalid ready count for {role}: {e}"))?;
    Ok((role.trim().to_string(), count))
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_cluster(args: &ClusterArgs) -> anyhow::Result<CoherenceCluster> {
    CoherenceCluster::load(&args.file)
        .with_context(|| format!("failed to load cluster from {}", args.file.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Commands::Version = args.command {
        println!("Coherence Operator v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing(args.log_format);

    match args.command {
        Commands::Render(cluster) => run_render(&cluster),
        Commands::Policy(policy) => run_policy(&policy),
        Commands::Quorum(quorum) => run_quorum(&quorum),
        Commands::Apply(apply) => run_apply(&apply).await,
        Commands::Version => Ok(()),
    }
}

fn run_render(args: &ClusterArgs) -> anyhow::Result<()> {
    let cluster = load_cluster(args)?;
    let mut documents = Vec::new();
    for (role, resources) in synthesize_cluster(&cluster)? {
        info!(role = role.role_name(), "Rendering role");
        for manifest in resources.manifests()? {
            documents.push(serde_yaml::to_string(&manifest)?);
        }
    }
    print!("{}", documents.join("---\n"));
    Ok(())
}

fn run_policy(args: &PolicyArgs) -> anyhow::Result<()> {
    let cluster = load_cluster(&args.cluster)?;
    for role in resolve_cluster_roles(&cluster)? {
        let policy = role.scaling_policy();
        let probe = role.status_ha_probe();
        match args.current {
            Some(current) => println!(
                "{}: policy={} replicas={} plan={:?} probeTimeout={}s",
                role.role_name(),
                policy,
                role.replicas(),
                plan_scaling(policy, current, role.replicas()),
                probe.timeout.as_secs()
            ),
            None => println!(
                "{}: policy={} replicas={} probeTimeout={}s",
                role.role_name(),
                policy,
                role.replicas(),
                probe.timeout.as_secs()
            ),
        }
    }
    Ok(())
}

fn run_quorum(args: &QuorumArgs) -> anyhow::Result<()> {
    let cluster = load_cluster(&args.cluster)?;
    let ready: BTreeMap<String, i32> = args.ready.iter().cloned().collect();

    for role in resolve_cluster_roles(&cluster)? {
        print_quorum(&role, &ready);
    }
    Ok(())
}

fn print_quorum(role: &ResolvedRole, ready: &BTreeMap<String, i32>) {
    let satisfied = is_satisfied(role.start_quorum(), ready);
    println!("{}: ready-to-start={}", role.role_name(), satisfied);
    for status in quorum_status(role.start_quorum(), ready) {
        println!(
            "  {} >= {}: {}",
            status.quorum.role, status.quorum.pod_count, status.ready
        );
    }
}

async fn run_apply(args: &ApplyArgs) -> anyhow::Result<()> {
    let cluster = load_cluster(&args.cluster)?;
    let roles = synthesize_cluster(&cluster)?;

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!(namespace = %args.namespace, "Connected to Kubernetes cluster");

    let cluster_name = kube::ResourceExt::name_any(&cluster);
    let statefulsets: Api<StatefulSet> = Api::namespaced(client.clone(), &args.namespace);

    let mut ready = BTreeMap::new();
    for (role, _) in &roles {
        let name = full_role_name(&cluster_name, role.role_name());
        let count = statefulsets
            .get_opt(&name)
            .await?
            .and_then(|sts| sts.status)
            .and_then(|status| status.ready_replicas)
            .unwrap_or(0);
        ready.insert(role.role_name().to_string(), count);
    }

    for (role, resources) in &roles {
        if !is_satisfied(role.start_quorum(), &ready) {
            warn!(role = role.role_name(), "Start quorum not met, skipping role");
            continue;
        }
        apply_role_resources(&client, &args.namespace, resources).await?;
    }
    Ok(())
}
