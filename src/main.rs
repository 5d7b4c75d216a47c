use clap::{Args, Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use release_sync::config::{ComponentSpec, DEFAULT_STATE_DIR, SourceKind, SyncConfig};
use release_sync::image::DockerCli;
use release_sync::source;
use release_sync::store::VersionStore;
use release_sync::submit::GitHubSubmitter;
use release_sync::sync::{SyncOutcome, SyncPipeline};

#[derive(Parser)]
#[command(name = "release-sync")]
#[command(version, about = "Syncs upstream releases into a private container registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync a single tracked repository
    Sync(SyncArgs),
    /// Sync a multi-component configuration document
    Multi(MultiArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum SyncType {
    Release,
    Tag,
    Registry,
    /// Alias kept for existing workflow definitions
    Dockerhub,
}

impl From<SyncType> for SourceKind {
    fn from(value: SyncType) -> Self {
        match value {
            SyncType::Release => SourceKind::Release,
            SyncType::Tag => SourceKind::Tag,
            SyncType::Registry | SyncType::Dockerhub => SourceKind::Registry,
        }
    }
}

#[derive(Args)]
struct SharedArgs {
    /// GitHub token for API queries and change requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// Target registry URL
    #[arg(long, env = "DOCKER_REGISTRY")]
    registry: String,

    /// Namespace for mirrored images in the target registry
    #[arg(long, env = "DOCKER_REGISTRY_NAMESPACE")]
    namespace: String,

    #[arg(long, env = "DOCKER_REGISTRY_USER")]
    registry_user: Option<String>,

    #[arg(long, env = "DOCKER_REGISTRY_PASSWORD", hide_env_values = true)]
    registry_password: Option<String>,

    /// Repository the version records and change requests live in
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo_fullname: String,

    /// Directory holding the per-key version files
    #[arg(long, default_value = DEFAULT_STATE_DIR)]
    state_dir: String,

    /// Base branch change requests are opened against
    #[arg(long, default_value = "master")]
    base_branch: String,
}

#[derive(Args)]
struct SyncArgs {
    /// Repository or image to track, e.g. minio/minio
    #[arg(long)]
    repo: String,

    #[arg(long, value_enum, default_value = "release")]
    sync_type: SyncType,

    /// JSON array of source images to mirror
    #[arg(long, default_value = "[]")]
    source_images: String,

    /// Dockerfile content with a {VERSION} placeholder, for built images
    #[arg(long, default_value = "")]
    dockerfile: String,

    /// Target image name override for built images
    #[arg(long)]
    target_image: Option<String>,

    /// Version transform rule (none, strip-prefix:, regex-capture:, skip-if:, replace:)
    #[arg(long, default_value = "none")]
    version_transform: String,

    /// Literal tag prefix filter for registry sync
    #[arg(long)]
    tag_prefix: Option<String>,

    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Args)]
struct MultiArgs {
    /// JSON sync configuration document
    #[arg(long)]
    config: String,

    #[command(flatten)]
    shared: SharedArgs,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli.command)));

    match outcome {
        Ok((key, SyncOutcome::NoChange)) => {
            info!("No change for {}", key);
            ExitCode::SUCCESS
        }
        Ok((key, SyncOutcome::Skipped { version })) => {
            info!("Version {} of {} skipped by transform rule", version, key);
            ExitCode::SUCCESS
        }
        Ok((
            key,
            SyncOutcome::Synced {
                new_version,
                change_request,
                ..
            },
        )) => {
            match change_request {
                Some(reference) => println!(
                    "::notice title=Version Update::Updated {key} to {new_version}. PR: {reference}"
                ),
                None => println!("::notice title=Version Update::Updated {key} to {new_version}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Sync failed: {:#}", e);
            println!("::error title=Sync Failed::{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<(String, SyncOutcome)> {
    let (config, shared) = match command {
        Command::Sync(args) => {
            let config = single_config(&args)?;
            (config, args.shared)
        }
        Command::Multi(args) => {
            let config = multi_config(&args.config, &args.shared)?;
            (config, args.shared)
        }
    };

    info!("Starting sync for {}", config.key);

    let store = VersionStore::new(&shared.state_dir);
    let source = source::from_config(&config, Some(&shared.github_token));
    let engine = DockerCli::new();
    if let (Some(user), Some(password)) = (&shared.registry_user, &shared.registry_password) {
        engine.login(&shared.registry, user, password).await?;
    }
    let submitter = GitHubSubmitter::new(&shared.repo_fullname, &shared.github_token)
        .with_state_dir(&shared.state_dir);

    let pipeline = SyncPipeline::new(source.as_ref(), &store, &engine, &submitter);
    let outcome = pipeline.run(&config).await?;
    Ok((config.key, outcome))
}

fn single_config(args: &SyncArgs) -> anyhow::Result<SyncConfig> {
    let images: Vec<String> = serde_json::from_str(&args.source_images)
        .map_err(|e| anyhow::anyhow!("failed to parse --source-images: {e}"))?;

    // A recipe takes precedence over a mirror list, matching the workflow
    // inputs that always pass both
    let components = if !args.dockerfile.is_empty() {
        vec![ComponentSpec::Dockerfile {
            dockerfile: args.dockerfile.clone(),
            image_name: args.target_image.clone(),
        }]
    } else {
        vec![ComponentSpec::Image { images }]
    };

    Ok(SyncConfig {
        key: args.repo.clone(),
        subject: args.repo.clone(),
        source: args.sync_type.into(),
        tag_prefix: args.tag_prefix.clone(),
        transform: args.version_transform.clone(),
        components,
        target: release_sync::config::RegistryTarget {
            registry: args.shared.registry.clone(),
            namespace: args.shared.namespace.clone(),
        },
        base_branch: args.shared.base_branch.clone(),
    })
}

/// Parse the multi-component document, filling the registry target from the
/// environment-backed flags when the document omits it.
fn multi_config(document: &str, shared: &SharedArgs) -> anyhow::Result<SyncConfig> {
    let mut value: serde_json::Value = serde_json::from_str(document)
        .map_err(|e| anyhow::anyhow!("failed to parse --config: {e}"))?;

    if let Some(object) = value.as_object_mut() {
        object
            .entry("registry")
            .or_insert_with(|| shared.registry.clone().into());
        object
            .entry("namespace")
            .or_insert_with(|| shared.namespace.clone().into());
        object
            .entry("base_branch")
            .or_insert_with(|| shared.base_branch.clone().into());
    }

    let config: SyncConfig = serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("invalid sync configuration: {e}"))?;
    Ok(config)
}
