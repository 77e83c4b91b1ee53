//! Binary entry point for the `scw-volume` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use scw_volume::{
    ConfigError, InstanceApi, ScalewayConfig, ScalewayInstanceApi, ValidationError, VolumeConfig,
    VolumeError, VolumeReconciler, VolumeState, VolumeType, ZonedId,
};

mod cli;

use cli::{Cli, Command, CreateCommand, UpdateCommand};

const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Volume(#[from] VolumeError),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let exit_code = match dispatch(cli.command).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

async fn dispatch(command: Command) -> Result<(), CliError> {
    let config = ScalewayConfig::load_without_cli_args()?;
    let api = ScalewayInstanceApi::new(&config)?;
    let reconciler = VolumeReconciler::new(api, config.placement())
        .with_retry_interval(config.retry_interval())
        .with_delete_timeout(config.delete_timeout());

    execute(&reconciler, command, &mut io::stdout(), &mut io::stderr()).await
}

async fn execute<A: InstanceApi>(
    reconciler: &VolumeReconciler<A>,
    command: Command,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Create(args) => {
            let config = create_config(args)?;
            let state = reconciler.create(&config).await?;
            write_state(out, &state)
        }
        Command::Read(args) => {
            let id: ZonedId = args.id.parse()?;
            if let Some(state) = reconciler.read(&id).await? {
                write_state(out, &state)
            } else {
                writeln!(err, "volume {id} does not exist").ok();
                Ok(())
            }
        }
        Command::Update(args) => {
            let id: ZonedId = args.id.parse()?;
            let prior = reconciler
                .read(&id)
                .await?
                .ok_or_else(|| VolumeError::NotFound {
                    volume_id: id.to_string(),
                })?;
            let desired = update_config(&prior, args)?;
            let state = reconciler.update(&prior, &desired).await?;
            write_state(out, &state)
        }
        Command::Delete(args) => {
            let id: ZonedId = args.id.parse()?;
            reconciler.delete(&id).await?;
            Ok(())
        }
        Command::Import(args) => {
            let state = reconciler.import(&args.id).await?;
            write_state(out, &state)
        }
    }
}

fn create_config(args: CreateCommand) -> Result<VolumeConfig, ValidationError> {
    let volume_type: VolumeType = args.volume_type.parse()?;
    VolumeConfig::builder(volume_type)
        .name(args.name)
        .size_in_gb(args.size_in_gb)
        .from_volume_id(args.from_volume_id)
        .from_snapshot_id(args.from_snapshot_id)
        .zone(args.zone)
        .project_id(args.project_id)
        .build()
}

/// Desired configuration for `update`: placement, type, and seed come from
/// the refreshed state; flags left out are not managed.
fn update_config(prior: &VolumeState, args: UpdateCommand) -> Result<VolumeConfig, ValidationError> {
    VolumeConfig::builder(prior.volume_type)
        .name(args.name)
        .size_in_gb(args.size_in_gb)
        .from_volume_id(prior.from_volume_id.clone())
        .from_snapshot_id(prior.from_snapshot_id.clone())
        .zone(Some(prior.zone.clone()))
        .project_id(Some(prior.project_id.clone()))
        .build()
}

fn write_state(target: &mut impl Write, state: &VolumeState) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(state).map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(target, "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
