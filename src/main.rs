//! copilot - drive ceph-ansible deployments
//!
//! This is the main entry point for the copilot CLI.

mod cli;

use anyhow::Result;
use ceph_copilot::config::{Config, LoggingConfig};
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {:#}", e);
            Config::default()
        }
    };

    if let Err(e) = init_logging(cli.verbosity(), &config.logging) {
        eprintln!("Warning: Failed to open log file: {:#}", e);
    }

    tracing::debug!(version = %ceph_copilot::version_info(), "Starting copilot");

    let mut ctx = CommandContext::new(&cli, config);

    let exit_code = match dispatch(&cli, &mut ctx).await {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            e.downcast_ref::<ceph_copilot::error::Error>()
                .map_or(1, ceph_copilot::error::Error::exit_code)
        }
    };

    ctx.output.flush();
    std::process::exit(exit_code);
}

async fn dispatch(cli: &Cli, ctx: &mut CommandContext) -> Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(ctx).await,
        Commands::Exec(args) => args.execute(ctx).await,
        Commands::CheckHosts(args) => args.execute(ctx).await,
        Commands::Cfg(args) => args.execute(ctx).await,
        Commands::Size(args) => args.execute(ctx).await,
        Commands::Cidr(args) => args.execute(ctx).await,
        Commands::ValidateYaml(args) => args.execute(ctx).await,
    }
}

/// Initialize logging based on verbosity level and the logging config
///
/// With a log path set, events go to that file so they do not disturb the
/// live progress line; otherwise they go to stderr.
fn init_logging(verbosity: u8, logging: &LoggingConfig) -> Result<()> {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let (file_layer, file_error) = match &logging.log_path {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                ),
                None,
            ),
            Err(e) => (
                None,
                Some(anyhow::anyhow!("{}: {}", path.display(), e)),
            ),
        },
        None => (None, None),
    };

    let stderr_layer = file_layer.is_none().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity >= 3)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(env_filter)
        .init();

    match file_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
