mod cli;
mod replay;
mod trace;

use std::path::PathBuf;

use nestling_common::{ConfigError, NestlingError};
use nestling_config::NestlingConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};
use crate::trace::Trace;

/// Config as loaded before logging exists. Its problems are logged once
/// the subscriber is up.
struct LoadedConfig {
    config: NestlingConfig,
    override_path: Option<PathBuf>,
    error: Option<ConfigError>,
}

impl LoadedConfig {
    fn load(args: &Args) -> Self {
        let loaded = match &args.config {
            Some(path) => nestling_config::toml_loader::load_from_path(path),
            None => nestling_config::load_config(),
        };
        let (config, error) = match loaded {
            Ok(config) => (config, None),
            Err(e) => (NestlingConfig::default(), Some(e)),
        };
        Self {
            config,
            override_path: args.config.clone(),
            error,
        }
    }

    fn report(&self) {
        if let Some(path) = &self.override_path {
            tracing::info!("Using config override: {}", path.display());
        }
        if let Some(e) = &self.error {
            tracing::warn!("Config load failed, using defaults: {e}");
        }
    }
}

fn init_logging(directive: &str) {
    // RUST_LOG still applies; the CLI or config directive is added on top.
    let mut directives: Vec<String> = std::env::var(EnvFilter::DEFAULT_ENV)
        .map(|env| vec![env])
        .unwrap_or_default();
    directives.push(directive.to_owned());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(directives.join(",")))
        .init();
}

/// Fold command-line overrides into the config and validate the result.
fn apply_overrides(
    config: &mut NestlingConfig,
    socket_name: Option<String>,
) -> Result<(), NestlingError> {
    if let Some(name) = socket_name {
        config.compositor.socket_name = Some(name);
    }
    nestling_config::validation::validate(config)?;
    Ok(())
}

fn run(args: Args, mut config: NestlingConfig) -> Result<(), NestlingError> {
    apply_overrides(&mut config, args.socket_name)?;

    match args.command {
        Command::Replay { trace } => {
            let trace = Trace::load(&trace)?;
            let report = replay::run(&trace, replay::ReplayOptions::from(&config))?;
            tracing::info!(
                windows = report.windows.len(),
                requests = report.requests.len(),
                events = report.events.len(),
                "replay finished"
            );
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| NestlingError::Other(format!("failed to serialize report: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn main() {
    let args = cli::parse();

    // The log level comes from the config, so it loads first.
    let loaded = LoadedConfig::load(&args);
    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| loaded.config.logging.level.directive().to_owned());
    init_logging(&directive);

    tracing::info!("Nestling v{} starting...", env!("CARGO_PKG_VERSION"));
    loaded.report();

    if let Err(e) = run(args, loaded.config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
