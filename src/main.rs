use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coffee_analysis_server::blend::{RecommendationLocale, SqliteBlendStore};
use coffee_analysis_server::calibration::{
    seed_reference_calibrations, CalibrationRepository, CalibrationResolver, ResolutionTier,
    SqliteCalibrationStore,
};
use coffee_analysis_server::config;
use coffee_analysis_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (calibration.db, blend.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3010)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9110)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Coefficient scheme used for live estimation.
    #[clap(long, value_enum, default_value = "in_process")]
    pub estimation_tier: ResolutionTier,

    /// Language of the blend match recommendation labels.
    #[clap(long, value_enum, default_value = "en")]
    pub recommendation_locale: RecommendationLocale,

    /// Do not seed the reference calibration rows into an empty calibration db.
    #[clap(long)]
    pub no_seed_calibration: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            estimation_tier: args.estimation_tier,
            recommendation_locale: args.recommendation_locale,
            seed_calibration: !args.no_seed_calibration,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!("  estimation_tier: {:?}", app_config.estimation_tier);

    if !app_config.calibration_db_path().exists() {
        info!(
            "Creating new calibration database at {:?}",
            app_config.calibration_db_path()
        );
    }
    let calibration_store = Arc::new(SqliteCalibrationStore::new(
        app_config.calibration_db_path(),
    )?);

    if app_config.seed_calibration && calibration_store.count_calibrations()? == 0 {
        info!("Calibration table is empty, seeding reference calibrations...");
        seed_reference_calibrations(calibration_store.as_ref())?;
    }

    if !app_config.blend_db_path().exists() {
        info!(
            "Creating new blend database at {:?}",
            app_config.blend_db_path()
        );
    }
    let blend_store = Arc::new(SqliteBlendStore::new(app_config.blend_db_path())?);

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    run_server(
        ServerConfig::from(&app_config),
        CalibrationResolver::new(calibration_store),
        blend_store,
    )
    .await
}
