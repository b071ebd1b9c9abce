mod file_config;

pub use file_config::FileConfig;

use crate::blend::RecommendationLocale;
use crate::calibration::ResolutionTier;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub estimation_tier: ResolutionTier,
    pub recommendation_locale: RecommendationLocale,
    pub seed_calibration: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Coefficient scheme used by the estimation endpoint.
    pub estimation_tier: ResolutionTier,
    pub recommendation_locale: RecommendationLocale,
    /// Upsert the reference calibration rows when the table is empty.
    pub seed_calibration: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_value::<RequestsLoggingLevel>(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        // unknown tiers are rejected, unlike the other enum settings
        let estimation_tier = match file.estimation_tier {
            Some(s) => match parse_value::<ResolutionTier>(&s) {
                Some(tier) => tier,
                None => bail!(
                    "Invalid estimation_tier '{}', expected in_process or persisted",
                    s
                ),
            },
            None => cli.estimation_tier,
        };

        let recommendation_locale = file
            .recommendation_locale
            .and_then(|s| parse_value::<RecommendationLocale>(&s))
            .unwrap_or(cli.recommendation_locale);

        let seed_calibration = file.seed_calibration.unwrap_or(cli.seed_calibration);

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            estimation_tier,
            recommendation_locale,
            seed_calibration,
        })
    }

    pub fn calibration_db_path(&self) -> PathBuf {
        self.db_dir.join("calibration.db")
    }

    pub fn blend_db_path(&self) -> PathBuf {
        self.db_dir.join("blend.db")
    }
}

/// Parses a config string with clap's ValueEnum rules, ignoring case.
fn parse_value<T: ValueEnum>(s: &str) -> Option<T> {
    T::from_str(s, true).ok()
}
