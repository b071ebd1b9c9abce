use super::RequestsLoggingLevel;
use crate::blend::RecommendationLocale;
use crate::calibration::ResolutionTier;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Coefficient scheme used by the estimation endpoint.
    pub estimation_tier: ResolutionTier,
    pub recommendation_locale: RecommendationLocale,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3010,
            metrics_port: 9110,
            estimation_tier: ResolutionTier::InProcess,
            recommendation_locale: RecommendationLocale::En,
        }
    }
}

impl From<&crate::config::AppConfig> for ServerConfig {
    fn from(config: &crate::config::AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            estimation_tier: config.estimation_tier,
            recommendation_locale: config.recommendation_locale,
        }
    }
}
