use axum::extract::FromRef;

use crate::blend::BlendStore;
use crate::calibration::CalibrationResolver;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedBlendStore = Arc<dyn BlendStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub calibration_resolver: CalibrationResolver,
    pub blend_store: GuardedBlendStore,
    pub version: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        calibration_resolver: CalibrationResolver,
        blend_store: GuardedBlendStore,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            calibration_resolver,
            blend_store,
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for CalibrationResolver {
    fn from_ref(input: &ServerState) -> Self {
        input.calibration_resolver.clone()
    }
}

impl FromRef<ServerState> for GuardedBlendStore {
    fn from_ref(input: &ServerState) -> Self {
        input.blend_store.clone()
    }
}
