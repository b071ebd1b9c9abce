//! Coffee Analysis Server Library
//!
//! NIR composition estimation, calibration lookup and blend profile matching,
//! exposed for the server binaries and the integration tests.

pub mod analysis;
pub mod blend;
pub mod calibration;
pub mod config;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use blend::{BlendStore, SqliteBlendStore};
pub use calibration::{CalibrationRepository, CalibrationResolver, SqliteCalibrationStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
