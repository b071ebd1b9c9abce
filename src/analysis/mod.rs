mod composition;
mod error;
mod nir;

pub use composition::{
    estimate, estimate_component, CalibrationCoefficients, Component, ComponentCoefficient,
    CompositionEstimate,
};
pub use error::AnalysisError;
pub use nir::{NirReading, NIR_CHANNEL_COUNT};
