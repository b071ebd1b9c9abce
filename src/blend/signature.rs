//! Blend signature: per-channel spread of a profile's samples.

use super::{BlendSignature, SensorReadings, SENSOR_CHANNEL_COUNT};
use crate::analysis::AnalysisError;

/// Mean and population standard deviation (divisor `n`) of each channel.
pub fn build_signature(samples: &[SensorReadings]) -> Result<BlendSignature, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let n = samples.len() as f64;
    let mut means = [0.0; SENSOR_CHANNEL_COUNT];
    let mut stds = [0.0; SENSOR_CHANNEL_COUNT];
    for channel in 0..SENSOR_CHANNEL_COUNT {
        let values = samples.iter().map(|s| s.as_array()[channel]);
        let first = samples[0].as_array()[channel];
        // sum / n drifts off non-dyadic values, identical samples must stay exact
        if values.clone().all(|v| v == first) {
            means[channel] = first;
            stds[channel] = 0.0;
            continue;
        }
        let mean = values.clone().sum::<f64>() / n;
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        means[channel] = mean;
        stds[channel] = variance.sqrt();
    }

    Ok(BlendSignature {
        avg_reading_1: means[0],
        avg_reading_2: means[1],
        avg_reading_3: means[2],
        std_reading_1: stds[0],
        std_reading_2: stds[1],
        std_reading_3: stds[2],
    })
}
