use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AnalysisError;

pub const NIR_CHANNEL_COUNT: usize = 11;

/// One capture of the 11-channel near-infrared sensor array.
///
/// Channels that were not reported are stored as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NirReading {
    channels: [f64; NIR_CHANNEL_COUNT],
}

impl NirReading {
    pub fn new(channels: [f64; NIR_CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    /// Builds a reading from a possibly short slice, padding absent channels
    /// with zero. Values past the eleventh channel are ignored.
    pub fn from_slice_lenient(values: &[f64]) -> Self {
        let mut channels = [0.0; NIR_CHANNEL_COUNT];
        for (slot, value) in channels.iter_mut().zip(values) {
            *slot = *value;
        }
        Self { channels }
    }

    /// Builds a reading from the device wire format, an object keyed
    /// `channel0` .. `channel10`. Missing keys and non-numeric values read as
    /// zero, unknown keys are ignored.
    pub fn from_channel_map(map: &Map<String, Value>) -> Self {
        let mut channels = [0.0; NIR_CHANNEL_COUNT];
        for (index, slot) in channels.iter_mut().enumerate() {
            *slot = map
                .get(&channel_key(index))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
        }
        Self { channels }
    }

    pub fn to_channel_map(&self) -> Map<String, Value> {
        self.channels
            .iter()
            .enumerate()
            .map(|(index, value)| (channel_key(index), Value::from(*value)))
            .collect()
    }

    /// Channel value at `index`; indices outside the array read as zero.
    pub fn channel(&self, index: usize) -> f64 {
        self.channels.get(index).copied().unwrap_or(0.0)
    }

    pub fn channels(&self) -> &[f64; NIR_CHANNEL_COUNT] {
        &self.channels
    }
}

/// Strict conversion: exactly eleven finite channel values.
impl TryFrom<&[f64]> for NirReading {
    type Error = AnalysisError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        if values.len() != NIR_CHANNEL_COUNT {
            return Err(AnalysisError::InvalidInput(format!(
                "expected {} NIR channels, got {}",
                NIR_CHANNEL_COUNT,
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "channel{} is not a finite number",
                index
            )));
        }
        Ok(Self::from_slice_lenient(values))
    }
}

impl Serialize for NirReading {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_channel_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NirReading {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_channel_map(&map))
    }
}

fn channel_key(index: usize) -> String {
    format!("channel{}", index)
}
