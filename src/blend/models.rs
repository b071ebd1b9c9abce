use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sqlite_persistence::JsonField;

pub const SENSOR_CHANNEL_COUNT: usize = 3;

/// The three blend-sensor readings of one sample. Absent readings are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReadings {
    #[serde(default)]
    pub sensor_reading_1: f64,
    #[serde(default)]
    pub sensor_reading_2: f64,
    #[serde(default)]
    pub sensor_reading_3: f64,
}

impl SensorReadings {
    pub fn new(r1: f64, r2: f64, r3: f64) -> Self {
        Self {
            sensor_reading_1: r1,
            sensor_reading_2: r2,
            sensor_reading_3: r3,
        }
    }

    pub fn as_array(&self) -> [f64; SENSOR_CHANNEL_COUNT] {
        [
            self.sensor_reading_1,
            self.sensor_reading_2,
            self.sensor_reading_3,
        ]
    }

    pub fn is_all_zero(&self) -> bool {
        self.as_array().iter().all(|v| *v == 0.0)
    }
}

/// Per-channel mean and population standard deviation over a profile's
/// samples. Keys absent from a stored signature read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendSignature {
    pub avg_reading_1: f64,
    pub avg_reading_2: f64,
    pub avg_reading_3: f64,
    pub std_reading_1: f64,
    pub std_reading_2: f64,
    pub std_reading_3: f64,
}

impl BlendSignature {
    pub fn means(&self) -> [f64; SENSOR_CHANNEL_COUNT] {
        [self.avg_reading_1, self.avg_reading_2, self.avg_reading_3]
    }

    pub fn stds(&self) -> [f64; SENSOR_CHANNEL_COUNT] {
        [self.std_reading_1, self.std_reading_2, self.std_reading_3]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewBlendSample {
    #[serde(default)]
    pub sample_name: String,
    #[serde(flatten)]
    pub readings: SensorReadings,
    #[serde(default)]
    pub chemical_data: Map<String, Value>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendSample {
    pub id: i64,
    pub profile_id: i64,
    pub sample_name: String,
    #[serde(flatten)]
    pub readings: SensorReadings,
    /// Decoded chemical data; malformed stored text reads as an empty object.
    pub chemical_data: Map<String, Value>,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendProfile {
    pub id: i64,
    pub device_id: String,
    pub profile_name: String,
    pub description: String,
    pub sample_count: i64,
    pub signature: JsonField<BlendSignature>,
    pub created_at: String,
    pub updated_at: String,
    pub samples: Vec<BlendSample>,
}

/// A stored profile as seen by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCandidate {
    pub profile_id: i64,
    pub profile_name: String,
    pub description: String,
    pub signature: JsonField<BlendSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProfile {
    pub profile_id: i64,
    pub sample_count: usize,
    pub signature: BlendSignature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddedSample {
    pub sample_id: i64,
    pub profile_id: i64,
    pub sample_count: i64,
    pub signature: BlendSignature,
}
