use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::{CalibrationCoefficients, Component, ComponentCoefficient};

/// Physical form of the analysed coffee. Encoded as an integer on the wire
/// and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CoffeeType {
    Green,
    Roasted,
    Ground,
    Unknown,
}

impl CoffeeType {
    pub fn as_i64(&self) -> i64 {
        match self {
            CoffeeType::Green => 0,
            CoffeeType::Roasted => 1,
            CoffeeType::Ground => 2,
            CoffeeType::Unknown => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoffeeType::Green => "green",
            CoffeeType::Roasted => "roasted",
            CoffeeType::Ground => "ground",
            CoffeeType::Unknown => "unknown",
        }
    }
}

impl TryFrom<i64> for CoffeeType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CoffeeType::Green),
            1 => Ok(CoffeeType::Roasted),
            2 => Ok(CoffeeType::Ground),
            3 => Ok(CoffeeType::Unknown),
            _ => Err(format!("unknown coffee type {}", value)),
        }
    }
}

impl From<CoffeeType> for i64 {
    fn from(value: CoffeeType) -> Self {
        value.as_i64()
    }
}

macro_rules! coffee_origins {
    ($($variant:ident = $code:literal => $name:literal),* $(,)?) => {
        /// Growing origin (or reference population) of the analysed coffee.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum CoffeeOrigin {
            $($variant,)*
        }

        impl CoffeeOrigin {
            pub const ALL: &'static [CoffeeOrigin] = &[$(CoffeeOrigin::$variant,)*];

            pub fn as_i64(&self) -> i64 {
                match self {
                    $(CoffeeOrigin::$variant => $code,)*
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CoffeeOrigin::$variant => $name,)*
                }
            }
        }

        impl TryFrom<i64> for CoffeeOrigin {
            type Error = String;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(CoffeeOrigin::$variant),)*
                    _ => Err(format!("unknown coffee origin {}", value)),
                }
            }
        }
    };
}

coffee_origins! {
    Unknown = 0 => "unknown",
    Brazil = 1 => "brazil",
    Colombia = 2 => "colombia",
    CostaRica = 3 => "costa_rica",
    Honduras = 4 => "honduras",
    Guatemala = 5 => "guatemala",
    India = 6 => "india",
    Indonesia = 7 => "indonesia",
    Vietnam = 8 => "vietnam",
    Peru = 9 => "peru",
    Tanzania = 10 => "tanzania",
    Uganda = 11 => "uganda",
    Ethiopia = 12 => "ethiopia",
    IvoryCoast = 13 => "ivory_coast",
    Yemen = 14 => "yemen",
    Sca = 15 => "sca",
    GlobalArabica = 16 => "global_arabica",
    GlobalRobusta = 17 => "global_robusta",
}

impl From<CoffeeOrigin> for i64 {
    fn from(value: CoffeeOrigin) -> Self {
        value.as_i64()
    }
}

impl fmt::Display for CoffeeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key of a calibration row. A `None` variety matches rows of any
/// variety for the given type and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationKey {
    pub coffee_type: CoffeeType,
    pub coffee_origin: CoffeeOrigin,
    pub coffee_variety: Option<String>,
}

impl CalibrationKey {
    pub fn new(
        coffee_type: CoffeeType,
        coffee_origin: CoffeeOrigin,
        coffee_variety: Option<&str>,
    ) -> Self {
        Self {
            coffee_type,
            coffee_origin,
            coffee_variety: coffee_variety.map(str::to_string),
        }
    }
}

/// Per-component values of a calibration row. Each coefficient and offset is
/// nullable: rows may calibrate only a subset of the components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialCoefficients {
    pub co2_coeff: Option<f64>,
    pub co2_offset: Option<f64>,
    pub protein_coeff: Option<f64>,
    pub protein_offset: Option<f64>,
    pub amino_acids_coeff: Option<f64>,
    pub amino_acids_offset: Option<f64>,
    pub minerals_coeff: Option<f64>,
    pub minerals_offset: Option<f64>,
    pub flavor_compounds_coeff: Option<f64>,
    pub flavor_compounds_offset: Option<f64>,
    pub moisture_coeff: Option<f64>,
    pub moisture_offset: Option<f64>,
}

impl PartialCoefficients {
    pub fn get(&self, component: Component) -> (Option<f64>, Option<f64>) {
        match component {
            Component::Co2 => (self.co2_coeff, self.co2_offset),
            Component::Protein => (self.protein_coeff, self.protein_offset),
            Component::AminoAcids => (self.amino_acids_coeff, self.amino_acids_offset),
            Component::Minerals => (self.minerals_coeff, self.minerals_offset),
            Component::FlavorCompounds => {
                (self.flavor_compounds_coeff, self.flavor_compounds_offset)
            }
            Component::Moisture => (self.moisture_coeff, self.moisture_offset),
        }
    }

    /// Values in column order, matching [`COEFFICIENT_COLUMNS`].
    pub fn to_columns(&self) -> [Option<f64>; 12] {
        let mut columns = [None; 12];
        for (index, component) in Component::ALL.iter().enumerate() {
            let (coeff, offset) = self.get(*component);
            columns[index * 2] = coeff;
            columns[index * 2 + 1] = offset;
        }
        columns
    }

    pub fn from_columns(columns: [Option<f64>; 12]) -> Self {
        Self {
            co2_coeff: columns[0],
            co2_offset: columns[1],
            protein_coeff: columns[2],
            protein_offset: columns[3],
            amino_acids_coeff: columns[4],
            amino_acids_offset: columns[5],
            minerals_coeff: columns[6],
            minerals_offset: columns[7],
            flavor_compounds_coeff: columns[8],
            flavor_compounds_offset: columns[9],
            moisture_coeff: columns[10],
            moisture_offset: columns[11],
        }
    }

    /// Overlays the values present in `self` on top of `base`.
    pub fn complete_with(&self, base: &CalibrationCoefficients) -> CalibrationCoefficients {
        let mut complete = *base;
        for component in Component::ALL {
            let fallback = base.get(component);
            let (coeff, offset) = self.get(component);
            complete.set(
                component,
                ComponentCoefficient::new(
                    coeff.unwrap_or(fallback.coefficient),
                    offset.unwrap_or(fallback.offset),
                ),
            );
        }
        complete
    }

    /// Replaces only the values that are present in `update`.
    pub fn merge(&mut self, update: &PartialCoefficients) {
        let mut columns = self.to_columns();
        for (slot, value) in columns.iter_mut().zip(update.to_columns()) {
            if value.is_some() {
                *slot = value;
            }
        }
        *self = Self::from_columns(columns);
    }
}

impl From<&CalibrationCoefficients> for PartialCoefficients {
    fn from(value: &CalibrationCoefficients) -> Self {
        let mut columns = [None; 12];
        for (index, component) in Component::ALL.iter().enumerate() {
            let pair = value.get(*component);
            columns[index * 2] = Some(pair.coefficient);
            columns[index * 2 + 1] = Some(pair.offset);
        }
        Self::from_columns(columns)
    }
}

/// Column names of the coefficient values, in storage order.
pub const COEFFICIENT_COLUMNS: [&str; 12] = [
    "co2_coeff",
    "co2_offset",
    "protein_coeff",
    "protein_offset",
    "amino_acids_coeff",
    "amino_acids_offset",
    "minerals_coeff",
    "minerals_offset",
    "flavor_compounds_coeff",
    "flavor_compounds_offset",
    "moisture_coeff",
    "moisture_offset",
];

/// A persisted calibration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub id: i64,
    pub coffee_type: CoffeeType,
    pub coffee_origin: CoffeeOrigin,
    pub coffee_variety: Option<String>,
    #[serde(flatten)]
    pub values: PartialCoefficients,
}

/// A calibration row that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalibrationEntry {
    pub coffee_type: CoffeeType,
    pub coffee_origin: CoffeeOrigin,
    #[serde(default)]
    pub coffee_variety: Option<String>,
    #[serde(flatten)]
    pub values: PartialCoefficients,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coffee_type_round_trips_through_integers() {
        for code in 0..4 {
            let coffee_type = CoffeeType::try_from(code).unwrap();
            assert_eq!(coffee_type.as_i64(), code);
        }
        assert!(CoffeeType::try_from(4).is_err());
        assert!(CoffeeType::try_from(-1).is_err());
    }

    #[test]
    fn test_origin_codes_cover_zero_to_seventeen() {
        assert_eq!(CoffeeOrigin::ALL.len(), 18);
        for (code, origin) in CoffeeOrigin::ALL.iter().enumerate() {
            assert_eq!(origin.as_i64(), code as i64);
        }
        assert_eq!(
            CoffeeOrigin::try_from(17).unwrap(),
            CoffeeOrigin::GlobalRobusta
        );
        assert!(CoffeeOrigin::try_from(18).is_err());
    }

    #[test]
    fn test_enums_serialize_as_integers() {
        let json = serde_json::to_string(&(CoffeeType::Roasted, CoffeeOrigin::Ethiopia)).unwrap();
        assert_eq!(json, "[1,12]");
        let parsed: CoffeeOrigin = serde_json::from_str("13").unwrap();
        assert_eq!(parsed, CoffeeOrigin::IvoryCoast);
        assert!(serde_json::from_str::<CoffeeType>("9").is_err());
    }

    #[test]
    fn test_complete_with_fills_only_missing_values() {
        let base = CalibrationCoefficients {
            co2: ComponentCoefficient::new(0.1, 0.0),
            protein: ComponentCoefficient::new(0.05, 0.0),
            amino_acids: ComponentCoefficient::new(0.02, 0.0),
            minerals: ComponentCoefficient::new(0.01, 0.0),
            flavor_compounds: ComponentCoefficient::new(0.03, 0.0),
            moisture: ComponentCoefficient::new(0.08, 0.0),
        };
        let partial = PartialCoefficients {
            co2_coeff: Some(0.105),
            moisture_offset: Some(1.5),
            ..Default::default()
        };

        let complete = partial.complete_with(&base);
        assert_eq!(complete.co2, ComponentCoefficient::new(0.105, 0.0));
        assert_eq!(complete.moisture, ComponentCoefficient::new(0.08, 1.5));
        assert_eq!(complete.protein, base.protein);
    }

    #[test]
    fn test_merge_keeps_existing_values_not_in_update() {
        let mut current = PartialCoefficients {
            co2_coeff: Some(0.1),
            protein_coeff: Some(0.05),
            ..Default::default()
        };
        current.merge(&PartialCoefficients {
            protein_coeff: Some(0.06),
            minerals_offset: Some(0.2),
            ..Default::default()
        });

        assert_eq!(current.co2_coeff, Some(0.1));
        assert_eq!(current.protein_coeff, Some(0.06));
        assert_eq!(current.minerals_offset, Some(0.2));
        assert_eq!(current.moisture_coeff, None);
    }
}
