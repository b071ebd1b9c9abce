//! Linear NIR composition model.
//!
//! Each component reads two designated channels: the primary channel weighted
//! by the calibration coefficient and the secondary channel weighted by half
//! of it, plus the calibration offset. Results are clamped at zero. The
//! channel pairing is shared with readings already stored by deployed
//! devices and must not change.

use serde::{Deserialize, Serialize};

use super::NirReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Co2,
    Protein,
    AminoAcids,
    Minerals,
    FlavorCompounds,
    Moisture,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Co2,
        Component::Protein,
        Component::AminoAcids,
        Component::Minerals,
        Component::FlavorCompounds,
        Component::Moisture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Co2 => "co2",
            Component::Protein => "protein",
            Component::AminoAcids => "amino_acids",
            Component::Minerals => "minerals",
            Component::FlavorCompounds => "flavor_compounds",
            Component::Moisture => "moisture",
        }
    }

    /// (primary channel, half-weight channel)
    pub fn channel_pair(&self) -> (usize, usize) {
        match self {
            Component::Co2 => (0, 1),
            Component::Protein => (2, 3),
            Component::AminoAcids => (4, 5),
            Component::Minerals => (6, 7),
            Component::FlavorCompounds => (8, 9),
            Component::Moisture => (10, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentCoefficient {
    pub coefficient: f64,
    pub offset: f64,
}

impl ComponentCoefficient {
    pub const fn new(coefficient: f64, offset: f64) -> Self {
        Self {
            coefficient,
            offset,
        }
    }
}

/// A complete coefficient set: one (coefficient, offset) pair per component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCoefficients {
    pub co2: ComponentCoefficient,
    pub protein: ComponentCoefficient,
    pub amino_acids: ComponentCoefficient,
    pub minerals: ComponentCoefficient,
    pub flavor_compounds: ComponentCoefficient,
    pub moisture: ComponentCoefficient,
}

impl CalibrationCoefficients {
    pub fn get(&self, component: Component) -> ComponentCoefficient {
        match component {
            Component::Co2 => self.co2,
            Component::Protein => self.protein,
            Component::AminoAcids => self.amino_acids,
            Component::Minerals => self.minerals,
            Component::FlavorCompounds => self.flavor_compounds,
            Component::Moisture => self.moisture,
        }
    }

    pub fn set(&mut self, component: Component, value: ComponentCoefficient) {
        let slot = match component {
            Component::Co2 => &mut self.co2,
            Component::Protein => &mut self.protein,
            Component::AminoAcids => &mut self.amino_acids,
            Component::Minerals => &mut self.minerals,
            Component::FlavorCompounds => &mut self.flavor_compounds,
            Component::Moisture => &mut self.moisture,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionEstimate {
    pub estimated_co2: f64,
    pub estimated_protein: f64,
    pub estimated_amino_acids: f64,
    pub estimated_minerals: f64,
    pub estimated_flavor_compounds: f64,
    pub estimated_moisture: f64,
}

impl CompositionEstimate {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Co2 => self.estimated_co2,
            Component::Protein => self.estimated_protein,
            Component::AminoAcids => self.estimated_amino_acids,
            Component::Minerals => self.estimated_minerals,
            Component::FlavorCompounds => self.estimated_flavor_compounds,
            Component::Moisture => self.estimated_moisture,
        }
    }
}

pub fn estimate_component(
    reading: &NirReading,
    component: Component,
    calibration: ComponentCoefficient,
) -> f64 {
    let (primary, secondary) = component.channel_pair();
    let raw = reading.channel(primary) * calibration.coefficient
        + reading.channel(secondary) * (calibration.coefficient / 2.0)
        + calibration.offset;
    raw.max(0.0)
}

pub fn estimate(reading: &NirReading, coefficients: &CalibrationCoefficients) -> CompositionEstimate {
    let value = |component| estimate_component(reading, component, coefficients.get(component));
    CompositionEstimate {
        estimated_co2: value(Component::Co2),
        estimated_protein: value(Component::Protein),
        estimated_amino_acids: value(Component::AminoAcids),
        estimated_minerals: value(Component::Minerals),
        estimated_flavor_compounds: value(Component::FlavorCompounds),
        estimated_moisture: value(Component::Moisture),
    }
}
