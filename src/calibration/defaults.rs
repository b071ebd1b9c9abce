//! Built-in coefficient sets.
//!
//! Two unrelated default schemes exist. The in-process set drives live
//! estimation and never reads storage; the table defaults back the persisted
//! lookup when neither a matching row nor the default row exists. They differ
//! by orders of magnitude and must stay separate.

use super::CoffeeType;
use crate::analysis::{CalibrationCoefficients, Component, ComponentCoefficient};

const IN_PROCESS_BASE: CalibrationCoefficients = CalibrationCoefficients {
    co2: ComponentCoefficient::new(0.001, 0.0),
    protein: ComponentCoefficient::new(0.001, 0.0),
    amino_acids: ComponentCoefficient::new(0.0001, 0.0),
    minerals: ComponentCoefficient::new(0.00001, 0.0),
    flavor_compounds: ComponentCoefficient::new(0.000001, 0.0),
    moisture: ComponentCoefficient::new(0.0001, 0.0),
};

const GREEN_MOISTURE_COEFF: f64 = 0.0005;
const ROASTED_CO2_COEFF: f64 = 0.002;

pub const TABLE_DEFAULTS: CalibrationCoefficients = CalibrationCoefficients {
    co2: ComponentCoefficient::new(0.1, 0.0),
    protein: ComponentCoefficient::new(0.05, 0.0),
    amino_acids: ComponentCoefficient::new(0.02, 0.0),
    minerals: ComponentCoefficient::new(0.01, 0.0),
    flavor_compounds: ComponentCoefficient::new(0.03, 0.0),
    moisture: ComponentCoefficient::new(0.08, 0.0),
};

/// Coefficients for live estimation. Only the coffee type adjusts the base
/// set; origin and variety have no effect.
pub fn in_process_defaults(coffee_type: CoffeeType) -> CalibrationCoefficients {
    let mut coefficients = IN_PROCESS_BASE;
    match coffee_type {
        CoffeeType::Green => coefficients.set(
            Component::Moisture,
            ComponentCoefficient::new(GREEN_MOISTURE_COEFF, 0.0),
        ),
        CoffeeType::Roasted => coefficients.set(
            Component::Co2,
            ComponentCoefficient::new(ROASTED_CO2_COEFF, 0.0),
        ),
        CoffeeType::Ground | CoffeeType::Unknown => {}
    }
    coefficients
}
