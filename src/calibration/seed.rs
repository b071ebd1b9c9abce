//! Reference calibration table shipped with the server.
//!
//! Global Arabica and Robusta rows carry all six coefficients. Per-origin rows
//! only calibrate CO2, protein and moisture, the remaining values complete
//! from the table defaults at lookup time.

use super::resolver::DEFAULT_ROW_VARIETY;
use super::{
    CalibrationRepository, CoffeeOrigin, CoffeeType, NewCalibrationEntry, PartialCoefficients,
    UpsertOutcome, TABLE_DEFAULTS,
};
use anyhow::Result;
use tracing::info;

const ARABICA: &str = "Arabica";
const ROBUSTA: &str = "Robusta";

/// (origin, variety, co2, protein, moisture)
const ORIGIN_CALIBRATIONS: &[(CoffeeOrigin, &str, f64, f64, f64)] = &[
    (CoffeeOrigin::Brazil, ARABICA, 0.105, 0.052, 0.082),
    (CoffeeOrigin::Colombia, ARABICA, 0.098, 0.051, 0.078),
    (CoffeeOrigin::CostaRica, ARABICA, 0.095, 0.050, 0.075),
    (CoffeeOrigin::Honduras, ARABICA, 0.102, 0.053, 0.080),
    (CoffeeOrigin::Guatemala, ARABICA, 0.097, 0.049, 0.077),
    (CoffeeOrigin::India, ROBUSTA, 0.125, 0.065, 0.095),
    (CoffeeOrigin::Indonesia, ROBUSTA, 0.122, 0.063, 0.092),
    (CoffeeOrigin::Vietnam, ROBUSTA, 0.130, 0.068, 0.100),
    (CoffeeOrigin::Peru, ARABICA, 0.100, 0.050, 0.079),
    (CoffeeOrigin::Tanzania, ARABICA, 0.103, 0.054, 0.081),
    (CoffeeOrigin::Uganda, ROBUSTA, 0.128, 0.067, 0.098),
    (CoffeeOrigin::Ethiopia, ARABICA, 0.096, 0.048, 0.076),
    (CoffeeOrigin::IvoryCoast, ROBUSTA, 0.127, 0.066, 0.097),
    (CoffeeOrigin::Yemen, ARABICA, 0.101, 0.052, 0.079),
    (CoffeeOrigin::Sca, ARABICA, 0.099, 0.050, 0.078),
];

fn full_row(
    coffee_origin: CoffeeOrigin,
    variety: &str,
    coeffs: [f64; 6],
) -> NewCalibrationEntry {
    let [co2, protein, amino_acids, minerals, flavor_compounds, moisture] = coeffs;
    NewCalibrationEntry {
        coffee_type: CoffeeType::Unknown,
        coffee_origin,
        coffee_variety: Some(variety.to_string()),
        values: PartialCoefficients {
            co2_coeff: Some(co2),
            co2_offset: Some(0.0),
            protein_coeff: Some(protein),
            protein_offset: Some(0.0),
            amino_acids_coeff: Some(amino_acids),
            amino_acids_offset: Some(0.0),
            minerals_coeff: Some(minerals),
            minerals_offset: Some(0.0),
            flavor_compounds_coeff: Some(flavor_compounds),
            flavor_compounds_offset: Some(0.0),
            moisture_coeff: Some(moisture),
            moisture_offset: Some(0.0),
        },
    }
}

/// The eighteen reference rows: global Arabica, global Robusta, fifteen
/// origins and the default row.
pub fn reference_calibrations() -> Vec<NewCalibrationEntry> {
    let mut rows = vec![
        full_row(
            CoffeeOrigin::GlobalArabica,
            ARABICA,
            [0.1, 0.05, 0.02, 0.01, 0.03, 0.08],
        ),
        full_row(
            CoffeeOrigin::GlobalRobusta,
            ROBUSTA,
            [0.12, 0.06, 0.025, 0.015, 0.02, 0.09],
        ),
    ];

    rows.extend(
        ORIGIN_CALIBRATIONS
            .iter()
            .map(|(origin, variety, co2, protein, moisture)| NewCalibrationEntry {
                coffee_type: CoffeeType::Unknown,
                coffee_origin: *origin,
                coffee_variety: Some(variety.to_string()),
                values: PartialCoefficients {
                    co2_coeff: Some(*co2),
                    protein_coeff: Some(*protein),
                    moisture_coeff: Some(*moisture),
                    ..Default::default()
                },
            }),
    );

    rows.push(NewCalibrationEntry {
        coffee_type: CoffeeType::Unknown,
        coffee_origin: CoffeeOrigin::Unknown,
        coffee_variety: Some(DEFAULT_ROW_VARIETY.to_string()),
        values: PartialCoefficients::from(&TABLE_DEFAULTS),
    });
    rows
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Upserts the reference rows. Running it twice leaves the table unchanged.
pub fn seed_reference_calibrations(repository: &dyn CalibrationRepository) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    for row in reference_calibrations() {
        match repository.upsert_calibration(&row)? {
            UpsertOutcome::Inserted(_) => summary.inserted += 1,
            UpsertOutcome::Updated(_) => summary.updated += 1,
        }
    }
    info!(
        "Seeded calibration table: {} inserted, {} updated",
        summary.inserted, summary.updated
    );
    Ok(summary)
}
