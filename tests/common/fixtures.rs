//! Test database fixtures
//!
//! Builds the calibration and blend databases a test server runs on.

use super::constants::*;
use coffee_analysis_server::calibration::{
    seed_reference_calibrations, CalibrationRepository, CoffeeOrigin, CoffeeType,
    NewCalibrationEntry, PartialCoefficients, SqliteCalibrationStore,
};
use coffee_analysis_server::SqliteBlendStore;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestStores {
    pub temp_dir: TempDir,
    pub calibration_store: Arc<SqliteCalibrationStore>,
    pub blend_store: Arc<SqliteBlendStore>,
}

/// Creates the stores in a fresh temp dir. The calibration table holds the
/// reference rows plus one partial fixture row.
pub fn create_test_stores() -> anyhow::Result<TestStores> {
    let temp_dir = TempDir::new()?;

    let calibration_store = Arc::new(SqliteCalibrationStore::new(
        temp_dir.path().join("calibration.db"),
    )?);
    seed_reference_calibrations(calibration_store.as_ref())?;
    calibration_store.insert_calibration(&NewCalibrationEntry {
        coffee_type: CoffeeType::try_from(FIXTURE_COFFEE_TYPE).map_err(anyhow::Error::msg)?,
        coffee_origin: CoffeeOrigin::try_from(FIXTURE_COFFEE_ORIGIN)
            .map_err(anyhow::Error::msg)?,
        coffee_variety: Some(FIXTURE_VARIETY.to_string()),
        values: PartialCoefficients {
            co2_coeff: Some(FIXTURE_CO2_COEFF),
            protein_offset: Some(FIXTURE_PROTEIN_OFFSET),
            ..Default::default()
        },
    })?;

    let blend_store = Arc::new(SqliteBlendStore::new(temp_dir.path().join("blend.db"))?);

    Ok(TestStores {
        temp_dir,
        calibration_store,
        blend_store,
    })
}
