mod defaults;
mod models;
mod resolver;
mod schema;
mod seed;
mod sqlite_calibration_store;

pub use defaults::{in_process_defaults, TABLE_DEFAULTS};
pub use models::*;
pub use resolver::{CalibrationResolution, CalibrationResolver, ResolutionSource, ResolutionTier};
pub use schema::CALIBRATION_VERSIONED_SCHEMAS;
pub use seed::{reference_calibrations, seed_reference_calibrations, SeedSummary};
pub use sqlite_calibration_store::SqliteCalibrationStore;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
}

/// Storage of calibration rows. Lookups are read-only; mutations are only
/// reached from the operator CLI.
pub trait CalibrationRepository: Send + Sync {
    /// First row (by id) matching type and origin, and variety when given.
    fn find_calibration(&self, key: &CalibrationKey) -> Result<Option<CalibrationEntry>>;
    fn get_calibration(&self, id: i64) -> Result<Option<CalibrationEntry>>;
    fn list_calibrations(&self) -> Result<Vec<CalibrationEntry>>;
    fn count_calibrations(&self) -> Result<usize>;

    fn insert_calibration(&self, entry: &NewCalibrationEntry) -> Result<i64>;
    /// Overwrites only the values present in `values`. Returns false when no
    /// row has this id.
    fn update_calibration(&self, id: i64, values: &PartialCoefficients) -> Result<bool>;
    /// Writes the present values onto the row with the same exact key, or
    /// inserts a new row when there is none.
    fn upsert_calibration(&self, entry: &NewCalibrationEntry) -> Result<UpsertOutcome>;
    fn delete_calibration(&self, id: i64) -> Result<bool>;
}
