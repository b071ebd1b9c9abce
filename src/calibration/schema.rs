//! SQLite schema for the calibration database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Calibration rows keyed by type/origin/variety
// =============================================================================

/// One row per calibrated (coffee type, origin, variety). Coefficient and
/// offset columns are nullable; missing values are filled from the built-in
/// table defaults at lookup time.
const CALIBRATION_DATA_TABLE_V1: Table = Table {
    name: "calibration_data",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("coffee_type", &SqlType::Integer, non_null = true),
        sqlite_column!("coffee_origin", &SqlType::Integer, non_null = true),
        sqlite_column!("coffee_variety", &SqlType::Text),
        sqlite_column!("co2_coeff", &SqlType::Real),
        sqlite_column!("co2_offset", &SqlType::Real),
        sqlite_column!("protein_coeff", &SqlType::Real),
        sqlite_column!("protein_offset", &SqlType::Real),
        sqlite_column!("amino_acids_coeff", &SqlType::Real),
        sqlite_column!("amino_acids_offset", &SqlType::Real),
        sqlite_column!("minerals_coeff", &SqlType::Real),
        sqlite_column!("minerals_offset", &SqlType::Real),
        sqlite_column!("flavor_compounds_coeff", &SqlType::Real),
        sqlite_column!("flavor_compounds_offset", &SqlType::Real),
        sqlite_column!("moisture_coeff", &SqlType::Real),
        sqlite_column!("moisture_offset", &SqlType::Real),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("(datetime('now'))")
        ),
        sqlite_column!("updated_at", &SqlType::Text),
    ],
    indices: &[(
        "idx_calibration_type_origin",
        "coffee_type, coffee_origin",
    )],
};

pub static CALIBRATION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[CALIBRATION_DATA_TABLE_V1],
    migration: None,
}];
