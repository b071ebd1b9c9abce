//! SQLite schema for the blend profile database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

// =============================================================================
// Version 1 - Profiles and their samples
// =============================================================================

/// Reference blends recorded by a device. `profile_signature` holds the
/// JSON-encoded mean/std signature of the current sample set.
const BLEND_PROFILES_TABLE_V1: Table = Table {
    name: "blend_profiles",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("device_id", &SqlType::Text, non_null = true),
        sqlite_column!("profile_name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "sample_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("profile_signature", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
        sqlite_column!("updated_at", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_blend_profiles_device", "device_id")],
};

const PROFILE_FK: ForeignKey = ForeignKey {
    foreign_table: "blend_profiles",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const BLEND_SAMPLES_TABLE_V1: Table = Table {
    name: "blend_samples",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "profile_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PROFILE_FK)
        ),
        sqlite_column!(
            "sample_name",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "sensor_reading_1",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "sensor_reading_2",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "sensor_reading_3",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!("chemical_data", &SqlType::Text),
        sqlite_column!(
            "notes",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_blend_samples_profile", "profile_id")],
};

pub static BLEND_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[BLEND_PROFILES_TABLE_V1, BLEND_SAMPLES_TABLE_V1],
    migration: None,
}];
