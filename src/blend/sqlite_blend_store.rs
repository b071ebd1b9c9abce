use super::schema::BLEND_VERSIONED_SCHEMAS;
use super::{
    build_signature, AddedSample, BlendProfile, BlendSample, BlendSignature, BlendStore,
    CreatedProfile, NewBlendSample, ProfileCandidate, SensorReadings,
};
use crate::sqlite_persistence::{encode_json, open_versioned_db, JsonField};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub struct SqliteBlendStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBlendStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), BLEND_VERSIONED_SCHEMAS, "blend")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    fn insert_sample(conn: &Connection, profile_id: i64, sample: &NewBlendSample, now: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO blend_samples (profile_id, sample_name, sensor_reading_1, sensor_reading_2,
                sensor_reading_3, chemical_data, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                profile_id,
                sample.sample_name,
                sample.readings.sensor_reading_1,
                sample.readings.sensor_reading_2,
                sample.readings.sensor_reading_3,
                encode_json(&sample.chemical_data)?,
                sample.notes,
                now,
            ],
        )
        .context("Failed to insert blend sample")?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_sample(row: &rusqlite::Row) -> rusqlite::Result<BlendSample> {
        let id: i64 = row.get("id")?;
        let raw_chemical: Option<String> = row.get("chemical_data")?;
        let chemical_data = match JsonField::<Map<String, Value>>::decode(raw_chemical.as_deref()) {
            JsonField::Malformed(err) => {
                warn!("Blend sample {} has malformed chemical data: {}", id, err);
                Map::new()
            }
            field => field.unwrap_or_empty(),
        };

        Ok(BlendSample {
            id,
            profile_id: row.get("profile_id")?,
            sample_name: row.get("sample_name")?,
            readings: SensorReadings::new(
                row.get("sensor_reading_1")?,
                row.get("sensor_reading_2")?,
                row.get("sensor_reading_3")?,
            ),
            chemical_data,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<BlendProfile> {
        let raw_signature: Option<String> = row.get("profile_signature")?;
        Ok(BlendProfile {
            id: row.get("id")?,
            device_id: row.get("device_id")?,
            profile_name: row.get("profile_name")?,
            description: row.get("description")?,
            sample_count: row.get("sample_count")?,
            signature: JsonField::decode(raw_signature.as_deref()),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            samples: Vec::new(),
        })
    }

    fn samples_of(conn: &Connection, profile_id: i64) -> Result<Vec<BlendSample>> {
        let mut stmt = conn.prepare(
            "SELECT id, profile_id, sample_name, sensor_reading_1, sensor_reading_2,
                sensor_reading_3, chemical_data, notes, created_at
             FROM blend_samples WHERE profile_id = ?1 ORDER BY id",
        )?;
        let samples = stmt
            .query_map(params![profile_id], Self::row_to_sample)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    fn profile_exists(conn: &Connection, device_id: &str, profile_id: i64) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM blend_profiles WHERE id = ?1 AND device_id = ?2",
                params![profile_id, device_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

const PROFILE_COLUMNS: &str = "id, device_id, profile_name, description, sample_count, \
    profile_signature, created_at, updated_at";

impl BlendStore for SqliteBlendStore {
    fn create_profile(
        &self,
        device_id: &str,
        profile_name: &str,
        description: &str,
        samples: &[NewBlendSample],
    ) -> Result<CreatedProfile> {
        let readings: Vec<SensorReadings> = samples.iter().map(|s| s.readings).collect();
        let signature = build_signature(&readings)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = Self::now();
        tx.execute(
            "INSERT INTO blend_profiles (device_id, profile_name, description, sample_count,
                profile_signature, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                device_id,
                profile_name,
                description,
                samples.len() as i64,
                encode_json(&signature)?,
                now,
            ],
        )
        .context("Failed to insert blend profile")?;
        let profile_id = tx.last_insert_rowid();

        for sample in samples {
            Self::insert_sample(&tx, profile_id, sample, &now)?;
        }
        tx.commit()?;

        debug!(
            "Created blend profile {} for device {} with {} samples",
            profile_id,
            device_id,
            samples.len()
        );
        Ok(CreatedProfile {
            profile_id,
            sample_count: samples.len(),
            signature,
        })
    }

    fn add_sample(
        &self,
        device_id: &str,
        profile_id: i64,
        sample: &NewBlendSample,
    ) -> Result<Option<AddedSample>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::profile_exists(&tx, device_id, profile_id)? {
            return Ok(None);
        }

        let now = Self::now();
        let sample_id = Self::insert_sample(&tx, profile_id, sample, &now)?;

        let readings: Vec<SensorReadings> = Self::samples_of(&tx, profile_id)?
            .into_iter()
            .map(|s| s.readings)
            .collect();
        let signature = build_signature(&readings)?;
        let sample_count = readings.len() as i64;

        tx.execute(
            "UPDATE blend_profiles SET sample_count = ?1, profile_signature = ?2, updated_at = ?3
             WHERE id = ?4",
            params![sample_count, encode_json(&signature)?, now, profile_id],
        )
        .context("Failed to update blend profile signature")?;
        tx.commit()?;

        Ok(Some(AddedSample {
            sample_id,
            profile_id,
            sample_count,
            signature,
        }))
    }

    fn get_profile(&self, device_id: &str, profile_id: i64) -> Result<Option<BlendProfile>> {
        let conn = self.conn.lock().unwrap();
        let profile = conn
            .query_row(
                &format!(
                    "SELECT {} FROM blend_profiles WHERE id = ?1 AND device_id = ?2",
                    PROFILE_COLUMNS
                ),
                params![profile_id, device_id],
                Self::row_to_profile,
            )
            .optional()?;
        let Some(mut profile) = profile else {
            return Ok(None);
        };
        profile.samples = Self::samples_of(&conn, profile.id)?;
        Ok(Some(profile))
    }

    fn list_profiles(&self, device_id: &str) -> Result<Vec<BlendProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM blend_profiles WHERE device_id = ?1 ORDER BY id",
            PROFILE_COLUMNS
        ))?;
        let mut profiles = stmt
            .query_map(params![device_id], Self::row_to_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for profile in profiles.iter_mut() {
            profile.samples = Self::samples_of(&conn, profile.id)?;
        }
        Ok(profiles)
    }

    fn list_candidates(&self, device_id: &str) -> Result<Vec<ProfileCandidate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, profile_name, description, profile_signature
             FROM blend_profiles WHERE device_id = ?1 ORDER BY id",
        )?;
        let candidates = stmt
            .query_map(params![device_id], |row| {
                let raw_signature: Option<String> = row.get("profile_signature")?;
                Ok(ProfileCandidate {
                    profile_id: row.get("id")?,
                    profile_name: row.get("profile_name")?,
                    description: row.get("description")?,
                    signature: JsonField::<BlendSignature>::decode(raw_signature.as_deref()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(candidates)
    }

    fn delete_profile(&self, device_id: &str, profile_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM blend_profiles WHERE id = ?1 AND device_id = ?2",
            params![profile_id, device_id],
        )?;
        Ok(deleted > 0)
    }
}
