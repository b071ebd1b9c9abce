use super::models::{
    CalibrationEntry, CalibrationKey, CoffeeOrigin, CoffeeType, NewCalibrationEntry,
    PartialCoefficients, COEFFICIENT_COLUMNS,
};
use super::schema::CALIBRATION_VERSIONED_SCHEMAS;
use super::{CalibrationRepository, UpsertOutcome};
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "id, coffee_type, coffee_origin, coffee_variety, \
    co2_coeff, co2_offset, protein_coeff, protein_offset, \
    amino_acids_coeff, amino_acids_offset, minerals_coeff, minerals_offset, \
    flavor_compounds_coeff, flavor_compounds_offset, moisture_coeff, moisture_offset";

pub struct SqliteCalibrationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCalibrationStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(
            db_path.as_ref(),
            CALIBRATION_VERSIONED_SCHEMAS,
            "calibration",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        CALIBRATION_VERSIONED_SCHEMAS
            .last()
            .context("No calibration schema declared")?
            .create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CalibrationEntry> {
        let coffee_type: i64 = row.get("coffee_type")?;
        let coffee_origin: i64 = row.get("coffee_origin")?;
        let mut columns = [None; 12];
        for (slot, name) in columns.iter_mut().zip(COEFFICIENT_COLUMNS) {
            *slot = row.get(name)?;
        }

        Ok(CalibrationEntry {
            id: row.get("id")?,
            coffee_type: CoffeeType::try_from(coffee_type).unwrap_or(CoffeeType::Unknown),
            coffee_origin: CoffeeOrigin::try_from(coffee_origin).unwrap_or(CoffeeOrigin::Unknown),
            coffee_variety: row.get("coffee_variety")?,
            values: PartialCoefficients::from_columns(columns),
        })
    }

    fn find_with_conn(conn: &Connection, key: &CalibrationKey) -> Result<Option<CalibrationEntry>> {
        let mut sql = format!(
            "SELECT {} FROM calibration_data WHERE coffee_type = ?1 AND coffee_origin = ?2",
            SELECT_COLUMNS
        );
        let mut values: Vec<Value> = vec![
            Value::Integer(key.coffee_type.as_i64()),
            Value::Integer(key.coffee_origin.as_i64()),
        ];
        if let Some(variety) = &key.coffee_variety {
            sql.push_str(" AND coffee_variety = ?3");
            values.push(Value::Text(variety.clone()));
        }
        sql.push_str(" ORDER BY id LIMIT 1");

        let entry = conn
            .query_row(&sql, params_from_iter(values), Self::row_to_entry)
            .optional()
            .context("Failed to query calibration row")?;
        Ok(entry)
    }

    fn insert_with_conn(conn: &Connection, entry: &NewCalibrationEntry) -> Result<i64> {
        let placeholders = (1..=15)
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO calibration_data (coffee_type, coffee_origin, coffee_variety, {}) VALUES ({})",
            COEFFICIENT_COLUMNS.join(", "),
            placeholders
        );

        let mut values: Vec<Value> = vec![
            Value::Integer(entry.coffee_type.as_i64()),
            Value::Integer(entry.coffee_origin.as_i64()),
            entry
                .coffee_variety
                .clone()
                .map(Value::Text)
                .unwrap_or(Value::Null),
        ];
        values.extend(entry.values.to_columns().into_iter().map(real_or_null));

        conn.execute(&sql, params_from_iter(values))
            .context("Failed to insert calibration row")?;
        Ok(conn.last_insert_rowid())
    }

    fn write_values_with_conn(
        conn: &Connection,
        id: i64,
        values: &PartialCoefficients,
    ) -> Result<bool> {
        let assignments = COEFFICIENT_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", name, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE calibration_data SET {}, updated_at = datetime('now') WHERE id = ?13",
            assignments
        );

        let mut params: Vec<Value> = values.to_columns().into_iter().map(real_or_null).collect();
        params.push(Value::Integer(id));

        let updated = conn
            .execute(&sql, params_from_iter(params))
            .context("Failed to update calibration row")?;
        Ok(updated > 0)
    }
}

fn real_or_null(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

impl CalibrationRepository for SqliteCalibrationStore {
    fn find_calibration(&self, key: &CalibrationKey) -> Result<Option<CalibrationEntry>> {
        let conn = self.conn.lock().unwrap();
        Self::find_with_conn(&conn, key)
    }

    fn get_calibration(&self, id: i64) -> Result<Option<CalibrationEntry>> {
        let conn = self.conn.lock().unwrap();
        let entry = conn
            .query_row(
                &format!("SELECT {} FROM calibration_data WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn list_calibrations(&self) -> Result<Vec<CalibrationEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM calibration_data ORDER BY coffee_origin, coffee_type, id",
            SELECT_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn count_calibrations(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM calibration_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn insert_calibration(&self, entry: &NewCalibrationEntry) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Self::insert_with_conn(&conn, entry)
    }

    fn update_calibration(&self, id: i64, values: &PartialCoefficients) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx
            .query_row(
                &format!("SELECT {} FROM calibration_data WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_entry,
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(false);
        };

        let mut merged = current.values;
        merged.merge(values);
        Self::write_values_with_conn(&tx, id, &merged)?;
        tx.commit()?;
        Ok(true)
    }

    fn upsert_calibration(&self, entry: &NewCalibrationEntry) -> Result<UpsertOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let key = CalibrationKey {
            coffee_type: entry.coffee_type,
            coffee_origin: entry.coffee_origin,
            coffee_variety: entry.coffee_variety.clone(),
        };

        let outcome = match Self::find_with_conn(&tx, &key)? {
            Some(existing) => {
                let mut merged = existing.values;
                merged.merge(&entry.values);
                Self::write_values_with_conn(&tx, existing.id, &merged)?;
                UpsertOutcome::Updated(existing.id)
            }
            None => UpsertOutcome::Inserted(Self::insert_with_conn(&tx, entry)?),
        };
        tx.commit()?;
        Ok(outcome)
    }

    fn delete_calibration(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM calibration_data WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
