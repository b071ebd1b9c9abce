use super::defaults::{in_process_defaults, TABLE_DEFAULTS};
use super::{CalibrationEntry, CalibrationKey, CalibrationRepository, CoffeeOrigin, CoffeeType};
use crate::analysis::CalibrationCoefficients;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Variety recorded on the persisted fallback row.
pub const DEFAULT_ROW_VARIETY: &str = "Unknown";

/// Which coefficient scheme a resolution uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ResolutionTier {
    /// Built-in coefficients keyed by coffee type only.
    #[default]
    InProcess,
    /// Calibration table lookup with row and table-default fallbacks.
    Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    InProcessDefaults,
    ExactRow,
    DefaultRow,
    TableDefaults,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::InProcessDefaults => "in_process_defaults",
            ResolutionSource::ExactRow => "exact_row",
            ResolutionSource::DefaultRow => "default_row",
            ResolutionSource::TableDefaults => "table_defaults",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResolution {
    pub tier: ResolutionTier,
    pub source: ResolutionSource,
    pub coefficients: CalibrationCoefficients,
    /// The stored row the coefficients came from, if any.
    pub entry: Option<CalibrationEntry>,
}

/// Resolves a complete coefficient set for a coffee description. Every
/// component is always resolved; missing data falls back, it never fails.
#[derive(Clone)]
pub struct CalibrationResolver {
    repository: Arc<dyn CalibrationRepository>,
}

impl CalibrationResolver {
    pub fn new(repository: Arc<dyn CalibrationRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn CalibrationRepository> {
        &self.repository
    }

    pub fn resolve(&self, tier: ResolutionTier, key: &CalibrationKey) -> Result<CalibrationResolution> {
        match tier {
            ResolutionTier::InProcess => Ok(Self::resolve_in_process(key.coffee_type)),
            ResolutionTier::Persisted => self.resolve_persisted(key),
        }
    }

    pub fn resolve_in_process(coffee_type: CoffeeType) -> CalibrationResolution {
        CalibrationResolution {
            tier: ResolutionTier::InProcess,
            source: ResolutionSource::InProcessDefaults,
            coefficients: in_process_defaults(coffee_type),
            entry: None,
        }
    }

    /// Exact row, then the default row, then the table defaults. Null values
    /// of a matched row are completed from the table defaults.
    pub fn resolve_persisted(&self, key: &CalibrationKey) -> Result<CalibrationResolution> {
        if let Some(entry) = self.repository.find_calibration(key)? {
            debug!(
                "Calibration row {} matched type {} origin {}",
                entry.id,
                key.coffee_type.as_str(),
                key.coffee_origin
            );
            return Ok(Self::from_entry(ResolutionSource::ExactRow, entry));
        }

        let default_key = CalibrationKey::new(
            CoffeeType::Unknown,
            CoffeeOrigin::Unknown,
            Some(DEFAULT_ROW_VARIETY),
        );
        if let Some(entry) = self.repository.find_calibration(&default_key)? {
            debug!(
                "No calibration for type {} origin {}, using default row {}",
                key.coffee_type.as_str(),
                key.coffee_origin,
                entry.id
            );
            return Ok(Self::from_entry(ResolutionSource::DefaultRow, entry));
        }

        warn!(
            "No calibration row and no default row for type {} origin {}, using table defaults",
            key.coffee_type.as_str(),
            key.coffee_origin
        );
        Ok(CalibrationResolution {
            tier: ResolutionTier::Persisted,
            source: ResolutionSource::TableDefaults,
            coefficients: TABLE_DEFAULTS,
            entry: None,
        })
    }

    fn from_entry(source: ResolutionSource, entry: CalibrationEntry) -> CalibrationResolution {
        CalibrationResolution {
            tier: ResolutionTier::Persisted,
            source,
            coefficients: entry.values.complete_with(&TABLE_DEFAULTS),
            entry: Some(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Component, ComponentCoefficient};
    use crate::calibration::{NewCalibrationEntry, PartialCoefficients, SqliteCalibrationStore};

    fn resolver() -> (CalibrationResolver, Arc<SqliteCalibrationStore>) {
        let store = Arc::new(SqliteCalibrationStore::in_memory().unwrap());
        (CalibrationResolver::new(store.clone()), store)
    }

    fn insert(
        store: &SqliteCalibrationStore,
        coffee_type: CoffeeType,
        coffee_origin: CoffeeOrigin,
        variety: &str,
        values: PartialCoefficients,
    ) -> i64 {
        store
            .insert_calibration(&NewCalibrationEntry {
                coffee_type,
                coffee_origin,
                coffee_variety: Some(variety.to_string()),
                values,
            })
            .unwrap()
    }

    #[test]
    fn test_in_process_ignores_storage_and_origin() {
        let (resolver, store) = resolver();
        insert(
            &store,
            CoffeeType::Roasted,
            CoffeeOrigin::Brazil,
            "Arabica",
            PartialCoefficients::from(&TABLE_DEFAULTS),
        );

        let key = CalibrationKey::new(CoffeeType::Roasted, CoffeeOrigin::Brazil, Some("Arabica"));
        let resolution = resolver.resolve(ResolutionTier::InProcess, &key).unwrap();
        assert_eq!(resolution.source, ResolutionSource::InProcessDefaults);
        assert_eq!(resolution.coefficients.co2.coefficient, 0.002);
        assert!(resolution.entry.is_none());

        let other_origin = CalibrationKey::new(CoffeeType::Roasted, CoffeeOrigin::Yemen, None);
        assert_eq!(
            resolver
                .resolve(ResolutionTier::InProcess, &other_origin)
                .unwrap()
                .coefficients,
            resolution.coefficients
        );
    }

    #[test]
    fn test_persisted_uses_exact_row_and_completes_nulls() {
        let (resolver, store) = resolver();
        let id = insert(
            &store,
            CoffeeType::Unknown,
            CoffeeOrigin::Vietnam,
            "Robusta",
            PartialCoefficients {
                co2_coeff: Some(0.13),
                protein_coeff: Some(0.068),
                moisture_coeff: Some(0.1),
                ..Default::default()
            },
        );

        let key = CalibrationKey::new(CoffeeType::Unknown, CoffeeOrigin::Vietnam, Some("Robusta"));
        let resolution = resolver.resolve_persisted(&key).unwrap();
        assert_eq!(resolution.source, ResolutionSource::ExactRow);
        assert_eq!(resolution.entry.as_ref().map(|e| e.id), Some(id));
        assert_eq!(resolution.coefficients.co2, ComponentCoefficient::new(0.13, 0.0));
        assert_eq!(resolution.coefficients.amino_acids, TABLE_DEFAULTS.amino_acids);
        assert_eq!(resolution.coefficients.minerals.coefficient, 0.01);
    }

    #[test]
    fn test_persisted_falls_back_to_default_row() {
        let (resolver, store) = resolver();
        let mut values = PartialCoefficients::from(&TABLE_DEFAULTS);
        values.flavor_compounds_coeff = Some(0.5);
        let default_id = insert(
            &store,
            CoffeeType::Unknown,
            CoffeeOrigin::Unknown,
            DEFAULT_ROW_VARIETY,
            values,
        );

        let key = CalibrationKey::new(CoffeeType::Green, CoffeeOrigin::Honduras, Some("Geisha"));
        let resolution = resolver.resolve_persisted(&key).unwrap();
        assert_eq!(resolution.source, ResolutionSource::DefaultRow);
        assert_eq!(resolution.entry.unwrap().id, default_id);
        assert_eq!(resolution.coefficients.flavor_compounds.coefficient, 0.5);
    }

    #[test]
    fn test_persisted_falls_back_to_table_defaults_on_empty_store() {
        let (resolver, _store) = resolver();
        for coffee_type in [
            CoffeeType::Green,
            CoffeeType::Roasted,
            CoffeeType::Ground,
            CoffeeType::Unknown,
        ] {
            for origin in CoffeeOrigin::ALL {
                let key = CalibrationKey::new(coffee_type, *origin, None);
                let resolution = resolver.resolve_persisted(&key).unwrap();
                assert_eq!(resolution.source, ResolutionSource::TableDefaults);
                assert_eq!(resolution.coefficients, TABLE_DEFAULTS);
                for component in Component::ALL {
                    assert!(resolution.coefficients.get(component).coefficient > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_tiers_are_independent() {
        let (resolver, _store) = resolver();
        let key = CalibrationKey::new(CoffeeType::Ground, CoffeeOrigin::Unknown, None);
        let live = resolver.resolve(ResolutionTier::InProcess, &key).unwrap();
        let persisted = resolver.resolve(ResolutionTier::Persisted, &key).unwrap();
        assert_eq!(live.coefficients.co2.coefficient, 0.001);
        assert_eq!(persisted.coefficients.co2.coefficient, 0.1);
    }
}
