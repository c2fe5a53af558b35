//! JSON persistence for the symbol mapping table.
//!
//! The store is best-effort: the in-memory table remains authoritative
//! for the process, write failures are logged by the caller, and loads
//! tolerate a missing file and skip malformed entries instead of
//! aborting.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ContractSpec, SecType};

use super::manager::SymbolMapping;

/// Mapping file format version.
const FORMAT_VERSION: &str = "1.0";

/// Errors from mapping store reads/writes.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("Mapping store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("Mapping store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level document layout.
///
/// Entries are held as raw JSON values so one malformed entry can be
/// skipped without failing the whole load.
#[derive(Debug, Serialize, Deserialize)]
struct MappingsFile {
    version: String,
    timestamp: String,
    mappings: HashMap<String, serde_json::Value>,
}

/// One persisted mapping entry.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedMapping {
    actual_contract: String,
    expiration_date: Option<String>,
    con_id: Option<i64>,
    exchange: String,
    currency: String,
    multiplier: Option<Decimal>,
    is_front_month: bool,
    updated_at: String,
}

impl PersistedMapping {
    fn from_mapping(mapping: &SymbolMapping) -> Self {
        Self {
            actual_contract: mapping.actual_contract.clone(),
            expiration_date: mapping.contract.expiration_date().map(str::to_string),
            con_id: mapping.contract.con_id(),
            exchange: mapping.contract.exchange().to_string(),
            currency: mapping.contract.currency().to_string(),
            multiplier: mapping.contract.multiplier(),
            is_front_month: mapping.is_front_month,
            updated_at: mapping.updated_at.to_rfc3339(),
        }
    }

    /// Rebuild the in-memory mapping for `logical_symbol`.
    ///
    /// An unparsable `updated_at` falls back to the current time rather
    /// than failing the record.
    fn into_mapping(self, logical_symbol: &str) -> Result<SymbolMapping, crate::models::ContractError> {
        let mut contract = ContractSpec::new(
            &self.actual_contract,
            SecType::Fut,
            &self.exchange,
            self.multiplier,
        )?
        .with_currency(&self.currency)
        .with_underlying(logical_symbol);
        if let Some(expiration) = &self.expiration_date {
            contract = contract.with_expiration(expiration);
        }
        if let Some(con_id) = self.con_id {
            contract = contract.with_con_id(con_id);
        }

        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc));

        Ok(SymbolMapping {
            logical_symbol: logical_symbol.to_uppercase(),
            actual_contract: self.actual_contract,
            contract,
            is_front_month: self.is_front_month,
            updated_at,
        })
    }
}

/// Write the full mapping table to `path`.
pub(super) fn save_mappings(
    path: &Path,
    mappings: &HashMap<String, SymbolMapping>,
) -> Result<(), PersistenceError> {
    let entries = mappings
        .iter()
        .map(|(symbol, mapping)| {
            serde_json::to_value(PersistedMapping::from_mapping(mapping))
                .map(|value| (symbol.clone(), value))
        })
        .collect::<Result<HashMap<_, _>, _>>()?;

    let document = MappingsFile {
        version: FORMAT_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        mappings: entries,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(&document)?)?;

    tracing::debug!(path = %path.display(), count = mappings.len(), "mappings_saved");
    Ok(())
}

/// Load the mapping table from `path`.
///
/// A missing file yields an empty table. Malformed per-symbol entries
/// are skipped with a warning; they never abort the load.
pub(super) fn load_mappings(
    path: &Path,
) -> Result<HashMap<String, SymbolMapping>, PersistenceError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "mappings_file_absent");
        return Ok(HashMap::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let document: MappingsFile = serde_json::from_str(&raw)?;

    let mut mappings = HashMap::with_capacity(document.mappings.len());
    for (symbol, value) in document.mappings {
        let entry: PersistedMapping = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "mapping_entry_malformed");
                continue;
            }
        };
        match entry.into_mapping(&symbol) {
            Ok(mapping) => {
                mappings.insert(symbol.to_uppercase(), mapping);
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "mapping_entry_invalid");
            }
        }
    }

    tracing::debug!(path = %path.display(), count = mappings.len(), "mappings_loaded");
    Ok(mappings)
}
