//! Record store abstraction and JSON file implementation
//!
//! The migration engine only needs two capabilities from persistence: fetch
//! a page of rows and apply a page of field updates atomically. The JSON
//! file store implements both over a single document, using write-to-temp
//! then atomic-rename so a failed page leaves the file untouched.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{SealError, SealResult};

use super::EntityKind;

/// A row as seen by the migration: its id plus the values of the fields
/// designated for encryption
#[derive(Debug, Clone)]
pub struct StoredRecord {
    /// The record's unique id
    pub id: String,
    /// Designated field name -> stored value (None for null/absent)
    pub fields: BTreeMap<&'static str, Option<String>>,
}

/// A single field write scheduled for one page
#[derive(Debug, Clone)]
pub struct FieldUpdate {
    /// The record to update
    pub record_id: String,
    /// The field to overwrite
    pub field: &'static str,
    /// The new stored value (a JSON-serialized envelope)
    pub value: String,
}

/// The persistence capabilities the migration engine consumes
pub trait RecordStore {
    /// Fetch up to `limit` rows of an entity starting at `offset`
    fn fetch_page(
        &self,
        entity: EntityKind,
        offset: usize,
        limit: usize,
    ) -> SealResult<Vec<StoredRecord>>;

    /// Apply all updates for one page as a single atomic unit
    ///
    /// Either every update persists or none do; on error the store must be
    /// externally indistinguishable from one that never saw the page.
    fn apply_page(&mut self, entity: EntityKind, updates: &[FieldUpdate]) -> SealResult<()>;
}

/// A record store backed by one JSON document on disk
///
/// The document is an object of entity collections, e.g.
/// `{"transactions": [...], "bills": [...], "counterparties": [...]}`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Value,
}

impl JsonFileStore {
    /// Open an existing data file
    pub fn open(path: impl Into<PathBuf>) -> SealResult<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(SealError::Storage(format!(
                "Data file not found: {}",
                path.display()
            )));
        }

        let file = File::open(&path)
            .map_err(|e| SealError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        let data: Value = serde_json::from_reader(reader)
            .map_err(|e| SealError::Storage(format!("Failed to parse {}: {}", path.display(), e)))?;

        if !data.is_object() {
            return Err(SealError::Storage(format!(
                "Data file {} is not a JSON object",
                path.display()
            )));
        }

        Ok(Self { path, data })
    }

    fn collection(&self, entity: EntityKind) -> SealResult<&Vec<Value>> {
        match self.data.get(entity.storage_key()) {
            None => Err(SealError::Storage(format!(
                "Data file has no '{}' collection",
                entity.storage_key()
            ))),
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(SealError::Storage(format!(
                "'{}' is not an array",
                entity.storage_key()
            ))),
        }
    }

    /// Write the full document to a temp file, then atomically rename it
    /// over the original.
    fn write_atomic(path: &Path, data: &Value) -> SealResult<()> {
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .map_err(|e| SealError::Storage(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .map_err(|e| SealError::Storage(format!("Failed to serialize data: {}", e)))?;
        writer
            .flush()
            .map_err(|e| SealError::Storage(format!("Failed to flush data: {}", e)))?;

        // Sync to disk before rename
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| SealError::Storage(format!("Failed to sync data: {}", e)))?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SealError::Storage(format!("Failed to rename temp file: {}", e))
        })
    }
}

impl RecordStore for JsonFileStore {
    fn fetch_page(
        &self,
        entity: EntityKind,
        offset: usize,
        limit: usize,
    ) -> SealResult<Vec<StoredRecord>> {
        let records = self.collection(entity)?;

        records
            .iter()
            .skip(offset)
            .take(limit)
            .map(|record| {
                let id = record
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        SealError::Storage(format!(
                            "A '{}' record is missing a string id",
                            entity.storage_key()
                        ))
                    })?
                    .to_string();

                let fields = entity
                    .encrypted_fields()
                    .iter()
                    .map(|&field| {
                        let value = record
                            .get(field)
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        (field, value)
                    })
                    .collect();

                Ok(StoredRecord { id, fields })
            })
            .collect()
    }

    fn apply_page(&mut self, entity: EntityKind, updates: &[FieldUpdate]) -> SealResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        // Stage every update on a copy; nothing is observable until the
        // atomic rename below succeeds.
        let mut staged = self.data.clone();
        let records = staged
            .get_mut(entity.storage_key())
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                SealError::Storage(format!(
                    "Data file has no '{}' collection",
                    entity.storage_key()
                ))
            })?;

        for update in updates {
            let record = records
                .iter_mut()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(update.record_id.as_str()))
                .ok_or_else(|| {
                    SealError::Storage(format!(
                        "Record {} not found in '{}'",
                        update.record_id,
                        entity.storage_key()
                    ))
                })?;

            record[update.field] = Value::String(update.value.clone());
        }

        Self::write_atomic(&self.path, &staged)?;
        self.data = staged;
        Ok(())
    }
}
