//! Batch re-encryption migration
//!
//! Retrofits server-tier encryption onto plaintext rows that were persisted
//! before encryption was enabled. Pages are processed strictly sequentially
//! and each page's writes are applied as a single atomic unit.

pub mod engine;
pub mod store;

pub use engine::{EntityReport, MigrationEngine, MigrationOptions, MigrationReport, PAGE_SIZE};
pub use store::{FieldUpdate, JsonFileStore, RecordStore, StoredRecord};

/// The entity types covered by the migration
///
/// Fixed targets: transaction descriptions, bill descriptions and notes,
/// counterparty notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Transaction,
    Bill,
    Counterparty,
}

impl EntityKind {
    /// All migrated entity types, in processing order
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Transaction,
        EntityKind::Bill,
        EntityKind::Counterparty,
    ];

    /// The key of this entity's collection in the data file
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Transaction => "transactions",
            Self::Bill => "bills",
            Self::Counterparty => "counterparties",
        }
    }

    /// The fields of this entity the migration encrypts
    pub fn encrypted_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Transaction => &["description"],
            Self::Bill => &["description", "notes"],
            Self::Counterparty => &["notes"],
        }
    }

    /// Human-readable label for progress reporting
    pub fn label(&self) -> &'static str {
        self.storage_key()
    }
}
