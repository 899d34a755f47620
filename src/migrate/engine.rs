//! Batch re-encryption migration engine
//!
//! Walks each entity's rows in fixed-size pages: fetch, classify, apply,
//! advance, until a page comes back empty. Classification relies on stored
//! values being self-describing; a field that parses to a server envelope is
//! already protected and is skipped. Any failure aborts the whole run, and
//! page-level atomicity in the store bounds the blast radius to one page.

use crate::crypto::{server, ServerKey};
use crate::envelope::StoredField;
use crate::error::SealResult;

use super::store::{FieldUpdate, RecordStore, StoredRecord};
use super::EntityKind;

/// Rows fetched and committed per page
pub const PAGE_SIZE: usize = 100;

/// Options for a migration run
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Classify and count without writing anything
    pub dry_run: bool,
    /// Rows per page; tests shrink this to exercise paging
    pub page_size: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            page_size: PAGE_SIZE,
        }
    }
}

/// Running totals for one entity type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityReport {
    /// Rows with at least one field scheduled for encryption
    pub encrypted: u64,
    /// Rows with nothing to do (already protected or all fields null)
    pub skipped: u64,
}

/// Totals for a whole run, in entity processing order
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    entries: Vec<(EntityKind, EntityReport)>,
}

impl MigrationReport {
    /// Per-entity reports in processing order
    pub fn entries(&self) -> &[(EntityKind, EntityReport)] {
        &self.entries
    }

    /// Total rows encrypted (or that would be, in a dry run)
    pub fn total_encrypted(&self) -> u64 {
        self.entries.iter().map(|(_, r)| r.encrypted).sum()
    }

    /// Total rows skipped
    pub fn total_skipped(&self) -> u64 {
        self.entries.iter().map(|(_, r)| r.skipped).sum()
    }
}

/// The work scheduled for one page
struct PagePlan {
    updates: Vec<(String, &'static str, String)>,
    rows_to_encrypt: u64,
    rows_skipped: u64,
}

/// Classify one page of rows
///
/// Shared verbatim between dry-run and live mode so both report identical
/// counts for the same input data.
fn classify_page(page: &[StoredRecord]) -> PagePlan {
    let mut plan = PagePlan {
        updates: Vec::new(),
        rows_to_encrypt: 0,
        rows_skipped: 0,
    };

    for record in page {
        let mut scheduled = 0;
        for (&field, value) in &record.fields {
            let Some(raw) = value else { continue };
            if raw.is_empty() || StoredField::parse(raw).is_envelope() {
                continue;
            }
            plan.updates.push((record.id.clone(), field, raw.clone()));
            scheduled += 1;
        }

        if scheduled > 0 {
            plan.rows_to_encrypt += 1;
        } else {
            plan.rows_skipped += 1;
        }
    }

    plan
}

/// The batch migration engine
pub struct MigrationEngine<'a, S: RecordStore> {
    store: &'a mut S,
    key: &'a ServerKey,
    options: MigrationOptions,
}

impl<'a, S: RecordStore> MigrationEngine<'a, S> {
    /// Create an engine over a store and the server key
    pub fn new(store: &'a mut S, key: &'a ServerKey, options: MigrationOptions) -> Self {
        Self {
            store,
            key,
            options,
        }
    }

    /// Run the migration over every entity type
    ///
    /// Entities and pages are processed strictly sequentially. The first
    /// failure aborts the run; pages committed before it stay committed.
    pub fn run(&mut self) -> SealResult<MigrationReport> {
        let mut report = MigrationReport::default();

        for entity in EntityKind::ALL {
            let entity_report = self.migrate_entity(entity)?;
            report.entries.push((entity, entity_report));
        }

        Ok(report)
    }

    fn migrate_entity(&mut self, entity: EntityKind) -> SealResult<EntityReport> {
        let mut report = EntityReport::default();
        let mut offset = 0;

        loop {
            let page = self.store.fetch_page(entity, offset, self.options.page_size)?;
            if page.is_empty() {
                break;
            }

            let plan = classify_page(&page);

            if !self.options.dry_run && !plan.updates.is_empty() {
                let updates = plan
                    .updates
                    .iter()
                    .map(|(record_id, field, plaintext)| {
                        let envelope = server::encrypt(plaintext, self.key)?;
                        Ok(FieldUpdate {
                            record_id: record_id.clone(),
                            field,
                            value: serde_json::to_string(&envelope)?,
                        })
                    })
                    .collect::<SealResult<Vec<_>>>()?;

                self.store.apply_page(entity, &updates)?;
            }

            report.encrypted += plan.rows_to_encrypt;
            report.skipped += plan.rows_skipped;

            println!(
                "  {}: offset {}: {} to encrypt, {} skipped",
                entity.label(),
                offset,
                plan.rows_to_encrypt,
                plan.rows_skipped
            );

            offset += self.options.page_size;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::store::JsonFileStore;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_key() -> ServerKey {
        ServerKey::from_hex(&"ab".repeat(32)).unwrap()
    }

    fn seed_file(dir: &TempDir) -> PathBuf {
        let key = test_key();
        let sealed = serde_json::to_string(&server::encrypt("already done", &key).unwrap()).unwrap();

        let path = dir.path().join("records.json");
        let data = serde_json::json!({
            "transactions": [
                {"id": "t1", "amount_cents": 100, "description": "coffee"},
                {"id": "t2", "amount_cents": 200, "description": null},
                {"id": "t3", "amount_cents": 300, "description": sealed},
                {"id": "t4", "amount_cents": 400, "description": "books"},
                {"id": "t5", "amount_cents": 500, "description": "{\"json\": \"but not envelope\"}"},
            ],
            "bills": [
                {"id": "b1", "description": "rent", "notes": null},
                {"id": "b2", "description": null, "notes": "water bill"},
            ],
            "counterparties": [
                {"id": "c1", "name": "Landlord", "notes": "transfer only"},
            ],
        });
        fs::write(&path, serde_json::to_string_pretty(&data).unwrap()).unwrap();
        path
    }

    fn report_for(path: &std::path::Path, dry_run: bool, page_size: usize) -> MigrationReport {
        let key = test_key();
        let mut store = JsonFileStore::open(path).unwrap();
        let mut engine = MigrationEngine::new(
            &mut store,
            &key,
            MigrationOptions { dry_run, page_size },
        );
        engine.run().unwrap()
    }

    #[test]
    fn test_live_run_encrypts_plaintext_and_skips_envelopes() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir);

        let report = report_for(&path, false, 2);

        // t1, t4, t5 plaintext; t2 null and t3 already sealed are skipped
        let entries = report.entries();
        assert_eq!(entries[0].1, EntityReport { encrypted: 3, skipped: 2 });
        assert_eq!(entries[1].1, EntityReport { encrypted: 2, skipped: 0 });
        assert_eq!(entries[2].1, EntityReport { encrypted: 1, skipped: 0 });

        // Every scheduled field now classifies as an envelope and decrypts
        let key = test_key();
        let store = JsonFileStore::open(&path).unwrap();
        let page = store.fetch_page(EntityKind::Transaction, 0, 100).unwrap();
        for record in &page {
            if let Some(raw) = &record.fields["description"] {
                match StoredField::parse(raw) {
                    StoredField::Envelope(envelope) => {
                        server::decrypt(&envelope, &key).unwrap();
                    }
                    other => panic!("expected envelope, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_rerun_skips_everything() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir);

        report_for(&path, false, 100);
        let second = report_for(&path, false, 100);

        assert_eq!(second.total_encrypted(), 0);
        assert_eq!(second.total_skipped(), 8);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir);
        let before = fs::read_to_string(&path).unwrap();

        let report = report_for(&path, true, 2);

        assert_eq!(report.total_encrypted(), 6);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_dry_run_parity_with_live_run() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir);

        let dry = report_for(&path, true, 3);
        let live = report_for(&path, false, 3);

        assert_eq!(dry.total_encrypted(), live.total_encrypted());
        assert_eq!(dry.total_skipped(), live.total_skipped());
        for (d, l) in dry.entries().iter().zip(live.entries()) {
            assert_eq!(d, l);
        }
    }

    #[test]
    fn test_failing_page_aborts_run_without_committing() {
        struct FlakyStore {
            inner: JsonFileStore,
            poison_id: &'static str,
        }

        impl RecordStore for FlakyStore {
            fn fetch_page(
                &self,
                entity: EntityKind,
                offset: usize,
                limit: usize,
            ) -> SealResult<Vec<StoredRecord>> {
                self.inner.fetch_page(entity, offset, limit)
            }

            fn apply_page(
                &mut self,
                entity: EntityKind,
                updates: &[FieldUpdate],
            ) -> SealResult<()> {
                if updates.iter().any(|u| u.record_id == self.poison_id) {
                    return Err(crate::error::SealError::Storage(
                        "simulated update failure".to_string(),
                    ));
                }
                self.inner.apply_page(entity, updates)
            }
        }

        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir);
        let key = test_key();

        // One big page, poisoned mid-page: the whole run must fail and no
        // transaction row may show an encrypted value afterwards
        let mut store = FlakyStore {
            inner: JsonFileStore::open(&path).unwrap(),
            poison_id: "t4",
        };
        let mut engine = MigrationEngine::new(&mut store, &key, MigrationOptions::default());
        assert!(engine.run().is_err());

        let reopened = JsonFileStore::open(&path).unwrap();
        let page = reopened.fetch_page(EntityKind::Transaction, 0, 100).unwrap();
        assert_eq!(page[0].fields["description"].as_deref(), Some("coffee"));
        assert_eq!(page[3].fields["description"].as_deref(), Some("books"));
    }

    #[test]
    fn test_empty_collections_terminate_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(
            &path,
            serde_json::to_string(&serde_json::json!({
                "transactions": [], "bills": [], "counterparties": []
            }))
            .unwrap(),
        )
        .unwrap();

        let report = report_for(&path, false, 100);
        assert_eq!(report.total_encrypted(), 0);
        assert_eq!(report.total_skipped(), 0);
    }
}
