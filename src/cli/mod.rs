//! CLI command handlers for the migration tool
//!
//! `check` verifies configuration without touching data, `run` executes the
//! migration engine, `keygen` prints a fresh server key for provisioning.

use std::path::Path;

use crate::config::{self, EncryptionConfig};
use crate::crypto::ServerKey;
use crate::error::{SealError, SealResult};
use crate::migrate::{JsonFileStore, MigrationEngine, MigrationOptions};

/// Verify the server key and data file without touching any data
pub fn handle_check(data_file: &Path, environment: &str) -> SealResult<()> {
    println!("fieldseal configuration check ({})", environment);
    println!("====================================");
    println!();

    let mut ok = true;

    match std::env::var(config::ENCRYPTION_KEY_ENV) {
        Err(_) => {
            ok = false;
            println!("Encryption key: MISSING ({} is not set)", config::ENCRYPTION_KEY_ENV);
        }
        Ok(value) => match ServerKey::from_hex(&value) {
            Ok(_) => println!("Encryption key: OK"),
            Err(e) => {
                ok = false;
                println!("Encryption key: MALFORMED ({})", e);
            }
        },
    }

    if !data_file.exists() {
        ok = false;
        println!("Data file:      MISSING ({})", data_file.display());
    } else if JsonFileStore::open(data_file).is_err() {
        ok = false;
        println!("Data file:      UNREADABLE ({})", data_file.display());
    } else {
        println!("Data file:      OK ({})", data_file.display());
    }

    println!();
    if ok {
        println!("All checks passed.");
        Ok(())
    } else {
        Err(SealError::Config(
            "Configuration check failed".to_string(),
        ))
    }
}

/// Run the re-encryption migration
pub fn handle_run(data_file: &Path, environment: &str, dry_run: bool) -> SealResult<()> {
    let key = require_server_key()?;

    if dry_run {
        println!("Starting migration dry run ({})", environment);
    } else {
        println!("Starting migration ({})", environment);
    }
    println!();

    let mut store = JsonFileStore::open(data_file)?;
    let mut engine = MigrationEngine::new(
        &mut store,
        &key,
        MigrationOptions {
            dry_run,
            ..Default::default()
        },
    );
    let report = engine.run()?;

    println!();
    if dry_run {
        println!("Dry run complete. No changes were written.");
        for (entity, counts) in report.entries() {
            println!(
                "  {}: {} would be encrypted, {} skipped",
                entity.label(),
                counts.encrypted,
                counts.skipped
            );
        }
        println!(
            "Totals: {} would be encrypted, {} skipped",
            report.total_encrypted(),
            report.total_skipped()
        );
    } else {
        println!("Migration complete.");
        for (entity, counts) in report.entries() {
            println!(
                "  {}: {} encrypted, {} skipped",
                entity.label(),
                counts.encrypted,
                counts.skipped
            );
        }
        println!(
            "Totals: {} encrypted, {} skipped",
            report.total_encrypted(),
            report.total_skipped()
        );
    }

    Ok(())
}

/// Generate and print a fresh server key
pub fn handle_keygen() -> SealResult<()> {
    let key = ServerKey::generate();
    println!("{}", key.to_hex());
    Ok(())
}

/// Read the server key from the environment, failing loudly if absent
///
/// Unlike the transparent service, the migration cannot degrade to identity:
/// running it without a key would be a pointless full-table walk.
fn require_server_key() -> SealResult<ServerKey> {
    let config = EncryptionConfig::from_env();
    match config.server_key() {
        Some(key) => Ok(key.clone()),
        None => Err(SealError::Config(format!(
            "{} is not set or is not a 64-character hex key",
            config::ENCRYPTION_KEY_ENV
        ))),
    }
}
