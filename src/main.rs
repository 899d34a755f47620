use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fieldseal::cli::{handle_check, handle_keygen, handle_run};
use fieldseal::config::DATA_FILE_ENV;

#[derive(Parser)]
#[command(
    name = "fieldseal",
    version,
    about = "Field-level encryption migration tool for financial records",
    long_about = "fieldseal manages the server-tier encryption of sensitive text \
                  fields (descriptions, notes, account numbers) in a financial \
                  record-keeping data set. It can verify the deployment's key \
                  configuration and retrofit encryption onto legacy plaintext rows."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the encryption key and data file without touching data
    Check {
        /// Path to the JSON data file
        #[arg(long, env = DATA_FILE_ENV)]
        data_file: PathBuf,

        /// Target environment label, for operator logs
        #[arg(long, default_value = "development")]
        environment: String,
    },

    /// Encrypt legacy plaintext rows in pages
    Run {
        /// Path to the JSON data file
        #[arg(long, env = DATA_FILE_ENV)]
        data_file: PathBuf,

        /// Target environment label, for operator logs
        #[arg(long, default_value = "development")]
        environment: String,

        /// Classify and count without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a fresh 64-hex-character server key for provisioning
    Keygen,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            data_file,
            environment,
        } => handle_check(&data_file, &environment)?,
        Commands::Run {
            data_file,
            environment,
            dry_run,
        } => handle_run(&data_file, &environment, dry_run)?,
        Commands::Keygen => handle_keygen()?,
    }

    Ok(())
}
