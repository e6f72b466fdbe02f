use std::path::PathBuf;

use billbook_core::{Bill, BillSummary, InvoiceSequence, PaymentStatus, StoredRecord};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "billbook", about = "Billbook - local bill record stores")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "billbook.toml")]
    pub config: String,

    /// Data location (overrides config file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Storage backend (overrides config file)
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Full bills with line items
    Bills {
        #[command(subcommand)]
        action: RecordCommand,
    },
    /// Bill summaries, checked for duplicates on save
    Summaries {
        #[command(subcommand)]
        action: RecordCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordCommand {
    /// Save a new record read from a JSON file ("-" for stdin)
    Save {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List all records as a table
    List,
    /// Print one record
    Get { id: String },
    /// Merge the fields of a JSON object into a record
    Update {
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Set the payment status of a record
    Status { id: String, status: PaymentStatus },
    /// Delete a record
    Delete { id: String },
    /// Print the stored array as JSON
    Export,
    /// Replace all records with a JSON array read from a file
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub stores: StoresConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory holding the slot files or the SQLite database.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoresConfig {
    #[serde(default = "default_bills_slot")]
    pub bills_slot: String,

    #[serde(default = "default_summaries_slot")]
    pub summaries_slot: String,

    #[serde(default)]
    pub invoice_sequence: InvoiceSequence,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("billbook-data")
}

fn default_bills_slot() -> String {
    Bill::DEFAULT_SLOT.to_string()
}

fn default_summaries_slot() -> String {
    BillSummary::DEFAULT_SLOT.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: BackendKind::default(),
            path: default_data_path(),
        }
    }
}

impl Default for StoresConfig {
    fn default() -> Self {
        StoresConfig {
            bills_slot: default_bills_slot(),
            summaries_slot: default_summaries_slot(),
            invoice_sequence: InvoiceSequence::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::default(),
            stores: StoresConfig::default(),
            logging: default_logging(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Config::from_toml_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };
        config.apply_overrides(cli);
        config
    }

    // CLI overrides
    pub fn apply_overrides(&mut self, cli: &CliArgs) {
        if let Some(ref data) = cli.data {
            self.storage.path = data.clone();
        }
        if let Some(backend) = cli.backend {
            self.storage.backend = backend;
        }
        if let Some(ref level) = cli.log_level {
            self.logging.level = level.clone();
        }
    }
}
