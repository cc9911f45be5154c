//! DocVault CLI
//!
//! Command-line interface for inspecting and editing a DocVault store.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use docvault::{
    Config, DeleteOptions, DocumentStore, Envelope, ReadOptions, SearchParams, SortField,
    SortOrder, VaultError, WriteOptions,
};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

/// DocVault CLI
#[derive(Parser, Debug)]
#[command(name = "docvault")]
#[command(about = "Per-type document store with locking, atomic writes and backups")]
#[command(version)]
struct Args {
    /// Base directory (overrides DOCVAULT_BASE_PATH)
    #[arg(short, long, global = true)]
    base_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a document
    Read {
        /// Record type (chat, document, settings, log)
        record_type: String,

        /// File name, e.g. c1.chat.json
        name: String,

        /// Skip structural validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Create or replace a document from a file or stdin
    Write {
        record_type: String,

        name: String,

        /// Read the envelope from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Do not back up the previous version
        #[arg(long)]
        no_backup: bool,

        /// Skip structural validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Delete a document
    Delete {
        record_type: String,

        name: String,

        /// Do not back up the deleted document
        #[arg(long)]
        no_backup: bool,
    },

    /// List documents
    List {
        /// Only this record type
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,

        /// Case-insensitive regex on file names
        #[arg(short, long)]
        pattern: Option<String>,

        #[arg(long)]
        min_size: Option<u64>,

        #[arg(long)]
        max_size: Option<u64>,

        /// RFC 3339 timestamp
        #[arg(long, value_parser = parse_timestamp)]
        created_after: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_timestamp)]
        created_before: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_timestamp)]
        modified_after: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_timestamp)]
        modified_before: Option<DateTime<Utc>>,

        /// Only locked (true) or unlocked (false) files
        #[arg(long)]
        locked: Option<bool>,

        #[arg(long, value_enum, default_value_t = SortArg::Modified)]
        sort: SortArg,

        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,

        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Show file, lock and backup totals
    Stats {
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,
    },

    /// List backups
    Backups {
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,

        /// Only backups of this document
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Restore a document from one of its backups
    Restore {
        record_type: String,

        /// Backup file name as shown by `backups`
        backup: String,
    },

    /// Sweep expired locks, stale temp files and old backups
    Cleanup,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Name,
    Size,
    Created,
    Modified,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortField::Name,
            SortArg::Size => SortField::Size,
            SortArg::Created => SortField::Created,
            SortArg::Modified => SortField::Modified,
        }
    }
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {}", e))
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays machine-readable)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,docvault=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> docvault::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(base_path) = args.base_path {
        config.base_path = base_path;
    }

    tracing::debug!("DocVault CLI v{}", docvault::VERSION);
    let store = DocumentStore::open(config)?;

    match args.command {
        Commands::Read {
            record_type,
            name,
            no_validate,
        } => {
            let options = ReadOptions {
                skip_validation: no_validate,
            };
            print_json(&store.read_with(&record_type, &name, options)?)
        }

        Commands::Write {
            record_type,
            name,
            file,
            no_backup,
            no_validate,
        } => {
            let bytes = match file {
                Some(path) => fs::read(path)?,
                None => {
                    let mut buffer = Vec::new();
                    io::stdin().read_to_end(&mut buffer)?;
                    buffer
                }
            };
            let payload_field = &store.paths().record_type(&record_type)?.payload_field;
            let envelope = Envelope::from_slice(&bytes, payload_field)?;
            let options = WriteOptions {
                skip_backup: no_backup,
                skip_validation: no_validate,
            };
            store.write(&record_type, &name, &envelope, options)?;
            tracing::info!("Wrote {}", name);
            Ok(())
        }

        Commands::Delete {
            record_type,
            name,
            no_backup,
        } => {
            let options = DeleteOptions {
                skip_backup: no_backup,
            };
            store.delete(&record_type, &name, options)?;
            tracing::info!("Deleted {}", name);
            Ok(())
        }

        Commands::List {
            record_type,
            pattern,
            min_size,
            max_size,
            created_after,
            created_before,
            modified_after,
            modified_before,
            locked,
            sort,
            order,
            offset,
            limit,
        } => {
            let params = SearchParams {
                name_pattern: pattern,
                min_size,
                max_size,
                created_after,
                created_before,
                modified_after,
                modified_before,
                locked,
                sort_by: sort.into(),
                sort_order: order.into(),
                offset,
                limit,
            };
            print_json(&store.list(record_type.as_deref(), &params)?)
        }

        Commands::Stats { record_type } => print_json(&store.stats(record_type.as_deref())?),

        Commands::Backups { record_type, name } => {
            print_json(&store.list_backups(record_type.as_deref(), name.as_deref())?)
        }

        Commands::Restore {
            record_type,
            backup,
        } => {
            store.restore_backup(&record_type, &backup)?;
            tracing::info!("Restored from {}", backup);
            Ok(())
        }

        Commands::Cleanup => print_json(&store.cleanup()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), VaultError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
