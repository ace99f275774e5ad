use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod ingest;
mod inspect;

/// tsbatch - Sparse row to columnar batch ingestion
#[derive(Parser)]
#[command(name = "tsbatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Buffer JSON-lines rows and write them as columnar blocks
    Ingest {
        /// Input file with one JSON row per line
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output block file, or Parquet directory with --parquet
        #[arg(short = 'o', long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Target database
        #[arg(long)]
        database: Option<String>,

        /// Target retention policy
        #[arg(long = "rp")]
        retention_policy: Option<String>,

        /// Target measurement
        #[arg(long)]
        measurement: Option<String>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write Parquet parts instead of blocks
        #[arg(long)]
        parquet: bool,

        /// Rows per batch before a flush
        #[arg(short = 'b', long, hide = true)]
        max_rows: Option<usize>,

        /// Compression level for ZSTD (1-22), Parquet output only
        #[arg(short = 'c', long, hide = true)]
        compression_level: Option<i32>,
    },

    /// Display the batches held in a block file
    Inspect {
        /// Input block file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest {
            input,
            output,
            database,
            retention_policy,
            measurement,
            config,
            parquet,
            max_rows,
            compression_level,
        } => {
            let file_config = match config {
                Some(path) => config::Config::from_file(&path)?,
                None => config::Config::default(),
            };
            let options = ingest::IngestOptions::resolve(
                input,
                output,
                &file_config,
                ingest::Overrides {
                    database,
                    retention_policy,
                    measurement,
                    parquet,
                    max_rows,
                    compression_level,
                },
            );
            ingest::run(&options).map(|_| ())
        }
        Commands::Inspect { file } => inspect::run(file),
    }
}
