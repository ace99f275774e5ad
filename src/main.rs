//! # tsbatch
//!
//! A command-line tool for turning JSON-lines time-series rows into columnar
//! write blocks.
//!
//! ## Usage
//!
//! ```bash
//! # Buffer rows and write length-prefixed Arrow IPC blocks
//! tsbatch ingest rows.jsonl -o rows.block --database db0 --measurement cpu
//!
//! # Write Parquet parts instead
//! tsbatch ingest rows.jsonl -o rows.parquet.d --parquet
//!
//! # Show what a block file holds
//! tsbatch inspect rows.block
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{dispatch, init_logging, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    dispatch(cli)
}
