use anyhow::{Context, Result};
use std::path::PathBuf;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use tsbatch::batch::decode_blocks;
use tsbatch::schema::{
    column_type_of, KEY_COLUMN_KIND, KEY_DATABASE, KEY_MAX_TIME, KEY_MEASUREMENT, KEY_MIN_TIME,
    KEY_RETENTION_POLICY,
};

fn meta<'a>(record: &'a RecordBatch, key: &str) -> &'a str {
    record
        .schema_ref()
        .metadata()
        .get(key)
        .map(String::as_str)
        .unwrap_or("<unset>")
}

/// Display the batches held in a block file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let data = std::fs::read(&file).context("Failed to read block file")?;
    let records = decode_blocks(&data).context("Failed to decode blocks")?;

    println!("Block File Information");
    println!("======================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", data.len());
    println!("Batches: {}", records.len());

    for (idx, record) in records.iter().enumerate() {
        println!();
        println!(
            "Batch {}: {}.{}.{}",
            idx,
            meta(record, KEY_DATABASE),
            meta(record, KEY_RETENTION_POLICY),
            meta(record, KEY_MEASUREMENT)
        );
        println!("  Rows: {}", record.num_rows());
        println!(
            "  Time: [{}, {}]",
            meta(record, KEY_MIN_TIME),
            meta(record, KEY_MAX_TIME)
        );
        println!("  Columns:");
        let schema = record.schema();
        for (i, field) in schema.fields().iter().enumerate() {
            let column_type = column_type_of(field)
                .map(|t| t.to_string())
                .unwrap_or_else(|| field.data_type().to_string());
            let kind = field
                .metadata()
                .get(KEY_COLUMN_KIND)
                .map(String::as_str)
                .unwrap_or("?");
            println!(
                "  {:3}. {} ({}, {}, {} nulls)",
                i + 1,
                field.name(),
                kind,
                column_type,
                record.column(i).null_count()
            );
        }
    }

    Ok(())
}
