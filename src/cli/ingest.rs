use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use tsbatch::batch::{encode_block, Batch, BatchIdentifiers};
use tsbatch::buffer::{BufferConfig, IngestionBuffer};
use tsbatch::export::{write_parquet_file, ExportConfig};

use super::config::Config;

const DEFAULT_DATABASE: &str = "default";
const DEFAULT_RETENTION_POLICY: &str = "autogen";

/// Values given on the command line, which win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub database: Option<String>,
    pub retention_policy: Option<String>,
    pub measurement: Option<String>,
    pub parquet: bool,
    pub max_rows: Option<usize>,
    pub compression_level: Option<i32>,
}

/// Fully resolved settings for one ingest run.
#[derive(Debug)]
pub struct IngestOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub identifiers: BatchIdentifiers,
    pub buffer: BufferConfig,
    pub parquet: bool,
    pub export: ExportConfig,
}

impl IngestOptions {
    pub fn resolve(
        input: PathBuf,
        output: Option<PathBuf>,
        config: &Config,
        overrides: Overrides,
    ) -> Self {
        let measurement = overrides
            .measurement
            .or_else(|| config.batch.measurement.clone())
            .or_else(|| {
                input
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "measurement".to_string());
        let identifiers = BatchIdentifiers::new(
            overrides
                .database
                .or_else(|| config.batch.database.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            overrides
                .retention_policy
                .or_else(|| config.batch.retention_policy.clone())
                .unwrap_or_else(|| DEFAULT_RETENTION_POLICY.to_string()),
            measurement,
        );

        let mut buffer = BufferConfig::default();
        if let Some(max_rows) = overrides.max_rows.or(config.batch.max_rows) {
            buffer = buffer.with_max_rows(max_rows);
        }

        let mut export = ExportConfig::default();
        if let Some(level) = overrides
            .compression_level
            .or(config.export.compression_level)
        {
            export = export.with_zstd_level(level);
        }
        if let Some(row_group_size) = config.export.row_group_size {
            export.row_group_size = row_group_size;
        }

        let output = output.unwrap_or_else(|| {
            if overrides.parquet {
                input.with_extension("parquet.d")
            } else {
                input.with_extension("block")
            }
        });

        Self {
            input,
            output,
            identifiers,
            buffer,
            parquet: overrides.parquet,
            export,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines: usize,
    pub rows: usize,
    pub rejected: usize,
    pub batches: usize,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} rows accepted, {} rejected, {} batches",
            self.lines, self.rows, self.rejected, self.batches
        )
    }
}

enum Sink {
    Blocks(BufWriter<File>),
    Parquet { dir: PathBuf, config: ExportConfig },
}

impl Sink {
    fn open(options: &IngestOptions) -> Result<Self> {
        if options.parquet {
            fs::create_dir_all(&options.output).with_context(|| {
                format!("Failed to create output directory: {}", options.output.display())
            })?;
            Ok(Self::Parquet {
                dir: options.output.clone(),
                config: options.export.clone(),
            })
        } else {
            let file = File::create(&options.output).with_context(|| {
                format!("Failed to create output file: {}", options.output.display())
            })?;
            Ok(Self::Blocks(BufWriter::new(file)))
        }
    }

    fn write(&mut self, batch: &Batch, index: usize) -> Result<()> {
        match self {
            Self::Blocks(writer) => {
                let block = encode_block(batch)?;
                writer.write_all(&block)?;
                debug!("Wrote block {} ({} bytes)", index, block.len());
            }
            Self::Parquet { dir, config } => {
                let path = dir.join(format!("part-{:05}.parquet", index));
                write_parquet_file(batch, &path, config)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if let Self::Blocks(mut writer) = self {
            writer.flush()?;
        }
        Ok(())
    }
}

fn emit(buffer: &IngestionBuffer, sink: &mut Sink, summary: &mut IngestSummary) -> Result<()> {
    info!("{}", buffer.stats());
    let batch = buffer.flush()?;
    sink.write(&batch, summary.batches)?;
    summary.batches += 1;
    Ok(())
}

/// Buffer every row of the input and write the resulting batches.
pub fn run(options: &IngestOptions) -> Result<IngestSummary> {
    info!(
        "Ingesting {} into {}",
        options.input.display(),
        options.identifiers
    );

    let input = File::open(&options.input)
        .with_context(|| format!("Failed to open input file: {}", options.input.display()))?;
    let reader = BufReader::new(input);

    let buffer = IngestionBuffer::with_config(options.identifiers.clone(), options.buffer.clone());
    let mut sink = Sink::open(options)?;
    let mut summary = IngestSummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.lines += 1;

        match buffer.append_json(line) {
            Ok(()) => summary.rows += 1,
            Err(e) => {
                warn!("line {}: {}", idx + 1, e);
                summary.rejected += 1;
                continue;
            }
        }

        if buffer.is_full() {
            emit(&buffer, &mut sink, &mut summary)?;
        }
    }

    if !buffer.is_empty() {
        emit(&buffer, &mut sink, &mut summary)?;
    }
    sink.finish()?;

    println!("{}", summary);
    println!("Output: {}", options.output.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tsbatch::batch::decode_blocks;

    const ROWS: &str = r#"{"tags":{"host":"a"},"fields":{"usage":0.5},"timestamp":100}
{"tags":{"host":"b"},"fields":{"usage":"high"},"timestamp":200}

{"tags":{"host":"b"},"fields":{"idle":true},"timestamp":300}
not json
{"fields":{"usage":0.7},"timestamp":400}
"#;

    fn options(dir: &std::path::Path, overrides: Overrides) -> IngestOptions {
        let input = dir.join("cpu.jsonl");
        fs::write(&input, ROWS).unwrap();
        IngestOptions::resolve(input, None, &Config::default(), overrides)
    }

    #[test]
    fn test_resolve_precedence() {
        let config = Config::from_str(
            r#"
            [batch]
            database = "telegraf"
            measurement = "mem"
            max_rows = 10

            [export]
            compression_level = 7
        "#,
        )
        .unwrap();
        let options = IngestOptions::resolve(
            PathBuf::from("rows.jsonl"),
            None,
            &config,
            Overrides {
                measurement: Some("cpu".to_string()),
                ..Overrides::default()
            },
        );

        assert_eq!(options.identifiers, BatchIdentifiers::new("telegraf", "autogen", "cpu"));
        assert_eq!(options.buffer.max_rows, Some(10));
        assert_eq!(options.export.compression, tsbatch::export::CompressionType::Zstd(7));
        assert_eq!(options.output, PathBuf::from("rows.block"));
    }

    #[test]
    fn test_measurement_defaults_to_file_stem() {
        let options = IngestOptions::resolve(
            PathBuf::from("/data/disk.jsonl"),
            None,
            &Config::default(),
            Overrides {
                parquet: true,
                ..Overrides::default()
            },
        );
        assert_eq!(options.identifiers.measurement, "disk");
        assert_eq!(options.output, PathBuf::from("/data/disk.parquet.d"));
    }

    #[test]
    fn test_ingest_blocks() {
        let dir = tempdir().unwrap();
        let options = options(dir.path(), Overrides::default());

        let summary = run(&options).unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                lines: 5,
                rows: 3,
                rejected: 2,
                batches: 1,
            }
        );

        let records = decode_blocks(&fs::read(&options.output).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].num_rows(), 3);
        assert_eq!(records[0].num_columns(), 4);
    }

    #[test]
    fn test_ingest_splits_full_batches() {
        let dir = tempdir().unwrap();
        let options = options(
            dir.path(),
            Overrides {
                max_rows: Some(2),
                ..Overrides::default()
            },
        );

        let summary = run(&options).unwrap();
        assert_eq!(summary.batches, 2);

        let records = decode_blocks(&fs::read(&options.output).unwrap()).unwrap();
        let rows: Vec<usize> = records.iter().map(|r| r.num_rows()).collect();
        assert_eq!(rows, vec![2, 1]);
    }

    #[test]
    fn test_ingest_parquet() {
        let dir = tempdir().unwrap();
        let options = options(
            dir.path(),
            Overrides {
                parquet: true,
                ..Overrides::default()
            },
        );

        let summary = run(&options).unwrap();
        assert_eq!(summary.batches, 1);
        assert!(options.output.join("part-00000.parquet").is_file());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let options = IngestOptions::resolve(
            dir.path().join("missing.jsonl"),
            None,
            &Config::default(),
            Overrides::default(),
        );
        assert!(run(&options).is_err());
    }
}
