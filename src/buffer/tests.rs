use super::*;
use crate::batch::{BatchError, TimeRange};
use crate::value::{ColumnType, FieldValue};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_nanos(&self) -> i64 {
        self.0
    }
}

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fields(pairs: &[(&str, FieldValue)]) -> HashMap<String, FieldValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn assert_rectangular(buffer: &IngestionBuffer) {
    let batch = buffer.to_batch().unwrap();
    for (schema, store) in batch.columns() {
        assert_eq!(store.len(), buffer.row_count(), "column {}", schema.name);
    }
}

#[test]
fn test_scenario_same_field_twice() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[]), &fields(&[("b", FieldValue::Int(1))]), 1000)
        .unwrap();
    buffer
        .append_row(&tags(&[]), &fields(&[("b", FieldValue::Int(2))]), 1100)
        .unwrap();

    assert_eq!(buffer.row_count(), 2);
    assert_eq!(buffer.min_time(), Some(1000));
    assert_eq!(buffer.max_time(), Some(1100));

    let batch = buffer.to_batch().unwrap();
    let b = batch.column("b").unwrap();
    assert_eq!(
        b.iter().collect::<Vec<_>>(),
        vec![Some(FieldValue::Int(1)), Some(FieldValue::Int(2))]
    );
    let time = batch.column("time").unwrap();
    assert_eq!(
        time.iter().collect::<Vec<_>>(),
        vec![Some(FieldValue::Int(1000)), Some(FieldValue::Int(1100))]
    );
}

#[test]
fn test_scenario_disjoint_columns() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("t1", "1")]), &fields(&[("v1", FieldValue::Int(1))]), 100)
        .unwrap();
    buffer
        .append_row(&tags(&[("t2", "1")]), &fields(&[("v2", FieldValue::Int(2))]), 200)
        .unwrap();

    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.row_count(), 2);

    let s = |v: &str| Some(FieldValue::String(v.to_string()));
    assert_eq!(batch.column("t1").unwrap().iter().collect::<Vec<_>>(), vec![s("1"), None]);
    assert_eq!(batch.column("t2").unwrap().iter().collect::<Vec<_>>(), vec![None, s("1")]);
    assert_eq!(
        batch.column("v1").unwrap().iter().collect::<Vec<_>>(),
        vec![Some(FieldValue::Int(1)), None]
    );
    assert_eq!(
        batch.column("v2").unwrap().iter().collect::<Vec<_>>(),
        vec![None, Some(FieldValue::Int(2))]
    );
}

#[test]
fn test_scenario_type_lock() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[]), &fields(&[("b", FieldValue::from("x"))]), 1)
        .unwrap();

    let err = buffer
        .append_row(&tags(&[]), &fields(&[("b", FieldValue::Int(5))]), 2)
        .unwrap_err();
    assert!(matches!(
        err,
        BufferError::TypeMismatch {
            expected: ColumnType::String,
            actual: ColumnType::Int,
            ..
        }
    ));
    assert_eq!(buffer.row_count(), 1);
    assert_eq!(buffer.time_range(), Some(TimeRange::at(1)));
    assert_rectangular(&buffer);
}

#[test]
fn test_scenario_reserved_tag_name() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let err = buffer
        .append_row(&tags(&[("time", "x")]), &fields(&[]), 1)
        .unwrap_err();
    assert!(matches!(err, BufferError::ReservedName(ref name) if name == "time"));
    assert_eq!(buffer.column_count(), 0);
    assert!(matches!(buffer.to_batch(), Err(BatchError::EmptyBatch)));
}

#[test]
fn test_reserved_field_name() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let err = buffer
        .append_row(&tags(&[]), &fields(&[("time", FieldValue::Int(3))]), 1)
        .unwrap_err();
    assert!(matches!(err, BufferError::ReservedName(_)));
}

#[test]
fn test_empty_names_rejected() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let err = buffer.append_row(&tags(&[("", "a")]), &fields(&[]), 1).unwrap_err();
    assert!(matches!(err, BufferError::EmptyName));
    let err = buffer
        .append_row(&tags(&[]), &fields(&[("", FieldValue::Boolean(true))]), 1)
        .unwrap_err();
    assert!(matches!(err, BufferError::EmptyName));
    assert!(buffer.is_empty());
}

#[test]
fn test_failed_row_does_not_create_columns() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[("v", FieldValue::Int(1))]), 10)
        .unwrap();

    // New tag and field in the same row as a bad value: none of them may survive.
    let err = buffer
        .append_row(
            &tags(&[("region", "eu")]),
            &fields(&[("v", FieldValue::Float(1.0)), ("w", FieldValue::Int(2))]),
            20,
        )
        .unwrap_err();
    assert!(matches!(err, BufferError::TypeMismatch { .. }));
    assert_eq!(buffer.column_names(), vec!["host", "time", "v"]);
    assert_eq!(buffer.max_time(), Some(10));
    assert_rectangular(&buffer);
}

#[test]
fn test_tag_and_field_with_same_name() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let err = buffer
        .append_row(&tags(&[("a", "1")]), &fields(&[("a", FieldValue::from("1"))]), 1)
        .unwrap_err();
    assert!(matches!(err, BufferError::DuplicateName(ref name) if name == "a"));
    assert!(buffer.is_empty());
}

#[test]
fn test_field_cannot_reuse_tag_column() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer.append_row(&tags(&[("a", "1")]), &fields(&[]), 1).unwrap();
    let err = buffer
        .append_row(&tags(&[]), &fields(&[("a", FieldValue::from("1"))]), 2)
        .unwrap_err();
    assert!(matches!(
        err,
        BufferError::TypeMismatch {
            expected: ColumnType::Tag,
            actual: ColumnType::String,
            ..
        }
    ));
}

#[test]
fn test_backfill_on_creation() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    for ts in 1..=3 {
        buffer
            .append_row(&tags(&[]), &fields(&[("a", FieldValue::Int(ts))]), ts)
            .unwrap();
    }
    buffer
        .append_row(&tags(&[]), &fields(&[("late", FieldValue::Boolean(true))]), 4)
        .unwrap();

    let batch = buffer.to_batch().unwrap();
    let late = batch.column("late").unwrap();
    assert_eq!(late.len(), 4);
    assert_eq!(late.validity(), &[false, false, false, true]);
}

#[test]
fn test_absence_adds_exactly_one_null() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[("v", FieldValue::Int(1))]), 1)
        .unwrap();
    buffer.append_row(&tags(&[]), &fields(&[]), 2).unwrap();

    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.column("host").unwrap().validity(), &[true, false]);
    assert_eq!(batch.column("v").unwrap().validity(), &[true, false]);
}

#[test]
fn test_zero_timestamp_uses_clock() {
    let buffer =
        IngestionBuffer::new("db0", "rp0", "mst0").with_clock(Arc::new(FixedClock(5_000)));
    buffer
        .append_row(&tags(&[]), &fields(&[("v", FieldValue::Int(1))]), 0)
        .unwrap();
    buffer
        .append_row(&tags(&[]), &fields(&[("v", FieldValue::Int(2))]), 7_000)
        .unwrap();

    assert_eq!(buffer.time_range(), Some(TimeRange { min: 5_000, max: 7_000 }));
    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.column("time").unwrap().get(0), Some(FieldValue::Int(5_000)));
}

#[test]
fn test_min_max_with_unordered_timestamps() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    for ts in [500, -20, 900, 100] {
        buffer
            .append_row(&tags(&[]), &fields(&[("v", FieldValue::Float(1.0))]), ts)
            .unwrap();
    }
    assert_eq!(buffer.min_time(), Some(-20));
    assert_eq!(buffer.max_time(), Some(900));
}

#[test]
fn test_append_row_builder_and_json() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let row = Row::builder()
        .tag("host", "a")
        .field("usage", 0.25)
        .field("count", 3u64)
        .timestamp(10)
        .build();
    buffer.append(&row).unwrap();

    // JSON 4 parses as a signed integer, which the UInt column rejects.
    let err = buffer
        .append_json(r#"{"tags":{"host":"b"},"fields":{"usage":0.5,"count":4},"timestamp":20}"#)
        .unwrap_err();
    assert!(matches!(err, BufferError::TypeMismatch { .. }));
    assert_eq!(buffer.row_count(), 1);
    assert_eq!(buffer.column_type("count"), Some(ColumnType::UInt));

    buffer
        .append_json(r#"{"tags":{"host":"b"},"fields":{"usage":0.5},"timestamp":20}"#)
        .unwrap();
    assert_eq!(buffer.row_count(), 2);
}

#[test]
fn test_append_json_unknown_field_type() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let err = buffer
        .append_json(r#"{"fields":{"v":[1,2]},"timestamp":1}"#)
        .unwrap_err();
    assert!(matches!(err, BufferError::UnknownFieldType { ref name, kind: "array" } if name == "v"));
    assert!(buffer.is_empty());

    let err = buffer.append_json("not json").unwrap_err();
    assert!(matches!(err, BufferError::Json(_)));
}

#[test]
fn test_rejected_json_row_keeps_existing_columns() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_json(r#"{"tags":{"host":"a"},"fields":{"v":1},"timestamp":10}"#)
        .unwrap();

    let err = buffer
        .append_json(r#"{"tags":{"zone":"z"},"fields":{"v":2,"w":[1,2]},"timestamp":20}"#)
        .unwrap_err();
    assert!(matches!(err, BufferError::UnknownFieldType { ref name, kind: "array" } if name == "w"));

    assert_eq!(buffer.row_count(), 1);
    assert_eq!(buffer.column_names(), vec!["host", "time", "v"]);
    assert_eq!(buffer.time_range(), Some(TimeRange::at(10)));
    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.column("v").unwrap().get(0), Some(FieldValue::Int(1)));
}

#[test]
fn test_json_whole_number_does_not_fit_float_column() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_json(r#"{"fields":{"usage":0.5},"timestamp":1}"#)
        .unwrap();

    let err = buffer
        .append_json(r#"{"fields":{"usage":1},"timestamp":2}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        BufferError::TypeMismatch {
            expected: ColumnType::Float,
            actual: ColumnType::Int,
            ..
        }
    ));
    buffer
        .append_json(r#"{"fields":{"usage":1.0},"timestamp":2}"#)
        .unwrap();
    assert_eq!(buffer.row_count(), 2);
}

#[test]
fn test_append_columns() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[("old", FieldValue::Int(1))]), 1)
        .unwrap();

    let chunk = ColumnChunk::new(vec![2, 3, 4])
        .with_tag("host", vec![Some("b".to_string()), None, Some("c".to_string())])
        .with_field(
            "v",
            vec![Some(FieldValue::Float(1.0)), None, Some(FieldValue::Float(3.0))],
        )
        .with_field("empty", vec![None, None, None]);
    assert_eq!(buffer.append_columns(&chunk).unwrap(), 3);

    assert_eq!(buffer.row_count(), 4);
    assert_eq!(buffer.time_range(), Some(TimeRange { min: 1, max: 4 }));
    assert_eq!(buffer.column_type("empty"), None);

    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.column("host").unwrap().validity(), &[true, true, false, true]);
    assert_eq!(batch.column("old").unwrap().validity(), &[true, false, false, false]);
    assert_eq!(batch.column("v").unwrap().validity(), &[false, true, false, true]);
    assert_rectangular(&buffer);
}

#[test]
fn test_append_columns_rejects_whole_chunk() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    let chunk = ColumnChunk::new(vec![1, 2])
        .with_field("v", vec![Some(FieldValue::Int(1)), Some(FieldValue::from("x"))]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::TypeMismatch { .. }));
    assert!(buffer.is_empty());

    let chunk = ColumnChunk::new(vec![1, 2]).with_tag("host", vec![None]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(
        err,
        BufferError::LengthMismatch {
            len: 1,
            expected: 2,
            ..
        }
    ));
    assert_eq!(buffer.column_count(), 0);
}

#[test]
fn test_append_columns_rejects_reserved_and_empty_names() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[("v", FieldValue::Int(1))]), 1)
        .unwrap();

    let chunk = ColumnChunk::new(vec![2]).with_tag("time", vec![Some("x".to_string())]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::ReservedName(ref name) if name == "time"));

    let chunk = ColumnChunk::new(vec![2]).with_field("time", vec![Some(FieldValue::Int(2))]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::ReservedName(_)));

    let chunk = ColumnChunk::new(vec![2])
        .with_field("w", vec![Some(FieldValue::Int(2))])
        .with_field("", vec![Some(FieldValue::Int(2))]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::EmptyName));

    let chunk = ColumnChunk::new(vec![2]).with_tag("", vec![None]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::EmptyName));

    assert_eq!(buffer.column_count(), 3);
    assert_eq!(buffer.row_count(), 1);
    assert_eq!(buffer.max_time(), Some(1));
    assert_rectangular(&buffer);
}

#[test]
fn test_append_columns_duplicate_name() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[]), 1)
        .unwrap();

    let chunk = ColumnChunk::new(vec![2, 3])
        .with_tag("a", vec![Some("x".to_string()), None])
        .with_field("a", vec![None, Some(FieldValue::from("y"))]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(err, BufferError::DuplicateName(ref name) if name == "a"));

    assert_eq!(buffer.column_count(), 2);
    assert_eq!(buffer.row_count(), 1);
    assert_rectangular(&buffer);
}

#[test]
fn test_append_columns_field_cannot_reuse_tag_column() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[]), 1)
        .unwrap();

    // All-null entries carry no type but still may not reach a tag column.
    let chunk = ColumnChunk::new(vec![2]).with_field("host", vec![None]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(
        err,
        BufferError::TypeMismatch {
            expected: ColumnType::Tag,
            ..
        }
    ));

    let chunk = ColumnChunk::new(vec![2]).with_field("host", vec![Some(FieldValue::from("b"))]);
    let err = buffer.append_columns(&chunk).unwrap_err();
    assert!(matches!(
        err,
        BufferError::TypeMismatch {
            expected: ColumnType::Tag,
            actual: ColumnType::String,
            ..
        }
    ));

    assert_eq!(buffer.row_count(), 1);
    assert_eq!(buffer.column_type("host"), Some(ColumnType::Tag));
    assert_rectangular(&buffer);
}

#[test]
fn test_append_columns_empty_chunk() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    assert_eq!(buffer.append_columns(&ColumnChunk::default()).unwrap(), 0);
    assert_eq!(buffer.column_count(), 0);
}

#[test]
fn test_flush_and_reset() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("host", "a")]), &fields(&[("v", FieldValue::Int(1))]), 1)
        .unwrap();

    let batch = buffer.flush().unwrap();
    assert_eq!(batch.row_count(), 1);
    assert!(buffer.is_empty());
    assert_eq!(buffer.time_range(), None);
    assert!(matches!(buffer.flush(), Err(BatchError::EmptyBatch)));

    // Types are no longer locked after a reset.
    buffer
        .append_row(&tags(&[]), &fields(&[("v", FieldValue::from("now text"))]), 2)
        .unwrap();
    assert_eq!(buffer.column_type("v"), Some(ColumnType::String));
    buffer.reset();
    assert_eq!(buffer.column_count(), 0);
}

#[test]
fn test_is_full() {
    let config = BufferConfig::unbounded().with_max_rows(2);
    let buffer = IngestionBuffer::with_config(
        crate::batch::BatchIdentifiers::new("db0", "rp0", "mst0"),
        config,
    );
    buffer.append_row(&tags(&[]), &fields(&[]), 1).unwrap();
    assert!(!buffer.is_full());
    buffer.append_row(&tags(&[]), &fields(&[]), 2).unwrap();
    assert!(buffer.is_full());
    assert!(!IngestionBuffer::with_config(Default::default(), BufferConfig::unbounded()).is_full());
}

#[test]
fn test_capacity_hint_does_not_change_contents() {
    let config = BufferConfig::unbounded().with_capacity_hint(4096);
    assert_eq!(config.capacity_hint, 4096);
    let buffer = IngestionBuffer::with_config(
        crate::batch::BatchIdentifiers::new("db0", "rp0", "mst0"),
        config,
    );
    buffer
        .append_row(&tags(&[]), &fields(&[("v", FieldValue::Int(1))]), 1)
        .unwrap();
    buffer
        .append_row(&tags(&[]), &fields(&[("w", FieldValue::Int(2))]), 2)
        .unwrap();

    let batch = buffer.to_batch().unwrap();
    assert_eq!(batch.row_count(), 2);
    assert_eq!(batch.column("w").unwrap().validity(), &[false, true]);
    assert_rectangular(&buffer);
}

#[test]
fn test_stats() {
    let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
    buffer
        .append_row(&tags(&[("t1", "1")]), &fields(&[("v1", FieldValue::Int(1))]), 100)
        .unwrap();
    buffer
        .append_row(&tags(&[("t2", "1")]), &fields(&[("v2", FieldValue::Int(2))]), 200)
        .unwrap();

    let stats = buffer.stats();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.columns, 5);
    assert_eq!(stats.tag_columns, 2);
    assert_eq!(stats.null_slots, 4);
    assert_eq!(stats.density(), 0.6);
    assert!(stats.to_string().starts_with("Buffered 2 rows in 5 columns (2 tags)"));
}

#[test]
fn test_concurrent_appends_stay_rectangular() {
    let buffer = Arc::new(IngestionBuffer::new("db0", "rp0", "mst0"));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for i in 0..250i64 {
                    let name = format!("w{worker}");
                    let row = Row::builder()
                        .tag("worker", name.clone())
                        .field(name, i)
                        .timestamp(1 + worker * 1_000 + i)
                        .build();
                    buffer.append(&row).unwrap();
                    if i % 50 == 0 {
                        let batch = buffer.to_batch().unwrap();
                        for (_, store) in batch.columns() {
                            assert_eq!(store.len(), batch.row_count());
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(buffer.row_count(), 1_000);
    assert_eq!(buffer.column_count(), 6);
    assert_rectangular(&buffer);
}
