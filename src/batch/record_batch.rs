use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use super::{Batch, BatchError};
use crate::schema::{
    create_batch_schema, BLOCK_FORMAT_VERSION, KEY_DATABASE, KEY_FORMAT_VERSION, KEY_MAX_TIME,
    KEY_MEASUREMENT, KEY_MIN_TIME, KEY_RETENTION_POLICY,
};

impl Batch {
    /// Schema-level metadata: format version, identifiers and time bounds.
    pub fn schema_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(KEY_FORMAT_VERSION.to_string(), BLOCK_FORMAT_VERSION.to_string());
        metadata.insert(KEY_DATABASE.to_string(), self.identifiers.database.clone());
        metadata.insert(
            KEY_RETENTION_POLICY.to_string(),
            self.identifiers.retention_policy.clone(),
        );
        metadata.insert(KEY_MEASUREMENT.to_string(), self.identifiers.measurement.clone());
        metadata.insert(KEY_MIN_TIME.to_string(), self.time_range.min.to_string());
        metadata.insert(KEY_MAX_TIME.to_string(), self.time_range.max.to_string());
        metadata
    }

    /// Arrow schema of this batch, in column order.
    pub fn arrow_schema(&self) -> Arc<Schema> {
        Arc::new(create_batch_schema(&self.schema, self.schema_metadata()))
    }

    /// Materialize the batch as an Arrow [`RecordBatch`].
    pub fn to_record_batch(&self) -> Result<RecordBatch, BatchError> {
        let arrays: Vec<ArrayRef> = self.values.iter().map(|store| store.to_array()).collect();
        Ok(RecordBatch::try_new(self.arrow_schema(), arrays)?)
    }
}
