//! # Write Transport Boundary
//!
//! Request and response shapes for submitting a [`Batch`] to a storage
//! service, and the [`WriteService`] trait a network client implements.
//! No network client ships with this crate.
//!
//! ```rust
//! use tsbatch::buffer::IngestionBuffer;
//! use tsbatch::transport::{Credentials, WriteRowsRequest};
//! use std::collections::HashMap;
//!
//! let buffer = IngestionBuffer::new("db0", "rp0", "mst0");
//! let tags = HashMap::from([("a".to_string(), "1".to_string())]);
//! let fields = HashMap::from([("b".to_string(), 1i64.into())]);
//! buffer.append_row(&tags, &fields, 1_000)?;
//!
//! let batch = buffer.to_batch()?;
//! let request = WriteRowsRequest::from_batch(&batch, Credentials::new("admin", "secret"))?;
//! assert_eq!(request.rows.min_time, 1_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::batch::{encode_block, Batch, BatchError};

/// Request protocol version
pub const PROTOCOL_VERSION: u32 = 0;

/// Errors that can occur while submitting a batch
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The batch could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] BatchError),

    /// The service refused the credentials
    #[error("authentication failed for user '{0}'")]
    Unauthenticated(String),

    /// The service rejected the request
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The service could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Block compression applied before submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressAlgo {
    /// Block is sent as encoded
    #[default]
    Uncompressed,
}

impl CompressAlgo {
    /// Wire code of the algorithm.
    pub fn code(self) -> u32 {
        match self {
            Self::Uncompressed => 0,
        }
    }
}

/// User credentials carried by every request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Encoded rows of a single measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rows {
    /// Target measurement
    pub measurement: String,
    /// Smallest timestamp in the block
    pub min_time: i64,
    /// Largest timestamp in the block
    pub max_time: i64,
    /// Compression applied to `block`
    pub compress_algo: CompressAlgo,
    /// Encoded batch, see [`encode_block`]
    pub block: Vec<u8>,
}

/// Request submitting one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRowsRequest {
    /// Protocol version
    pub version: u32,
    /// Target database
    pub database: String,
    /// Target retention policy
    pub retention_policy: String,
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// Encoded rows
    pub rows: Rows,
}

impl WriteRowsRequest {
    /// Encode `batch` and wrap it in a request.
    pub fn from_batch(batch: &Batch, credentials: Credentials) -> Result<Self, BatchError> {
        let block = encode_block(batch)?;
        let ids = batch.identifiers();
        debug!("Encoded {} into a {} byte block", batch, block.len());

        Ok(Self {
            version: PROTOCOL_VERSION,
            database: ids.database.clone(),
            retention_policy: ids.retention_policy.clone(),
            username: credentials.username,
            password: credentials.password,
            rows: Rows {
                measurement: ids.measurement.clone(),
                min_time: batch.min_time(),
                max_time: batch.max_time(),
                compress_algo: CompressAlgo::Uncompressed,
                block,
            },
        })
    }
}

/// Outcome reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    /// All rows were written
    Success,
    /// Some rows were dropped
    Partial,
    /// Nothing was written
    Failed,
}

/// Response to a [`WriteRowsRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRowsResponse {
    /// Outcome
    pub code: ResponseCode,
    /// Optional detail from the service
    #[serde(default)]
    pub message: Option<String>,
}

impl WriteRowsResponse {
    /// Successful response without detail.
    pub fn success() -> Self {
        Self {
            code: ResponseCode::Success,
            message: None,
        }
    }

    /// Returns true if every row was written.
    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success
    }
}

/// A storage service accepting encoded batches
pub trait WriteService {
    /// Submit one request.
    fn write_rows(&self, request: &WriteRowsRequest) -> Result<WriteRowsResponse, TransportError>;
}

/// Encode `batch` and submit it to `service`.
pub fn submit<S: WriteService + ?Sized>(
    service: &S,
    batch: &Batch,
    credentials: Credentials,
) -> Result<WriteRowsResponse, TransportError> {
    let request = WriteRowsRequest::from_batch(batch, credentials)?;
    let response = service.write_rows(&request)?;
    debug!("{} -> {:?}", batch.identifiers(), response.code);
    Ok(response)
}
