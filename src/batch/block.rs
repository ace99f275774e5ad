use std::io::Cursor;

use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use super::{Batch, BatchError};

/// Size of the little-endian `u32` length prefix.
pub const BLOCK_HEADER_LEN: usize = 4;

/// Encode a batch as a length-prefixed Arrow IPC stream.
///
/// Layout: `u32` (little-endian) payload length, then the IPC stream carrying
/// exactly one record batch.
pub fn encode_block(batch: &Batch) -> Result<Vec<u8>, BatchError> {
    let record = batch.to_record_batch()?;

    let mut payload = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut payload, &record.schema())?;
        writer.write(&record)?;
        writer.finish()?;
    }

    let len = u32::try_from(payload.len()).map_err(|_| {
        BatchError::InvalidBlock(format!("payload of {} bytes exceeds u32 prefix", payload.len()))
    })?;

    let mut block = Vec::with_capacity(BLOCK_HEADER_LEN + payload.len());
    block.extend_from_slice(&len.to_le_bytes());
    block.extend_from_slice(&payload);
    Ok(block)
}

/// Decode a block produced by [`encode_block`] back into a record batch.
pub fn decode_block(block: &[u8]) -> Result<RecordBatch, BatchError> {
    if block.len() < BLOCK_HEADER_LEN {
        return Err(BatchError::InvalidBlock(format!(
            "block of {} bytes is shorter than its header",
            block.len()
        )));
    }
    let (header, payload) = block.split_at(BLOCK_HEADER_LEN);
    let mut prefix = [0u8; BLOCK_HEADER_LEN];
    prefix.copy_from_slice(header);
    let declared = u32::from_le_bytes(prefix) as usize;
    if declared != payload.len() {
        return Err(BatchError::InvalidBlock(format!(
            "header declares {} bytes, payload has {}",
            declared,
            payload.len()
        )));
    }

    let mut reader = StreamReader::try_new(Cursor::new(payload), None)?;
    match reader.next() {
        Some(record) => Ok(record?),
        None => Err(BatchError::InvalidBlock("stream holds no record batch".to_string())),
    }
}

/// Decode a sequence of concatenated blocks.
pub fn decode_blocks(mut data: &[u8]) -> Result<Vec<RecordBatch>, BatchError> {
    let mut records = Vec::new();
    while !data.is_empty() {
        if data.len() < BLOCK_HEADER_LEN {
            return Err(BatchError::InvalidBlock(format!(
                "{} trailing bytes after block {}",
                data.len(),
                records.len()
            )));
        }
        let mut prefix = [0u8; BLOCK_HEADER_LEN];
        prefix.copy_from_slice(&data[..BLOCK_HEADER_LEN]);
        let end = BLOCK_HEADER_LEN + u32::from_le_bytes(prefix) as usize;
        if end > data.len() {
            return Err(BatchError::InvalidBlock(format!(
                "block {} declares {} bytes, {} remain",
                records.len(),
                end - BLOCK_HEADER_LEN,
                data.len() - BLOCK_HEADER_LEN
            )));
        }
        let (block, rest) = data.split_at(end);
        records.push(decode_block(block)?);
        data = rest;
    }
    Ok(records)
}
