//! Reading and writing lists and streams of records of one type.
//!
//! Stream helpers move data in chunks of [STREAM_CHUNK_RECORDS] records, so the record size
//! must be known up front: either the layout is fixed, or [LayoutHints::max_length] gives an
//! upper bound.

use std::io::{Read, Write};

use bytes::Bytes;
use log::debug;

use crate::{
    cache::SchemaCache,
    errors::BatchError,
    hints::LayoutHints,
    reader::RecordReader,
    record::RecordType,
    value::RecordValue,
    writer::{DEFAULT_CAPACITY, RecordWriter},
};

/// Records per chunk of the stream helpers.
pub const STREAM_CHUNK_RECORDS: usize = 1000;

/// Records the buffer of [Batch::write_all] is sized for before it grows.
const INITIAL_RECORDS: usize = 16;

/// Batch helpers bound to one [SchemaCache].
///
/// The free functions of this module use [SchemaCache::global].
#[derive(Clone, Copy)]
pub struct Batch<'c> {
    cache: &'c SchemaCache,
}

impl<'c> Batch<'c> {
    pub fn new(cache: &'c SchemaCache) -> Self {
        Batch { cache }
    }

    /// Size of one encoded record: the hinted maximum, else the fixed encoded length.
    pub fn record_size(
        &self,
        record_type: RecordType,
        hints: &dyn LayoutHints,
    ) -> Result<usize, BatchError> {
        if let Some(size) = hints.max_length() {
            return Ok(size);
        }
        self.cache
            .get_or_build(record_type)?
            .encoded_length()
            .ok_or(BatchError::UnknownSize {
                record: record_type.name(),
            })
    }

    /// Reads records until `data` is exhausted.
    pub fn read_all(
        &self,
        record_type: RecordType,
        data: &[u8],
        hints: &dyn LayoutHints,
    ) -> Result<Vec<RecordValue>, BatchError> {
        let mut reader = RecordReader::with_cache(data, self.cache);
        let mut records = Vec::new();
        while reader.more() {
            records.push(reader.read_with(record_type, hints)?);
        }
        debug!("read {} {} records", records.len(), record_type);
        Ok(records)
    }

    /// Encodes `records` back to back.
    ///
    /// The buffer starts at room for 16 records and doubles whenever the next record may not
    /// fit.
    pub fn write_all(
        &self,
        records: &[RecordValue],
        hints: &dyn LayoutHints,
    ) -> Result<Bytes, BatchError> {
        let size = records
            .first()
            .and_then(|first| self.record_size(first.record_type(), hints).ok());

        let capacity = size.map_or(DEFAULT_CAPACITY, |size| INITIAL_RECORDS * size);
        let mut writer = RecordWriter::with_cache(self.cache, capacity);
        for record in records {
            if let Some(size) = size
                && writer.capacity() - writer.len() < size
            {
                writer.extend(2 * writer.capacity().max(size));
            }
            writer.write_with(record, hints)?;
        }
        Ok(writer.into_bytes())
    }

    /// Reads every record of `input` and hands each to `handler`.
    ///
    /// Input is read in chunks of up to [STREAM_CHUNK_RECORDS] records. A record must not
    /// cross the end of a chunk, so variable length records need a [LayoutHints::max_length]
    /// that keeps every chunk on a record boundary.
    pub fn read_from<R, F>(
        &self,
        record_type: RecordType,
        mut input: R,
        hints: &dyn LayoutHints,
        mut handler: F,
    ) -> Result<(), BatchError>
    where
        R: Read,
        F: FnMut(RecordValue) -> Result<(), BatchError>,
    {
        let chunk_size = STREAM_CHUNK_RECORDS * self.record_size(record_type, hints)?;
        let mut chunk = vec![0u8; chunk_size];
        let mut total = 0;

        loop {
            let filled = fill(&mut input, &mut chunk)?;
            if filled == 0 {
                break;
            }

            let mut reader = RecordReader::with_cache(&chunk[..filled], self.cache);
            while reader.more() {
                handler(reader.read_with(record_type, hints)?)?;
                total += 1;
            }

            if filled < chunk_size {
                break;
            }
        }

        debug!("streamed {} {} records", total, record_type);
        Ok(())
    }

    /// Collects every record of `input`.
    pub fn read_all_from<R: Read>(
        &self,
        record_type: RecordType,
        input: R,
        hints: &dyn LayoutHints,
    ) -> Result<Vec<RecordValue>, BatchError> {
        let mut records = Vec::new();
        self.read_from(record_type, input, hints, |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Encodes `records` to `output`, [STREAM_CHUNK_RECORDS] at a time.
    pub fn write_all_to<W: Write>(
        &self,
        records: &[RecordValue],
        mut output: W,
        hints: &dyn LayoutHints,
    ) -> Result<(), BatchError> {
        for chunk in records.chunks(STREAM_CHUNK_RECORDS) {
            output.write_all(&self.write_all(chunk, hints)?)?;
        }
        output.flush()?;
        Ok(())
    }

    /// Reads records of type `from`, converts each with `convert` and encodes the results.
    pub fn copy_all<F>(
        &self,
        from: RecordType,
        data: &[u8],
        hints: &dyn LayoutHints,
        convert: F,
    ) -> Result<Bytes, BatchError>
    where
        F: FnMut(RecordValue) -> RecordValue,
    {
        let records: Vec<_> = self
            .read_all(from, data, hints)?
            .into_iter()
            .map(convert)
            .collect();
        self.write_all(&records, hints)
    }

    /// Streaming [Batch::copy_all]: converted records are written to `output` as they are read.
    pub fn copy_stream<R, W, F>(
        &self,
        from: RecordType,
        input: R,
        mut output: W,
        hints: &dyn LayoutHints,
        mut convert: F,
    ) -> Result<(), BatchError>
    where
        R: Read,
        W: Write,
        F: FnMut(RecordValue) -> RecordValue,
    {
        let mut pending = Vec::with_capacity(STREAM_CHUNK_RECORDS);
        self.read_from(from, input, hints, |record| {
            pending.push(convert(record));
            if pending.len() == STREAM_CHUNK_RECORDS {
                output.write_all(&self.write_all(&pending, hints)?)?;
                pending.clear();
            }
            Ok(())
        })?;
        self.write_all_to(&pending, output, hints)
    }
}

fn global() -> Batch<'static> {
    Batch::new(SchemaCache::global())
}

/// [Batch::record_size] on the global cache.
pub fn record_size(record_type: RecordType, hints: &dyn LayoutHints) -> Result<usize, BatchError> {
    global().record_size(record_type, hints)
}

/// [Batch::read_all] on the global cache.
pub fn read_all(
    record_type: RecordType,
    data: &[u8],
    hints: &dyn LayoutHints,
) -> Result<Vec<RecordValue>, BatchError> {
    global().read_all(record_type, data, hints)
}

/// [Batch::write_all] on the global cache.
pub fn write_all(records: &[RecordValue], hints: &dyn LayoutHints) -> Result<Bytes, BatchError> {
    global().write_all(records, hints)
}

/// [Batch::read_from] on the global cache.
pub fn read_from<R, F>(
    record_type: RecordType,
    input: R,
    hints: &dyn LayoutHints,
    handler: F,
) -> Result<(), BatchError>
where
    R: Read,
    F: FnMut(RecordValue) -> Result<(), BatchError>,
{
    global().read_from(record_type, input, hints, handler)
}

/// [Batch::read_all_from] on the global cache.
pub fn read_all_from<R: Read>(
    record_type: RecordType,
    input: R,
    hints: &dyn LayoutHints,
) -> Result<Vec<RecordValue>, BatchError> {
    global().read_all_from(record_type, input, hints)
}

/// [Batch::write_all_to] on the global cache.
pub fn write_all_to<W: Write>(
    records: &[RecordValue],
    output: W,
    hints: &dyn LayoutHints,
) -> Result<(), BatchError> {
    global().write_all_to(records, output, hints)
}

/// [Batch::copy_all] on the global cache.
pub fn copy_all<F>(
    from: RecordType,
    data: &[u8],
    hints: &dyn LayoutHints,
    convert: F,
) -> Result<Bytes, BatchError>
where
    F: FnMut(RecordValue) -> RecordValue,
{
    global().copy_all(from, data, hints, convert)
}

/// [Batch::copy_stream] on the global cache.
pub fn copy_stream<R, W, F>(
    from: RecordType,
    input: R,
    output: W,
    hints: &dyn LayoutHints,
    convert: F,
) -> Result<(), BatchError>
where
    R: Read,
    W: Write,
    F: FnMut(RecordValue) -> RecordValue,
{
    global().copy_stream(from, input, output, hints, convert)
}

/// Reads until `buf` is full or the input ends. Returns the number of bytes read.
fn fill<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
