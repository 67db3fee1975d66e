//! Encoding records into a growable buffer.

use bytes::{BufMut, Bytes, BytesMut};
use log::{Level, debug, log_enabled, trace};

use crate::{
    bits::{BitAccumulator, to_hex},
    cache::SchemaCache,
    codec::{bcd, time, vax},
    compiled::{CompiledField, CompiledRecord},
    errors::{FieldError, WriteError},
    field::FieldType,
    hints::{LayoutHints, NoHints, resolve_length},
    record::ByteOrder,
    value::{RecordValue, Value},
};

/// Initial buffer size of [RecordWriter::new].
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Appends encoded records to an in-memory buffer.
///
/// The concrete layout is taken from each value's record type, so writing a decoded tagged
/// union reproduces the variant it was read as.
pub struct RecordWriter<'c> {
    buf: BytesMut,
    cache: &'c SchemaCache,
}

impl RecordWriter<'static> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_cache(SchemaCache::global(), capacity)
    }
}

impl Default for RecordWriter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> RecordWriter<'c> {
    pub fn with_cache(cache: &'c SchemaCache, capacity: usize) -> Self {
        RecordWriter {
            buf: BytesMut::with_capacity(capacity),
            cache,
        }
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        if log_enabled!(Level::Trace) {
            trace!("writer output: {}", to_hex(&self.buf));
        }
        self.buf.freeze()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Grows the buffer to hold at least `new_capacity` bytes. Written bytes are kept.
    pub fn extend(&mut self, new_capacity: usize) {
        if new_capacity > self.buf.capacity() {
            debug!(
                "growing writer buffer from {} to {} bytes",
                self.buf.capacity(),
                new_capacity
            );
            self.buf.reserve(new_capacity - self.buf.len());
        }
    }

    pub fn write(&mut self, record: &RecordValue) -> Result<(), WriteError> {
        self.write_with(record, &NoHints)
    }

    /// Writes `record` using `hints`. On error the buffer is left as it was before the call.
    pub fn write_with(
        &mut self,
        record: &RecordValue,
        hints: &dyn LayoutHints,
    ) -> Result<(), WriteError> {
        let start = self.buf.len();
        let result = self.write_record(record, hints);
        if result.is_err() {
            self.buf.truncate(start);
        }
        result
    }

    fn write_record(
        &mut self,
        record: &RecordValue,
        hints: &dyn LayoutHints,
    ) -> Result<(), WriteError> {
        let layout = self.cache.get_or_build(record.record_type())?;
        debug!("writing {} at offset {}", layout.record_type, self.buf.len());

        let mut bits = BitAccumulator::new();
        let mut selector_pad = 0;

        for field in &layout.fields {
            if field.field_type != FieldType::Bit {
                self.flush_bits(&mut bits);
                let pad = layout.alignment.pad(self.buf.len(), field.natural());
                self.buf.put_bytes(0, pad);
            }

            let value = record
                .get(&field.name)
                .ok_or_else(|| field_error(&layout, field, FieldError::MissingField))?;
            trace!("{}.{} = {:?}", layout.record_type, field.name, value);

            match field.elements {
                None => self.write_element(&layout, field, value, record, hints, &mut bits)?,
                Some(declared) => {
                    let count = hints.elements(record, field.index).unwrap_or(declared);
                    let values = value.as_array().ok_or_else(|| {
                        field_error(&layout, field, mismatch("Array", value))
                    })?;
                    if values.len() != count {
                        let source = FieldError::LengthMismatch {
                            expected: count,
                            found: values.len(),
                        };
                        return Err(field_error(&layout, field, source));
                    }
                    for element in values {
                        self.write_element(&layout, field, element, record, hints, &mut bits)?;
                    }
                }
            }

            if let Some(selector) = &field.selector {
                hints
                    .convert_selector(value)
                    .or_else(|| value.as_i64())
                    .and_then(|discriminant| selector.variant(discriminant))
                    .ok_or_else(|| {
                        let source = FieldError::InvalidSelector {
                            value: format!("{value:?}"),
                        };
                        field_error(&layout, field, source)
                    })?;
                // A base that is not one of its variants is padded to the full span.
                if selector.pad {
                    selector_pad += selector
                        .pad_for(layout.record_type)
                        .unwrap_or(selector.span);
                }
            }
        }

        self.flush_bits(&mut bits);
        self.buf.put_bytes(0, selector_pad);
        if layout.end_pad {
            let pad = layout.trailing_pad(self.buf.len());
            self.buf.put_bytes(0, pad);
        }

        Ok(())
    }

    fn write_element(
        &mut self,
        layout: &CompiledRecord,
        field: &CompiledField,
        value: &Value,
        record: &RecordValue,
        hints: &dyn LayoutHints,
        bits: &mut BitAccumulator,
    ) -> Result<(), WriteError> {
        if field.field_type == FieldType::Struct {
            let nested = value
                .as_record()
                .ok_or_else(|| field_error(layout, field, mismatch("Record", value)))?;
            let nested_hints = hints.nested(record, field.index).unwrap_or(&NoHints);
            return self.write_record(nested, nested_hints);
        }

        self.write_value(layout.byte_order, field, value, record, hints, bits)
            .map_err(|e| field_error(layout, field, e))
    }

    fn write_value(
        &mut self,
        order: ByteOrder,
        field: &CompiledField,
        value: &Value,
        record: &RecordValue,
        hints: &dyn LayoutHints,
        bits: &mut BitAccumulator,
    ) -> Result<(), FieldError> {
        let length = if field.field_type.has_length_override() {
            resolve_length(hints, record, field.index, field.length)
        } else {
            field.length
        };

        match field.field_type {
            FieldType::Int1 => self.put(order, signed(value, 8)? as u64, 1),
            FieldType::Int2 => self.put(order, signed(value, 16)? as u64, 2),
            FieldType::Int4 => self.put(order, signed(value, 32)? as u64, 4),
            FieldType::Int8 => self.put(order, signed(value, 64)? as u64, 8),
            FieldType::UInt1 => self.put(order, unsigned(value, 8)?, 1),
            FieldType::UInt2 => self.put(order, unsigned(value, 16)?, 2),
            FieldType::UInt4 => self.put(order, unsigned(value, 32)?, 4),
            FieldType::UInt8 => self.put(order, unsigned(value, 64)?, 8),
            FieldType::Fp4 => match value {
                Value::Float(v) => self.put(order, v.to_bits() as u64, 4),
                _ => return Err(mismatch("Float", value)),
            },
            FieldType::Fp8 => match value {
                Value::Double(v) => self.put(order, v.to_bits(), 8),
                _ => return Err(mismatch("Double", value)),
            },
            FieldType::IntX => {
                if !(1..=7).contains(&length) {
                    return Err(FieldError::InvalidLength { length });
                }
                self.put(order, unsigned(value, 8 * length as u32)?, length);
            }
            FieldType::FixStr => {
                let bytes = field.encoding.encode(text(value)?)?;
                if bytes.len() != length {
                    return Err(FieldError::LengthMismatch {
                        expected: length,
                        found: bytes.len(),
                    });
                }
                self.buf.put_slice(&bytes);
            }
            FieldType::FixStrNulTerm => {
                let bytes = field.encoding.encode(text(value)?)?;
                if bytes.len() > length {
                    return Err(FieldError::LengthMismatch {
                        expected: length,
                        found: bytes.len(),
                    });
                }
                self.buf.put_slice(&bytes);
                self.buf.put_bytes(0, length - bytes.len());
            }
            FieldType::VarStr => {
                let bytes = field.encoding.encode(text(value)?)?;
                let limit = field.prefix.max_payload();
                if bytes.len() > limit {
                    return Err(FieldError::LengthLimit {
                        limit,
                        found: bytes.len(),
                    });
                }
                self.put(order, bytes.len() as u64, field.prefix.bytes());
                self.buf.put_slice(&bytes);
            }
            FieldType::VarFixStr => {
                let bytes = field.encoding.encode(text(value)?)?;
                let limit = field.prefix.max_payload();
                if bytes.len() > limit {
                    return Err(FieldError::LengthLimit {
                        limit,
                        found: bytes.len(),
                    });
                }
                if bytes.len() > field.length {
                    return Err(FieldError::LengthMismatch {
                        expected: field.length,
                        found: bytes.len(),
                    });
                }
                self.put(order, bytes.len() as u64, field.prefix.bytes());
                self.buf.put_slice(&bytes);
                self.buf.put_bytes(0, field.length - bytes.len());
            }
            FieldType::RemStr => {
                let bytes = field.encoding.encode(text(value)?)?;
                self.buf.put_slice(&bytes);
            }
            FieldType::Boolean => match value {
                Value::Bool(flag) => {
                    self.buf.put_u8(u8::from(*flag));
                    self.buf.put_bytes(0, length - 1);
                }
                _ => return Err(mismatch("Bool", value)),
            },
            FieldType::Bit => {
                bits.put(unsigned(value, length as u32)?, length as u32);
                while let Some(byte) = bits.pop_byte() {
                    self.buf.put_u8(byte);
                }
            }
            FieldType::JavaTime => {
                let millis = time::encode_java(timestamp(value)?);
                self.put(order, millis as u64, 8);
            }
            FieldType::UnixTime => {
                let seconds = time::encode_unix(timestamp(value)?)?;
                self.put(order, seconds as u32 as u64, 4);
            }
            FieldType::VmsTime => {
                let ticks = time::encode_vms(timestamp(value)?)?;
                self.put(order, ticks as u64, 8);
            }
            FieldType::PackedBcd => {
                let bytes = bcd::encode_packed(decimal(value)?, field.decimals, length)?;
                self.buf.put_slice(&bytes);
            }
            FieldType::ZonedBcd => {
                let bytes = bcd::encode_zoned(decimal(value)?, field.zone, field.decimals, length)?;
                self.buf.put_slice(&bytes);
            }
            FieldType::VaxFp4 => match value {
                Value::Float(v) => self.put(order, vax::ieee_to_f(*v)? as u64, 4),
                _ => return Err(mismatch("Float", value)),
            },
            FieldType::VaxFp8 => match value {
                Value::Double(v) => self.put(order, vax::ieee_to_g(*v)?, 8),
                _ => return Err(mismatch("Double", value)),
            },
            FieldType::Struct => return Err(mismatch("Record", value)),
        }

        Ok(())
    }

    /// Writes the low `width` bytes of `value`.
    fn put(&mut self, order: ByteOrder, value: u64, width: usize) {
        match order {
            ByteOrder::Little => self.buf.put_uint_le(value, width),
            ByteOrder::Big => self.buf.put_uint(value, width),
        }
    }

    fn flush_bits(&mut self, bits: &mut BitAccumulator) {
        if let Some(byte) = bits.flush() {
            self.buf.put_u8(byte);
        }
    }
}

fn field_error(layout: &CompiledRecord, field: &CompiledField, source: FieldError) -> WriteError {
    WriteError::Field {
        record: layout.record_type.name(),
        field: field.name.clone(),
        field_type: field.field_type,
        source,
    }
}

fn mismatch(expected: &'static str, found: &Value) -> FieldError {
    FieldError::Conversion {
        expected,
        found: found.kind().to_string(),
    }
}

/// Integer that fits in `bits` as two's complement.
fn signed(value: &Value, bits: u32) -> Result<i64, FieldError> {
    let v = match *value {
        Value::Int(v) => v,
        Value::UInt(v) => i64::try_from(v).map_err(|_| out_of_range(value))?,
        _ => return Err(mismatch("Int", value)),
    };
    let min = i64::MIN >> (64 - bits);
    let max = i64::MAX >> (64 - bits);
    if v < min || v > max {
        return Err(out_of_range(value));
    }
    Ok(v)
}

/// Non-negative integer that fits in `bits`.
fn unsigned(value: &Value, bits: u32) -> Result<u64, FieldError> {
    let v = match *value {
        Value::UInt(v) => v,
        Value::Int(v) => u64::try_from(v).map_err(|_| out_of_range(value))?,
        _ => return Err(mismatch("UInt", value)),
    };
    if bits < 64 && v >> bits != 0 {
        return Err(out_of_range(value));
    }
    Ok(v)
}

fn out_of_range(value: &Value) -> FieldError {
    FieldError::OutOfRange {
        value: format!("{value:?}"),
    }
}

fn text(value: &Value) -> Result<&str, FieldError> {
    value.as_str().ok_or_else(|| mismatch("Str", value))
}

fn timestamp(value: &Value) -> Result<&chrono::DateTime<chrono::Utc>, FieldError> {
    match value {
        Value::Time(t) => Ok(t),
        _ => Err(mismatch("Time", value)),
    }
}

fn decimal(value: &Value) -> Result<&rust_decimal::Decimal, FieldError> {
    match value {
        Value::Decimal(d) => Ok(d),
        _ => Err(mismatch("Decimal", value)),
    }
}
