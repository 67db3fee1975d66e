//! Decoding records from a byte slice.

use log::{Level, debug, log_enabled, trace};

use crate::{
    bits::{BitAccumulator, to_hex},
    cache::SchemaCache,
    codec::{bcd, time, vax},
    compiled::{CompiledField, CompiledRecord},
    errors::{FieldError, ReadError},
    field::FieldType,
    hints::{LayoutHints, NoHints, resolve_length},
    record::{ByteOrder, RecordType},
    value::{RecordValue, Value},
};

/// Reads consecutive records from a byte slice.
///
/// ```
/// use recordcraft::field::{FieldDecl, FieldType};
/// use recordcraft::reader::RecordReader;
/// use recordcraft::record::{RecordDecl, RecordType};
/// use recordcraft::value::Value;
///
/// const PAIR: RecordType = RecordType::new("doc::Pair", || {
///     RecordDecl::new()
///         .field(FieldDecl::new(0, "a", FieldType::Int2))
///         .field(FieldDecl::new(1, "b", FieldType::UInt1))
/// });
///
/// let mut reader = RecordReader::new(&[0xFE, 0xFF, 0x07]);
/// let pair = reader.read(PAIR).unwrap();
/// assert_eq!(pair.get("a"), Some(&Value::Int(-2)));
/// assert_eq!(pair.get("b"), Some(&Value::UInt(7)));
/// assert!(!reader.more());
/// ```
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    cache: &'a SchemaCache,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_cache(data, SchemaCache::global())
    }

    pub fn with_cache(data: &'a [u8], cache: &'a SchemaCache) -> Self {
        if log_enabled!(Level::Trace) {
            trace!("reader input: {}", to_hex(data));
        }
        RecordReader {
            data,
            pos: 0,
            cache,
        }
    }

    /// Whether any bytes are left.
    pub fn more(&self) -> bool {
        self.pos < self.data.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read(&mut self, record_type: RecordType) -> Result<RecordValue, ReadError> {
        self.read_with(record_type, &NoHints)
    }

    /// Reads one record of `record_type`. A selector field may resolve the record to one of
    /// its variants, in which case the returned value has the variant's type.
    pub fn read_with(
        &mut self,
        record_type: RecordType,
        hints: &dyn LayoutHints,
    ) -> Result<RecordValue, ReadError> {
        let layout = self.cache.get_or_build(record_type)?;
        let start = self.pos;
        debug!("reading {} at offset {}", record_type, start);

        let mut record = RecordValue::new(record_type);
        let mut bits = BitAccumulator::new();
        let mut selector_pad = 0;

        for field in &layout.fields {
            if field.field_type != FieldType::Bit {
                bits.clear();
                let pad = layout.alignment.pad(self.pos, field.natural());
                self.skip(pad).map_err(|e| field_error(&layout, field, e))?;
            }

            let value = match field.elements {
                None => self.read_element(&layout, field, &record, hints, &mut bits)?,
                Some(declared) => {
                    let count = hints.elements(&record, field.index).unwrap_or(declared);
                    let mut values = Vec::with_capacity(count);
                    for _ in 0..count {
                        values.push(self.read_element(&layout, field, &record, hints, &mut bits)?);
                    }
                    Value::Array(values)
                }
            };
            trace!("{}.{} = {:?}", record_type, field.name, value);

            if let Some(selector) = &field.selector {
                let variant = hints
                    .convert_selector(&value)
                    .or_else(|| value.as_i64())
                    .and_then(|discriminant| selector.variant(discriminant))
                    .ok_or_else(|| {
                        field_error(
                            &layout,
                            field,
                            FieldError::InvalidSelector {
                                value: format!("{value:?}"),
                            },
                        )
                    })?;

                if variant.record_type != record_type {
                    debug!(
                        "{}.{} selects {}, restarting at offset {}",
                        record_type, field.name, variant.record_type, start
                    );
                    self.pos = start;
                    return self.read_with(variant.record_type, hints);
                }
                selector_pad += variant.pad;
            }

            record.push(&field.name, value);
        }

        self.skip_padding(&layout, selector_pad)?;
        if layout.end_pad {
            let pad = layout.trailing_pad(self.pos);
            self.skip_padding(&layout, pad)?;
        }

        Ok(record)
    }

    fn read_element(
        &mut self,
        layout: &CompiledRecord,
        field: &CompiledField,
        record: &RecordValue,
        hints: &dyn LayoutHints,
        bits: &mut BitAccumulator,
    ) -> Result<Value, ReadError> {
        if let (FieldType::Struct, Some(nested)) = (field.field_type, field.record) {
            let nested_hints = hints.nested(record, field.index).unwrap_or(&NoHints);
            return self.read_with(nested, nested_hints).map(Value::Record);
        }

        self.read_value(layout.byte_order, field, record, hints, bits)
            .map_err(|e| field_error(layout, field, e))
    }

    fn read_value(
        &mut self,
        order: ByteOrder,
        field: &CompiledField,
        record: &RecordValue,
        hints: &dyn LayoutHints,
        bits: &mut BitAccumulator,
    ) -> Result<Value, FieldError> {
        let length = if field.field_type.has_length_override() {
            resolve_length(hints, record, field.index, field.length)
        } else {
            field.length
        };

        let value = match field.field_type {
            FieldType::Int1 => Value::Int(self.int(order, 1)?),
            FieldType::Int2 => Value::Int(self.int(order, 2)?),
            FieldType::Int4 => Value::Int(self.int(order, 4)?),
            FieldType::Int8 => Value::Int(self.int(order, 8)?),
            FieldType::UInt1 => Value::UInt(self.uint(order, 1)?),
            FieldType::UInt2 => Value::UInt(self.uint(order, 2)?),
            FieldType::UInt4 => Value::UInt(self.uint(order, 4)?),
            FieldType::UInt8 => Value::UInt(self.uint(order, 8)?),
            FieldType::Fp4 => Value::Float(f32::from_bits(self.uint(order, 4)? as u32)),
            FieldType::Fp8 => Value::Double(f64::from_bits(self.uint(order, 8)?)),
            FieldType::IntX => {
                if !(1..=7).contains(&length) {
                    return Err(FieldError::InvalidLength { length });
                }
                Value::UInt(self.uint(order, length)?)
            }
            FieldType::FixStr => Value::Str(field.encoding.decode(self.take(length)?)?),
            FieldType::FixStrNulTerm => {
                let bytes = self.take(length)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Value::Str(field.encoding.decode(&bytes[..end])?)
            }
            FieldType::VarStr => {
                let n = self.uint(order, field.prefix.bytes())? as usize;
                Value::Str(field.encoding.decode(self.take(n)?)?)
            }
            FieldType::VarFixStr => {
                let n = self.uint(order, field.prefix.bytes())? as usize;
                if n > field.length {
                    return Err(FieldError::InvalidLength { length: n });
                }
                let bytes = self.take(field.length)?;
                Value::Str(field.encoding.decode(&bytes[..n])?)
            }
            FieldType::RemStr => {
                let rest = self.take(self.remaining())?;
                Value::Str(field.encoding.decode(rest)?)
            }
            FieldType::Boolean => Value::Bool(self.take(length)?[0] != 0),
            FieldType::Bit => {
                let width = length as u32;
                while bits.available() < width {
                    bits.push_byte(self.take(1)?[0]);
                }
                Value::UInt(bits.take(width))
            }
            FieldType::JavaTime => Value::Time(time::decode_java(self.uint(order, 8)? as i64)?),
            FieldType::UnixTime => Value::Time(time::decode_unix(self.uint(order, 4)? as u32 as i32)?),
            FieldType::VmsTime => Value::Time(time::decode_vms(self.uint(order, 8)? as i64)?),
            FieldType::PackedBcd => {
                Value::Decimal(bcd::decode_packed(self.take(length)?, field.decimals)?)
            }
            FieldType::ZonedBcd => Value::Decimal(bcd::decode_zoned(
                self.take(length)?,
                field.zone,
                field.decimals,
            )?),
            FieldType::VaxFp4 => Value::Float(vax::f_to_ieee(self.uint(order, 4)? as u32)?),
            FieldType::VaxFp8 => Value::Double(vax::g_to_ieee(self.uint(order, 8)?)?),
            FieldType::Struct => return Err(FieldError::MissingField),
        };

        Ok(value)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FieldError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(FieldError::NotEnoughBytes {
                needed: n,
                remaining,
            });
        }
        let data = self.data;
        let bytes = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Unsigned integer of `width` bytes (at most 8).
    fn uint(&mut self, order: ByteOrder, width: usize) -> Result<u64, FieldError> {
        let bytes = self.take(width)?;
        let fold = |acc: u64, &b: &u8| acc << 8 | b as u64;
        Ok(match order {
            ByteOrder::Little => bytes.iter().rev().fold(0, fold),
            ByteOrder::Big => bytes.iter().fold(0, fold),
        })
    }

    /// Two's complement integer of `width` bytes (at most 8).
    fn int(&mut self, order: ByteOrder, width: usize) -> Result<i64, FieldError> {
        let unused = 64 - 8 * width as u32;
        Ok((self.uint(order, width)? << unused) as i64 >> unused)
    }

    fn skip(&mut self, n: usize) -> Result<(), FieldError> {
        if n > 0 {
            self.take(n)?;
            trace!("skipped {} padding bytes", n);
        }
        Ok(())
    }

    fn skip_padding(&mut self, layout: &CompiledRecord, n: usize) -> Result<(), ReadError> {
        self.skip(n).map_err(|_| ReadError::Truncated {
            record: layout.record_type.name(),
            needed: n,
            remaining: self.remaining(),
        })
    }
}

fn field_error(layout: &CompiledRecord, field: &CompiledField, source: FieldError) -> ReadError {
    ReadError::Field {
        record: layout.record_type.name(),
        field: field.name.clone(),
        field_type: field.field_type,
        source,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::*;

    fn int(v: i64) -> Value {
        Value::Int(v)
    }

    #[test]
    fn test_read_simple() {
        let bytes = data_bytes();
        let mut reader = RecordReader::new(&bytes);
        let data = reader.read(DATA).unwrap();
        assert_eq!(data.record_type(), DATA);
        assert_eq!(data.get("iv"), Some(&int(258)));
        assert_eq!(data.get("xv"), Some(&Value::Double(123.456)));
        assert_eq!(data.get("sv"), Some(&Value::from("ABC     ")));
        assert!(!reader.more());
    }

    #[test]
    fn test_read_multi_selects_variants() {
        let bytes = multi_bytes(false);
        let mut reader = RecordReader::new(&bytes);

        let first = reader.read(SUPER).unwrap();
        assert_eq!(first.record_type(), SUB_ONE);
        assert_eq!(first.get("id"), Some(&int(1)));
        assert_eq!(first.get("typ"), Some(&int(1)));
        assert_eq!(first.get("x"), Some(&Value::Double(123.456)));

        let second = reader.read(SUPER).unwrap();
        assert_eq!(second.record_type(), SUB_TWO);
        assert_eq!(second.get("id"), Some(&int(3)));
        assert_eq!(second.get("s"), Some(&Value::from("ABC         ")));
        assert!(!reader.more());
    }

    #[test]
    fn test_read_multi_as_variants() {
        let bytes = multi_bytes(false);
        let mut reader = RecordReader::new(&bytes);
        assert_eq!(reader.read(SUB_ONE).unwrap().record_type(), SUB_ONE);
        assert_eq!(reader.read(SUB_TWO).unwrap().record_type(), SUB_TWO);
        assert!(!reader.more());
    }

    #[test]
    fn test_read_multi_padded() {
        let bytes = multi_bytes(true);
        let mut reader = RecordReader::new(&bytes);
        let first = reader.read(SUPER_PAD).unwrap();
        assert_eq!(first.record_type(), SUB_ONE_PAD);
        assert_eq!(reader.position(), 20);
        let second = reader.read(SUPER_PAD).unwrap();
        assert_eq!(second.record_type(), SUB_TWO_PAD);
        assert_eq!(second.get("s"), Some(&Value::from("ABC         ")));
        assert!(!reader.more());
    }

    struct ParseSelector;

    impl LayoutHints for ParseSelector {
        fn convert_selector(&self, value: &Value) -> Option<i64> {
            value.as_str()?.parse().ok()
        }
    }

    #[test]
    fn test_read_converted_selector() {
        let bytes = [0x31, 0x41, 0x32, 0x42, 0x42];
        let mut reader = RecordReader::new(&bytes);

        let first = reader.read_with(SUPER_CONVERT, &ParseSelector).unwrap();
        assert_eq!(first.record_type(), SUB_ONE_CONVERT);
        assert_eq!(first.get("typ"), Some(&Value::from("1")));
        assert_eq!(first.get("a"), Some(&Value::from("A")));

        let second = reader.read_with(SUPER_CONVERT, &ParseSelector).unwrap();
        assert_eq!(second.record_type(), SUB_TWO_CONVERT);
        assert_eq!(second.get("b"), Some(&Value::from("BB")));
        assert!(!reader.more());
    }

    #[test]
    fn test_unconverted_text_selector_is_invalid() {
        let bytes = [0x31, 0x41];
        let err = RecordReader::new(&bytes).read(SUPER_CONVERT).unwrap_err();
        assert_eq!(
            err.field_error(),
            Some(&FieldError::InvalidSelector {
                value: "Str(\"1\")".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_discriminant() {
        let mut bytes = multi_bytes(false);
        bytes[4] = 9;
        let err = RecordReader::new(&bytes).read(SUPER).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Field {
                record: "SuperData",
                source: FieldError::InvalidSelector { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_read_bits() {
        let mut reader = RecordReader::new(&BIT_BYTES);
        let bits = reader.read(BIT_DATA).unwrap();
        let values: Vec<_> = bits.fields().iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(
            values,
            vec![
                int(1),
                Value::UInt(2),
                Value::UInt(3),
                int(4),
                Value::UInt(1),
                Value::UInt(2)
            ]
        );
        assert!(!reader.more());
    }

    #[test]
    fn test_read_strings() {
        let mut reader = RecordReader::new(&STRING_BYTES);
        let strings = reader.read(STRING_DATA).unwrap();
        assert_eq!(strings.get("s1"), Some(&Value::from("ABCD")));
        for name in ["s2", "s3", "s4", "s5"] {
            assert_eq!(strings.get(name), Some(&Value::from("AB")), "{name}");
        }
        assert!(!reader.more());
    }

    struct GrowingLength;

    impl LayoutHints for GrowingLength {
        fn length(&self, _record: &RecordValue, index: usize) -> Option<usize> {
            Some(index + 1)
        }
    }

    #[test]
    fn test_read_hinted_lengths() {
        let bytes = b"AABABCABCD";
        let mut reader = RecordReader::new(bytes);
        let strings = reader.read_with(VARIABLE_DATA, &GrowingLength).unwrap();
        assert_eq!(strings.get("s1"), Some(&Value::from("A")));
        assert_eq!(strings.get("s4"), Some(&Value::from("ABCD")));
        assert!(!reader.more());
    }

    struct Elements(usize);

    impl LayoutHints for Elements {
        fn elements(&self, _record: &RecordValue, _index: usize) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn test_read_arrays() {
        let bytes = array_bytes(3);
        let arrays = RecordReader::new(&bytes).read(ARRAY_DATA).unwrap();
        assert_eq!(
            arrays.get("iv"),
            Some(&Value::Array(vec![int(258), int(259), int(260)]))
        );

        let bytes = array_bytes(4);
        let mut reader = RecordReader::new(&bytes);
        let arrays = reader.read_with(VAR_ARRAY_DATA, &Elements(4)).unwrap();
        assert_eq!(arrays.get("xv").and_then(Value::as_array).map(<[Value]>::len), Some(4));
        assert!(!reader.more());

        // The hint also overrides a declared count.
        let mut reader = RecordReader::new(&bytes);
        reader.read_with(ARRAY_DATA, &Elements(4)).unwrap();
        assert!(!reader.more());
    }

    #[test]
    fn test_read_nested() {
        let bytes: Vec<u8> = (1..=5).flat_map(|i| [i, 0, 0, 0]).collect();
        let main = RecordReader::new(&bytes).read(MAIN_DATA).unwrap();
        let nested = main.get("s").and_then(Value::as_record).unwrap();
        assert_eq!(nested.record_type(), FIELD_DATA);
        assert_eq!(nested.get("i4"), Some(&int(4)));
        assert_eq!(main.get("i5"), Some(&int(5)));
    }

    #[test]
    fn test_read_alignment() {
        let packed = [1, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let natural = [1, 0, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let mut align8 = [0u8; 32];
        for (i, v) in [1, 2, 3, 4].into_iter().enumerate() {
            align8[i * 8] = v;
        }

        for (record_type, bytes) in [
            (ALIGN_PACKED, &packed[..]),
            (ALIGN_NATURAL, &natural[..]),
            (ALIGN_8, &align8[..]),
        ] {
            let mut reader = RecordReader::new(bytes);
            let record = reader.read(record_type).unwrap();
            assert_eq!(record.get("i8"), Some(&int(4)), "{record_type}");
            assert!(!reader.more(), "{record_type}");
        }
    }

    #[test]
    fn test_read_end_pad() {
        let bytes = [0x02, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let mut reader = RecordReader::new(&bytes);
        let record = reader.read(END_PAD_ALIGN4).unwrap();
        assert_eq!(record.get("bv"), Some(&int(1)));
        assert!(!reader.more());

        let mut reader = RecordReader::new(&bytes);
        reader.read(END_PAD_NONE).unwrap();
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_truncated_end_pad() {
        let bytes = [0x02, 0x01, 0x00, 0x00, 0x01, 0x00];
        assert_eq!(
            RecordReader::new(&bytes).read(END_PAD_ALIGN4).unwrap_err(),
            ReadError::Truncated {
                record: "EndPadAlign4",
                needed: 3,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_read_time() {
        let mut bytes = vec![0x01, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&35_067_168_000_000_000i64.to_le_bytes());
        bytes.extend_from_slice(&[0x01, 0, 0, 0]);
        let times = RecordReader::new(&bytes).read(TIME_DATA).unwrap();
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            times.get("t1"),
            Some(&Value::Time(epoch + chrono::Duration::milliseconds(1)))
        );
        assert_eq!(times.get("t2"), Some(&Value::Time(epoch)));
        assert_eq!(
            times.get("t3"),
            Some(&Value::Time(epoch + chrono::Duration::seconds(1)))
        );
    }

    #[test]
    fn test_read_bcd() {
        let bytes = [0x12, 0x34, 0x56, 0x7D, 0xF1, 0xF2, 0xF7, 0xF9, 0xF5, 0xC0];
        let bcd = RecordReader::new(&bytes).read(BCD_DATA).unwrap();
        assert_eq!(bcd.get("v1"), Some(&Value::Decimal(Decimal::new(-1234567, 2))));
        assert_eq!(bcd.get("v2"), Some(&Value::Decimal(Decimal::new(127950, 2))));
    }

    #[test]
    fn test_read_vax() {
        let bytes = [
            0x45, 0x42, 0xA4, 0x70, 0x7E, 0x40, 0x2F, 0xDD, 0x9F, 0x1A, 0x77, 0xBE,
        ];
        let vax = RecordReader::new(&bytes).read(VAX_DATA).unwrap();
        assert_eq!(vax.get("v1"), Some(&Value::Float(f32::from_bits(0x414570A4))));
        assert_eq!(vax.get("v2"), Some(&Value::Double(123.456)));
    }

    #[test]
    fn test_read_unsigned_and_general() {
        let bytes = [0xFF; 7];
        let unsigned = RecordReader::new(&bytes).read(UNSIGNED_DATA).unwrap();
        assert_eq!(unsigned.get("ui4v"), Some(&Value::UInt(4_294_967_295)));

        let bytes = [0x03, 0x02, 0x01, 0x05, 0x04, 0x03, 0x02, 0x01];
        let general = RecordReader::new(&bytes).read(GENERAL_INT_DATA).unwrap();
        assert_eq!(general.get("v1"), Some(&Value::UInt(0x01_0203)));
        assert_eq!(general.get("v2"), Some(&Value::UInt(0x01_0203_0405)));
    }

    #[test]
    fn test_read_boolean_big_endian_and_rest() {
        let bytes = [0x01, 0, 0, 0, 0, 0, 0x01];
        let flags = RecordReader::new(&bytes).read(BOOLEAN_DATA).unwrap();
        assert_eq!(flags.get("b2"), Some(&Value::Bool(false)));
        assert_eq!(flags.get("b3"), Some(&Value::Bool(true)));

        let big = RecordReader::new(&[0, 0, 1, 2]).read(BIG_ENDIAN_DATA).unwrap();
        assert_eq!(big.get("iv"), Some(&int(258)));

        let mut reader = RecordReader::new(&[7, 0, 0, 0, b'x', b'y']);
        let rest = reader.read(REMAINING_DATA).unwrap();
        assert_eq!(rest.get("rest"), Some(&Value::from("xy")));
        assert!(!reader.more());
    }

    #[test]
    fn test_not_enough_bytes() {
        let err = RecordReader::new(&[]).read(DATA).unwrap_err();
        assert_eq!(
            err,
            ReadError::Field {
                record: "Data",
                field: "iv".to_string(),
                field_type: FieldType::Int4,
                source: FieldError::NotEnoughBytes {
                    needed: 4,
                    remaining: 0
                },
            }
        );
    }

    #[test]
    fn test_schema_error_surfaces() {
        const BROKEN: RecordType = RecordType::new("reader::Broken", || {
            crate::record::RecordDecl::new()
                .field(crate::field::FieldDecl::new(1, "iv", FieldType::Int4))
        });
        assert!(matches!(
            RecordReader::new(&[0; 4]).read(BROKEN),
            Err(ReadError::Schema(_))
        ));
    }

    #[test]
    fn test_explicit_cache() {
        let cache = SchemaCache::new();
        let bytes = data_bytes();
        RecordReader::with_cache(&bytes, &cache).read(DATA).unwrap();
        RecordReader::with_cache(&bytes, &cache).read(DATA).unwrap();
        assert_eq!(cache.hit_rate(), Some(0.5));
    }
}
