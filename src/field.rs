//! Definition of the fields that make up a [crate::record::RecordDecl].

use crate::{codec::bcd::ZONE_EBCDIC, codec::text::Encoding, record::RecordType};

/// Native type of a field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum FieldType {
    /// 8 bit signed integer.
    Int1,
    /// 16 bit signed integer.
    Int2,
    /// 32 bit signed integer.
    Int4,
    /// 64 bit signed integer.
    Int8,
    /// 8 bit unsigned integer.
    UInt1,
    /// 16 bit unsigned integer.
    UInt2,
    /// 32 bit unsigned integer.
    UInt4,
    /// 64 bit unsigned integer.
    UInt8,
    /// 32 bit IEEE floating point.
    Fp4,
    /// 64 bit IEEE floating point.
    Fp8,
    /// Unsigned integer of `length` bytes (1 to 7).
    IntX,
    /// Fixed length string of `length` bytes.
    FixStr,
    /// Fixed length string of `length` bytes, zero padded.
    FixStrNulTerm,
    /// String with a length prefix.
    VarStr,
    /// String with a length prefix, zero padded to `length` bytes.
    VarFixStr,
    /// All remaining bytes of the buffer.
    RemStr,
    /// `length` bytes, nonzero first byte is true.
    Boolean,
    /// `length` bits packed MSB first (1 to 32).
    Bit,
    /// Milliseconds since 1970-01-01, 64 bit.
    JavaTime,
    /// Seconds since 1970-01-01, 32 bit.
    UnixTime,
    /// 100 nanosecond ticks since 1858-11-17, 64 bit.
    VmsTime,
    /// Packed BCD, two digits per byte.
    PackedBcd,
    /// Zoned BCD, one digit per byte.
    ZonedBcd,
    /// VAX F floating point.
    VaxFp4,
    /// VAX G floating point.
    VaxFp8,
    /// Nested record.
    Struct,
}

impl FieldType {
    /// Alignment unit used by [crate::record::Alignment::Natural]. `length` is the declared length.
    pub fn natural(self, length: usize) -> usize {
        match self {
            FieldType::Int1
            | FieldType::UInt1
            | FieldType::IntX
            | FieldType::FixStr
            | FieldType::FixStrNulTerm
            | FieldType::RemStr
            | FieldType::PackedBcd
            | FieldType::ZonedBcd
            | FieldType::Bit
            | FieldType::Struct => 1,
            FieldType::Int2 | FieldType::UInt2 | FieldType::VarStr | FieldType::VarFixStr => 2,
            FieldType::Int4
            | FieldType::UInt4
            | FieldType::Fp4
            | FieldType::UnixTime
            | FieldType::VaxFp4 => 4,
            FieldType::Int8
            | FieldType::UInt8
            | FieldType::Fp8
            | FieldType::JavaTime
            | FieldType::VmsTime
            | FieldType::VaxFp8 => 8,
            FieldType::Boolean => length,
        }
    }

    /// Fixed wire width, for types whose width does not depend on parameters.
    pub fn width(self) -> Option<usize> {
        match self {
            FieldType::Int1 | FieldType::UInt1 => Some(1),
            FieldType::Int2 | FieldType::UInt2 => Some(2),
            FieldType::Int4
            | FieldType::UInt4
            | FieldType::Fp4
            | FieldType::UnixTime
            | FieldType::VaxFp4 => Some(4),
            FieldType::Int8
            | FieldType::UInt8
            | FieldType::Fp8
            | FieldType::JavaTime
            | FieldType::VmsTime
            | FieldType::VaxFp8 => Some(8),
            _ => None,
        }
    }

    /// Whether [crate::hints::LayoutHints::length] may override the declared length.
    pub fn has_length_override(self) -> bool {
        matches!(
            self,
            FieldType::IntX
                | FieldType::FixStr
                | FieldType::FixStrNulTerm
                | FieldType::PackedBcd
                | FieldType::ZonedBcd
        )
    }
}

/// Width of the length prefix of [FieldType::VarStr] and [FieldType::VarFixStr].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum PrefixLength {
    One,
    #[default]
    Two,
    Four,
}

impl PrefixLength {
    pub fn bytes(self) -> usize {
        match self {
            PrefixLength::One => 1,
            PrefixLength::Two => 2,
            PrefixLength::Four => 4,
        }
    }

    /// Largest payload that can be written behind this prefix.
    pub fn max_payload(self) -> usize {
        match self {
            PrefixLength::One => 127,
            PrefixLength::Two => 32767,
            PrefixLength::Four => u32::MAX as usize,
        }
    }
}

/// Tagged union selection attached to a field.
///
/// After the field is decoded, its value picks the concrete record type for the whole record.
#[derive(Debug, Clone, Default)]
pub struct SelectorDecl {
    pub variants: Vec<(i64, RecordType)>,
    /// Pad every variant to the length of the longest one.
    pub pad: bool,
}

impl SelectorDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, discriminant: i64, record_type: RecordType) -> Self {
        self.variants.push((discriminant, record_type));
        self
    }

    pub fn padded(mut self) -> Self {
        self.pad = true;
        self
    }
}

/// A single declared field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Position in the record, counted from 0 across base and derived records.
    pub number: usize,
    pub name: String,
    pub field_type: FieldType,
    /// Bytes for strings, booleans, BCD and general integers; bits for bit-fields.
    pub length: usize,
    /// Implied decimals of BCD values.
    pub decimals: u32,
    pub encoding: Encoding,
    /// Zone nibble of zoned BCD.
    pub zone: u8,
    pub prefix: PrefixLength,
    /// `Some(count)` for array fields.
    pub elements: Option<usize>,
    /// Record type of [FieldType::Struct] fields.
    pub record: Option<RecordType>,
    pub selector: Option<SelectorDecl>,
}

impl FieldDecl {
    pub fn new(number: usize, name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDecl {
            number,
            name: name.into(),
            field_type,
            length: 0,
            decimals: 0,
            encoding: Encoding::default(),
            zone: ZONE_EBCDIC,
            prefix: PrefixLength::default(),
            elements: None,
            record: None,
            selector: None,
        }
    }

    /// A nested record field.
    pub fn record(number: usize, name: impl Into<String>, record: RecordType) -> Self {
        FieldDecl {
            record: Some(record),
            ..FieldDecl::new(number, name, FieldType::Struct)
        }
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn zone(mut self, zone: u8) -> Self {
        self.zone = zone;
        self
    }

    pub fn prefix(mut self, prefix: PrefixLength) -> Self {
        self.prefix = prefix;
        self
    }

    /// Makes this an array field of `count` elements. A count of 0 must be supplied by hints.
    pub fn array(mut self, count: usize) -> Self {
        self.elements = Some(count);
        self
    }

    pub fn selector(mut self, selector: SelectorDecl) -> Self {
        self.selector = Some(selector);
        self
    }
}
