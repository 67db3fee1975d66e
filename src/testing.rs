//! Record types and byte images shared by the unit tests.
//!
//! Record names are global, so every test record lives here or carries a module prefix.

use crate::{
    field::{FieldDecl, FieldType, PrefixLength, SelectorDecl},
    record::{Alignment, ByteOrder, RecordDecl, RecordType},
};

/// 123.456 as a little endian double.
pub const X_BYTES: [u8; 8] = [0x77, 0xBE, 0x9F, 0x1A, 0x2F, 0xDD, 0x5E, 0x40];

pub const DATA: RecordType = RecordType::new("Data", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
        .field(FieldDecl::new(1, "xv", FieldType::Fp8))
        .field(FieldDecl::new(2, "sv", FieldType::FixStr).length(8))
});

pub fn data_bytes() -> Vec<u8> {
    let mut b = vec![0x02, 0x01, 0x00, 0x00];
    b.extend_from_slice(&X_BYTES);
    b.extend_from_slice(b"ABC     ");
    b
}

fn align_fields(decl: RecordDecl) -> RecordDecl {
    decl.field(FieldDecl::new(0, "i1", FieldType::Int1))
        .field(FieldDecl::new(1, "i2", FieldType::Int2))
        .field(FieldDecl::new(2, "i4", FieldType::Int4))
        .field(FieldDecl::new(3, "i8", FieldType::Int8))
}

pub const ALIGN_PACKED: RecordType =
    RecordType::new("AlignPacked", || align_fields(RecordDecl::new()));
pub const ALIGN_NATURAL: RecordType = RecordType::new("AlignNatural", || {
    align_fields(RecordDecl::new().alignment(Alignment::Natural))
});
pub const ALIGN_8: RecordType = RecordType::new("Align8", || {
    align_fields(RecordDecl::new().alignment(Alignment::Align8))
});

pub const END_PAD_NONE: RecordType = RecordType::new("EndPadNone", || {
    RecordDecl::new()
        .alignment(Alignment::Align4)
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
        .field(FieldDecl::new(1, "bv", FieldType::Int1))
});
pub const END_PAD_ALIGN4: RecordType = RecordType::new("EndPadAlign4", || {
    RecordDecl::new()
        .alignment(Alignment::Align4)
        .end_pad(true)
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
        .field(FieldDecl::new(1, "bv", FieldType::Int1))
});
pub const END_PAD_ALIGN8: RecordType = RecordType::new("EndPadAlign8", || {
    RecordDecl::new()
        .alignment(Alignment::Align8)
        .end_pad(true)
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
        .field(FieldDecl::new(1, "xv", FieldType::Fp8))
        .field(FieldDecl::new(2, "bv", FieldType::Int1))
});

pub const SUPER: RecordType = RecordType::new("SuperData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "id", FieldType::Int4))
        .field(
            FieldDecl::new(1, "typ", FieldType::Int4)
                .selector(SelectorDecl::new().variant(1, SUB_ONE).variant(2, SUB_TWO)),
        )
});
pub const SUB_ONE: RecordType = RecordType::new("SubDataOne", || {
    RecordDecl::new()
        .extends(SUPER)
        .field(FieldDecl::new(2, "x", FieldType::Fp8))
});
pub const SUB_TWO: RecordType = RecordType::new("SubDataTwo", || {
    RecordDecl::new()
        .extends(SUPER)
        .field(FieldDecl::new(2, "s", FieldType::FixStr).length(12))
});

pub const SUPER_PAD: RecordType = RecordType::new("SuperDataPad", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "id", FieldType::Int4))
        .field(
            FieldDecl::new(1, "typ", FieldType::Int4).selector(
                SelectorDecl::new()
                    .variant(1, SUB_ONE_PAD)
                    .variant(2, SUB_TWO_PAD)
                    .padded(),
            ),
        )
});
pub const SUB_ONE_PAD: RecordType = RecordType::new("SubDataOnePad", || {
    RecordDecl::new()
        .extends(SUPER_PAD)
        .field(FieldDecl::new(2, "x", FieldType::Fp8))
});
pub const SUB_TWO_PAD: RecordType = RecordType::new("SubDataTwoPad", || {
    RecordDecl::new()
        .extends(SUPER_PAD)
        .field(FieldDecl::new(2, "s", FieldType::FixStr).length(12))
});

/// Two records: a `SubDataOne` with x = 123.456 and a `SubDataTwo` with s = "ABC".
pub fn multi_bytes(pad: bool) -> Vec<u8> {
    let mut b = vec![0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
    b.extend_from_slice(&X_BYTES);
    if pad {
        b.extend_from_slice(&[0; 4]);
    }
    b.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]);
    b.extend_from_slice(b"ABC         ");
    b
}

pub const SUPER_CONVERT: RecordType = RecordType::new("SuperDataConvert", || {
    RecordDecl::new().field(
        FieldDecl::new(0, "typ", FieldType::FixStr).length(1).selector(
            SelectorDecl::new()
                .variant(1, SUB_ONE_CONVERT)
                .variant(2, SUB_TWO_CONVERT),
        ),
    )
});
pub const SUB_ONE_CONVERT: RecordType = RecordType::new("SubDataOneConvert", || {
    RecordDecl::new()
        .extends(SUPER_CONVERT)
        .field(FieldDecl::new(1, "a", FieldType::FixStr).length(1))
});
pub const SUB_TWO_CONVERT: RecordType = RecordType::new("SubDataTwoConvert", || {
    RecordDecl::new()
        .extends(SUPER_CONVERT)
        .field(FieldDecl::new(1, "b", FieldType::FixStr).length(2))
});

pub const BIT_DATA: RecordType = RecordType::new("BitData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "i1", FieldType::Int1))
        .field(FieldDecl::new(1, "n1", FieldType::Bit).length(4))
        .field(FieldDecl::new(2, "n2", FieldType::Bit).length(4))
        .field(FieldDecl::new(3, "i2", FieldType::Int1))
        .field(FieldDecl::new(4, "z1", FieldType::Bit).length(1))
        .field(FieldDecl::new(5, "z2", FieldType::Bit).length(15))
});

pub const BIT_BYTES: [u8; 5] = [0x01, 0x23, 0x04, 0x80, 0x02];

pub const STRING_DATA: RecordType = RecordType::new("StringData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "s1", FieldType::FixStr).length(4))
        .field(FieldDecl::new(1, "s2", FieldType::VarStr))
        .field(FieldDecl::new(2, "s3", FieldType::VarFixStr).length(4))
        .field(FieldDecl::new(3, "s4", FieldType::FixStrNulTerm).length(4))
        .field(FieldDecl::new(4, "s5", FieldType::VarStr).prefix(PrefixLength::One))
});

pub const STRING_BYTES: [u8; 21] = [
    0x41, 0x42, 0x43, 0x44, 0x02, 0x00, 0x41, 0x42, 0x02, 0x00, 0x41, 0x42, 0x00, 0x00, 0x41,
    0x42, 0x00, 0x00, 0x02, 0x41, 0x42,
];

pub const VARIABLE_DATA: RecordType = RecordType::new("VariableData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "s1", FieldType::FixStr))
        .field(FieldDecl::new(1, "s2", FieldType::FixStr))
        .field(FieldDecl::new(2, "s3", FieldType::FixStr))
        .field(FieldDecl::new(3, "s4", FieldType::FixStr))
});

pub const ARRAY_DATA: RecordType = RecordType::new("ArrayData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "iv", FieldType::Int4).array(3))
        .field(FieldDecl::new(1, "xv", FieldType::Fp8).array(3))
});

pub const VAR_ARRAY_DATA: RecordType = RecordType::new("VarArrayData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "iv", FieldType::Int4).array(0))
        .field(FieldDecl::new(1, "xv", FieldType::Fp8).array(0))
});

/// `n` ints 258, 259, ... followed by `n` copies of 123.456.
pub fn array_bytes(n: u8) -> Vec<u8> {
    let mut b = Vec::new();
    for i in 0..n {
        b.extend_from_slice(&[0x02 + i, 0x01, 0x00, 0x00]);
    }
    for _ in 0..n {
        b.extend_from_slice(&X_BYTES);
    }
    b
}

pub const FIELD_DATA: RecordType = RecordType::new("FieldData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "i3", FieldType::Int4))
        .field(FieldDecl::new(1, "i4", FieldType::Int4))
});
pub const MAIN_DATA: RecordType = RecordType::new("MainData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "i1", FieldType::Int4))
        .field(FieldDecl::new(1, "i2", FieldType::Int4))
        .field(FieldDecl::record(2, "s", FIELD_DATA))
        .field(FieldDecl::new(3, "i5", FieldType::Int4))
});

pub const TIME_DATA: RecordType = RecordType::new("TimeData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "t1", FieldType::JavaTime))
        .field(FieldDecl::new(1, "t2", FieldType::VmsTime))
        .field(FieldDecl::new(2, "t3", FieldType::UnixTime))
});

pub const BCD_DATA: RecordType = RecordType::new("BcdData", || {
    RecordDecl::new()
        .field(
            FieldDecl::new(0, "v1", FieldType::PackedBcd)
                .length(4)
                .decimals(2),
        )
        .field(
            FieldDecl::new(1, "v2", FieldType::ZonedBcd)
                .length(6)
                .decimals(2),
        )
});

pub const VAX_DATA: RecordType = RecordType::new("VaxFloatData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "v1", FieldType::VaxFp4))
        .field(FieldDecl::new(1, "v2", FieldType::VaxFp8))
});

pub const UNSIGNED_DATA: RecordType = RecordType::new("UnsignedData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "ui1v", FieldType::UInt1))
        .field(FieldDecl::new(1, "ui2v", FieldType::UInt2))
        .field(FieldDecl::new(2, "ui4v", FieldType::UInt4))
});

pub const GENERAL_INT_DATA: RecordType = RecordType::new("GeneralIntData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "v1", FieldType::IntX).length(3))
        .field(FieldDecl::new(1, "v2", FieldType::IntX).length(5))
});

pub const BOOLEAN_DATA: RecordType = RecordType::new("BooleanData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "b1", FieldType::Boolean).length(4))
        .field(FieldDecl::new(1, "b2", FieldType::Boolean).length(2))
        .field(FieldDecl::new(2, "b3", FieldType::Boolean).length(1))
});

pub const BIG_ENDIAN_DATA: RecordType = RecordType::new("BigEndianData", || {
    RecordDecl::new()
        .byte_order(ByteOrder::Big)
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
});

pub const REMAINING_DATA: RecordType = RecordType::new("RemainingData", || {
    RecordDecl::new()
        .field(FieldDecl::new(0, "iv", FieldType::Int4))
        .field(FieldDecl::new(1, "rest", FieldType::RemStr))
});

pub const END_PAD_BOOLEAN: RecordType = RecordType::new("EndPadBoolean", || {
    RecordDecl::new()
        .alignment(Alignment::Natural)
        .end_pad(true)
        .field(FieldDecl::new(0, "b", FieldType::Boolean).length(3))
        .field(FieldDecl::new(1, "c", FieldType::Int1))
        .field(FieldDecl::new(2, "d", FieldType::Int4))
});

/// A padded selector held in a bit field.
pub const BIT_TAG: RecordType = RecordType::new("BitTag", || {
    RecordDecl::new().field(
        FieldDecl::new(0, "tag", FieldType::Bit).length(8).selector(
            SelectorDecl::new()
                .variant(1, BIT_TAG_LONG)
                .variant(2, BIT_TAG_SHORT)
                .padded(),
        ),
    )
});
pub const BIT_TAG_LONG: RecordType = RecordType::new("BitTagLong", || {
    RecordDecl::new()
        .extends(BIT_TAG)
        .field(FieldDecl::new(1, "v", FieldType::Int4))
});
pub const BIT_TAG_SHORT: RecordType = RecordType::new("BitTagShort", || {
    RecordDecl::new()
        .extends(BIT_TAG)
        .field(FieldDecl::new(1, "v", FieldType::Int1))
});

/// One encoded record of every fixed length fixture, padding included.
pub fn fixed_images() -> Vec<(RecordType, Vec<u8>)> {
    let multi = multi_bytes(true);
    let mut align_8 = Vec::new();
    for i in 1..=4 {
        align_8.push(i);
        align_8.extend_from_slice(&[0; 7]);
    }
    let mut end_pad_8 = vec![1, 0, 0, 0, 0, 0, 0, 0];
    end_pad_8.extend_from_slice(&2.0f64.to_le_bytes());
    end_pad_8.extend_from_slice(&[3, 0, 0, 0, 0, 0, 0, 0]);
    let mut times = vec![0x01, 0, 0, 0, 0, 0, 0, 0];
    times.extend_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0]);
    times.extend_from_slice(&[0x01, 0, 0, 0]);

    vec![
        (DATA, data_bytes()),
        (
            ALIGN_PACKED,
            vec![1, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0],
        ),
        (
            ALIGN_NATURAL,
            vec![1, 0, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0],
        ),
        (ALIGN_8, align_8),
        (END_PAD_NONE, vec![1, 0, 0, 0, 2]),
        (END_PAD_ALIGN4, vec![1, 0, 0, 0, 2, 0, 0, 0]),
        (END_PAD_ALIGN8, end_pad_8),
        (END_PAD_BOOLEAN, vec![1, 0, 0, 2, 3, 0, 0, 0, 0]),
        (SUB_ONE_PAD, multi[..20].to_vec()),
        (SUB_TWO_PAD, multi[20..].to_vec()),
        (SUPER_PAD, multi[20..].to_vec()),
        (BIT_DATA, BIT_BYTES.to_vec()),
        (BIT_TAG, vec![0x02, 0x07, 0, 0, 0]),
        (BIT_TAG_LONG, vec![0x01, 0x04, 0, 0, 0]),
        (BIT_TAG_SHORT, vec![0x02, 0xF9, 0, 0, 0]),
        (ARRAY_DATA, array_bytes(3)),
        (MAIN_DATA, (1..=5).flat_map(|i| [i, 0, 0, 0]).collect()),
        (TIME_DATA, times),
        (
            BCD_DATA,
            vec![0x12, 0x34, 0x56, 0x7D, 0xF1, 0xF2, 0xF7, 0xF9, 0xF5, 0xC0],
        ),
        (
            VAX_DATA,
            vec![0x45, 0x42, 0xA4, 0x70, 0x7E, 0x40, 0x2F, 0xDD, 0x9F, 0x1A, 0x77, 0xBE],
        ),
        (UNSIGNED_DATA, vec![0xFF; 7]),
        (
            GENERAL_INT_DATA,
            vec![0x03, 0x02, 0x01, 0x05, 0x04, 0x03, 0x02, 0x01],
        ),
        (BOOLEAN_DATA, vec![0x01, 0, 0, 0, 0, 0, 0x01]),
        (BIG_ENDIAN_DATA, vec![0, 0, 1, 2]),
    ]
}
