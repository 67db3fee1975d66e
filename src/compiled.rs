use std::collections::BTreeMap;

use crate::{
    codec::text::Encoding,
    errors::SchemaError,
    field::{FieldDecl, FieldType, PrefixLength},
    record::{Alignment, ByteOrder, RecordType},
};

/// Largest number of implied decimals a BCD field can declare.
pub const MAX_DECIMALS: u32 = 28;

/// Analyzed layout of one concrete record type. Built by [crate::schema::analyze] and shared
/// through [crate::cache::SchemaCache].
#[derive(Debug, Clone)]
pub struct CompiledRecord {
    pub record_type: RecordType,
    pub byte_order: ByteOrder,
    pub alignment: Alignment,
    pub end_pad: bool,
    /// Inherited fields first, then the record's own, in field number order.
    pub fields: Vec<CompiledField>,
    /// Encoded length with every hinted length taken as declared and every variable part
    /// taken as empty.
    pub length: usize,
    /// Whether every instance encodes to exactly `length` bytes.
    pub fixed_length: bool,
}

impl CompiledRecord {
    /// Encoded length of every instance, if the layout is fixed.
    pub fn encoded_length(&self) -> Option<usize> {
        self.fixed_length.then_some(self.length)
    }

    /// End padding owed by a record that ends at `pos`.
    pub fn trailing_pad(&self, pos: usize) -> usize {
        trailing_pad(self.alignment, pos, &self.fields)
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The largest padding any field would need at `pos`, so a following record of the same type
/// starts aligned for every field.
pub(crate) fn trailing_pad(alignment: Alignment, pos: usize, fields: &[CompiledField]) -> usize {
    fields
        .iter()
        .map(|field| alignment.pad(pos, field.natural()))
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    /// Position in the record, equal to the field number.
    pub index: usize,
    pub name: String,
    pub field_type: FieldType,
    pub length: usize,
    pub decimals: u32,
    pub encoding: Encoding,
    pub zone: u8,
    pub prefix: PrefixLength,
    /// `None` for scalars. `Some(0)` takes the count from hints.
    pub elements: Option<usize>,
    pub record: Option<RecordType>,
    pub selector: Option<CompiledSelector>,
}

impl CompiledField {
    /// Validates the parameters of `decl`. Selector padding is filled in by the analyzer.
    pub fn compile(record: RecordType, decl: &FieldDecl) -> Result<Self, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidParameter {
            record: record.name(),
            field: decl.name.clone(),
            reason,
        };

        match decl.field_type {
            FieldType::Bit if !(1..=32).contains(&decl.length) => {
                return Err(invalid(format!(
                    "bit-field length {} is outside 1..=32",
                    decl.length
                )));
            }
            FieldType::IntX if decl.length > 7 => {
                return Err(invalid(format!(
                    "general integer length {} is outside 1..=7",
                    decl.length
                )));
            }
            FieldType::Boolean if decl.length == 0 => {
                return Err(invalid("boolean length must be at least 1".to_string()));
            }
            FieldType::PackedBcd | FieldType::ZonedBcd if decl.decimals > MAX_DECIMALS => {
                return Err(invalid(format!(
                    "{} decimals exceed {MAX_DECIMALS}",
                    decl.decimals
                )));
            }
            FieldType::Struct if decl.record.is_none() => {
                return Err(SchemaError::MissingMetadata {
                    record: record.name(),
                    field: decl.name.clone(),
                    what: "record type",
                });
            }
            _ => {}
        }

        let selector = decl
            .selector
            .as_ref()
            .map(|selector| {
                if selector.variants.is_empty() {
                    return Err(SchemaError::EmptySelector {
                        record: record.name(),
                        field: decl.name.clone(),
                    });
                }

                let mut variants = BTreeMap::new();
                for &(discriminant, record_type) in &selector.variants {
                    let variant = Variant {
                        record_type,
                        pad: 0,
                    };
                    if variants.insert(discriminant, variant).is_some() {
                        return Err(SchemaError::DuplicateDiscriminant {
                            record: record.name(),
                            field: decl.name.clone(),
                            discriminant,
                        });
                    }
                }

                Ok(CompiledSelector {
                    variants,
                    pad: selector.pad,
                    span: 0,
                })
            })
            .transpose()?;

        Ok(CompiledField {
            index: decl.number,
            name: decl.name.clone(),
            field_type: decl.field_type,
            length: decl.length,
            decimals: decl.decimals,
            encoding: decl.encoding,
            zone: decl.zone,
            prefix: decl.prefix,
            elements: decl.elements,
            record: if decl.field_type == FieldType::Struct {
                decl.record
            } else {
                None
            },
            selector,
        })
    }

    /// Alignment unit under [Alignment::Natural].
    pub fn natural(&self) -> usize {
        self.field_type.natural(self.length)
    }

    pub fn is_array(&self) -> bool {
        self.elements.is_some()
    }
}

/// Variants of a selector field.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub variants: BTreeMap<i64, Variant>,
    /// Variants are padded to the longest one.
    pub pad: bool,
    /// Length of the longest variant's own fields. 0 unless `pad` is set.
    pub span: usize,
}

impl CompiledSelector {
    pub fn variant(&self, discriminant: i64) -> Option<&Variant> {
        self.variants.get(&discriminant)
    }

    /// Padding owed by `record_type` when it is one of the variants.
    pub fn pad_for(&self, record_type: RecordType) -> Option<usize> {
        self.variants
            .values()
            .find(|v| v.record_type == record_type)
            .map(|v| v.pad)
    }
}

/// A concrete record type selected by a discriminant, and the bytes that pad it to the
/// longest variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub record_type: RecordType,
    pub pad: usize,
}
