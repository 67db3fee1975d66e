//! Serializable snapshot of an analyzed layout.
//!
//! A [LayoutDef] records what the analyzer derived for a record type: every field with its
//! resolved parameters, selector variants with their padding, and the encoded length. It is
//! meant for diagnostics and for documenting a wire format, for example as JSON next to the
//! code that declares it.

use serde::{Deserialize, Serialize};

use crate::{
    codec::text::Encoding,
    compiled::{CompiledField, CompiledRecord},
    field::{FieldType, PrefixLength},
    record::{Alignment, ByteOrder},
};

/// Top-level description of one record layout.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LayoutDef {
    pub name: String,
    pub byte_order: ByteOrder,
    pub alignment: Alignment,
    #[serde(default)]
    pub end_pad: bool,
    /// Encoded length, absent for variable length layouts.
    #[serde(default)]
    pub length: Option<usize>,
    pub fields: Vec<FieldDef>,
}

/// One field of a [LayoutDef], inherited fields included.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub zone: u8,
    #[serde(default)]
    pub prefix: PrefixLength,
    /// Array element count; 0 when supplied at run time.
    #[serde(default)]
    pub elements: Option<usize>,
    /// Name of the nested record type.
    #[serde(default)]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantDef>,
}

/// A selector entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VariantDef {
    pub discriminant: i64,
    pub record: String,
    /// Padding that brings this variant up to the longest one.
    pub pad: usize,
}

impl From<&CompiledRecord> for LayoutDef {
    fn from(layout: &CompiledRecord) -> Self {
        LayoutDef {
            name: layout.record_type.name().to_string(),
            byte_order: layout.byte_order,
            alignment: layout.alignment,
            end_pad: layout.end_pad,
            length: layout.encoded_length(),
            fields: layout.fields.iter().map(FieldDef::from).collect(),
        }
    }
}

impl From<&CompiledField> for FieldDef {
    fn from(field: &CompiledField) -> Self {
        let variants = field
            .selector
            .iter()
            .flat_map(|selector| &selector.variants)
            .map(|(&discriminant, variant)| VariantDef {
                discriminant,
                record: variant.record_type.name().to_string(),
                pad: variant.pad,
            })
            .collect();

        FieldDef {
            name: field.name.clone(),
            field_type: field.field_type,
            length: field.length,
            decimals: field.decimals,
            encoding: field.encoding,
            zone: field.zone,
            prefix: field.prefix,
            elements: field.elements,
            record: field.record.map(|r| r.name().to_string()),
            variants,
        }
    }
}
