//! Schema analysis: turns a [RecordDecl] into a [CompiledRecord].
//!
//! Analysis validates field numbering and parameters, inherits the fields of a base record,
//! computes the padding of padded selector variants and derives the encoded length and
//! fixedness of the record.
//!
//! Selector padding is computed from each variant's *own* fields, measured from offset 0 with
//! the variant's alignment and end padding. The padding of a variant is the difference between
//! the longest variant and itself, so every variant of a padded selector encodes to the same
//! length.

use log::debug;

use crate::{
    cache::SchemaCache,
    compiled::{CompiledField, CompiledRecord, CompiledSelector, trailing_pad},
    errors::SchemaError,
    field::{FieldDecl, FieldType},
    record::{Alignment, RecordType},
};

/// Analyzes `record_type`, resolving base and nested records through `cache`.
///
/// Most callers want [SchemaCache::get_or_build], which memoizes the result.
pub fn analyze(record_type: RecordType, cache: &SchemaCache) -> Result<CompiledRecord, SchemaError> {
    analyze_in(record_type, cache, &mut vec![record_type])
}

/// `path` holds the records being analyzed on this call stack, innermost last.
pub(crate) fn analyze_in(
    record_type: RecordType,
    cache: &SchemaCache,
    path: &mut Vec<RecordType>,
) -> Result<CompiledRecord, SchemaError> {
    let decl = record_type.declaration();

    let mut fields = match decl.base {
        Some(base) => cache.resolve(base, path)?.fields.clone(),
        None => Vec::new(),
    };
    let inherited = fields.len();
    fields.extend(compile_own(record_type, &decl.fields, inherited)?);

    let total = fields.len();
    for field in &mut fields[inherited..] {
        if let Some(selector) = &mut field.selector {
            fill_variant_pads(record_type, selector, total, cache, path)?;
        }
    }

    let extent = measure(record_type, &fields, decl.alignment, decl.end_pad, cache, path)?;
    debug!(
        "analyzed {}: {} fields, length {}, fixed {}",
        record_type,
        fields.len(),
        extent.length,
        extent.fixed
    );

    Ok(CompiledRecord {
        record_type,
        byte_order: decl.byte_order,
        alignment: decl.alignment,
        end_pad: decl.end_pad,
        fields,
        length: extent.length,
        fixed_length: extent.fixed,
    })
}

/// Compiles the fields a record declares itself. Their numbers must cover
/// `first..first + decls.len()` exactly once each.
fn compile_own(
    record_type: RecordType,
    decls: &[FieldDecl],
    first: usize,
) -> Result<Vec<CompiledField>, SchemaError> {
    let end = first + decls.len();
    let mut slots: Vec<Option<CompiledField>> = vec![None; decls.len()];

    for decl in decls {
        if !(first..end).contains(&decl.number) {
            return Err(SchemaError::FieldNumberOutOfRange {
                record: record_type.name(),
                field: decl.name.clone(),
                number: decl.number,
                min: first,
                max: end,
            });
        }

        let slot = &mut slots[decl.number - first];
        if slot.is_some() {
            return Err(SchemaError::DuplicateFieldNumber {
                record: record_type.name(),
                field: decl.name.clone(),
                number: decl.number,
            });
        }
        *slot = Some(CompiledField::compile(record_type, decl)?);
    }

    Ok(slots.into_iter().flatten().collect())
}

fn fill_variant_pads(
    record_type: RecordType,
    selector: &mut CompiledSelector,
    first: usize,
    cache: &SchemaCache,
    path: &mut Vec<RecordType>,
) -> Result<(), SchemaError> {
    if !selector.pad {
        return Ok(());
    }

    let mut extras = Vec::with_capacity(selector.variants.len());
    for variant in selector.variants.values() {
        let extra = if variant.record_type == record_type {
            0
        } else {
            measure_own(variant.record_type, first, cache, path)?
        };
        extras.push(extra);
    }

    let span = extras.iter().copied().max().unwrap_or(0);
    for (variant, extra) in selector.variants.values_mut().zip(extras) {
        variant.pad = span - extra;
    }
    selector.span = span;

    Ok(())
}

/// Length of the fields `record_type` adds to its base, measured from offset 0.
fn measure_own(
    record_type: RecordType,
    first: usize,
    cache: &SchemaCache,
    path: &mut Vec<RecordType>,
) -> Result<usize, SchemaError> {
    let decl = record_type.declaration();
    let own = compile_own(record_type, &decl.fields, first)?;
    let extent = measure(record_type, &own, decl.alignment, decl.end_pad, cache, path)?;
    Ok(extent.length)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    length: usize,
    fixed: bool,
}

/// Lays out `fields` from offset 0 the way the reader and writer do.
fn measure(
    record_type: RecordType,
    fields: &[CompiledField],
    alignment: Alignment,
    end_pad: bool,
    cache: &SchemaCache,
    path: &mut Vec<RecordType>,
) -> Result<Extent, SchemaError> {
    let mut pos = 0;
    let mut fixed = true;
    let mut bits = 0;
    let mut selector_pad = 0;

    for field in fields {
        let count = match field.elements {
            None => 1,
            Some(0) => {
                fixed = false;
                0
            }
            Some(n) => n,
        };

        if field.field_type == FieldType::Bit {
            bits += field.length * count;
        } else {
            pos += bits.div_ceil(8);
            bits = 0;
            pos += alignment.pad(pos, field.natural());
            pos += count * field_size(field, count, &mut fixed, cache, path)?;
        }

        if let Some(selector) = &field.selector {
            if selector.pad {
                selector_pad += selector.pad_for(record_type).unwrap_or(selector.span);
            } else {
                fixed = false;
            }
        }
    }

    pos += bits.div_ceil(8);
    pos += selector_pad;
    if end_pad {
        pos += trailing_pad(alignment, pos, fields);
    }

    Ok(Extent { length: pos, fixed })
}

/// Encoded size of one element of a non-bit field.
fn field_size(
    field: &CompiledField,
    count: usize,
    fixed: &mut bool,
    cache: &SchemaCache,
    path: &mut Vec<RecordType>,
) -> Result<usize, SchemaError> {
    let size = match field.field_type {
        FieldType::VarStr => {
            *fixed = false;
            field.prefix.bytes()
        }
        FieldType::VarFixStr => field.prefix.bytes() + field.length,
        FieldType::RemStr => {
            *fixed = false;
            0
        }
        FieldType::Struct => match field.record {
            Some(record) if count > 0 => {
                let nested = cache.resolve(record, path)?;
                *fixed &= nested.fixed_length;
                nested.length
            }
            _ => 0,
        },
        ty => match ty.width() {
            Some(width) => width,
            None => {
                if field.length == 0 && ty.has_length_override() {
                    *fixed = false;
                }
                field.length
            }
        },
    };
    Ok(size)
}
