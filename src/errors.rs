//! Error types for schema analysis, reading, writing and batch processing.

use thiserror::Error;

use crate::{
    codec::{bcd::BcdError, text::TextError, time::TimeError, vax::VaxError},
    field::FieldType,
};

/// Errors produced when analyzing a [crate::record::RecordDecl] into a
/// [crate::compiled::CompiledRecord]. Detected once per record type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two fields of one record declare the same number.
    #[error("{record}: field {field:?} reuses field number {number}")]
    DuplicateFieldNumber {
        record: &'static str,
        field: String,
        number: usize,
    },
    /// Field numbers must run from the first free number without gaps.
    #[error("{record}: field {field:?} has number {number}, expected {min}..{max}")]
    FieldNumberOutOfRange {
        record: &'static str,
        field: String,
        number: usize,
        min: usize,
        max: usize,
    },
    /// A parameter the field type cannot work without was not declared.
    #[error("{record}.{field}: missing {what}")]
    MissingMetadata {
        record: &'static str,
        field: String,
        what: &'static str,
    },
    #[error("{record}.{field}: {reason}")]
    InvalidParameter {
        record: &'static str,
        field: String,
        reason: String,
    },
    #[error("{record}.{field}: selector has no variants")]
    EmptySelector { record: &'static str, field: String },
    #[error("{record}.{field}: selector value {discriminant} is declared twice")]
    DuplicateDiscriminant {
        record: &'static str,
        field: String,
        discriminant: i64,
    },
    /// The record contains itself through fields of fixed count.
    #[error("{record} contains itself")]
    RecursiveLayout { record: &'static str },
}

/// A fault in a single field. Wrapped with record and field context by [ReadError] and
/// [WriteError].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("not enough bytes: need {needed}, {remaining} remaining")]
    NotEnoughBytes { needed: usize, remaining: usize },
    #[error("invalid length {length}")]
    InvalidLength { length: usize },
    /// The selector value has no variant.
    #[error("invalid selector value {value}")]
    InvalidSelector { value: String },
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// A length prefixed payload is longer than its prefix can express.
    #[error("{found} bytes exceed the limit of {limit}")]
    LengthLimit { limit: usize, found: usize },
    /// The value has the wrong kind for the field type.
    #[error("expected {expected} value, found {found}")]
    Conversion {
        expected: &'static str,
        found: String,
    },
    #[error("value {value} does not fit the field")]
    OutOfRange { value: String },
    #[error("field has no value")]
    MissingField,
    #[error(transparent)]
    Bcd(#[from] BcdError),
    #[error(transparent)]
    Vax(#[from] VaxError),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    Text(#[from] TextError),
}

/// Errors produced by [crate::reader::RecordReader].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{record}.{field} ({field_type:?}): {source}")]
    Field {
        record: &'static str,
        field: String,
        field_type: FieldType,
        source: FieldError,
    },
    /// Input ended inside trailing padding.
    #[error("{record}: need {needed} padding bytes, {remaining} remaining")]
    Truncated {
        record: &'static str,
        needed: usize,
        remaining: usize,
    },
}

/// Errors produced by [crate::writer::RecordWriter].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{record}.{field} ({field_type:?}): {source}")]
    Field {
        record: &'static str,
        field: String,
        field_type: FieldType,
        source: FieldError,
    },
}

impl ReadError {
    /// The field-level cause, if any.
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            ReadError::Field { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl WriteError {
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            WriteError::Field { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors produced by [crate::batch].
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Neither a fixed length nor a maximum length hint gives the record size.
    #[error("cannot size {record}: it is variable length and no maximum length hint was given")]
    UnknownSize { record: &'static str },
}
