//! Run time layout information that the declaration cannot carry.
//!
//! Some formats store the length of a string or the count of an array in an earlier field of
//! the same record, or use text as the selector of a tagged union. A [LayoutHints]
//! implementation supplies those values while a record is read or written. Every method
//! defaults to "no hint", in which case the declared value is used.

use crate::value::{RecordValue, Value};

pub trait LayoutHints {
    /// Length of field `index` of types whose length can be overridden (general integers,
    /// fixed and nul-terminated strings, packed and zoned BCD).
    ///
    /// `record` holds the fields read so far when reading, the full record when writing.
    fn length(&self, record: &RecordValue, index: usize) -> Option<usize> {
        let _ = (record, index);
        None
    }

    /// Element count of array field `index`.
    fn elements(&self, record: &RecordValue, index: usize) -> Option<usize> {
        let _ = (record, index);
        None
    }

    /// Largest encoded size of one record, used to size stream batches of variable length
    /// records.
    fn max_length(&self) -> Option<usize> {
        None
    }

    /// Hints for the nested record in field `index`. Nested records get no hints by default.
    fn nested(&self, record: &RecordValue, index: usize) -> Option<&dyn LayoutHints> {
        let _ = (record, index);
        None
    }

    /// Maps a selector field value to its discriminant. Without it the selector value must be
    /// an integer.
    fn convert_selector(&self, value: &Value) -> Option<i64> {
        let _ = value;
        None
    }
}

/// Hints that never override anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl LayoutHints for NoHints {}

/// Resolved length of a field with declared `length`.
pub(crate) fn resolve_length(
    hints: &dyn LayoutHints,
    record: &RecordValue,
    index: usize,
    length: usize,
) -> usize {
    hints.length(record, index).unwrap_or(length)
}
