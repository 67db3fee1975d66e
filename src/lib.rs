//! # recordcraft
//!
//! A library for reading and writing native binary records: C-style structs, COBOL copybook
//! records and similar fixed layouts.
//!
//! Declare a record type once with its fields, byte order and alignment. The schema analyzer
//! validates the declaration and computes padding and encoded length, the result is cached,
//! and [reader::RecordReader] and [writer::RecordWriter] convert between bytes and
//! [value::RecordValue]s. Besides plain integers, floats and strings, fields can hold packed
//! and zoned BCD, VAX floating point, Java/Unix/VMS timestamps, bit-fields, arrays, nested
//! records and tagged unions selected by a discriminant field.
//!
//! ## Example
//!
//! ```
//! use recordcraft::field::{FieldDecl, FieldType};
//! use recordcraft::reader::RecordReader;
//! use recordcraft::record::{RecordDecl, RecordType};
//! use recordcraft::value::{RecordValue, Value};
//! use recordcraft::writer::RecordWriter;
//!
//! const ITEM: RecordType = RecordType::new("Item", || {
//!     RecordDecl::new()
//!         .field(FieldDecl::new(0, "id", FieldType::Int4))
//!         .field(FieldDecl::new(1, "name", FieldType::FixStrNulTerm).length(6))
//! });
//!
//! let item = RecordValue::new(ITEM).with("id", 7).with("name", "bolt");
//! let mut writer = RecordWriter::new();
//! writer.write(&item).unwrap();
//! assert_eq!(writer.bytes(), b"\x07\x00\x00\x00bolt\x00\x00");
//!
//! let decoded = RecordReader::new(writer.bytes()).read(ITEM).unwrap();
//! assert_eq!(decoded.get("name"), Some(&Value::from("bolt")));
//! ```

pub mod batch;
pub mod bits;
pub mod cache;
pub mod codec;
pub mod compiled;
pub mod errors;
pub mod field;
pub mod hints;
pub mod reader;
pub mod record;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;
pub mod writer;

#[cfg(test)]
mod testing;
