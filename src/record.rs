//! Record-level declarations: type identity, byte order, alignment and the ordered field list.
//!
//! A record type is declared once as a `const` [RecordType] whose `declare` function builds a
//! [RecordDecl]. Declarations are plain data; the analyzer in [crate::schema] turns them into a
//! [crate::compiled::CompiledRecord].
//!
//! ```
//! use recordcraft::field::{FieldDecl, FieldType};
//! use recordcraft::record::{Alignment, RecordDecl, RecordType};
//!
//! const POINT: RecordType = RecordType::new("Point", || {
//!     RecordDecl::new()
//!         .alignment(Alignment::Natural)
//!         .field(FieldDecl::new(0, "x", FieldType::Int4))
//!         .field(FieldDecl::new(1, "y", FieldType::Int4))
//! });
//! assert_eq!(POINT.name(), "Point");
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::field::FieldDecl;

/// Identity of a declared record type.
///
/// Two record types are the same when their names are equal, so names must be unique within a
/// process. The declaration is only built when the type is first analyzed, which lets records
/// refer to each other (or to themselves) through `const` items.
#[derive(Clone, Copy)]
pub struct RecordType {
    name: &'static str,
    declare: fn() -> RecordDecl,
}

impl RecordType {
    pub const fn new(name: &'static str, declare: fn() -> RecordDecl) -> Self {
        RecordType { name, declare }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a fresh copy of the declared metadata.
    pub fn declaration(&self) -> RecordDecl {
        (self.declare)()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.name).finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Byte order of multi-byte numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Padding policy between fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Alignment {
    /// No padding.
    #[default]
    Packed,
    /// Each field starts at a multiple of its own natural size.
    Natural,
    /// Same as `Packed`.
    Align1,
    Align2,
    Align4,
    Align8,
}

impl Alignment {
    /// Padding needed at `pos` before a field whose natural alignment unit is `natural`.
    pub fn pad(self, pos: usize, natural: usize) -> usize {
        let unit = match self {
            Alignment::Packed | Alignment::Align1 => return 0,
            Alignment::Natural => natural,
            Alignment::Align2 => 2,
            Alignment::Align4 => 4,
            Alignment::Align8 => 8,
        };
        if unit == 0 {
            return 0;
        }

        (unit - pos % unit) % unit
    }
}

/// Declared metadata of one record type.
#[derive(Debug, Clone, Default)]
pub struct RecordDecl {
    pub byte_order: ByteOrder,
    pub alignment: Alignment,
    /// Pad the end of the record so that a following record of the same type is aligned.
    pub end_pad: bool,
    /// Base record whose fields come first.
    pub base: Option<RecordType>,
    pub fields: Vec<FieldDecl>,
}

impl RecordDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn end_pad(mut self, end_pad: bool) -> Self {
        self.end_pad = end_pad;
        self
    }

    pub fn extends(mut self, base: RecordType) -> Self {
        self.base = Some(base);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}
