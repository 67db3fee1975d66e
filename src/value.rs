//! Decoded field values.
//!
//! A [RecordValue] holds the concrete [RecordType] of a record together with its field values
//! in declaration order. The reader produces them and the writer consumes them; fields are
//! addressed by name.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::record::RecordType;

/// A single field value, or the elements of an array field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integers.
    Int(i64),
    /// Unsigned, general and bit-field integers.
    UInt(u64),
    /// IEEE and VAX F floating point.
    Float(f32),
    /// IEEE and VAX G floating point.
    Double(f64),
    Bool(bool),
    Str(String),
    /// Packed and zoned BCD.
    Decimal(Decimal),
    Time(DateTime<Utc>),
    Record(RecordValue),
    Array(Vec<Value>),
}

impl Value {
    /// Name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Bool(_) => "Bool",
            Value::Str(_) => "Str",
            Value::Decimal(_) => "Decimal",
            Value::Time(_) => "Time",
            Value::Record(_) => "Record",
            Value::Array(_) => "Array",
        }
    }

    /// Integer value of `Int` and `UInt`, if it fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Integer value of `Int` and `UInt`, if it is not negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

impl_from! {
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => Str,
    Decimal => Decimal,
    DateTime<Utc> => Time,
    RecordValue => Record,
    Vec<Value> => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// Field values of one record, tagged with the record's concrete type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    record_type: RecordType,
    fields: Vec<(String, Value)>,
}

impl RecordValue {
    pub fn new(record_type: RecordType) -> Self {
        RecordValue {
            record_type,
            fields: Vec::new(),
        }
    }

    /// Sets a field and returns the record, for building values inline.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Replaces the value of `name`, or appends it.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Value at declaration position `index`.
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn push(&mut self, name: &str, value: Value) {
        self.fields.push((name.to_string(), value));
    }
}
