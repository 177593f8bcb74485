use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// The value of an enumeration field.
///
/// Numbers the enumeration does not declare are kept as they were read
/// rather than being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumValue {
    Known(String),
    Unrecognized(u32),
}

/// Which case of a switch a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseTag {
    /// The case declared for this discriminator value.
    Value(u32),
    /// The fallback case used when no declared value matches.
    Default,
}

/// This type holds dynamic EO data.
///
/// Values are written and read by walking a packet or struct's instruction
/// list. Length fields never appear in a value: they are derived from the
/// field they measure when writing, and only used as loop bounds when
/// reading.
#[derive(Clone, PartialEq)]
pub enum Value {
    Number(u32),
    Bool(bool),
    String(String),
    Blob(Vec<u8>),
    Enum(String, EnumValue),
    Array(Vec<Value>),
    Object(String, BTreeMap<String, Value>),
    Case(CaseTag, BTreeMap<String, Value>),
}

impl Value {
    /// An empty [Object](#variant.Object) of the named struct or packet.
    pub fn object(name: &str) -> Value {
        Value::Object(name.to_owned(), BTreeMap::new())
    }

    /// An empty switch payload for `tag`.
    pub fn case(tag: CaseTag) -> Value {
        Value::Case(tag, BTreeMap::new())
    }

    /// A known variant of the named enumeration.
    pub fn variant(enum_name: &str, variant: &str) -> Value {
        Value::Enum(enum_name.to_owned(), EnumValue::Known(variant.to_owned()))
    }

    /// Builder-style [set](#method.set).
    pub fn with(mut self, name: &str, value: Value) -> Value {
        self.set(name, value);
        self
    }

    /// Returns the number held by a [Number](#variant.Number) or an
    /// unrecognized [Enum](#variant.Enum). Returns `None` for other kinds.
    pub fn as_number(&self) -> Option<u32> {
        match *self {
            Value::Number(value) => Some(value),
            Value::Enum(_, EnumValue::Unrecognized(value)) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// Returns the text of a [String](#variant.String) or the variant name of
    /// a known [Enum](#variant.Enum). Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            Value::Enum(_, EnumValue::Known(ref value)) => value.as_str(),
            _ => "",
        }
    }

    /// Returns the bytes of a [Blob](#variant.Blob), or an empty slice.
    pub fn as_blob(&self) -> &[u8] {
        match *self {
            Value::Blob(ref bytes) => bytes.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to get an array of values out of an [Array](#variant.Array).
    /// Returns an empty array for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn as_enum(&self) -> Option<(&str, &EnumValue)> {
        match *self {
            Value::Enum(ref name, ref value) => Some((name.as_str(), value)),
            _ => None,
        }
    }

    /// Fields of an [Object](#variant.Object) or [Case](#variant.Case).
    pub fn fields(&self) -> Option<&BTreeMap<String, Value>> {
        match *self {
            Value::Object(_, ref fields) | Value::Case(_, ref fields) => Some(fields),
            _ => None,
        }
    }

    /// A convenience method to extract the length out of an [Array](#variant.Array).
    /// Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to an [Array](#variant.Array). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// Returns a field of an [Object](#variant.Object) or [Case](#variant.Case).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Updates a field on an [Object](#variant.Object) or [Case](#variant.Case).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Object(_, ref mut fields) | Value::Case(_, ref mut fields) = *self {
            fields.insert(name.to_owned(), value);
        }
    }

    /// Removes a field of an [Object](#variant.Object) or [Case](#variant.Case).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Object(_, ref mut fields) | Value::Case(_, ref mut fields) = *self {
            fields.remove(name);
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("cannot index into a non-array value"),
        }
    }
}

fn fmt_fields(f: &mut fmt::Formatter, fields: &BTreeMap<String, Value>) -> fmt::Result {
    write!(f, "{{")?;
    let mut first = true;
    for (key, value) in fields {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        write!(f, "{}: {:?}", key, value)?;
    }
    write!(f, "}}")
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Number(value) => value.fmt(f),
            Value::Bool(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Blob(ref bytes) => write!(f, "blob{:02X?}", bytes),
            Value::Array(ref values) => values.fmt(f),
            Value::Enum(ref name, EnumValue::Known(ref value)) => write!(f, "{}::{}", name, value),
            Value::Enum(ref name, EnumValue::Unrecognized(value)) => write!(f, "{}({})", name, value),

            Value::Object(ref name, ref fields) => {
                write!(f, "{} ", name)?;
                fmt_fields(f, fields)
            }

            Value::Case(CaseTag::Value(value), ref fields) => {
                write!(f, "case {} ", value)?;
                fmt_fields(f, fields)
            }

            Value::Case(CaseTag::Default, ref fields) => {
                write!(f, "default ")?;
                fmt_fields(f, fields)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::Number(value) => serializer.serialize_u32(value),
            Value::Bool(value) => serializer.serialize_bool(value),
            Value::String(ref value) => serializer.serialize_str(value),
            Value::Enum(_, EnumValue::Known(ref value)) => serializer.serialize_str(value),
            Value::Enum(_, EnumValue::Unrecognized(value)) => serializer.serialize_u32(value),

            Value::Blob(ref bytes) => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }

            Value::Array(ref values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }

            Value::Object(_, ref fields) | Value::Case(_, ref fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_basic() {
        let value = Value::Array(vec![
            Value::Bool(true),
            Value::Number(255),
            Value::String("abc".to_owned()),
            Value::Blob(vec![0x01, 0xFF]),
            Value::variant("Direction", "Up"),
            Value::Enum("Direction".to_owned(), EnumValue::Unrecognized(9)),
            Value::object("Coords")
                .with("x", Value::Number(1))
                .with("y", Value::Number(2)),
            Value::case(CaseTag::Default).with("reason", Value::String("busy".to_owned())),
        ]);

        assert_eq!(value.len(), 8);

        assert_eq!(value[0].as_bool(), true);
        assert_eq!(value[1].as_number(), Some(255));
        assert_eq!(value[2].as_string(), "abc");
        assert_eq!(value[3].as_blob(), [0x01, 0xFF]);
        assert_eq!(value[4].as_string(), "Up");
        assert_eq!(value[5].as_number(), Some(9));
        assert_eq!(value[6].get("x"), Some(&Value::Number(1)));
        assert_eq!(value[7].get("reason").map(Value::as_string), Some("busy"));
        assert_eq!(value.get("x"), None);
        assert_eq!(value[2].as_number(), None);

        assert_eq!(
            format!("{:?}", value),
            "[true, 255, \"abc\", blob[01, FF], Direction::Up, Direction(9), \
             Coords {x: 1, y: 2}, default {reason: \"busy\"}]"
        );
    }

    #[test]
    fn value_push() {
        let mut value = Value::Array(vec![]);
        assert!(value.is_empty());

        value.push(Value::Number(123));
        value.push(Value::Number(456));
        assert_eq!(value.len(), 2);
        assert_eq!(value[1], Value::Number(456));
    }

    #[test]
    fn value_set_and_remove() {
        let mut value = Value::object("Foo");
        assert_eq!(value.get("x"), None);

        value.set("x", Value::Number(123));
        value.set("y", Value::Number(456));
        value.set("x", Value::Number(789));
        assert_eq!(value.get("x"), Some(&Value::Number(789)));
        assert_eq!(value.get("y"), Some(&Value::Number(456)));

        value.remove("x");
        assert_eq!(value.get("x"), None);
        assert_eq!(value.fields().map(BTreeMap::len), Some(1));

        let mut number = Value::Number(1);
        number.set("x", Value::Number(2));
        assert_eq!(number, Value::Number(1));
    }
}
