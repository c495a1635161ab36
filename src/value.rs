use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// Uniform output value every marshalled source value ends up as.
///
/// The variant tag alone decides which payload is present; the marshaller
/// never builds a half-filled variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<TypedValue>),
    Range {
        min: Box<TypedValue>,
        max: Box<TypedValue>,
    },
    Map(ValueMap),
    /// A binary payload together with the capabilities describing it.
    Sample {
        buffer: Box<TypedValue>,
        caps: Option<ValueMap>,
    },
}

impl TypedValue {
    pub fn range(min: TypedValue, max: TypedValue) -> Self {
        TypedValue::Range {
            min: Box::new(min),
            max: Box::new(max),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TypedValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Name of the variant, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "bool",
            TypedValue::Int(_) => "int",
            TypedValue::UInt(_) => "uint",
            TypedValue::Float(_) => "float",
            TypedValue::Str(_) => "string",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::List(_) => "list",
            TypedValue::Range { .. } => "range",
            TypedValue::Map(_) => "map",
            TypedValue::Sample { .. } => "sample",
        }
    }

    fn write_pretty(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            TypedValue::Null => write!(f, "null"),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::UInt(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Str(s) => write!(f, "{:?}", s),
            TypedValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            TypedValue::List(items) => {
                if items.is_empty() {
                    return write!(f, "[]");
                }
                writeln!(f, "[")?;
                for item in items {
                    write!(f, "{}  ", pad)?;
                    item.write_pretty(f, indent + 1)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{}]", pad)
            }
            TypedValue::Range { min, max } => {
                write!(f, "[")?;
                min.write_pretty(f, indent)?;
                write!(f, " .. ")?;
                max.write_pretty(f, indent)?;
                write!(f, "]")
            }
            TypedValue::Map(m) => m.write_pretty(f, indent),
            TypedValue::Sample { buffer, caps } => {
                write!(f, "sample(buffer=")?;
                buffer.write_pretty(f, indent)?;
                if let Some(caps) = caps {
                    write!(f, ", caps=")?;
                    caps.write_pretty(f, indent)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_pretty(f, 0)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::Str(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Str(s)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<ValueMap> for TypedValue {
    fn from(m: ValueMap) -> Self {
        TypedValue::Map(m)
    }
}

/// String-keyed map that iterates in insertion order.
///
/// Inserting an existing key replaces its value in place (last wins, first
/// position kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, TypedValue)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: TypedValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_pretty(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "{{}}");
        }
        let pad = "  ".repeat(indent);
        writeln!(f, "{{")?;
        for (k, v) in &self.entries {
            write!(f, "{}  {}: ", pad, k)?;
            v.write_pretty(f, indent + 1)?;
            writeln!(f, ",")?;
        }
        write!(f, "{}}}", pad)
    }
}

impl fmt::Display for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_pretty(f, 0)
    }
}

impl<K: Into<String>> FromIterator<(K, TypedValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, TypedValue)>>(iter: I) -> Self {
        let mut m = ValueMap::new();
        for (k, v) in iter {
            m.insert(k, v);
        }
        m
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Null => serializer.serialize_unit(),
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::Int(v) => serializer.serialize_i64(*v),
            TypedValue::UInt(v) => serializer.serialize_u64(*v),
            TypedValue::Float(v) => serializer.serialize_f64(*v),
            TypedValue::Str(s) => serializer.serialize_str(s),
            TypedValue::Bytes(b) => serializer.serialize_str(&hex::encode(b)),
            TypedValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TypedValue::Range { min, max } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(min)?;
                seq.serialize_element(max)?;
                seq.end()
            }
            TypedValue::Map(m) => m.serialize(serializer),
            TypedValue::Sample { buffer, caps } => {
                let len = if caps.is_some() { 2 } else { 1 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("buffer", buffer)?;
                if let Some(caps) = caps {
                    map.serialize_entry("caps", caps)?;
                }
                map.end()
            }
        }
    }
}
