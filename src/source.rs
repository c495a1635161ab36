//! Engine-side value system.
//!
//! These are the values an analysis engine hands out: capability structures,
//! tag lists and the open-ended set of typed field values they carry. Engines
//! may add their own kinds through [`ForeignValue`].

use std::fmt;
use std::sync::Arc;

/// A value kind registered outside this crate (e.g. by an engine plugin).
pub trait ForeignValue: fmt::Debug + Send + Sync {
    /// Registered type name, for logging.
    fn type_name(&self) -> &str;

    /// Text form of the value, if this kind can be transformed to a string.
    fn to_text(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub num: i32,
    pub denom: i32,
}

impl Fraction {
    pub fn new(num: i32, denom: i32) -> Self {
        Fraction { num, denom }
    }

    /// Build a reduced fraction from a possibly large ratio, scaling both
    /// terms down until they fit in `i32`.
    pub fn approximate(mut num: u64, mut denom: u64) -> Self {
        if denom == 0 {
            return Fraction::new(0, 1);
        }
        let g = gcd(num, denom);
        num /= g;
        denom /= g;
        while num > i32::MAX as u64 || denom > i32::MAX as u64 {
            num /= 2;
            denom = (denom / 2).max(1);
        }
        Fraction::new(num as i32, denom as i32)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

/// Binary payload. Readable memory is shared; unmappable memory only
/// records its length.
#[derive(Debug, Clone)]
pub struct Buffer {
    memory: Memory,
}

#[derive(Debug, Clone)]
enum Memory {
    System(Arc<[u8]>),
    Unmappable(usize),
}

impl Buffer {
    pub fn from_slice(data: &[u8]) -> Self {
        Buffer {
            memory: Memory::System(Arc::from(data)),
        }
    }

    /// Memory that exists but cannot be mapped for reading.
    pub fn unmappable(len: usize) -> Self {
        Buffer {
            memory: Memory::Unmappable(len),
        }
    }

    pub fn len(&self) -> usize {
        match &self.memory {
            Memory::System(data) => data.len(),
            Memory::Unmappable(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Readable view of the payload, `None` when the memory can't be mapped.
    pub fn map_readable(&self) -> Option<&[u8]> {
        match &self.memory {
            Memory::System(data) => Some(&data[..]),
            Memory::Unmappable(_) => None,
        }
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(v: Vec<u8>) -> Self {
        Buffer {
            memory: Memory::System(Arc::from(v)),
        }
    }
}

/// A buffer with the caps describing its content.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub buffer: Option<Buffer>,
    pub caps: Option<Caps>,
}

/// One typed value as exposed by an engine.
#[derive(Debug, Clone)]
pub enum SourceValue {
    String(Option<String>),
    Bool(bool),
    Int(i32),
    UInt(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Fraction(Fraction),
    /// Unordered set of alternatives.
    List(Vec<SourceValue>),
    IntRange { min: i32, max: i32 },
    FractionRange { min: Fraction, max: Fraction },
    /// Fixed-size ordered array.
    Array(Vec<SourceValue>),
    Buffer(Buffer),
    Sample(Sample),
    Foreign(Arc<dyn ForeignValue>),
}

impl SourceValue {
    pub fn string(s: impl Into<String>) -> Self {
        SourceValue::String(Some(s.into()))
    }

    pub fn type_name(&self) -> &str {
        match self {
            SourceValue::String(_) => "gchararray",
            SourceValue::Bool(_) => "gboolean",
            SourceValue::Int(_) => "gint",
            SourceValue::UInt(_) => "guint",
            SourceValue::Int64(_) => "gint64",
            SourceValue::UInt64(_) => "guint64",
            SourceValue::Float(_) => "gfloat",
            SourceValue::Double(_) => "gdouble",
            SourceValue::Fraction(_) => "fraction",
            SourceValue::List(_) => "list",
            SourceValue::IntRange { .. } => "int-range",
            SourceValue::FractionRange { .. } => "fraction-range",
            SourceValue::Array(_) => "array",
            SourceValue::Buffer(_) => "buffer",
            SourceValue::Sample(_) => "sample",
            SourceValue::Foreign(f) => f.type_name(),
        }
    }
}

/// Named record of typed fields, kept in the order fields were set.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    name: String,
    fields: Vec<(String, SourceValue)>,
}

impl Structure {
    pub fn new(name: impl Into<String>) -> Self {
        Structure {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`Structure::set`].
    pub fn field(mut self, name: impl Into<String>, value: SourceValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field; an existing field is overwritten where it stands.
    pub fn set(&mut self, name: impl Into<String>, value: SourceValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&SourceValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &SourceValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }
}

/// Extra capability flags attached to one caps structure, e.g.
/// `memory:DMABuf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapsFeatures(Vec<String>);

impl CapsFeatures {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CapsFeatures(features.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered set of alternative structures describing acceptable formats.
#[derive(Debug, Clone, Default)]
pub struct Caps {
    entries: Vec<(Structure, CapsFeatures)>,
}

impl Caps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_structure(s: Structure) -> Self {
        Caps::new().with(s)
    }

    pub fn with(mut self, s: Structure) -> Self {
        self.entries.push((s, CapsFeatures::default()));
        self
    }

    pub fn with_features(mut self, s: Structure, features: CapsFeatures) -> Self {
        self.entries.push((s, features));
        self
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn structure(&self, idx: usize) -> Option<&Structure> {
        self.entries.get(idx).map(|(s, _)| s)
    }

    pub fn features(&self, idx: usize) -> Option<&CapsFeatures> {
        self.entries.get(idx).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Structure, &CapsFeatures)> {
        self.entries.iter().map(|(s, f)| (s, f))
    }
}

/// Descriptive metadata keyed by tag name. A tag may carry several values.
#[derive(Debug, Clone, Default)]
pub struct TagList {
    entries: Vec<(String, Vec<SourceValue>)>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; values for an existing tag accumulate.
    pub fn add(&mut self, tag: impl Into<String>, value: SourceValue) {
        let tag = tag.into();
        match self.entries.iter_mut().find(|(k, _)| *k == tag) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((tag, vec![value])),
        }
    }

    pub fn with(mut self, tag: impl Into<String>, value: SourceValue) -> Self {
        self.add(tag, value);
        self
    }

    /// Register a tag without a value. [`TagList::copy_value`] fails on it.
    pub fn add_empty(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.entries.iter().any(|(k, _)| *k == tag) {
            self.entries.push((tag, Vec::new()));
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn n_tags(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge every value stored for `tag` into one.
    ///
    /// Several strings are joined with ", ", several values of any other
    /// kind become a list. `None` when the tag holds no value.
    pub fn copy_value(&self, tag: &str) -> Option<SourceValue> {
        let values = self
            .entries
            .iter()
            .find(|(k, _)| k == tag)
            .map(|(_, v)| v)?;

        match values.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => {
                let strings: Option<Vec<&str>> = many
                    .iter()
                    .map(|v| match v {
                        SourceValue::String(Some(s)) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                match strings {
                    Some(parts) => Some(SourceValue::string(parts.join(", "))),
                    None => Some(SourceValue::List(many.to_vec())),
                }
            }
        }
    }
}
