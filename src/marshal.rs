//! Conversion of engine values into [`TypedValue`].

use crate::caps::map_structure;
use crate::source::{Buffer, Fraction, Sample, SourceValue};
use crate::value::TypedValue;

/// Convert one engine value into the output model.
///
/// Never fails: kinds this crate doesn't know are rendered through their
/// text form when they have one, and as `Null` otherwise. The source value
/// is only read.
pub fn marshal(value: &SourceValue) -> TypedValue {
    match value {
        SourceValue::String(s) => s.as_deref().map_or(TypedValue::Null, TypedValue::from),
        SourceValue::Bool(b) => TypedValue::Bool(*b),
        SourceValue::Int(v) => TypedValue::Int(i64::from(*v)),
        SourceValue::UInt(v) => TypedValue::UInt(u64::from(*v)),
        SourceValue::Int64(v) => TypedValue::Int(*v),
        SourceValue::UInt64(v) => TypedValue::UInt(*v),
        SourceValue::Float(v) => TypedValue::Float(f64::from(*v)),
        SourceValue::Double(v) => TypedValue::Float(*v),

        SourceValue::List(items) => marshal_seq(items),
        SourceValue::IntRange { min, max } => {
            TypedValue::range(TypedValue::Int(i64::from(*min)), TypedValue::Int(i64::from(*max)))
        }
        SourceValue::FractionRange { min, max } => {
            TypedValue::range(marshal_fraction(min), marshal_fraction(max))
        }
        SourceValue::Array(items) => marshal_seq(items),
        SourceValue::Buffer(buf) => marshal_buffer(Some(buf)),
        SourceValue::Sample(sample) => marshal_sample(sample),
        SourceValue::Fraction(f) => marshal_fraction(f),

        SourceValue::Foreign(foreign) => match foreign.to_text() {
            Some(text) => TypedValue::Str(text),
            None => {
                tracing::trace!(kind = foreign.type_name(), "value kind has no text form");
                TypedValue::Null
            }
        },
    }
}

fn marshal_seq(items: &[SourceValue]) -> TypedValue {
    TypedValue::List(items.iter().map(marshal).collect())
}

fn marshal_fraction(f: &Fraction) -> TypedValue {
    TypedValue::List(vec![
        TypedValue::Int(i64::from(f.num)),
        TypedValue::Int(i64::from(f.denom)),
    ])
}

/// Copy a buffer's readable view. Missing or unmappable memory is `Null`.
fn marshal_buffer(buf: Option<&Buffer>) -> TypedValue {
    let Some(buf) = buf else {
        return TypedValue::Null;
    };
    match buf.map_readable() {
        Some(data) => TypedValue::Bytes(data.to_vec()),
        None => {
            tracing::trace!(len = buf.len(), "buffer cannot be mapped for reading");
            TypedValue::Null
        }
    }
}

fn marshal_sample(sample: &Sample) -> TypedValue {
    // Only the first structure describes a sample.
    let caps = sample.caps.as_ref().and_then(|caps| {
        if caps.size() > 1 {
            tracing::trace!(structures = caps.size(), "sample caps beyond the first are dropped");
        }
        caps.structure(0).map(|s| map_structure(s, caps.features(0)))
    });

    TypedValue::Sample {
        buffer: Box::new(marshal_buffer(sample.buffer.as_ref())),
        caps,
    }
}
