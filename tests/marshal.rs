use mediaprobe::marshal;
use mediaprobe::source::{Buffer, Caps, CapsFeatures, ForeignValue, Fraction, Sample, SourceValue, Structure};
use mediaprobe::value::TypedValue;
use std::sync::Arc;

#[derive(Debug)]
struct Opaque(Option<&'static str>);

impl ForeignValue for Opaque {
    fn type_name(&self) -> &str {
        "Opaque"
    }

    fn to_text(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

#[test]
fn integers_keep_sign_and_width() {
    assert_eq!(marshal(&SourceValue::Int(-5)), TypedValue::Int(-5));
    assert_eq!(marshal(&SourceValue::UInt(u32::MAX)), TypedValue::UInt(u64::from(u32::MAX)));
    assert_eq!(marshal(&SourceValue::Int64(i64::MIN)), TypedValue::Int(i64::MIN));
    assert_eq!(marshal(&SourceValue::UInt64(u64::MAX)), TypedValue::UInt(u64::MAX));
    assert_eq!(marshal(&SourceValue::Double(0.25)), TypedValue::Float(0.25));
}

#[test]
fn list_and_array_keep_order() {
    let list = SourceValue::List(vec![SourceValue::Int(3), SourceValue::string("a")]);
    assert_eq!(
        marshal(&list),
        TypedValue::List(vec![TypedValue::Int(3), TypedValue::from("a")])
    );
    assert_eq!(
        marshal(&SourceValue::Array(Vec::new())),
        TypedValue::List(Vec::new())
    );
}

#[test]
fn ranges() {
    let r = marshal(&SourceValue::IntRange { min: 1, max: 8 });
    assert_eq!(r, TypedValue::range(TypedValue::Int(1), TypedValue::Int(8)));
    assert_eq!(serde_json::to_value(&r).unwrap(), serde_json::json!([1, 8]));

    let fr = SourceValue::FractionRange {
        min: Fraction::new(0, 1),
        max: Fraction::new(2147483647, 1),
    };
    assert_eq!(
        serde_json::to_value(marshal(&fr)).unwrap(),
        serde_json::json!([[0, 1], [2147483647, 1]])
    );
}

#[test]
fn buffers_copy_bytes() {
    let v = marshal(&SourceValue::Buffer(Buffer::from_slice(&[0xde, 0xad])));
    assert_eq!(v, TypedValue::Bytes(vec![0xde, 0xad]));
    assert_eq!(serde_json::to_value(&v).unwrap(), "dead");

    assert_eq!(marshal(&SourceValue::Buffer(Buffer::unmappable(16))), TypedValue::Null);
}

#[test]
fn sample_with_caps() {
    let sample = Sample {
        buffer: Some(Buffer::from_slice(b"\xff\xd8")),
        caps: Some(
            Caps::new()
                .with_features(
                    Structure::new("image/jpeg").field("width", SourceValue::Int(10)),
                    CapsFeatures::new(["memory:SystemMemory"]),
                )
                .with(Structure::new("image/png")),
        ),
    };
    let TypedValue::Sample { buffer, caps } = marshal(&SourceValue::Sample(sample)) else {
        panic!("expected a sample");
    };
    assert_eq!(*buffer, TypedValue::Bytes(vec![0xff, 0xd8]));

    // only the first structure is described
    let caps = caps.unwrap();
    let keys: Vec<_> = caps.keys().collect();
    assert_eq!(keys, vec!["mimetype", "features", "width"]);
    assert_eq!(caps.get("mimetype"), Some(&TypedValue::from("image/jpeg")));
    assert_eq!(
        caps.get("features"),
        Some(&TypedValue::List(vec![TypedValue::from("memory:SystemMemory")]))
    );
}

#[test]
fn sample_without_buffer() {
    let v = marshal(&SourceValue::Sample(Sample::default()));
    assert_eq!(
        v,
        TypedValue::Sample {
            buffer: Box::new(TypedValue::Null),
            caps: None
        }
    );
    assert_eq!(serde_json::to_value(&v).unwrap(), serde_json::json!({"buffer": null}));
}

#[test]
fn foreign_values_use_text_form() {
    let with_text = SourceValue::Foreign(Arc::new(Opaque(Some("2020-01-02"))));
    assert_eq!(marshal(&with_text), TypedValue::from("2020-01-02"));

    let without = SourceValue::Foreign(Arc::new(Opaque(None)));
    assert!(marshal(&without).is_null());
}

#[test]
fn source_is_left_untouched() {
    let v = SourceValue::List(vec![SourceValue::string("keep")]);
    let _ = marshal(&v);
    let _ = marshal(&v);
    let SourceValue::List(items) = &v else {
        panic!("expected a list");
    };
    assert!(matches!(&items[0], SourceValue::String(Some(s)) if s == "keep"));
}
