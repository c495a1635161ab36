//! Capability and tag mapping.

use crate::marshal::marshal;
use crate::source::{Caps, CapsFeatures, Structure, TagList};
use crate::tags;
use crate::value::{TypedValue, ValueMap};

/// One map per caps structure, in caps order.
///
/// Each map starts with `mimetype` and `features`, followed by the
/// structure's fields in their own order. An absent or empty descriptor
/// yields an empty list; callers that want to omit the field entirely
/// check for absence themselves.
pub fn map_capabilities(caps: Option<&Caps>) -> Vec<ValueMap> {
    let Some(caps) = caps else {
        return Vec::new();
    };
    caps.iter()
        .map(|(structure, features)| map_structure(structure, Some(features)))
        .collect()
}

pub fn map_structure(structure: &Structure, features: Option<&CapsFeatures>) -> ValueMap {
    let mut out = ValueMap::with_capacity(structure.n_fields() + 2);
    out.insert("mimetype", TypedValue::from(structure.name()));

    let features: Vec<TypedValue> = features
        .map(|f| f.iter().map(TypedValue::from).collect())
        .unwrap_or_default();
    out.insert("features", TypedValue::List(features));

    for (name, value) in structure.fields() {
        out.insert(name, marshal(value));
    }
    out
}

/// Tag list keyed by nick. `None` when there is no tag list at all.
///
/// A tag whose value can't be copied out of the list is skipped.
pub fn map_tags(tags: Option<&TagList>) -> Option<ValueMap> {
    let tags = tags?;
    let mut out = ValueMap::with_capacity(tags.n_tags());
    for tag in tags.tags() {
        match tags.copy_value(tag) {
            Some(value) => {
                let mapped = marshal(&value);
                tracing::trace!(
                    tag,
                    source = value.type_name(),
                    kind = mapped.kind_name(),
                    "mapped tag"
                );
                out.insert(tags::nick(tag), mapped);
            }
            None => tracing::trace!(tag, "skipping tag without a value"),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceValue;

    #[test]
    fn structure_fields_follow_header_keys() {
        let s = Structure::new("video/x-h264")
            .field("width", SourceValue::Int(1920))
            .field("height", SourceValue::Int(1080));
        let m = map_structure(&s, None);

        assert_eq!(
            m.keys().collect::<Vec<_>>(),
            vec!["mimetype", "features", "width", "height"]
        );
        assert_eq!(m.get("features"), Some(&TypedValue::List(vec![])));
    }

    #[test]
    fn absent_caps_is_empty_list() {
        assert!(map_capabilities(None).is_empty());
        assert!(map_capabilities(Some(&Caps::new())).is_empty());
    }

    #[test]
    fn absent_tags_is_none() {
        assert!(map_tags(None).is_none());
        assert_eq!(map_tags(Some(&TagList::new())), Some(ValueMap::new()));
    }
}
