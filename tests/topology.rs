mod common;

use common::{FakeFactory, FakeNode, Media, Script};
use mediaprobe::engine::{AudioInfo, DiscoveryResult, Engine, EngineFactory, VideoInfo};
use mediaprobe::source::{Caps, SourceValue, Structure, TagList};
use mediaprobe::topology::build_node;
use mediaprobe::{StreamKind, StreamNode};
use std::time::Duration;

fn build(root: FakeNode) -> StreamNode {
    let factory = FakeFactory::new(Script {
        root: Some(root),
        ..Default::default()
    });
    let mut engine = factory.create(Duration::from_secs(1)).unwrap();
    let result = engine.discover("fake://").unwrap();
    let info = result.stream_info().unwrap();
    build_node(&info)
}

fn ids(nodes: &[StreamNode]) -> Vec<&str> {
    nodes.iter().filter_map(|n| n.stream_id.as_deref()).collect()
}

#[test]
fn container_streams_precede_next_chain() {
    let root = FakeNode::container(vec![FakeNode::audio("a"), FakeNode::video("v")])
        .then(FakeNode::subtitle("s1").then(FakeNode::subtitle("s2")));
    let node = build(root);

    assert_eq!(node.kind, StreamKind::Container);
    assert_eq!(ids(node.children()), vec!["a", "v", "s1", "s2"]);
}

#[test]
fn next_chain_without_container() {
    let node = build(FakeNode::video("v").then(FakeNode::audio("a")));
    assert_eq!(node.kind, StreamKind::Video);
    assert!(!node.is_leaf());
    assert_eq!(ids(node.children()), vec!["a"]);
    assert!(node.children()[0].is_leaf());
}

#[test]
fn empty_container_has_empty_children() {
    let node = build(FakeNode::container(Vec::new()));
    assert_eq!(node.children.as_deref().map(<[_]>::len), Some(0));

    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["children"], serde_json::json!([]));
}

#[test]
fn leaf_has_no_children_key() {
    let node = build(FakeNode::audio("a"));
    assert!(node.is_leaf());
    let json = serde_json::to_value(&node).unwrap();
    assert!(json.get("children").is_none());
}

#[test]
fn kind_follows_stream_detail() {
    let audio = FakeNode {
        media: Media::Audio(AudioInfo::default()),
        ..FakeNode::video("x")
    };
    let node = build(audio);
    assert_eq!(node.kind, StreamKind::Audio);
    assert!(node.video.is_none());

    let video = FakeNode {
        media: Media::Video(VideoInfo::default()),
        ..Default::default()
    };
    let node = build(video);
    assert_eq!(node.kind, StreamKind::Video);
    assert!(node.audio.is_none());
}

#[test]
fn node_without_kind_is_unknown() {
    let node = build(FakeNode::default());
    assert_eq!(node.kind, StreamKind::Unknown);
    assert!(node.mime_type.is_none());
    assert!(node.capabilities.is_none());
}

#[test]
fn descriptor_fields() {
    let node = build(FakeNode {
        stream_id: Some("7".into()),
        caps: Some(Caps::from_structure(
            Structure::new("audio/x-opus").field("channels", SourceValue::Int(6)),
        )),
        tags: Some(TagList::new().with("language-code", SourceValue::string("deu"))),
        media: Media::Audio(AudioInfo {
            channels: 6,
            ..Default::default()
        }),
        ..Default::default()
    });

    assert_eq!(node.mime_type.as_deref(), Some("audio/x-opus"));
    let caps = node.capabilities.as_ref().unwrap();
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].get("channels").and_then(|v| v.as_i64()), Some(6));
    let tags = node.tags.as_ref().unwrap();
    assert_eq!(tags.get("Language Code").and_then(|v| v.as_str()), Some("deu"));

    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["kind"], "audio");
    assert_eq!(json["streamId"], "7");
    assert_eq!(json["channels"], 6);
}

#[test]
fn subtitles_kind_name() {
    let node = build(FakeNode::subtitle("t"));
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["kind"], "subtitles");
    assert_eq!(json["language"], "fra");
}

#[test]
fn walk_is_depth_first() {
    let root = FakeNode::container(vec![
        FakeNode::container(vec![FakeNode::audio("a1")]),
        FakeNode::video("v"),
    ]);
    let node = build(root);

    let mut seen = Vec::new();
    node.walk(&mut |n, depth| seen.push((n.kind, depth)));
    assert_eq!(
        seen,
        vec![
            (StreamKind::Container, 0),
            (StreamKind::Container, 1),
            (StreamKind::Audio, 2),
            (StreamKind::Video, 1),
        ]
    );
}

#[test]
fn audio_stream_with_container_streams() {
    let node = build(FakeNode {
        streams: Some(vec![FakeNode::video("v"), FakeNode::subtitle("s")]),
        ..FakeNode::audio("a")
    });
    assert_eq!(node.kind, StreamKind::Audio);
    assert!(node.audio.is_some());
    assert_eq!(ids(node.children()), vec!["v", "s"]);

    let node = build(FakeNode {
        streams: Some(Vec::new()),
        ..FakeNode::audio("a")
    });
    assert_eq!(node.kind, StreamKind::Audio);
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["kind"], "audio");
    assert_eq!(json["children"], serde_json::json!([]));
}
