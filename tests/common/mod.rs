#![allow(dead_code)]

use mediaprobe::engine::{
    AudioInfo, DiscoveryResult, DiscoveryStatus, Engine, EngineError, EngineFactory, Ratio,
    StreamInfo, SubtitleInfo, VideoInfo,
};
use mediaprobe::source::{Caps, SourceValue, Structure, TagList};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Counts handles handed out and handles dropped.
#[derive(Debug, Default)]
pub struct Handles {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl Handles {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
pub enum Media {
    Audio(AudioInfo),
    Video(VideoInfo),
    Subtitle(SubtitleInfo),
    #[default]
    None,
}

/// Blueprint of one stream node.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub stream_id: Option<String>,
    pub caps: Option<Caps>,
    pub tags: Option<TagList>,
    pub media: Media,
    pub streams: Option<Vec<FakeNode>>,
    pub next: Option<Box<FakeNode>>,
}

impl FakeNode {
    pub fn container(streams: Vec<FakeNode>) -> Self {
        FakeNode {
            caps: Some(Caps::from_structure(Structure::new("video/quicktime"))),
            streams: Some(streams),
            ..Default::default()
        }
    }

    pub fn audio(id: &str) -> Self {
        FakeNode {
            stream_id: Some(id.to_string()),
            caps: Some(Caps::from_structure(
                Structure::new("audio/mpeg")
                    .field("mpegversion", SourceValue::Int(4))
                    .field("channels", SourceValue::Int(2)),
            )),
            media: Media::Audio(AudioInfo {
                language: Some("eng".into()),
                channels: 2,
                sample_rate: 48_000,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn video(id: &str) -> Self {
        FakeNode {
            stream_id: Some(id.to_string()),
            caps: Some(Caps::from_structure(
                Structure::new("video/x-h264").field("width", SourceValue::Int(1280)),
            )),
            media: Media::Video(VideoInfo {
                width: 1280,
                height: 720,
                frame_rate: Ratio::new(25, 1),
                pixel_aspect_ratio: Ratio::new(1, 1),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn subtitle(id: &str) -> Self {
        FakeNode {
            stream_id: Some(id.to_string()),
            media: Media::Subtitle(SubtitleInfo {
                language: Some("fra".into()),
            }),
            ..Default::default()
        }
    }

    pub fn then(mut self, next: FakeNode) -> Self {
        self.next = Some(Box::new(next));
        self
    }
}

/// Live handle into a [`FakeNode`] tree; counted on creation and drop.
pub struct FakeStream {
    node: Arc<FakeNode>,
    handles: Arc<Handles>,
}

impl FakeStream {
    fn new(node: FakeNode, handles: &Arc<Handles>) -> Self {
        handles.acquire();
        FakeStream {
            node: Arc::new(node),
            handles: Arc::clone(handles),
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.handles.release();
    }
}

impl StreamInfo for FakeStream {
    fn stream_id(&self) -> Option<String> {
        self.node.stream_id.clone()
    }

    fn caps(&self) -> Option<Caps> {
        self.node.caps.clone()
    }

    fn tags(&self) -> Option<TagList> {
        self.node.tags.clone()
    }

    fn audio(&self) -> Option<AudioInfo> {
        match &self.node.media {
            Media::Audio(a) => Some(a.clone()),
            _ => None,
        }
    }

    fn video(&self) -> Option<VideoInfo> {
        match &self.node.media {
            Media::Video(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn subtitle(&self) -> Option<SubtitleInfo> {
        match &self.node.media {
            Media::Subtitle(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn container_streams(&self) -> Option<Vec<FakeStream>> {
        self.node.streams.as_ref().map(|streams| {
            streams
                .iter()
                .map(|s| FakeStream::new(s.clone(), &self.handles))
                .collect()
        })
    }

    fn next(&self) -> Option<FakeStream> {
        self.node
            .next
            .as_ref()
            .map(|n| FakeStream::new((**n).clone(), &self.handles))
    }
}

pub struct FakeResult {
    script: Script,
    handles: Arc<Handles>,
}

impl Drop for FakeResult {
    fn drop(&mut self) {
        self.handles.release();
    }
}

impl DiscoveryResult for FakeResult {
    type Stream = FakeStream;

    fn status(&self) -> DiscoveryStatus {
        self.script.status
    }

    fn duration_ns(&self) -> Option<u64> {
        self.script.duration_ns
    }

    fn is_seekable(&self) -> bool {
        self.script.seekable
    }

    fn is_live(&self) -> bool {
        false
    }

    fn tags(&self) -> Option<TagList> {
        self.script.tags.clone()
    }

    fn stream_info(&self) -> Option<FakeStream> {
        self.script
            .root
            .as_ref()
            .map(|root| FakeStream::new(root.clone(), &self.handles))
    }
}

pub struct FakeEngine {
    script: Script,
    handles: Arc<Handles>,
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.handles.release();
    }
}

impl Engine for FakeEngine {
    type Output = FakeResult;

    fn discover(&mut self, _uri: &str) -> Result<FakeResult, EngineError> {
        if let Some(message) = &self.script.discover_error {
            return Err(EngineError::new(message.clone()));
        }
        self.handles.acquire();
        Ok(FakeResult {
            script: self.script.clone(),
            handles: Arc::clone(&self.handles),
        })
    }
}

/// What the fake engine reports.
#[derive(Debug, Clone)]
pub struct Script {
    pub create_fails: bool,
    pub discover_error: Option<String>,
    pub status: DiscoveryStatus,
    pub duration_ns: Option<u64>,
    pub seekable: bool,
    pub tags: Option<TagList>,
    pub root: Option<FakeNode>,
}

impl Default for Script {
    fn default() -> Self {
        Script {
            create_fails: false,
            discover_error: None,
            status: DiscoveryStatus::Ok,
            duration_ns: Some(0),
            seekable: true,
            tags: None,
            root: Some(FakeNode::container(Vec::new())),
        }
    }
}

pub struct FakeFactory {
    pub script: Script,
    pub handles: Arc<Handles>,
}

impl FakeFactory {
    pub fn new(script: Script) -> Self {
        FakeFactory {
            script,
            handles: Arc::new(Handles::default()),
        }
    }
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;

    fn create(&self, _timeout: Duration) -> Result<FakeEngine, EngineError> {
        if self.script.create_fails {
            return Err(EngineError::new("no engine"));
        }
        self.handles.acquire();
        Ok(FakeEngine {
            script: self.script.clone(),
            handles: Arc::clone(&self.handles),
        })
    }
}
