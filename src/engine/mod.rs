//! Boundary to the analysis engine that actually inspects a media resource.
//!
//! Every handle an engine gives out is an owned value and is released by
//! dropping it. The probe session relies on that to release each handle
//! exactly once on every path.

pub mod mp4;

use crate::source::{Caps, TagList};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Outcome code of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    Ok,
    UriInvalid,
    Error,
    Timeout,
    Busy,
    MissingPlugins,
}

impl DiscoveryStatus {
    pub fn nick(&self) -> &'static str {
        match self {
            DiscoveryStatus::Ok => "ok",
            DiscoveryStatus::UriInvalid => "uri-invalid",
            DiscoveryStatus::Error => "error",
            DiscoveryStatus::Timeout => "timeout",
            DiscoveryStatus::Busy => "busy",
            DiscoveryStatus::MissingPlugins => "missing-plugins",
        }
    }
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

/// Creates engines. One factory serves every probe in the process.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: Engine;

    /// Process-wide setup, run once before the first engine is created.
    fn initialize(&self) {}

    /// Build an engine bounded by `timeout`.
    fn create(&self, timeout: Duration) -> Result<Self::Engine>;
}

pub trait Engine {
    type Output: DiscoveryResult;

    /// Inspect `uri`, blocking until the engine finishes or gives up.
    fn discover(&mut self, uri: &str) -> Result<Self::Output>;
}

pub trait DiscoveryResult {
    type Stream: StreamInfo;

    fn status(&self) -> DiscoveryStatus;
    /// Total duration in nanoseconds, `None` when unknown.
    fn duration_ns(&self) -> Option<u64>;
    fn is_seekable(&self) -> bool;
    fn is_live(&self) -> bool;
    fn tags(&self) -> Option<TagList>;
    /// Root of the stream graph.
    fn stream_info(&self) -> Option<Self::Stream>;
}

/// One node of the engine's stream graph.
///
/// The specialised accessors return `Some` only for nodes of that kind.
/// A node is a container when [`StreamInfo::container_streams`] is `Some`,
/// independently of its media kind.
pub trait StreamInfo: Sized {
    fn stream_id(&self) -> Option<String>;
    fn caps(&self) -> Option<Caps>;
    fn tags(&self) -> Option<TagList>;

    fn audio(&self) -> Option<AudioInfo>;
    fn video(&self) -> Option<VideoInfo>;
    fn subtitle(&self) -> Option<SubtitleInfo>;

    /// Ordered children of a container node.
    fn container_streams(&self) -> Option<Vec<Self>>;
    /// Next node in this node's chain.
    fn next(&self) -> Option<Self>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInfo {
    pub language: Option<String>,
    pub channels: u32,
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub bitrate: u32,
    pub max_bitrate: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ratio {
    pub num: u32,
    pub denom: u32,
}

impl Ratio {
    pub fn new(num: u32, denom: u32) -> Self {
        Ratio { num, denom }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
    pub frame_rate: Ratio,
    pub pixel_aspect_ratio: Ratio,
    pub interlaced: bool,
    pub is_image: bool,
    pub bitrate: u32,
    pub max_bitrate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubtitleInfo {
    pub language: Option<String>,
}
