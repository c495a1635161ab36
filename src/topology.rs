use crate::caps::{map_capabilities, map_tags};
use crate::engine::{AudioInfo, StreamInfo, SubtitleInfo, VideoInfo};
use crate::value::ValueMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Container,
    Audio,
    Video,
    #[serde(rename = "subtitles")]
    Subtitle,
    Unknown,
}

/// One entry of the stream topology tree.
///
/// `children` keeps discovery order: the node's container streams first,
/// then its chain of next streams.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamNode {
    pub kind: StreamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<ValueMap>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<ValueMap>,

    #[serde(flatten)]
    pub audio: Option<AudioInfo>,
    #[serde(flatten)]
    pub video: Option<VideoInfo>,
    #[serde(flatten)]
    pub subtitle: Option<SubtitleInfo>,

    /// `None` for a leaf, `Some` (possibly empty) for a container or a node
    /// with chained streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StreamNode>>,
}

impl StreamNode {
    pub fn children(&self) -> &[StreamNode] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Depth-first walk, this node first.
    pub fn walk(&self, visit: &mut impl FnMut(&StreamNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&StreamNode, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }
}

/// Rebuild an engine stream graph into an owned tree.
///
/// No handle into the graph outlives this call. Recursion follows the
/// graph's own depth.
pub fn build_node<S: StreamInfo>(info: &S) -> StreamNode {
    let caps = info.caps();
    let mime_type = caps
        .as_ref()
        .and_then(|c| c.structure(0))
        .map(|s| s.name().to_string());
    let capabilities = caps.as_ref().map(|c| map_capabilities(Some(c)));
    let tags = map_tags(info.tags().as_ref());

    let audio = info.audio();
    let video = if audio.is_none() { info.video() } else { None };
    let subtitle = if audio.is_none() && video.is_none() {
        info.subtitle()
    } else {
        None
    };

    let streams = info.container_streams();
    let is_container = streams.is_some();

    let kind = if audio.is_some() {
        StreamKind::Audio
    } else if video.is_some() {
        StreamKind::Video
    } else if subtitle.is_some() {
        StreamKind::Subtitle
    } else if is_container {
        StreamKind::Container
    } else {
        StreamKind::Unknown
    };

    let n_streams = streams.as_ref().map_or(0, Vec::len);
    let n_next = next_chain(info).count();
    let mut children = Vec::with_capacity(n_streams + n_next);

    if let Some(streams) = streams {
        children.extend(streams.iter().map(build_node));
    }
    children.extend(next_chain(info).map(|next| build_node(&next)));

    tracing::trace!(?kind, n_streams, n_next, "built stream node");

    StreamNode {
        kind,
        stream_id: info.stream_id(),
        mime_type,
        capabilities,
        tags,
        audio,
        video,
        subtitle,
        children: if children.is_empty() && !is_container {
            None
        } else {
            Some(children)
        },
    }
}

fn next_chain<S: StreamInfo>(info: &S) -> impl Iterator<Item = S> {
    std::iter::successors(info.next(), StreamInfo::next)
}
