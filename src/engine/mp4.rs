//! ISO-BMFF / MP4 analysis engine.
//!
//! Reads the box tree of a local file and exposes it as a stream graph: one
//! container node for the file with one child per `trak`.

use super::{
    AudioInfo, DiscoveryResult, DiscoveryStatus, Engine, EngineError, EngineFactory, Ratio,
    StreamInfo, SubtitleInfo, VideoInfo,
};
use crate::boxes::{BoxRef, FourCC, find_box};
use crate::parser;
use crate::source::{Buffer, Caps, ForeignValue, Fraction, Sample, SourceValue, Structure, TagList};
use crate::util::{lang_from_u16, percent_decode, read_payload};
use anyhow::{Context, bail};
use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shortest timeout the engine accepts, in seconds.
pub const MIN_TIMEOUT_SECS: u32 = 1;
/// Longest timeout the engine accepts, in seconds.
pub const MAX_TIMEOUT_SECS: u32 = 3600;

const MIN_TIMEOUT: Duration = Duration::from_secs(MIN_TIMEOUT_SECS as u64);
const MAX_TIMEOUT: Duration = Duration::from_secs(MAX_TIMEOUT_SECS as u64);

pub struct Mp4EngineFactory;

impl EngineFactory for Mp4EngineFactory {
    type Engine = Mp4Engine;

    fn initialize(&self) {
        tracing::debug!("mp4 analysis engine ready");
    }

    fn create(&self, timeout: Duration) -> super::Result<Mp4Engine> {
        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&timeout) {
            return Err(EngineError::new(format!(
                "timeout {:?} outside accepted range {:?}..={:?}",
                timeout, MIN_TIMEOUT, MAX_TIMEOUT
            )));
        }
        Ok(Mp4Engine { timeout })
    }
}

pub struct Mp4Engine {
    timeout: Duration,
}

impl Engine for Mp4Engine {
    type Output = Mp4Discovery;

    fn discover(&mut self, uri: &str) -> super::Result<Mp4Discovery> {
        let path = path_from_uri(uri)?;
        let mut file = File::open(&path)
            .map_err(|e| EngineError::new(format!("{}: {}", path.display(), e)))?;
        let len = file
            .metadata()
            .map_err(|e| EngineError::new(format!("{}: {}", path.display(), e)))?
            .len();

        let started = Instant::now();
        let discovery = match analyze(&mut file, len) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "analysis failed");
                return Ok(Mp4Discovery::with_status(DiscoveryStatus::Error));
            }
        };

        if started.elapsed() > self.timeout {
            tracing::warn!(path = %path.display(), timeout = ?self.timeout, "analysis timed out");
            return Ok(Mp4Discovery::with_status(DiscoveryStatus::Timeout));
        }
        Ok(discovery)
    }
}

fn path_from_uri(uri: &str) -> super::Result<PathBuf> {
    match uri.split_once("://") {
        None => Ok(PathBuf::from(uri)),
        Some(("file", rest)) => Ok(PathBuf::from(percent_decode(rest))),
        Some((scheme, _)) => Err(EngineError::new(format!(
            "unsupported URI scheme '{}'",
            scheme
        ))),
    }
}

pub struct Mp4Discovery {
    status: DiscoveryStatus,
    duration_ns: Option<u64>,
    seekable: bool,
    tags: Option<TagList>,
    root: Option<Mp4Stream>,
}

impl Mp4Discovery {
    fn with_status(status: DiscoveryStatus) -> Self {
        Mp4Discovery {
            status,
            duration_ns: None,
            seekable: false,
            tags: None,
            root: None,
        }
    }
}

impl DiscoveryResult for Mp4Discovery {
    type Stream = Mp4Stream;

    fn status(&self) -> DiscoveryStatus {
        self.status
    }

    fn duration_ns(&self) -> Option<u64> {
        self.duration_ns
    }

    fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn is_live(&self) -> bool {
        false
    }

    fn tags(&self) -> Option<TagList> {
        self.tags.clone()
    }

    fn stream_info(&self) -> Option<Mp4Stream> {
        self.root.clone()
    }
}

/// Shared handle to one node of the MP4 stream graph.
#[derive(Debug, Clone)]
pub struct Mp4Stream(Arc<StreamData>);

#[derive(Debug)]
struct StreamData {
    stream_id: Option<String>,
    caps: Option<Caps>,
    tags: Option<TagList>,
    detail: Detail,
    streams: Option<Vec<Mp4Stream>>,
}

#[derive(Debug)]
enum Detail {
    Audio(AudioInfo),
    Video(VideoInfo),
    Subtitle(SubtitleInfo),
    None,
}

impl StreamInfo for Mp4Stream {
    fn stream_id(&self) -> Option<String> {
        self.0.stream_id.clone()
    }

    fn caps(&self) -> Option<Caps> {
        self.0.caps.clone()
    }

    fn tags(&self) -> Option<TagList> {
        self.0.tags.clone()
    }

    fn audio(&self) -> Option<AudioInfo> {
        match &self.0.detail {
            Detail::Audio(a) => Some(a.clone()),
            _ => None,
        }
    }

    fn video(&self) -> Option<VideoInfo> {
        match &self.0.detail {
            Detail::Video(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn subtitle(&self) -> Option<SubtitleInfo> {
        match &self.0.detail {
            Detail::Subtitle(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn container_streams(&self) -> Option<Vec<Mp4Stream>> {
        self.0.streams.clone()
    }

    fn next(&self) -> Option<Mp4Stream> {
        None
    }
}

// ---------- Analysis ----------

fn analyze<R: Read + Seek>(r: &mut R, len: u64) -> anyhow::Result<Mp4Discovery> {
    let boxes = parser::parse_file(r, len).context("parsing box tree")?;

    let brand = match find_box(&boxes, b"ftyp") {
        Some(ftyp) => read_payload(r, ftyp)?.get(0..4).map(|b| FourCC([b[0], b[1], b[2], b[3]])),
        None => None,
    };
    let variant = Variant::from_brand(brand);

    let Some(moov) = find_box(&boxes, b"moov") else {
        tracing::debug!("no moov box, nothing to describe");
        return Ok(Mp4Discovery::with_status(DiscoveryStatus::Ok));
    };

    let duration_ns = match moov.child(b"mvhd") {
        Some(mvhd) => read_mvhd(r, mvhd)?,
        None => None,
    };

    let mut tags = TagList::new().with("container-format", SourceValue::string(variant.format_name()));
    if let Some(ilst) = moov.find(&[b"udta", b"meta", b"ilst"]).or_else(|| moov.find(&[b"meta", b"ilst"])) {
        read_ilst(r, ilst, &mut tags)?;
    }

    let tracks = moov
        .children_of(b"trak")
        .map(|trak| read_track(r, trak))
        .collect::<anyhow::Result<Vec<_>>>()?;
    tracing::debug!(tracks = tracks.len(), ?brand, "analyzed movie");

    let caps = Caps::from_structure(
        Structure::new("video/quicktime").field("variant", SourceValue::string(variant.caps_name())),
    );
    let root = Mp4Stream(Arc::new(StreamData {
        stream_id: None,
        caps: Some(caps),
        tags: Some(tags.clone()),
        detail: Detail::None,
        streams: Some(tracks),
    }));

    Ok(Mp4Discovery {
        status: DiscoveryStatus::Ok,
        duration_ns,
        seekable: duration_ns.is_some_and(|d| d > 0),
        tags: Some(tags),
        root: Some(root),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Iso,
    Apple,
    ThreeGpp,
}

impl Variant {
    fn from_brand(brand: Option<FourCC>) -> Self {
        match brand.map(|b| b.0) {
            Some(b) if &b == b"qt  " => Variant::Apple,
            Some([b'3', b'g', ..]) => Variant::ThreeGpp,
            _ => Variant::Iso,
        }
    }

    fn caps_name(&self) -> &'static str {
        match self {
            Variant::Iso => "iso",
            Variant::Apple => "apple",
            Variant::ThreeGpp => "3gpp",
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            Variant::Iso => "ISO MP4/M4A",
            Variant::Apple => "Quicktime",
            Variant::ThreeGpp => "3GP",
        }
    }
}

fn full_box_cursor<R: Read + Seek>(r: &mut R, b: &BoxRef) -> anyhow::Result<Cursor<Vec<u8>>> {
    Ok(Cursor::new(read_payload(r, b)?))
}

fn scale_to_ns(ticks: u64, timescale: u32) -> Option<u64> {
    if timescale == 0 {
        return None;
    }
    let ns = u128::from(ticks) * 1_000_000_000 / u128::from(timescale);
    u64::try_from(ns).ok()
}

// mvhd: movie duration in nanoseconds, None when unknown
fn read_mvhd<R: Read + Seek>(r: &mut R, mvhd: &BoxRef) -> anyhow::Result<Option<u64>> {
    let mut cur = full_box_cursor(r, mvhd)?;
    let (timescale, duration) = if mvhd.version() == 1 {
        cur.seek(SeekFrom::Current(16))?;
        let ts = cur.read_u32::<BigEndian>()?;
        let dur = cur.read_u64::<BigEndian>()?;
        (ts, (dur != u64::MAX).then_some(dur))
    } else {
        cur.seek(SeekFrom::Current(8))?;
        let ts = cur.read_u32::<BigEndian>()?;
        let dur = cur.read_u32::<BigEndian>()?;
        (ts, (dur != u32::MAX).then_some(u64::from(dur)))
    };
    Ok(duration.and_then(|d| scale_to_ns(d, timescale)))
}

struct TrackHeader {
    track_id: u32,
    width: u32,
    height: u32,
}

// tkhd: track id and presentation size (16.16 fixed point)
fn read_tkhd<R: Read + Seek>(r: &mut R, tkhd: &BoxRef) -> anyhow::Result<TrackHeader> {
    let mut cur = full_box_cursor(r, tkhd)?;
    let track_id = if tkhd.version() == 1 {
        cur.seek(SeekFrom::Current(16))?;
        let id = cur.read_u32::<BigEndian>()?;
        cur.seek(SeekFrom::Current(4 + 8))?;
        id
    } else {
        cur.seek(SeekFrom::Current(8))?;
        let id = cur.read_u32::<BigEndian>()?;
        cur.seek(SeekFrom::Current(4 + 4))?;
        id
    };
    // reserved[2], layer, alternate_group, volume, reserved, matrix
    cur.seek(SeekFrom::Current(8 + 8 + 36))?;
    let width = cur.read_u32::<BigEndian>().unwrap_or(0) >> 16;
    let height = cur.read_u32::<BigEndian>().unwrap_or(0) >> 16;
    Ok(TrackHeader { track_id, width, height })
}

struct MediaHeader {
    timescale: u32,
    duration: u64,
    language: String,
}

// mdhd: timescale, duration, language
fn read_mdhd<R: Read + Seek>(r: &mut R, mdhd: &BoxRef) -> anyhow::Result<MediaHeader> {
    let mut cur = full_box_cursor(r, mdhd)?;
    let (timescale, duration) = if mdhd.version() == 1 {
        cur.seek(SeekFrom::Current(16))?;
        (cur.read_u32::<BigEndian>()?, cur.read_u64::<BigEndian>()?)
    } else {
        cur.seek(SeekFrom::Current(8))?;
        (cur.read_u32::<BigEndian>()?, u64::from(cur.read_u32::<BigEndian>()?))
    };
    let language = lang_from_u16(cur.read_u16::<BigEndian>()?);
    Ok(MediaHeader {
        timescale,
        duration,
        language,
    })
}

// hdlr: handler type
fn read_hdlr<R: Read + Seek>(r: &mut R, hdlr: &BoxRef) -> anyhow::Result<FourCC> {
    let mut cur = full_box_cursor(r, hdlr)?;
    let _pre_defined = cur.read_u32::<BigEndian>()?;
    let mut handler = [0u8; 4];
    cur.read_exact(&mut handler)?;
    Ok(FourCC(handler))
}

// stsz: sample count and total payload size
fn read_stsz<R: Read + Seek>(r: &mut R, stsz: &BoxRef) -> anyhow::Result<(u32, u64)> {
    let mut cur = full_box_cursor(r, stsz)?;
    let sample_size = cur.read_u32::<BigEndian>()?;
    let sample_count = cur.read_u32::<BigEndian>()?;
    let total = if sample_size != 0 {
        u64::from(sample_size) * u64::from(sample_count)
    } else {
        let mut sum = 0u64;
        for _ in 0..sample_count {
            sum += u64::from(cur.read_u32::<BigEndian>()?);
        }
        sum
    };
    Ok((sample_count, total))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl From<FourCC> for TrackKind {
    fn from(handler: FourCC) -> Self {
        match &handler.0 {
            b"vide" => TrackKind::Video,
            b"soun" => TrackKind::Audio,
            b"sbtl" | b"text" | b"subt" => TrackKind::Subtitle,
            _ => TrackKind::Other,
        }
    }
}

/// First sample description of a track.
#[derive(Debug, Default)]
struct SampleEntry {
    codec: Option<FourCC>,
    width: u16,
    height: u16,
    depth: u16,
    channels: u16,
    sample_size: u16,
    sample_rate: u32,
    /// Child boxes of the entry (avcC, esds, pasp, btrt, ...).
    extensions: Vec<(FourCC, Vec<u8>)>,
}

impl SampleEntry {
    fn extension(&self, typ: &[u8; 4]) -> Option<&[u8]> {
        self.extensions
            .iter()
            .find(|(t, _)| &t.0 == typ)
            .map(|(_, data)| data.as_slice())
    }
}

const SAMPLE_ENTRY_HEADER: usize = 8;
const VISUAL_ENTRY_BODY: usize = 78;
const AUDIO_ENTRY_BODY: usize = 28;

// stsd: first sample entry
fn read_stsd<R: Read + Seek>(r: &mut R, stsd: &BoxRef, kind: TrackKind) -> anyhow::Result<SampleEntry> {
    let payload = read_payload(r, stsd)?;
    let mut cur = Cursor::new(payload.as_slice());
    let entry_count = cur.read_u32::<BigEndian>()?;
    if entry_count == 0 {
        return Ok(SampleEntry::default());
    }

    let size = cur.read_u32::<BigEndian>()? as usize;
    let mut codec = [0u8; 4];
    cur.read_exact(&mut codec)?;
    let start = 4 + SAMPLE_ENTRY_HEADER;
    let end = (4 + size).min(payload.len());
    if end < start {
        bail!("sample entry shorter than its header");
    }
    let body = &payload[start..end];

    let mut entry = SampleEntry {
        codec: Some(FourCC(codec)),
        ..Default::default()
    };
    let mut body_cur = Cursor::new(body);
    let ext_start = match kind {
        TrackKind::Video if body.len() >= VISUAL_ENTRY_BODY => {
            body_cur.seek(SeekFrom::Start(24))?;
            entry.width = body_cur.read_u16::<BigEndian>()?;
            entry.height = body_cur.read_u16::<BigEndian>()?;
            body_cur.seek(SeekFrom::Start(74))?;
            entry.depth = body_cur.read_u16::<BigEndian>()?;
            VISUAL_ENTRY_BODY
        }
        TrackKind::Audio if body.len() >= AUDIO_ENTRY_BODY => {
            // QuickTime sound description version lives in the first reserved word
            body_cur.seek(SeekFrom::Start(8))?;
            let qt_version = body_cur.read_u16::<BigEndian>()?;
            body_cur.seek(SeekFrom::Start(16))?;
            entry.channels = body_cur.read_u16::<BigEndian>()?;
            entry.sample_size = body_cur.read_u16::<BigEndian>()?;
            body_cur.seek(SeekFrom::Start(24))?;
            entry.sample_rate = body_cur.read_u32::<BigEndian>()? >> 16;
            AUDIO_ENTRY_BODY
                + match qt_version {
                    1 => 16,
                    2 => 36,
                    _ => 0,
                }
        }
        _ => return Ok(entry),
    };

    if ext_start < body.len() {
        let mut ext_cur = Cursor::new(body);
        ext_cur.seek(SeekFrom::Start(ext_start as u64))?;
        // Trailing garbage after the last extension is common; keep what parsed.
        let children = parser::parse_children(&mut ext_cur, body.len() as u64).unwrap_or_default();
        for child in &children {
            entry.extensions.push((child.hdr.typ, read_payload(&mut ext_cur, child)?));
        }
    }
    Ok(entry)
}

/// Fields pulled out of an `esds` elementary stream descriptor.
#[derive(Debug, Default, PartialEq)]
struct EsDescriptor {
    max_bitrate: u32,
    avg_bitrate: u32,
    decoder_specific: Option<Vec<u8>>,
}

fn read_descriptor_len(cur: &mut Cursor<&[u8]>) -> anyhow::Result<usize> {
    let mut len = 0usize;
    for _ in 0..4 {
        let b = cur.read_u8()?;
        len = (len << 7) | usize::from(b & 0x7f);
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok(len)
}

fn parse_esds(data: &[u8]) -> anyhow::Result<EsDescriptor> {
    let mut cur = Cursor::new(data);
    let mut out = EsDescriptor::default();

    if cur.read_u8()? != 0x03 {
        bail!("esds without ES_Descriptor");
    }
    read_descriptor_len(&mut cur)?;
    let _es_id = cur.read_u16::<BigEndian>()?;
    let flags = cur.read_u8()?;
    if flags & 0x80 != 0 {
        cur.seek(SeekFrom::Current(2))?;
    }
    if flags & 0x40 != 0 {
        let url_len = cur.read_u8()?;
        cur.seek(SeekFrom::Current(i64::from(url_len)))?;
    }
    if flags & 0x20 != 0 {
        cur.seek(SeekFrom::Current(2))?;
    }

    if cur.read_u8()? != 0x04 {
        return Ok(out);
    }
    read_descriptor_len(&mut cur)?;
    let _object_type = cur.read_u8()?;
    let _stream_type = cur.read_u8()?;
    cur.seek(SeekFrom::Current(3))?; // bufferSizeDB
    out.max_bitrate = cur.read_u32::<BigEndian>()?;
    out.avg_bitrate = cur.read_u32::<BigEndian>()?;

    if cur.read_u8().ok() == Some(0x05) {
        let len = read_descriptor_len(&mut cur)?;
        let mut dsi = vec![0u8; len];
        cur.read_exact(&mut dsi)?;
        out.decoder_specific = Some(dsi);
    }
    Ok(out)
}

fn read_track<R: Read + Seek>(r: &mut R, trak: &BoxRef) -> anyhow::Result<Mp4Stream> {
    let tkhd = match trak.child(b"tkhd") {
        Some(b) => Some(read_tkhd(r, b)?),
        None => None,
    };
    let mdhd = match trak.find(&[b"mdia", b"mdhd"]) {
        Some(b) => Some(read_mdhd(r, b)?),
        None => None,
    };
    let kind = match trak.find(&[b"mdia", b"hdlr"]) {
        Some(b) => TrackKind::from(read_hdlr(r, b)?),
        None => TrackKind::Other,
    };
    let stbl = trak.find(&[b"mdia", b"minf", b"stbl"]);
    let entry = match stbl.and_then(|s| s.child(b"stsd")) {
        Some(b) => read_stsd(r, b, kind)?,
        None => SampleEntry::default(),
    };
    let (sample_count, total_bytes) = match stbl.and_then(|s| s.child(b"stsz")) {
        Some(b) => read_stsz(r, b)?,
        None => (0, 0),
    };

    let esds = entry.extension(b"esds").and_then(|d| parse_esds(d).ok());
    let (mut bitrate, max_bitrate) = match (entry.extension(b"btrt"), &esds) {
        (Some(btrt), _) if btrt.len() >= 12 => (be_u32(&btrt[8..12]), be_u32(&btrt[4..8])),
        (_, Some(es)) => (es.avg_bitrate, es.max_bitrate),
        _ => (0, 0),
    };
    let media_duration_ns = mdhd.as_ref().and_then(|m| scale_to_ns(m.duration, m.timescale));
    if bitrate == 0
        && let Some(ns) = media_duration_ns.filter(|ns| *ns > 0)
    {
        bitrate = u32::try_from(u128::from(total_bytes) * 8 * 1_000_000_000 / u128::from(ns))
            .unwrap_or(u32::MAX);
    }

    let language = mdhd
        .as_ref()
        .map(|m| m.language.clone())
        .filter(|l| l != "und");

    let frame_rate = match &mdhd {
        Some(m) if m.duration > 0 && sample_count > 0 => {
            Fraction::approximate(u64::from(sample_count) * u64::from(m.timescale), m.duration)
        }
        _ => Fraction::new(0, 1),
    };
    let par = entry
        .extension(b"pasp")
        .filter(|p| p.len() >= 8)
        .map(|p| Fraction::approximate(u64::from(be_u32(&p[0..4])), u64::from(be_u32(&p[4..8]))))
        .unwrap_or(Fraction::new(1, 1));

    let codec = entry.codec;
    let codec_name = codec.map(codec_description);
    let mut tags = TagList::new();
    if let Some(lang) = &language {
        tags.add("language-code", SourceValue::string(lang.clone()));
    }
    if let Some(name) = codec_name {
        let key = match kind {
            TrackKind::Video => "video-codec",
            TrackKind::Audio => "audio-codec",
            TrackKind::Subtitle => "subtitle-codec",
            TrackKind::Other => "codec",
        };
        tags.add(key, SourceValue::string(name));
    }
    if bitrate > 0 {
        tags.add("bitrate", SourceValue::UInt(bitrate));
    }
    if max_bitrate > 0 {
        tags.add("maximum-bitrate", SourceValue::UInt(max_bitrate));
    }

    let (width, height) = match (entry.width, entry.height, &tkhd) {
        (0, 0, Some(t)) => (t.width, t.height),
        (w, h, _) => (u32::from(w), u32::from(h)),
    };

    let detail = match kind {
        TrackKind::Video => Detail::Video(VideoInfo {
            width,
            height,
            bit_depth: u32::from(entry.depth),
            frame_rate: Ratio::new(frame_rate.num as u32, frame_rate.denom as u32),
            pixel_aspect_ratio: Ratio::new(par.num as u32, par.denom as u32),
            interlaced: false,
            is_image: false,
            bitrate,
            max_bitrate,
        }),
        TrackKind::Audio => Detail::Audio(AudioInfo {
            language: language.clone(),
            channels: u32::from(entry.channels),
            sample_rate: entry.sample_rate,
            bit_depth: u32::from(entry.sample_size),
            bitrate,
            max_bitrate,
        }),
        TrackKind::Subtitle => Detail::Subtitle(SubtitleInfo { language }),
        TrackKind::Other => Detail::None,
    };

    let caps = codec.map(|c| {
        let structure = codec_structure(c, kind, &entry, esds.as_ref(), width, height, frame_rate, par);
        Caps::from_structure(structure)
    });

    Ok(Mp4Stream(Arc::new(StreamData {
        stream_id: tkhd.map(|t| t.track_id.to_string()),
        caps,
        tags: (!tags.is_empty()).then_some(tags),
        detail,
        streams: None,
    })))
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn codec_description(codec: FourCC) -> String {
    match &codec.0 {
        b"avc1" | b"avc3" => "H.264 / AVC".to_string(),
        b"hvc1" | b"hev1" => "H.265 / HEVC".to_string(),
        b"vp09" => "VP9".to_string(),
        b"av01" => "AV1".to_string(),
        b"mp4v" => "MPEG-4 Video".to_string(),
        b"mp4a" => "MPEG-4 AAC".to_string(),
        b"ac-3" => "AC-3 (ATSC A/52)".to_string(),
        b"ec-3" => "E-AC-3 (ATSC A/52B)".to_string(),
        b"Opus" => "Opus".to_string(),
        b"fLaC" => "Free Lossless Audio Codec (FLAC)".to_string(),
        b"tx3g" => "3GPP Timed Text".to_string(),
        b"wvtt" => "WebVTT".to_string(),
        b"stpp" => "TTML".to_string(),
        _ => format!("unknown ({})", codec),
    }
}

#[allow(clippy::too_many_arguments)]
fn codec_structure(
    codec: FourCC,
    kind: TrackKind,
    entry: &SampleEntry,
    esds: Option<&EsDescriptor>,
    width: u32,
    height: u32,
    frame_rate: Fraction,
    par: Fraction,
) -> Structure {
    let video = |name: &str| {
        Structure::new(name)
            .field("width", SourceValue::Int(width as i32))
            .field("height", SourceValue::Int(height as i32))
            .field("framerate", SourceValue::Fraction(frame_rate))
            .field("pixel-aspect-ratio", SourceValue::Fraction(par))
    };
    let audio = |name: &str| {
        Structure::new(name)
            .field("channels", SourceValue::Int(i32::from(entry.channels)))
            .field("rate", SourceValue::Int(entry.sample_rate as i32))
    };
    let codec_data = |typ: &[u8; 4]| {
        entry
            .extension(typ)
            .map(|d| SourceValue::Buffer(Buffer::from_slice(d)))
    };

    let mut s = match &codec.0 {
        b"avc1" | b"avc3" => {
            let format = if &codec.0 == b"avc1" { "avc" } else { "avc3" };
            let mut s = video("video/x-h264")
                .field("stream-format", SourceValue::string(format))
                .field("alignment", SourceValue::string("au"));
            if let Some(data) = codec_data(b"avcC") {
                s.set("codec_data", data);
            }
            s
        }
        b"hvc1" | b"hev1" => {
            let mut s = video("video/x-h265")
                .field("stream-format", SourceValue::string(codec.to_string()))
                .field("alignment", SourceValue::string("au"));
            if let Some(data) = codec_data(b"hvcC") {
                s.set("codec_data", data);
            }
            s
        }
        b"vp09" => video("video/x-vp9"),
        b"av01" => {
            let mut s = video("video/x-av1");
            if let Some(data) = codec_data(b"av1C") {
                s.set("codec_data", data);
            }
            s
        }
        b"mp4v" => video("video/mpeg")
            .field("mpegversion", SourceValue::Int(4))
            .field("systemstream", SourceValue::Bool(false)),
        b"mp4a" => {
            let mut s = audio("audio/mpeg")
                .field("mpegversion", SourceValue::Int(4))
                .field("stream-format", SourceValue::string("raw"));
            if let Some(dsi) = esds.and_then(|e| e.decoder_specific.as_deref()) {
                s.set("codec_data", SourceValue::Buffer(Buffer::from_slice(dsi)));
            }
            s
        }
        b"ac-3" => audio("audio/x-ac3").field("framed", SourceValue::Bool(true)),
        b"ec-3" => audio("audio/x-eac3").field("framed", SourceValue::Bool(true)),
        b"Opus" => audio("audio/x-opus"),
        b"fLaC" => audio("audio/x-flac").field("framed", SourceValue::Bool(true)),
        b"tx3g" => Structure::new("text/x-raw").field("format", SourceValue::string("utf8")),
        b"wvtt" => Structure::new("application/x-subtitle-vtt"),
        b"stpp" => Structure::new("application/ttml+xml"),
        _ => {
            let name = match kind {
                TrackKind::Video => "video/x-unknown",
                TrackKind::Audio => "audio/x-unknown",
                TrackKind::Subtitle | TrackKind::Other => "application/x-unknown",
            };
            Structure::new(name)
        }
    };
    if s.name().ends_with("/x-unknown") {
        s.set("fourcc", SourceValue::string(codec.as_str_lossy()));
    }
    s
}

// ---------- iTunes-style metadata ----------

const DATA_TYPE_UTF8: u32 = 1;
const DATA_TYPE_JPEG: u32 = 13;
const DATA_TYPE_PNG: u32 = 14;

/// Calendar date from `©day`, rendered as ISO-8601 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl Date {
    pub fn parse(s: &str) -> Option<Date> {
        let mut parts = s.get(..10).unwrap_or(s).split('-');
        let year = parts.next()?.trim().parse().ok()?;
        let month = parts.next().and_then(|m| m.parse().ok()).filter(|m| (1..=12).contains(m));
        let day = month
            .and(parts.next())
            .and_then(|d| d.parse().ok())
            .filter(|d| (1..=31).contains(d));
        Some(Date { year, month, day })
    }
}

impl ForeignValue for Date {
    fn type_name(&self) -> &str {
        "GstDateTime"
    }

    fn to_text(&self) -> Option<String> {
        Some(match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => format!("{:04}-{:02}", self.year, m),
            _ => format!("{:04}", self.year),
        })
    }
}

fn text_tag_key(item: &[u8; 4]) -> Option<&'static str> {
    match item {
        [0xa9, b'n', b'a', b'm'] => Some("title"),
        [0xa9, b'A', b'R', b'T'] => Some("artist"),
        b"aART" => Some("album-artist"),
        [0xa9, b'a', b'l', b'b'] => Some("album"),
        [0xa9, b'g', b'e', b'n'] => Some("genre"),
        [0xa9, b'c', b'm', b't'] => Some("comment"),
        [0xa9, b't', b'o', b'o'] => Some("encoder"),
        [0xa9, b'w', b'r', b't'] => Some("composer"),
        b"cprt" | [0xa9, b'c', b'p', b'y'] => Some("copyright"),
        b"desc" => Some("description"),
        _ => None,
    }
}

fn read_ilst<R: Read + Seek>(r: &mut R, ilst: &BoxRef, tags: &mut TagList) -> anyhow::Result<()> {
    for item in ilst.children() {
        let typ = item.hdr.typ.0;
        for data in item.children_of(b"data") {
            let payload = read_payload(r, data)?;
            if payload.len() < 8 {
                continue;
            }
            let data_type = be_u32(&payload[0..4]) & 0x00ff_ffff;
            let value = &payload[8..];

            if let Some(key) = text_tag_key(&typ) {
                if data_type == DATA_TYPE_UTF8 {
                    tags.add(key, SourceValue::string(String::from_utf8_lossy(value)));
                }
                continue;
            }
            match &typ {
                [0xa9, b'd', b'a', b'y'] => {
                    let text = String::from_utf8_lossy(value);
                    match Date::parse(&text) {
                        Some(date) => tags.add("date", SourceValue::Foreign(Arc::new(date))),
                        None => tags.add("date", SourceValue::string(text)),
                    }
                }
                b"trkn" | b"disk" if value.len() >= 6 => {
                    let number = u16::from_be_bytes([value[2], value[3]]);
                    let count = u16::from_be_bytes([value[4], value[5]]);
                    let (number_key, count_key) = if &typ == b"trkn" {
                        ("track-number", "track-count")
                    } else {
                        ("album-disc-number", "album-disc-count")
                    };
                    if number > 0 {
                        tags.add(number_key, SourceValue::UInt(u32::from(number)));
                    }
                    if count > 0 {
                        tags.add(count_key, SourceValue::UInt(u32::from(count)));
                    }
                }
                b"covr" => {
                    let mime = match data_type {
                        DATA_TYPE_PNG => "image/png",
                        DATA_TYPE_JPEG => "image/jpeg",
                        _ if value.starts_with(b"\x89PNG") => "image/png",
                        _ => "image/jpeg",
                    };
                    let sample = Sample {
                        buffer: Some(Buffer::from_slice(value)),
                        caps: Some(Caps::from_structure(
                            Structure::new(mime).field("image-type", SourceValue::string("front-cover")),
                        )),
                    };
                    tags.add("image", SourceValue::Sample(sample));
                }
                _ => tracing::trace!(item = %item.hdr.typ, "ignoring metadata item"),
            }
        }
    }
    Ok(())
}
