/// Typed view over the metadata tag vocabulary.
///
/// Anything not in this list becomes `KnownTag::Unknown(key)` and keeps its
/// key as nick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTag<'a> {
    // descriptive
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
    Comment,
    Description,
    Keywords,
    Composer,
    Copyright,

    // dates
    Date,
    DateTime,

    // numbering
    TrackNumber,
    TrackCount,
    DiscNumber,
    DiscCount,

    // technical
    Encoder,
    EncoderVersion,
    LanguageCode,
    ContainerFormat,
    AudioCodec,
    VideoCodec,
    SubtitleCodec,
    Codec,
    Bitrate,
    MaximumBitrate,
    Duration,

    // artwork
    Image,
    PreviewImage,

    Unknown(&'a str),
}

impl<'a> From<&'a str> for KnownTag<'a> {
    fn from(key: &'a str) -> Self {
        match key {
            "title" => KnownTag::Title,
            "artist" => KnownTag::Artist,
            "album" => KnownTag::Album,
            "album-artist" => KnownTag::AlbumArtist,
            "genre" => KnownTag::Genre,
            "comment" => KnownTag::Comment,
            "description" => KnownTag::Description,
            "keywords" => KnownTag::Keywords,
            "composer" => KnownTag::Composer,
            "copyright" => KnownTag::Copyright,
            "date" => KnownTag::Date,
            "datetime" => KnownTag::DateTime,
            "track-number" => KnownTag::TrackNumber,
            "track-count" => KnownTag::TrackCount,
            "album-disc-number" => KnownTag::DiscNumber,
            "album-disc-count" => KnownTag::DiscCount,
            "encoder" => KnownTag::Encoder,
            "encoder-version" => KnownTag::EncoderVersion,
            "language-code" => KnownTag::LanguageCode,
            "container-format" => KnownTag::ContainerFormat,
            "audio-codec" => KnownTag::AudioCodec,
            "video-codec" => KnownTag::VideoCodec,
            "subtitle-codec" => KnownTag::SubtitleCodec,
            "codec" => KnownTag::Codec,
            "bitrate" => KnownTag::Bitrate,
            "maximum-bitrate" => KnownTag::MaximumBitrate,
            "duration" => KnownTag::Duration,
            "image" => KnownTag::Image,
            "preview-image" => KnownTag::PreviewImage,
            other => KnownTag::Unknown(other),
        }
    }
}

impl<'a> KnownTag<'a> {
    /// Tag key as stored in tag lists.
    pub fn key(&self) -> &'a str {
        match self {
            KnownTag::Title => "title",
            KnownTag::Artist => "artist",
            KnownTag::Album => "album",
            KnownTag::AlbumArtist => "album-artist",
            KnownTag::Genre => "genre",
            KnownTag::Comment => "comment",
            KnownTag::Description => "description",
            KnownTag::Keywords => "keywords",
            KnownTag::Composer => "composer",
            KnownTag::Copyright => "copyright",
            KnownTag::Date => "date",
            KnownTag::DateTime => "datetime",
            KnownTag::TrackNumber => "track-number",
            KnownTag::TrackCount => "track-count",
            KnownTag::DiscNumber => "album-disc-number",
            KnownTag::DiscCount => "album-disc-count",
            KnownTag::Encoder => "encoder",
            KnownTag::EncoderVersion => "encoder-version",
            KnownTag::LanguageCode => "language-code",
            KnownTag::ContainerFormat => "container-format",
            KnownTag::AudioCodec => "audio-codec",
            KnownTag::VideoCodec => "video-codec",
            KnownTag::SubtitleCodec => "subtitle-codec",
            KnownTag::Codec => "codec",
            KnownTag::Bitrate => "bitrate",
            KnownTag::MaximumBitrate => "maximum-bitrate",
            KnownTag::Duration => "duration",
            KnownTag::Image => "image",
            KnownTag::PreviewImage => "preview-image",
            KnownTag::Unknown(key) => *key,
        }
    }

    /// Human-readable display name.
    pub fn nick(&self) -> &'a str {
        match self {
            KnownTag::Title => "Title",
            KnownTag::Artist => "Artist",
            KnownTag::Album => "Album",
            KnownTag::AlbumArtist => "Album Artist",
            KnownTag::Genre => "Genre",
            KnownTag::Comment => "Comment",
            KnownTag::Description => "Description",
            KnownTag::Keywords => "Keywords",
            KnownTag::Composer => "Composer",
            KnownTag::Copyright => "Copyright",
            KnownTag::Date => "Date",
            KnownTag::DateTime => "Date Time",
            KnownTag::TrackNumber => "Track Number",
            KnownTag::TrackCount => "Track Count",
            KnownTag::DiscNumber => "Disc Number",
            KnownTag::DiscCount => "Disc Count",
            KnownTag::Encoder => "Encoder",
            KnownTag::EncoderVersion => "Encoder Version",
            KnownTag::LanguageCode => "Language Code",
            KnownTag::ContainerFormat => "Container Format",
            KnownTag::AudioCodec => "Audio Codec",
            KnownTag::VideoCodec => "Video Codec",
            KnownTag::SubtitleCodec => "Subtitle Codec",
            KnownTag::Codec => "Codec",
            KnownTag::Bitrate => "Bitrate",
            KnownTag::MaximumBitrate => "Maximum Bitrate",
            KnownTag::Duration => "Duration",
            KnownTag::Image => "Image",
            KnownTag::PreviewImage => "Preview Image",
            KnownTag::Unknown(key) => *key,
        }
    }
}

/// Look up the nick for a tag key.
pub fn nick(key: &str) -> &str {
    KnownTag::from(key).nick()
}
