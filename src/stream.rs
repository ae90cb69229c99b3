//! Elementary stream descriptors.

use crate::language;
use crate::types::{
    AspectRatio, AudioMode, ChannelLayout, FrameRate, LanguageCode, SampleRate, StreamCategory,
    StreamType, VideoFormat,
};

/// Size of one transport stream packet on a Blu-ray disc, including the
/// 4-byte arrival time stamp header.
pub const PACKET_SIZE: u64 = 192;

/// Packet accumulators filled in by the demuxer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counters {
    pub payload_bytes: u64,
    pub packet_count: u64,
    pub packet_seconds: f64,
}

impl Counters {
    pub fn clear(&mut self) {
        *self = Counters::default();
    }

    pub fn add(&mut self, payload_bytes: u64, packet_count: u64, packet_seconds: f64) {
        self.payload_bytes += payload_bytes;
        self.packet_count += packet_count;
        self.packet_seconds += packet_seconds;
    }

    pub fn absorb(&mut self, other: &Counters) {
        self.add(other.payload_bytes, other.packet_count, other.packet_seconds);
    }

    /// Bytes occupied on disc by the counted packets.
    pub fn packet_size(&self) -> u64 {
        self.packet_count * PACKET_SIZE
    }

    /// Payload bit rate in bits per second, if any time has been counted.
    pub fn bit_rate(&self) -> Option<u64> {
        if self.packet_seconds > 0.0 {
            Some(((self.payload_bytes as f64 * 8.0) / self.packet_seconds).round() as u64)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoAttributes {
    pub format: VideoFormat,
    pub frame_rate: FrameRate,
    pub aspect_ratio: AspectRatio,
    /// Frame height in lines. Seeded from `format`; the demuxer may refine it.
    pub height: u32,
    pub encoding_profile: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioAttributes {
    pub channel_layout: ChannelLayout,
    pub channel_count: u32,
    pub lfe: u32,
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub language: LanguageCode,
    pub dial_norm: i32,
    pub audio_mode: AudioMode,
    /// A dependent lower bit rate stream carried inside this one, such as
    /// the AC3 core of a TrueHD track.
    pub core: Option<Box<Stream>>,
}

impl Default for AudioAttributes {
    fn default() -> Self {
        Self {
            channel_layout: ChannelLayout::Unknown,
            channel_count: 0,
            lfe: 0,
            sample_rate: 0,
            bit_depth: 0,
            language: LanguageCode::new(),
            dial_norm: 0,
            audio_mode: AudioMode::Unknown,
            core: None,
        }
    }
}

/// Kind-specific attributes of a stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamKind {
    Video(VideoAttributes),
    Audio(AudioAttributes),
    Graphics { language: LanguageCode },
    Text { language: LanguageCode },
}

impl StreamKind {
    /// Default attributes for a stream category.
    pub fn for_category(category: StreamCategory) -> Self {
        match category {
            StreamCategory::Video => StreamKind::Video(VideoAttributes::default()),
            StreamCategory::Audio => StreamKind::Audio(AudioAttributes::default()),
            StreamCategory::Graphics => StreamKind::Graphics {
                language: LanguageCode::new(),
            },
            StreamCategory::Text => StreamKind::Text {
                language: LanguageCode::new(),
            },
        }
    }

    pub fn category(&self) -> StreamCategory {
        match self {
            StreamKind::Video(_) => StreamCategory::Video,
            StreamKind::Audio(_) => StreamCategory::Audio,
            StreamKind::Graphics { .. } => StreamCategory::Graphics,
            StreamKind::Text { .. } => StreamCategory::Text,
        }
    }
}

/// One elementary stream, identified by its PID.
///
/// The PID and stream type are fixed at construction; everything else is
/// attribute data or accumulators that the reconciler and demuxer update.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stream {
    pid: u16,
    stream_type: StreamType,
    /// 0 for the base angle, otherwise the alternate angle this copy belongs to.
    pub angle_index: u8,
    /// Present in the clip but not declared by the playlist.
    pub is_hidden: bool,
    pub is_vbr: bool,
    pub bit_rate: u64,
    pub counters: Counters,
    pub kind: StreamKind,
}

impl Stream {
    /// Creates a stream with default attributes for its kind. Returns `None`
    /// for stream types that are neither video, audio, graphics nor text.
    pub fn new(pid: u16, stream_type: StreamType) -> Option<Self> {
        let kind = StreamKind::for_category(stream_type.category()?);
        Some(Self::from_parts(pid, stream_type, kind))
    }

    /// Creates a stream with explicit attributes. Returns `None` if the kind
    /// does not match the stream type.
    pub fn with_kind(pid: u16, stream_type: StreamType, kind: StreamKind) -> Option<Self> {
        if stream_type.category() != Some(kind.category()) {
            return None;
        }
        Some(Self::from_parts(pid, stream_type, kind))
    }

    pub(crate) fn from_parts(pid: u16, stream_type: StreamType, kind: StreamKind) -> Self {
        Self {
            pid,
            stream_type,
            angle_index: 0,
            is_hidden: false,
            is_vbr: false,
            bit_rate: 0,
            counters: Counters::default(),
            kind,
        }
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn category(&self) -> StreamCategory {
        self.kind.category()
    }

    pub fn is_video(&self) -> bool {
        self.category() == StreamCategory::Video
    }

    pub fn is_audio(&self) -> bool {
        self.category() == StreamCategory::Audio
    }

    pub fn video(&self) -> Option<&VideoAttributes> {
        match &self.kind {
            StreamKind::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoAttributes> {
        match &mut self.kind {
            StreamKind::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioAttributes> {
        match &self.kind {
            StreamKind::Audio(a) => Some(a),
            _ => None,
        }
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioAttributes> {
        match &mut self.kind {
            StreamKind::Audio(a) => Some(a),
            _ => None,
        }
    }

    /// The language code, or an empty string for video.
    pub fn language(&self) -> &str {
        match &self.kind {
            StreamKind::Video(_) => "",
            StreamKind::Audio(a) => &a.language,
            StreamKind::Graphics { language } | StreamKind::Text { language } => language,
        }
    }

    pub fn set_language(&mut self, code: impl Into<LanguageCode>) {
        match &mut self.kind {
            StreamKind::Video(_) => {}
            StreamKind::Audio(a) => a.language = code.into(),
            StreamKind::Graphics { language } | StreamKind::Text { language } => {
                *language = code.into()
            }
        }
    }

    pub fn language_name(&self) -> &str {
        language::display_name(self.language())
    }

    /// Frame height for video streams, 0 for everything else.
    pub fn height(&self) -> u32 {
        self.video().map_or(0, |v| v.height)
    }

    /// Channel count for audio streams, 0 for everything else.
    pub fn channel_count(&self) -> u32 {
        self.audio().map_or(0, |a| a.channel_count)
    }

    pub fn codec_name(&self) -> &'static str {
        self.stream_type.codec_name()
    }

    pub fn codec_short_name(&self) -> &'static str {
        self.stream_type.codec_short_name()
    }

    /// Recomputes `bit_rate` from the accumulators, if they hold any data.
    pub fn refresh_bit_rate(&mut self) {
        if let Some(rate) = self.counters.bit_rate() {
            self.bit_rate = rate;
        }
    }

    /// Clears the accumulators of this stream and of its core stream.
    pub fn clear_counters(&mut self) {
        self.counters.clear();
        if let Some(core) = self.audio_mut().and_then(|a| a.core.as_deref_mut()) {
            core.counters.clear();
        }
    }

    /// Refines this stream with attributes found by scanning the stream
    /// file. The more capable value wins for each attribute.
    ///
    /// Returns `false`, leaving `self` untouched, if the stream types differ.
    pub fn merge_from(&mut self, other: &Stream) -> bool {
        if self.stream_type != other.stream_type {
            return false;
        }
        self.bit_rate = self.bit_rate.max(other.bit_rate);
        self.is_vbr = other.is_vbr;

        match (&mut self.kind, &other.kind) {
            (StreamKind::Video(video), StreamKind::Video(found)) => {
                if !found.encoding_profile.is_empty() {
                    video.encoding_profile = found.encoding_profile.clone();
                }
            }
            (StreamKind::Audio(audio), StreamKind::Audio(found)) => {
                audio.channel_count = audio.channel_count.max(found.channel_count);
                audio.lfe = audio.lfe.max(found.lfe);
                audio.sample_rate = audio.sample_rate.max(found.sample_rate);
                audio.bit_depth = audio.bit_depth.max(found.bit_depth);
                audio.dial_norm = audio.dial_norm.min(found.dial_norm);
                if found.audio_mode != AudioMode::Unknown {
                    audio.audio_mode = found.audio_mode;
                }
                if audio.core.is_none() {
                    audio.core = found.core.clone();
                }
            }
            _ => {}
        }
        true
    }
}

/// Builds the attributes decoded from a playlist video entry.
pub(crate) fn video_kind(format: VideoFormat, frame_rate: FrameRate, aspect_ratio: AspectRatio) -> StreamKind {
    StreamKind::Video(VideoAttributes {
        format,
        frame_rate,
        aspect_ratio,
        height: format.height(),
        encoding_profile: String::new(),
    })
}

/// Builds the attributes decoded from a playlist audio entry.
pub(crate) fn audio_kind(channel_layout: ChannelLayout, sample_rate: SampleRate, language: LanguageCode) -> StreamKind {
    StreamKind::Audio(AudioAttributes {
        channel_layout,
        sample_rate: sample_rate.hz(),
        language,
        ..AudioAttributes::default()
    })
}
