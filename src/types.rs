//! Codec-level values decoded from the playlist and clip stream tables.

use std::fmt::{self, Debug, Display};

/// The two playlist format versions this crate understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaylistVersion {
    /// `MPLS0100`
    V0100,
    /// `MPLS0200`
    V0200,
}

impl PlaylistVersion {
    /// Matches the 8-byte magic at the start of a playlist file.
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            b"MPLS0100" => Some(PlaylistVersion::V0100),
            b"MPLS0200" => Some(PlaylistVersion::V0200),
            _ => None,
        }
    }
}

/// The MPEG-TS stream type of an elementary stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamType {
    Mpeg1Video,
    Mpeg2Video,
    AvcVideo,
    MvcVideo,
    HevcVideo,
    Vc1Video,
    Mpeg1Audio,
    Mpeg2Audio,
    Mpeg2AacAudio,
    Mpeg4AacAudio,
    LpcmAudio,
    Ac3Audio,
    Ac3PlusAudio,
    Ac3PlusSecondaryAudio,
    Ac3TrueHdAudio,
    DtsAudio,
    DtsHdAudio,
    DtsHdSecondaryAudio,
    DtsHdMasterAudio,
    PresentationGraphics,
    InteractiveGraphics,
    Subtitle,
    Unknown(u8),
}

/// The four kinds of elementary stream a playlist can carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StreamCategory {
    Video,
    Audio,
    Graphics,
    Text,
}

impl StreamType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x1B => StreamType::AvcVideo,
            0x20 => StreamType::MvcVideo,
            0x24 => StreamType::HevcVideo,
            0xEA => StreamType::Vc1Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x0F => StreamType::Mpeg2AacAudio,
            0x11 => StreamType::Mpeg4AacAudio,
            0x80 => StreamType::LpcmAudio,
            0x81 => StreamType::Ac3Audio,
            0x84 => StreamType::Ac3PlusAudio,
            0xA1 => StreamType::Ac3PlusSecondaryAudio,
            0x83 => StreamType::Ac3TrueHdAudio,
            0x82 => StreamType::DtsAudio,
            0x85 => StreamType::DtsHdAudio,
            0xA2 => StreamType::DtsHdSecondaryAudio,
            0x86 => StreamType::DtsHdMasterAudio,
            0x90 => StreamType::PresentationGraphics,
            0x91 => StreamType::InteractiveGraphics,
            0x92 => StreamType::Subtitle,
            n => StreamType::Unknown(n),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            StreamType::Mpeg1Video => 0x01,
            StreamType::Mpeg2Video => 0x02,
            StreamType::AvcVideo => 0x1B,
            StreamType::MvcVideo => 0x20,
            StreamType::HevcVideo => 0x24,
            StreamType::Vc1Video => 0xEA,
            StreamType::Mpeg1Audio => 0x03,
            StreamType::Mpeg2Audio => 0x04,
            StreamType::Mpeg2AacAudio => 0x0F,
            StreamType::Mpeg4AacAudio => 0x11,
            StreamType::LpcmAudio => 0x80,
            StreamType::Ac3Audio => 0x81,
            StreamType::Ac3PlusAudio => 0x84,
            StreamType::Ac3PlusSecondaryAudio => 0xA1,
            StreamType::Ac3TrueHdAudio => 0x83,
            StreamType::DtsAudio => 0x82,
            StreamType::DtsHdAudio => 0x85,
            StreamType::DtsHdSecondaryAudio => 0xA2,
            StreamType::DtsHdMasterAudio => 0x86,
            StreamType::PresentationGraphics => 0x90,
            StreamType::InteractiveGraphics => 0x91,
            StreamType::Subtitle => 0x92,
            StreamType::Unknown(n) => n,
        }
    }

    /// Returns the stream kind, or `None` for stream types this crate does
    /// not model.
    pub fn category(self) -> Option<StreamCategory> {
        use StreamType::*;
        match self {
            Mpeg1Video | Mpeg2Video | AvcVideo | MvcVideo | HevcVideo | Vc1Video => {
                Some(StreamCategory::Video)
            }
            Mpeg1Audio | Mpeg2Audio | Mpeg2AacAudio | Mpeg4AacAudio | LpcmAudio | Ac3Audio
            | Ac3PlusAudio | Ac3PlusSecondaryAudio | Ac3TrueHdAudio | DtsAudio | DtsHdAudio
            | DtsHdSecondaryAudio | DtsHdMasterAudio => Some(StreamCategory::Audio),
            PresentationGraphics | InteractiveGraphics => Some(StreamCategory::Graphics),
            Subtitle => Some(StreamCategory::Text),
            Unknown(_) => None,
        }
    }

    pub fn is_video(self) -> bool {
        self.category() == Some(StreamCategory::Video)
    }

    pub fn is_audio(self) -> bool {
        self.category() == Some(StreamCategory::Audio)
    }

    pub fn is_graphics(self) -> bool {
        self.category() == Some(StreamCategory::Graphics)
    }

    pub fn is_text(self) -> bool {
        self.category() == Some(StreamCategory::Text)
    }

    /// Codec family priority used when ordering streams of the same kind.
    ///
    /// Higher values sort first: lossless audio ranks above lossy-plus,
    /// which ranks above plain lossy and legacy codecs, and secondary
    /// audio ranks below the primary codec of the same family.
    pub fn sort_index(self) -> u8 {
        use StreamType::*;
        match self {
            Mpeg1Video => 1,
            Mpeg2Video => 2,
            AvcVideo => 3,
            Vc1Video => 4,
            MvcVideo => 5,
            HevcVideo => 6,

            Mpeg1Audio => 1,
            Mpeg2Audio => 2,
            Mpeg2AacAudio => 2,
            Mpeg4AacAudio => 2,
            Ac3PlusSecondaryAudio => 3,
            DtsHdSecondaryAudio => 4,
            Ac3Audio => 5,
            DtsAudio => 6,
            Ac3PlusAudio => 7,
            DtsHdAudio => 8,
            Ac3TrueHdAudio => 9,
            DtsHdMasterAudio => 10,
            LpcmAudio => 11,

            Subtitle => 1,
            InteractiveGraphics => 2,
            PresentationGraphics => 3,

            Unknown(_) => 0,
        }
    }

    pub fn codec_name(self) -> &'static str {
        use StreamType::*;
        match self {
            Mpeg1Video => "MPEG-1 Video",
            Mpeg2Video => "MPEG-2 Video",
            AvcVideo => "MPEG-4 AVC Video",
            MvcVideo => "MPEG-4 MVC Video",
            HevcVideo => "MPEG-H HEVC Video",
            Vc1Video => "VC-1 Video",
            Mpeg1Audio => "MP1 Audio",
            Mpeg2Audio => "MP2 Audio",
            Mpeg2AacAudio => "MPEG-2 AAC Audio",
            Mpeg4AacAudio => "MPEG-4 AAC Audio",
            LpcmAudio => "LPCM Audio",
            Ac3Audio => "Dolby Digital Audio",
            Ac3PlusAudio | Ac3PlusSecondaryAudio => "Dolby Digital Plus Audio",
            Ac3TrueHdAudio => "Dolby TrueHD Audio",
            DtsAudio => "DTS Audio",
            DtsHdAudio => "DTS-HD High-Res Audio",
            DtsHdSecondaryAudio => "DTS Express",
            DtsHdMasterAudio => "DTS-HD Master Audio",
            PresentationGraphics => "Presentation Graphics",
            InteractiveGraphics => "Interactive Graphics",
            Subtitle => "Subtitle",
            Unknown(_) => "UNKNOWN",
        }
    }

    pub fn codec_short_name(self) -> &'static str {
        use StreamType::*;
        match self {
            Mpeg1Video => "MPEG-1",
            Mpeg2Video => "MPEG-2",
            AvcVideo => "AVC",
            MvcVideo => "MVC",
            HevcVideo => "HEVC",
            Vc1Video => "VC-1",
            Mpeg1Audio => "MP1",
            Mpeg2Audio => "MP2",
            Mpeg2AacAudio => "MPEG-2 AAC",
            Mpeg4AacAudio => "MPEG-4 AAC",
            LpcmAudio => "LPCM",
            Ac3Audio => "AC3",
            Ac3PlusAudio | Ac3PlusSecondaryAudio => "AC3+",
            Ac3TrueHdAudio => "TrueHD",
            DtsAudio => "DTS",
            DtsHdAudio => "DTS-HD HR",
            DtsHdSecondaryAudio => "DTS Express",
            DtsHdMasterAudio => "DTS-HD MA",
            PresentationGraphics => "PGS",
            InteractiveGraphics => "IGS",
            Subtitle => "SUB",
            Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for StreamType {
    fn from(code: u8) -> Self {
        StreamType::from_code(code)
    }
}

impl Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codec_name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VideoFormat {
    Interlaced480,
    Interlaced576,
    Interlaced1080,
    Progressive480,
    Progressive576,
    Progressive720,
    Progressive1080,
    Progressive2160,
    #[default]
    Unknown,
}

impl VideoFormat {
    pub fn from_nibble(n: u8) -> Self {
        match n {
            0x1 => VideoFormat::Interlaced480,
            0x2 => VideoFormat::Interlaced576,
            0x3 => VideoFormat::Progressive480,
            0x4 => VideoFormat::Interlaced1080,
            0x5 => VideoFormat::Progressive720,
            0x6 => VideoFormat::Progressive1080,
            0x7 => VideoFormat::Progressive576,
            0x8 => VideoFormat::Progressive2160,
            _ => VideoFormat::Unknown,
        }
    }

    /// The frame height in lines, or 0 if the format is unknown.
    pub fn height(self) -> u32 {
        match self {
            VideoFormat::Interlaced480 | VideoFormat::Progressive480 => 480,
            VideoFormat::Interlaced576 | VideoFormat::Progressive576 => 576,
            VideoFormat::Progressive720 => 720,
            VideoFormat::Interlaced1080 | VideoFormat::Progressive1080 => 1080,
            VideoFormat::Progressive2160 => 2160,
            VideoFormat::Unknown => 0,
        }
    }

    pub fn is_interlaced(self) -> bool {
        matches!(
            self,
            VideoFormat::Interlaced480 | VideoFormat::Interlaced576 | VideoFormat::Interlaced1080
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameRate {
    Fps23_976,
    Fps24,
    Fps25,
    Fps29_97,
    Fps50,
    Fps59_94,
    #[default]
    Unknown,
}

impl FrameRate {
    pub fn from_nibble(n: u8) -> Self {
        match n {
            0x1 => FrameRate::Fps23_976,
            0x2 => FrameRate::Fps24,
            0x3 => FrameRate::Fps25,
            0x4 => FrameRate::Fps29_97,
            0x6 => FrameRate::Fps50,
            0x7 => FrameRate::Fps59_94,
            _ => FrameRate::Unknown,
        }
    }

    /// Returns the frame rate as an exact fraction.
    pub fn fraction(self) -> Option<FrameRateFraction> {
        let (numerator, denominator) = match self {
            FrameRate::Fps23_976 => (24_000, 1_001),
            FrameRate::Fps24 => (24, 1),
            FrameRate::Fps25 => (25, 1),
            FrameRate::Fps29_97 => (30_000, 1_001),
            FrameRate::Fps50 => (50, 1),
            FrameRate::Fps59_94 => (60_000, 1_001),
            FrameRate::Unknown => return None,
        };
        Some(FrameRateFraction {
            numerator,
            denominator,
        })
    }

    pub fn fps(self) -> Option<f64> {
        self.fraction().map(|f| f.fps())
    }
}

/// A video frame rate, represented as a fraction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameRateFraction {
    pub numerator: i32,
    pub denominator: i32,
}

impl FrameRateFraction {
    /// Returns the fraction's value as an `f64`.
    pub fn fps(&self) -> f64 {
        (self.numerator as f64) / (self.denominator as f64)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AspectRatio {
    Ratio4x3,
    Ratio16x9,
    Ratio2_21,
    #[default]
    Unknown,
}

impl AspectRatio {
    pub fn from_nibble(n: u8) -> Self {
        match n {
            0x2 => AspectRatio::Ratio4x3,
            0x3 => AspectRatio::Ratio16x9,
            0x4 => AspectRatio::Ratio2_21,
            _ => AspectRatio::Unknown,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelLayout {
    Mono,
    Stereo,
    Multichannel,
    StereoAndMultichannel,
    #[default]
    Unknown,
}

impl ChannelLayout {
    pub fn from_nibble(n: u8) -> Self {
        match n {
            0x1 => ChannelLayout::Mono,
            0x3 => ChannelLayout::Stereo,
            0x6 => ChannelLayout::Multichannel,
            0xC => ChannelLayout::StereoAndMultichannel,
            _ => ChannelLayout::Unknown,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleRate {
    One(u32),
    Two(u32, u32),
    Unknown,
}

impl SampleRate {
    pub fn from_nibble(n: u8) -> Self {
        match n {
            0x1 => SampleRate::One(48_000),
            0x4 => SampleRate::One(96_000),
            0x5 => SampleRate::One(192_000),
            0xC => SampleRate::Two(48_000, 192_000),
            0xE => SampleRate::Two(48_000, 96_000),
            _ => SampleRate::Unknown,
        }
    }

    /// The highest sample rate carried, in Hz, or 0 if unknown.
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::One(hz) => hz,
            SampleRate::Two(a, b) => a.max(b),
            SampleRate::Unknown => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioMode {
    #[default]
    Unknown,
    DualMono,
    Stereo,
    Surround,
    Extended,
}

/// The kind of a playlist mark. Only entry points are chapters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkType {
    EntryPoint,
    LinkPoint,
    Unknown,
}

impl MarkType {
    pub fn from_code(n: u8) -> Self {
        match n {
            0x1 => MarkType::EntryPoint,
            0x2 => MarkType::LinkPoint,
            _ => MarkType::Unknown,
        }
    }
}

pub type LanguageCode = String;

/// A time stamp, relative to some System Time Clock sequence, expressed in 45 KHz.
///
/// To get a floating-point value in seconds, you can use the [`seconds`] method.
///
/// [`seconds`]: #method.seconds
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TimeStamp(pub u32);

impl TimeStamp {
    pub const CLOCK: u32 = 45_000;

    /// Builds a play item time stamp. Authoring tools occasionally set the
    /// sign bit, which carries no meaning and is cleared here.
    pub fn clipped(raw: u32) -> Self {
        TimeStamp(raw & 0x7FFF_FFFF)
    }

    /// Returns this time stamp in units of seconds.
    pub fn seconds(&self) -> f64 {
        (self.0 as f64) / (Self::CLOCK as f64)
    }
}

impl Debug for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeStamp")
            .field("raw", &self.0)
            .field("secs", &self.seconds())
            .finish()
    }
}
