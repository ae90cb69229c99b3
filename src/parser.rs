//! The binary grammar of a movie playlist file.
//!
//! Everything in here is a pure function of the input bytes. Resolving
//! clip names against the disc and placing clips on a timeline happens in
//! [`crate::playlist`].

use crate::stream::{audio_kind, video_kind, Stream, StreamKind};
use crate::types::{
    AspectRatio, ChannelLayout, FrameRate, LanguageCode, MarkType, PlaylistVersion, SampleRate,
    StreamType, TimeStamp, VideoFormat,
};
use nom::{
    bytes::complete::take,
    combinator::map,
    count, do_parse,
    error::ErrorKind,
    map,
    multi::{count, length_data, length_value},
    number::complete::{be_u16, be_u32, be_u8},
    sequence::tuple,
    take, Err, IResult,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a byte stream could not be decoded as a playlist.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ParseError {
    #[error("unrecognized magic {0:?}")]
    Magic(String),
    #[error("{section} offset {offset} lies beyond the end of the file ({len} bytes)")]
    Offset {
        section: &'static str,
        offset: u32,
        len: usize,
    },
    #[error("truncated or invalid {section} ({kind:?})")]
    Invalid {
        section: &'static str,
        kind: ErrorKind,
    },
}

impl ParseError {
    fn from_nom(section: &'static str, err: Err<(&[u8], ErrorKind)>) -> Self {
        let kind = match err {
            Err::Error((_, kind)) | Err::Failure((_, kind)) => kind,
            Err::Incomplete(_) => ErrorKind::Eof,
        };
        ParseError::Invalid { section, kind }
    }
}

/// The raw contents of a playlist file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mpls {
    pub version: PlaylistVersion,
    pub play_items: Vec<PlayItem>,
    pub marks: Vec<PlayListMark>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Header {
    pub version: PlaylistVersion,
    pub playlist_offset: u32,
    pub chapter_offset: u32,
    pub extension_offset: u32,
}

/// A clip reference: 5 digits (e.g. "00055") and a 4 letter codec id,
/// which will usually be "M2TS" on blu-rays.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clip {
    pub file_name: String,
    pub codec_id: String,
}

impl Clip {
    pub fn stream_file_name(&self) -> String {
        format!("{}.M2TS", self.file_name.to_ascii_uppercase())
    }

    pub fn clip_info_name(&self) -> String {
        format!("{}.CLPI", self.file_name.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayItem {
    pub clip: Clip,
    pub is_multi_angle: bool,
    pub connection_condition: u8,
    pub in_time: TimeStamp,
    pub out_time: TimeStamp,
    /// Alternate angle clips, not counting `clip` itself.
    pub angles: Vec<Clip>,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PlayListMark {
    pub mark_type: MarkType,
    /// Index into the play items, in file order.
    pub play_item: u16,
    pub time_stamp: TimeStamp,
}

/// Trailing bytes after each stream entry, per category in table order:
/// primary video, primary audio, PG, IG, secondary audio, secondary video.
const CATEGORY_TRAILERS: [usize; 6] = [0, 0, 0, 0, 2, 6];

fn skip(len: usize, input: &[u8]) -> IResult<&[u8], ()> {
    map(take(len), |_| ())(input)
}

fn str_len(len: usize, input: &[u8]) -> IResult<&[u8], String> {
    map(take(len), |v: &[u8]| String::from_utf8_lossy(v).into_owned())(input)
}

fn version(input: &[u8]) -> IResult<&[u8], PlaylistVersion> {
    let (rest, magic) = take(8usize)(input)?;
    match PlaylistVersion::from_magic(magic) {
        Some(v) => Ok((rest, v)),
        None => Err(Err::Error((input, ErrorKind::Tag))),
    }
}

fn addr(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, version) = version(input)?;
    let (input, (playlist_offset, chapter_offset, extension_offset)) =
        tuple((addr, addr, addr))(input)?;
    Ok((
        input,
        Header {
            version,
            playlist_offset,
            chapter_offset,
            extension_offset,
        },
    ))
}

fn clip_file_name(input: &[u8]) -> IResult<&[u8], String> {
    str_len(5, input)
}

fn clip_codec_id(input: &[u8]) -> IResult<&[u8], String> {
    str_len(4, input)
}

fn clip(input: &[u8]) -> IResult<&[u8], Clip> {
    let (input, (file_name, codec_id)) = tuple((clip_file_name, clip_codec_id))(input)?;
    Ok((input, Clip { file_name, codec_id }))
}

fn connection(input: &[u8]) -> IResult<&[u8], (bool, u8)> {
    // ...X CCCC
    //    ^ ^^^^---- connection_condition
    //    '--------- is_multi_angle
    map(be_u8, |b| (((b >> 4) & 0x1) == 1, b & 0x0F))(input)
}

fn play_item_time(input: &[u8]) -> IResult<&[u8], TimeStamp> {
    map(be_u32, TimeStamp::clipped)(input)
}

fn angle_clip(input: &[u8]) -> IResult<&[u8], Clip> {
    let (input, clip) = clip(input)?;
    // RefToSTCID
    let (input, _) = skip(1, input)?;
    Ok((input, clip))
}

fn play_item_angles(input: &[u8]) -> IResult<&[u8], Vec<Clip>> {
    // main clip counts as an angle, too, so we want to read (n - 1) angle clips
    let (input, additional_angles) = map(be_u8, |n| n.saturating_sub(1))(input)?;
    // seamless angle change / different audios flags
    let (input, _) = skip(1, input)?;
    count(angle_clip, additional_angles as usize)(input)
}

fn video_format(input: &[u8]) -> IResult<&[u8], (VideoFormat, FrameRate)> {
    map(be_u8, |n| {
        (
            VideoFormat::from_nibble(n >> 4),
            FrameRate::from_nibble(n & 0x0F),
        )
    })(input)
}

fn aspect_ratio(input: &[u8]) -> IResult<&[u8], AspectRatio> {
    map(be_u8, |n| AspectRatio::from_nibble(n >> 4))(input)
}

fn audio_format(input: &[u8]) -> IResult<&[u8], (ChannelLayout, SampleRate)> {
    map(be_u8, |n| {
        (
            ChannelLayout::from_nibble(n >> 4),
            SampleRate::from_nibble(n & 0x0F),
        )
    })(input)
}

fn lang_code(input: &[u8]) -> IResult<&[u8], LanguageCode> {
    str_len(3, input)
}

/// The stream identifier block. Only the PID is kept.
fn stream_entry(input: &[u8]) -> IResult<&[u8], Option<u16>> {
    fn parser(input: &[u8]) -> IResult<&[u8], Option<u16>> {
        let (input, header_type) = be_u8(input)?;
        match header_type {
            0x1 => map(be_u16, Some)(input),
            // sub path id, sub clip id, PID
            0x2 => map(tuple((be_u8, be_u8, be_u16)), |(_, _, pid)| Some(pid))(input),
            // sub path id, PID
            0x3 | 0x4 => map(tuple((be_u8, be_u16)), |(_, pid)| Some(pid))(input),
            n => {
                debug!(header_type = n, "skipping stream entry with unknown header type");
                Ok((input, None))
            }
        }
    }

    length_value(be_u8, parser)(input)
}

fn coding_attrs(input: &[u8]) -> IResult<&[u8], Option<(StreamType, StreamKind)>> {
    let (input, stream_type) = map(be_u8, StreamType::from_code)(input)?;
    let (input, kind) = match stream_type {
        StreamType::MvcVideo | StreamType::Unknown(_) => {
            debug!(
                coding_type = stream_type.code(),
                "skipping unhandled stream coding type"
            );
            return Ok((input, None));
        }
        t if t.is_video() => map(
            tuple((video_format, aspect_ratio)),
            |((format, frame_rate), aspect)| video_kind(format, frame_rate, aspect),
        )(input)?,
        t if t.is_audio() => map(
            tuple((audio_format, lang_code)),
            |((layout, sample_rate), language)| audio_kind(layout, sample_rate, language),
        )(input)?,
        t if t.is_graphics() => map(lang_code, |language| StreamKind::Graphics { language })(input)?,
        // text subtitles carry a character code before the language
        _ => map(tuple((be_u8, lang_code)), |(_, language)| StreamKind::Text {
            language,
        })(input)?,
    };
    Ok((input, Some((stream_type, kind))))
}

/// The stream coding block. Its length prefix lets us step over codings we
/// don't understand.
fn stream_coding(input: &[u8]) -> IResult<&[u8], Option<(StreamType, StreamKind)>> {
    let (input, body) = length_data(be_u8)(input)?;
    let coding = match coding_attrs(body) {
        Ok((_, coding)) => coding,
        Err(_) => {
            debug!(len = body.len(), "skipping short stream coding block");
            None
        }
    };
    Ok((input, coding))
}

fn stream(input: &[u8]) -> IResult<&[u8], Option<Stream>> {
    let (input, (pid, coding)) = tuple((stream_entry, stream_coding))(input)?;
    let stream = match (pid, coding) {
        (Some(pid), Some((stream_type, kind))) => Some(Stream::from_parts(pid, stream_type, kind)),
        _ => None,
    };
    Ok((input, stream))
}

fn stream_number_table(input: &[u8]) -> IResult<&[u8], Vec<Stream>> {
    fn parser(input: &[u8]) -> IResult<&[u8], Vec<Stream>> {
        // reserved, 7 per-category counts (the last one, PiP, is not read), reserved
        let (mut input, (_, counts, _)) =
            tuple((take(2usize), take(7usize), take(5usize)))(input)?;

        let mut streams = Vec::new();
        for (&n, &trailer) in counts.iter().zip(CATEGORY_TRAILERS.iter()) {
            for _ in 0..n {
                let (rest, stream) = stream(input)?;
                let (rest, _) = skip(trailer, rest)?;
                input = rest;
                streams.extend(stream);
            }
        }
        Ok((input, streams))
    }

    length_value(be_u16, parser)(input)
}

fn play_item(input: &[u8]) -> IResult<&[u8], PlayItem> {
    fn parser(input: &[u8]) -> IResult<&[u8], PlayItem> {
        let (input, clip) = clip(input)?;
        let (input, _) = skip(1, input)?;
        let (input, (is_multi_angle, connection_condition)) = connection(input)?;
        // RefToSTCID
        let (input, _) = skip(1, input)?;
        let (input, (in_time, out_time)) = tuple((play_item_time, play_item_time))(input)?;
        // UO mask, random access flag, still mode and still time
        let (input, _) = skip(12, input)?;
        let (input, angles) = if is_multi_angle {
            play_item_angles(input)?
        } else {
            (input, Vec::new())
        };
        let (input, streams) = stream_number_table(input)?;
        trace!(
            clip = %clip.file_name,
            codec = %clip.codec_id,
            connection_condition,
            angles = angles.len(),
            streams = streams.len(),
            "decoded play item"
        );

        Ok((
            input,
            PlayItem {
                clip,
                is_multi_angle,
                connection_condition,
                in_time,
                out_time,
                angles,
                streams,
            },
        ))
    }

    length_value(be_u16, parser)(input)
}

fn play_list(input: &[u8]) -> IResult<&[u8], Vec<PlayItem>> {
    do_parse!(
        input,
        // length, reserved
        take!(6usize)
            >> n_play_items: be_u16
            // sub paths are not decoded
            >> be_u16
            >> play_items: count!(play_item, n_play_items as usize)
            >> (play_items)
    )
}

fn play_list_mark(input: &[u8]) -> IResult<&[u8], Vec<PlayListMark>> {
    fn mark(input: &[u8]) -> IResult<&[u8], PlayListMark> {
        do_parse!(
            input,
            be_u8 >>
            mark_type: map!(be_u8, MarkType::from_code) >>
            play_item: be_u16 >>
            time_stamp: map!(be_u32, |t| TimeStamp(t)) >>
            // EntryESPID and duration
            take!(6usize) >>
            (PlayListMark {
                mark_type,
                play_item,
                time_stamp,
            })
        )
    }

    let (input, _) = skip(4, input)?;
    let (input, n_marks) = be_u16(input)?;
    count(mark, n_marks as usize)(input)
}

fn section<'a>(input: &'a [u8], section: &'static str, offset: u32) -> Result<&'a [u8], ParseError> {
    input.get(offset as usize..).ok_or(ParseError::Offset {
        section,
        offset,
        len: input.len(),
    })
}

pub(crate) fn parse_mpls(input: &[u8]) -> Result<Mpls, ParseError> {
    let (_, header) = header(input).map_err(|e| match e {
        Err::Error((_, ErrorKind::Tag)) => {
            ParseError::Magic(String::from_utf8_lossy(&input[..input.len().min(8)]).into_owned())
        }
        e => ParseError::from_nom("header", e),
    })?;
    trace!(
        version = ?header.version,
        extension_offset = header.extension_offset,
        "decoded playlist header"
    );

    let body = section(input, "playlist", header.playlist_offset)?;
    let (_, play_items) = play_list(body).map_err(|e| ParseError::from_nom("playlist", e))?;

    let marks = section(input, "chapter table", header.chapter_offset)?;
    let (_, marks) =
        play_list_mark(marks).map_err(|e| ParseError::from_nom("chapter table", e))?;

    Ok(Mpls {
        version: header.version,
        play_items,
        marks,
    })
}
