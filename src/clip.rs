//! Stream clips: the excerpts of stream files a playlist plays.

use crate::disc::{ClipInfoId, StreamFileId};
use crate::stream::Counters;

/// A time-bounded excerpt of one stream file.
///
/// Times are in seconds. `time_in`/`time_out` are on the disc playback
/// clock; `relative_time_in`/`relative_time_out` place the clip on the
/// playlist's own timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamClip {
    /// Uppercase stream file name, e.g. `00001.M2TS`.
    pub name: String,
    stream_file: Option<StreamFileId>,
    clip_info: ClipInfoId,
    pub time_in: f64,
    pub time_out: f64,
    pub length: f64,
    pub relative_time_in: f64,
    pub relative_time_out: f64,
    /// 0 for the base angle, otherwise the 1-based alternate angle.
    pub angle_index: u8,
    /// Chapter marks that fall inside this clip, on the playback clock.
    pub chapters: Vec<f64>,
    /// Size of the referenced stream file, 0 if it was not found.
    pub file_size: u64,
    pub counters: Counters,
}

impl StreamClip {
    pub fn new(
        name: &str,
        stream_file: Option<StreamFileId>,
        clip_info: ClipInfoId,
        time_in: f64,
        time_out: f64,
        file_size: u64,
    ) -> Self {
        let length = time_out - time_in;
        Self {
            name: name.to_ascii_uppercase(),
            stream_file,
            clip_info,
            time_in,
            time_out,
            length,
            relative_time_in: 0.0,
            relative_time_out: length,
            angle_index: 0,
            chapters: Vec::new(),
            file_size,
            counters: Counters::default(),
        }
    }

    /// The stream file this clip plays from, if it exists on the disc.
    pub fn stream_file(&self) -> Option<StreamFileId> {
        self.stream_file
    }

    pub fn clip_info(&self) -> ClipInfoId {
        self.clip_info
    }

    /// The file name without its extension, e.g. `00001`.
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Places the clip on the playlist timeline at `offset` seconds.
    pub(crate) fn place_at(&mut self, offset: f64) {
        self.relative_time_in = offset;
        self.relative_time_out = offset + self.length;
    }

    pub fn packet_size(&self) -> u64 {
        self.counters.packet_size()
    }

    /// Bit rate over all packets counted for this clip, in bits per second.
    pub fn packet_bit_rate(&self) -> Option<u64> {
        if self.counters.packet_seconds > 0.0 {
            Some(((self.packet_size() as f64 * 8.0) / self.counters.packet_seconds).round() as u64)
        } else {
            None
        }
    }
}
