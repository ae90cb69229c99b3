//! Builds playlist files byte by byte, plus the disc catalogs they refer to.
#![allow(dead_code)]

use bdplaylist::{Catalog, ClipInfo, Stream, StreamFile, StreamType};

pub const TICKS_PER_SECOND: u32 = 45_000;

pub fn ticks(seconds: u32) -> u32 {
    seconds * TICKS_PER_SECOND
}

/// Slots of the stream number table, in file order.
#[derive(Debug, Copy, Clone)]
pub enum Slot {
    PrimaryVideo = 0,
    PrimaryAudio = 1,
    PresentationGraphics = 2,
    InteractiveGraphics = 3,
    SecondaryAudio = 4,
    SecondaryVideo = 5,
}

impl Slot {
    fn trailer(self) -> usize {
        match self {
            Slot::SecondaryAudio => 2,
            Slot::SecondaryVideo => 6,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamEntry {
    slot: Slot,
    identifier: Vec<u8>,
    coding: Vec<u8>,
}

impl StreamEntry {
    /// A stream of the play item's own clip, with the raw coding block
    /// contents (stream type first).
    pub fn new(slot: Slot, pid: u16, coding: &[u8]) -> Self {
        Self::with_identifier(slot, vec![0x01, (pid >> 8) as u8, pid as u8], coding)
    }

    pub fn with_identifier(slot: Slot, identifier: Vec<u8>, coding: &[u8]) -> Self {
        Self {
            slot,
            identifier,
            coding: coding.to_vec(),
        }
    }

    /// 1080p, 23.976 fps, 16:9 video.
    pub fn video(pid: u16, stream_type: u8) -> Self {
        Self::new(Slot::PrimaryVideo, pid, &[stream_type, 0x61, 0x30, 0, 0])
    }

    /// Multichannel 48 kHz audio.
    pub fn audio(pid: u16, stream_type: u8, language: &str) -> Self {
        let mut coding = vec![stream_type, 0x61];
        coding.extend_from_slice(language.as_bytes());
        Self::new(Slot::PrimaryAudio, pid, &coding)
    }

    pub fn graphics(pid: u16, language: &str) -> Self {
        let mut coding = vec![0x90];
        coding.extend_from_slice(language.as_bytes());
        coding.push(0);
        Self::new(Slot::PresentationGraphics, pid, &coding)
    }

    pub fn subtitle(pid: u16, language: &str) -> Self {
        let mut coding = vec![0x92, 0x01];
        coding.extend_from_slice(language.as_bytes());
        Self::new(Slot::PresentationGraphics, pid, &coding)
    }

    pub fn in_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut identifier = self.identifier.clone();
        identifier.resize(9, 0);
        out.push(identifier.len() as u8);
        out.extend_from_slice(&identifier);
        out.push(self.coding.len() as u8);
        out.extend_from_slice(&self.coding);
        out.extend(std::iter::repeat(0).take(self.slot.trailer()));
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub clip: String,
    pub in_time: u32,
    pub out_time: u32,
    pub angles: Vec<String>,
    pub streams: Vec<StreamEntry>,
}

impl Item {
    /// A play item of clip `clip` (e.g. "00001"), with times in 45 kHz
    /// ticks.
    pub fn new(clip: &str, in_time: u32, out_time: u32) -> Self {
        Self {
            clip: clip.to_string(),
            in_time,
            out_time,
            angles: Vec::new(),
            streams: Vec::new(),
        }
    }

    pub fn angles(mut self, angles: &[&str]) -> Self {
        self.angles = angles.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn stream(mut self, entry: StreamEntry) -> Self {
        self.streams.push(entry);
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut body = Vec::new();
        body.extend_from_slice(self.clip.as_bytes());
        body.extend_from_slice(b"M2TS");
        body.push(0);
        body.push(if self.angles.is_empty() { 0x01 } else { 0x11 });
        body.push(0);
        body.extend_from_slice(&self.in_time.to_be_bytes());
        body.extend_from_slice(&self.out_time.to_be_bytes());
        body.extend_from_slice(&[0; 12]);
        if !self.angles.is_empty() {
            body.push(self.angles.len() as u8 + 1);
            body.push(0);
            for angle in &self.angles {
                body.extend_from_slice(angle.as_bytes());
                body.extend_from_slice(b"M2TS");
                body.push(0);
            }
        }
        write_stream_table(&self.streams, &mut body);

        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(&body);
    }
}

fn write_stream_table(streams: &[StreamEntry], out: &mut Vec<u8>) {
    let mut counts = [0u8; 7];
    let mut entries = Vec::new();
    for slot in 0..6 {
        for entry in streams.iter().filter(|e| e.slot as usize == slot) {
            counts[slot] += 1;
            entry.write(&mut entries);
        }
    }

    let mut table = vec![0, 0];
    table.extend_from_slice(&counts);
    table.extend_from_slice(&[0; 5]);
    table.extend_from_slice(&entries);

    out.extend_from_slice(&(table.len() as u16).to_be_bytes());
    out.extend_from_slice(&table);
}

#[derive(Debug, Clone)]
pub struct Mark {
    pub mark_type: u8,
    pub play_item: u16,
    pub time_stamp: u32,
}

#[derive(Debug, Clone)]
pub struct MplsBuilder {
    magic: Vec<u8>,
    items: Vec<Item>,
    marks: Vec<Mark>,
}

impl Default for MplsBuilder {
    fn default() -> Self {
        Self {
            magic: b"MPLS0200".to_vec(),
            items: Vec::new(),
            marks: Vec::new(),
        }
    }
}

impl MplsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn magic(mut self, magic: &[u8]) -> Self {
        self.magic = magic.to_vec();
        self
    }

    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// An entry point mark at `time_stamp` ticks into play item `play_item`.
    pub fn chapter(self, play_item: u16, time_stamp: u32) -> Self {
        self.mark(1, play_item, time_stamp)
    }

    pub fn mark(mut self, mark_type: u8, play_item: u16, time_stamp: u32) -> Self {
        self.marks.push(Mark {
            mark_type,
            play_item,
            time_stamp,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut play_list = Vec::new();
        play_list.extend_from_slice(&[0, 0]);
        play_list.extend_from_slice(&(self.items.len() as u16).to_be_bytes());
        play_list.extend_from_slice(&[0, 0]);
        for item in &self.items {
            item.write(&mut play_list);
        }

        let mut marks = Vec::new();
        marks.extend_from_slice(&(self.marks.len() as u16).to_be_bytes());
        for mark in &self.marks {
            marks.push(0);
            marks.push(mark.mark_type);
            marks.extend_from_slice(&mark.play_item.to_be_bytes());
            marks.extend_from_slice(&mark.time_stamp.to_be_bytes());
            marks.extend_from_slice(&[0xFF, 0xFF, 0, 0, 0, 0]);
        }

        let header_len = 20u32;
        let playlist_offset = header_len;
        let chapter_offset = playlist_offset + 4 + play_list.len() as u32;

        let mut out = self.magic.clone();
        out.extend_from_slice(&playlist_offset.to_be_bytes());
        out.extend_from_slice(&chapter_offset.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(play_list.len() as u32).to_be_bytes());
        out.extend_from_slice(&play_list);
        out.extend_from_slice(&(marks.len() as u32).to_be_bytes());
        out.extend_from_slice(&marks);
        out
    }
}

/// Registers a stream file and a clip info file for each clip number, with
/// the clip info declaring `streams`.
pub fn catalog_with(clips: &[&str], streams: &[Stream]) -> Catalog {
    let mut catalog = Catalog::new();
    for (i, clip) in clips.iter().enumerate() {
        catalog.add_stream_file(StreamFile::new(
            &format!("{}.M2TS", clip),
            1_000_000 * (i as u64 + 1),
        ));
        let mut info = ClipInfo::new(&format!("{}.CLPI", clip));
        for stream in streams {
            info.insert_stream(stream.clone());
        }
        catalog.add_clip_info(info);
    }
    catalog
}

pub fn stream(pid: u16, stream_type: StreamType) -> Stream {
    match Stream::new(pid, stream_type) {
        Some(stream) => stream,
        None => panic!("{:?} has no stream category", stream_type),
    }
}
