//! The resolved playlist model.
//!
//! A [`Playlist`] is built in two steps. Decoding turns the raw bytes into
//! an ordered clip timeline, the playlist-declared streams and the chapter
//! list. Initialization then reconciles the declared streams with what the
//! clip info and stream files say, expands per-angle copies and flags
//! looping playlists.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use tracing::{debug, warn};

use crate::clip::StreamClip;
use crate::disc::{Catalog, StreamFile, StreamFileId};
use crate::error::{Error, Result};
use crate::ordering::{compare_audio_streams, compare_graphics_streams, compare_video_streams};
use crate::parser::{parse_mpls, PlayItem, PlayListMark};
use crate::stream::Stream;
use crate::types::{MarkType, PlaylistVersion, StreamCategory};

/// Chapter marks closer than this to the end of the playlist are dropped.
const TRAILING_CHAPTER_WINDOW: f64 = 1.0;

/// Addresses one stream of a playlist: the base copy in `streams` for angle
/// 0, otherwise the per-angle copy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamKey {
    pub pid: u16,
    pub angle_index: u8,
}

impl StreamKey {
    pub fn base(pid: u16) -> Self {
        Self { pid, angle_index: 0 }
    }
}

/// A movie playlist, resolved against the files of its disc.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Playlist {
    /// File name, e.g. `00800.MPLS`.
    pub name: String,
    /// `None` for custom playlists, which are not decoded from a file.
    pub version: Option<PlaylistVersion>,
    pub is_custom: bool,
    /// Clips in file order. Each primary clip is followed by its alternate
    /// angle clips.
    pub clips: Vec<StreamClip>,
    /// Chapter start times in seconds on the playlist timeline.
    pub chapters: Vec<f64>,
    /// Number of alternate angles, not counting the base angle.
    pub angle_count: u8,
    /// Reconciled streams, keyed by PID.
    pub streams: BTreeMap<u16, Stream>,
    /// Streams as declared by the playlist itself.
    pub playlist_streams: BTreeMap<u16, Stream>,
    /// Per alternate angle, copies of the video streams for that angle.
    pub angle_streams: Vec<BTreeMap<u16, Stream>>,
    /// Per alternate angle, indices into `clips` forming that angle's
    /// timeline.
    pub angle_clips: Vec<Vec<usize>>,
    pub video_pids: Vec<u16>,
    pub audio_pids: Vec<u16>,
    pub graphics_pids: Vec<u16>,
    pub text_pids: Vec<u16>,
    /// Every stream including angle copies, in display order.
    pub sorted_keys: Vec<StreamKey>,
    pub has_loops: bool,
    pub hidden_track_count: usize,
    pub is_initialized: bool,
    pub is_feature_length: bool,
    pub is_duplicate: bool,
    pub is_max_quality: bool,
    /// Overrides automatic main movie detection when set.
    pub main_movie_override: Option<bool>,
}

impl Playlist {
    /// Creates an empty, uninitialized playlist.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            version: None,
            is_custom: false,
            clips: Vec::new(),
            chapters: Vec::new(),
            angle_count: 0,
            streams: BTreeMap::new(),
            playlist_streams: BTreeMap::new(),
            angle_streams: Vec::new(),
            angle_clips: Vec::new(),
            video_pids: Vec::new(),
            audio_pids: Vec::new(),
            graphics_pids: Vec::new(),
            text_pids: Vec::new(),
            sorted_keys: Vec::new(),
            has_loops: false,
            hidden_track_count: 0,
            is_initialized: false,
            is_feature_length: false,
            is_duplicate: false,
            is_max_quality: false,
            main_movie_override: None,
        }
    }

    /// Decodes and initializes a playlist.
    ///
    /// # Examples
    /// ```no_run
    /// # fn main() -> bdplaylist::Result<()> {
    /// use bdplaylist::{Catalog, Playlist};
    ///
    /// let catalog = Catalog::new(); // filled in by disc traversal
    /// let bytes = std::fs::read("BDMV/PLAYLIST/00800.mpls")?;
    /// let playlist = Playlist::load("00800.MPLS", &bytes, &catalog)?;
    /// println!("{} runs {:.1} s", playlist.name, playlist.total_length());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(name: &str, data: &[u8], catalog: &Catalog) -> Result<Self> {
        let mut playlist = Self::decode(name, data, catalog)?;
        playlist.initialize(catalog);
        Ok(playlist)
    }

    /// Reads a whole playlist file from `reader`, then decodes and
    /// initializes it.
    pub fn from_reader<R: Read>(name: &str, mut reader: R, catalog: &Catalog) -> Result<Self> {
        let bytes = {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            buffer
        };
        Self::load(name, &bytes, catalog)
    }

    /// Builds an initialized playlist from an explicit list of clips.
    ///
    /// The clips are laid out back to back in the given order. Custom
    /// playlists declare no streams of their own, so none of their streams
    /// are counted as hidden.
    pub fn custom(name: &str, clips: Vec<StreamClip>, catalog: &Catalog) -> Self {
        let mut playlist = Self::new(name);
        playlist.is_custom = true;
        for mut clip in clips {
            clip.angle_index = 0;
            clip.place_at(playlist.total_length());
            playlist.clips.push(clip);
        }
        playlist.initialize(catalog);
        playlist
    }

    /// Decodes the clip timeline, declared streams and chapters of a
    /// playlist without reconciling its streams.
    pub fn decode(name: &str, data: &[u8], catalog: &Catalog) -> Result<Self> {
        let mut playlist = Self::new(name);
        let mpls = parse_mpls(data).map_err(|e| Error::malformed(&playlist.name, e))?;
        playlist.version = Some(mpls.version);

        let mut primary_clips = Vec::with_capacity(mpls.play_items.len());
        for item in &mpls.play_items {
            primary_clips.push(playlist.clips.len());
            playlist.push_play_item(item, catalog)?;
        }
        playlist.add_chapters(&mpls.marks, &primary_clips);

        debug!(
            playlist = %playlist.name,
            clips = playlist.clips.len(),
            angles = playlist.angle_count,
            chapters = playlist.chapters.len(),
            "decoded playlist"
        );
        Ok(playlist)
    }

    fn push_play_item(&mut self, item: &PlayItem, catalog: &Catalog) -> Result<()> {
        let stream_name = item.clip.stream_file_name();
        let clip_info_name = item.clip.clip_info_name();

        let stream_file = catalog.find_stream_file(&stream_name);
        if stream_file.is_none() {
            warn!(playlist = %self.name, file = %stream_name, "playlist references missing stream file");
        }
        let clip_info = catalog
            .find_clip_info(&clip_info_name)
            .ok_or_else(|| Error::MissingClipInfo {
                playlist: self.name.clone(),
                file: clip_info_name.clone(),
            })?;

        let time_in = item.in_time.seconds();
        let time_out = item.out_time.seconds();
        let file_size = stream_file.map_or(0, |id| catalog.stream_file(id).size);

        let mut clip = StreamClip::new(&stream_name, stream_file, clip_info, time_in, time_out, file_size);
        let offset = self.total_length();
        clip.place_at(offset);
        self.clips.push(clip);

        for (i, angle) in item.angles.iter().enumerate() {
            let angle_stream_name = angle.stream_file_name();
            let angle_clip_info_name = angle.clip_info_name();
            let missing = |file: String| Error::MissingAngleFile {
                playlist: self.name.clone(),
                file,
            };
            let angle_stream = catalog
                .find_stream_file(&angle_stream_name)
                .ok_or_else(|| missing(angle_stream_name.clone()))?;
            let angle_clip_info = catalog
                .find_clip_info(&angle_clip_info_name)
                .ok_or_else(|| missing(angle_clip_info_name.clone()))?;

            let mut angle_clip = StreamClip::new(
                &angle_stream_name,
                Some(angle_stream),
                angle_clip_info,
                time_in,
                time_out,
                catalog.stream_file(angle_stream).size,
            );
            angle_clip.angle_index = (i + 1) as u8;
            angle_clip.place_at(offset);
            self.clips.push(angle_clip);
        }
        if item.is_multi_angle {
            self.angle_count = self.angle_count.max(item.angles.len() as u8);
        }

        for stream in &item.streams {
            self.playlist_streams.insert(stream.pid(), stream.clone());
        }
        Ok(())
    }

    fn add_chapters(&mut self, marks: &[PlayListMark], primary_clips: &[usize]) {
        let total_length = self.total_length();

        for mark in marks.iter().filter(|m| m.mark_type == MarkType::EntryPoint) {
            let index = match primary_clips.get(mark.play_item as usize) {
                Some(&index) => index,
                None => {
                    warn!(
                        playlist = %self.name,
                        play_item = mark.play_item,
                        "chapter mark references a missing play item"
                    );
                    continue;
                }
            };
            let clip = &mut self.clips[index];
            let seconds = mark.time_stamp.seconds();
            let relative = seconds - clip.time_in + clip.relative_time_in;

            if relative < 0.0 || total_length - relative <= TRAILING_CHAPTER_WINDOW {
                debug!(playlist = %self.name, chapter = relative, "dropping chapter mark");
                continue;
            }
            clip.chapters.push(seconds);
            self.chapters.push(relative);
        }

        self.chapters.sort_by(f64::total_cmp);
        for clip in &mut self.clips {
            clip.chapters.sort_by(f64::total_cmp);
        }
    }

    /// Reconciles streams, detects loops and resets the accumulators.
    pub fn initialize(&mut self, catalog: &Catalog) {
        self.reconcile(catalog);
        self.has_loops = has_loops(&self.clips);
        for clip in &mut self.clips {
            clip.counters.clear();
        }
        self.clear_stream_counters();
        self.is_initialized = true;
    }

    /// Rebuilds `streams` and everything derived from it.
    ///
    /// `catalog` should be the one the playlist was decoded against. Files
    /// it does not hold are skipped.
    ///
    /// The reference clip's clip info seeds the stream set. Attributes found
    /// by scanning the reference clip's stream file then refine it, and
    /// every video stream is copied once per alternate angle. Reconciling
    /// twice gives the same result as reconciling once.
    pub fn reconcile(&mut self, catalog: &Catalog) {
        self.streams.clear();
        self.angle_streams.clear();
        self.video_pids.clear();
        self.audio_pids.clear();
        self.graphics_pids.clear();
        self.text_pids.clear();
        self.sorted_keys.clear();
        self.hidden_track_count = 0;
        self.angle_clips = self.build_angle_clips();

        let (clip_info, stream_file) = match self.reference_clip(catalog) {
            Some(clip) => (clip.clip_info(), clip.stream_file()),
            None => return,
        };

        let declared_streams = match catalog.get_clip_info(clip_info) {
            Some(info) => &info.streams,
            None => {
                debug!(playlist = %self.name, "reference clip info is not in this catalog");
                return;
            }
        };
        for (&pid, declared) in declared_streams {
            let mut stream = declared.clone();
            stream.angle_index = 0;
            stream.is_hidden = !self.is_custom && !self.playlist_streams.contains_key(&pid);
            if stream.is_hidden {
                self.hidden_track_count += 1;
            }
            self.streams.insert(pid, stream);
        }

        if let Some(file) = stream_file.and_then(|id| catalog.get_stream_file(id)) {
            for (pid, found) in &file.streams {
                if let Some(stream) = self.streams.get_mut(pid) {
                    if !stream.merge_from(found) {
                        debug!(
                            playlist = %self.name,
                            pid = *pid,
                            declared = %stream.stream_type(),
                            found = %found.stream_type(),
                            "stream type mismatch, keeping clip info attributes"
                        );
                    }
                }
            }
        }

        self.sort_streams();
        self.expand_angles();
    }

    /// The primary clip whose clip info declares the most streams, the
    /// longest such clip on ties. Clips whose clip info is not in `catalog`
    /// are passed over.
    pub fn reference_clip(&self, catalog: &Catalog) -> Option<&StreamClip> {
        let mut best: Option<(&StreamClip, usize)> = None;
        for clip in self.clips.iter().filter(|c| c.angle_index == 0) {
            let n = match catalog.get_clip_info(clip.clip_info()) {
                Some(info) => info.streams.len(),
                None => continue,
            };
            let better = match best {
                None => true,
                Some((b, bn)) => n > bn || (n == bn && clip.length > b.length),
            };
            if better {
                best = Some((clip, n));
            }
        }
        best.map(|(clip, _)| clip)
    }

    fn build_angle_clips(&self) -> Vec<Vec<usize>> {
        let mut angles = vec![Vec::new(); self.angle_count as usize];
        let mut i = 0;
        while i < self.clips.len() {
            // a primary clip and the alternates that follow it
            let end = self.clips[i + 1..]
                .iter()
                .position(|c| c.angle_index == 0)
                .map_or(self.clips.len(), |p| i + 1 + p);
            for (a, timeline) in angles.iter_mut().enumerate() {
                let angle = (a + 1) as u8;
                let clip = (i + 1..end)
                    .find(|&j| self.clips[j].angle_index == angle)
                    .unwrap_or(i);
                timeline.push(clip);
            }
            i = end;
        }
        angles
    }

    fn sort_streams(&mut self) {
        let mut video = Vec::new();
        let mut audio = Vec::new();
        let mut graphics = Vec::new();
        let mut text = Vec::new();
        for stream in self.streams.values() {
            match stream.category() {
                StreamCategory::Video => video.push(stream),
                StreamCategory::Audio => audio.push(stream),
                StreamCategory::Graphics => graphics.push(stream),
                StreamCategory::Text => text.push(stream),
            }
        }
        video.sort_by(|a, b| compare_video_streams(a, b));
        audio.sort_by(|a, b| compare_audio_streams(a, b));
        graphics.sort_by(|a, b| compare_graphics_streams(a, b));
        text.sort_by(|a, b| compare_graphics_streams(a, b));

        self.video_pids = video.iter().map(|s| s.pid()).collect();
        self.audio_pids = audio.iter().map(|s| s.pid()).collect();
        self.graphics_pids = graphics.iter().map(|s| s.pid()).collect();
        self.text_pids = text.iter().map(|s| s.pid()).collect();
    }

    fn expand_angles(&mut self) {
        self.angle_streams = vec![BTreeMap::new(); self.angle_count as usize];
        for &pid in &self.video_pids {
            self.sorted_keys.push(StreamKey::base(pid));
            let stream = match self.streams.get(&pid) {
                Some(stream) => stream,
                None => continue,
            };
            for (i, angle_streams) in self.angle_streams.iter_mut().enumerate() {
                let angle_index = (i + 1) as u8;
                let mut copy = stream.clone();
                copy.angle_index = angle_index;
                angle_streams.insert(pid, copy);
                self.sorted_keys.push(StreamKey { pid, angle_index });
            }
        }
        let rest = self
            .audio_pids
            .iter()
            .chain(&self.graphics_pids)
            .chain(&self.text_pids);
        for &pid in rest {
            self.sorted_keys.push(StreamKey::base(pid));
        }
    }

    pub fn stream(&self, key: StreamKey) -> Option<&Stream> {
        match key.angle_index {
            0 => self.streams.get(&key.pid),
            n => self.angle_streams.get(n as usize - 1)?.get(&key.pid),
        }
    }

    /// Every stream including per-angle video copies, in display order.
    pub fn sorted_streams(&self) -> impl Iterator<Item = &Stream> + '_ {
        self.sorted_keys.iter().filter_map(move |&key| self.stream(key))
    }

    fn streams_for<'a>(&'a self, pids: &'a [u16]) -> Vec<&'a Stream> {
        pids.iter().filter_map(|pid| self.streams.get(pid)).collect()
    }

    pub fn video_streams(&self) -> Vec<&Stream> {
        self.streams_for(&self.video_pids)
    }

    pub fn audio_streams(&self) -> Vec<&Stream> {
        self.streams_for(&self.audio_pids)
    }

    pub fn graphics_streams(&self) -> Vec<&Stream> {
        self.streams_for(&self.graphics_pids)
    }

    pub fn text_streams(&self) -> Vec<&Stream> {
        self.streams_for(&self.text_pids)
    }

    /// The clips played for `angle`. Angle 0 is the base angle; an angle
    /// this playlist does not have falls back to the base angle.
    pub fn angle_segments(&self, angle: u8) -> Vec<&StreamClip> {
        match angle.checked_sub(1).and_then(|a| self.angle_clips.get(a as usize)) {
            Some(timeline) => timeline.iter().map(|&i| &self.clips[i]).collect(),
            None => self.clips.iter().filter(|c| c.angle_index == 0).collect(),
        }
    }

    /// Length in seconds of the base angle timeline.
    pub fn total_length(&self) -> f64 {
        self.clips
            .iter()
            .filter(|c| c.angle_index == 0)
            .map(|c| c.length)
            .sum()
    }

    /// Length in seconds of every clip, alternate angles included.
    pub fn total_angle_length(&self) -> f64 {
        self.clips.iter().map(|c| c.length).sum()
    }

    /// Combined size of the stream files of every clip.
    pub fn file_size(&self) -> u64 {
        self.clips.iter().map(|c| c.file_size).sum()
    }

    /// Bytes of the packets counted for the base angle.
    pub fn total_size(&self) -> u64 {
        self.clips
            .iter()
            .filter(|c| c.angle_index == 0)
            .map(|c| c.packet_size())
            .sum()
    }

    pub fn total_angle_size(&self) -> u64 {
        self.clips.iter().map(|c| c.packet_size()).sum()
    }

    /// Bit rate of the base angle in bits per second.
    pub fn total_bit_rate(&self) -> u64 {
        let length = self.total_length();
        if length > 0.0 {
            ((self.total_size() as f64 * 8.0) / length).round() as u64
        } else {
            0
        }
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    fn clear_stream_counters(&mut self) {
        let angle_streams = self.angle_streams.iter_mut().flat_map(|m| m.values_mut());
        for stream in self.streams.values_mut().chain(angle_streams) {
            stream.clear_counters();
        }
    }

    /// Clears the accumulators of the clips, of the reconciled streams and
    /// of every stream file this playlist plays from.
    ///
    /// Stream files can be shared between playlists; the caller must not
    /// refill a shared file from two places at once.
    pub fn clear_bitrates(&mut self, catalog: &mut Catalog) {
        for clip in &mut self.clips {
            clip.counters.clear();
            if let Some(id) = clip.stream_file() {
                if let Some(file) = catalog.get_stream_file_mut(id) {
                    file.clear_counters();
                }
            }
        }
        self.clear_stream_counters();
    }

    /// Adds the counters of a freshly scanned stream file to every clip that
    /// plays from it and to the matching playlist streams, then refreshes
    /// the stream bit rates.
    pub fn absorb_stream_file(&mut self, id: StreamFileId, file: &StreamFile) {
        let totals = file.total_counters();
        for clip in self.clips.iter_mut().filter(|c| c.stream_file() == Some(id)) {
            clip.counters.absorb(&totals);
            let target = match clip.angle_index {
                0 => &mut self.streams,
                n => match self.angle_streams.get_mut(n as usize - 1) {
                    Some(streams) => streams,
                    None => continue,
                },
            };
            for (pid, scanned) in &file.streams {
                if let Some(stream) = target.get_mut(pid) {
                    stream.counters.absorb(&scanned.counters);
                }
            }
        }

        let angle_streams = self.angle_streams.iter_mut().flat_map(|m| m.values_mut());
        for stream in self.streams.values_mut().chain(angle_streams) {
            stream.refresh_bit_rate();
        }
    }
}

/// True if two base angle clips play the same file from the same in time.
fn has_loops(clips: &[StreamClip]) -> bool {
    let mut seen: HashMap<&str, Vec<f64>> = HashMap::new();
    for clip in clips.iter().filter(|c| c.angle_index == 0) {
        let times = seen.entry(clip.name.as_str()).or_default();
        if times.contains(&clip.time_in) {
            return true;
        }
        times.push(clip.time_in);
    }
    false
}
