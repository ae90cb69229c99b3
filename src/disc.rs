//! Stream files and clip info files discovered on the disc.
//!
//! Disc traversal and the demuxer populate these; the playlist decoder only
//! reads them. A [`Catalog`] owns every file and hands out ids, so clips can
//! refer back to the file they play from without owning a copy of its
//! streams.

use std::collections::{BTreeMap, HashMap};

use crate::stream::{Counters, Stream};

/// Index of a [`StreamFile`] in a [`Catalog`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamFileId(usize);

/// Index of a [`ClipInfo`] in a [`Catalog`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipInfoId(usize);

/// A `.m2ts` transport stream file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamFile {
    /// Uppercase file name, e.g. `00001.M2TS`.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Streams found by the demuxer, keyed by PID.
    pub streams: BTreeMap<u16, Stream>,
}

impl StreamFile {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            size,
            streams: BTreeMap::new(),
        }
    }

    pub fn insert_stream(&mut self, stream: Stream) {
        self.streams.insert(stream.pid(), stream);
    }

    /// Sum of the accumulators of every stream in the file.
    pub fn total_counters(&self) -> Counters {
        self.streams.values().fold(Counters::default(), |mut acc, s| {
            acc.absorb(&s.counters);
            acc
        })
    }

    pub fn clear_counters(&mut self) {
        for stream in self.streams.values_mut() {
            stream.clear_counters();
        }
    }
}

/// A `.clpi` clip info file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipInfo {
    /// Uppercase file name, e.g. `00001.CLPI`.
    pub name: String,
    /// Streams declared by the clip info, keyed by PID.
    pub streams: BTreeMap<u16, Stream>,
}

impl ClipInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            streams: BTreeMap::new(),
        }
    }

    pub fn insert_stream(&mut self, stream: Stream) {
        self.streams.insert(stream.pid(), stream);
    }
}

/// Name-keyed lookup tables for the stream and clip info files of one disc.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Catalog {
    stream_files: Vec<StreamFile>,
    clip_infos: Vec<ClipInfo>,
    stream_file_names: HashMap<String, StreamFileId>,
    clip_info_names: HashMap<String, ClipInfoId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stream file, replacing any file of the same name in place.
    pub fn add_stream_file(&mut self, file: StreamFile) -> StreamFileId {
        if let Some(&id) = self.stream_file_names.get(&file.name) {
            self.stream_files[id.0] = file;
            return id;
        }
        let id = StreamFileId(self.stream_files.len());
        self.stream_file_names.insert(file.name.clone(), id);
        self.stream_files.push(file);
        id
    }

    /// Adds a clip info file, replacing any file of the same name in place.
    pub fn add_clip_info(&mut self, info: ClipInfo) -> ClipInfoId {
        if let Some(&id) = self.clip_info_names.get(&info.name) {
            self.clip_infos[id.0] = info;
            return id;
        }
        let id = ClipInfoId(self.clip_infos.len());
        self.clip_info_names.insert(info.name.clone(), id);
        self.clip_infos.push(info);
        id
    }

    /// Looks up a stream file by name, ignoring case.
    pub fn find_stream_file(&self, name: &str) -> Option<StreamFileId> {
        self.stream_file_names
            .get(&name.to_ascii_uppercase())
            .copied()
    }

    /// Looks up a clip info file by name, ignoring case.
    pub fn find_clip_info(&self, name: &str) -> Option<ClipInfoId> {
        self.clip_info_names.get(&name.to_ascii_uppercase()).copied()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this catalog.
    pub fn stream_file(&self, id: StreamFileId) -> &StreamFile {
        &self.stream_files[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this catalog.
    pub fn stream_file_mut(&mut self, id: StreamFileId) -> &mut StreamFile {
        &mut self.stream_files[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this catalog.
    pub fn clip_info(&self, id: ClipInfoId) -> &ClipInfo {
        &self.clip_infos[id.0]
    }

    /// Like [`Catalog::stream_file`], but `None` for an id this catalog did
    /// not issue.
    pub fn get_stream_file(&self, id: StreamFileId) -> Option<&StreamFile> {
        self.stream_files.get(id.0)
    }

    pub fn get_stream_file_mut(&mut self, id: StreamFileId) -> Option<&mut StreamFile> {
        self.stream_files.get_mut(id.0)
    }

    pub fn get_clip_info(&self, id: ClipInfoId) -> Option<&ClipInfo> {
        self.clip_infos.get(id.0)
    }

    pub fn stream_files(&self) -> impl Iterator<Item = (StreamFileId, &StreamFile)> {
        self.stream_files
            .iter()
            .enumerate()
            .map(|(i, f)| (StreamFileId(i), f))
    }

    pub fn clip_infos(&self) -> impl Iterator<Item = (ClipInfoId, &ClipInfo)> {
        self.clip_infos
            .iter()
            .enumerate()
            .map(|(i, c)| (ClipInfoId(i), c))
    }
}
