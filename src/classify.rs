//! Main feature heuristics.
//!
//! The predicates here are pure functions of a playlist's state. Three of
//! their inputs, `is_feature_length`, `is_duplicate` and `is_max_quality`,
//! are policy decisions made across the whole disc; [`apply_policy`] fills
//! them in with sensible defaults, or callers can set them directly.

use std::collections::HashSet;

use crate::config::{ClassifierPolicy, PlaylistFilter};
use crate::ordering::compare_playlists;
use crate::playlist::Playlist;

/// How likely a playlist is to be the main feature. Lower is more likely.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    MainMovieHq,
    MainMovieLq,
    BogusFeature,
    Short,
}

impl Playlist {
    pub fn is_short(&self) -> bool {
        !self.is_feature_length
    }

    /// True if two clips have the same length and file size. This is a
    /// cheap fingerprint, not a content comparison.
    pub fn has_duplicate_clips(&self) -> bool {
        let mut seen = HashSet::new();
        self.clips
            .iter()
            .any(|c| !seen.insert((c.length.to_bits(), c.file_size)))
    }

    pub fn is_bogus(&self) -> bool {
        (self.has_duplicate_clips() || self.is_duplicate) && self.is_feature_length
    }

    pub fn is_low_quality(&self) -> bool {
        !self.is_max_quality
    }

    pub fn is_low_quality_only(&self) -> bool {
        self.is_low_quality() && !self.is_bogus() && self.is_feature_length
    }

    pub fn is_bogus_only(&self) -> bool {
        self.is_bogus() && self.is_max_quality
    }

    pub fn is_likely_main_movie(&self) -> bool {
        match self.main_movie_override {
            Some(forced) => forced,
            None => {
                self.is_feature_length
                    && !self.has_duplicate_clips()
                    && !self.is_duplicate
                    && self.is_max_quality
            }
        }
    }

    pub fn rank(&self) -> Rank {
        if self.is_likely_main_movie() {
            Rank::MainMovieHq
        } else if self.is_low_quality_only() {
            Rank::MainMovieLq
        } else if self.is_bogus() {
            Rank::BogusFeature
        } else {
            Rank::Short
        }
    }

    /// Whether the playlist is worth showing at all.
    pub fn is_valid(&self, filter: &PlaylistFilter) -> bool {
        if !self.is_initialized {
            return false;
        }
        if filter.filter_short && self.total_length() < filter.min_duration {
            return false;
        }
        if filter.filter_looping && self.has_loops {
            return false;
        }
        true
    }
}

/// Sorts playlists so the most likely main feature comes first. The sort
/// is stable.
pub fn sort_candidates(playlists: &mut [Playlist]) {
    playlists.sort_by(compare_playlists);
}

fn clip_fingerprint(playlist: &Playlist) -> Vec<(&str, u64, u64)> {
    playlist
        .clips
        .iter()
        .filter(|c| c.angle_index == 0)
        .map(|c| (c.name.as_str(), c.time_in.to_bits(), c.time_out.to_bits()))
        .collect()
}

/// Tallest video and most audio channels.
fn quality(playlist: &Playlist) -> (u32, u32) {
    let height = playlist.video_streams().iter().map(|s| s.height()).max();
    let channels = playlist.audio_streams().iter().map(|s| s.channel_count()).max();
    (height.unwrap_or(0), channels.unwrap_or(0))
}

/// Fills in the disc-level flags of every playlist.
///
/// - feature length: at least `policy.feature_length` seconds long.
/// - duplicate: plays the same base angle clips, with the same in and out
///   times, as a playlist that ranks ahead of it.
/// - max quality: feature length, with video as tall and audio with as
///   many channels as any feature length playlist on the disc.
pub fn apply_policy(playlists: &mut [Playlist], policy: &ClassifierPolicy) {
    for playlist in playlists.iter_mut() {
        playlist.is_feature_length = playlist.total_length() >= policy.feature_length;
    }

    let mut order: Vec<usize> = (0..playlists.len()).collect();
    order.sort_by(|&a, &b| compare_playlists(&playlists[a], &playlists[b]));
    let duplicates: Vec<usize> = {
        let mut seen = HashSet::new();
        order
            .into_iter()
            .filter(|&i| {
                let fingerprint = clip_fingerprint(&playlists[i]);
                !fingerprint.is_empty() && !seen.insert(fingerprint)
            })
            .collect()
    };
    for playlist in playlists.iter_mut() {
        playlist.is_duplicate = false;
    }
    for i in duplicates {
        playlists[i].is_duplicate = true;
    }

    let features = || playlists.iter().filter(|p| p.is_feature_length).map(quality);
    let best = (
        features().map(|(height, _)| height).max().unwrap_or(0),
        features().map(|(_, channels)| channels).max().unwrap_or(0),
    );
    for playlist in playlists.iter_mut() {
        playlist.is_max_quality = playlist.is_feature_length && quality(playlist) == best;
    }
}
