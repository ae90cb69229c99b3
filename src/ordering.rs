//! Display and candidate orderings.

use std::cmp::Ordering;

use crate::language;
use crate::playlist::Playlist;
use crate::stream::Stream;

/// Taller video first, then lower PID.
pub fn compare_video_streams(x: &Stream, y: &Stream) -> Ordering {
    y.height()
        .cmp(&x.height())
        .then_with(|| x.pid().cmp(&y.pid()))
}

/// More channels first, then by codec, language and PID like
/// [`compare_graphics_streams`].
pub fn compare_audio_streams(x: &Stream, y: &Stream) -> Ordering {
    y.channel_count()
        .cmp(&x.channel_count())
        .then_with(|| compare_graphics_streams(x, y))
}

/// Higher codec priority first, then English, then by language name, then
/// lower PID. Used for graphics and text streams.
pub fn compare_graphics_streams(x: &Stream, y: &Stream) -> Ordering {
    y.stream_type()
        .sort_index()
        .cmp(&x.stream_type().sort_index())
        .then_with(|| compare_languages(x.language(), y.language()))
        .then_with(|| x.pid().cmp(&y.pid()))
}

fn compare_languages(x: &str, y: &str) -> Ordering {
    if x == y {
        Ordering::Equal
    } else if x == "eng" {
        Ordering::Less
    } else if y == "eng" {
        Ordering::Greater
    } else {
        language::display_name(x).cmp(language::display_name(y))
    }
}

/// The numeric part of a playlist name, e.g. 800 for `00800.MPLS`.
fn playlist_number(name: &str) -> Option<u32> {
    name.split('.').next()?.parse().ok()
}

/// Orders playlists by how likely they are to be the main feature:
/// feature length first, then playlists without duplicate clips, then
/// longer playlists, then lower playlist numbers. Names that are not
/// numeric sort after numeric ones.
pub fn compare_playlists(x: &Playlist, y: &Playlist) -> Ordering {
    y.is_feature_length
        .cmp(&x.is_feature_length)
        .then_with(|| x.has_duplicate_clips().cmp(&y.has_duplicate_clips()))
        .then_with(|| y.total_length().total_cmp(&x.total_length()))
        .then_with(|| match (playlist_number(&x.name), playlist_number(&y.name)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.name.cmp(&y.name),
        })
}
