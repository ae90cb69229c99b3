//! A Blu-ray movie playlist (MPLS) decoder.
//!
//! Decoding a playlist with [`Playlist::load`] gives the ordered clip
//! timeline, alternate angle clips and chapter marks of the file. The
//! playlist's declared streams are then reconciled with what the disc's clip
//! info (CLPI) and stream files (M2TS) say about them. Those files are not
//! read by this crate: the caller registers their names, sizes and stream
//! attributes in a [`Catalog`] first.
//!
//! On top of that, the [`classify`] module provides the heuristics that
//! pick out the main feature among a disc's many playlists, and
//! [`ordering`] the orders in which streams and playlists are displayed.
//!
//! The MPLS file format is not officially documented. The parser follows
//! the third-party file specs in the [lw/BluRay] repository and the
//! [bdinfo/mpls] Wikibooks page.
//!
//! [lw/BluRay]: https://github.com/lw/BluRay/wiki/MPLS
//! [bdinfo/mpls]: https://en.wikibooks.org/wiki/User:Bdinfo/mpls
//!
//! # Examples
//! ```no_run
//! # fn main() -> bdplaylist::Result<()> {
//! use bdplaylist::{classify, Catalog, ClassifierPolicy, ClipInfo, Playlist, PlaylistFilter, StreamFile};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_stream_file(StreamFile::new("00055.M2TS", 24_000_000_000));
//! catalog.add_clip_info(ClipInfo::new("00055.CLPI"));
//!
//! let bytes = std::fs::read("BDMV/PLAYLIST/00800.mpls")?;
//! let mut playlists = vec![Playlist::load("00800.MPLS", &bytes, &catalog)?];
//!
//! let filter = PlaylistFilter::default();
//! playlists.retain(|p| p.is_valid(&filter));
//! classify::apply_policy(&mut playlists, &ClassifierPolicy::default());
//! classify::sort_candidates(&mut playlists);
//!
//! for playlist in &playlists {
//!     println!(
//!         "{}: {:.0} s, {} chapters, {:?}",
//!         playlist.name,
//!         playlist.total_length(),
//!         playlist.chapter_count(),
//!         playlist.rank()
//!     );
//! }
//! # Ok(())
//! # }
//! ```
mod parser;

pub mod classify;
pub mod clip;
pub mod config;
pub mod disc;
pub mod error;
pub mod language;
pub mod ordering;
pub mod playlist;
pub mod stream;
pub mod types;

pub use classify::Rank;
pub use clip::StreamClip;
pub use config::{ClassifierPolicy, PlaylistFilter, PlaylistFilterBuilder};
pub use disc::{Catalog, ClipInfo, ClipInfoId, StreamFile, StreamFileId};
pub use error::{Error, Result};
pub use playlist::{Playlist, StreamKey};
pub use stream::{AudioAttributes, Counters, Stream, StreamKind, VideoAttributes};
pub use types::*;
