mod common;

use std::io::Cursor;

use bdplaylist::{
    classify, Catalog, ClassifierPolicy, ClipInfo, Error, Playlist, PlaylistFilter,
    PlaylistVersion, Rank, StreamFile, StreamKey, StreamType,
};
use common::{catalog_with, stream, ticks, Item, MplsBuilder, StreamEntry};

fn movie_streams() -> Vec<bdplaylist::Stream> {
    let mut video = stream(0x1011, StreamType::AvcVideo);
    video.video_mut().unwrap().height = 1080;
    let mut audio = stream(0x1100, StreamType::Ac3Audio);
    audio.audio_mut().unwrap().channel_count = 6;
    audio.set_language("eng");
    let mut graphics = stream(0x1200, StreamType::PresentationGraphics);
    graphics.set_language("eng");
    vec![video, audio, graphics]
}

fn movie_item(clip: &str, in_time: u32, out_time: u32) -> Item {
    Item::new(clip, in_time, out_time)
        .stream(StreamEntry::video(0x1011, 0x1B))
        .stream(StreamEntry::audio(0x1100, 0x81, "eng"))
        .stream(StreamEntry::graphics(0x1200, "eng"))
}

#[test]
fn single_clip_with_chapters() {
    let catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(10), ticks(110)))
        .chapter(0, ticks(10))
        .chapter(0, ticks(40))
        .build();

    let playlist = Playlist::load("00800.mpls", &bytes, &catalog).unwrap();

    assert_eq!(playlist.name, "00800.MPLS");
    assert_eq!(playlist.version, Some(PlaylistVersion::V0200));
    assert!(playlist.is_initialized);
    assert_eq!(playlist.clips.len(), 1);
    assert_eq!(playlist.total_length(), 100.0);
    assert_eq!(playlist.chapters, vec![0.0, 30.0]);
    assert_eq!(playlist.chapter_count(), 2);
    assert_eq!(playlist.clips[0].chapters, vec![10.0, 40.0]);
    assert_eq!(playlist.clips[0].file_size, 1_000_000);
    assert_eq!(playlist.file_size(), 1_000_000);

    assert_eq!(playlist.video_pids, vec![0x1011]);
    assert_eq!(playlist.audio_pids, vec![0x1100]);
    assert_eq!(playlist.graphics_pids, vec![0x1200]);
    assert!(playlist.text_pids.is_empty());
    assert_eq!(playlist.hidden_track_count, 0);
    assert_eq!(playlist.playlist_streams.len(), 3);
    assert_eq!(playlist.sorted_streams().count(), 3);
    assert!(!playlist.has_loops);
}

#[test]
fn chapter_thirty_seconds_in() {
    let catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", 0, 4_500_000))
        .chapter(0, 1_350_000)
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert_eq!(playlist.clips.len(), 1);
    assert_eq!(playlist.clips[0].length, 100.0);
    assert_eq!(playlist.clips[0].relative_time_in, 0.0);
    assert_eq!(playlist.chapters, vec![30.0]);
}

#[test]
fn clips_are_contiguous() {
    let names = ["00001", "00002", "00003"];
    let catalog = catalog_with(&names, &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(30)))
        .item(movie_item("00002", ticks(100), ticks(145)))
        .item(movie_item("00003", ticks(5), ticks(30)))
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    let timeline: Vec<(f64, f64)> = playlist
        .clips
        .iter()
        .map(|c| (c.relative_time_in, c.relative_time_out))
        .collect();
    assert_eq!(timeline, vec![(0.0, 30.0), (30.0, 75.0), (75.0, 100.0)]);
    assert_eq!(playlist.total_length(), 100.0);
    assert_eq!(playlist.file_size(), 6_000_000);
}

#[test]
fn multi_angle_item() {
    let names = ["00001", "00002", "00003", "00004"];
    let catalog = catalog_with(&names, &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)).angles(&["00002", "00003"]))
        .item(movie_item("00004", ticks(0), ticks(30)))
        .build();

    let playlist = Playlist::load("00002.MPLS", &bytes, &catalog).unwrap();

    assert_eq!(playlist.angle_count, 2);
    let angles: Vec<u8> = playlist.clips.iter().map(|c| c.angle_index).collect();
    assert_eq!(angles, vec![0, 1, 2, 0]);
    assert_eq!(playlist.clips[2].relative_time_in, 0.0);
    assert_eq!(playlist.clips[3].relative_time_in, 60.0);
    assert_eq!(playlist.total_length(), 90.0);
    assert_eq!(playlist.total_angle_length(), 210.0);
    assert_eq!(playlist.angle_clips, vec![vec![1, 3], vec![2, 3]]);

    let segments: Vec<&str> = playlist
        .angle_segments(1)
        .iter()
        .map(|c| c.base_name())
        .collect();
    assert_eq!(segments, vec!["00002", "00004"]);

    // one video copy per alternate angle, right after the base copy
    assert_eq!(playlist.angle_streams.len(), 2);
    assert_eq!(
        &playlist.sorted_keys[..3],
        &[
            StreamKey::base(0x1011),
            StreamKey { pid: 0x1011, angle_index: 1 },
            StreamKey { pid: 0x1011, angle_index: 2 },
        ]
    );
    let copy = playlist
        .stream(StreamKey { pid: 0x1011, angle_index: 2 })
        .unwrap();
    assert_eq!(copy.angle_index, 2);
    assert_eq!(copy.height(), 1080);
    assert!(playlist.angle_streams[0].get(&0x1100).is_none());
    assert_eq!(playlist.sorted_streams().count(), 5);
}

#[test]
fn malformed_input() {
    let catalog = Catalog::new();

    let bytes = MplsBuilder::new().magic(b"MPLS0300").build();
    let err = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap_err();
    assert!(matches!(err, Error::MalformedPlaylist { ref playlist, .. } if playlist == "00001.MPLS"));

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(30)))
        .build();
    let truncated = &bytes[..bytes.len() - 20];
    let err = Playlist::load("00001.MPLS", truncated, &catalog).unwrap_err();
    assert!(matches!(err, Error::MalformedPlaylist { .. }));

    let err = Playlist::load("00001.MPLS", b"MPLS", &catalog).unwrap_err();
    assert!(matches!(err, Error::MalformedPlaylist { .. }));
}

#[test]
fn missing_clip_info_is_an_error() {
    let mut catalog = Catalog::new();
    catalog.add_stream_file(StreamFile::new("00009.M2TS", 10));
    let bytes = MplsBuilder::new()
        .item(movie_item("00009", ticks(0), ticks(30)))
        .build();

    match Playlist::load("00001.MPLS", &bytes, &catalog) {
        Err(Error::MissingClipInfo { playlist, file }) => {
            assert_eq!(playlist, "00001.MPLS");
            assert_eq!(file, "00009.CLPI");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn missing_stream_file_is_tolerated() {
    let mut catalog = Catalog::new();
    let mut info = ClipInfo::new("00009.clpi");
    for s in movie_streams() {
        info.insert_stream(s);
    }
    catalog.add_clip_info(info);
    let bytes = MplsBuilder::new()
        .item(movie_item("00009", ticks(0), ticks(30)))
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert_eq!(playlist.clips[0].stream_file(), None);
    assert_eq!(playlist.clips[0].file_size, 0);
    assert_eq!(playlist.streams.len(), 3);
}

#[test]
fn missing_angle_file_is_an_error() {
    let catalog = catalog_with(&["00001", "00002"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)).angles(&["00002", "00003"]))
        .build();

    match Playlist::load("00001.MPLS", &bytes, &catalog) {
        Err(Error::MissingAngleFile { file, .. }) => assert_eq!(file, "00003.M2TS"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn chapter_filtering() {
    let catalog = catalog_with(&["00001", "00002"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(50)))
        .item(movie_item("00002", ticks(20), ticks(70)))
        // out of file order, sorted on decode
        .chapter(1, ticks(30))
        .chapter(0, ticks(0))
        // link point marks are not chapters
        .mark(2, 0, ticks(10))
        // no such play item
        .chapter(7, ticks(0))
        // two seconds before the end
        .chapter(1, ticks(68))
        // one second before the end
        .chapter(1, ticks(69))
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert_eq!(playlist.chapters, vec![0.0, 60.0, 98.0]);
    assert!(playlist.chapters.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(playlist.clips[1].chapters, vec![30.0, 68.0]);
}

#[test]
fn in_time_sign_bit_is_ignored() {
    let catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", 0x8000_0000 | ticks(10), ticks(60)))
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert_eq!(playlist.clips[0].time_in, 10.0);
    assert_eq!(playlist.total_length(), 50.0);
}

#[test]
fn undeclared_streams_are_hidden() {
    let mut streams = movie_streams();
    let mut commentary = stream(0x1101, StreamType::Ac3Audio);
    commentary.audio_mut().unwrap().channel_count = 2;
    commentary.set_language("eng");
    streams.push(commentary);
    let catalog = catalog_with(&["00001"], &streams);

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)))
        .build();
    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    assert_eq!(playlist.hidden_track_count, 1);
    assert!(playlist.streams[&0x1101].is_hidden);
    assert!(!playlist.streams[&0x1100].is_hidden);
    assert_eq!(playlist.audio_pids, vec![0x1100, 0x1101]);

    let custom = Playlist::custom("CUSTOM", playlist.clips.clone(), &catalog);
    assert_eq!(custom.hidden_track_count, 0);
    assert!(custom.streams.values().all(|s| !s.is_hidden));
}

#[test]
fn stream_file_attributes_refine_clip_info() {
    let mut catalog = catalog_with(&["00001"], &movie_streams());
    let id = catalog.find_stream_file("00001.M2TS").unwrap();
    {
        let file = catalog.stream_file_mut(id);
        let mut audio = stream(0x1100, StreamType::Ac3Audio);
        let attrs = audio.audio_mut().unwrap();
        attrs.channel_count = 8;
        attrs.dial_norm = -27;
        audio.bit_rate = 640_000;
        file.insert_stream(audio);

        // declared as PG by the clip info, found as something else
        file.insert_stream(stream(0x1200, StreamType::InteractiveGraphics));
    }

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)))
        .build();
    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    let audio = &playlist.streams[&0x1100];
    assert_eq!(audio.channel_count(), 8);
    assert_eq!(audio.audio().unwrap().dial_norm, -27);
    assert_eq!(audio.bit_rate, 640_000);
    assert_eq!(audio.language(), "eng");

    let graphics = &playlist.streams[&0x1200];
    assert_eq!(graphics.stream_type(), StreamType::PresentationGraphics);
    assert_eq!(graphics.language(), "eng");
}

fn add_clip(catalog: &mut Catalog, clip: &str, streams: Vec<bdplaylist::Stream>) {
    catalog.add_stream_file(StreamFile::new(&format!("{}.M2TS", clip), 1_000));
    let mut info = ClipInfo::new(&format!("{}.CLPI", clip));
    for s in streams {
        info.insert_stream(s);
    }
    catalog.add_clip_info(info);
}

#[test]
fn richest_clip_info_seeds_streams() {
    let mut catalog = Catalog::new();
    add_clip(&mut catalog, "00001", vec![stream(0x1011, StreamType::AvcVideo)]);
    let mut extra = stream(0x1101, StreamType::Ac3Audio);
    extra.set_language("fra");
    add_clip(
        &mut catalog,
        "00002",
        vec![
            stream(0x1011, StreamType::AvcVideo),
            stream(0x1100, StreamType::Ac3Audio),
            extra,
        ],
    );

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(100)))
        .item(movie_item("00002", ticks(0), ticks(10)))
        .build();
    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    assert_eq!(playlist.reference_clip(&catalog).unwrap().name, "00002.M2TS");
    let pids: Vec<u16> = playlist.streams.keys().copied().collect();
    assert_eq!(pids, vec![0x1011, 0x1100, 0x1101]);
    assert_eq!(playlist.hidden_track_count, 1);
    assert!(playlist.streams[&0x1101].is_hidden);
}

#[test]
fn longer_clip_wins_a_tie() {
    let sd = |height| {
        let mut video = stream(0x1011, StreamType::AvcVideo);
        video.video_mut().unwrap().height = height;
        vec![video]
    };
    let mut catalog = Catalog::new();
    add_clip(&mut catalog, "00001", sd(720));
    add_clip(&mut catalog, "00002", sd(1080));

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(30)))
        .item(movie_item("00002", ticks(0), ticks(90)))
        .build();
    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    assert_eq!(playlist.reference_clip(&catalog).unwrap().name, "00002.M2TS");
    assert_eq!(playlist.streams[&0x1011].height(), 1080);
}

#[test]
fn reconcile_is_idempotent() {
    let names = ["00001", "00002", "00003"];
    let mut catalog = catalog_with(&names, &movie_streams());
    let id = catalog.find_stream_file("00001.M2TS").unwrap();
    {
        let file = catalog.stream_file_mut(id);
        let mut video = stream(0x1011, StreamType::AvcVideo);
        video.video_mut().unwrap().encoding_profile = "High 4.1".into();
        file.insert_stream(video);

        let mut audio = stream(0x1100, StreamType::Ac3TrueHdAudio);
        audio.is_vbr = true;
        audio.bit_rate = 3_000_000;
        let attrs = audio.audio_mut().unwrap();
        attrs.channel_count = 8;
        attrs.dial_norm = -31;
        attrs.core = Some(Box::new(stream(0x1100, StreamType::Ac3Audio)));
        file.insert_stream(audio);
    }
    // the clip info declares the same PID as TrueHD
    let mut info = ClipInfo::new("00001.CLPI");
    for mut s in movie_streams() {
        if s.pid() == 0x1100 {
            s = stream(0x1100, StreamType::Ac3TrueHdAudio);
            let attrs = s.audio_mut().unwrap();
            attrs.channel_count = 6;
            attrs.language = "eng".into();
        }
        info.insert_stream(s);
    }
    catalog.add_clip_info(info);

    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)).angles(&["00002"]))
        .item(movie_item("00003", ticks(0), ticks(30)))
        .build();

    let mut playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    let once = playlist.clone();
    let audio = &once.streams[&0x1100];
    assert_eq!(audio.channel_count(), 8);
    assert_eq!(audio.audio().unwrap().dial_norm, -31);
    assert_eq!(audio.bit_rate, 3_000_000);
    assert!(audio.is_vbr);
    assert!(audio.audio().unwrap().core.is_some());
    assert_eq!(once.streams[&0x1011].video().unwrap().encoding_profile, "High 4.1");

    playlist.reconcile(&catalog);
    playlist.reconcile(&catalog);
    assert_eq!(playlist.streams, once.streams);
    assert_eq!(playlist, once);
}

#[test]
fn unsupported_entries_are_skipped() {
    let catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(
            movie_item("00001", ticks(0), ticks(60))
                .stream(StreamEntry::video(0x1012, 0x20))
                .stream(StreamEntry::subtitle(0x1800, "fra")),
        )
        .build();

    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert!(!playlist.playlist_streams.contains_key(&0x1012));
    assert_eq!(playlist.playlist_streams[&0x1800].language(), "fra");
}

#[test]
fn from_reader_matches_load() {
    let catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)))
        .chapter(0, ticks(0))
        .build();

    let loaded = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    let read = Playlist::from_reader("00001.MPLS", Cursor::new(bytes), &catalog).unwrap();
    assert_eq!(read, loaded);
}

#[test]
fn bit_rate_accumulation() {
    let mut catalog = catalog_with(&["00001"], &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(10)))
        .build();
    let mut playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();
    assert_eq!(playlist.total_size(), 0);

    let id = playlist.clips[0].stream_file().unwrap();
    {
        let file = catalog.stream_file_mut(id);
        let mut video = stream(0x1011, StreamType::AvcVideo);
        video.counters.add(10_000_000, 60_000, 10.0);
        file.insert_stream(video);
    }
    playlist.absorb_stream_file(id, catalog.stream_file(id));

    assert_eq!(playlist.clips[0].counters.packet_count, 60_000);
    assert_eq!(playlist.total_size(), 60_000 * 192);
    assert_eq!(playlist.total_bit_rate(), 60_000 * 192 * 8 / 10);
    assert_eq!(playlist.streams[&0x1011].bit_rate, 8_000_000);

    playlist.clear_bitrates(&mut catalog);
    assert_eq!(playlist.total_size(), 0);
    assert_eq!(playlist.streams[&0x1011].counters.packet_count, 0);
    assert_eq!(catalog.stream_file(id).total_counters().packet_count, 0);
    // the last computed rate survives a reset of the accumulators
    assert_eq!(playlist.streams[&0x1011].bit_rate, 8_000_000);
}

#[test]
fn disc_classification() {
    let names = ["00001", "00002", "00003"];
    let catalog = catalog_with(&names, &movie_streams());
    let feature = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(3600)))
        .item(movie_item("00002", ticks(0), ticks(1800)))
        .build();
    let trailer = MplsBuilder::new()
        .item(movie_item("00003", ticks(0), ticks(90)))
        .build();
    let looping = MplsBuilder::new()
        .item(movie_item("00003", ticks(0), ticks(90)))
        .item(movie_item("00003", ticks(0), ticks(90)))
        .build();

    let mut playlists = vec![
        Playlist::load("00802.MPLS", &trailer, &catalog).unwrap(),
        Playlist::load("00801.MPLS", &feature, &catalog).unwrap(),
        Playlist::load("00800.MPLS", &feature, &catalog).unwrap(),
        Playlist::load("00803.MPLS", &looping, &catalog).unwrap(),
    ];

    let filter = PlaylistFilter::default();
    playlists.retain(|p| p.is_valid(&filter));
    assert_eq!(playlists.len(), 3);

    classify::apply_policy(&mut playlists, &ClassifierPolicy::default());
    classify::sort_candidates(&mut playlists);

    let order: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(order, vec!["00800.MPLS", "00801.MPLS", "00802.MPLS"]);

    let ranks: Vec<Rank> = playlists.iter().map(|p| p.rank()).collect();
    assert_eq!(
        ranks,
        vec![Rank::MainMovieHq, Rank::BogusFeature, Rank::Short]
    );
    assert!(!playlists[0].is_duplicate);
    assert!(playlists[1].is_duplicate);
    assert!(playlists[1].is_max_quality);
    assert!(!playlists[2].is_max_quality);
}

#[cfg(feature = "serde")]
#[test]
fn playlist_round_trips_through_json() {
    let names = ["00001", "00002"];
    let catalog = catalog_with(&names, &movie_streams());
    let bytes = MplsBuilder::new()
        .item(movie_item("00001", ticks(0), ticks(60)).angles(&["00002"]))
        .chapter(0, ticks(15))
        .build();
    let playlist = Playlist::load("00001.MPLS", &bytes, &catalog).unwrap();

    let json = serde_json::to_string(&playlist).unwrap();
    let back: Playlist = serde_json::from_str(&json).unwrap();
    assert_eq!(back, playlist);
}
