//! Integration tests for reading, seeking, waits and navigation through a
//! scripted disc.

mod common;

use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bdstream_core::Error;
use bdstream_nav::scripted::{ScriptedDisc, ScriptedProvider};
use bdstream_nav::{BdBuffer, ProcessState, StillDuration, WaitReason, BD_BLOCK_SIZE};
use common::*;
use serde_json::json;

#[test]
fn opens_on_longest_title_with_identity() {
    let session = TestSession::open(three_title_disc());
    let b = &session.buffer;

    assert_eq!(b.num_titles(), 3);
    assert_eq!(b.main_title(), 0);
    assert_eq!(b.current_title(), Some(0));
    assert_eq!(b.current_playlist(), 800);
    assert!(!b.is_hdmv_navigation());
    assert_eq!(
        b.name_and_serial(),
        ("TEST_DISC".to_string(), DISC_ID.to_string())
    );
    assert_eq!(b.num_chapters(), 3);
    assert_eq!(b.num_angles(), 2);
    assert_eq!(b.total_time_of_title(), 600 * 90_000);
}

#[test]
fn read_delivers_title_payload_in_order() {
    let mut session = TestSession::open(three_title_disc());
    let data = session.read_to_end();

    assert_eq!(data.len(), 60000);
    assert_eq!(data, expected_payload(1, 0, 60000));
    assert!(session.handle().is_end_of_title());
    assert_eq!(session.buffer.total_read_position(), 60000);
    assert_eq!(session.buffer.current_time(), 600 * 90_000);
}

#[test]
fn reads_never_exceed_requested_length() {
    let mut session = TestSession::open(three_title_disc());
    let mut buf = vec![0u8; BD_BLOCK_SIZE * 3 + 17];
    let n = session.buffer.read(&mut buf).unwrap();
    assert_eq!(n, buf.len());
    assert_eq!(buf, expected_payload(1, 0, buf.len()));
}

#[test]
fn chapter_tracks_read_position() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.seek(SeekFrom::Start(20000)).unwrap();
    let mut buf = vec![0u8; 100];
    session.buffer.read(&mut buf).unwrap();

    assert_eq!(session.buffer.current_chapter(), 1);
    assert_eq!(session.buffer.chapter_start_time(1), Some(200 * 90_000));
    let frame = session.buffer.chapter_start_frame(1).unwrap();
    assert_eq!(frame, (200.0 * 24000.0 / 1001.0_f64).round() as u64);
}

#[test]
fn title_info_is_cached_by_identity() {
    let mut session = TestSession::open(three_title_disc());
    let first = session.buffer.get_title_info(1).unwrap();
    let second = session.buffer.get_title_info(1).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let playlist = session.buffer.get_playlist_info(802).unwrap();
    assert!(Arc::ptr_eq(
        &playlist,
        &session.buffer.get_playlist_info(802).unwrap()
    ));

    assert!(matches!(
        session.buffer.get_title_info(3),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        session.buffer.get_playlist_info(12345),
        Err(Error::NotFound { .. })
    ));
    assert_eq!(session.buffer.title_duration(7), 0);
    assert_eq!(session.buffer.title_duration(1), 60 * 90_000);

    session.buffer.close();
    assert!(matches!(
        session.buffer.get_title_info(1),
        Err(Error::Closed)
    ));
}

#[test]
fn title_changed_fires_once_per_switch() {
    let mut session = TestSession::open(three_title_disc());
    let handle = session.handle();

    assert!(handle.title_changed());
    assert!(!handle.title_changed());

    session.buffer.switch_title(1).unwrap();
    assert!(handle.title_changed());
    assert!(!handle.title_changed());
    assert_eq!(handle.current_title(), Some(1));
    assert_eq!(handle.current_chapter(), 0);
    assert_eq!(handle.current_time(), 0);

    // Two switches between polls collapse into one notification.
    session.buffer.switch_title(0).unwrap();
    session.buffer.switch_title(1).unwrap();
    assert!(handle.title_changed());
    assert!(!handle.title_changed());
}

#[test]
fn switch_title_out_of_range_leaves_state() {
    let mut session = TestSession::open(three_title_disc());
    let err = session.buffer.switch_title(5).unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(session.buffer.current_title(), Some(0));
}

#[test]
fn switch_angle_validates_range() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.switch_angle(1).unwrap();
    assert_eq!(session.buffer.current_angle(), 1);

    assert!(matches!(
        session.buffer.switch_angle(2),
        Err(Error::NotFound { .. })
    ));
    assert_eq!(session.buffer.current_angle(), 1);
}

#[test]
fn switch_playlist_selects_matching_title() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.switch_playlist(801).unwrap();
    assert_eq!(session.buffer.current_title(), Some(1));
    assert_eq!(session.buffer.current_playlist(), 801);

    assert!(matches!(
        session.buffer.switch_playlist(4242),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn seek_then_read_starts_at_target() {
    let mut session = TestSession::open(three_title_disc());
    let mut buf = vec![0u8; 1000];
    session.buffer.read(&mut buf).unwrap();

    let pos = session.buffer.seek(SeekFrom::Start(30000)).unwrap();
    assert_eq!(pos, 30000);
    assert_eq!(session.buffer.process_state(), ProcessState::Normal);

    let n = session.buffer.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], expected_payload(1, 30000, n).as_slice());
    assert_eq!(session.buffer.read_position(), 30000 + n as u64);

    let pos = session.buffer.seek(SeekFrom::Current(-1000)).unwrap();
    assert_eq!(pos, 30000 + n as u64 - 1000);
    let pos = session.buffer.seek(SeekFrom::End(-100)).unwrap();
    assert_eq!(pos, 59900);
}

#[test]
fn seek_out_of_range_fails() {
    let mut session = TestSession::open(three_title_disc());
    assert!(matches!(
        session.buffer.seek(SeekFrom::Start(60001)),
        Err(Error::Seek(_))
    ));
    assert!(matches!(
        session.buffer.seek(SeekFrom::Current(-1)),
        Err(Error::Seek(_))
    ));
    assert!(session.buffer.seek(SeekFrom::End(0)).is_ok());
}

#[test]
fn seek_chapter_lands_on_chapter_start() {
    let mut session = TestSession::open(three_title_disc());
    assert_eq!(session.buffer.seek_chapter(1).unwrap(), 20000);
    assert_eq!(session.buffer.current_chapter(), 1);
    assert_eq!(session.buffer.read_position(), 20000);

    let mut buf = vec![0u8; 512];
    let n = session.buffer.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], expected_payload(1, 20000, n).as_slice());

    assert!(matches!(
        session.buffer.seek_chapter(3),
        Err(Error::NotFound { .. })
    ));
    assert_eq!(session.buffer.current_chapter(), 1);
}

#[test]
fn infinite_still_blocks_until_skipped() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.switch_title(2).unwrap();
    let handle = session.handle();

    let saw_still = Arc::new(AtomicBool::new(false));
    let skipper = {
        let handle = handle.clone();
        let saw_still = Arc::clone(&saw_still);
        thread::spawn(move || {
            if wait_until(Duration::from_secs(5), || handle.is_in_still_frame()) {
                saw_still.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                assert!(handle.is_reading_blocked());
                assert_eq!(
                    handle.wait_reason(),
                    Some(WaitReason::StillFrame(StillDuration::Infinite))
                );
                handle.skip_wait();
            }
        })
    };

    let mut buf = vec![0u8; BD_BLOCK_SIZE];
    let n = session.buffer.read(&mut buf).unwrap();
    skipper.join().unwrap();

    assert!(saw_still.load(Ordering::SeqCst));
    assert!(!handle.is_in_still_frame());
    assert_eq!(handle.wait_reason(), None);
    assert_eq!(n, BD_BLOCK_SIZE);
    assert_eq!(buf, expected_payload(99, 0, BD_BLOCK_SIZE));
}

#[test]
fn finite_still_releases_after_duration() {
    let mut disc = three_title_disc();
    disc.titles[1].still = serde_json::from_value(json!({"at": 6144, "seconds": 1})).unwrap();
    let mut session = TestSession::open(disc);
    session.buffer.switch_title(1).unwrap();

    let started = Instant::now();
    let data = session.read_to_end();
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(data, expected_payload(50, 0, 12288));
}

#[test]
fn close_from_handle_wakes_blocked_reader() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.switch_title(2).unwrap();
    let handle = session.handle();

    let closer = thread::spawn(move || {
        wait_until(Duration::from_secs(5), || handle.is_in_still_frame());
        handle.close();
    });

    let mut buf = vec![0u8; BD_BLOCK_SIZE];
    let err = session.buffer.read(&mut buf).unwrap_err();
    closer.join().unwrap();

    assert!(matches!(err, Error::Closed));
    assert!(!session.buffer.is_open());
    assert!(matches!(session.buffer.read(&mut buf), Err(Error::Closed)));
}

#[test]
fn single_read_fault_is_retried() {
    let mut disc = three_title_disc();
    disc.titles[1].faults = serde_json::from_value(json!([{"at": 6144, "count": 1}])).unwrap();
    let mut session = TestSession::open(disc);
    session.buffer.switch_title(1).unwrap();

    let data = session.read_to_end();
    assert_eq!(data, expected_payload(50, 0, 12288));
    assert!(session.handle().last_error().unwrap().contains("fault"));
}

#[test]
fn repeated_read_fault_is_fatal() {
    let mut disc = three_title_disc();
    disc.titles[1].faults = serde_json::from_value(json!([{"at": 0, "count": 2}])).unwrap();
    let mut session = TestSession::open(disc);
    session.buffer.switch_title(1).unwrap();

    let mut buf = vec![0u8; 4096];
    let err = session.buffer.read(&mut buf).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.is_fatal());

    // The engine would succeed now, but the session stays failed.
    assert!(matches!(session.buffer.read(&mut buf), Err(Error::Io(_))));
}

#[test]
fn navigation_error_after_still_rereads_without_duplicates() {
    for still_at in [0, 6144] {
        let mut disc = three_title_disc();
        disc.titles[1].still = serde_json::from_value(json!({
            "at": still_at,
            "seconds": 1,
            "error_on_release": true
        }))
        .unwrap();
        let mut session = TestSession::open(disc);
        session.buffer.switch_title(1).unwrap();

        // The wait stashes everything read before the still; the error on
        // release must re-read it exactly once.
        let data = session.read_to_end();
        assert_eq!(data.len(), 12288, "still at {still_at}");
        assert_eq!(data, expected_payload(50, 0, 12288));
        assert_eq!(session.buffer.total_read_position(), 12288);
        assert!(session
            .handle()
            .last_error()
            .unwrap()
            .contains("still release"));
    }
}

#[test]
fn refused_seek_back_after_fault_is_fatal() {
    let mut disc = three_title_disc();
    disc.titles[1].faults = serde_json::from_value(json!([{"at": 6144, "count": 1}])).unwrap();
    disc.titles[1].refuse_seeks = true;
    let mut session = TestSession::open(disc);
    session.buffer.switch_title(1).unwrap();

    let mut buf = vec![0u8; 12288];
    let err = session.buffer.read(&mut buf).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
    assert!(err.to_string().contains("seek back"));
    assert_eq!(session.buffer.total_read_position(), 0);

    assert!(matches!(session.buffer.read(&mut buf), Err(Error::Io(_))));
}

#[test]
fn player_drain_waits_are_honoured_when_enabled() {
    let mut disc = three_title_disc();
    disc.titles[1].playitem_boundaries = vec![6144];
    let mut config = test_config();
    config.navigation.ignore_wait_states = false;
    let mut session = TestSession::open_with(disc, config);

    let handle = session.handle();
    let done = Arc::new(AtomicBool::new(false));
    let skips = Arc::new(AtomicU32::new(0));
    let skipper = {
        let (handle, done, skips) = (handle.clone(), Arc::clone(&done), Arc::clone(&skips));
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                if handle.waiting_for_player() {
                    skips.fetch_add(1, Ordering::SeqCst);
                    handle.skip_wait();
                }
                thread::sleep(Duration::from_millis(2));
            }
        })
    };

    session.buffer.switch_title(1).unwrap();
    let data = session.read_to_end();
    done.store(true, Ordering::SeqCst);
    skipper.join().unwrap();

    assert_eq!(data, expected_payload(50, 0, 12288));
    // One wait at playlist start, one at the play-item boundary.
    assert!(skips.load(Ordering::SeqCst) >= 2);
}

#[test]
fn ignore_wait_states_releases_player_drain() {
    let mut config = test_config();
    config.navigation.ignore_wait_states = false;
    let mut session = TestSession::open_with(three_title_disc(), config);
    assert!(session.handle().waiting_for_player());

    session.buffer.ignore_wait_states(true);
    assert!(!session.handle().is_reading_blocked());
    let mut buf = vec![0u8; 10];
    assert_eq!(session.buffer.read(&mut buf).unwrap(), 10);
}

#[test]
fn start_from_beginning_rewinds_after_still() {
    let mut session = TestSession::open(three_title_disc());
    session.buffer.switch_title(2).unwrap();

    let handle = session.handle();
    let reader = thread::spawn(move || {
        let mut buf = vec![0u8; 16];
        let n = session.buffer.read(&mut buf).unwrap();
        (session, n)
    });
    assert!(wait_until(Duration::from_secs(5), || handle.is_in_still_frame()));
    handle.skip_wait();
    let (mut session, n) = reader.join().unwrap();
    assert_eq!(n, 16);
    assert_eq!(session.buffer.read_position(), 16);

    session.buffer.start_from_beginning().unwrap();
    assert_eq!(session.buffer.read_position(), 0);
    assert_eq!(session.buffer.process_state(), ProcessState::Normal);
}

#[test]
fn unblock_reading_clears_wait() {
    let mut config = test_config();
    config.navigation.ignore_wait_states = false;
    let mut session = TestSession::open_with(three_title_disc(), config);
    assert_eq!(session.buffer.process_state(), ProcessState::Wait);

    session.buffer.unblock_reading();
    assert_eq!(session.buffer.process_state(), ProcessState::Normal);
    assert!(!session.handle().waiting_for_player());
}

#[test]
fn stream_metadata_lookups() {
    let session = TestSession::open(three_title_disc());
    let b = &session.buffer;

    assert_eq!(b.audio_language(4353).as_deref(), Some("deu"));
    assert_eq!(b.subtitle_language(4608).as_deref(), Some("fra"));
    assert!(b.audio_language(4608).is_none());
    assert!(b.is_valid_stream(4113));
    assert!(!b.is_valid_stream(1));
    let fps = b.frame_rate().unwrap();
    assert!((fps - 23.976).abs() < 0.001);
}

#[test]
fn timestamps_adjust_by_discontinuity() {
    let mut session = TestSession::open(three_title_disc());
    assert_eq!(session.buffer.adjust_timestamp(500), 500);

    session.buffer.switch_title(1).unwrap();
    assert_eq!(session.buffer.adjust_timestamp(180_000), 90_000);
    assert_eq!(session.buffer.adjust_timestamp(1_000), 1_000);
}

#[test]
fn stream_selection_is_tracked() {
    use bdstream_core::StreamKind;

    let mut session = TestSession::open(three_title_disc());
    session
        .buffer
        .select_stream(StreamKind::Subtitle, 2, true)
        .unwrap();
    let streams = session.handle().streams();
    assert_eq!(streams.subtitle, 2);
    assert!(streams.subtitle_enabled);
}

#[test]
fn describe_position_reports_title_and_chapter() {
    let session = TestSession::open(three_title_disc());
    assert_eq!(
        session.buffer.describe_position(),
        "Title 1/3, chapter 1/3 (0:00:00 / 0:10:00)"
    );
}

// ---------------------------------------------------------------------------
// Open
// ---------------------------------------------------------------------------

#[test]
fn open_retries_transient_failures() {
    let provider = ScriptedProvider::new(three_title_disc()).with_not_ready_attempts(2);
    let buffer = BdBuffer::open("disc", 3, &provider, test_config()).unwrap();
    assert_eq!(provider.open_attempts(), 3);
    assert_eq!(buffer.num_titles(), 3);
}

#[test]
fn open_gives_up_after_retry_budget() {
    let provider = ScriptedProvider::new(three_title_disc()).with_not_ready_attempts(5);
    let err = BdBuffer::open("disc", 1, &provider, test_config())
        .err()
        .unwrap();
    assert!(matches!(err, Error::Open { .. }));
    assert_eq!(provider.open_attempts(), 2);
}

#[test]
fn open_rejects_unusable_discs() {
    let mut not_bluray = three_title_disc();
    not_bluray.bluray = false;
    let mut encrypted = three_title_disc();
    encrypted.encryption.aacs = true;
    let mut empty = three_title_disc();
    empty.titles.clear();

    for disc in [not_bluray, encrypted, empty] {
        let provider = ScriptedProvider::new(disc);
        let result = BdBuffer::open("disc", 0, &provider, test_config());
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}

#[test]
fn open_applies_player_settings() {
    use bdstream_nav::scripted::EngineInput;
    use bdstream_nav::PlayerSetting;

    let mut config = test_config();
    config.player.region = "B".into();
    config.player.audio_language = "jpn".into();
    let provider = ScriptedProvider::new(three_title_disc());
    let _buffer = BdBuffer::open("disc", 0, &provider, config).unwrap();

    let inputs = provider.inputs();
    assert!(inputs.contains(&EngineInput::Setting(PlayerSetting::Region(2))));
    assert!(inputs.contains(&EngineInput::Setting(PlayerSetting::AudioLanguage(
        "jpn".into()
    ))));
}

#[test]
fn declared_main_title_wins() {
    let mut disc = three_title_disc();
    disc.main_title = Some(1);
    let session = TestSession::open(disc);
    assert_eq!(session.buffer.main_title(), 1);
    assert_eq!(session.buffer.current_title(), Some(1));
}

#[test]
fn short_titles_fall_back_to_first() {
    let mut config = test_config();
    config.navigation.min_title_length_secs = 3600;
    let session = TestSession::open_with(three_title_disc(), config);
    assert_eq!(session.buffer.main_title(), 0);
}

#[test]
fn identity_falls_back_to_volume_and_index_digest() {
    use sha2::{Digest, Sha256};

    let mut disc: ScriptedDisc = two_title_disc();
    disc.name = None;
    disc.volume_id = Some("VOLUME_ONE".into());
    disc.index_bdmv = Some("INDX0200".into());
    let session = TestSession::open(disc);

    let (name, serial) = session.buffer.name_and_serial();
    assert_eq!(name, "VOLUME_ONE");
    let digest = hex::encode(Sha256::digest(b"INDX0200"));
    assert_eq!(serial, &digest[..40]);

    let mut bare = two_title_disc();
    bare.name = None;
    let session = TestSession::open(bare);
    assert_eq!(
        session.buffer.name_and_serial(),
        ("test-disc".to_string(), String::new())
    );
}
