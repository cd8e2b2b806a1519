//! Integration tests for Ober Core

use ober_core::{
    active_go_to_button,
    mock::{MockEngineFactory, MockMedia},
    normalize, Catalog, ClickOutcome, ClickTarget, GoToButton, Host, Key, KeyFocus, Locale,
    MediaEvent, Phase, PlayerOptions, PlayerSession, PlaylistEntry, TrackSnapshot,
};
use ober_core::tracks::{RawAudioTrack, RawTextTrack, Variant};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn session(media: &MockMedia, engines: &MockEngineFactory) -> PlayerSession {
    PlayerSession::new(Host::new(Arc::new(media.clone()), Arc::new(engines.clone())))
}

async fn setup(entries: Vec<PlaylistEntry>) -> (PlayerSession, MockMedia, MockEngineFactory) {
    let media = MockMedia::new();
    let engines = MockEngineFactory::new();
    let mut s = session(&media, &engines);
    s.setup(PlayerOptions::new(entries)).await.unwrap();
    (s, media, engines)
}

/// Main content playing with a known duration
async fn playing(url: &str, duration: f64) -> (PlayerSession, MockMedia, MockEngineFactory) {
    let (mut s, media, engines) = setup(vec![PlaylistEntry::new(url).with_autoplay(true)]).await;
    media.set_duration(duration);
    s.handle_media_event(&MediaEvent::LoadedMetadata).await.unwrap();
    s.handle_media_event(&MediaEvent::Playing).await.unwrap();
    (s, media, engines)
}

fn phase(s: &PlayerSession) -> Phase {
    s.player().unwrap().phase()
}

// =============================================================================
// Track Normalizer Tests
// =============================================================================

fn sample_snapshot() -> TrackSnapshot {
    let variant = |id: u64, bandwidth: u64, width: u32, height: u32, language: &str| Variant {
        id,
        bandwidth,
        width: Some(width),
        height: Some(height),
        language: language.to_string(),
        ..Default::default()
    };
    let mut active = variant(3, 2_500_000, 1280, 720, "en");
    active.active = true;

    TrackSnapshot {
        variants: vec![
            variant(1, 800_000, 640, 360, "en"),
            variant(2, 5_000_000, 1920, 1080, "en"),
            active,
            variant(4, 5_000_000, 1920, 1080, "fr"),
            variant(5, 2_500_000, 1280, 720, "fr"),
        ],
        audio: vec![
            RawAudioTrack {
                language: "en".to_string(),
                ..Default::default()
            },
            RawAudioTrack {
                language: "fr".to_string(),
                ..Default::default()
            },
        ],
        text: vec![
            RawTextTrack {
                id: 10,
                active: true,
                language: "en".to_string(),
                ..Default::default()
            },
            RawTextTrack {
                id: 11,
                language: "de".to_string(),
                ..Default::default()
            },
        ],
        abr_enabled: false,
    }
}

#[test]
fn test_normalization_is_deterministic() {
    let catalog = Catalog::new(Locale::En);
    let snapshot = sample_snapshot();

    let first = normalize(&snapshot, &catalog);
    let second = normalize(&snapshot.clone(), &catalog);
    assert_eq!(first, second);
}

#[test]
fn test_at_most_one_selected_per_list() {
    let catalog = Catalog::new(Locale::En);
    for abr_enabled in [false, true] {
        let mut snapshot = sample_snapshot();
        snapshot.abr_enabled = abr_enabled;
        let tracks = normalize(&snapshot, &catalog);

        assert!(tracks.video.iter().filter(|t| t.selected).count() <= 1);
        assert!(tracks.audio.iter().filter(|t| t.selected).count() <= 1);
        assert!(tracks.text.iter().filter(|t| t.selected).count() <= 1);
        assert!(tracks.video.iter().filter(|t| t.is_auto()).all(|t| !t.selected));
        assert!(tracks.text.iter().filter(|t| t.is_none()).all(|t| !t.selected));
    }
}

#[test]
fn test_go_to_button_overlap_last_match_wins() {
    let button = |title: &str, from: f64, until: f64| GoToButton {
        title: title.to_string(),
        visible_from: from,
        visible_until: until,
        target_time: until,
    };
    let buttons = vec![button("Intro", 0.0, 60.0), button("Recap", 30.0, 90.0)];

    assert_eq!(active_go_to_button(&buttons, 10.0).map(|b| b.title.as_str()), Some("Intro"));
    assert_eq!(active_go_to_button(&buttons, 45.0).map(|b| b.title.as_str()), Some("Recap"));
    assert_eq!(active_go_to_button(&buttons, 30.0).map(|b| b.title.as_str()), Some("Recap"));
    assert_eq!(active_go_to_button(&buttons, 60.0).map(|b| b.title.as_str()), Some("Recap"));
    assert!(active_go_to_button(&buttons, 95.0).is_none());
}

// =============================================================================
// Session Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_control_before_setup_rejected() {
    let media = MockMedia::new();
    let engines = MockEngineFactory::new();
    let mut s = session(&media, &engines);

    let err = s.load(PlaylistEntry::new("a.mp4")).await.unwrap_err();
    assert_eq!(err.to_string(), "Player has not been setup");
    assert!(engines.script().loads.is_empty());
}

#[test]
fn test_second_setup_rejected() {
    let media = MockMedia::new();
    let engines = MockEngineFactory::new();
    let mut s = session(&media, &engines);
    let options = PlayerOptions::new(vec![PlaylistEntry::new("a.mp4")]);

    tokio_test::block_on(s.setup(options.clone())).unwrap();
    let err = tokio_test::block_on(s.setup(options)).unwrap_err();
    assert_eq!(err.error_code(), "ALREADY_SETUP");
    assert_eq!(engines.script().loads.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_waiting_for_click_then_click_plays() {
    let (mut s, media, _engines) = setup(vec![PlaylistEntry::new("a.mp4").with_autoplay(false)]).await;
    assert_eq!(phase(&s), Phase::WaitingForClick);

    let outcome = s
        .player_mut()
        .unwrap()
        .handle_click(ClickTarget::ClickCatcher)
        .await;
    assert_eq!(outcome, ClickOutcome::ToggleScheduled);

    tokio::time::advance(Duration::from_millis(300)).await;
    s.fire_due_timers().await.unwrap();
    assert_eq!(media.play_calls(), 1);

    s.handle_media_event(&MediaEvent::Playing).await.unwrap();
    assert_eq!(phase(&s), Phase::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_double_click_wins_over_single_click() {
    let (mut s, media, _engines) = setup(vec![PlaylistEntry::new("a.mp4")]).await;
    let player = s.player_mut().unwrap();

    player.handle_click(ClickTarget::ClickCatcher).await;
    tokio::time::advance(Duration::from_millis(150)).await;
    player.handle_click(ClickTarget::ClickCatcher).await;
    player.handle_double_click(ClickTarget::ClickCatcher);

    tokio::time::advance(Duration::from_millis(500)).await;
    s.fire_due_timers().await.unwrap();
    assert_eq!(media.play_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_short_buffering_never_shown() {
    let (mut s, _media, _engines) = playing("a.mp4", 100.0).await;

    s.handle_media_event(&MediaEvent::Waiting).await.unwrap();
    assert_ne!(phase(&s), Phase::Buffering);

    tokio::time::advance(Duration::from_millis(300)).await;
    s.handle_media_event(&MediaEvent::Playing).await.unwrap();

    tokio::time::advance(Duration::from_millis(700)).await;
    s.fire_due_timers().await.unwrap();
    assert!(!s.player().unwrap().playback_state().is_buffering);
    assert_eq!(phase(&s), Phase::Playing);
}

#[tokio::test]
async fn test_arrow_keys_clamp_to_content() {
    let (mut s, media, _engines) = playing("a.mp4", 100.0).await;
    let player = s.player_mut().unwrap();

    media.advance_to(95.0);
    assert!(player.handle_key(&Key::ArrowRight, KeyFocus::widget()).await);
    media.advance_to(5.0);
    assert!(player.handle_key(&Key::ArrowLeft, KeyFocus::widget()).await);

    assert_eq!(media.seeks(), vec![100.0, 0.0]);
}

// =============================================================================
// Ad Break Tests
// =============================================================================

#[tokio::test]
async fn test_ad_round_trip_restores_position() {
    let (mut s, media, engines) = playing("main.m3u8", 100.0).await;
    let ad_plays = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&ad_plays);
    s.on("adplay", move |_| *counter.lock().unwrap() += 1).unwrap();

    media.advance_to(42.0);
    s.start_linear_ad_mode().unwrap();
    assert_eq!(phase(&s), Phase::AdPlaying);

    s.load_ad_video("ad.mp4").await.unwrap();
    s.handle_media_event(&MediaEvent::Playing).await.unwrap();
    s.handle_media_event(&MediaEvent::Ended).await.unwrap();
    s.end_linear_ad_mode().await.unwrap();
    s.handle_media_event(&MediaEvent::CanPlayThrough).await.unwrap();

    assert_eq!(*ad_plays.lock().unwrap(), 1);
    assert_eq!(engines.script().loads, ["main.m3u8", "ad.mp4", "main.m3u8"]);
    assert_eq!(media.seeks(), vec![42.0]);
    assert!(!s.player().unwrap().playback_state().is_ad_player);
}

#[tokio::test]
async fn test_ad_after_end_does_not_resume() {
    let (mut s, media, _engines) = playing("main.m3u8", 100.0).await;

    media.advance_to(100.0);
    s.start_linear_ad_mode().unwrap();
    s.load_ad_video("ad.mp4").await.unwrap();
    s.end_linear_ad_mode().await.unwrap();
    s.handle_media_event(&MediaEvent::CanPlayThrough).await.unwrap();

    assert!(media.seeks().is_empty());
    assert_eq!(phase(&s), Phase::WaitingForClick);
}

// =============================================================================
// Playlist Tests
// =============================================================================

#[tokio::test]
async fn test_post_roll_defers_playlist_advance() {
    let (mut s, _media, engines) = setup(vec![PlaylistEntry::new("a.mp4"), PlaylistEntry::new("b.mp4")]).await;
    let postroll = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&postroll);
    s.on("readyforpostroll", move |_| *counter.lock().unwrap() += 1).unwrap();

    s.schedule_post_roll(true);
    s.handle_media_event(&MediaEvent::Ended).await.unwrap();
    assert_eq!(s.playlist().index(), 0);
    assert_eq!(*postroll.lock().unwrap(), 1);

    s.start_linear_ad_mode().unwrap();
    s.load_ad_video("ad.mp4").await.unwrap();
    s.handle_media_event(&MediaEvent::Ended).await.unwrap();

    assert_eq!(s.playlist().index(), 1);
    assert_eq!(engines.script().loads, ["a.mp4", "ad.mp4", "b.mp4"]);
}

#[tokio::test]
async fn test_explicit_next_skips_post_roll() {
    use ober_core::{BusEvent, PlayerEvent};

    let (mut s, _media, engines) = setup(vec![PlaylistEntry::new("a.mp4"), PlaylistEntry::new("b.mp4")]).await;
    s.schedule_post_roll(true);

    s.trigger(BusEvent::main(PlayerEvent::Next {
        coming_from_click: true,
    }));
    s.process_pending().await.unwrap();

    assert_eq!(s.playlist().index(), 1);
    assert_eq!(engines.script().loads, ["a.mp4", "b.mp4"]);
}
