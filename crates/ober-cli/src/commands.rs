//! CLI command implementations

use crate::output::{print_rows, styled_phase, OutputFormat};
use crate::scenario::{Scenario, Step};
use anyhow::Context;
use ober_core::mock::{MockEngineFactory, MockMedia};
use ober_core::{
    normalize, BusEvent, Catalog, EventKind, EventSource, Host, Key, KeyFocus, Locale, MediaEvent, PlayerEvent,
    PlayerSession, TrackSnapshot,
};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tabled::Tabled;
use tracing::{info, warn};

#[derive(Serialize, Tabled)]
struct VideoRow {
    id: String,
    name: String,
    label: String,
    selected: bool,
    hd: bool,
    uhd: bool,
    hdr: bool,
}

#[derive(Serialize, Tabled)]
struct AudioRow {
    id: String,
    label: String,
    language: String,
    role: String,
    selected: bool,
}

#[derive(Serialize, Tabled)]
struct TextRow {
    id: String,
    label: String,
    language: String,
    roles: String,
    selected: bool,
}

/// Normalize a track snapshot
pub fn tracks(path: &Path, lang: &str, format: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: TrackSnapshot = serde_json::from_str(&raw).context("parsing track snapshot")?;
    let catalog = Catalog::new(Locale::from_lang(lang));
    let tracks = normalize(&snapshot, &catalog);

    if matches!(OutputFormat::from(format), OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    let video: Vec<VideoRow> = tracks
        .video
        .iter()
        .map(|t| VideoRow {
            id: t.id.clone(),
            name: t.name.clone(),
            label: t.label.clone(),
            selected: t.selected,
            hd: t.hd,
            uhd: t.uhd,
            hdr: t.hdr,
        })
        .collect();
    let audio: Vec<AudioRow> = tracks
        .audio
        .iter()
        .map(|t| AudioRow {
            id: t.id.clone(),
            label: t.label.clone(),
            language: t.language.clone(),
            role: t.role.clone().unwrap_or_default(),
            selected: t.selected,
        })
        .collect();
    let text: Vec<TextRow> = tracks
        .text
        .iter()
        .map(|t| TextRow {
            id: t.id.clone(),
            label: t.label.clone(),
            language: t.language.clone(),
            roles: t.roles.join(","),
            selected: t.selected,
        })
        .collect();

    print_rows("Video qualities", &video, format)?;
    print_rows("Audio tracks", &audio, format)?;
    print_rows("Text tracks", &text, format)?;
    Ok(())
}

#[derive(Serialize, Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    step: String,
    phase: String,
    state: String,
    position: String,
    events: String,
}

/// Replay a scenario against the in-memory engine
pub async fn simulate(path: &Path, show_events: bool, format: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("parsing scenario")?;
    info!(steps = scenario.steps.len(), "Replaying scenario");

    let media = MockMedia::new();
    let engines = MockEngineFactory::new()
        .with_tracks(scenario.tracks.clone())
        .with_live(scenario.live);
    let mut host = Host::new(Arc::new(media.clone()), Arc::new(engines))
        .with_platform(scenario.platform)
        .with_width(scenario.width);
    if let Some(data) = &scenario.data_options {
        host = host.with_data_options(data.to_string());
    }

    let mut session = PlayerSession::new(host);
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&log);
    session.on("*", move |event| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.name());
    })?;

    session.setup(scenario.options.clone()).await?;
    let mut rows = vec![row(&session, 0, "setup".to_string(), drain(&log, show_events))];

    for (i, step) in scenario.steps.iter().enumerate() {
        if let Err(e) = run_step(&mut session, &media, step).await {
            warn!(step = i + 1, error = %e, "Step failed");
        }
        rows.push(row(&session, i + 1, step.label(), drain(&log, show_events)));
    }

    let state = session.player().ok().map(|player| player.playback_state().clone());
    session.destroy().await?;

    if matches!(OutputFormat::from(format), OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "steps": rows, "state": state }))?
        );
        return Ok(());
    }

    print_rows("Scenario", &rows, format)?;
    if let Some(state) = state {
        println!("\nFinal phase: {}", styled_phase(state.phase()));
        if let Some(message) = &state.message {
            println!("Message: {}", message.text);
        }
    }
    Ok(())
}

async fn run_step(session: &mut PlayerSession, media: &MockMedia, step: &Step) -> anyhow::Result<()> {
    match step {
        Step::Media { event } => session.handle_media_event(event).await?,
        Step::Duration { seconds } => media.set_duration(*seconds),
        Step::Position { seconds } => {
            media.advance_to(*seconds);
            session.handle_media_event(&MediaEvent::TimeUpdate).await?;
        }
        Step::Click { target } => {
            session.player_mut()?.handle_click(*target).await;
        }
        Step::DoubleClick { target } => {
            session.player_mut()?.handle_double_click(*target);
        }
        Step::Key { key } => {
            session
                .player_mut()?
                .handle_key(&Key::from_dom(key), KeyFocus::widget())
                .await;
        }
        Step::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            session.fire_due_timers().await?;
        }
        Step::Play => session.player_mut()?.play().await?,
        Step::Pause => session.player_mut()?.pause(),
        Step::Seek { seconds } => session.player_mut()?.seek(*seconds),
        Step::Volume { volume } => session.player_mut()?.set_volume(*volume),
        Step::Resize { width } => session.player_mut()?.resize(*width),
        Step::VideoTrack { id } => session.player_mut()?.set_video_track(id),
        Step::PostRoll { pending } => session.schedule_post_roll(*pending),
        Step::StartAd => session.start_linear_ad_mode()?,
        Step::LoadAd { url } => {
            session.load_ad_video(url).await?;
        }
        Step::EndAd => session.end_linear_ad_mode().await?,
        Step::Next => session.trigger(BusEvent::main(PlayerEvent::Next {
            coming_from_click: true,
        })),
        Step::Previous => session.trigger(BusEvent::main(PlayerEvent::Previous {
            coming_from_click: true,
        })),
        Step::AcceptAge => session.player_mut()?.accept_age_restriction().await?,
        Step::DeclineAge => session.player_mut()?.decline_age_restriction(),
    }
    session.process_pending().await?;
    Ok(())
}

fn drain(log: &Mutex<Vec<String>>, show: bool) -> String {
    let names = std::mem::take(&mut *log.lock().unwrap_or_else(PoisonError::into_inner));
    if show {
        names.join(" ")
    } else {
        names.len().to_string()
    }
}

fn row(session: &PlayerSession, index: usize, step: String, events: String) -> StepRow {
    match session.player() {
        Ok(player) => StepRow {
            index,
            step,
            phase: player.phase().to_string(),
            state: player.state().to_string(),
            position: format!("{:.1}", player.position()),
            events,
        },
        Err(_) => StepRow {
            index,
            step,
            phase: "-".to_string(),
            state: "-".to_string(),
            position: "-".to_string(),
            events,
        },
    }
}

#[derive(Serialize, Tabled)]
struct ChannelRow {
    main: String,
    ad: String,
}

/// List every public event channel
pub fn events(format: &str) -> anyhow::Result<()> {
    let rows: Vec<ChannelRow> = EventKind::ALL
        .iter()
        .map(|kind| ChannelRow {
            main: kind.channel_name(EventSource::Main),
            ad: kind.channel_name(EventSource::Ad),
        })
        .collect();
    print_rows("Event channels", &rows, format)
}
