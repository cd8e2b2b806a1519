//! Benchmark tests for ober-core operations
//!
//! Run with: cargo bench -p ober-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ober_core::bus::{EventBus, EventFilter, Inbox};
use ober_core::events::{EventKind, PlayerEvent};
use ober_core::i18n::{Catalog, Locale};
use ober_core::state::PlaybackState;
use ober_core::timeline::{parse_chapters, seconds_to_human_readable};
use ober_core::tracks::{normalize, RawAudioTrack, RawTextTrack, TrackSnapshot, Variant};
use ober_core::types::Aspect;

// ============================================================================
// Helpers
// ============================================================================

fn create_snapshot(variants: usize) -> TrackSnapshot {
    let widths = [426, 640, 854, 1280, 1920, 3840];
    TrackSnapshot {
        variants: (0..variants)
            .map(|i| {
                let width = widths[i % widths.len()];
                Variant {
                    id: i as u64,
                    active: i == 0,
                    bandwidth: 400_000 * (i as u64 + 1),
                    width: Some(width),
                    height: Some(width * 9 / 16),
                    language: if i % 2 == 0 { "en" } else { "fr" }.to_string(),
                    ..Default::default()
                }
            })
            .collect(),
        audio: ["en", "fr", "de", "es"]
            .iter()
            .map(|lang| RawAudioTrack {
                language: lang.to_string(),
                ..Default::default()
            })
            .collect(),
        text: (0..6)
            .map(|i| RawTextTrack {
                id: i,
                language: ["en", "fr", "de"][i as usize % 3].to_string(),
                forced: i == 5,
                ..Default::default()
            })
            .collect(),
        abr_enabled: false,
    }
}

// ============================================================================
// Normalizer
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let catalog = Catalog::new(Locale::En);
    let mut group = c.benchmark_group("normalize");

    for size in [4, 12, 48] {
        let snapshot = create_snapshot(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| normalize(black_box(snapshot), &catalog))
        });
    }

    group.finish();
}

// ============================================================================
// Event bus
// ============================================================================

fn bench_bus_publish(c: &mut Criterion) {
    let bus = EventBus::new();
    for kind in EventKind::ALL {
        bus.subscribe(EventFilter::main(kind), |event| {
            black_box(event);
        });
    }
    let inbox = Inbox::attach(&bus);

    c.bench_function("bus_publish_time", |b| {
        b.iter(|| {
            bus.emit(black_box(PlayerEvent::Time {
                current_time: 12.5,
                duration: 120.0,
            }));
            inbox.clear();
        })
    });
}

// ============================================================================
// Derived view
// ============================================================================

fn bench_derived_view(c: &mut Criterion) {
    let mut state = PlaybackState::new(true, false, 0.5);
    state.is_playing = true;
    state.is_buffering = false;

    c.bench_function("phase", |b| b.iter(|| black_box(&state).phase()));
    c.bench_function("class_list", |b| {
        b.iter(|| black_box(&state).class_list(Aspect::Player, false))
    });
}

fn bench_timeline(c: &mut Criterion) {
    let vtt: String = (0..29)
        .map(|i| format!("\n{:02}:00.000 --> {:02}:00.000\nChapter {}\n", i * 2, i * 2 + 2, i + 1))
        .fold("WEBVTT\n".to_string(), |acc, cue| acc + &cue);

    c.bench_function("parse_chapters", |b| b.iter(|| parse_chapters(black_box(&vtt))));
    c.bench_function("human_readable", |b| {
        b.iter(|| seconds_to_human_readable(black_box(5025.4)))
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_bus_publish,
    bench_derived_view,
    bench_timeline,
);

criterion_main!(benches);
