//! Track and quality normalization
//!
//! Turns the engine's raw variants and text/audio tracks into the lists the
//! settings overlay shows:
//! - video qualities deduplicated by bandwidth, labelled by resolution,
//!   with an `auto` entry in front
//! - audio languages/roles, `und` dropped
//! - subtitles and captions, forced tracks dropped, with a `none` entry in front
//!
//! Normalization is a pure function of a [`TrackSnapshot`].

use crate::i18n::{language_label, Translator};
use serde::{Deserialize, Serialize};

/// Id of the video sentinel that hands quality back to ABR
pub const AUTO_TRACK_ID: &str = "auto";

/// Id of the text sentinel that hides subtitles
pub const NONE_TRACK_ID: &str = "none";

/// Transfer characteristics that count as HDR
const HDR_TRANSFERS: [&str; 2] = ["PQ", "HLG"];

/// HDR marker as engines report it: a flag or a transfer characteristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HdrMarker {
    Flag(bool),
    Transfer(String),
}

/// Raw variant (one video quality + one audio stream) from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Variant {
    pub id: u64,
    pub active: bool,
    /// Total bandwidth in bits per second
    pub bandwidth: u64,
    /// Bandwidth of the video stream alone, when known
    pub video_bandwidth: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub hdr: Option<HdrMarker>,
    pub label: Option<String>,
    pub language: String,
    pub audio_roles: Vec<String>,
}

impl Variant {
    /// Bandwidth used to tell qualities apart
    pub fn quality_bandwidth(&self) -> u64 {
        self.video_bandwidth.unwrap_or(self.bandwidth)
    }

    pub fn is_hdr(&self) -> bool {
        match &self.hdr {
            Some(HdrMarker::Flag(flag)) => *flag,
            Some(HdrMarker::Transfer(transfer)) => HDR_TRANSFERS.contains(&transfer.as_str()),
            None => false,
        }
    }

    pub fn quality(&self) -> QualityFlags {
        QualityFlags::classify(self.width.unwrap_or(0), self.is_hdr())
    }
}

/// Raw audio language/role pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAudioTrack {
    pub language: String,
    pub role: Option<String>,
    pub label: Option<String>,
}

impl RawAudioTrack {
    fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|role| !role.is_empty())
    }
}

/// Kind of a text track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    #[default]
    Subtitles,
    Captions,
}

/// Raw text track from the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTextTrack {
    pub id: u64,
    pub active: bool,
    pub language: String,
    pub label: Option<String>,
    pub kind: TextKind,
    pub roles: Vec<String>,
    pub forced: bool,
    /// Id from the manifest, often a numeric index
    pub original_text_id: Option<String>,
}

/// Everything the normalizer reads from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackSnapshot {
    pub variants: Vec<Variant>,
    pub audio: Vec<RawAudioTrack>,
    pub text: Vec<RawTextTrack>,
    pub abr_enabled: bool,
}

impl TrackSnapshot {
    pub fn active_variant(&self) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.active)
    }
}

/// HD/UHD/HDR classification of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QualityFlags {
    pub hd: bool,
    pub uhd: bool,
    pub hdr: bool,
}

impl QualityFlags {
    pub fn classify(width: u32, hdr: bool) -> Self {
        let uhd = width >= 3840;
        Self {
            hd: width >= 1920 && !uhd,
            uhd,
            hdr,
        }
    }
}

/// Video quality entry of the settings overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTrack {
    /// Quality bandwidth as a string, or `auto`
    pub id: String,
    /// Text shown in the menu
    pub name: String,
    /// Resolution label, e.g. `1080p`
    pub label: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bandwidth: Option<u64>,
    pub selected: bool,
    pub hd: bool,
    pub uhd: bool,
    pub hdr: bool,
}

impl VideoTrack {
    pub fn auto() -> Self {
        Self {
            id: AUTO_TRACK_ID.to_string(),
            name: "Auto".to_string(),
            label: AUTO_TRACK_ID.to_string(),
            width: None,
            height: None,
            bandwidth: None,
            selected: false,
            hd: false,
            uhd: false,
            hdr: false,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.id == AUTO_TRACK_ID
    }
}

/// Audio entry of the settings overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    /// `language` or `language_role`
    pub id: String,
    pub label: String,
    pub language: String,
    pub role: Option<String>,
    pub selected: bool,
}

/// Subtitle entry of the settings overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTrack {
    /// `language_role1|role2`, or `none`
    pub id: String,
    pub label: String,
    pub language: String,
    pub kind: TextKind,
    pub roles: Vec<String>,
    pub selected: bool,
}

impl TextTrack {
    pub fn none() -> Self {
        Self {
            id: NONE_TRACK_ID.to_string(),
            label: String::new(),
            language: String::new(),
            kind: TextKind::Subtitles,
            roles: Vec::new(),
            selected: false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.id == NONE_TRACK_ID
    }
}

/// Output of [`normalize`]. An empty list means there is nothing to offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTracks {
    pub video: Vec<VideoTrack>,
    pub audio: Vec<AudioTrack>,
    pub text: Vec<TextTrack>,
}

/// Normalize a snapshot of engine tracks
pub fn normalize(snapshot: &TrackSnapshot, translator: &dyn Translator) -> NormalizedTracks {
    let active = snapshot.active_variant();
    NormalizedTracks {
        video: normalize_video(&snapshot.variants, active, snapshot.abr_enabled),
        audio: normalize_audio(&snapshot.audio, active, translator),
        text: normalize_text(&snapshot.text, translator),
    }
}

/// Resolution label for a frame width
pub fn resolution_label(width: u32) -> &'static str {
    match width {
        w if w >= 3840 => "2160p",
        w if w >= 1920 => "1080p",
        w if w >= 1280 => "720p",
        w if w >= 720 => "480p",
        w if w >= 640 => "360p",
        w if w >= 352 => "288p",
        _ => "144p",
    }
}

/// `2.5Mbps` / `781.3Kbps`, one decimal
pub fn human_bandwidth(bits_per_second: u64) -> String {
    const MEGA: f64 = 1024.0 * 1024.0;
    let bps = bits_per_second as f64;
    if bps > MEGA {
        format!("{}Mbps", (bps / MEGA * 10.0).round() / 10.0)
    } else {
        format!("{}Kbps", (bps / 1024.0 * 10.0).round() / 10.0)
    }
}

fn normalize_video(variants: &[Variant], active: Option<&Variant>, abr_enabled: bool) -> Vec<VideoTrack> {
    let mut distinct: Vec<&Variant> = Vec::with_capacity(variants.len());
    for variant in variants {
        if !distinct
            .iter()
            .any(|kept| kept.quality_bandwidth() == variant.quality_bandwidth())
        {
            distinct.push(variant);
        }
    }

    if distinct.len() < 2 {
        return Vec::new();
    }

    distinct.sort_by(|a, b| {
        b.height
            .unwrap_or(0)
            .cmp(&a.height.unwrap_or(0))
            .then(b.quality_bandwidth().cmp(&a.quality_bandwidth()))
    });

    let labels: Vec<&str> = distinct
        .iter()
        .map(|variant| resolution_label(variant.width.unwrap_or(0)))
        .collect();
    let shared_label = labels
        .iter()
        .enumerate()
        .any(|(i, label)| labels[i + 1..].contains(label));

    let mut tracks = Vec::with_capacity(distinct.len() + 1);
    tracks.push(VideoTrack::auto());

    for (variant, label) in distinct.into_iter().zip(labels) {
        let bandwidth = variant.quality_bandwidth();
        let name = match variant.width {
            Some(width) if width > 0 && shared_label => format!("{} @ {}", label, human_bandwidth(bandwidth)),
            Some(width) if width > 0 => label.to_string(),
            _ => human_bandwidth(bandwidth),
        };
        let selected = !abr_enabled
            && active.is_some_and(|active| {
                active.quality_bandwidth() == bandwidth && active.height == variant.height
            });
        let quality = variant.quality();

        tracks.push(VideoTrack {
            id: bandwidth.to_string(),
            name,
            label: label.to_string(),
            width: variant.width,
            height: variant.height,
            bandwidth: Some(bandwidth),
            selected,
            hd: quality.hd,
            uhd: quality.uhd,
            hdr: quality.hdr,
        });
    }

    tracks
}

fn normalize_audio(audio: &[RawAudioTrack], active: Option<&Variant>, translator: &dyn Translator) -> Vec<AudioTrack> {
    if audio.len() < 2 {
        return Vec::new();
    }

    let active_role = active.and_then(|variant| variant.audio_roles.first().map(String::as_str));
    let mut tracks: Vec<AudioTrack> = Vec::with_capacity(audio.len());
    let mut has_selection = false;

    for raw in audio.iter().filter(|raw| raw.language != "und") {
        let role = raw.role();
        let id = match role {
            Some(role) => format!("{}_{}", raw.language, role),
            None => raw.language.clone(),
        };
        if tracks.iter().any(|track| track.id == id) {
            continue;
        }

        let matches_active = active.is_some_and(|variant| variant.language == raw.language) && role == active_role;
        let selected = matches_active && !has_selection;
        has_selection |= selected;

        let label = raw
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| language_label(translator, &raw.language));

        tracks.push(AudioTrack {
            id,
            label,
            language: raw.language.clone(),
            role: role.map(str::to_string),
            selected,
        });
    }

    tracks
}

fn normalize_text(text: &[RawTextTrack], translator: &dyn Translator) -> Vec<TextTrack> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut tracks = Vec::with_capacity(text.len() + 1);
    tracks.push(TextTrack::none());
    let mut has_selection = false;

    for raw in text.iter().filter(|raw| !raw.forced) {
        let id = format!("{}_{}", raw.language, raw.roles.join("|"));
        if tracks.iter().any(|track: &TextTrack| track.id == id) {
            continue;
        }

        let mut label = raw
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .or_else(|| {
                raw.original_text_id
                    .clone()
                    .filter(|original| !original.is_empty() && !looks_numeric(original))
            })
            .unwrap_or_else(|| language_label(translator, &raw.language));
        if raw.kind == TextKind::Captions {
            label = format!("CC ({})", label);
        }

        let selected = raw.active && !has_selection;
        has_selection |= selected;

        tracks.push(TextTrack {
            id,
            label,
            language: raw.language.clone(),
            kind: raw.kind,
            roles: raw.roles.clone(),
            selected,
        });
    }

    tracks
}

/// True when the text starts with a number, the way manifests index tracks
fn looks_numeric(text: &str) -> bool {
    let trimmed = text.trim_start();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let mut chars = unsigned.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}
