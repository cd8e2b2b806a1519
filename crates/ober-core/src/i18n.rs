//! Localization boundary
//!
//! The player only needs `t(key, params)`. [`Catalog`] is the built-in
//! implementation: phrases for `en`, `fr` and `de`, overridable per key from
//! the setup options, with `%{name}` interpolation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Phrase lookup used by the player
pub trait Translator: Send + Sync {
    /// Translate `key`, substituting `%{name}` placeholders. Unknown keys come back unchanged.
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Human label for a language code, falling back to the code itself
pub fn language_label(translator: &dyn Translator, language: &str) -> String {
    let key = format!("languageLabels.{}", language);
    let label = translator.t(&key, &[]);
    if label == key {
        language.to_string()
    } else {
        label
    }
}

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    De,
}

impl Locale {
    /// Parse a locale, falling back to English for anything unsupported
    pub fn from_lang(lang: &str) -> Self {
        lang.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::De => "de",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            "de" => Ok(Locale::De),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language names, shown in their own language whatever the interface locale
const LANGUAGE_LABELS: &[(&str, &str)] = &[
    ("ar", "العربية"),
    ("de", "Deutsch"),
    ("en", "English"),
    ("es", "Español"),
    ("fr", "Français"),
    ("it", "Italiano"),
    ("ja", "日本語"),
    ("nl", "Nederlands"),
    ("pl", "Polski"),
    ("pt", "Português"),
    ("ru", "Русский"),
    ("zh", "中文"),
];

const EN: &[(&str, &str)] = &[
    ("message.browserNotSupported", "Sorry your browser is not compatible with the player"),
    ("message.stylesheet", "Cannot load stylesheet %{url}"),
    ("message.rights.notYetAvailable", "This video will be available on %{date}"),
    ("message.rights.expired", "This video is no longer available"),
    ("message.restrictions.age", "This video is not suitable for viewers under %{age}"),
    ("message.restrictions.ageDeclined", "You declined to watch this video"),
    ("message.restrictions.time", "This video can only be watched between %{from} and %{to}"),
    ("button.accept", "I am over %{age}"),
    ("button.decline", "Leave"),
    ("ariaLabel.play", "Play"),
    ("ariaLabel.pause", "Pause"),
    ("ariaLabel.mutedSound", "Unmute"),
    ("ariaLabel.fullscreen", "Full screen"),
    ("ariaLabel.settings", "Settings"),
    ("settings.quality", "Quality"),
    ("settings.audio", "Audio"),
    ("settings.subtitles", "Subtitles"),
    ("settings.none", "None"),
    ("live", "Live"),
];

const FR: &[(&str, &str)] = &[
    ("message.browserNotSupported", "Désolé, votre navigateur n'est pas compatible avec le lecteur"),
    ("message.stylesheet", "Impossible de charger la feuille de style %{url}"),
    ("message.rights.notYetAvailable", "Cette vidéo sera disponible le %{date}"),
    ("message.rights.expired", "Cette vidéo n'est plus disponible"),
    ("message.restrictions.age", "Cette vidéo est déconseillée aux moins de %{age} ans"),
    ("message.restrictions.ageDeclined", "Vous avez choisi de ne pas regarder cette vidéo"),
    ("message.restrictions.time", "Cette vidéo n'est visible qu'entre %{from} et %{to}"),
    ("button.accept", "J'ai plus de %{age} ans"),
    ("button.decline", "Quitter"),
    ("ariaLabel.play", "Lecture"),
    ("ariaLabel.pause", "Pause"),
    ("ariaLabel.mutedSound", "Activer le son"),
    ("ariaLabel.fullscreen", "Plein écran"),
    ("ariaLabel.settings", "Paramètres"),
    ("settings.quality", "Qualité"),
    ("settings.audio", "Audio"),
    ("settings.subtitles", "Sous-titres"),
    ("settings.none", "Aucun"),
    ("live", "Direct"),
];

const DE: &[(&str, &str)] = &[
    ("message.browserNotSupported", "Ihr Browser wird vom Player leider nicht unterstützt"),
    ("message.stylesheet", "Stylesheet %{url} kann nicht geladen werden"),
    ("message.rights.notYetAvailable", "Dieses Video ist ab dem %{date} verfügbar"),
    ("message.rights.expired", "Dieses Video ist nicht mehr verfügbar"),
    ("message.restrictions.age", "Dieses Video ist nicht für Zuschauer unter %{age} Jahren geeignet"),
    ("message.restrictions.ageDeclined", "Sie haben sich gegen dieses Video entschieden"),
    ("message.restrictions.time", "Dieses Video ist nur zwischen %{from} und %{to} verfügbar"),
    ("button.accept", "Ich bin über %{age}"),
    ("button.decline", "Verlassen"),
    ("ariaLabel.play", "Abspielen"),
    ("ariaLabel.pause", "Pause"),
    ("ariaLabel.mutedSound", "Ton einschalten"),
    ("ariaLabel.fullscreen", "Vollbild"),
    ("ariaLabel.settings", "Einstellungen"),
    ("settings.quality", "Qualität"),
    ("settings.audio", "Audio"),
    ("settings.subtitles", "Untertitel"),
    ("settings.none", "Keine"),
    ("live", "Live"),
];

/// Built-in phrase catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: Locale,
    phrases: HashMap<String, String>,
}

impl Catalog {
    /// Catalog with the built-in phrases of `locale`
    pub fn new(locale: Locale) -> Self {
        let table = match locale {
            Locale::En => EN,
            Locale::Fr => FR,
            Locale::De => DE,
        };

        let mut phrases: HashMap<String, String> = table
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        for (code, name) in LANGUAGE_LABELS {
            phrases.insert(format!("languageLabels.{}", code), name.to_string());
        }

        Self { locale, phrases }
    }

    /// Override or add phrases
    pub fn with_phrases(mut self, phrases: &HashMap<String, String>) -> Self {
        self.phrases
            .extend(phrases.iter().map(|(key, value)| (key.clone(), value.clone())));
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Locale::En)
    }
}

impl Translator for Catalog {
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(phrase) = self.phrases.get(key) else {
            return key.to_string();
        };
        params.iter().fold(phrase.clone(), |text, (name, value)| {
            text.replace(&format!("%{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_fallback() {
        assert_eq!(Locale::from_lang("fr"), Locale::Fr);
        assert_eq!(Locale::from_lang("DE"), Locale::De);
        assert_eq!(Locale::from_lang("es"), Locale::En);
        assert_eq!(Locale::from_lang(""), Locale::En);
    }

    #[test]
    fn test_interpolation() {
        let catalog = Catalog::new(Locale::En);
        assert_eq!(
            catalog.t("message.restrictions.time", &[("from", "22:00"), ("to", "05:00")]),
            "This video can only be watched between 22:00 and 05:00"
        );
    }

    #[test]
    fn test_unknown_key_is_returned() {
        let catalog = Catalog::new(Locale::De);
        assert_eq!(catalog.t("no.such.key", &[]), "no.such.key");
        assert_eq!(language_label(&catalog, "xx"), "xx");
        assert_eq!(language_label(&catalog, "fr"), "Français");
    }

    #[test]
    fn test_phrase_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("live".to_string(), "En direct".to_string());
        let catalog = Catalog::new(Locale::Fr).with_phrases(&overrides);
        assert_eq!(catalog.t("live", &[]), "En direct");
        assert_eq!(catalog.locale(), Locale::Fr);
    }
}
