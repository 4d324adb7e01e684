//! Podcast audio availability.
//!
//! Recordings live in one directory. A recording for a specific locale is
//! named `<base>_<locale>.wav`; files without a locale suffix are legacy
//! recordings and count as the default locale's version.

use crate::i18n::{Locale, LocaleRegistry};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

/// Episode id → base recording file name.
pub const EPISODES: [(&str, &str); 9] = [
    ("1", "Estatística Descritiva.wav"),
    ("2", "Teoria das Probabilidades.wav"),
    ("3", "Probabilidade Condicionada e Independência.wav"),
    ("4", "Variáveis Aleatórias e Propriedades Fundamentais.wav"),
    ("5", "Distribuições de Probabilidade Discretas.wav"),
    ("6", "Distribuições Contínuas_ Normal e Exponencial.wav"),
    ("7", "Amostragem e Distribuições Amostrais.wav"),
    ("8", "Estimação de Parâmetros e Intervalos de Confiança.wav"),
    ("9", "Testes de Hipóteses Paramétricos.wav"),
];

/// Subject and page whose `episodes` mapping is rewritten.
const PODCAST_SUBJECT: &str = "probabilidade";
const PODCAST_PAGE: &str = "podcasts";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid translation file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

static LOCALE_SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn locale_suffix_regex() -> &'static Regex {
    LOCALE_SUFFIX_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<base>.+)_(?P<locale>[a-z]{2}_[A-Z]{2})\.wav$")
            .expect("locale suffix regex is valid")
    })
}

/// Base file name of an episode, if the id is registered.
pub fn episode_file(episode_id: &str) -> Option<&'static str> {
    EPISODES
        .iter()
        .find(|(id, _)| *id == episode_id)
        .map(|(_, file)| *file)
}

/// Recordings found in the audio directory, grouped by locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioCatalog {
    /// Locale → base names (suffix removed) with a recording in that locale
    by_locale: HashMap<String, BTreeSet<String>>,

    /// File names without a recognised locale suffix
    legacy: BTreeSet<String>,

    default_locale: String,
}

impl AudioCatalog {
    /// Scan `dir` for `.wav` files. A missing directory yields an empty catalog.
    pub fn scan(dir: &Path) -> Result<Self, AudioError> {
        let mut catalog = AudioCatalog {
            default_locale: Locale::default_locale().code().to_string(),
            ..Default::default()
        };

        if !dir.exists() {
            debug!("Audio directory {} does not exist", dir.display());
            return Ok(catalog);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| AudioError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.flatten() {
            if let Some(file_name) = entry.file_name().to_str() {
                catalog.add_file(file_name);
            }
        }

        info!(
            "Scanned {} audio files ({} legacy)",
            catalog.by_locale.values().map(BTreeSet::len).sum::<usize>() + catalog.legacy.len(),
            catalog.legacy.len()
        );
        Ok(catalog)
    }

    fn add_file(&mut self, file_name: &str) {
        if !file_name.ends_with(".wav") {
            return;
        }

        let registry = LocaleRegistry::get();
        if let Some(captures) = locale_suffix_regex().captures(file_name) {
            let locale = &captures["locale"];
            if registry.is_enabled(locale) {
                self.by_locale
                    .entry(locale.to_string())
                    .or_default()
                    .insert(format!("{}.wav", &captures["base"]));
                return;
            }
        }

        self.legacy.insert(file_name.to_string());
    }

    fn has_locale_file(&self, locale: &str, base: &str) -> bool {
        self.by_locale
            .get(locale)
            .map(|files| files.contains(base))
            .unwrap_or(false)
    }

    fn has_legacy_file(&self, locale: &str, base: &str) -> bool {
        locale == self.default_locale && self.legacy.contains(base)
    }

    /// Availability of every registered episode in `locale`.
    pub fn available_episodes(&self, locale: &str) -> BTreeMap<String, bool> {
        EPISODES
            .iter()
            .map(|(id, base)| {
                let available =
                    self.has_locale_file(locale, base) || self.has_legacy_file(locale, base);
                (id.to_string(), available)
            })
            .collect()
    }

    /// File name to play for an episode in `locale`.
    ///
    /// The locale-specific recording when present, otherwise the base name.
    /// Unknown episode ids yield an empty string.
    pub fn audio_filename(&self, episode_id: &str, locale: &str) -> String {
        let Some(base) = episode_file(episode_id) else {
            return String::new();
        };

        if self.has_locale_file(locale, base) {
            let stem = base.strip_suffix(".wav").unwrap_or(base);
            format!("{stem}_{locale}.wav")
        } else {
            base.to_string()
        }
    }

    /// Rewrite episode `available` and `audio` fields in a translation file.
    ///
    /// The whole file is overwritten in place, preserving key order.
    pub fn update_translation_file(
        &self,
        path: &Path,
        locale: &str,
    ) -> Result<UpdateOutcome, AudioError> {
        let content = std::fs::read_to_string(path).map_err(|source| AudioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let original: Value =
            serde_json::from_str(&content).map_err(|source| AudioError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut translations = original.clone();
        let availability = self.available_episodes(locale);
        let mut episodes_updated = 0;

        if let Some(episodes) = podcast_episodes_mut(&mut translations) {
            for (episode_id, episode) in episodes.iter_mut() {
                let Some(episode) = episode.as_object_mut() else {
                    continue;
                };
                let available = availability.get(episode_id).copied().unwrap_or(false);
                episode.insert("available".to_string(), Value::Bool(available));
                episode.insert(
                    "audio".to_string(),
                    Value::String(self.audio_filename(episode_id, locale)),
                );
                episodes_updated += 1;
            }
        }

        let rendered = to_pretty_json(&translations).map_err(|source| AudioError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, rendered).map_err(|source| AudioError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Updated availability for {}", locale);
        Ok(UpdateOutcome {
            episodes_updated,
            changed: translations != original,
        })
    }
}

/// What an update did to one translation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub episodes_updated: usize,
    /// Whether any value differs from what was on disk
    pub changed: bool,
}

fn podcast_episodes_mut(translations: &mut Value) -> Option<&mut serde_json::Map<String, Value>> {
    translations
        .get_mut("subjects")?
        .get_mut(PODCAST_SUBJECT)?
        .get_mut("pages")?
        .get_mut(PODCAST_PAGE)?
        .get_mut("episodes")?
        .as_object_mut()
}

/// Four-space indented JSON with non-ASCII text written as-is.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}
