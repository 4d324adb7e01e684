//! Update podcast availability in every translation file.
//!
//! Scans the audio directory and rewrites each `<locale>.json` in the
//! translations directory so episode `available` and `audio` fields match
//! the recordings on disk. Files are overwritten in place.
//!
//! Usage:
//!   cargo run --bin update-audio
//!
//! Optional environment variables:
//! - TRANSLATIONS_DIR (defaults to translations)
//! - AUDIO_DIR (defaults to static/assets)

use anyhow::{Context, Result};
use stats_learning_site::audio::AudioCatalog;
use stats_learning_site::config::Config;
use tracing::{error, info};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stats_learning_site=info".parse()?)
                .add_directive("update_audio=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let catalog = AudioCatalog::scan(&config.audio_dir)?;

    let entries = std::fs::read_dir(&config.translations_dir).with_context(|| {
        format!(
            "Failed to read translations directory {}",
            config.translations_dir.display()
        )
    })?;

    let mut updated = 0;
    let mut failed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        // Keep going: one broken file should not block the others
        match catalog.update_translation_file(&path, locale) {
            Ok(outcome) => {
                info!(
                    "{}: {} episodes, {}",
                    locale,
                    outcome.episodes_updated,
                    if outcome.changed { "changed" } else { "unchanged" }
                );
                updated += 1;
            }
            Err(e) => {
                error!("Error updating translation file {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!("✓ Updated {} translation files ({} failed)", updated, failed);
    Ok(())
}
