//! Locale registry: single source of truth for the locales the site serves.
//!
//! The registry is built once behind a `OnceLock` and is immutable afterwards.
//! Only locales listed here may be stored in the session cookie.

use std::sync::OnceLock;

/// Configuration for a supported locale.
///
/// Holds the tag used for translation files and cookies, the display names,
/// and whether the locale is selectable or the fallback.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Language/region tag, also the translation file stem (e.g., "pt_PT")
    pub code: &'static str,

    /// English name of the locale (e.g., "Portuguese (Portugal)")
    pub name: &'static str,

    /// Native name shown in the language switcher (e.g., "Português")
    pub native_name: &'static str,

    /// Whether this is the fallback locale (exactly one should be true)
    pub is_default: bool,

    /// Whether users may select this locale
    pub enabled: bool,
}

/// Global locale registry.
///
/// Initialized on first access and immutable afterwards.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global locale registry instance.
    ///
    /// The registry is built on the first call; later calls return the same
    /// instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Get a locale configuration by its code.
    ///
    /// Matching is exact: "pt_pt" and "pt-PT" are not "pt_PT".
    ///
    /// # Arguments
    /// * `code` - Language/region tag (e.g., "en_US")
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the locale is registered
    /// * `None` otherwise
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Get all enabled locales.
    ///
    /// # Returns
    /// Enabled locale configurations in registry order, which is also the
    /// order of the language switcher.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().filter(|locale| locale.enabled).collect()
    }

    /// Get the default (fallback) locale configuration.
    ///
    /// # Returns
    /// The locale whose translation file answers requests for locales
    /// without one.
    ///
    /// # Panics
    /// Panics if the registry does not define exactly one default locale.
    /// The registry is static, so this is a programming error.
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default locale found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default locales found in registry"),
        }
    }

    /// Check if a locale code is supported and enabled.
    ///
    /// # Arguments
    /// * `code` - Language/region tag to check
    ///
    /// # Returns
    /// `true` only for registered locales with `enabled` set.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "pt_PT",
            name: "Portuguese (Portugal)",
            native_name: "Português",
            is_default: true,
            enabled: true,
        },
        LocaleConfig {
            code: "en_US",
            name: "English (United States)",
            native_name: "English",
            is_default: false,
            enabled: true,
        },
        LocaleConfig {
            code: "es_ES",
            name: "Spanish (Spain)",
            native_name: "Español",
            is_default: false,
            enabled: true,
        },
    ]
}
