//! Locale type: a language/region tag validated against the registry.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use anyhow::{bail, Result};
use std::fmt;

/// A validated locale.
///
/// Only supported, enabled locales can be constructed, so a `Locale` is safe
/// to use as a file stem or cookie value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    pub const PT_PT: Locale = Locale { code: "pt_PT" };
    pub const EN_US: Locale = Locale { code: "en_US" };
    pub const ES_ES: Locale = Locale { code: "es_ES" };

    /// Create a Locale from a tag such as "en_US".
    ///
    /// # Returns
    /// * `Ok(Locale)` if the tag is registered and enabled
    /// * `Err` if the tag is unknown or disabled
    pub fn from_code(code: &str) -> Result<Locale> {
        match LocaleRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale { code: config.code }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// Resolve an optional tag, falling back to the default locale.
    pub fn from_code_or_default(code: Option<&str>) -> Locale {
        code.and_then(|code| Locale::from_code(code).ok())
            .unwrap_or_else(Locale::default_locale)
    }

    /// The locale used when a translation file is missing.
    pub fn default_locale() -> Locale {
        Locale {
            code: LocaleRegistry::get().default_locale().code,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Two-letter code used to pick fields out of translated quiz files.
    ///
    /// Quiz files only carry "pt" and "en", so every non-Portuguese locale
    /// reads the English text.
    pub fn quiz_language(&self) -> &'static str {
        if self.code == "pt_PT" {
            "pt"
        } else {
            "en"
        }
    }

    /// Value for the HTML `lang` attribute (e.g., "pt-PT").
    pub fn html_lang(&self) -> String {
        self.code.replace('_', "-")
    }

    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be registered")
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::default_locale()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
