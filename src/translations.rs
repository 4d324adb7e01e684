//! Per-locale translation documents and page-level lookups.
//!
//! Documents live in `<dir>/<locale>.json`. A request for a locale without a
//! file is answered with the default locale's document; a missing default
//! document is unrecoverable.

use crate::cache::BoundedCache;
use crate::i18n::{CacheMetrics, Locale};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_DOCUMENT_CACHE_CAPACITY: usize = 16;
pub const DEFAULT_PAGE_CACHE_CAPACITY: usize = 32;

/// Section name for pages that do not belong to a subject.
pub const GENERAL_SECTION: &str = "general";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("default locale translation file not found: {}", .0.display())]
    DefaultLocaleMissing(PathBuf),

    #[error("failed to read translations from {}: {source}", .path.display())]
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

/// One locale's translation file.
///
/// Every top-level section is optional and defaults to an empty mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationDocument {
    #[serde(default)]
    pub general: Map<String, Value>,

    #[serde(default)]
    pub pages: Map<String, Value>,

    #[serde(default)]
    pub subjects: Map<String, Value>,

    #[serde(default)]
    pub coming_soon: Map<String, Value>,
}

impl TranslationDocument {
    /// Full subject entry (including its `pages`), empty if absent.
    pub fn subject(&self, subject: &str) -> Map<String, Value> {
        object_or_empty(self.subjects.get(subject))
    }

    /// Fields of a general (non-subject) page, empty if absent.
    pub fn general_page(&self, page: &str) -> Map<String, Value> {
        object_or_empty(self.pages.get(page))
    }

    /// Fields of a subject page, empty if the subject or page is absent.
    pub fn subject_page(&self, subject: &str, page: &str) -> Map<String, Value> {
        let pages = self
            .subjects
            .get(subject)
            .and_then(|subject| subject.get("pages"));
        object_or_empty(pages.and_then(|pages| pages.get(page)))
    }
}

/// Translations handed to a page renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageTranslations {
    pub general: Map<String, Value>,

    /// Present only for subject sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Map<String, Value>>,

    pub page: Map<String, Value>,
}

impl PageTranslations {
    /// String field of the page section.
    pub fn page_text(&self, key: &str) -> Option<&str> {
        self.page.get(key).and_then(Value::as_str)
    }

    /// String field of the general section.
    pub fn general_text(&self, key: &str) -> Option<&str> {
        self.general.get(key).and_then(Value::as_str)
    }

    /// String field of the subject section.
    pub fn subject_text(&self, key: &str) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|subject| subject.get(key))
            .and_then(Value::as_str)
    }
}

fn object_or_empty(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

type PageKey = (String, String, String);

/// Cached access to translation documents.
pub struct TranslationStore {
    dir: PathBuf,
    default_locale: String,
    documents: Mutex<BoundedCache<String, Arc<TranslationDocument>>>,
    pages: Mutex<BoundedCache<PageKey, Arc<PageTranslations>>>,
    available: Mutex<BTreeSet<String>>,
    /// Bumped by `reload`; entries read under an older generation are not cached.
    generation: AtomicU64,
    metrics: CacheMetrics,
}

impl TranslationStore {
    /// Create a store with empty caches. Nothing is read until first use.
    pub fn new(dir: impl Into<PathBuf>, document_capacity: usize, page_capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            default_locale: Locale::default_locale().code().to_string(),
            documents: Mutex::new(BoundedCache::new(document_capacity)),
            pages: Mutex::new(BoundedCache::new(page_capacity)),
            available: Mutex::new(BTreeSet::new()),
            generation: AtomicU64::new(0),
            metrics: CacheMetrics::new(),
        }
    }

    /// Create a store and preload every locale file.
    ///
    /// Fails if the directory cannot be read or the default locale cannot be loaded.
    pub fn open(
        dir: impl Into<PathBuf>,
        document_capacity: usize,
        page_capacity: usize,
    ) -> Result<Self, TranslationError> {
        let store = Self::new(dir, document_capacity, page_capacity);
        store.preload()?;
        Ok(store)
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Load every `*.json` file in the translations directory.
    ///
    /// A non-default locale whose file fails to load is logged and left out.
    /// Returns the locales that loaded, sorted.
    pub fn preload(&self) -> Result<Vec<String>, TranslationError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| TranslationError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut found = BTreeSet::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                found.insert(stem.to_string());
            }
        }

        // Surfaces DefaultLocaleMissing even when no file was found at all
        self.load(&self.default_locale)?;

        found.retain(|locale| {
            if *locale == self.default_locale {
                return true;
            }
            match self.load(locale) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Skipping translations for {}: {}", locale, e);
                    false
                }
            }
        });

        let locales: Vec<String> = found.iter().cloned().collect();
        info!("Preloaded translations for: {}", locales.join(", "));
        *lock(&self.available) = found;

        Ok(locales)
    }

    /// Drop every cached document and page, then preload again.
    pub fn reload(&self) -> Result<Vec<String>, TranslationError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        lock(&self.documents).clear();
        lock(&self.pages).clear();
        self.metrics.record_reload();
        info!("Translation caches cleared, reloading from {}", self.dir.display());
        self.preload()
    }

    /// Locales that had a translation file at the last preload.
    pub fn available_locales(&self) -> Vec<String> {
        lock(&self.available).iter().cloned().collect()
    }

    /// Load a locale's document, falling back to the default locale when the
    /// file does not exist.
    pub fn load(&self, locale: &str) -> Result<Arc<TranslationDocument>, TranslationError> {
        let generation = self.generation.load(Ordering::SeqCst);
        if let Some(document) = lock(&self.documents).get(&locale.to_string()) {
            self.metrics.record_document_hit();
            return Ok(document);
        }
        self.metrics.record_document_miss();

        let document = match self.read_document(locale)? {
            Some(document) => Arc::new(document),
            None if locale != self.default_locale => {
                warn!(
                    "Translation file for {} not found, using default locale {}",
                    locale, self.default_locale
                );
                self.metrics.record_locale_fallback();
                self.load(&self.default_locale)?
            }
            None => {
                return Err(TranslationError::DefaultLocaleMissing(
                    self.locale_path(locale),
                ))
            }
        };

        self.cache_document(generation, locale, Arc::clone(&document));
        Ok(document)
    }

    /// Resolve the translations for one page.
    ///
    /// For the `general` section the result holds `general` and the page
    /// from `pages`. For any other section it also holds the full subject
    /// entry and the page from that subject's `pages`. Absent keys come back
    /// as empty mappings.
    pub fn get(
        &self,
        section: &str,
        page: &str,
        locale: &str,
    ) -> Result<Arc<PageTranslations>, TranslationError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let key = (section.to_string(), page.to_string(), locale.to_string());
        if let Some(cached) = lock(&self.pages).get(&key) {
            self.metrics.record_page_hit();
            return Ok(cached);
        }
        self.metrics.record_page_miss();

        let document = self.load(locale)?;
        let translations = if section == GENERAL_SECTION {
            PageTranslations {
                general: document.general.clone(),
                subject: None,
                page: document.general_page(page),
            }
        } else {
            PageTranslations {
                general: document.general.clone(),
                subject: Some(document.subject(section)),
                page: document.subject_page(section, page),
            }
        };

        let translations = Arc::new(translations);
        self.cache_page(generation, key, Arc::clone(&translations));
        Ok(translations)
    }

    fn cache_document(&self, generation: u64, locale: &str, document: Arc<TranslationDocument>) {
        let mut documents = lock(&self.documents);
        if self.generation.load(Ordering::SeqCst) == generation {
            documents.insert(locale.to_string(), document);
        }
    }

    fn cache_page(&self, generation: u64, key: PageKey, translations: Arc<PageTranslations>) {
        let mut pages = lock(&self.pages);
        if self.generation.load(Ordering::SeqCst) == generation {
            pages.insert(key, translations);
        }
    }

    /// Subjects announced as "coming soon" for a locale.
    pub fn coming_soon(&self, locale: &str) -> Result<Map<String, Value>, TranslationError> {
        Ok(self.load(locale)?.coming_soon.clone())
    }

    fn locale_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{locale}.json"))
    }

    /// Read one locale file. `Ok(None)` means the file does not exist.
    fn read_document(&self, locale: &str) -> Result<Option<TranslationDocument>, TranslationError> {
        if !is_safe_locale(locale) {
            debug!("Rejecting locale tag {:?}", locale);
            return Ok(None);
        }

        let path = self.locale_path(locale);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(TranslationError::Io { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| TranslationError::Malformed { path, source })
    }
}

/// A locale tag must name a file directly inside the translations directory.
fn is_safe_locale(locale: &str) -> bool {
    !locale.is_empty() && !locale.contains(['/', '\\']) && !locale.contains("..")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
