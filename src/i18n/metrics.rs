//! Translation cache metrics.
//!
//! Each `TranslationStore` owns one `CacheMetrics`, so counters reflect a
//! single store and reset when the store is rebuilt.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for translation cache activity.
///
/// All counters use relaxed atomics; a report is a best-effort snapshot.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Locale documents served from the document cache
    document_hits: AtomicUsize,

    /// Locale documents read from disk
    document_misses: AtomicUsize,

    /// Page lookups served from the page cache
    page_hits: AtomicUsize,

    /// Page lookups that had to be assembled
    page_misses: AtomicUsize,

    /// Loads that fell back to the default locale
    locale_fallbacks: AtomicUsize,

    /// Explicit cache reloads
    reloads: AtomicUsize,
}

impl CacheMetrics {
    /// Create a set of counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document served from the document cache.
    pub fn record_document_hit(&self) {
        self.document_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document read from disk.
    pub fn record_document_miss(&self) {
        self.document_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a page lookup served from the page cache.
    pub fn record_page_hit(&self) {
        self.page_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a page lookup that had to be assembled.
    pub fn record_page_miss(&self) {
        self.page_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a load answered with the default locale.
    pub fn record_locale_fallback(&self) {
        self.locale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current locale fallback count.
    pub fn locale_fallbacks(&self) -> usize {
        self.locale_fallbacks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    ///
    /// # Returns
    /// A snapshot of every counter plus document and page hit rates as
    /// percentages (0-100).
    pub fn report(&self) -> MetricsReport {
        let document_hits = self.document_hits.load(Ordering::Relaxed);
        let document_misses = self.document_misses.load(Ordering::Relaxed);
        let page_hits = self.page_hits.load(Ordering::Relaxed);
        let page_misses = self.page_misses.load(Ordering::Relaxed);

        MetricsReport {
            document_hits,
            document_misses,
            document_hit_rate: hit_rate(document_hits, document_misses),
            page_hits,
            page_misses,
            page_hit_rate: hit_rate(page_hits, page_misses),
            locale_fallbacks: self.locale_fallbacks(),
            reloads: self.reloads.load(Ordering::Relaxed),
        }
    }
}

/// Hit rate as a percentage (0-100); zero when nothing was queried.
fn hit_rate(hits: usize, misses: usize) -> f64 {
    let total = hits + misses;
    if total > 0 {
        (hits as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Snapshot of cache counters, serialized on the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub document_hits: usize,
    pub document_misses: usize,

    /// Document cache hit rate as a percentage (0-100)
    pub document_hit_rate: f64,
    pub page_hits: usize,
    pub page_misses: usize,

    /// Page cache hit rate as a percentage (0-100)
    pub page_hit_rate: f64,
    pub locale_fallbacks: usize,
    pub reloads: usize,
}
