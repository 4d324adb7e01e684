//! Internationalization (i18n) support.
//!
//! # Architecture
//!
//! - `registry`: the locales the site serves and which one is the fallback
//! - `locale`: validated `Locale` type used by handlers and the stores
//! - `metrics`: translation cache counters
//!
//! # Example
//!
//! ```rust,ignore
//! use stats_learning_site::i18n::{Locale, LocaleRegistry};
//!
//! let english = Locale::from_code("en_US")?;
//! assert_eq!(english.quiz_language(), "en");
//!
//! let locales = LocaleRegistry::get().list_enabled();
//! ```

mod locale;
mod metrics;
mod registry;

pub use locale::Locale;
pub use metrics::{CacheMetrics, MetricsReport};
pub use registry::{LocaleConfig, LocaleRegistry};
