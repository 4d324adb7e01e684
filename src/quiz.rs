//! Quiz file selection and per-language extraction.
//!
//! A subject may ship two quiz files in the quizzes directory:
//!
//! - `<subject>_quiz_translated.json`: text fields are maps from a
//!   two-letter language code to a string
//! - `<subject>_quiz.json`: legacy flat file with plain strings
//!
//! The translated file wins when both exist. Both formats are kept.

use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const TRANSLATED_SUFFIX: &str = "_quiz_translated.json";
const LEGACY_SUFFIX: &str = "_quiz.json";

/// Language read when a translated field lacks the requested one.
const FALLBACK_LANGUAGE: &str = "pt";

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Quiz not found for subject '{0}'")]
    NotFound(String),

    #[error("failed to read quiz file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid quiz file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("question {question} in {} has correctAnswer {answer} but only {options} options", .path.display())]
    AnswerOutOfRange {
        path: PathBuf,
        question: usize,
        answer: usize,
        options: usize,
    },
}

impl QuizError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QuizError::NotFound(_))
    }
}

/// A text field that is either a plain string or keyed by language code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    ByLanguage(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Text for `language`, else the Portuguese text, else an empty string.
    pub fn resolve(&self, language: &str) -> String {
        match self {
            LocalizedText::Plain(text) => text.clone(),
            LocalizedText::ByLanguage(texts) => texts
                .get(language)
                .or_else(|| texts.get(FALLBACK_LANGUAGE))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Default for LocalizedText {
    fn default() -> Self {
        LocalizedText::Plain(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatedQuiz {
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub questions: Vec<TranslatedQuestion>,

    /// Remaining top-level fields such as `questionsPerSession`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatedQuestion {
    pub question: LocalizedText,
    #[serde(default)]
    pub options: Vec<LocalizedText>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: LocalizedText,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TranslatedQuiz {
    /// Flatten every text field to a single language.
    pub fn localize(&self, language: &str) -> Quiz {
        Quiz {
            name: self.name.resolve(language),
            description: self.description.resolve(language),
            questions: self
                .questions
                .iter()
                .map(|question| Question {
                    question: question.question.resolve(language),
                    options: question
                        .options
                        .iter()
                        .map(|option| option.resolve(language))
                        .collect(),
                    correct_answer: question.correct_answer,
                    explanation: question.explanation.resolve(language),
                    extra: localize_fields(&question.extra, language),
                })
                .collect(),
            extra: localize_fields(&self.extra, language),
        }
    }
}

/// Flatten language maps among fields the quiz model does not name.
///
/// An object whose values are all strings is read as a language map. Lists
/// are flattened element-wise; every other value is kept as is.
fn localize_fields(fields: &Map<String, Value>, language: &str) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), localize_value(value, language)))
        .collect()
}

fn localize_value(value: &Value, language: &str) -> Value {
    match value {
        Value::Object(texts) if !texts.is_empty() && texts.values().all(Value::is_string) => {
            texts
                .get(language)
                .or_else(|| texts.get(FALLBACK_LANGUAGE))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| localize_value(item, language))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Quiz with every text field in one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    pub explanation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of resolving a quiz for one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedQuiz {
    /// Extracted from a translated file.
    Localized(Quiz),
    /// Flat document, passed through exactly as stored.
    Legacy(Value),
}

/// A subject with at least one quiz file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizEntry {
    pub subject: String,
    pub legacy: bool,
    pub translated: bool,
}

pub struct QuizResolver {
    dir: PathBuf,
}

impl QuizResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn translated_path(&self, subject: &str) -> PathBuf {
        self.dir.join(format!("{subject}{TRANSLATED_SUFFIX}"))
    }

    pub fn legacy_path(&self, subject: &str) -> PathBuf {
        self.dir.join(format!("{subject}{LEGACY_SUFFIX}"))
    }

    /// Resolve the quiz for `subject` in `locale`.
    ///
    /// The translated file is preferred over the legacy one. A document is
    /// treated as translated when its first question's `question` field is a
    /// mapping; anything else is returned unchanged.
    pub fn resolve(&self, subject: &str, locale: Locale) -> Result<ResolvedQuiz, QuizError> {
        if !is_safe_subject(subject) {
            return Err(QuizError::NotFound(subject.to_string()));
        }

        let path = [self.translated_path(subject), self.legacy_path(subject)]
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| QuizError::NotFound(subject.to_string()))?;
        debug!("Resolving quiz '{}' from {}", subject, path.display());

        let content = std::fs::read_to_string(&path).map_err(|source| QuizError::Io {
            path: path.clone(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&content).map_err(|source| QuizError::Malformed {
                path: path.clone(),
                source,
            })?;

        if !is_translated_shape(&document) {
            return Ok(ResolvedQuiz::Legacy(document));
        }

        let translated: TranslatedQuiz =
            serde_json::from_value(document).map_err(|source| QuizError::Malformed {
                path: path.clone(),
                source,
            })?;
        check_answers(&translated, &path)?;

        Ok(ResolvedQuiz::Localized(
            translated.localize(locale.quiz_language()),
        ))
    }

    /// Every subject with a quiz file, sorted by subject id.
    ///
    /// A missing quizzes directory yields an empty list.
    pub fn list(&self) -> Result<Vec<QuizEntry>, QuizError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Quizzes directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(QuizError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut subjects: HashMap<String, QuizEntry> = HashMap::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            let (subject, translated) = if let Some(subject) = file_name.strip_suffix(TRANSLATED_SUFFIX) {
                (subject, true)
            } else if let Some(subject) = file_name.strip_suffix(LEGACY_SUFFIX) {
                (subject, false)
            } else {
                continue;
            };
            if !is_safe_subject(subject) {
                continue;
            }

            let quiz = subjects
                .entry(subject.to_string())
                .or_insert_with(|| QuizEntry {
                    subject: subject.to_string(),
                    legacy: false,
                    translated: false,
                });
            if translated {
                quiz.translated = true;
            } else {
                quiz.legacy = true;
            }
        }

        let mut quizzes: Vec<QuizEntry> = subjects.into_values().collect();
        quizzes.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(quizzes)
    }
}

fn is_translated_shape(document: &Value) -> bool {
    document
        .get("questions")
        .and_then(|questions| questions.get(0))
        .and_then(|question| question.get("question"))
        .map(Value::is_object)
        .unwrap_or(false)
}

fn check_answers(quiz: &TranslatedQuiz, path: &Path) -> Result<(), QuizError> {
    for (index, question) in quiz.questions.iter().enumerate() {
        if question.correct_answer >= question.options.len() {
            return Err(QuizError::AnswerOutOfRange {
                path: path.to_path_buf(),
                question: index,
                answer: question.correct_answer,
                options: question.options.len(),
            });
        }
    }
    Ok(())
}

/// Subject ids are single path components made of letters, digits, `_` or `-`.
fn is_safe_subject(subject: &str) -> bool {
    !subject.is_empty()
        && subject
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
