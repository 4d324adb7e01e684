//! HTML page shells.
//!
//! Pages are rendered server-side as a thin shell; the page scripts read
//! their text from `window.translations`, which holds the page's
//! `PageTranslations` as JSON.

use crate::i18n::{Locale, LocaleRegistry};
use crate::translations::PageTranslations;
use serde_json::{Map, Value};

const FALLBACK_TITLE: &str = "Estatística";

/// Everything needed to render one page.
#[derive(Debug)]
pub struct PageView<'a> {
    pub locale: Locale,

    /// Page identifier, exposed as `data-page` (e.g., "home", "probabilidade/quiz")
    pub page_id: String,

    pub translations: &'a PageTranslations,

    /// Subject whose quiz container the page should include
    pub quiz_subject: Option<&'a str>,

    /// Subjects announced as coming soon (home page only)
    pub coming_soon: Option<&'a Map<String, Value>>,

    /// Script under `/static/js/` loaded after the translations
    pub script: Option<String>,
}

impl<'a> PageView<'a> {
    pub fn new(locale: Locale, page_id: impl Into<String>, translations: &'a PageTranslations) -> Self {
        Self {
            locale,
            page_id: page_id.into(),
            translations,
            quiz_subject: None,
            coming_soon: None,
            script: None,
        }
    }

    /// Page title: the page's own title, else the subject name, else the site name.
    pub fn title(&self) -> &str {
        self.translations
            .page_text("title")
            .or_else(|| self.translations.subject_text("name"))
            .or_else(|| self.translations.general_text("site_name"))
            .unwrap_or(FALLBACK_TITLE)
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Serialize a value for embedding inside a `<script>` element.
///
/// `<` only occurs inside JSON strings, where `\u003c` is equivalent, so
/// the output can never close the script element.
fn script_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c")
}

fn language_switcher(current: Locale) -> String {
    let links: Vec<String> = LocaleRegistry::get()
        .list_enabled()
        .into_iter()
        .map(|locale| {
            let class = if locale.code == current.code() {
                " class=\"active\""
            } else {
                ""
            };
            format!(
                "<a href=\"/set_language/{}\" title=\"{}\"{}>{}</a>",
                locale.code,
                escape_html(locale.name),
                class,
                escape_html(locale.native_name)
            )
        })
        .collect();
    format!("<nav class=\"language-switcher\">{}</nav>", links.join(""))
}

fn coming_soon_list(subjects: &Map<String, Value>) -> String {
    if subjects.is_empty() {
        return String::new();
    }

    let items: String = subjects
        .iter()
        .map(|(id, subject)| {
            let name = subject.get("name").and_then(Value::as_str).unwrap_or(id);
            format!("<li data-subject=\"{}\">{}</li>", escape_html(id), escape_html(name))
        })
        .collect();
    format!("<ul class=\"coming-soon\">{items}</ul>")
}

/// Render a full HTML document.
pub fn render_page(view: &PageView<'_>) -> String {
    let translations = view.translations;
    let mut main = format!("<h1>{}</h1>", escape_html(view.title()));

    if let Some(description) = translations.page_text("description") {
        main.push_str(&format!("<p class=\"lead\">{}</p>", escape_html(description)));
    }
    if let Some(subject) = view.quiz_subject {
        main.push_str(&format!(
            "<div class=\"quiz-container\" data-quiz-type=\"{}\"></div>",
            escape_html(subject)
        ));
    }
    if let Some(coming_soon) = view.coming_soon {
        main.push_str(&coming_soon_list(coming_soon));
    }

    let script = view
        .script
        .as_ref()
        .map(|path| format!("<script src=\"/static/js/{}\"></script>", escape_html(path)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"{lang}\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/css/style.css\">\n\
         </head>\n\
         <body data-page=\"{page}\" data-locale=\"{locale}\">\n\
         {switcher}\n\
         <main>{main}</main>\n\
         <script>window.translations = {translations};</script>\n\
         {script}\n\
         </body>\n\
         </html>\n",
        lang = view.locale.html_lang(),
        title = escape_html(view.title()),
        page = escape_html(&view.page_id),
        locale = view.locale.code(),
        switcher = language_switcher(view.locale),
        main = main,
        translations = script_json(translations),
        script = script,
    )
}
