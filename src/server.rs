//! HTTP surface: page routes, the quiz API and the language switch.

use crate::config::Config;
use crate::i18n::Locale;
use crate::quiz::{QuizError, QuizResolver, ResolvedQuiz};
use crate::render::{escape_html, render_page, PageView};
use crate::security::bearer_matches;
use crate::site::{find_subject, SUBJECT_INDEX_PAGE};
use crate::translations::{TranslationError, TranslationStore, GENERAL_SECTION};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name of the cookie holding the visitor's locale.
pub const LOCALE_COOKIE: &str = "locale";

/// Translation page key for the not-found page.
const NOT_FOUND_PAGE: &str = "404";

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub translations: Arc<TranslationStore>,
    pub quizzes: Arc<QuizResolver>,
    pub admin_api_key: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Open the translation store and quiz resolver described by `config`.
    ///
    /// Fails when the default locale's translation file is missing.
    pub fn from_config(config: &Config) -> Result<Self, TranslationError> {
        let translations = TranslationStore::open(
            &config.translations_dir,
            config.document_cache_capacity,
            config.page_cache_capacity,
        )?;

        Ok(Self {
            translations: Arc::new(translations),
            quizzes: Arc::new(QuizResolver::new(&config.quizzes_dir)),
            admin_api_key: config.admin_api_key.clone(),
            started_at: Utc::now(),
        })
    }
}

/// Build the axum router. Static files are served when `static_dir` is given.
pub fn build_router(state: AppState, static_dir: Option<&std::path::Path>) -> Router {
    let mut router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/quizzes", get(list_quizzes))
        .route("/api/quiz/:subject", get(quiz))
        .route("/api/translations/reload", post(reload_translations))
        .route("/set_language/:locale", get(set_language))
        .route("/:subject", get(subject_page))
        .route("/:subject/:feature", get(feature_page));

    if let Some(dir) = static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start serving until the process is stopped.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, Some(config.static_dir.as_path()));
    let addr = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Locale from the session cookie; absent or unsupported means the default.
pub fn session_locale(headers: &HeaderMap) -> Locale {
    let code = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == LOCALE_COOKIE)
        .map(|(_, value)| value.trim());

    Locale::from_code_or_default(code)
}

/// Local path to return to after switching language.
///
/// Only the path of the `Referer` is kept so the redirect never leaves the site.
fn redirect_target(headers: &HeaderMap) -> String {
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let path = match referer.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|start| &rest[start..]).unwrap_or("/"),
        None => referer,
    };

    if path.starts_with('/') && !path.starts_with("//") {
        path.to_string()
    } else {
        "/".to_string()
    }
}

fn render(view: &PageView<'_>, status: StatusCode) -> Response {
    (status, Html(render_page(view))).into_response()
}

/// 500 page carrying the error message.
fn internal_error(err: &TranslationError) -> Response {
    error!("Failed to load translations: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("<h1>500</h1><pre>{}</pre>", escape_html(&err.to_string()))),
    )
        .into_response()
}

fn not_found(state: &AppState, locale: Locale) -> Response {
    match state
        .translations
        .get(GENERAL_SECTION, NOT_FOUND_PAGE, locale.code())
    {
        Ok(translations) => {
            let view = PageView::new(locale, NOT_FOUND_PAGE, &translations);
            render(&view, StatusCode::NOT_FOUND)
        }
        Err(e) => internal_error(&e),
    }
}

/// `GET /`: home page with the coming-soon subjects.
async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let locale = session_locale(&headers);
    let store = &state.translations;

    let page = store.get(GENERAL_SECTION, "home", locale.code());
    let coming_soon = store.coming_soon(locale.code());
    match (page, coming_soon) {
        (Ok(translations), Ok(coming_soon)) => {
            let mut view = PageView::new(locale, "home", &translations);
            view.coming_soon = Some(&coming_soon);
            view.script = Some("general/homepage.js".to_string());
            render(&view, StatusCode::OK)
        }
        (Err(e), _) | (_, Err(e)) => internal_error(&e),
    }
}

/// `GET /{subject}`: subject landing page.
async fn subject_page(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    headers: HeaderMap,
) -> Response {
    let locale = session_locale(&headers);
    let Some(subject) = find_subject(&subject) else {
        return not_found(&state, locale);
    };

    match state
        .translations
        .get(subject.id, SUBJECT_INDEX_PAGE, locale.code())
    {
        Ok(translations) => {
            let mut view = PageView::new(locale, subject.id, &translations);
            view.script = Some(format!("subjects/{}/script.js", subject.id));
            render(&view, StatusCode::OK)
        }
        Err(e) => internal_error(&e),
    }
}

/// `GET /{subject}/{feature}`: feature page within a subject.
async fn feature_page(
    State(state): State<AppState>,
    Path((subject, feature)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let locale = session_locale(&headers);
    let Some(subject) = find_subject(&subject).filter(|s| s.has_feature(&feature)) else {
        return not_found(&state, locale);
    };

    match state.translations.get(subject.id, &feature, locale.code()) {
        Ok(translations) => {
            let mut view = PageView::new(locale, format!("{}/{}", subject.id, feature), &translations);
            if feature == "quiz" {
                view.quiz_subject = Some(subject.id);
                view.script = Some("subjects/quiz-unified.js".to_string());
            } else {
                view.script = Some(format!("subjects/{}/{}.js", subject.id, feature));
            }
            render(&view, StatusCode::OK)
        }
        Err(e) => internal_error(&e),
    }
}

/// Anything unmatched renders the not-found page.
async fn fallback(State(state): State<AppState>, headers: HeaderMap) -> Response {
    not_found(&state, session_locale(&headers))
}

fn quiz_error_response(subject: &str, err: QuizError) -> (StatusCode, Json<Value>) {
    if err.is_not_found() {
        warn!("Quiz not found: {}", subject);
        (StatusCode::NOT_FOUND, Json(json!({"error": "Quiz not found"})))
    } else {
        error!("Failed to load quiz {}: {}", subject, err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": err.to_string()})),
        )
    }
}

/// `GET /api/quiz/{subject}`: quiz in the session locale.
async fn quiz(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ResolvedQuiz>, (StatusCode, Json<Value>)> {
    let locale = session_locale(&headers);
    state
        .quizzes
        .resolve(&subject, locale)
        .map(Json)
        .map_err(|e| quiz_error_response(&subject, e))
}

/// `GET /api/quizzes`: every subject with a quiz file.
async fn list_quizzes(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let quizzes = state
        .quizzes
        .list()
        .map_err(|e| quiz_error_response("*", e))?;
    Ok(Json(json!({ "quizzes": quizzes })))
}

/// `GET /set_language/{locale}`: store the locale cookie and go back.
///
/// Unsupported locales leave the cookie untouched.
async fn set_language(Path(locale): Path<String>, headers: HeaderMap) -> Response {
    let redirect = Redirect::to(&redirect_target(&headers));

    match Locale::from_code(&locale) {
        Ok(locale) => {
            info!("Switching language to {}", locale);
            let cookie = format!(
                "{}={}; Path=/; Max-Age=31536000; SameSite=Lax",
                LOCALE_COOKIE,
                locale.code()
            );
            ([(header::SET_COOKIE, cookie)], redirect).into_response()
        }
        Err(e) => {
            warn!("Ignoring language switch: {}", e);
            redirect.into_response()
        }
    }
}

/// `GET /health`: liveness plus translation cache counters.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
        "locales": state.translations.available_locales(),
        "cache": state.translations.metrics().report(),
    }))
}

/// `POST /api/translations/reload`: drop the translation caches.
///
/// Requires `Authorization: Bearer <ADMIN_API_KEY>`; disabled without a key.
async fn reload_translations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(key) = state.admin_api_key.as_deref() else {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "reload endpoint disabled"})),
        ));
    };

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if !bearer_matches(authorization, key) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        ));
    }

    match state.translations.reload() {
        Ok(locales) => Ok(Json(json!({"status": "reloaded", "locales": locales}))),
        Err(e) => {
            error!("Translation reload failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}
