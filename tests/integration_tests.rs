//! Integration tests for the statistics learning site
//!
//! These tests build the full router over fixture translation and quiz
//! directories and drive it with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use stats_learning_site::audio::AudioCatalog;
use stats_learning_site::quiz::QuizResolver;
use stats_learning_site::server::{build_router, AppState};
use stats_learning_site::site::SUBJECTS;
use stats_learning_site::translations::TranslationStore;

// ==================== Test Helpers ====================

struct Fixture {
    dir: TempDir,
    app: Router,
    state: AppState,
}

fn write_json(path: std::path::PathBuf, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn portuguese() -> Value {
    json!({
        "general": {"site_name": "Estatística", "home": "Início"},
        "pages": {
            "home": {"title": "Bem-vindo", "description": "Aprenda estatística"},
            "404": {"title": "Página não encontrada"}
        },
        "subjects": {
            "probabilidade": {
                "name": "Probabilidade",
                "pages": {
                    "index": {"title": "Probabilidade"},
                    "calculator": {"title": "Calculadora"},
                    "quiz": {"title": "Quiz"},
                    "podcasts": {
                        "title": "Podcasts",
                        "episodes": {"1": {"title": "Estatística Descritiva"}}
                    }
                }
            }
        },
        "coming_soon": {"inferencia": {"name": "Inferência"}}
    })
}

fn english() -> Value {
    json!({
        "general": {"site_name": "Statistics", "home": "Home"},
        "pages": {
            "home": {"title": "Welcome"},
            "404": {"title": "Page not found"}
        },
        "subjects": {
            "probabilidade": {
                "name": "Probability",
                "pages": {"quiz": {"title": "Probability Quiz"}}
            }
        }
    })
}

fn translated_quiz() -> Value {
    json!({
        "name": {"pt": "Quiz de Probabilidade", "en": "Probability Quiz"},
        "description": {"pt": "Teste", "en": "Test"},
        "questions": [{
            "question": {"pt": "Qual?", "en": "Which?"},
            "options": [{"pt": "Sim", "en": "Yes"}, {"pt": "Não"}],
            "correctAnswer": 0,
            "explanation": {"pt": "Porque"}
        }]
    })
}

fn legacy_quiz() -> Value {
    json!({
        "name": "Análise Estatística",
        "description": "Quiz",
        "questions": [{
            "question": "Média?",
            "options": ["A", "B"],
            "correctAnswer": 1,
            "explanation": "B"
        }]
    })
}

fn fixture_with(admin_api_key: Option<&str>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let translations = dir.path().join("translations");
    let quizzes = dir.path().join("quizzes");
    std::fs::create_dir_all(&translations).unwrap();
    std::fs::create_dir_all(&quizzes).unwrap();

    write_json(translations.join("pt_PT.json"), &portuguese());
    write_json(translations.join("en_US.json"), &english());
    write_json(quizzes.join("probabilidade_quiz_translated.json"), &translated_quiz());
    write_json(quizzes.join("analise_estatistica_quiz.json"), &legacy_quiz());

    let state = AppState {
        translations: Arc::new(TranslationStore::open(&translations, 16, 32).unwrap()),
        quizzes: Arc::new(QuizResolver::new(&quizzes)),
        admin_api_key: admin_api_key.map(str::to_string),
        started_at: Utc::now(),
    };
    let app = build_router(state.clone(), None);

    Fixture { dir, app, state }
}

fn fixture() -> Fixture {
    fixture_with(None)
}

fn get(uri: &str, locale: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(locale) = locale {
        builder = builder.header(header::COOKIE, format!("locale={locale}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(resp: axum::http::Response<Body>) -> String {
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(resp: axum::http::Response<Body>) -> Value {
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ==================== Page Tests ====================

#[tokio::test]
async fn test_home_renders_in_default_locale() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("<title>Bem-vindo</title>"));
    assert!(html.contains("Inferência"));
}

#[tokio::test]
async fn test_home_follows_locale_cookie() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/", Some("en_US"))).await.unwrap();

    let html = body_text(resp).await;
    assert!(html.contains("<title>Welcome</title>"));
    assert!(html.contains("lang=\"en-US\""));
}

#[tokio::test]
async fn test_locale_without_file_uses_default_translations() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/", Some("es_ES"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("<title>Bem-vindo</title>"));
    assert!(html.contains("lang=\"es-ES\""));
}

#[tokio::test]
async fn test_every_registered_feature_returns_200() {
    let fx = fixture();

    for subject in SUBJECTS {
        for feature in subject.features {
            let uri = format!("/{}/{}", subject.id, feature);
            let resp = fx.app.clone().oneshot(get(&uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        }

        let uri = format!("/{}", subject.id);
        let resp = fx.app.clone().oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn test_quiz_page_includes_quiz_container() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/probabilidade/quiz", Some("en_US"))).await.unwrap();

    let html = body_text(resp).await;
    assert!(html.contains("<title>Probability Quiz</title>"));
    assert!(html.contains("data-quiz-type=\"probabilidade\""));
}

#[tokio::test]
async fn test_unknown_subject_returns_translated_404() {
    let fx = fixture();
    let resp = fx.app.clone().oneshot(get("/geometria", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let html = body_text(resp).await;
    assert!(html.contains("Página não encontrada"));
    assert!(html.contains("window.translations"));

    let resp = fx.app.oneshot(get("/geometria", Some("en_US"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Page not found"));
}

#[tokio::test]
async fn test_unknown_feature_returns_404() {
    let fx = fixture();

    let resp = fx.app.clone().oneshot(get("/probabilidade/game", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = fx.app.clone().oneshot(get("/analise_estatistica/podcasts", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = fx.app.oneshot(get("/a/b/c", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ==================== Quiz API Tests ====================

#[tokio::test]
async fn test_quiz_api_extracts_english() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/api/quiz/probabilidade", Some("en_US"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["name"], "Probability Quiz");
    assert_eq!(json["questions"][0]["question"], "Which?");
    // Option without English text falls back to Portuguese
    assert_eq!(json["questions"][0]["options"], json!(["Yes", "Não"]));
    assert_eq!(json["questions"][0]["explanation"], "Porque");
    assert_eq!(json["questions"][0]["correctAnswer"], 0);
}

#[tokio::test]
async fn test_quiz_api_defaults_to_portuguese() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/api/quiz/probabilidade", None)).await.unwrap();

    let json = body_json(resp).await;
    assert_eq!(json["name"], "Quiz de Probabilidade");
    assert_eq!(json["questions"][0]["options"], json!(["Sim", "Não"]));
}

#[tokio::test]
async fn test_quiz_api_passes_legacy_through() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/api/quiz/analise_estatistica", Some("en_US"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, legacy_quiz());
}

#[tokio::test]
async fn test_quiz_api_unknown_subject_is_404() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/api/quiz/geometria", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Quiz not found");
}

#[tokio::test]
async fn test_quiz_api_malformed_file_is_500_with_message() {
    let fx = fixture();
    std::fs::write(
        fx.dir.path().join("quizzes").join("broken_quiz.json"),
        "{\"questions\": [",
    )
    .unwrap();

    let resp = fx.app.oneshot(get("/api/quiz/broken", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("broken_quiz.json"));
}

#[tokio::test]
async fn test_quiz_listing() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/api/quizzes", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(
        json["quizzes"],
        json!([
            {"subject": "analise_estatistica", "legacy": true, "translated": false},
            {"subject": "probabilidade", "legacy": false, "translated": true}
        ])
    );
}

// ==================== Language Switch Tests ====================

#[tokio::test]
async fn test_set_language_sets_cookie_and_redirects_back() {
    let fx = fixture();
    let req = Request::get("/set_language/en_US")
        .header(header::REFERER, "http://localhost:5051/probabilidade/podcasts")
        .body(Body::empty())
        .unwrap();
    let resp = fx.app.oneshot(req).await.unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[header::LOCATION], "/probabilidade/podcasts");
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("locale=en_US;"));
}

#[tokio::test]
async fn test_set_language_rejects_unsupported_locale() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/set_language/fr_FR", None)).await.unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[header::LOCATION], "/");
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

// ==================== Health and Reload Tests ====================

#[tokio::test]
async fn test_health_reports_locales_and_cache() {
    let fx = fixture();
    let resp = fx.app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["locales"], json!(["en_US", "pt_PT"]));
    assert!(json["cache"]["document_misses"].as_u64().unwrap() >= 2);
}

fn reload_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/translations/reload");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_reload_disabled_without_admin_key() {
    let fx = fixture();
    let resp = fx.app.oneshot(reload_request(Some("anything"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reload_requires_valid_token() {
    let fx = fixture_with(Some("s3cret"));

    let resp = fx.app.clone().oneshot(reload_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = fx.app.oneshot(reload_request(Some("wrong"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reload_picks_up_changed_translations() {
    let fx = fixture_with(Some("s3cret"));

    let resp = fx.app.clone().oneshot(get("/", None)).await.unwrap();
    assert!(body_text(resp).await.contains("<title>Bem-vindo</title>"));

    let mut changed = portuguese();
    changed["pages"]["home"]["title"] = json!("Olá de novo");
    write_json(fx.dir.path().join("translations").join("pt_PT.json"), &changed);

    let resp = fx.app.clone().oneshot(reload_request(Some("s3cret"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "reloaded");

    let resp = fx.app.oneshot(get("/", None)).await.unwrap();
    assert!(body_text(resp).await.contains("<title>Olá de novo</title>"));
    assert_eq!(fx.state.translations.metrics().report().reloads, 1);
}

#[tokio::test]
async fn test_reload_skips_malformed_secondary_locale() {
    let fx = fixture_with(Some("s3cret"));
    std::fs::write(
        fx.dir.path().join("translations").join("es_ES.json"),
        "{ broken",
    )
    .unwrap();

    let resp = fx.app.clone().oneshot(reload_request(Some("s3cret"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["locales"], json!(["en_US", "pt_PT"]));

    let resp = fx.app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ==================== Static Files ====================

#[tokio::test]
async fn test_static_files_are_served_when_mounted() {
    let fx = fixture();
    let static_dir = fx.dir.path().join("static");
    std::fs::create_dir_all(static_dir.join("js")).unwrap();
    std::fs::write(static_dir.join("js").join("app.js"), "console.log('ok');").unwrap();
    let app = build_router(fx.state.clone(), Some(static_dir.as_path()));

    let resp = app.clone().oneshot(get("/static/js/app.js", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "console.log('ok');");

    let resp = app.oneshot(get("/static/js/missing.js", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ==================== Offline Audio Update ====================

#[test]
fn test_audio_update_is_idempotent_on_translation_files() {
    let dir = TempDir::new().unwrap();
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("Estatística Descritiva.wav"), b"RIFF").unwrap();
    std::fs::write(assets.join("Estatística Descritiva_en_US.wav"), b"RIFF").unwrap();

    let path = dir.path().join("pt_PT.json");
    write_json(path.clone(), &portuguese());

    let catalog = AudioCatalog::scan(&assets).unwrap();
    let first = catalog.update_translation_file(&path, "pt_PT").unwrap();
    assert!(first.changed);

    let updated: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let episode = &updated["subjects"]["probabilidade"]["pages"]["podcasts"]["episodes"]["1"];
    assert_eq!(episode["available"], true);
    assert_eq!(episode["audio"], "Estatística Descritiva.wav");

    let again: Value = {
        let outcome = catalog.update_translation_file(&path, "pt_PT").unwrap();
        assert!(!outcome.changed);
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap()
    };
    assert_eq!(again, updated);
}
