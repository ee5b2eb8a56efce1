mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::{spawn_greedy_test_app, spawn_test_app, spawn_test_app_with_base_url};
use common::auth::auth_headers_for;
use common::fixtures::seed_beginner_words;
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};

const BEGINNER_WORDS: [&str; 4] = ["sol", "mar", "casa", "rua"];

#[tokio::test]
async fn it_exercise_routes_require_bearer_token() {
    let app = spawn_test_app().await;

    for (method, path) in [
        (Method::GET, "/api/exercises/next"),
        (Method::POST, "/api/exercises/submit"),
        (Method::GET, "/api/progress/report"),
        (Method::GET, "/api/words/casa"),
    ] {
        let resp = request(&app.app, method, path, None, &[]).await;
        let (status, _, body) = response_json(resp).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_json_error(&body, "AUTH_UNAUTHORIZED");
    }

    let bad = vec![("authorization", "Bearer not-a-jwt".to_string())];
    let resp = request(&app.app, Method::GET, "/api/exercises/next", None, &bad).await;
    let (status, _, _) = response_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_next_exercise_with_empty_store_returns_no_candidate() {
    let app = spawn_test_app().await;
    let headers = auth_headers_for(&app, "learner-empty");

    let resp = request(&app.app, Method::GET, "/api/exercises/next", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert!(body["data"]["candidate"].is_null());
    assert!(body["data"]["mode"].is_null());
    assert_eq!(body["data"]["candidatesConsidered"], 0);
    assert!(body["data"]["message"].as_str().unwrap().contains("Nenhuma palavra"));
}

#[tokio::test]
async fn it_full_practice_cycle_updates_progress_and_report() {
    let app = spawn_greedy_test_app().await;
    seed_beginner_words(&app.store);
    let headers = auth_headers_for(&app, "learner-1");

    let resp = request(&app.app, Method::GET, "/api/exercises/next", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    let candidate = &body["data"]["candidate"];
    let word = candidate["wordText"].as_str().unwrap().to_string();
    let exercise_type = candidate["exerciseType"].as_str().unwrap().to_string();
    assert!(BEGINNER_WORDS.contains(&word.as_str()));
    assert_eq!(body["data"]["mode"], "exploit");
    let considered = body["data"]["candidatesConsidered"].as_u64().unwrap();
    assert_eq!(considered, 20);

    let resp = request(
        &app.app,
        Method::POST,
        "/api/exercises/submit",
        Some(json!({
            "wordText": word,
            "exerciseType": exercise_type,
            "accuracy": 1.0,
            "timeTakenSeconds": 12.0
        })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["progress"]["totalAttempts"], 1);
    assert_eq!(body["data"]["progress"]["correctAttempts"], 1);
    assert!(body["data"]["cognitiveState"]["vocabularAbility"].as_f64().unwrap() > 0.0);

    let resp = request(&app.app, Method::GET, "/api/progress/report", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["uniqueWordsAttempted"], 1);
    assert_eq!(body["data"]["totalAttempts"], 1);
    assert_eq!(body["data"]["overallAccuracy"], 1.0);
    assert_eq!(body["data"]["averageTimeSeconds"], 12.0);
    assert_eq!(body["data"]["trend"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn it_progress_is_isolated_per_user() {
    let app = spawn_greedy_test_app().await;
    seed_beginner_words(&app.store);
    let alice = auth_headers_for(&app, "alice");
    let bob = auth_headers_for(&app, "bob");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/exercises/submit",
        Some(json!({
            "wordText": "casa",
            "exerciseType": "dictation",
            "accuracy": 0.0,
            "timeTakenSeconds": 30.0
        })),
        &alice,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = request(&app.app, Method::GET, "/api/progress/report", None, &bob).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["totalAttempts"], 0);
    assert!(body["data"]["trend"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn it_submit_rejects_invalid_payloads() {
    let app = spawn_test_app().await;
    let headers = auth_headers_for(&app, "learner-2");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/exercises/submit",
        Some(json!({
            "wordText": "casa",
            "exerciseType": "dictation",
            "accuracy": 1.5,
            "timeTakenSeconds": 10.0
        })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_SUBMISSION");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/exercises/submit",
        Some(json!({
            "wordText": "c4sa",
            "exerciseType": "dictation",
            "accuracy": 1.0,
            "timeTakenSeconds": 10.0
        })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_WORD");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/exercises/submit",
        Some(json!({
            "wordText": "casa",
            "exerciseType": "crossword",
            "accuracy": 1.0,
            "timeTakenSeconds": 10.0
        })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn it_master_word_ingestion_stores_valid_and_reports_rejected() {
    let app = spawn_test_app().await;
    let headers = auth_headers_for(&app, "curator");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/words/master",
        Some(json!({
            "words": [
                { "text": "Saudade", "definition": "Sentimento de falta de algo ou alguém." },
                { "text": "x1" }
            ]
        })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let stored = body["data"]["stored"].as_array().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["text"], "saudade");
    assert_eq!(body["data"]["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["rejected"][0]["text"], "x1");
    assert_eq!(app.store.count_master_words(), 1);

    let resp = request(
        &app.app,
        Method::POST,
        "/api/words/master",
        Some(json!({ "words": [] })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "EMPTY_BATCH");

    let too_many: Vec<_> = (0..101).map(|_| json!({ "text": "casa" })).collect();
    let resp = request(
        &app.app,
        Method::POST,
        "/api/words/master",
        Some(json!({ "words": too_many })),
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_json_error(&body, "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn it_word_info_degrades_offline_and_hits_cache() {
    let app = spawn_test_app_with_base_url("https://vocab.example.com").await;
    let headers = auth_headers_for(&app, "reader");

    let resp = request(&app.app, Method::GET, "/api/words/Casa", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    let data = &body["data"];
    assert_eq!(data["text"], "casa");
    assert_eq!(data["definition"], "Definição não disponível.");
    assert!(data["imageUrl"].is_null());
    assert!(data["audioUrl"].is_null());
    assert_eq!(data["processingMetadata"]["cacheHit"], false);
    assert_eq!(data["processingMetadata"]["complexityMethod"], "heuristic_analysis");
    let score = data["inferredComplexityScore"].as_f64().unwrap();
    assert!((0.0..=10.0).contains(&score));

    let resp = request(&app.app, Method::GET, "/api/words/casa", None, &headers).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"]["processingMetadata"]["cacheHit"], true);

    let resp = request(&app.app, Method::GET, "/api/words/casa1", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_WORD");
}

#[tokio::test]
async fn it_exercise_content_routes_build_each_format() {
    let app = spawn_test_app().await;
    let headers = auth_headers_for(&app, "learner-content");

    let resp = request(
        &app.app,
        Method::POST,
        "/api/words/master",
        Some(json!({
            "words": [
                { "text": "saudade", "definition": "Sentimento de falta." },
                { "text": "sol", "definition": "Astro que ilumina a Terra." },
                { "text": "mar", "definition": "Grande massa de água salgada." },
                { "text": "rua", "definition": "Via pública urbana." }
            ]
        })),
        &headers,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = request(
        &app.app,
        Method::GET,
        "/api/exercises/multiple_choice/Saudade",
        None,
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["targetWordText"], "saudade");
    let options = body["data"]["options"].as_array().unwrap();
    assert_eq!(options.len(), 4);
    let correct: Vec<_> = options
        .iter()
        .filter(|o| o["wordText"] == "saudade")
        .collect();
    assert_eq!(correct.len(), 1);
    assert_eq!(correct[0]["definition"], "Sentimento de falta.");

    // 离线模式：无图片，未入库单词无释义
    for path in [
        "/api/exercises/multiple_choice_image/saudade",
        "/api/exercises/multiple_choice/janela",
    ] {
        let resp = request(&app.app, Method::GET, path, None, &headers).await;
        let (status, _, body) = response_json(resp).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_json_error(&body, "NOT_FOUND");
    }

    let resp = request(&app.app, Method::GET, "/api/exercises/define_word/janela", None, &headers).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["targetWordText"], "janela");
    assert_eq!(body["data"]["message"], "Forneça a definição da palavra.");

    let resp = request(
        &app.app,
        Method::GET,
        "/api/exercises/complete_sentence/janela",
        None,
        &headers,
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert!(body["data"]["sentenceWithPlaceholder"]
        .as_str()
        .unwrap()
        .contains("[____]"));

    for path in [
        "/api/exercises/multiple_choice/c4sa",
        "/api/exercises/define_word/c4sa",
        "/api/exercises/complete_sentence/c4sa",
    ] {
        let resp = request(&app.app, Method::GET, path, None, &headers).await;
        let (status, _, body) = response_json(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_json_error(&body, "INVALID_WORD");
    }

    let resp = request(&app.app, Method::GET, "/api/exercises/define_word/casa", None, &[]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_health_endpoints_report_engine_and_store() {
    let app = spawn_test_app().await;
    seed_beginner_words(&app.store);

    let live = request(&app.app, Method::GET, "/health/live", None, &[]).await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = request(&app.app, Method::GET, "/health/ready", None, &[]).await;
    assert_eq!(ready.status(), StatusCode::OK);

    let resp = request(&app.app, Method::GET, "/health", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"]["masterWords"], 4);
    assert_eq!(body["engine"]["strategy"], "epsilon_greedy");
}

#[tokio::test]
async fn it_unknown_route_returns_json_404() {
    let app = spawn_test_app().await;
    let resp = request(&app.app, Method::GET, "/api/nope", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}
