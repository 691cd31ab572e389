//! End-to-end tutoring scenarios over the HTTP API.
//!
//! Most tests drive the router in-process with `oneshot`; the last ones bind
//! a real server on a free port and talk to it with `reqwest`.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use tutorin_orchestrator::{create_router, AppState, Config, HintSelector};
use tutorin_store::ProgressStore;

fn router_with(store: Arc<ProgressStore>) -> Router {
    create_router(AppState::new(Config::default(), store, HintSelector::default()))
}

fn memory_store() -> Arc<ProgressStore> {
    Arc::new(ProgressStore::open_in_memory().expect("in-memory store"))
}

/// Posts one turn and returns the JSON reply.
async fn solve(router: &Router, body: Value) -> Value {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/solve")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

async fn answer(router: &Router, id: &str, question: &str, last_answer: &str) -> Value {
    solve(
        router,
        json!({"exercise_id": id, "question": question, "last_answer": last_answer}),
    )
    .await
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_scenario_a_column_addition_to_done() {
    let router = router_with(memory_store());
    let question = "32458 + 6541";

    let first = answer(&router, "a", question, "").await;
    assert_eq!(first["status"], "ask");
    assert_eq!(first["expected_answer"], "9");

    let mut last = first;
    for (i, digit) in ["9", "9", "9", "8", "3"].into_iter().enumerate() {
        last = answer(&router, "a", question, digit).await;
        assert_eq!(last["step"], i + 1);
        assert_eq!(last["error_count"], 0);
        assert!(last["message"].as_str().unwrap().starts_with("✅ ¡Correcto! 👍"));
    }
    assert_eq!(last["status"], "done");
    assert!(last["message"].as_str().unwrap().contains("38999"));
    assert!(last.get("expected_answer").is_none());
}

#[tokio::test]
async fn test_scenario_b_long_division_first_block() {
    let router = router_with(memory_store());

    let first = answer(&router, "b", "3457/3", "").await;
    assert_eq!(first["nlu"]["intent"], "division");
    assert_eq!(first["expected_answer"], "3");

    let second = answer(&router, "b", "3457/3", "3").await;
    assert_eq!(second["step"], 1);
    assert_eq!(second["expected_answer"], "1");
}

#[tokio::test]
async fn test_scenario_c_fraction_stages() {
    let router = router_with(memory_store());

    let first = answer(&router, "c", "2/3 + 1/4", "").await;
    assert_eq!(first["expected_answer"], "no");

    let second = answer(&router, "c", "2/3 + 1/4", "No").await;
    assert_eq!(second["step"], 1);
    assert_eq!(second["expected_answer"], "12");
}

#[tokio::test]
async fn test_scenario_d_hints_escalate() {
    let router = router_with(memory_store());
    let question = "32458 + 6541";
    answer(&router, "d", question, "").await;

    let mut messages = Vec::new();
    for errors in 1..=3 {
        let reply = answer(&router, "d", question, "4").await;
        assert_eq!(reply["status"], "feedback");
        assert_eq!(reply["step"], 0);
        assert_eq!(reply["error_count"], errors);
        messages.push(reply["message"].as_str().unwrap().to_string());
    }
    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert_ne!(messages[0], messages[2]);

    let fourth = answer(&router, "d", question, "4").await;
    assert!(fourth["message"].as_str().unwrap().contains('9'));

    let fixed = answer(&router, "d", question, "9").await;
    assert_eq!(fixed["step"], 1);
    assert_eq!(fixed["error_count"], 0);
}

#[tokio::test]
async fn test_comma_and_spacing_are_canonicalized() {
    let router = router_with(memory_store());
    let question = "2,5 + 1,25";
    let first = answer(&router, "e", question, "").await;
    assert_eq!(first["nlu"]["intent"], "decimales");

    // Walk the pipeline answering exactly what is expected, written with commas.
    let mut expected = first["expected_answer"].as_str().unwrap().to_string();
    let mut step = 0;
    loop {
        let written = expected.replace('.', ",");
        let reply = answer(&router, "e", question, &format!(" {written} ")).await;
        step += 1;
        assert_eq!(reply["step"], step, "{reply}");
        match reply["expected_answer"].as_str() {
            Some(next) => expected = next.to_string(),
            None => {
                assert_eq!(reply["status"], "done");
                break;
            }
        }
    }
}

/// Answers every step with its expected value and returns the final reply.
async fn walk_to_done(router: &Router, id: &str, question: &str) -> Value {
    let mut reply = answer(router, id, question, "").await;
    for _ in 0..40 {
        let Some(expected) = reply["expected_answer"].as_str().map(str::to_string) else {
            break;
        };
        let step = reply["step"].as_u64().unwrap();
        reply = answer(router, id, question, &expected).await;
        assert_eq!(reply["step"], step + 1, "{question}: {reply}");
        assert_eq!(reply["error_count"], 0, "{question}: {reply}");
    }
    reply
}

#[tokio::test]
async fn test_word_problems_reach_done() {
    let router = router_with(memory_store());
    let problems = [
        ("wp-suma", "Ana tiene 12 caramelos y le dan 5 más"),
        ("wp-resta", "Tenía 30 cromos y regalé 8, ¿cuál es la diferencia?"),
        ("wp-mult", "Un paquete trae 6 galletas. ¿Y 4 veces ese paquete?"),
        ("wp-div", "dividir 24 entre 6"),
    ];
    for (id, question) in problems {
        let first = answer(&router, id, question, "").await;
        assert_eq!(first["nlu"]["intent"], "problemas", "{question}");
        assert_eq!(first["status"], "ask", "{question}: {first}");

        let last = walk_to_done(&router, id, question).await;
        assert_eq!(last["status"], "done", "{question}: {last}");
        assert!(last["step"].as_u64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_short_unit_conversions_reach_done() {
    let router = router_with(memory_store());
    for (id, question, direction) in [
        ("m-dl", "pasa 4 l a dl", "mayor"),
        ("m-mg", "500 mg a g", "menor"),
    ] {
        let first = answer(&router, id, question, "").await;
        assert_eq!(first["nlu"]["intent"], "medidas", "{question}");
        assert_eq!(first["expected_answer"], direction);

        let last = walk_to_done(&router, id, question).await;
        assert_eq!(last["status"], "done", "{question}: {last}");
    }
}

#[tokio::test]
async fn test_history_records_every_turn() {
    let store = memory_store();
    let router = router_with(Arc::clone(&store));
    for last in ["", "1", "9"] {
        solve(
            &router,
            json!({"user_id": "marta", "exercise_id": "h", "question": "38 + 45", "last_answer": last}),
        )
        .await;
    }

    let response = router
        .oneshot(
            Request::builder()
                .uri("/history?user_id=marta&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["lastAnswer"], "9");
    assert_eq!(store.list_history(None, 10).unwrap().len(), 3);
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("progress.db");
    {
        let router = router_with(Arc::new(ProgressStore::open(&db).unwrap()));
        answer(&router, "r", "503 - 278", "").await;
        answer(&router, "r", "503 - 278", "5").await;
    }

    let router = router_with(Arc::new(ProgressStore::open(&db).unwrap()));
    let reply = answer(&router, "r", "503 - 278", "").await;
    assert_eq!(reply["step"], 1);
}

// ============================================================================
// Real server
// ============================================================================

fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

async fn spawn_server(store: Arc<ProgressStore>) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    let router = router_with(store);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn test_real_server_round_trip() {
    let (base, handle) = spawn_server(memory_store()).await;
    let client = reqwest::Client::new();

    let root: Value = client.get(format!("{base}/")).send().await.unwrap().json().await.unwrap();
    assert_eq!(root["status"], "online");

    let analyzed: Value = client
        .post(format!("{base}/analyze/text"))
        .json(&json!({"text": "Calcula el 25% de 80"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(analyzed["nlu"]["intent"], "porcentajes");

    let first: Value = client
        .post(format!("{base}/solve"))
        .json(&json!({"question": "123 × 45"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = first["exercise_id"].as_str().unwrap().to_string();
    assert_eq!(first["status"], "ask");

    let hint: Value = client
        .post(format!("{base}/solve"))
        .json(&json!({"exercise_id": id, "question": "123 × 45", "last_answer": "ni idea"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hint["status"], "hint");
    assert_eq!(hint["error_count"], 1);

    let bad = client
        .get(format!("{base}/history?limit=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn test_real_server_serializes_concurrent_turns() {
    let store = memory_store();
    let (base, handle) = spawn_server(Arc::clone(&store)).await;
    let client = reqwest::Client::new();

    let body = json!({"exercise_id": "race", "question": "45 + 38", "last_answer": "0"});
    let requests = (0..10).map(|_| {
        client
            .post(format!("{base}/solve"))
            .json(&body)
            .send()
    });
    for response in futures::future::join_all(requests).await {
        assert!(response.unwrap().status().is_success());
    }

    let record = store.find("race").unwrap().unwrap();
    assert_eq!(record.error_count, 9);
    assert_eq!(record.version, 10);
    assert_eq!(store.list_history(None, 50).unwrap().len(), 10);

    handle.abort();
}
