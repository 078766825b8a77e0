use super::*;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ResultItem, StoreBlock},
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct ServerState {
    seen_queries: Arc<Mutex<Vec<String>>>,
}

fn cable_response() -> SearchResponse {
    SearchResponse::new(
        3,
        vec![
            StoreBlock::new("A", vec![ResultItem::new("Cable1", 100.0, "x")]),
            StoreBlock::new(
                "B",
                vec![
                    ResultItem::new("Cable2", 50.0, "y"),
                    ResultItem::new("Cable3", 150.0, "z"),
                ],
            ),
        ],
    )
}

async fn handle_search(
    State(state): State<ServerState>,
    Path(query): Path<String>,
) -> Response {
    state.seen_queries.lock().await.push(query.clone());
    match query.as_str() {
        "broken" => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Unavailable, "scrapers offline")),
        )
            .into_response(),
        "teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
        "garbage" => (StatusCode::OK, "not json").into_response(),
        "count-only" => (StatusCode::OK, r#"{"n_results": 3}"#).into_response(),
        "dupes" => Json(SearchResponse::new(
            0,
            vec![StoreBlock::new("A", vec![]), StoreBlock::new("A", vec![])],
        ))
        .into_response(),
        "nothing" => Json(SearchResponse::new(0, Vec::new())).into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(cable_response()).into_response()
        }
        _ => Json(cable_response()).into_response(),
    }
}

async fn spawn_search_server() -> Result<(String, Arc<Mutex<Vec<String>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        seen_queries: Arc::new(Mutex::new(Vec::new())),
    };
    let seen_queries = Arc::clone(&state.seen_queries);
    let app = Router::new()
        .route("/search/:query", get(handle_search))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/search"), seen_queries))
}

fn backend(base_url: &str) -> HttpSearchBackend {
    HttpSearchBackend::new(base_url, HttpBackendOptions::default()).expect("backend")
}

#[test]
fn path_segment_encoding_keeps_query_in_one_segment() {
    let backend = backend("http://prices.local/api/");
    let url = backend.search_url("usb cable/2m?").expect("url");
    assert_eq!(url.as_str(), "http://prices.local/api/usb%20cable%2F2m%3F");
}

#[test]
fn path_segment_encoding_on_bare_host() {
    let backend = backend("http://prices.local");
    let url = backend.search_url("ssd").expect("url");
    assert_eq!(url.as_str(), "http://prices.local/ssd");
}

#[test]
fn raw_encoding_concatenates_base_and_query() {
    let backend = HttpSearchBackend::new(
        "http://prices.local",
        HttpBackendOptions {
            query_encoding: QueryEncoding::Raw,
            timeout: None,
        },
    )
    .expect("backend");
    assert_eq!(
        backend.search_url("usb cable").expect("url").as_str(),
        "http://prices.local/usb%20cable"
    );
    assert_eq!(
        backend.search_url("a/b").expect("url").path(),
        "/a/b"
    );
}

#[test]
fn rejects_unusable_base_urls() {
    assert!(matches!(
        HttpSearchBackend::new("not a url", HttpBackendOptions::default()),
        Err(RetrievalError::InvalidUrl(_))
    ));
    assert!(matches!(
        HttpSearchBackend::new("mailto:prices@example.com", HttpBackendOptions::default()),
        Err(RetrievalError::InvalidUrl(_))
    ));
}

#[test]
fn base_url_is_trimmed() {
    assert_eq!(
        backend("  http://prices.local/api//  ").base_url(),
        "http://prices.local/api"
    );
}

#[tokio::test]
async fn fetches_and_decodes_search_response() {
    let (base_url, seen_queries) = spawn_search_server().await.expect("spawn server");
    let response = backend(&base_url)
        .search("usb cable")
        .await
        .expect("search");

    assert_eq!(response, cable_response());
    assert_eq!(*seen_queries.lock().await, vec!["usb cable".to_string()]);
}

#[tokio::test]
async fn zero_results_is_a_successful_response() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let response = backend(&base_url).search("nothing").await.expect("search");
    assert_eq!(response.result_count, Some(0));
    assert!(response.content.is_empty());
}

#[tokio::test]
async fn error_status_uses_api_error_message() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let err = backend(&base_url)
        .search("broken")
        .await
        .expect_err("should fail");
    assert_eq!(
        err,
        RetrievalError::Status {
            status: 503,
            message: "scrapers offline".to_string()
        }
    );
}

#[tokio::test]
async fn error_status_with_plain_body_keeps_text() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let err = backend(&base_url)
        .search("teapot")
        .await
        .expect_err("should fail");
    assert_eq!(
        err,
        RetrievalError::Status {
            status: 418,
            message: "short and stout".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let err = backend(&base_url)
        .search("garbage")
        .await
        .expect_err("should fail");
    assert_eq!(err.category(), RetrievalErrorCategory::Malformed);
}

#[tokio::test]
async fn invalid_response_shape_is_malformed() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let err = backend(&base_url)
        .search("dupes")
        .await
        .expect_err("should fail");
    assert!(matches!(err, RetrievalError::Malformed(ref message) if message.contains("\"A\"")));
}

#[tokio::test]
async fn count_without_content_is_malformed() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let err = backend(&base_url)
        .search("count-only")
        .await
        .expect_err("should fail");
    assert_eq!(err.category(), RetrievalErrorCategory::Malformed);
}

#[tokio::test]
async fn count_without_content_fails_the_session_submission() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let mut session = SearchSession::new(Arc::new(backend(&base_url)));

    let outcome = session.search("count-only").await.cloned();
    assert!(matches!(
        outcome,
        Some(SubmissionOutcome::Failed {
            error: RetrievalError::Malformed(_),
            ..
        })
    ));
    assert!(!session.state().pending());
    assert_eq!(session.view(), ViewModel::NotSearched);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = backend(&format!("http://{addr}"))
        .search("usb cable")
        .await
        .expect_err("should fail");
    assert_eq!(err.category(), RetrievalErrorCategory::Transport);
}

#[tokio::test]
async fn slow_backend_hits_configured_timeout() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let backend = HttpSearchBackend::new(
        base_url,
        HttpBackendOptions {
            query_encoding: QueryEncoding::PathSegment,
            timeout: Some(Duration::from_millis(50)),
        },
    )
    .expect("backend");

    let err = backend.search("slow").await.expect_err("should time out");
    assert_eq!(err, RetrievalError::Timeout);
}

#[tokio::test]
async fn session_over_http_backend_ingests_results() {
    let (base_url, _) = spawn_search_server().await.expect("spawn server");
    let mut session = SearchSession::new(Arc::new(backend(&base_url)));

    let outcome = session.search("usb cable").await.cloned();
    assert!(matches!(
        outcome,
        Some(SubmissionOutcome::Succeeded {
            result_count: Some(3),
            ..
        })
    ));
    assert_eq!(session.view().row_count(), 3);
}
