//! Integration tests for the HTTP client against a mocked backend.

use std::time::Duration;

use benchscope_core::query::CachePolicy;
use benchscope_core::threshold::threshold_from_rows;
use benchscope_core::{ApiClient, DashError, ExportFormat, RunStatus};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_options(&server.uri(), Duration::from_secs(2), CachePolicy::default())
        .expect("client")
}

#[tokio::test]
async fn test_list_runs_decodes_partial_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "model": "llama3", "status": "done", "n_results": 240},
            {"id": "2", "status": "mystery"}
        ])))
        .mount(&server)
        .await;

    let runs = client(&server).list_runs().await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].status, RunStatus::Done);
    assert_eq!(runs[0].n_results, Some(240));
    assert_eq!(runs[1].status, RunStatus::Unknown);
    assert_eq!(runs[1].model, None);
}

#[tokio::test]
async fn test_repeated_reads_hit_backend_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "n": 120,
            "mean": 3.4,
            "hist": {"bins": [1, 2, 3], "shares": [0.2, 0.4, 0.4]},
            "attributes": {"gender": {"categories": ["male", "female"], "baseline": "male"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let first = api.metrics("7").await.unwrap();
    let second = api.metrics("7").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.n, Some(120));
    assert_eq!(first.attributes["gender"].baseline.as_deref(), Some("male"));
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/kruskal"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"overall": [{"attribute": "gender", "h": 4.2, "p_value": 0.04}]}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let (a, b, c) = tokio::join!(api.kruskal("7"), api.kruskal("7"), api.kruskal("7"));
    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(a.overall.len(), 1);
}

#[tokio::test]
async fn test_concurrent_failures_are_shared_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/9/metrics"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({"detail": "warming up"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server);
    let (a, b) = tokio::join!(api.metrics("9"), api.metrics("9"));
    for result in [a, b] {
        match result {
            Err(DashError::Http { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "warming up");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    // The failure was not cached, so the next read goes back to the backend.
    assert!(api.metrics("9").await.is_err());
}

#[tokio::test]
async fn test_deltas_send_encoded_query_and_feed_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/deltas"))
        .and(query_param("attribute", "skin tone"))
        .and(query_param("baseline", "light"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attribute": "skin tone",
            "baseline": "light",
            "rows": [
                {"category": "dark", "delta": 0.3, "n_base": 100, "sd_base": 1.0, "n_category": 60, "sd_category": 1.0},
                {"category": "medium", "delta": 0.1, "n_base": 100, "sd_base": 1.0, "n_category": 50, "sd_category": 1.0},
                {"category": "olive", "delta": null, "n_base": 100, "sd_base": 1.0, "n_category": 70, "sd_category": 1.0}
            ]
        })))
        .mount(&server)
        .await;

    let resp = client(&server)
        .deltas("7", "skin tone", Some("light"), None)
        .await
        .unwrap();
    assert_eq!(resp.rows.len(), 3);
    assert_eq!(resp.rows[2].delta, None);
    let expected = 1.96 * (1.0f64 / 100.0 + 1.0 / 60.0).sqrt();
    let got = threshold_from_rows(&resp.rows).unwrap();
    assert!((got - expected).abs() < 1e-12);
}

#[tokio::test]
async fn test_http_error_carries_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "run 404 not found"})))
        .mount(&server)
        .await;

    let err = client(&server).get_run("404").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        DashError::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "run 404 not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/kruskal"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).kruskal("7").await.unwrap_err();
    assert!(matches!(err, DashError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let api = ApiClient::with_options("http://127.0.0.1:9", Duration::from_secs(2), CachePolicy::default())
        .unwrap();
    let err = api.list_runs().await.unwrap_err();
    assert!(matches!(err, DashError::Network(_)));
}

#[tokio::test]
async fn test_start_invalidates_cached_run_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": 3, "total": 10, "status": "running"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/runs/7/start"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let before = api.progress("7").await.unwrap();
    assert_eq!(before.fraction(), Some(0.3));
    api.progress("7").await.unwrap();
    api.start_run("7").await.unwrap();
    api.progress("7").await.unwrap();
}

#[tokio::test]
async fn test_kruskal_export_returns_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/kruskal/export"))
        .and(query_param("format", "latex"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\\begin{table}\n\\end{table}\n"))
        .mount(&server)
        .await;

    let text = client(&server).kruskal_export("7", ExportFormat::Latex).await.unwrap();
    assert!(text.starts_with("\\begin{table}"));
}

#[tokio::test]
async fn test_analysis_status_is_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs/7/analysis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j1", "status": "running"})))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server);
    let job = api.analysis_status("7").await.unwrap();
    assert_eq!(job.job_id.as_deref(), Some("j1"));
    api.analysis_status("7").await.unwrap();
}
