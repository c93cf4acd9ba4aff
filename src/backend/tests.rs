use super::http::parse_download_url;
use super::{ExportBackend, HttpBackend, RecordSource};
use crate::config::BackendConfig;
use crate::error::Error;
use crate::types::{CreationStrategy, DownloadDescriptor, ExportId, FilterCriteria, JobStatus};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = BackendConfig {
        base_url: server.uri(),
        auth_token: Some("secret-token".to_string()),
        ..Default::default()
    };
    HttpBackend::new(&config).unwrap()
}

#[tokio::test]
async fn test_create_export_posts_ids_with_bearer_auth() {
    let mock_server = MockServer::start().await;
    let ids = vec!["a".to_string(), "b".to_string()];

    Mock::given(method("POST"))
        .and(path("/exports"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(body_json(json!({"ids": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "export_id": "exp-42",
            "download_url": null,
            "expires_at": "2026-09-01T00:00:00Z",
            "record_count": 2,
            "status": "pending"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let job = backend_for(&mock_server).create_export(&ids).await.unwrap();

    assert_eq!(job.id, ExportId::new("exp-42"));
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.strategy, CreationStrategy::Direct);
    assert_eq!(job.record_count, 2);
    assert!(job.descriptor.is_none());
    assert!(job.expires_at.is_some());
}

#[tokio::test]
async fn test_create_export_parses_download_url_into_descriptor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/exports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "export_id": "exp-7",
            "download_url": format!("{}/exports/exp-7/download?token=one-shot", mock_server.uri()),
            "record_count": 3,
            "status": "completed"
        })))
        .mount(&mock_server)
        .await;

    let job = backend_for(&mock_server)
        .create_export(&["x".to_string()])
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_percentage, 100);
    assert_eq!(
        job.descriptor,
        Some(DownloadDescriptor {
            export_id: ExportId::new("exp-7"),
            token: "one-shot".to_string(),
        })
    );
}

#[tokio::test]
async fn test_chunked_create_returns_primary_handle() {
    let mock_server = MockServer::start().await;
    let ids: Vec<String> = (0..10).map(|i| format!("rec-{i}")).collect();

    Mock::given(method("POST"))
        .and(path("/exports/chunked"))
        .and(body_json(json!({"ids": ids})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "export_id": "exp-chunked",
            "total_count": 10,
            "status": "processing"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let job = backend_for(&mock_server)
        .create_chunked_export(&ids)
        .await
        .unwrap();

    assert_eq!(job.id, ExportId::new("exp-chunked"));
    assert_eq!(job.strategy, CreationStrategy::Chunked);
    assert_eq!(job.record_count, 10);
    assert_eq!(job.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_fetch_status_maps_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exports/exp-5/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing",
            "progress_percentage": 45
        })))
        .mount(&mock_server)
        .await;

    let snapshot = backend_for(&mock_server)
        .fetch_status(&ExportId::new("exp-5"))
        .await
        .unwrap();

    assert_eq!(snapshot.status, JobStatus::Processing);
    assert_eq!(snapshot.progress_percentage, 45);
    assert!(snapshot.descriptor.is_none());
    assert!(snapshot.error_message.is_none());
}

#[tokio::test]
async fn test_fetch_status_completed_carries_descriptor_and_failure_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exports/exp-5/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "progress_percentage": 100,
            "download_url": format!("{}/exports/exp-5/download?token=tkn", mock_server.uri())
        })))
        .mount(&mock_server)
        .await;

    let snapshot = backend_for(&mock_server)
        .fetch_status(&ExportId::new("exp-5"))
        .await
        .unwrap();

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(
        snapshot.descriptor,
        Some(DownloadDescriptor {
            export_id: ExportId::new("exp-5"),
            token: "tkn".to_string(),
        })
    );
}

#[tokio::test]
async fn test_fetch_artifact_uses_token_query() {
    let mock_server = MockServer::start().await;
    let payload = b"uuid,name\n1,Ada\n".to_vec();

    Mock::given(method("GET"))
        .and(path("/exports/exp-9/download"))
        .and(query_param("token", "tkn-9"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bytes = backend_for(&mock_server)
        .fetch_artifact(&DownloadDescriptor {
            export_id: ExportId::new("exp-9"),
            token: "tkn-9".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(bytes, payload);
}

#[tokio::test]
async fn test_list_ids_passes_window_and_filter_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/uuids"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "200"))
        .and(query_param("lifecycle_stage", "customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuids": ["u1", "u2", "u3"],
            "count": 203
        })))
        .mount(&mock_server)
        .await;

    let criteria = FilterCriteria::Params(vec![(
        "lifecycle_stage".to_string(),
        "customer".to_string(),
    )]);
    let page = backend_for(&mock_server)
        .list_ids(&criteria, 200, 100)
        .await
        .unwrap();

    assert_eq!(page.ids, vec!["u1", "u2", "u3"]);
    assert!(page.is_last, "203 of 203 reached");
}

#[tokio::test]
async fn test_list_ids_source_url_variant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/uuids"))
        .and(query_param("source_url", "https://app.example.com/search?q=acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuids": ["u1"],
            "count": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let criteria =
        FilterCriteria::SourceUrl("https://app.example.com/search?q=acme".to_string());
    let page = backend_for(&mock_server)
        .list_ids(&criteria, 0, 100)
        .await
        .unwrap();

    assert_eq!(page.ids.len(), 1);
}

#[tokio::test]
async fn test_count_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 31337})))
        .mount(&mock_server)
        .await;

    let count = backend_for(&mock_server)
        .count(&FilterCriteria::empty())
        .await
        .unwrap();

    assert_eq!(count, 31337);
}

#[tokio::test]
async fn test_custom_records_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/companies/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 4})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let count = backend_for(&mock_server)
        .with_records_path("companies")
        .count(&FilterCriteria::empty())
        .await
        .unwrap();

    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_non_success_status_maps_to_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/exports"))
        .respond_with(ResponseTemplate::new(422).set_body_string("too many records"))
        .mount(&mock_server)
        .await;

    let err = backend_for(&mock_server)
        .create_export(&["a".to_string()])
        .await
        .unwrap_err();

    match err {
        Error::Backend { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "too many records");
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
}

#[test]
fn test_parse_download_url_happy_path() {
    let descriptor =
        parse_download_url("https://api.example.com/exports/exp-3/download?token=abc").unwrap();
    assert_eq!(descriptor.export_id, ExportId::new("exp-3"));
    assert_eq!(descriptor.token, "abc");
}

#[test]
fn test_parse_download_url_rejects_missing_token() {
    assert!(parse_download_url("https://api.example.com/exports/exp-3/download").is_none());
    assert!(parse_download_url("https://api.example.com/exports/exp-3/download?token=").is_none());
}

#[test]
fn test_parse_download_url_rejects_unexpected_path() {
    assert!(parse_download_url("https://api.example.com/exports?token=abc").is_none());
    assert!(parse_download_url("not a url").is_none());
}
