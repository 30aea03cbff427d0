mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{body_json, extract_body, Part, TestApp};
use forensics_backend::storage::BlobStore;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .uri("/api/health/simple")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_body(response).await, b"OK".to_vec());

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["checks"]["database"]["healthy"], true);
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let app = TestApp::new().await;
    let response = app.json(Method::GET, "/api/cases", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_case_lifecycle() {
    let app = TestApp::new().await;
    let id = app.create_case("Phishing").await;
    let uri = format!("/api/cases/{}", id);

    let response = app.json(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let case = body_json(response).await;
    assert_eq!(case["case_type"], "Phishing");
    assert_eq!(case["status"], "open");
    assert_eq!(case["created_by"], app.investigator.to_string());

    let response = app
        .json(
            Method::PATCH,
            &uri,
            Some(json!({ "status": "investigation", "summary": "mailbox seized" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let case = body_json(response).await;
    assert_eq!(case["status"], "investigation");
    assert_eq!(case["summary"], "mailbox seized");
    assert_eq!(case["case_type"], "Phishing");

    let response = app.json(Method::GET, "/api/cases", None).await;
    let cases = body_json(response).await;
    assert_eq!(cases.as_array().unwrap().len(), 1);

    let response = app.json(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.json(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_case_delete_removes_evidence_blobs() {
    let app = TestApp::new().await;
    let case_id = app.create_case("Malware").await;

    let response = app
        .upload(
            case_id,
            &[
                Part::text("evidence_type", "Memory image"),
                Part::file("dump.raw", b"\x7fELF memory pages"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let evidence = body_json(response).await;
    let locator = evidence["storage_location"].as_str().unwrap().to_string();
    assert!(app.state.blob_store.download(&locator).await.is_ok());

    let response = app
        .json(Method::DELETE, &format!("/api/cases/{}", case_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.state.blob_store.download(&locator).await.is_err());
    let response = app
        .json(
            Method::GET,
            &format!("/api/evidence/{}", evidence["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_case_requires_case_type() {
    let app = TestApp::new().await;
    let victim_id = app.create_victim("Jane Roe").await;
    let response = app
        .json(
            Method::POST,
            "/api/cases",
            Some(json!({
                "case_type": "  ",
                "victim_id": victim_id,
                "incident_date": "2026-02-01",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_case_report_lists_evidence_and_actions() {
    let app = TestApp::new().await;
    let case_id = app.create_case("Fraud").await;

    let response = app
        .upload(
            case_id,
            &[
                Part::text("evidence_type", "Bank statement"),
                Part::file("statement.csv", b"date,amount\n2026-03-01,-4999.00\n"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let evidence = body_json(response).await;

    for (name, at) in [
        ("Alice", "2026-03-02T09:00:00Z"),
        ("Bob", "2026-03-05T14:30:00Z"),
    ] {
        let response = app
            .json(
                Method::POST,
                "/api/actions",
                Some(json!({
                    "case_id": case_id,
                    "investigator_name": name,
                    "action_description": "reviewed transactions",
                    "status": "completed",
                    "execution_time": at,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .json(Method::GET, &format!("/api/cases/{}/report", case_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;

    assert_eq!(report["case"]["id"], case_id.to_string());
    let listed = report["evidence"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    let digest = evidence["file_hash"].as_str().unwrap();
    assert_eq!(
        listed[0]["file_hash_preview"],
        format!("{}...", &digest[..16])
    );

    let actions = report["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["investigator_name"], "Bob");
    assert_eq!(actions[1]["investigator_name"], "Alice");
}

#[tokio::test]
async fn test_action_for_unknown_case_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .json(
            Method::POST,
            "/api/actions",
            Some(json!({
                "case_id": Uuid::new_v4(),
                "investigator_name": "Alice",
                "action_description": "imaged disk",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_actions_filter_by_case() {
    let app = TestApp::new().await;
    let first = app.create_case("Fraud").await;
    let second = app.create_case("Theft").await;

    for case_id in [first, second, second] {
        let response = app
            .json(
                Method::POST,
                "/api/actions",
                Some(json!({
                    "case_id": case_id,
                    "investigator_name": "Alice",
                    "action_description": "interviewed witness",
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .json(Method::GET, &format!("/api/actions?case_id={}", second), None)
        .await;
    let actions = body_json(response).await;
    assert_eq!(actions.as_array().unwrap().len(), 2);

    let response = app.json(Method::GET, "/api/actions", None).await;
    let actions = body_json(response).await;
    assert_eq!(actions.as_array().unwrap().len(), 3);
}
