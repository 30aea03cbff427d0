#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use forensics_backend::{
    auth::rbac::Role, config, repositories::InMemoryStore, repositories::UserRepository,
    routes::create_router, AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "test-api-key";
const BOUNDARY: &str = "----forensics-test-boundary";

/// Router on the in-memory store with blobs under a temporary directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub investigator: Uuid,
    _blob_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let blob_dir = TempDir::new().expect("Failed to create blob dir");

        let mut settings =
            config::Settings::new_with_env_file(false).expect("Failed to create test config");
        settings.api_keys = vec![TEST_API_KEY.to_string()];
        settings.api_key_header = "X-API-Key".to_string();
        settings.cors_allow_origins = vec!["*".to_string()];
        settings.blob_storage_path = blob_dir.path().to_string_lossy().to_string();
        settings.max_evidence_bytes = 1024 * 1024;
        settings.trend_window_days = 180;
        settings.top_n_limit = 5;

        let store = Arc::new(InMemoryStore::new());
        let profile = store
            .create_profile("investigator@example.org", Some("Ida Investigator"))
            .await
            .expect("Failed to seed profile");
        store
            .insert_user_role(profile.id, Role::Investigator)
            .await
            .expect("Failed to seed role");

        let state = AppState::in_memory(settings, store.clone()).expect("Failed to build state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            investigator: profile.id,
            _blob_dir: blob_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// JSON request authenticated with the API key, acting as the investigator.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-API-Key", TEST_API_KEY)
            .header("X-Acting-User", self.investigator.to_string());

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    pub async fn upload(&self, case_id: Uuid, parts: &[Part<'_>]) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/cases/{}/evidence", case_id))
            .header("X-API-Key", TEST_API_KEY)
            .header("X-Acting-User", self.investigator.to_string())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    pub async fn create_victim(&self, name: &str) -> Uuid {
        let response = self
            .json(
                Method::POST,
                "/api/victims",
                Some(serde_json::json!({ "name": name, "location": "Leeds" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }

    pub async fn create_case(&self, case_type: &str) -> Uuid {
        let victim_id = self.create_victim("Jane Roe").await;
        let response = self
            .json(
                Method::POST,
                "/api/cases",
                Some(serde_json::json!({
                    "case_type": case_type,
                    "victim_id": victim_id,
                    "incident_date": "2026-03-14",
                    "summary": "reported by victim"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }
}

/// One multipart form part; `file_name` makes it a file part.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content: value.as_bytes(),
        }
    }

    pub fn file(file_name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name: "file",
            file_name: Some(file_name),
            content,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to extract response body as bytes
pub async fn extract_body(response: Response) -> Vec<u8> {
    let body = to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
    body.to_vec()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = extract_body(response).await;
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

pub fn sha256_hex(content: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(content))
}
