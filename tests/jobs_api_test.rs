use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use brand_registry_backend::{
    database::memory_store::MemoryJobStore,
    middleware::auth::Claims,
    routes,
    services::{
        document_service::JsonDocumentRenderer, file_storage_service::FileStorageService,
        notification_service::NotificationService,
    },
    AppState, ServerSettings,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "test_secret_key";

fn setup_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::from_parts(
        Arc::new(MemoryJobStore::new()),
        FileStorageService::new(dir.path()),
        Arc::new(JsonDocumentRenderer),
        NotificationService::disabled(),
        ServerSettings {
            jwt_secret: SECRET.to_string(),
            api_rps: 10_000,
            max_upload_bytes: 5 * 1024 * 1024,
        },
    );
    (routes::router(state), dir)
}

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn upload(app: &Router, token: &str, filename: &str, content: &[u8]) -> String {
    let boundary = "X-BRAND-REGISTRY-BOUNDARY";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = boundary,
            f = filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let req = Request::builder()
        .method("POST")
        .uri("/api/files")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    value["path"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public_and_api_is_not() {
    let (app, _dir) = setup_app();

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, "GET", "/api/jobs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = call(&app, "GET", "/api/jobs", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/api/jobs", Some(&token("x", "janitor")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn registration_flow_end_to_end() {
    let (app, _dir) = setup_app();
    let operator = token("op-1", "operator");
    let reviewer = token("rev-1", "reviewer");
    let lawyer = token("law-1", "lawyer");

    // Create
    let (status, body) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&operator),
        Some(json!({ "clientName": "Akmal", "phone": "+998901234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["job"]["status"], "yangi");
    assert_eq!(body["currentStep"], "client_contact");
    let id = body["job"]["id"].as_str().unwrap().to_string();
    let job_uri = |suffix: &str| format!("/api/jobs/{}{}", id, suffix);

    // Empty classes never transition
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/send-for-review"),
        Some(&operator),
        Some(json!({ "brandName": "Акмаль", "classes": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["field"], "classes");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/send-for-review"),
        Some(&operator),
        Some(json!({ "brandName": "Акмаль", "classes": [25, 35] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "brand_in_review");
    assert_eq!(body["job"]["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["job"]["history"][0]["action"], "sendForReview");
    let version = body["job"]["version"].as_i64().unwrap();

    // Reviewer worklist
    let (status, body) = call(&app, "GET", "/api/jobs?section=brend", Some(&reviewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    // Wrong role, stale version, then success
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/review-brand"),
        Some(&operator),
        Some(json!({ "approved": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/review-brand"),
        Some(&reviewer),
        Some(json!({ "approved": true, "expectedVersion": version - 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/review-brand"),
        Some(&reviewer),
        Some(json!({ "approved": true, "expectedVersion": version })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "approved");

    // Documents
    let mut front = vec![0xFF, 0xD8];
    front.extend_from_slice(b"front");
    let mut back = vec![0xFF, 0xD8];
    back.extend_from_slice(b"back");
    let front = upload(&app, &operator, "front.jpg", &front).await;
    let back = upload(&app, &operator, "back.jpg", &back).await;

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/submit-documents"),
        Some(&operator),
        Some(json!({
            "personType": "jismoniy",
            "docs": {
                "passportImageFront": front,
                "passportImageBack": back,
                "fullBrandName": "Акмаль",
                "fullAddress": "Toshkent"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_submitted");
    assert_eq!(body["job"]["personDocs"]["personType"], "jismoniy");

    let (status, body) = call(&app, "POST", &job_uri("/power-of-attorney"), Some(&reviewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_submitted");
    assert_eq!(body["job"]["documents"][0]["type"], "power-of-attorney");

    // Lawyer stage
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/send-to-lawyer"),
        Some(&reviewer),
        Some(json!({ "comment": "ok" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "to_lawyer");

    let (status, body) = call(&app, "POST", &job_uri("/send-to-lawyer"), Some(&reviewer), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["status"], "to_lawyer");

    let (status, body) = call(&app, "POST", &job_uri("/accept"), Some(&lawyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "lawyer_processing");

    let invoice_file = upload(&app, &lawyer, "invoice.pdf", b"%PDF-1.7 invoice").await;
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/invoices"),
        Some(&lawyer),
        Some(json!({ "file": invoice_file, "amount": 500000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["invoices"][0]["status"], "pending");
    let invoice_id = body["job"]["invoices"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        &job_uri(&format!("/invoices/{}/approve", invoice_id)),
        Some(&lawyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");

    let receipt = upload(&app, &operator, "receipt.pdf", b"%PDF-1.7 receipt").await;
    let (status, body) = call(
        &app,
        "POST",
        &job_uri(&format!("/invoices/{}/receipt", invoice_id)),
        Some(&operator),
        Some(json!({ "file": receipt })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["invoices"][0]["status"], "receipt_uploaded");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri(&format!("/invoices/{}/approve", invoice_id)),
        Some(&reviewer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["invoices"][0]["status"], "paid");

    let certificate = upload(&app, &lawyer, "certificate.pdf", b"%PDF-1.7 certificate").await;
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/complete"),
        Some(&lawyer),
        Some(json!({ "comment": "tayyor", "certificateFile": certificate })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "lawyer_completed");
    assert_eq!(body["currentStep"], "certificate_delivery");

    let (status, body) = call(&app, "POST", &job_uri("/deliver"), Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "finished");
    assert_eq!(body["nextActions"], json!([]));
    assert_eq!(body["job"]["history"].as_array().unwrap().len(), 11);

    let (status, body) = call(&app, "GET", "/api/jobs/counts", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([
        { "section": "yangi", "count": 0 },
        { "section": "jarayonda", "count": 0 },
        { "section": "tugatilgan", "count": 1 },
    ]));
}

#[tokio::test]
async fn worklist_rejects_bad_queries() {
    let (app, _dir) = setup_app();
    let lawyer = token("law-1", "lawyer");

    let (status, body) = call(&app, "GET", "/api/jobs?role=reviewer", Some(&lawyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = call(&app, "GET", "/api/jobs?section=brend", Some(&lawyer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "section");

    let (status, body) = call(&app, "GET", "/api/jobs?dateFrom=15.10.2026", Some(&lawyer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "dateFrom");

    let admin = token("admin-1", "admin");
    let (status, body) = call(&app, "GET", "/api/jobs", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (app, _dir) = setup_app();
    let operator = token("op-1", "operator");
    let uri = format!("/api/jobs/{}", uuid::Uuid::new_v4());
    let (status, body) = call(&app, "GET", &uri, Some(&operator), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn export_returns_a_workbook() {
    let (app, _dir) = setup_app();
    let operator = token("op-1", "operator");
    call(
        &app,
        "POST",
        "/api/jobs",
        Some(&operator),
        Some(json!({ "clientName": "Akmal" })),
    )
    .await;

    let req = Request::builder()
        .uri("/api/jobs/export?section=yangi")
        .header(header::AUTHORIZATION, format!("Bearer {}", operator))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("spreadsheetml"));
    let bytes = to_bytes(resp.into_body(), 10 * 1024 * 1024).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn document_return_cycle_with_strict_bodies() {
    let (app, _dir) = setup_app();
    let operator = token("op-1", "operator");
    let reviewer = token("rev-1", "reviewer");

    let (_, body) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&operator),
        Some(json!({ "clientName": "Akmal" })),
    )
    .await;
    let id = body["job"]["id"].as_str().unwrap().to_string();
    let job_uri = |suffix: &str| format!("/api/jobs/{}{}", id, suffix);

    call(
        &app,
        "POST",
        &job_uri("/send-for-review"),
        Some(&operator),
        Some(json!({ "brandName": "Akmal Savdo", "classes": [35] })),
    )
    .await;
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/review-brand"),
        Some(&reviewer),
        Some(json!({ "approved": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let version = body["job"]["version"].as_i64().unwrap();

    // A mistyped expectedVersion must not be dropped
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/start-documents"),
        Some(&operator),
        Some(json!({ "comment": "note", "expectedVersion": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let req = Request::builder()
        .method("POST")
        .uri(job_uri("/start-documents"))
        .header(header::AUTHORIZATION, format!("Bearer {}", operator))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "GET", &job_uri(""), Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "approved");
    assert_eq!(body["job"]["version"], version);

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/start-documents"),
        Some(&operator),
        Some(json!({ "expectedVersion": version - 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, body) = call(&app, "POST", &job_uri("/start-documents"), Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_pending");

    let submit = json!({
        "personType": "yuridik",
        "docs": {
            "companyName": "Akmal Savdo MChJ",
            "companyAddress": "Toshkent",
            "stir": "123456789"
        }
    });
    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/submit-documents"),
        Some(&operator),
        Some(submit.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_submitted");
    assert_eq!(body["job"]["personDocs"]["personType"], "yuridik");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/return-documents"),
        Some(&reviewer),
        Some(json!({ "reason": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "reason");

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/return-documents"),
        Some(&reviewer),
        Some(json!({ "reason": "stir xato" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_returned");
    assert_eq!(body["job"]["comments"], "stir xato");

    let (status, body) = call(&app, "GET", "/api/jobs?section=yangi", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = call(
        &app,
        "POST",
        &job_uri("/submit-documents"),
        Some(&operator),
        Some(submit),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "documents_submitted");
    assert_eq!(body["job"]["history"].as_array().unwrap().len(), 6);
}
