//! Shared fixtures for rolemine-wizard integration tests

#![allow(dead_code)]

use axum::{
    extract::Multipart,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rolemine_common::config::{FailurePolicy, IngestionMode, DEFAULT_MAX_FILE_SIZE_BYTES};
use rolemine_common::models::MiningConfig;
use rolemine_common::EventBus;
use rolemine_wizard::client::BackendClient;
use rolemine_wizard::ingest::UploadFile;
use rolemine_wizard::wizard::{ControllerSettings, WizardController};
use serde_json::{json, Value};
use std::time::Duration;

/// Nothing listens on the discard port
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

pub const BOUNDARY: &str = "rolemine-test-boundary";

/// The five required CSV files
pub fn csv_batch() -> Vec<UploadFile> {
    vec![
        UploadFile::new(
            "users.csv",
            "id,username,email,ou\n1,john.doe,john@example.com,IT Department\n2,jane.smith,jane@example.com,HR Division\n3,bob.lee,bob@example.com,Finance Department\n",
        ),
        UploadFile::new("ou.csv", "id,name\n1,IT Department\n2,HR Division\n3,Finance Department\n"),
        UploadFile::new("applications.csv", "id,name\n1,Email System\n2,HR Portal\n"),
        UploadFile::new(
            "entitlements.csv",
            "id,name,application\n1,Email Access,Email System\n2,HR Read,HR Portal\n",
        ),
        UploadFile::new(
            "assignment.csv",
            "user,entitlement\njohn.doe,Email Access\njane.smith,HR Read\nbob.lee,Email Access\njane.smith,Email Access\n",
        ),
    ]
}

pub fn controller(base_url: &str, on_failure: FailurePolicy, ingestion: IngestionMode) -> WizardController {
    let client = BackendClient::new(base_url, Duration::from_secs(5)).expect("client");
    WizardController::new(
        client,
        ControllerSettings {
            on_failure,
            ingestion,
            max_file_size: DEFAULT_MAX_FILE_SIZE_BYTES,
        },
        EventBus::new(64),
    )
}

pub fn unreachable_controller(on_failure: FailurePolicy) -> WizardController {
    controller(UNREACHABLE_BACKEND, on_failure, IngestionMode::Local)
}

/// Multipart body holding `files`, one part per file under its upload field
pub fn multipart_body(files: &[UploadFile]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, file) in files.iter().enumerate() {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file{}\"; filename=\"{}\"\r\n",
                i, file.name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
        body.extend_from_slice(&file.contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Raw AI suggestions in the noisy shape a model produces
pub fn noisy_ai_suggestions() -> Value {
    json!([
        {
            "id": 1,
            "name": "**Finance Team** Key permissions: view, edit",
            "applications": ["**Justification**", "SAP", "sap"],
            "userCount": "12",
            "confidence": "81%"
        },
        {
            "id": 2,
            "name": "Finance Approvers",
            "applications": ["SAP"],
            "userCount": 4,
            "confidence": 64
        },
        {
            "id": 3,
            "name": "Help Desk Support Agents",
            "applications": ["ServiceNow", "Email System"],
            "users": ["ann", "raj", "li"],
            "permissions": ["ticket.read", "ticket.write"]
        }
    ])
}

async fn run_mining(Json(config): Json<MiningConfig>) -> Json<Value> {
    Json(json!([
        {
            "id": 11,
            "name": "Backend Role A",
            "userCount": config.min_users_per_role * 10,
            "applications": ["Email System", "HR Portal"],
            "permissionCount": config.max_permissions_per_role
        },
        {
            "id": 12,
            "name": "Backend Role B",
            "userCount": 5,
            "applications": ["CRM"],
            "permissionCount": 2
        }
    ]))
}

async fn ai_suggest() -> Json<Value> {
    Json(noisy_ai_suggestions())
}

async fn applications() -> Json<Value> {
    Json(json!([{"id": 1, "name": "Email System"}, {"id": "APP-2", "name": "HR Portal"}]))
}

async fn organizational_units() -> Json<Value> {
    Json(json!([{"id": 1, "name": "IT Department"}]))
}

async fn upload(mut multipart: Multipart) -> StatusCode {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        fields.push(field.name().unwrap_or_default().to_string());
    }
    let expected = ["applications", "assignments", "entitlements", "ou", "users"];
    fields.sort();
    if fields == expected {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

async fn data_summary() -> Json<Value> {
    Json(json!({
        "userCount": 120,
        "organizationalUnitCount": 8,
        "applicationCount": 14,
        "entitlementCount": 230,
        "assignmentCount": 1900
    }))
}

async fn publish_roles(Json(roles): Json<Vec<Value>>) -> Json<Value> {
    Json(json!({ "added": roles.len() }))
}

/// In-process backend implementing the full REST contract
pub async fn spawn_fake_backend() -> String {
    let app = Router::new()
        .route("/api/role-mining/run", post(run_mining))
        .route("/api/role-mining/ai-suggest", get(ai_suggest))
        .route("/api/metadata/applications", get(applications))
        .route("/api/metadata/organizational-units", get(organizational_units))
        .route("/api/upload", post(upload))
        .route("/api/upload/data-summary", get(data_summary))
        .route("/api/identity-manager/roles", post(publish_roles));
    spawn(app).await
}

/// In-process backend answering 500 to everything
pub async fn spawn_failing_backend() -> String {
    let app = Router::new().fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "mining engine down") });
    spawn(app).await
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });
    format!("http://{}", addr)
}
