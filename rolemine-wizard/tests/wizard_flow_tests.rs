//! End-to-end wizard scenarios driven through `WizardController`

mod helpers;

use axum::{routing::post, Json, Router};
use rolemine_common::config::{FailurePolicy, IngestionMode};
use rolemine_common::models::{EntityKind, MiningConfig, ResultSource, WizardStep};
use rolemine_common::{Error, WizardEvent};
use rolemine_wizard::results::ResultsTab;
use rolemine_wizard::summary_view::SummaryView;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn default_config() -> MiningConfig {
    MiningConfig {
        min_users_per_role: 2,
        max_permissions_per_role: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_unreachable_backend_falls_back_to_three_roles() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fallback);
    let mut rx = controller.events().subscribe();

    let status = controller.upload(helpers::csv_batch()).await.unwrap();
    assert_eq!(status.step, WizardStep::Summary);

    match controller.summary_view().await {
        SummaryView::Ready { cards, .. } => {
            assert_eq!(cards.len(), 5);
            let users = cards.iter().find(|c| c.entity == EntityKind::Users).unwrap();
            assert_eq!(users.count, 3);
            let assignments = cards.iter().find(|c| c.entity == EntityKind::Assignments).unwrap();
            assert_eq!(assignments.count, 4);
        }
        SummaryView::Empty { .. } => panic!("summary should be ready"),
    }

    controller.proceed().await.unwrap();
    let status = controller.submit_config(default_config()).await.unwrap();
    assert_eq!(status.step, WizardStep::Results);
    assert!(!status.loading);

    let filter = controller.results_page(ResultsTab::Filter).await.unwrap();
    assert_eq!(filter.cards.len(), 3);
    assert_eq!(filter.source, Some(ResultSource::Fallback));

    let ai = controller.results_page(ResultsTab::Ai).await.unwrap();
    assert_eq!(ai.cards.len(), 3);
    assert_eq!(ai.source, Some(ResultSource::Fallback));

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.event_type());
    }
    assert!(seen.contains(&"BackendFallback"));
    assert!(seen.contains(&"MiningCompleted"));
    assert_eq!(seen.iter().filter(|e| **e == "StepChanged").count(), 3);
}

#[tokio::test]
async fn test_fail_policy_surfaces_network_error() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fail);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();

    let err = controller.submit_config(default_config()).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));

    let status = controller.status().await;
    assert_eq!(status.step, WizardStep::Configure);
    assert!(!status.loading);
    assert!(!status.has_results);
}

#[tokio::test]
async fn test_fake_backend_results_are_cleaned() {
    let base_url = helpers::spawn_fake_backend().await;
    let controller = helpers::controller(&base_url, FailurePolicy::Fail, IngestionMode::Local);

    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();
    let options = controller.options().await.unwrap();
    assert_eq!(options.source, ResultSource::Backend);

    controller.submit_config(default_config()).await.unwrap();

    let filter = controller.results_page(ResultsTab::Filter).await.unwrap();
    assert_eq!(filter.source, Some(ResultSource::Backend));
    assert_eq!(filter.cards[0].user_count, 20);

    let ai = controller.results_page(ResultsTab::Ai).await.unwrap();
    assert_eq!(ai.cards.len(), 2);

    let finance = &ai.cards[0];
    assert_eq!(finance.name, "Finance Team");
    assert_eq!(finance.applications.len(), 1);
    assert!(finance.applications[0].eq_ignore_ascii_case("sap"));
    assert_eq!(finance.user_count, 12);
    assert_eq!(finance.confidence, Some(81.0));

    let support = &ai.cards[1];
    assert_eq!(support.name, "Help Desk Support Agents");
    assert_eq!(support.user_count, 3);
    assert_eq!(support.permission_count, 2);
    assert_eq!(support.confidence, Some(70.0));
}

#[tokio::test]
async fn test_ai_disabled_skips_suggestions() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fallback);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();

    let config = MiningConfig {
        enable_ai: false,
        ..default_config()
    };
    controller.submit_config(config).await.unwrap();

    let ai = controller.results_page(ResultsTab::Ai).await.unwrap();
    assert!(ai.cards.is_empty());
    assert_eq!(ai.source, None);
    assert!(ai.message.is_some());
}

#[tokio::test]
async fn test_remote_ingestion_uses_backend_summary() {
    let base_url = helpers::spawn_fake_backend().await;
    let controller = helpers::controller(&base_url, FailurePolicy::Fail, IngestionMode::Remote);

    controller.upload(helpers::csv_batch()).await.unwrap();
    match controller.summary_view().await {
        SummaryView::Ready { total_records, .. } => {
            assert_eq!(total_records, 120 + 8 + 14 + 230 + 1900)
        }
        SummaryView::Empty { .. } => panic!("summary should be ready"),
    }
}

#[tokio::test]
async fn test_remote_ingestion_falls_back_to_local_parse() {
    let controller = helpers::controller(
        helpers::UNREACHABLE_BACKEND,
        FailurePolicy::Fallback,
        IngestionMode::Remote,
    );

    controller.upload(helpers::csv_batch()).await.unwrap();
    let page = controller.summary_rows(EntityKind::Users, 1).await.unwrap();
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0]["username"], "john.doe");
}

#[tokio::test]
async fn test_invalid_batch_keeps_upload_step() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fallback);
    let mut files = helpers::csv_batch();
    files.pop();

    let err = controller.upload(files).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(controller.status().await.step, WizardStep::Upload);
}

#[tokio::test]
async fn test_back_and_start_new() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fallback);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();
    controller.submit_config(default_config()).await.unwrap();

    let status = controller.back().await.unwrap();
    assert_eq!(status.step, WizardStep::Configure);
    assert_eq!(status.config, Some(default_config()));
    assert!(!status.has_results);

    controller.submit_config(default_config()).await.unwrap();
    let report = controller.report(ResultsTab::Filter).await.unwrap();
    assert!(report.filename.starts_with("RoleMiningReport_"));
    assert_eq!(report.contents.lines().count(), 4);

    let status = controller.start_new().await.unwrap();
    assert_eq!(status.step, WizardStep::Upload);
    assert!(!status.has_summary);
    assert!(status.config.is_none());
    assert!(matches!(
        controller.results_page(ResultsTab::Filter).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_publish_failure_is_reported() {
    let controller = helpers::unreachable_controller(FailurePolicy::Fallback);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();
    controller.submit_config(default_config()).await.unwrap();

    let err = controller.publish(ResultsTab::Filter).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

async fn slow_run(Json(_config): Json<Value>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(400)).await;
    Json(json!([{ "id": 1, "name": "Late Role", "userCount": 1, "applications": [], "permissionCount": 1 }]))
}

async fn spawn_slow_backend() -> String {
    let app = Router::new().route("/api/role-mining/run", post(slow_run));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base_url
}

#[tokio::test]
async fn test_stale_mining_response_is_discarded() {
    let base_url = spawn_slow_backend().await;

    let controller = Arc::new(helpers::controller(
        &base_url,
        FailurePolicy::Fallback,
        IngestionMode::Local,
    ));
    let mut rx = controller.events().subscribe();
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();

    let config = MiningConfig {
        enable_ai: false,
        ..default_config()
    };
    let running = {
        let controller = Arc::clone(&controller);
        let config = config.clone();
        tokio::spawn(async move { controller.submit_config(config).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(controller.status().await.loading);

    // only one backend-bound operation at a time
    assert!(matches!(
        controller.submit_config(config).await,
        Err(Error::Busy(_))
    ));

    controller.start_new().await.unwrap();

    let status = running.await.unwrap().unwrap();
    assert_eq!(status.step, WizardStep::Upload);
    assert!(!status.has_results);

    let mut discarded = false;
    while let Ok(event) = rx.try_recv() {
        if let WizardEvent::StaleResponseDiscarded { .. } = event {
            discarded = true;
        }
    }
    assert!(discarded);
}

#[tokio::test]
async fn test_cancelled_submit_clears_loading() {
    let base_url = spawn_slow_backend().await;
    let controller = helpers::controller(&base_url, FailurePolicy::Fallback, IngestionMode::Local);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();

    let config = MiningConfig {
        enable_ai: false,
        ..default_config()
    };

    // caller gives up while the backend is still working
    let cancelled =
        tokio::time::timeout(Duration::from_millis(100), controller.submit_config(config.clone())).await;
    assert!(cancelled.is_err());

    let status = controller.status().await;
    assert_eq!(status.step, WizardStep::Configure);
    assert!(!status.loading);

    let status = controller.submit_config(config).await.unwrap();
    assert_eq!(status.step, WizardStep::Results);
    let filter = controller.results_page(ResultsTab::Filter).await.unwrap();
    assert_eq!(filter.cards[0].name, "Late Role");
}

#[tokio::test]
async fn test_failed_submit_clears_loading() {
    let base_url = helpers::spawn_failing_backend().await;
    let controller = helpers::controller(&base_url, FailurePolicy::Fail, IngestionMode::Local);
    controller.upload(helpers::csv_batch()).await.unwrap();
    controller.proceed().await.unwrap();

    assert!(controller.submit_config(default_config()).await.is_err());
    assert!(!controller.status().await.loading);
    assert!(matches!(
        controller.submit_config(default_config()).await,
        Err(Error::Network(_))
    ));
}
