//! Wizard API handlers
//!
//! One route per wizard action. Handlers translate HTTP input into controller calls
//! and map `rolemine_common::Error` to status codes through `ApiError`.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rolemine_common::models::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config_form::{ConfigSubmission, MiningConfigForm};
use crate::error::{ApiError, ApiResult};
use crate::ingest::UploadFile;
use crate::results::{ResultsPage, ResultsTab, RoleDetail};
use crate::summary_view::{RowPage, SummaryView};
use crate::wizard::{ConfigOptions, PublishOutcome, WizardStatus};
use crate::AppState;

/// `?tab=filter|ai`
#[derive(Debug, Default, Deserialize)]
pub struct TabQuery {
    #[serde(default)]
    pub tab: ResultsTab,
}

/// `?page=N`
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

/// `?validate_only=true`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigQuery {
    #[serde(default)]
    pub validate_only: bool,
}

/// POST /wizard/config?validate_only=true response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValidation {
    pub valid: bool,
    pub can_submit: bool,
    pub errors: BTreeMap<&'static str, &'static str>,
}

/// GET /wizard/config response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDraft {
    #[serde(flatten)]
    pub form: MiningConfigForm,
    pub can_submit: bool,
}

/// Remember server-side failures for `/health`
async fn record_failure(state: &AppState, err: &ApiError) {
    if matches!(err, ApiError::BadGateway(_) | ApiError::Internal(_)) {
        *state.last_error.write().await = Some(err.to_string());
    }
}

async fn track<T>(state: &AppState, result: rolemine_common::Result<T>) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            let err = ApiError::from(e);
            record_failure(state, &err).await;
            Err(err)
        }
    }
}

/// GET /wizard
pub async fn get_status(State(state): State<AppState>) -> Json<WizardStatus> {
    Json(state.controller.status().await)
}

/// POST /wizard/upload
///
/// Multipart body, one part per CSV file. The part's file name decides which entity
/// it provides; a part without a file name is named after its field.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<WizardStatus>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = match (field.file_name(), field.name()) {
            (Some(file_name), _) => file_name.to_string(),
            (None, Some(field_name)) => format!("{}.csv", field_name),
            (None, None) => continue,
        };
        let contents = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
        files.push(UploadFile::new(name, contents.to_vec()));
    }

    let status = track(&state, state.controller.upload(files).await).await?;
    Ok(Json(status))
}

/// GET /wizard/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryView> {
    Json(state.controller.summary_view().await)
}

/// GET /wizard/summary/:entity
pub async fn get_summary_rows(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<RowPage>> {
    let kind: EntityKind = entity
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown entity: {}", entity)))?;
    let page = track(&state, state.controller.summary_rows(kind, query.page).await).await?;
    Ok(Json(page))
}

/// POST /wizard/reupload
pub async fn reupload(State(state): State<AppState>) -> ApiResult<Json<WizardStatus>> {
    Ok(Json(track(&state, state.controller.reupload().await).await?))
}

/// POST /wizard/proceed
pub async fn proceed(State(state): State<AppState>) -> ApiResult<Json<WizardStatus>> {
    Ok(Json(track(&state, state.controller.proceed().await).await?))
}

/// POST /wizard/back
pub async fn back(State(state): State<AppState>) -> ApiResult<Json<WizardStatus>> {
    Ok(Json(track(&state, state.controller.back().await).await?))
}

/// POST /wizard/start-new
pub async fn start_new(State(state): State<AppState>) -> ApiResult<Json<WizardStatus>> {
    Ok(Json(track(&state, state.controller.start_new().await).await?))
}

/// GET /wizard/options
pub async fn get_options(State(state): State<AppState>) -> ApiResult<Json<ConfigOptions>> {
    Ok(Json(track(&state, state.controller.options().await).await?))
}

/// GET /wizard/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigDraft> {
    let form = state.controller.config_form().await;
    let can_submit = form.can_submit();
    Json(ConfigDraft { form, can_submit })
}

/// POST /wizard/config
///
/// With `validate_only=true` the draft is checked and its field errors returned;
/// otherwise a valid draft is submitted and mining runs before the response.
pub async fn submit_config(
    State(state): State<AppState>,
    Query(query): Query<ConfigQuery>,
    Json(submission): Json<ConfigSubmission>,
) -> ApiResult<Response> {
    let form = submission.into_form();

    if query.validate_only {
        let errors = form
            .errors()
            .iter()
            .map(|(field, message)| (field.key(), *message))
            .collect::<BTreeMap<_, _>>();
        return Ok(Json(ConfigValidation {
            valid: errors.is_empty(),
            can_submit: form.can_submit(),
            errors,
        })
        .into_response());
    }

    let config = form.submit().map_err(ApiError::Validation)?;
    let status = track(&state, state.controller.submit_config(config).await).await?;
    Ok(Json(status).into_response())
}

/// GET /wizard/results
pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> ApiResult<Json<ResultsPage>> {
    Ok(Json(track(&state, state.controller.results_page(query.tab).await).await?))
}

/// GET /wizard/results/:tab/:role_id
pub async fn get_role_detail(
    State(state): State<AppState>,
    Path((tab, role_id)): Path<(String, String)>,
) -> ApiResult<Json<RoleDetail>> {
    let tab: ResultsTab = tab.parse().map_err(ApiError::Validation)?;
    let id = RecordId::parse(&role_id);
    Ok(Json(track(&state, state.controller.role_detail(tab, &id).await).await?))
}

/// GET /wizard/report
pub async fn download_report(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> ApiResult<Response> {
    let report = track(&state, state.controller.report(query.tab).await).await?;
    let disposition = format!("attachment; filename=\"{}\"", report.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.contents,
    )
        .into_response())
}

/// POST /wizard/identity-manager
pub async fn publish(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> ApiResult<Json<PublishOutcome>> {
    Ok(Json(track(&state, state.controller.publish(query.tab).await).await?))
}

/// Build wizard routes
pub fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/wizard", get(get_status))
        .route("/wizard/upload", post(upload))
        .route("/wizard/summary", get(get_summary))
        .route("/wizard/summary/:entity", get(get_summary_rows))
        .route("/wizard/reupload", post(reupload))
        .route("/wizard/proceed", post(proceed))
        .route("/wizard/back", post(back))
        .route("/wizard/start-new", post(start_new))
        .route("/wizard/options", get(get_options))
        .route("/wizard/config", get(get_config).post(submit_config))
        .route("/wizard/results", get(get_results))
        .route("/wizard/results/:tab/:role_id", get(get_role_detail))
        .route("/wizard/report", get(download_report))
        .route("/wizard/identity-manager", post(publish))
}
