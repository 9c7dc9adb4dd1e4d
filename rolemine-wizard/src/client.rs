//! Role mining backend client
//!
//! Thin reqwest wrapper over the backend REST contract. Every call returns
//! `Result<_, NetworkError>`; whether a failure is masked with placeholder data is
//! decided by the wizard controller, never here.

use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use rolemine_common::config::BackendConfig;
use rolemine_common::models::{DataSummary, DataSummaryCounts, MiningConfig, NamedOption, Role};
use rolemine_common::NetworkError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::ingest::UploadSet;

const USER_AGENT: &str = concat!("rolemine-wizard/", env!("CARGO_PKG_VERSION"));

/// Backend paths
pub mod paths {
    pub const RUN: &str = "/api/role-mining/run";
    pub const AI_SUGGEST: &str = "/api/role-mining/ai-suggest";
    pub const APPLICATIONS: &str = "/api/metadata/applications";
    pub const ORGANIZATIONAL_UNITS: &str = "/api/metadata/organizational-units";
    pub const UPLOAD: &str = "/api/upload";
    pub const DATA_SUMMARY: &str = "/api/upload/data-summary";
    pub const IDENTITY_MANAGER_ROLES: &str = "/api/identity-manager/roles";
}

/// Summary response in either shape the backend produces
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SummaryPayload {
    Counts(DataSummaryCounts),
    Full(DataSummary),
}

/// Role mining backend client
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

fn map_request_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout(e.to_string())
    } else if e.is_decode() {
        NetworkError::Decode(e.to_string())
    } else {
        NetworkError::Unreachable(e.to_string())
    }
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, NetworkError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<reqwest::Response, NetworkError> {
        tracing::debug!(path = %path, base_url = %self.base_url, "Calling backend");

        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path = %path, status = status.as_u16(), "Backend returned error status");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<T, NetworkError> {
        let response = self.send(request, path).await?;
        let bytes = response.bytes().await.map_err(map_request_error)?;
        serde_json::from_slice(&bytes).map_err(|e| NetworkError::Decode(format!("{}: {}", path, e)))
    }

    /// Run filter-based mining with the given configuration
    pub async fn run_mining(&self, config: &MiningConfig) -> Result<Vec<Role>, NetworkError> {
        let request = self.http_client.post(self.url(paths::RUN)).json(config);
        let roles: Vec<Role> = self.send_json(request, paths::RUN).await?;

        tracing::info!(roles = roles.len(), "Received filter-based roles from backend");
        Ok(roles)
    }

    /// Fetch raw AI suggestions; callers clean them
    pub async fn ai_suggestions(&self) -> Result<Vec<Value>, NetworkError> {
        let request = self.http_client.get(self.url(paths::AI_SUGGEST));
        let suggestions: Vec<Value> = self.send_json(request, paths::AI_SUGGEST).await?;

        tracing::info!(suggestions = suggestions.len(), "Received AI suggestions from backend");
        Ok(suggestions)
    }

    pub async fn applications(&self) -> Result<Vec<NamedOption>, NetworkError> {
        let request = self.http_client.get(self.url(paths::APPLICATIONS));
        self.send_json(request, paths::APPLICATIONS).await
    }

    pub async fn organizational_units(&self) -> Result<Vec<NamedOption>, NetworkError> {
        let request = self.http_client.get(self.url(paths::ORGANIZATIONAL_UNITS));
        self.send_json(request, paths::ORGANIZATIONAL_UNITS).await
    }

    /// Forward a validated batch, then read back the backend's summary
    pub async fn upload(&self, files: &UploadSet) -> Result<DataSummary, NetworkError> {
        let mut form = Form::new();
        for (kind, file) in files.iter() {
            let part = Part::bytes(file.contents.clone())
                .file_name(file.name.clone())
                .mime_str("text/csv")
                .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
            form = form.part(kind.upload_field(), part);
        }

        let request = self.http_client.post(self.url(paths::UPLOAD)).multipart(form);
        self.send(request, paths::UPLOAD).await?;
        tracing::info!(files = files.len(), "Uploaded batch to backend");

        let request = self.http_client.get(self.url(paths::DATA_SUMMARY));
        let summary = match self.send_json::<SummaryPayload>(request, paths::DATA_SUMMARY).await? {
            SummaryPayload::Full(summary) => summary,
            SummaryPayload::Counts(counts) => DataSummary::from(counts),
        };
        Ok(summary)
    }

    /// Publish roles to the identity manager; single attempt
    pub async fn publish_roles(&self, roles: &[Role]) -> Result<(), NetworkError> {
        let request = self
            .http_client
            .post(self.url(paths::IDENTITY_MANAGER_ROLES))
            .json(roles);
        self.send(request, paths::IDENTITY_MANAGER_ROLES).await?;

        tracing::info!(roles = roles.len(), "Published roles to identity manager");
        Ok(())
    }
}
