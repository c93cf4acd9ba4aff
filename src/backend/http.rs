//! reqwest-based implementation of the backend traits.
//!
//! All wire shapes live here as private serde structs and are normalized
//! into the crate's own types at this boundary, including the one-time
//! decomposition of `download_url` into a structured
//! [`DownloadDescriptor`].

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{
    CreationStrategy, DownloadDescriptor, ExportId, ExportJob, FilterCriteria, JobStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExportBackend, IdPage, RecordSource, StatusSnapshot};

/// HTTP client for the export backend
///
/// Implements both [`RecordSource`] and [`ExportBackend`] against the JSON
/// API. Every request carries the configured bearer token and the
/// transport-level request timeout.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    records_path: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct DirectCreateResponse {
    export_id: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    record_count: u64,
    status: JobStatus,
}

#[derive(Deserialize)]
struct ChunkedCreateResponse {
    export_id: String,
    total_count: u64,
    status: JobStatus,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: JobStatus,
    #[serde(default)]
    progress_percentage: Option<u8>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    uuids: Vec<String>,
    count: u64,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl HttpBackend {
    /// Create an HTTP backend from connectivity configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            records_path: "records".to_string(),
        })
    }

    /// Override the record collection path segment (default: "records")
    ///
    /// Listing and counting requests go to `{base}/{records_path}/uuids` and
    /// `{base}/{records_path}/count`.
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map a non-success response into [`Error::Backend`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::Backend {
            status: status.as_u16(),
            message: if message.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                message
            },
        })
    }

    fn criteria_params(criteria: &FilterCriteria) -> Vec<(String, String)> {
        match criteria {
            FilterCriteria::Params(params) => params.clone(),
            FilterCriteria::SourceUrl(url) => vec![("source_url".to_string(), url.clone())],
        }
    }
}

/// Decompose a backend download URL into a structured descriptor.
///
/// The URL shape is `.../exports/{id}/download?token=...`. Returns `None`
/// when either the export id or the token cannot be recovered; callers
/// treat the absence as "artifact not retrievable" rather than inventing a
/// partial descriptor.
pub(crate) fn parse_download_url(raw: &str) -> Option<DownloadDescriptor> {
    let url = url::Url::parse(raw).ok()?;
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())?;
    if token.is_empty() {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    let export_id = match segments.as_slice() {
        [.., id, "download"] if !id.is_empty() => (*id).to_string(),
        _ => return None,
    };

    Some(DownloadDescriptor {
        export_id: ExportId::new(export_id),
        token,
    })
}

#[async_trait::async_trait]
impl RecordSource for HttpBackend {
    async fn list_ids(
        &self,
        criteria: &FilterCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<IdPage> {
        let url = format!("{}/{}/uuids", self.base_url, self.records_path);
        let mut params = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        params.extend(Self::criteria_params(criteria));

        let response = self.get(url).query(&params).send().await?;
        let body: ListResponse = Self::check_status(response).await?.json().await?;

        let is_last = body.ids_exhausted(offset, limit);
        Ok(IdPage {
            ids: body.uuids,
            is_last,
        })
    }

    async fn count(&self, criteria: &FilterCriteria) -> Result<u64> {
        let url = format!("{}/{}/count", self.base_url, self.records_path);
        let params = Self::criteria_params(criteria);

        let response = self.get(url).query(&params).send().await?;
        let body: CountResponse = Self::check_status(response).await?.json().await?;
        Ok(body.count)
    }
}

impl ListResponse {
    /// Whether this page is the final one for its window
    fn ids_exhausted(&self, offset: usize, limit: usize) -> bool {
        self.uuids.len() < limit || (offset + self.uuids.len()) as u64 >= self.count
    }
}

#[async_trait::async_trait]
impl ExportBackend for HttpBackend {
    async fn create_export(&self, ids: &[String]) -> Result<ExportJob> {
        let url = format!("{}/exports", self.base_url);
        let response = self
            .post(url)
            .json(&CreateRequest { ids })
            .send()
            .await?;
        let body: DirectCreateResponse = Self::check_status(response).await?.json().await?;

        tracing::debug!(
            export_id = %body.export_id,
            record_count = body.record_count,
            status = %body.status,
            "direct export created"
        );

        let descriptor = body.download_url.as_deref().and_then(parse_download_url);
        Ok(ExportJob {
            id: ExportId::new(body.export_id),
            status: body.status,
            strategy: CreationStrategy::Direct,
            record_count: body.record_count,
            progress_percentage: if body.status == JobStatus::Completed {
                100
            } else {
                0
            },
            descriptor,
            expires_at: body.expires_at,
            error_message: None,
        })
    }

    async fn create_chunked_export(&self, ids: &[String]) -> Result<ExportJob> {
        let url = format!("{}/exports/chunked", self.base_url);
        let response = self
            .post(url)
            .json(&CreateRequest { ids })
            .send()
            .await?;
        let body: ChunkedCreateResponse = Self::check_status(response).await?.json().await?;

        tracing::debug!(
            export_id = %body.export_id,
            total_count = body.total_count,
            status = %body.status,
            "chunked export created"
        );

        Ok(ExportJob {
            id: ExportId::new(body.export_id),
            status: body.status,
            strategy: CreationStrategy::Chunked,
            record_count: body.total_count,
            progress_percentage: 0,
            descriptor: None,
            expires_at: None,
            error_message: None,
        })
    }

    async fn fetch_status(&self, id: &ExportId) -> Result<StatusSnapshot> {
        let url = format!("{}/exports/{}/status", self.base_url, id);
        let response = self.get(url).send().await?;
        let body: StatusResponse = Self::check_status(response).await?.json().await?;

        Ok(StatusSnapshot {
            status: body.status,
            progress_percentage: body.progress_percentage.unwrap_or(0),
            descriptor: body.download_url.as_deref().and_then(parse_download_url),
            error_message: body.error_message,
        })
    }

    async fn fetch_artifact(&self, descriptor: &DownloadDescriptor) -> Result<Vec<u8>> {
        let url = format!(
            "{}/exports/{}/download",
            self.base_url, descriptor.export_id
        );
        let response = self
            .get(url)
            .query(&[("token", descriptor.token.as_str())])
            .send()
            .await?;
        let bytes = Self::check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
