use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::payload::ReportPayload;

/// HTTP client for the local analysis backend. Exposes the two endpoints the
/// popup uses: report analysis and artifact download.
pub struct ReportClient {
    http: Client,
    base_url: String,
    download_dir: PathBuf,
}

impl ReportClient {
    pub fn new(base_url: impl Into<String>, download_dir: PathBuf) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            download_dir,
        }
    }

    /// Submits a report and parses the JSON response. The status code is not
    /// inspected; a JSON error body from the backend still renders as the
    /// result, anything unparseable is the caller's failure path.
    pub async fn analyze(&self, payload: &ReportPayload) -> Result<Value> {
        let endpoint = format!("{}/analyze-work", self.base_url);
        debug!("Posting report to {endpoint}");
        let response = self.http.post(&endpoint).json(payload).send().await?;
        Ok(response.json().await?)
    }

    /// Fetches a generated artifact and saves it under the download directory
    /// with the artifact name as the filename.
    pub async fn download(&self, artifact: &str) -> Result<PathBuf> {
        // The name comes from the backend; keep only its final component.
        let name = Path::new(artifact)
            .file_name()
            .and_then(|v| v.to_str())
            .with_context(|| format!("Artifact {artifact:?} has no usable file name"))?;

        let endpoint = format!("{}/download/{name}", self.base_url);
        debug!("Downloading artifact from {endpoint}");
        let bytes = self
            .http
            .get(&endpoint)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let target = self.download_dir.join(name);
        tokio::fs::write(&target, &bytes).await?;
        Ok(target)
    }
}
