//! Single-shot client that asks the quote service for the current bid and
//! writes it to a local text file.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::core::config::ClientConfig;
use crate::core::{ClientError, Deadline, QuoteResponse};

pub struct QuoteClient {
    service_url: String,
    output_path: PathBuf,
    label: String,
    client: reqwest::Client,
}

impl QuoteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent("cotacao/1.0")
            .build()
            .map_err(|e| ClientError::Call(e.to_string()))?;

        Ok(QuoteClient {
            service_url: config.service_url.clone(),
            output_path: config.output_path.clone(),
            label: config.label.clone(),
            client,
        })
    }

    /// Calls the service and extracts the bid, giving up once `deadline` passes.
    #[instrument(name = "QuoteServiceCall", skip(self), fields(url = %self.service_url, budget = %deadline))]
    pub async fn fetch_bid(&self, deadline: Deadline) -> Result<String, ClientError> {
        deadline
            .run(self.request())
            .await
            .map_err(|e| ClientError::Call(e.to_string()))?
    }

    async fn request(&self) -> Result<String, ClientError> {
        let response = self
            .client
            .get(&self.service_url)
            .send()
            .await
            .map_err(|e| ClientError::Call(e.to_string()))?;

        debug!(response = ?response, "Received service response");

        if response.status() != reqwest::StatusCode::OK {
            return Err(ClientError::Call(format!(
                "service returned status {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Call(e.to_string()))?;

        let body: QuoteResponse =
            serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))?;
        if body.bid.is_empty() {
            return Err(ClientError::Decode("empty `bid` in response".to_string()));
        }
        Ok(body.bid)
    }

    /// Fetches the bid and overwrites the artifact. The artifact is left
    /// untouched on any failure.
    pub async fn run(&self, deadline: Deadline) -> Result<PathBuf, ClientError> {
        let bid = self.fetch_bid(deadline).await?;
        write_artifact(&self.output_path, &self.label, &bid)?;
        info!("Quote saved to file: {}", self.output_path.display());
        Ok(self.output_path.clone())
    }
}

pub fn format_artifact(label: &str, bid: &str) -> String {
    format!("{label}: {bid}")
}

/// Replaces `path` with a single `"<label>: <bid>"` line.
///
/// The content goes to a sibling temporary file first and is renamed over
/// `path`, so a failed write never leaves a truncated artifact behind.
pub fn write_artifact(path: &Path, label: &str, bid: &str) -> Result<(), ClientError> {
    let wrap = |source: std::io::Error| ClientError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, format_artifact(label, bid)).map_err(wrap)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        wrap(e)
    })
}
