//! NOAA SWPC JSON feeds (GOES primary, 7-day).

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::domain::{PipelineConfig, SourceKind};
use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct NoaaClient {
    client: Client,
}

impl NoaaClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch one feed as parsed JSON.
    pub fn fetch(&self, source: SourceKind) -> Result<serde_json::Value, AppError> {
        let url = source.url();
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::network(format!("NOAA request failed for {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::network(format!(
                "NOAA request for {url} failed with status {}.",
                resp.status()
            )));
        }

        resp.json()
            .map_err(|e| AppError::network(format!("Failed to parse NOAA response from {url}: {e}")))
    }

    /// Download every feed into the data dir, named after the URL's last path segment.
    pub fn download_all(&self, config: &PipelineConfig) -> Result<Vec<PathBuf>, AppError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            AppError::io(format!("Failed to create '{}': {e}", config.data_dir.display()))
        })?;

        let mut written = Vec::with_capacity(SourceKind::ALL.len());
        for source in SourceKind::ALL {
            let body = self.fetch(source)?;
            let path = config.source_path(source);
            let file = File::create(&path)
                .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
            serde_json::to_writer_pretty(file, &body)
                .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
            info!(file = source.file_name(), path = %path.display(), "Saved dataset file");
            written.push(path);
        }
        Ok(written)
    }
}
