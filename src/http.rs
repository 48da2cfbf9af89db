//! Thin HTTP layer over reqwest with feed authentication.
//!
//! The source registry authenticates every read with basic auth: empty
//! username, personal access token as the password. There is no retry
//! layer; a failed request surfaces as an error and the caller decides
//! whether the run aborts or skips.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::io::Write;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    token: String,
}

impl HttpClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    /// Performs an authenticated GET and deserializes the JSON response.
    /// A non-success status or an undecodable body is an error.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .basic_auth("", Some(&self.token))
            .send()
            .await
            .context("Failed to send request")?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Request to {} failed", url))?;

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }

    /// Streams an authenticated GET response body into `writer`.
    /// Returns the number of bytes written.
    #[tracing::instrument(skip(self, writer))]
    pub async fn download<W: Write>(&self, url: &str, writer: &mut W) -> Result<u64> {
        debug!("Downloading from {}...", url);

        let response = self
            .client
            .get(url)
            .basic_auth("", Some(&self.token))
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = response
            .error_for_status()
            .with_context(|| format!("Download request to {} failed", url))?;

        let mut downloaded_bytes: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write downloaded data")?;
            downloaded_bytes += chunk.len() as u64;
        }

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}
