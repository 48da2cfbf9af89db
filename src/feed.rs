//! Source feed model and listing client.
//!
//! Listing is the one place where an error must abort the whole run: an
//! incomplete package or version listing would silently leave migration
//! candidates behind.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::http::HttpClient;

pub const DEFAULT_FEEDS_URL: &str = "https://feeds.dev.azure.com";

/// A package in the source feed.
#[derive(Debug, Clone)]
pub struct Package {
    /// Opaque source-registry id, used for version listing.
    pub id: String,
    /// Display name, used in download URLs and the rewritten manifest.
    pub name: String,
    /// Normalized name, used for internal-ownership detection.
    pub normalized_name: String,
}

/// A single published version of a package.
#[derive(Debug, Clone)]
pub struct Version {
    pub version: String,
    /// Upstream sources the version was resolved through. Empty means the
    /// version was published directly by an internal author.
    pub source_chain: Vec<UpstreamSource>,
}

impl Version {
    pub fn is_internal(&self) -> bool {
        self.source_chain.is_empty()
    }
}

/// One hop in a version's provenance chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
}

/// Wire types of the feed REST API (internal).
mod api {
    use serde::Deserialize;

    use super::UpstreamSource;

    #[derive(Deserialize, Debug)]
    pub struct Listing<T> {
        pub value: Vec<T>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct PackageEntry {
        pub id: String,
        pub name: String,
        pub normalized_name: String,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct VersionEntry {
        pub version: String,
        #[serde(default)]
        pub source_chain: Vec<UpstreamSource>,
    }
}

impl From<api::PackageEntry> for Package {
    fn from(entry: api::PackageEntry) -> Self {
        Package {
            id: entry.id,
            name: entry.name,
            normalized_name: entry.normalized_name,
        }
    }
}

impl From<api::VersionEntry> for Version {
    fn from(entry: api::VersionEntry) -> Self {
        Version {
            version: entry.version,
            source_chain: entry.source_chain,
        }
    }
}

/// Read-only view of a source feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn list_packages(&self) -> Result<Vec<Package>>;
    async fn list_versions(&self, package_id: &str) -> Result<Vec<Version>>;
}

/// Azure DevOps Artifacts implementation of [`FeedSource`].
pub struct AzureDevOpsFeed {
    http: HttpClient,
    org: String,
    feed_id: String,
    feeds_url: String,
}

impl AzureDevOpsFeed {
    pub fn new(http: HttpClient, org: &str, feed_id: &str, feeds_url: Option<String>) -> Self {
        Self {
            http,
            org: org.to_string(),
            feed_id: feed_id.to_string(),
            feeds_url: feeds_url.unwrap_or_else(|| DEFAULT_FEEDS_URL.to_string()),
        }
    }
}

#[async_trait]
impl FeedSource for AzureDevOpsFeed {
    #[tracing::instrument(skip(self))]
    async fn list_packages(&self) -> Result<Vec<Package>> {
        let url = format!(
            "{}/{}/_apis/packaging/Feeds/{}/packages?api-version=7.0",
            self.feeds_url, self.org, self.feed_id
        );

        debug!("Listing packages from {}...", url);

        let listing: api::Listing<api::PackageEntry> = self
            .http
            .get_json(&url)
            .await
            .context("Failed to list packages from the source feed")?;

        Ok(listing.value.into_iter().map(Package::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_versions(&self, package_id: &str) -> Result<Vec<Version>> {
        let url = format!(
            "{}/{}/_apis/packaging/Feeds/{}/Packages/{}/versions?api-version=7.0",
            self.feeds_url, self.org, self.feed_id, package_id
        );

        debug!("Listing versions from {}...", url);

        let listing: api::Listing<api::VersionEntry> = self
            .http
            .get_json(&url)
            .await
            .context("Failed to list package versions from the source feed")?;

        Ok(listing.value.into_iter().map(Version::from).collect())
    }
}
