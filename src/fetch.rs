//! Downloads version archives into the run's working tree.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use tar::Archive;

use crate::config::Ecosystem;
use crate::http::HttpClient;

pub const DEFAULT_PKGS_URL: &str = "https://pkgs.dev.azure.com";

/// Fetches package version content from the source feed.
pub struct Fetcher {
    http: HttpClient,
    org: String,
    feed_id: String,
    ecosystem: Ecosystem,
    pkgs_url: String,
    workdir: PathBuf,
}

impl Fetcher {
    pub fn new(
        http: HttpClient,
        org: &str,
        feed_id: &str,
        ecosystem: Ecosystem,
        workdir: PathBuf,
        pkgs_url: Option<String>,
    ) -> Self {
        Self {
            http,
            org: org.to_string(),
            feed_id: feed_id.to_string(),
            ecosystem,
            pkgs_url: pkgs_url.unwrap_or_else(|| DEFAULT_PKGS_URL.to_string()),
            workdir,
        }
    }

    /// Downloads one version's content archive.
    ///
    /// With `extract` the stream is treated as a gzipped tarball and unpacked
    /// into `<workdir>/<name>/<version>/`; otherwise the archive is saved as
    /// the file `<workdir>/<name>/<version>`. Returns the destination path.
    /// A failure leaves no partial destination behind.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, package_name: &str, version: &str, extract: bool) -> Result<PathBuf> {
        let package_dir = self.workdir.join(package_name);
        fs::create_dir_all(&package_dir)
            .with_context(|| format!("Failed to create {:?}", package_dir))?;

        let url = format!(
            "{}/{}/_apis/packaging/feeds/{}/{}/packages/{}/versions/{}/content?api-version=7.0",
            self.pkgs_url, self.org, self.feed_id, self.ecosystem, package_name, version
        );

        let archive_path = package_dir.join(format!("{}.tgz", version));
        let mut file = fs::File::create(&archive_path)
            .with_context(|| format!("Failed to create {:?}", archive_path))?;

        let download = self.http.download(&url, &mut file).await;
        drop(file);
        if let Err(err) = download {
            let _ = fs::remove_file(&archive_path);
            return Err(err.context(format!("Failed to download {} {}", package_name, version)));
        }

        let dest = package_dir.join(version);
        if extract {
            if let Err(err) = unpack_tarball(&archive_path, &dest) {
                let _ = fs::remove_dir_all(&dest);
                let _ = fs::remove_file(&archive_path);
                return Err(err);
            }
            fs::remove_file(&archive_path)
                .with_context(|| format!("Failed to remove {:?}", archive_path))?;
        } else {
            fs::rename(&archive_path, &dest)
                .with_context(|| format!("Failed to move archive to {:?}", dest))?;
        }

        info!("Fetched {} {} into {:?}", package_name, version, dest);
        Ok(dest)
    }
}

fn unpack_tarball(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open {:?}", archive_path))?;
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {:?}", dest))?;

    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .with_context(|| format!("Failed to extract {:?} into {:?}", archive_path, dest))?;
    Ok(())
}
