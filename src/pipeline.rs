//! The migration pipeline: list, classify, download, then summarize or
//! publish.
//!
//! The candidate set is an explicit value built up stage by stage and handed
//! to the publisher; there is no shared accumulated state. Listing errors
//! abort the run, download errors only drop the affected version.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::classify::{self, MigrationCandidate};
use crate::config::RunConfig;
use crate::console::Console;
use crate::feed::FeedSource;
use crate::fetch::Fetcher;
use crate::publish::{PublishCommand, PublishResult, Publisher};

/// Terminal state of a run.
#[derive(Debug)]
pub enum Outcome {
    /// Download-only run ended with a printed summary.
    DownloadOnly,
    /// The operator declined the publish confirmation.
    Declined,
    /// Publishing ran (possibly stopped early by --first).
    Published(Vec<PublishResult>),
}

/// What a run did, for the caller and for tests.
#[derive(Debug)]
pub struct RunReport {
    pub packages_analyzed: usize,
    pub candidates: Vec<MigrationCandidate>,
    pub outcome: Outcome,
}

/// Runs the whole migration pipeline.
pub async fn run<F, C, P>(
    config: &RunConfig,
    feed: &F,
    fetcher: &Fetcher,
    console: &C,
    publish_command: &P,
) -> Result<RunReport>
where
    F: FeedSource,
    C: Console,
    P: PublishCommand,
{
    prepare_workdir(&config.workdir)?;

    let packages = feed.list_packages().await?;
    let packages_analyzed = packages.len();
    println!(
        "== Number of packages to analyze in the source feed: {}",
        packages_analyzed
    );

    let mut candidates = Vec::new();
    let mut versions_downloaded = 0usize;

    for package in packages {
        if !classify::name_matches(&package, &config.name_marker) {
            debug!("Skipping {}: name marker does not match", package.normalized_name);
            continue;
        }

        let versions = feed
            .list_versions(&package.id)
            .await
            .with_context(|| format!("Failed to list versions of {}", package.name))?;

        let Some(MigrationCandidate { package, versions }) =
            classify::select(package, versions, &config.name_marker)
        else {
            continue;
        };

        let mut downloaded = Vec::new();
        for version in versions {
            match fetcher.fetch(&package.name, &version.version, true).await {
                Ok(_) => {
                    versions_downloaded += 1;
                    downloaded.push(version);
                }
                Err(err) => {
                    warn!(
                        "Skipping {} {}: {:#}",
                        package.name, version.version, err
                    );
                }
            }
        }

        if downloaded.is_empty() {
            warn!(
                "No version of {} could be downloaded; dropping it from the migration set",
                package.name
            );
            continue;
        }

        candidates.push(MigrationCandidate {
            package,
            versions: downloaded,
        });
    }

    println!(
        "== Number of packages selected for migration: {}",
        candidates.len()
    );
    println!("== Number of versions downloaded: {}", versions_downloaded);

    let outcome = match &config.publish {
        None => {
            println!("== These packages have been downloaded from the source feed:");
            for candidate in &candidates {
                println!(
                    "   {}, with version(s): [{}]",
                    candidate.package.normalized_name,
                    candidate.version_list()
                );
            }
            Outcome::DownloadOnly
        }
        Some(_) if candidates.is_empty() => {
            println!("== Nothing to publish.");
            Outcome::DownloadOnly
        }
        Some(dest) => {
            let names: Vec<&str> = candidates
                .iter()
                .map(|c| c.package.normalized_name.as_str())
                .collect();
            println!(
                "== These packages will be published to GitHub Packages: [{}]",
                names.join(", ")
            );

            if !console.confirm("Continue?")? {
                println!("== Publishing aborted; nothing was pushed to the destination feed.");
                Outcome::Declined
            } else {
                let publisher = Publisher::new(
                    publish_command,
                    console,
                    &config.workdir,
                    dest,
                    config.step,
                    config.first_only,
                );
                let results = publisher.publish_all(&candidates).await?;

                let failed = results.iter().filter(|r| !r.success).count();
                if failed > 0 {
                    println!(
                        "== {} version(s) failed to publish; see the log files under {:?}",
                        failed, config.workdir
                    );
                }
                Outcome::Published(results)
            }
        }
    };

    Ok(RunReport {
        packages_analyzed,
        candidates,
        outcome,
    })
}

/// The working tree belongs to exactly one run: whatever a previous run left
/// behind is removed before any network activity.
fn prepare_workdir(workdir: &Path) -> Result<()> {
    if workdir.exists() {
        fs::remove_dir_all(workdir)
            .with_context(|| format!("Failed to clear working directory {:?}", workdir))?;
    }
    fs::create_dir_all(workdir)
        .with_context(|| format!("Failed to create working directory {:?}", workdir))?;
    Ok(())
}
