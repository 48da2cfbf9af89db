//! Publishes migrated packages to the destination registry.
//!
//! Publishing is the one irreversible step of a run: a pushed version cannot
//! be unpushed. The external command sits behind [`PublishCommand`] so the
//! whole loop can be exercised against a recording fake.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::classify::MigrationCandidate;
use crate::config::DestConfig;
use crate::console::Console;
use crate::manifest;

/// Captured output of one publish invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// The single capability the publisher needs from the outside world:
/// publish this directory with this credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublishCommand: Send + Sync {
    async fn publish(&self, package_dir: &Path, token: &str) -> Result<CommandOutput>;
}

/// Runs `npm publish` with the destination token in the child environment,
/// where the operator's ~/.npmrc `_authToken=${GITHUB_TOKEN}` line picks
/// it up.
pub struct NpmPublish;

#[async_trait]
impl PublishCommand for NpmPublish {
    #[tracing::instrument(skip(self, token))]
    async fn publish(&self, package_dir: &Path, token: &str) -> Result<CommandOutput> {
        let output = Command::new("npm")
            .arg("publish")
            .arg(package_dir)
            .env("GITHUB_TOKEN", token)
            .output()
            .await
            .context("Failed to run npm publish. Is npm on the PATH?")?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Per-version outcome of the publish stage.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub package: String,
    pub version: String,
    pub success: bool,
    /// The destination-visible name, set on success.
    pub new_name: Option<String>,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
}

pub struct Publisher<'a, P: PublishCommand, C: Console> {
    command: &'a P,
    console: &'a C,
    workdir: &'a Path,
    dest: &'a DestConfig,
    step: bool,
    first_only: bool,
}

impl<'a, P: PublishCommand, C: Console> Publisher<'a, P, C> {
    pub fn new(
        command: &'a P,
        console: &'a C,
        workdir: &'a Path,
        dest: &'a DestConfig,
        step: bool,
        first_only: bool,
    ) -> Self {
        Self {
            command,
            console,
            workdir,
            dest,
            step,
            first_only,
        }
    }

    /// Publishes every candidate version in listed order.
    ///
    /// A failing version is logged and skipped; the loop moves on. With
    /// `first_only` the run stops after the first package. With `step` the
    /// operator is asked to acknowledge after each package.
    pub async fn publish_all(
        &self,
        candidates: &[MigrationCandidate],
    ) -> Result<Vec<PublishResult>> {
        println!("== Before continuing, make sure your ~/.npmrc contains these 2 lines:");
        println!("       registry={}", manifest::registry_url(&self.dest.org));
        println!("       //npm.pkg.github.com/:_authToken=${{GITHUB_TOKEN}}");
        self.console
            .pause("Press Enter to continue when you are ready...")?;

        let mut results = Vec::new();
        for candidate in candidates {
            println!();
            let mut published = Vec::new();
            for version in &candidate.versions {
                let result = self
                    .publish_version(&candidate.package.name, &version.version)
                    .await;
                if result.success {
                    published.push(version.version.clone());
                }
                results.push(result);
            }

            if !published.is_empty() {
                println!(
                    "== Package published: {} (new name is {}) with version(s): [{}]",
                    candidate.package.name,
                    manifest::scoped_name(&candidate.package.name, &self.dest.org),
                    published.join(", ")
                );
            }

            if self.first_only {
                info!("Stopping after the first package as requested");
                break;
            }
            if self.step {
                self.console
                    .pause("Press Enter to move on to the next package...")?;
            }
        }

        Ok(results)
    }

    async fn publish_version(&self, package_name: &str, version: &str) -> PublishResult {
        let version_dir = self.workdir.join(package_name).join(version);
        let package_dir = version_dir.join("package");
        let stdout_log = version_dir.join("stdout.txt");
        let stderr_log = version_dir.join("stderr.txt");

        let success = match self
            .rewrite_and_publish(package_name, &package_dir, &stdout_log, &stderr_log)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    "npm publish failed for {} {}; output captured in {:?}",
                    package_name, version, stderr_log
                );
                false
            }
            Err(err) => {
                warn!("Could not publish {} {}: {:#}", package_name, version, err);
                let _ = fs::write(&stderr_log, format!("{:#}\n", err));
                false
            }
        };

        PublishResult {
            package: package_name.to_string(),
            version: version.to_string(),
            success,
            new_name: success.then(|| manifest::scoped_name(package_name, &self.dest.org)),
            stdout_log,
            stderr_log,
        }
    }

    async fn rewrite_and_publish(
        &self,
        package_name: &str,
        package_dir: &Path,
        stdout_log: &Path,
        stderr_log: &Path,
    ) -> Result<bool> {
        manifest::rewrite(&package_dir.join("package.json"), package_name, &self.dest.org)?;

        let output = self.command.publish(package_dir, &self.dest.token).await?;

        fs::write(stdout_log, &output.stdout)
            .with_context(|| format!("Failed to write {:?}", stdout_log))?;
        fs::write(stderr_log, &output.stderr)
            .with_context(|| format!("Failed to write {:?}", stderr_log))?;

        Ok(output.success)
    }
}
