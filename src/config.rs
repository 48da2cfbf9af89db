//! Command line surface and run configuration.
//!
//! All configuration checks happen here, before any network activity: a run
//! with a missing credential or an incomplete destination must fail with
//! actionable guidance instead of half-way through the migration.

use anyhow::{Result, bail};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// feedlift - migrate internally-published packages between feeds
///
/// Lists the packages of an Azure DevOps Artifacts feed, keeps the ones that
/// were authored internally (never resolved through a public upstream),
/// downloads their version archives and optionally republishes them to
/// GitHub Packages under a new organization scope.
///
/// Without --publish the run stops after downloading and prints a summary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Azure DevOps organization name
    #[arg(long = "source-org", value_name = "ORG")]
    pub source_org: String,

    /// Azure DevOps feed id or name
    #[arg(long = "source-feed", value_name = "FEED")]
    pub source_feed: String,

    /// Package ecosystem of the feed (only "npm" is supported)
    #[arg(long, value_name = "TYPE", default_value = "npm")]
    pub ecosystem: String,

    /// Substring of the normalized name that marks internally-owned packages
    #[arg(long = "name-marker", value_name = "SUBSTRING", default_value = "custom")]
    pub name_marker: String,

    /// Working directory for downloads (wiped at run start)
    #[arg(long, value_name = "PATH", default_value = "./tmp")]
    pub workdir: PathBuf,

    /// Publish the migrated packages to GitHub Packages (download-only otherwise)
    #[arg(long)]
    pub publish: bool,

    /// Pause for operator acknowledgment after each published package
    #[arg(long)]
    pub step: bool,

    /// Publish only the first package, then stop (useful for a trial run)
    #[arg(long)]
    pub first: bool,

    /// Azure DevOps PAT with packaging read scope
    #[arg(
        long = "source-token",
        env = "AZURE_PAT",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub source_token: Option<String>,

    /// GitHub PAT with packages write scope (required with --publish)
    #[arg(
        long = "dest-token",
        env = "GITHUB_PAT",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub dest_token: Option<String>,

    /// GitHub organization receiving the packages (required with --publish)
    #[arg(long = "dest-org", value_name = "ORG")]
    pub dest_org: Option<String>,

    /// GitHub feed identifier (GitHub Packages namespaces by organization,
    /// so this is accepted but currently unused)
    #[arg(long = "dest-feed", value_name = "FEED")]
    pub dest_feed: Option<String>,

    /// Base URL of the feed listing API (defaults to https://feeds.dev.azure.com)
    #[arg(long = "feeds-url", value_name = "URL")]
    pub feeds_url: Option<String>,

    /// Base URL of the package content API (defaults to https://pkgs.dev.azure.com)
    #[arg(long = "pkgs-url", value_name = "URL")]
    pub pkgs_url: Option<String>,
}

impl Cli {
    /// Validate the raw arguments into a [`RunConfig`].
    pub fn into_config(self) -> Result<RunConfig> {
        let ecosystem: Ecosystem = self.ecosystem.parse()?;

        let token = match self.source_token {
            Some(token) if !token.is_empty() => token,
            _ => bail!(
                "A source feed credential is required. \
                 Pass --source-token or set the AZURE_PAT environment variable \
                 (packaging read scope)."
            ),
        };

        let publish = if self.publish {
            let Some(org) = self.dest_org else {
                bail!("--publish requires a destination organization. Add --dest-org <ORG>.");
            };
            let Some(token) = self.dest_token else {
                bail!(
                    "--publish requires a destination credential. \
                     Pass --dest-token or set the GITHUB_PAT environment variable \
                     (packages write scope)."
                );
            };
            Some(DestConfig {
                org,
                token,
                feed: self.dest_feed,
            })
        } else {
            None
        };

        Ok(RunConfig {
            source: SourceConfig {
                org: self.source_org,
                feed: self.source_feed,
                token,
            },
            ecosystem,
            name_marker: self.name_marker,
            workdir: self.workdir,
            step: self.step,
            first_only: self.first,
            publish,
            feeds_url: self.feeds_url,
            pkgs_url: self.pkgs_url,
        })
    }
}

/// Package ecosystem of the source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Npm,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ecosystem::Npm => write!(f, "npm"),
        }
    }
}

impl FromStr for Ecosystem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npm" => Ok(Ecosystem::Npm),
            _ => bail!("Unsupported ecosystem: {}. Only npm feeds are supported.", s),
        }
    }
}

/// Where packages are read from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub org: String,
    pub feed: String,
    pub token: String,
}

/// Where packages are published to. Present only when --publish was given.
#[derive(Debug, Clone)]
pub struct DestConfig {
    pub org: String,
    pub token: String,
    pub feed: Option<String>,
}

/// A validated run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub ecosystem: Ecosystem,
    pub name_marker: String,
    pub workdir: PathBuf,
    pub step: bool,
    pub first_only: bool,
    pub publish: Option<DestConfig>,
    pub feeds_url: Option<String>,
    pub pkgs_url: Option<String>,
}
