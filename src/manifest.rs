//! Rewrites a package manifest for the destination registry.

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

/// Base URL of the destination npm registry.
pub const DEST_REGISTRY_URL: &str = "https://npm.pkg.github.com";

/// The package name as it appears in the destination registry.
pub fn scoped_name(package_name: &str, dest_org: &str) -> String {
    format!("@{}/{}", dest_org, package_name)
}

/// The destination registry URL scoped to an organization.
pub fn registry_url(dest_org: &str) -> String {
    format!("{}/{}", DEST_REGISTRY_URL, dest_org)
}

/// Rewrites `package.json` in place for publishing to the destination.
///
/// Sets `name` to the organization-scoped form and `publishConfig.registry`
/// to the destination registry URL; the destination rejects publishes whose
/// manifest does not declare both. Every other field is carried over as-is.
pub fn rewrite(manifest_path: &Path, package_name: &str, dest_org: &str) -> Result<()> {
    let raw = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest {:?}", manifest_path))?;
    let mut doc: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Manifest {:?} is not valid JSON", manifest_path))?;

    let fields = doc
        .as_object_mut()
        .ok_or_else(|| anyhow!("Manifest root in {:?} is not a JSON object", manifest_path))?;

    fields.insert("name".to_string(), json!(scoped_name(package_name, dest_org)));
    fields.insert(
        "publishConfig".to_string(),
        json!({ "registry": registry_url(dest_org) }),
    );

    let serialized = serde_json::to_string_pretty(&doc).context("Failed to serialize manifest")?;
    fs::write(manifest_path, serialized)
        .with_context(|| format!("Failed to write manifest {:?}", manifest_path))?;

    Ok(())
}
