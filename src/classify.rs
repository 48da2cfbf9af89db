//! Candidate selection: which packages and versions migrate.

use crate::feed::{Package, Version};

/// A package together with the subset of its versions selected for
/// migration. Built by [`select`], pruned by the driver as downloads fail,
/// consumed by the publisher.
#[derive(Debug, Clone)]
pub struct MigrationCandidate {
    pub package: Package,
    pub versions: Vec<Version>,
}

impl MigrationCandidate {
    /// Comma-separated version strings for operator-facing listings.
    pub fn version_list(&self) -> String {
        self.versions
            .iter()
            .map(|v| v.version.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whether a package's normalized name marks it as internally owned.
pub fn name_matches(package: &Package, marker: &str) -> bool {
    package.normalized_name.contains(marker)
}

/// Selects the versions of a package that should migrate.
///
/// A version qualifies when its provenance chain is empty, meaning it was
/// published by an internal author and never resolved through an upstream
/// mirror. A package with no qualifying version is dropped entirely; a
/// package with at least one is kept with only the qualifying versions.
pub fn select(package: Package, versions: Vec<Version>, marker: &str) -> Option<MigrationCandidate> {
    if !name_matches(&package, marker) {
        return None;
    }

    let selected: Vec<Version> = versions.into_iter().filter(Version::is_internal).collect();
    if selected.is_empty() {
        return None;
    }

    Some(MigrationCandidate {
        package,
        versions: selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::UpstreamSource;

    fn package(name: &str) -> Package {
        Package {
            id: format!("id-{}", name),
            name: name.to_string(),
            normalized_name: name.to_string(),
        }
    }

    fn internal(version: &str) -> Version {
        Version {
            version: version.to_string(),
            source_chain: vec![],
        }
    }

    fn mirrored(version: &str) -> Version {
        Version {
            version: version.to_string(),
            source_chain: vec![UpstreamSource {
                name: Some("npmjs".to_string()),
                source_type: Some("public".to_string()),
            }],
        }
    }

    #[test]
    fn test_package_with_internal_version_is_selected() {
        let candidate = select(package("custom-a"), vec![internal("1.0.0")], "custom").unwrap();
        assert_eq!(candidate.package.name, "custom-a");
        assert_eq!(candidate.versions.len(), 1);
        assert_eq!(candidate.versions[0].version, "1.0.0");
    }

    #[test]
    fn test_name_marker_miss_is_dropped() {
        // Scenario: "custom-a" qualifies, "other-b" does not match the marker.
        assert!(select(package("custom-a"), vec![internal("1.0.0")], "custom").is_some());
        assert!(select(package("other-b"), vec![internal("1.0.0")], "custom").is_none());
    }

    #[test]
    fn test_only_empty_chain_versions_are_kept() {
        // Scenario: "custom-c" has v1 with one provenance hop and v2 with none;
        // only v2 migrates.
        let candidate = select(
            package("custom-c"),
            vec![mirrored("1.0.0"), internal("2.0.0")],
            "custom",
        )
        .unwrap();

        assert_eq!(candidate.versions.len(), 1);
        assert_eq!(candidate.versions[0].version, "2.0.0");
    }

    #[test]
    fn test_package_without_qualifying_versions_is_dropped() {
        let result = select(
            package("custom-d"),
            vec![mirrored("1.0.0"), mirrored("1.1.0")],
            "custom",
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_package_without_versions_is_dropped() {
        assert!(select(package("custom-e"), vec![], "custom").is_none());
    }

    #[test]
    fn test_listing_order_is_preserved() {
        let candidate = select(
            package("custom-f"),
            vec![
                internal("0.1.0"),
                mirrored("0.2.0"),
                internal("0.3.0"),
                internal("0.4.0"),
            ],
            "custom",
        )
        .unwrap();

        let versions: Vec<&str> = candidate.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["0.1.0", "0.3.0", "0.4.0"]);
        assert_eq!(candidate.version_list(), "0.1.0, 0.3.0, 0.4.0");
    }

    #[test]
    fn test_marker_matches_substring_anywhere() {
        let pkg = Package {
            id: "x".to_string(),
            name: "Tools-Custom-Http".to_string(),
            normalized_name: "tools-custom-http".to_string(),
        };
        assert!(name_matches(&pkg, "custom"));
        assert!(!name_matches(&pkg, "internal"));
    }
}
