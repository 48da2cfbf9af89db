use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use std::io::prelude::*;
use tar::Builder;
use tempfile::tempdir;

fn npm_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(content.len() as u64);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_download_only_run_end_to_end() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_packages = server
        .mock(
            "GET",
            "/myorg/_apis/packaging/Feeds/myfeed/packages?api-version=7.0",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "count": 2,
                "value": [
                    {"id": "p1", "name": "custom-a", "normalizedName": "custom-a"},
                    {"id": "p2", "name": "other-b", "normalizedName": "other-b"}
                ]
            }"#,
        )
        .create();

    let _mock_versions = server
        .mock(
            "GET",
            "/myorg/_apis/packaging/Feeds/myfeed/Packages/p1/versions?api-version=7.0",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "count": 2,
                "value": [
                    {"version": "1.0.0", "sourceChain": []},
                    {
                        "version": "1.1.0",
                        "sourceChain": [{"name": "npmjs", "sourceType": "public"}]
                    }
                ]
            }"#,
        )
        .create();

    let tarball = npm_tarball(&[(
        "package/package.json",
        r#"{"name":"custom-a","version":"1.0.0"}"#,
    )]);
    let _mock_content = server
        .mock(
            "GET",
            "/myorg/_apis/packaging/feeds/myfeed/npm/packages/custom-a/versions/1.0.0/content?api-version=7.0",
        )
        .with_status(200)
        .with_body(tarball)
        .create();

    let tmp = tempdir().unwrap();
    let workdir = tmp.path().join("run");

    Command::cargo_bin("feedlift")
        .unwrap()
        .env_remove("AZURE_PAT")
        .env_remove("GITHUB_PAT")
        .args([
            "--source-org",
            "myorg",
            "--source-feed",
            "myfeed",
            "--source-token",
            "secret",
        ])
        .arg("--feeds-url")
        .arg(&url)
        .arg("--pkgs-url")
        .arg(&url)
        .arg("--workdir")
        .arg(&workdir)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Number of packages to analyze in the source feed: 2",
        ))
        .stdout(predicate::str::contains(
            "Number of packages selected for migration: 1",
        ))
        .stdout(predicate::str::contains("Number of versions downloaded: 1"))
        .stdout(predicate::str::contains("custom-a, with version(s): [1.0.0]"));

    // The internally-authored version was extracted into the working tree;
    // the mirrored one was left behind.
    assert!(workdir.join("custom-a/1.0.0/package/package.json").exists());
    assert!(!workdir.join("custom-a/1.1.0").exists());
    assert!(!workdir.join("other-b").exists());
}

#[test]
fn test_missing_source_credential_aborts_with_guidance() {
    Command::cargo_bin("feedlift")
        .unwrap()
        .env_remove("AZURE_PAT")
        .args(["--source-org", "myorg", "--source-feed", "myfeed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AZURE_PAT"))
        .stderr(predicate::str::contains("--source-token"));
}

#[test]
fn test_publish_without_dest_org_aborts_before_any_network_activity() {
    Command::cargo_bin("feedlift")
        .unwrap()
        .env_remove("AZURE_PAT")
        .env_remove("GITHUB_PAT")
        .args([
            "--source-org",
            "myorg",
            "--source-feed",
            "myfeed",
            "--source-token",
            "secret",
            "--dest-token",
            "ghp",
            "--publish",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dest-org"));
}

#[test]
fn test_unsupported_ecosystem_is_rejected() {
    Command::cargo_bin("feedlift")
        .unwrap()
        .env_remove("AZURE_PAT")
        .args([
            "--source-org",
            "myorg",
            "--source-feed",
            "myfeed",
            "--source-token",
            "secret",
            "--ecosystem",
            "nuget",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only npm feeds are supported"));
}

#[test]
fn test_listing_failure_fails_the_whole_run() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_packages = server
        .mock(
            "GET",
            "/myorg/_apis/packaging/Feeds/myfeed/packages?api-version=7.0",
        )
        .with_status(401)
        .create();

    let tmp = tempdir().unwrap();

    Command::cargo_bin("feedlift")
        .unwrap()
        .env_remove("AZURE_PAT")
        .args([
            "--source-org",
            "myorg",
            "--source-feed",
            "myfeed",
            "--source-token",
            "bad-secret",
        ])
        .arg("--feeds-url")
        .arg(&url)
        .arg("--pkgs-url")
        .arg(&url)
        .arg("--workdir")
        .arg(tmp.path().join("run"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to list packages"));
}
