use std::process::{Command, Output};

use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENV_VARS: &[&str] = &[
    "BUNNY_STORAGE_ZONE_NAME",
    "BUNNY_ACCESS_KEY",
    "BUNNY_STORAGE_REGION",
    "BUNNY_MAX_CONCURRENT_UPLOADS",
    "BUNNY_STORAGE_ENDPOINT",
];

fn run_upload(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let exe = env!("CARGO_BIN_EXE_bunny-upload");
    let mut command = Command::new(exe);
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command
        .args(args)
        .envs(envs.iter().copied())
        .output()
        .expect("bunny-upload should execute")
}

#[test]
fn help_lists_primary_flags() {
    let output = run_upload(&["--help"], &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--source", "--target", "--zone", "--key", "--region", "--clean"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn missing_zone_is_reported() {
    let dir = tempdir().unwrap();
    let output = run_upload(
        &["--source", dir.path().to_str().unwrap(), "--key", "k"],
        &[],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("storage zone name is required"));
}

#[test]
fn missing_key_is_reported() {
    let dir = tempdir().unwrap();
    let output = run_upload(
        &["--source", dir.path().to_str().unwrap()],
        &[("BUNNY_STORAGE_ZONE_NAME", "zone")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("access key is required"));
}

#[test]
fn invalid_clean_mode_is_rejected() {
    let output = run_upload(&["--zone", "z", "--key", "k", "--clean", "everything"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("everything"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn uploads_directory_against_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zone/site/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/zone/site/index.html"))
        .and(header("AccessKey", "k"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/zone/site/css/app.css"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("index.html"), b"<html/>").unwrap();
    std::fs::write(dir.path().join("css/app.css"), b"body{}").unwrap();

    let uri = server.uri();
    let source = dir.path().to_str().unwrap().to_string();
    let output = tokio::task::spawn_blocking(move || {
        run_upload(
            &["--source", source.as_str(), "--target", "/site", "--key", "k"],
            &[("BUNNY_STORAGE_ZONE_NAME", "zone"), ("BUNNY_STORAGE_ENDPOINT", uri.as_str())],
        )
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 files uploaded"));
}
