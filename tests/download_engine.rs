//! End-to-end tests of the download engine against a local mock host.

use chrono::NaiveDate;
use std::path::Path;
use std::time::Duration;
use url::Url;
use usacres::{generate_targets, Config, Downloader, FetchTarget, ProgressReporter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn downloader(server: &MockServer, output_dir: &Path, workers: usize) -> Downloader {
    let config = Config {
        output_dir: output_dir.to_path_buf(),
        workers,
        quiet: true,
        base_url: server.uri(),
        timeout: Some(Duration::from_secs(10)),
        ..Config::default()
    };
    Downloader::new(config).expect("valid config")
}

fn targets(server: &MockServer, days: u32) -> Vec<FetchTarget> {
    generate_targets(&server.uri(), ymd(2020, 1, 1), ymd(2020, 1, days))
}

async fn serve(server: &MockServer, target: &FetchTarget) {
    let url = Url::parse(target.url()).unwrap();
    Mock::given(method("GET"))
        .and(path(url.path()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(GIF))
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn downloads_every_target_into_output_dir() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&server, 3);
    for target in &targets {
        serve(&server, target).await;
    }

    let summary = downloader(&server, dir.path(), 2).run(targets).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.failed, 0);

    let mut entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap())
        .collect();
    entries.sort_by_key(|e| e.file_name());
    let names: Vec<_> = entries
        .iter()
        .map(|e| e.file_name().into_string().unwrap())
        .collect();
    assert_eq!(
        names,
        ["usa2020-01-01.gif", "usa2020-01-02.gif", "usa2020-01-03.gif"]
    );
    for entry in entries {
        assert!(entry.file_type().unwrap().is_file());
        assert_eq!(std::fs::read(entry.path()).unwrap(), GIF);
    }
}

#[tokio::test]
async fn second_run_makes_no_requests() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&server, 4);
    for target in &targets {
        serve(&server, target).await;
    }
    let downloader = downloader(&server, dir.path(), 3);

    let first = downloader.run(targets.clone()).await;
    assert_eq!(first.fetched, 4);
    let requests_after_first = request_count(&server).await;
    assert_eq!(requests_after_first, 4);

    let second = downloader.run(targets).await;
    assert_eq!(second.skipped, 4);
    assert_eq!(second.fetched, 0);
    assert_eq!(request_count(&server).await, requests_after_first);
}

#[tokio::test]
async fn existing_file_is_kept_as_is() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&server, 1);
    serve(&server, &targets[0]).await;
    // A truncated leftover is indistinguishable from a finished download.
    std::fs::write(dir.path().join("usa2020-01-01.gif"), b"GIF").unwrap();

    let summary = downloader(&server, dir.path(), 1).run(targets).await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(std::fs::read(dir.path().join("usa2020-01-01.gif")).unwrap(), b"GIF");
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn failed_target_does_not_stop_the_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&server, 5);
    // Day 3 is not served, so the host answers 404.
    for (i, target) in targets.iter().enumerate() {
        if i != 2 {
            serve(&server, target).await;
        }
    }

    let summary = downloader(&server, dir.path(), 2).run(targets).await;

    assert_eq!(summary.fetched, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed(), 5);
    assert!(!dir.path().join("usa2020-01-03.gif").exists());
    assert!(dir.path().join("usa2020-01-05.gif").exists());
}

#[tokio::test]
async fn server_error_is_a_failure_not_a_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary = downloader(&server, dir.path(), 2)
        .run(targets(&server, 2))
        .await;

    assert_eq!(summary.failed, 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_completes_every_item_for_any_worker_count() {
    for workers in [1, 2, 4, 16] {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(&server, 12);
        for (i, target) in targets.iter().enumerate() {
            match i % 3 {
                0 => serve(&server, target).await,
                1 => std::fs::write(dir.path().join(target.file_name().unwrap()), GIF).unwrap(),
                _ => {} // unserved: 404
            }
        }

        let summary = tokio::time::timeout(
            Duration::from_secs(30),
            downloader(&server, dir.path(), workers).run(targets),
        )
        .await
        .expect("run did not return");

        assert_eq!(summary.total, 12, "workers = {workers}");
        assert_eq!(summary.completed(), 12, "workers = {workers}");
        assert_eq!(summary.fetched, 4, "workers = {workers}");
        assert_eq!(summary.skipped, 4, "workers = {workers}");
        assert_eq!(summary.failed, 4, "workers = {workers}");
    }
}

#[tokio::test]
async fn empty_target_list_returns_immediately() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = generate_targets(&server.uri(), ymd(2020, 1, 5), ymd(2020, 1, 1));

    let summary = downloader(&server, dir.path(), 4).run(targets).await;

    assert_eq!(summary.total, 0);
    assert_eq!(summary.completed(), 0);
}

#[tokio::test]
async fn progress_and_failure_lines() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&server, 2);
    serve(&server, &targets[0]).await;

    let (reporter, writer) = ProgressReporter::spawn(Vec::<u8>::new());
    let summary = downloader(&server, dir.path(), 1)
        .run_with_reporter(targets, reporter)
        .await;
    assert_eq!(summary.failed, 1);

    let output = String::from_utf8(writer.await.unwrap()).unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected output: {output}");
    assert_eq!(lines[0], "[1/2] usa2020-01-01.gif");
    assert_eq!(lines[1], "[2/2] usa2020-01-02.gif");
    let failed_path = dir.path().join("usa2020-01-02.gif");
    assert!(
        lines[2].starts_with(&format!("Could not download file {} (", failed_path.display())),
        "unexpected failure line: {}",
        lines[2]
    );
    assert!(lines[2].ends_with(')'));
}

#[tokio::test]
async fn unusable_output_dir_reports_generic_errors() {
    let server = MockServer::start().await;
    let not_a_dir = tempfile::NamedTempFile::new().unwrap();
    let targets = targets(&server, 3);
    for target in &targets {
        serve(&server, target).await;
    }

    let (reporter, writer) = ProgressReporter::spawn(Vec::<u8>::new());
    let summary = downloader(&server, not_a_dir.path(), 2)
        .run_with_reporter(targets, reporter)
        .await;

    assert_eq!(summary.failed, 3);
    assert_eq!(summary.completed(), 3);
    assert_eq!(request_count(&server).await, 0);

    let output = String::from_utf8(writer.await.unwrap()).unwrap();
    let errors: Vec<_> = output.lines().filter(|l| l.starts_with("Error: ")).collect();
    assert_eq!(errors.len(), 3, "unexpected output: {output}");
    assert!(!output.contains("Could not download file"));
}
