use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::fs::{create_dir, write};
use tempfile::{tempdir, TempDir};

/// Working directory with `A.out.txt`, `B.out.txt` and two builds in `.builds`.
fn create_workspace() -> TempDir {
    let dir = tempdir().expect("Creating temp dir failed");
    write(dir.path().join("A.out.txt"), "answer-for-A").unwrap();
    write(dir.path().join("B.out.txt"), "answer-for-B").unwrap();
    create_dir(dir.path().join(".builds")).unwrap();
    write(dir.path().join(".builds/build-001"), "old-sources").unwrap();
    write(dir.path().join(".builds/build-002"), "new-sources").unwrap();
    dir
}

/// Binary with a clean environment, pointed at `api_base`.
fn judge_upload(workdir: &TempDir, api_base: &str) -> Command {
    let mut cmd = Command::cargo_bin("judge-upload").expect("Binary exists");
    cmd.env_clear()
        .current_dir(workdir.path())
        .env("HASH_CODE_JUDGE_API_BASE", api_base);
    cmd
}

#[test]
fn missing_token_exits_non_zero_without_requests() {
    let mut server = mockito::Server::new();
    let any_request = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create();
    let workdir = create_workspace();

    judge_upload(&workdir, &server.url())
        .arg("submit")
        .env("HASH_CODE_INPUT1_NAME", "A")
        .env("HASH_CODE_INPUT1_ID", "ds-A-id")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HASH_CODE_JUDGE_AUTH_TOKEN not defined"));

    any_request.assert();
}

#[test]
fn zero_data_sets_exits_with_status_one_without_requests() {
    let mut server = mockito::Server::new();
    let any_request = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create();
    let workdir = create_workspace();

    judge_upload(&workdir, &server.url())
        .arg("submit")
        .env("HASH_CODE_JUDGE_AUTH_TOKEN", "secret-token")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("data set ids not initialized"));

    any_request.assert();
}

#[test]
fn check_lists_files_from_latest_build() {
    let workdir = create_workspace();

    judge_upload(&workdir, "http://127.0.0.1:9")
        .arg("check")
        .env("HASH_CODE_JUDGE_AUTH_TOKEN", "secret-token")
        .env("HASH_CODE_INPUT1_NAME", "A")
        .env("HASH_CODE_INPUT1_ID", "ds-A-id")
        .assert()
        .success()
        .stdout(predicate::str::contains("A: ./A.out.txt"))
        .stdout(predicate::str::contains("sources: .builds/build-002"));
}

#[test]
fn submit_uploads_three_files_and_submits_two_data_sets() {
    let mut server = mockito::Server::new();
    let upload_url = format!("{}/blobstore/upload", server.url());

    let create_url = server
        .mock("GET", "/upload/createUrl")
        .match_header("authorization", "Bearer secret-token")
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"value": "{upload_url}"}}"#))
        .expect(3)
        .create();

    let mut uploads = Vec::new();
    for (content, key) in [
        ("answer-for-A", "blob-A"),
        ("answer-for-B", "blob-B"),
        ("new-sources", "blob-sources"),
    ] {
        uploads.push(
            server
                .mock("POST", "/blobstore/upload")
                .match_header("authorization", "Bearer secret-token")
                .match_body(Matcher::Regex(content.to_string()))
                .with_header("content-type", "application/json")
                .with_body(format!(r#"{{"file": ["{key}", "ignored"]}}"#))
                .expect(1)
                .create(),
        );
    }

    let mut submissions = Vec::new();
    for (data_set, key) in [("ds-A-id", "blob-A"), ("ds-B-id", "blob-B")] {
        submissions.push(
            server
                .mock("POST", "/submissions")
                .match_header("authorization", "Bearer secret-token")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("dataSet".into(), data_set.into()),
                    Matcher::UrlEncoded("submissionBlobKey".into(), key.into()),
                    Matcher::UrlEncoded("sourcesBlobKey".into(), "blob-sources".into()),
                ]))
                .with_body(format!("accepted {data_set}"))
                .expect(1)
                .create(),
        );
    }

    let workdir = create_workspace();
    judge_upload(&workdir, &server.url())
        .arg("submit")
        .env("HASH_CODE_JUDGE_AUTH_TOKEN", "secret-token")
        .env("HASH_CODE_INPUT1_NAME", "A")
        .env("HASH_CODE_INPUT1_ID", "ds-A-id")
        .env("HASH_CODE_INPUT2_NAME", "B")
        .env("HASH_CODE_INPUT2_ID", "ds-B-id")
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted ds-A-id"))
        .stdout(predicate::str::contains("accepted ds-B-id"));

    create_url.assert();
    for mock in uploads.iter().chain(submissions.iter()) {
        mock.assert();
    }
}

#[test]
fn submit_fails_when_submission_is_rejected() {
    let mut server = mockito::Server::new();
    let upload_url = format!("{}/blobstore/upload", server.url());
    server
        .mock("GET", "/upload/createUrl")
        .with_body(format!(r#"{{"value": "{upload_url}"}}"#))
        .create();
    server
        .mock("POST", "/blobstore/upload")
        .with_body(r#"{"file": ["some-key"]}"#)
        .create();
    server
        .mock("POST", "/submissions")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("forbidden")
        .create();

    let workdir = create_workspace();
    judge_upload(&workdir, &server.url())
        .arg("submit")
        .env("HASH_CODE_JUDGE_AUTH_TOKEN", "secret-token")
        .env("HASH_CODE_INPUT1_NAME", "A")
        .env("HASH_CODE_INPUT1_ID", "ds-A-id")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("submission for data set 'A' failed"));
}
