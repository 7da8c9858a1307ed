//! Integration tests for the conversion queue: ordering, failure handling
//! and delivery of finished files.

mod common;

use common::{submit_ok, video, TestHarness, VIDEO};
use serde_json::Value;
use yt_core::{FailureKind, JobStatus};

#[tokio::test]
async fn jobs_run_one_at_a_time_in_submission_order() {
    let (h, addr) = TestHarness::with_server().await;

    let first = submit_ok(addr, &video("hold-1")).await;
    let second = submit_ok(addr, &video("2")).await;
    let third = submit_ok(addr, &video("3")).await;

    // The first job is parked in the tool; nothing else may have started.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(h.extractor.calls(), vec![video("hold-1")]);
    assert_eq!(h.ctx.store.get(first).unwrap().status, JobStatus::Downloading);
    assert_eq!(h.ctx.store.get(second).unwrap().status, JobStatus::Queued);
    assert_eq!(h.ctx.scheduler.pending(), 2);

    h.extractor.release();
    for id in [first, second, third] {
        assert_eq!(h.wait_terminal(id).await.status, JobStatus::Completed);
    }
    assert_eq!(
        h.extractor.calls(),
        vec![video("hold-1"), video("2"), video("3")]
    );
    assert!(!h.ctx.scheduler.is_running());
}

#[tokio::test]
async fn failed_job_does_not_block_queue() {
    let (h, addr) = TestHarness::with_server().await;

    let bad = submit_ok(addr, &video("fail")).await;
    let good = submit_ok(addr, VIDEO).await;

    let failed = h.wait_terminal(bad).await;
    assert_eq!(failed.status, JobStatus::Error);
    assert_eq!(failed.failure, Some(FailureKind::Tool));
    assert!(failed.message.contains("Video unavailable"), "{}", failed.message);

    assert_eq!(h.wait_terminal(good).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn success_without_output_is_an_error() {
    let (h, addr) = TestHarness::with_server().await;

    let id = submit_ok(addr, &video("nofile")).await;
    let job = h.wait_terminal(id).await;
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.failure, Some(FailureKind::MissingOutput));
    assert!(!job.file_path.exists());
}

#[tokio::test]
async fn download_serves_completed_file() {
    let (h, addr) = TestHarness::with_server().await;

    let id = submit_ok(addr, VIDEO).await;
    let job = h.wait_terminal(id).await;
    assert_eq!(job.file_path.file_name().unwrap().to_string_lossy(), format!("{id}.mp3"));

    let resp = reqwest::get(format!("http://{addr}/api/download/{id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "audio/mpeg");
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("{id}.mp3")), "{disposition}");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"ID3fake-mp3-bytes");
}

#[tokio::test]
async fn download_of_unfinished_job_is_409() {
    let (h, addr) = TestHarness::with_server().await;

    let id = submit_ok(addr, &video("hold")).await;
    let resp = reqwest::get(format!("http://{addr}/api/download/{id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "conflict");

    h.extractor.release();
    h.wait_terminal(id).await;
}

#[tokio::test]
async fn download_missing_things_is_404() {
    let (h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/api/download/{}", yt_core::TaskId::new()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Completed, but the file was swept away afterwards.
    let id = submit_ok(addr, VIDEO).await;
    let job = h.wait_terminal(id).await;
    std::fs::remove_file(&job.file_path).unwrap();

    let resp = reqwest::get(format!("http://{addr}/api/download/{id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "File not found");
}
