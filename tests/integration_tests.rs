//! End-to-end batch runs against a local mock server.

use imgfetch::download::{DownloadOutcome, FailureReason, SkipReason};
use imgfetch::{Engine, Error, RunState};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::helpers::*;

fn image_urls(server: &MockServer) -> Vec<String> {
    ["/a.jpg", "/b.png", "/c.gif"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect()
}

async fn three_types_scenario(engine: Engine) {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path())
        .engine(engine)
        .build();

    let result = downloader.run(image_urls(&server)).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.saved(), 3);
    assert_eq!(extensions_in(temp_dir.path()), vec!["gif", "jpg", "png"]);

    let paths = result.paths();
    assert_file_content(paths[0].unwrap(), JPEG_BODY);
    assert_file_content(paths[1].unwrap(), PNG_BODY);
    assert_file_content(paths[2].unwrap(), GIF_BODY);
}

#[tokio::test]
async fn test_three_image_types_on_tasks() {
    three_types_scenario(Engine::Tasks).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_three_image_types_on_threads() {
    three_types_scenario(Engine::Threads).await;
}

async fn mixed_batch(engine: Engine) -> Vec<DownloadOutcome> {
    let server = start_image_server().await;
    mount_status(&server, "/missing.png", 404).await;
    mount_image(&server, "/page.html", "text/html", HTML_BODY).await;
    let temp_dir = create_temp_dir();

    let urls = vec![
        format!("{}/missing.png", server.uri()),
        format!("{}/a.jpg", server.uri()),
        format!("{}/page.html", server.uri()),
        closed_port_url(),
        format!("{}/c.gif", server.uri()),
    ];

    let result = create_test_downloader_builder(temp_dir.path())
        .engine(engine)
        .build()
        .run(urls)
        .await
        .unwrap();

    assert_eq!(files_in(temp_dir.path()).len(), 2);
    result.into_outcomes()
}

fn assert_mixed_outcomes(outcomes: &[DownloadOutcome]) {
    assert_eq!(outcomes.len(), 5);
    assert_eq!(
        outcomes[0],
        DownloadOutcome::Failed(FailureReason::HttpStatus(StatusCode::NOT_FOUND))
    );
    assert_eq!(outcomes[1].path().unwrap().extension().unwrap(), "jpg");
    assert_eq!(
        outcomes[2],
        DownloadOutcome::Skipped(SkipReason::UnsupportedContentType(Some(
            "text/html".to_string()
        )))
    );
    assert!(matches!(
        outcomes[3],
        DownloadOutcome::Failed(FailureReason::Transport(_))
    ));
    assert_eq!(outcomes[4].path().unwrap().extension().unwrap(), "gif");
}

#[tokio::test]
async fn test_mixed_batch_keeps_input_order() {
    let outcomes = mixed_batch(Engine::Tasks).await;
    assert_mixed_outcomes(&outcomes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_engines_agree_on_outcomes() {
    let on_tasks = mixed_batch(Engine::Tasks).await;
    let on_threads = mixed_batch(Engine::Threads).await;

    assert_mixed_outcomes(&on_tasks);
    assert_mixed_outcomes(&on_threads);

    let kinds = |outcomes: &[DownloadOutcome]| {
        outcomes
            .iter()
            .map(|o| match o {
                DownloadOutcome::Saved { .. } => "saved".to_string(),
                other => format!("{:?}", other),
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(kinds(&on_tasks), kinds(&on_threads));
}

#[tokio::test]
async fn test_empty_batch() {
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path()).build();

    let result = downloader.run(Vec::<String>::new()).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(downloader.state(), RunState::Completed);
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(0)
        .build();

    let result = downloader.run(image_urls(&server)).await;

    assert!(matches!(result, Err(Error::InvalidConcurrency(0))));
    assert_eq!(downloader.state(), RunState::NotStarted);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nested_output_directory_is_created() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let nested = temp_dir.path().join("deep").join("er");

    let result = create_test_downloader_builder(&nested)
        .build()
        .run(image_urls(&server))
        .await
        .unwrap();

    assert_eq!(result.saved(), 3);
    assert_eq!(files_in(&nested).len(), 3);
}

#[tokio::test]
async fn test_credentials_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret.png"))
        .and(header("authorization", "Bearer letmein"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BODY.to_vec())
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secret.png"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let temp_dir = create_temp_dir();
    let credentials = create_credentials_file(
        temp_dir.path(),
        r#"{"headers": {"Authorization": "Bearer letmein"}}"#,
    );
    let output = temp_dir.path().join("out");

    let result = create_test_downloader_builder(&output)
        .credentials(credentials)
        .build()
        .run([format!("{}/secret.png", server.uri())])
        .await
        .unwrap();

    assert!(result.outcomes()[0].is_saved());
    assert_file_content(result.paths()[0].unwrap(), PNG_BODY);
}

#[tokio::test]
async fn test_missing_credentials_aborts_before_any_request() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path())
        .credentials(temp_dir.path().join("absent.json"))
        .build();

    let result = downloader.run(image_urls(&server)).await;

    assert!(matches!(result, Err(Error::Credentials { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(files_in(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_malformed_credentials_aborts() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let credentials = create_credentials_file(temp_dir.path(), "{ not json");
    let output = temp_dir.path().join("out");

    let result = create_test_downloader_builder(&output)
        .credentials(credentials)
        .build()
        .run(image_urls(&server))
        .await;

    assert!(matches!(result, Err(Error::Credentials { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_normalized_content_type_is_saved() {
    let server = MockServer::start().await;
    mount_image(&server, "/upper.png", "IMAGE/PNG; charset=binary", PNG_BODY).await;
    let url = format!("{}/upper.png", server.uri());

    let strict_dir = create_temp_dir();
    let strict = create_test_downloader_builder(strict_dir.path())
        .build()
        .run([url.clone()])
        .await
        .unwrap();
    assert!(strict.outcomes()[0].is_skipped());
    assert!(files_in(strict_dir.path()).is_empty());

    let lenient_dir = create_temp_dir();
    let lenient = create_test_downloader_builder(lenient_dir.path())
        .normalize_content_type(true)
        .build()
        .run([url])
        .await
        .unwrap();
    assert_eq!(
        lenient.paths()[0].unwrap().extension().unwrap(),
        "png"
    );
}

#[tokio::test]
async fn test_custom_namer_is_used() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let next = Arc::new(AtomicUsize::new(0));
    let namer = {
        let next = Arc::clone(&next);
        move || format!("item-{}", next.fetch_add(1, Ordering::SeqCst))
    };

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(1)
        .namer(namer)
        .build()
        .run([format!("{}/b.png", server.uri())])
        .await
        .unwrap();

    assert_eq!(
        result.paths()[0].unwrap(),
        temp_dir.path().join("item-0.png")
    );
    assert_eq!(next.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_on_complete_fires_once_per_item() {
    let server = start_image_server().await;
    mount_status(&server, "/missing.png", 404).await;
    let temp_dir = create_temp_dir();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut urls = image_urls(&server);
    urls.push(format!("{}/missing.png", server.uri()));

    let recorder = Arc::clone(&seen);
    let result = create_test_downloader_builder(temp_dir.path())
        .on_complete(move |index, request, outcome| {
            recorder
                .lock()
                .unwrap()
                .push((index, request.url.clone(), outcome.is_saved()));
        })
        .build()
        .run(urls.clone())
        .await
        .unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen.len(), 4);
    for (i, (index, url, saved)) in seen.into_iter().enumerate() {
        assert_eq!(index, i);
        assert_eq!(url, urls[i]);
        assert_eq!(saved, result.outcomes()[i].is_saved());
    }
}

#[tokio::test]
async fn test_run_state_transitions() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path()).build();
    assert_eq!(downloader.state(), RunState::NotStarted);

    downloader.run(image_urls(&server)).await.unwrap();

    assert_eq!(downloader.state(), RunState::Completed);
}

async fn peak_stays_under_cap(engine: Engine, cap: usize) {
    let server = MockServer::start().await;
    mount_slow_image(
        &server,
        "/slow.jpg",
        "image/jpeg",
        JPEG_BODY,
        Duration::from_millis(40),
    )
    .await;
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..10)
        .map(|_| format!("{}/slow.jpg", server.uri()))
        .collect();

    let downloader = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(cap)
        .engine(engine)
        .build();
    let result = downloader.run(urls).await.unwrap();

    assert_eq!(result.saved(), 10);
    assert!(downloader.peak_concurrency() >= 1);
    assert!(
        downloader.peak_concurrency() <= cap,
        "peak {} exceeded cap {}",
        downloader.peak_concurrency(),
        cap
    );
    assert_eq!(files_in(temp_dir.path()).len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_task_engine_respects_cap() {
    peak_stays_under_cap(Engine::Tasks, 3).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_thread_engine_respects_cap() {
    peak_stays_under_cap(Engine::Threads, 3).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cap_of_one_runs_sequentially() {
    peak_stays_under_cap(Engine::Tasks, 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_thread_engine_with_huge_cap_and_one_url() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let downloader = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(200_000)
        .engine(Engine::Threads)
        .build();

    let result = downloader
        .run([format!("{}/a.jpg", server.uri())])
        .await
        .unwrap();

    assert_eq!(result.saved(), 1);
    assert_eq!(downloader.peak_concurrency(), 1);
    assert_eq!(extensions_in(temp_dir.path()), vec!["jpg"]);
}

#[tokio::test]
async fn test_oversized_cap_is_rejected() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();

    let urls = image_urls(&server);

    let result = imgfetch::downloader::run(&urls, usize::MAX, temp_dir.path()).await;

    assert!(matches!(result, Err(Error::InvalidConcurrency(usize::MAX))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clones_keep_their_own_run_state() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let original = create_test_downloader_builder(temp_dir.path()).build();
    let copy = original.clone();

    copy.run(image_urls(&server)).await.unwrap();

    assert_eq!(copy.state(), RunState::Completed);
    assert!(copy.peak_concurrency() >= 1);
    assert_eq!(original.state(), RunState::NotStarted);
    assert_eq!(original.peak_concurrency(), 0);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = create_test_downloader_builder(temp_dir.path())
        .build()
        .run_with_cancel(image_urls(&server), cancel)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result
        .outcomes()
        .iter()
        .all(|o| *o == DownloadOutcome::Failed(FailureReason::Cancelled)));
    assert!(files_in(temp_dir.path()).is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_lets_admitted_items_finish() {
    let server = MockServer::start().await;
    mount_slow_image(
        &server,
        "/slow.png",
        "image/png",
        PNG_BODY,
        Duration::from_millis(300),
    )
    .await;
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..3)
        .map(|_| format!("{}/slow.png", server.uri()))
        .collect();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(1)
        .build()
        .run_with_cancel(urls, cancel)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.saved(), 1);
    assert_eq!(
        result.failed(),
        2,
        "items waiting for a slot should be cancelled"
    );
    assert_eq!(files_in(temp_dir.path()).len(), 1);
}

#[tokio::test]
async fn test_free_function_run() {
    let server = start_image_server().await;
    let temp_dir = create_temp_dir();
    let urls = image_urls(&server);

    let result = imgfetch::downloader::run(&urls, 2, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(result.saved(), 3);
    assert_eq!(extensions_in(temp_dir.path()), vec!["gif", "jpg", "png"]);
}
