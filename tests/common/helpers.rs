#![allow(dead_code)]

use imgfetch::downloader::FetchWorker;
use imgfetch::http::{create_http_client, HttpClientConfig};
use imgfetch::{DownloaderBuilder, ExtensionResolver, ProgressCounter, TimestampNamer};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Common test payloads
pub const JPEG_BODY: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-body";
pub const PNG_BODY: &[u8] = b"\x89PNG\r\n\x1a\nfake-png-body";
pub const GIF_BODY: &[u8] = b"GIF89afake-gif-body";
pub const HTML_BODY: &[u8] = b"<html><body>not an image</body></html>";
pub const TEST_USER_AGENT: &str = "imgfetch-test/1.0";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test headers with a custom user agent
pub fn create_test_headers_with_agent(agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));
    headers
}

/// Creates test headers with the default test user agent
pub fn create_test_headers() -> HeaderMap {
    create_test_headers_with_agent(TEST_USER_AGENT)
}

/// Writes a credentials file into `dir` and returns its path
pub fn create_credentials_file(dir: &Path, json: &str) -> PathBuf {
    let file_path = dir.join("credentials.json");
    fs::write(&file_path, json).expect("Failed to write credentials file");
    file_path
}

/// Mounts a GET mock at `route` answering 200 with the given type and body
pub async fn mount_image(server: &MockServer, route: &str, content_type: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .insert_header("content-type", content_type),
        )
        .mount(server)
        .await;
}

/// Same as [`mount_image`] but the response is held back for `delay`
pub async fn mount_slow_image(
    server: &MockServer,
    route: &str,
    content_type: &str,
    body: &[u8],
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .insert_header("content-type", content_type)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mounts a GET mock at `route` answering with a bare status
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Starts a server with `/a.jpg`, `/b.png` and `/c.gif`
pub async fn start_image_server() -> MockServer {
    let server = MockServer::start().await;
    mount_image(&server, "/a.jpg", "image/jpeg", JPEG_BODY).await;
    mount_image(&server, "/b.png", "image/png", PNG_BODY).await;
    mount_image(&server, "/c.gif", "image/gif", GIF_BODY).await;
    server
}

/// URL pointing at a local port nothing listens on
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a local port");
    let port = listener
        .local_addr()
        .expect("Failed to read local address")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{}/gone.jpg", port)
}

/// Serves one request at `/cut.png` that promises a large PNG body, sends a
/// few bytes of it and closes the connection
pub fn start_truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a local port");
    let port = listener
        .local_addr()
        .expect("Failed to read local address")
        .port();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let head = concat!(
                "HTTP/1.1 200 OK\r\n",
                "Content-Type: image/png\r\n",
                "Content-Length: 100000\r\n",
                "\r\n",
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&PNG_BODY[..8]);
            let _ = stream.flush();
        }
    });
    format!("http://127.0.0.1:{}/cut.png", port)
}

/// Creates a test downloader builder saving into `dir`
pub fn create_test_downloader_builder(dir: &Path) -> DownloaderBuilder {
    DownloaderBuilder::new()
        .directory(dir.to_path_buf())
        .concurrent_downloads(5)
}

/// Creates a fetch worker saving into `dir` with a plain client
pub fn create_test_worker(dir: &Path, counter: ProgressCounter, total: usize) -> FetchWorker {
    let client =
        create_http_client(HttpClientConfig::default()).expect("Failed to build HTTP client");
    FetchWorker::new(
        client,
        dir,
        ExtensionResolver::default(),
        Arc::new(TimestampNamer),
        counter,
        total,
    )
}

/// Files currently in `dir`, sorted
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

/// Extensions of the files in `dir`, sorted
pub fn extensions_in(dir: &Path) -> Vec<String> {
    let mut extensions: Vec<String> = files_in(dir)
        .iter()
        .filter_map(|p| p.extension())
        .map(|e| e.to_string_lossy().into_owned())
        .collect();
    extensions.sort();
    extensions
}

/// Asserts that a file exists and holds exactly `expected`
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e));
    assert_eq!(content, expected, "File content mismatch at path: {:?}", path);
}
