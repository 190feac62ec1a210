//! Integration tests for writing resolved media to disk.

use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xhs_media_fetcher::constants::PLATFORM_REFERER;
use xhs_media_fetcher::download::Downloader;
use xhs_media_fetcher::media::{MediaKind, RemoteMedia};

const SESSION: &str = "20240101_120000";

fn descriptor(url: &str, kind: MediaKind, base: &str) -> RemoteMedia {
    RemoteMedia {
        id: "testid0000000001".to_string(),
        url: Url::parse(url).unwrap(),
        kind,
        file_base_name: base.to_string(),
        original_url: url.to_string(),
    }
}

fn downloader(dir: &TempDir) -> Downloader {
    Downloader::new(dir.path(), "xhs")
        .unwrap()
        .with_session(SESSION)
}

#[tokio::test]
async fn test_image_named_from_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token1"))
        .and(header("referer", PLATFORM_REFERER))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(b"\x89PNG fake".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let media = descriptor(
        &format!("{}/token1", server.uri()),
        MediaKind::Image,
        "post1_1",
    );

    let saved = downloader(&dir).download(&media).await.unwrap();

    assert_eq!(saved, dir.path().join("xhs_20240101_120000_post1_1.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"\x89PNG fake");
}

#[tokio::test]
async fn test_video_falls_back_to_default_extension() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .set_body_bytes(vec![0u8; 64]),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("nested").join("out");
    let media = descriptor(&format!("{}/v123", server.uri()), MediaKind::Video, "vid_2");

    let saved = Downloader::new(&output, "xhs")
        .unwrap()
        .with_session(SESSION)
        .download(&media)
        .await
        .unwrap();

    assert_eq!(saved, output.join("xhs_20240101_120000_vid_2.mp4"));
    assert_eq!(std::fs::metadata(&saved).unwrap().len(), 64);
}

#[tokio::test]
async fn test_existing_file_is_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("xhs_20240101_120000_p_1.jpg");
    std::fs::write(&existing, b"old contents").unwrap();

    let media = descriptor(
        &format!("{}/photo.jpg", server.uri()),
        MediaKind::Image,
        "p_1",
    );
    let saved = downloader(&dir).download(&media).await.unwrap();

    assert_eq!(saved, existing);
    assert_eq!(std::fs::read(&saved).unwrap(), b"new");
}

#[tokio::test]
async fn test_error_status_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let media = descriptor(
        &format!("{}/missing", server.uri()),
        MediaKind::Image,
        "gone_1",
    );

    assert!(downloader(&dir).download(&media).await.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
