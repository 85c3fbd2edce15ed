//! Integration tests for the CLI command handlers

mod common;

use tempfile::TempDir;

use channels_fetcher::cli::{handle_download, handle_profile, DownloadArgs, ProfileArgs};
use channels_fetcher::config::AppConfig;

use common::{encrypt, payload, Route, TestServer};

fn download_args(url: String, output: &TempDir) -> DownloadArgs {
    DownloadArgs {
        url,
        key: None,
        filename: Some("clip.mp4".to_string()),
        spec: None,
        output_dir: Some(output.path().to_path_buf()),
        force: false,
        keystream_cmd: None,
        keystream_file: None,
        no_progress: true,
    }
}

#[tokio::test]
async fn test_download_command_saves_file() {
    let body = payload(20_000);
    let server = TestServer::start(vec![("/video", Route::sized(body.clone()))]);
    let output = TempDir::new().unwrap();

    let args = download_args(server.url("/video"), &output);
    handle_download(args, &AppConfig::default()).await.unwrap();

    let saved = tokio::fs::read(output.path().join("clip.mp4")).await.unwrap();
    assert_eq!(saved, body);
}

#[tokio::test]
async fn test_download_command_decrypts_with_keystream_file() {
    let plain = payload(4_000);
    let keystream: Vec<u8> = (1..=32u8).collect();
    let server = TestServer::start(vec![(
        "/video",
        Route::without_length(encrypt(&plain, &keystream)),
    )]);
    let output = TempDir::new().unwrap();
    let keystream_path = output.path().join("keystream.bin");
    tokio::fs::write(&keystream_path, &keystream).await.unwrap();

    let args = DownloadArgs {
        key: Some("2136343393".to_string()),
        spec: Some("xWT111".to_string()),
        keystream_file: Some(keystream_path),
        ..download_args(server.url("/video?token=t"), &output)
    };
    handle_download(args, &AppConfig::default()).await.unwrap();

    let saved = tokio::fs::read(output.path().join("clip.mp4")).await.unwrap();
    assert_eq!(saved, plain);
    assert_eq!(
        server.requests(),
        vec!["/video?token=t&X-snsvideoflag=xWT111".to_string()]
    );
}

#[tokio::test]
async fn test_download_command_refuses_existing_file_without_force() {
    let server = TestServer::start(vec![("/video", Route::sized(payload(100)))]);
    let output = TempDir::new().unwrap();
    tokio::fs::write(output.path().join("clip.mp4"), b"old")
        .await
        .unwrap();

    let args = download_args(server.url("/video"), &output);
    assert!(handle_download(args, &AppConfig::default()).await.is_err());

    let args = DownloadArgs {
        force: true,
        ..download_args(server.url("/video"), &output)
    };
    handle_download(args, &AppConfig::default()).await.unwrap();
    let saved = tokio::fs::read(output.path().join("clip.mp4")).await.unwrap();
    assert_eq!(saved, payload(100));
}

#[tokio::test]
async fn test_profile_command_downloads_every_entry() {
    let server = TestServer::start(vec![
        ("/a", Route::sized(payload(1_000))),
        ("/b", Route::without_length(payload(2_000))),
        ("/img", Route::sized(payload(50))),
    ]);
    let output = TempDir::new().unwrap();
    let document = output.path().join("feed.json");
    let json = serde_json::json!([
        { "id": "a", "title": "First clip", "url": server.url("/a") },
        { "id": "b", "title": "Second: clip?", "url": server.url("/b") },
        { "id": "a", "title": "Duplicate", "url": server.url("/a") },
        {
            "id": "p",
            "type": "picture",
            "title": "Album",
            "files": [{ "url": server.url("/img") }],
            "contact": { "nickname": "someone" }
        }
    ]);
    tokio::fs::write(&document, json.to_string()).await.unwrap();

    let args = ProfileArgs {
        file: document,
        spec: None,
        highest: false,
        cover: false,
        print_command: false,
        output_dir: Some(output.path().join("out")),
        force: false,
        no_progress: true,
    };
    handle_profile(args, &AppConfig::default()).await.unwrap();

    let out = output.path().join("out");
    assert_eq!(
        tokio::fs::read(out.join("First clip.mp4")).await.unwrap(),
        payload(1_000)
    );
    assert_eq!(
        tokio::fs::read(out.join("Second_ clip_.mp4")).await.unwrap(),
        payload(2_000)
    );
    assert!(out.join("Album.zip").exists());
    assert!(!out.join("Duplicate.mp4").exists());
}

#[tokio::test]
async fn test_profile_command_reports_failures() {
    let server = TestServer::start(vec![("/a", Route::sized(payload(10)))]);
    let output = TempDir::new().unwrap();
    let document = output.path().join("feed.json");
    let json = serde_json::json!([
        { "id": "a", "title": "ok", "url": server.url("/a") },
        { "id": "b", "title": "missing", "url": server.url("/gone") }
    ]);
    tokio::fs::write(&document, json.to_string()).await.unwrap();

    let args = ProfileArgs {
        file: document,
        spec: None,
        highest: true,
        cover: false,
        print_command: false,
        output_dir: Some(output.path().to_path_buf()),
        force: false,
        no_progress: true,
    };
    let result = handle_profile(args, &AppConfig::default()).await;

    assert!(result.is_err());
    assert!(output.path().join("ok.mp4").exists());
    assert!(!output.path().join("missing.mp4").exists());
}
