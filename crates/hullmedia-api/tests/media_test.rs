//! Media API integration tests: single-shot upload, retrieval, thumbnails and maintenance.
//!
//! Run with: `cargo test -p hullmedia-api --test media_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use helpers::fixtures::{create_test_image, create_test_png};
use helpers::{api_path, setup_test_app, MAX_UPLOAD_BYTES};
use image::ImageFormat;
use serde_json::Value;

async fn upload(client: &TestServer, filename: &str, data: Vec<u8>) -> Value {
    let response = client
        .post(&api_path(""))
        .add_header("X-File-Name", filename)
        .add_header("Content-Type", "application/octet-stream")
        .bytes(Bytes::from(data))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_single_shot_upload_and_get() {
    let app = setup_test_app().await;
    let client = app.client();

    let jpeg = create_test_image(50, 40, ImageFormat::Jpeg);
    let response = client
        .post(&api_path(""))
        .add_header("X-File-Name", "keel.jpg")
        .add_header("X-Association-Id", "9")
        .add_header("Content-Type", "image/jpeg")
        .bytes(Bytes::from(jpeg.clone()))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let record: Value = response.json();
    let id = record["id"].as_i64().expect("id");
    assert_eq!(
        response.header("location"),
        api_path(&format!("/{}", id)).as_str()
    );
    assert_eq!(record["original_filename"], "keel.jpg");
    assert_eq!(record["content_type"], "image/jpeg");
    assert_eq!(record["size_bytes"], jpeg.len() as u64);
    assert_eq!(record["width"], 50);
    assert_eq!(record["height"], 40);
    assert_eq!(record["status"], "ready");
    assert_eq!(record["sha256"].as_str().unwrap().len(), 64);

    let fetched: Value = client.get(&api_path(&format!("/{}", id))).await.json();
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn test_single_shot_defaults_filename() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post(&api_path(""))
        .bytes(Bytes::from(create_test_png(8, 8)))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["original_filename"], "upload.bin");
}

#[tokio::test]
async fn test_single_shot_rejects_bad_content() {
    let app = setup_test_app().await;
    let client = app.client();

    let png = create_test_png(64, 64);
    let truncated = client
        .post(&api_path(""))
        .add_header("X-File-Name", "broken.png")
        .bytes(Bytes::copy_from_slice(&png[..png.len() / 2]))
        .await;
    assert_eq!(truncated.status_code(), StatusCode::BAD_REQUEST);

    let oversized = client
        .post(&api_path(""))
        .add_header("X-File-Name", "huge.png")
        .bytes(Bytes::from(vec![0u8; MAX_UPLOAD_BYTES as usize + 1]))
        .await;
    assert_eq!(oversized.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let bad_association = client
        .post(&api_path(""))
        .add_header("X-File-Name", "a.png")
        .add_header("X-Association-Id", "bow")
        .bytes(Bytes::from(png))
        .await;
    assert_eq!(bad_association.status_code(), StatusCode::BAD_REQUEST);

    let listed: Vec<Value> = client.get(&api_path("")).await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_list_filters_by_association() {
    let app = setup_test_app().await;
    let client = app.client();

    client
        .post(&api_path(""))
        .add_header("X-File-Name", "a.png")
        .add_header("X-Association-Id", "3")
        .bytes(Bytes::from(create_test_png(8, 8)))
        .await;
    upload(client, "b.png", create_test_png(8, 8)).await;

    let all: Vec<Value> = client.get(&api_path("")).await.json();
    assert_eq!(all.len(), 2);

    let filtered: Vec<Value> = client
        .get(&api_path(""))
        .add_query_param("association_id", 3)
        .await
        .json();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["original_filename"], "a.png");
}

#[tokio::test]
async fn test_download_original_with_ranges() {
    let app = setup_test_app().await;
    let client = app.client();

    let png = create_test_png(40, 40);
    let record = upload(client, "hull.png", png.clone()).await;
    let url = api_path(&format!("/{}/original", record["id"]));

    let full = client.get(&url).await;
    assert_eq!(full.status_code(), StatusCode::OK);
    assert_eq!(full.header("accept-ranges"), "bytes");
    assert_eq!(full.header("content-type"), "image/png");
    assert!(full
        .header("content-disposition")
        .to_str()
        .unwrap()
        .contains("hull.png"));
    assert_eq!(full.as_bytes().as_ref(), png.as_slice());

    let partial = client.get(&url).add_header("Range", "bytes=0-9").await;
    assert_eq!(partial.status_code(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        partial.header("content-range"),
        format!("bytes 0-9/{}", png.len()).as_str()
    );
    assert_eq!(partial.as_bytes().as_ref(), &png[..10]);

    let suffix = client.get(&url).add_header("Range", "bytes=-4").await;
    assert_eq!(suffix.status_code(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(suffix.as_bytes().as_ref(), &png[png.len() - 4..]);

    let beyond = client
        .get(&url)
        .add_header("Range", format!("bytes={}-", png.len() + 10))
        .await;
    assert_eq!(beyond.status_code(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        beyond.header("content-range"),
        format!("bytes */{}", png.len()).as_str()
    );

    // Unparseable ranges are ignored
    let ignored = client.get(&url).add_header("Range", "lines=1-2").await;
    assert_eq!(ignored.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_thumbnail_is_scaled_jpeg() {
    let app = setup_test_app().await;
    let client = app.client();

    let record = upload(client, "wide.png", create_test_png(120, 60)).await;
    let response = client
        .get(&api_path(&format!("/{}/thumbnail/40", record["id"])))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "image/jpeg");

    let thumb = image::load_from_memory(response.as_bytes()).expect("decode thumbnail");
    assert_eq!((thumb.width(), thumb.height()), (40, 20));

    // Served from cache the second time
    let again = client
        .get(&api_path(&format!("/{}/thumbnail/40", record["id"])))
        .await;
    assert_eq!(again.as_bytes(), response.as_bytes());

    let missing = client.get(&api_path("/999/thumbnail/40")).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_media() {
    let app = setup_test_app().await;
    let client = app.client();

    let record = upload(client, "a.png", create_test_png(16, 16)).await;
    let url = api_path(&format!("/{}", record["id"]));

    assert_eq!(client.delete(&url).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(client.get(&url).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        client
            .get(&api_path(&format!("/{}/original", record["id"])))
            .await
            .status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(client.delete(&url).await.status_code(), StatusCode::NOT_FOUND);

    let stored = app
        .storage_root()
        .join(record["storage_key"].as_str().unwrap());
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_prune_missing_removes_orphaned_records() {
    let app = setup_test_app().await;
    let client = app.client();

    let kept = upload(client, "kept.png", create_test_png(8, 8)).await;
    let lost = upload(client, "lost.png", create_test_png(8, 8)).await;
    std::fs::remove_file(
        app.storage_root()
            .join(lost["storage_key"].as_str().unwrap()),
    )
    .unwrap();

    let response = client.post(&api_path("/prune-missing")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["removed"], 1);

    let listed: Vec<Value> = client.get(&api_path("")).await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], kept["id"]);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app().await;
    let client = app.client();

    let health = client.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    let body: Value = health.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "in-memory");
    assert_eq!(body["storage"], "healthy");

    let spec: Value = client.get("/api/openapi.json").await.json();
    assert!(spec["paths"]
        .as_object()
        .unwrap()
        .contains_key("/api/v0/hull-images/uploads/{id}"));
}
