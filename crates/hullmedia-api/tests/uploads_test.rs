//! Upload protocol integration tests: resumable (tus) and chunked.
//!
//! Run with: `cargo test -p hullmedia-api --test uploads_test`

mod helpers;

use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use bytes::Bytes;
use helpers::fixtures::{create_test_png, create_text_file, upload_metadata};
use helpers::{api_path, setup_test_app, MAX_UPLOAD_BYTES};
use serde_json::Value;
use uuid::Uuid;

const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// Create a resumable upload and return its session URL.
async fn create_upload(client: &TestServer, length: usize, metadata: &str) -> String {
    let response = client
        .post(&api_path("/uploads"))
        .add_header("Tus-Resumable", "1.0.0")
        .add_header("Upload-Length", length.to_string())
        .add_header("Upload-Metadata", metadata)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.header("tus-resumable"), "1.0.0");
    response
        .header("location")
        .to_str()
        .expect("location header")
        .to_string()
}

async fn patch(client: &TestServer, url: &str, offset: usize, data: &[u8]) -> axum_test::TestResponse {
    client
        .patch(url)
        .add_header("Tus-Resumable", "1.0.0")
        .add_header("Upload-Offset", offset.to_string())
        .add_header("Content-Type", OFFSET_OCTET_STREAM)
        .bytes(Bytes::copy_from_slice(data))
        .await
}

async fn head(client: &TestServer, url: &str) -> axum_test::TestResponse {
    client
        .method(Method::HEAD, url)
        .add_header("Tus-Resumable", "1.0.0")
        .await
}

#[tokio::test]
async fn test_resumable_upload_in_three_patches() {
    let app = setup_test_app().await;
    let client = app.client();

    let png = create_test_png(80, 60);
    let correlation_id = Uuid::new_v4();
    let metadata = upload_metadata(&[
        ("filename", "hull-port-bow.png"),
        ("contentType", "image/png"),
        ("correlationId", &correlation_id.to_string()),
        ("vesselPartId", "17"),
    ]);
    let url = create_upload(client, png.len(), &metadata).await;

    let third = png.len() / 3;
    let pieces = [&png[..third], &png[third..2 * third], &png[2 * third..]];

    let mut offset = 0;
    for piece in &pieces[..2] {
        let response = patch(client, &url, offset, piece).await;
        offset += piece.len();
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(response.header("upload-offset"), offset.to_string().as_str());

        let status = head(client, &url).await;
        assert_eq!(status.status_code(), StatusCode::OK);
        assert_eq!(status.header("upload-offset"), offset.to_string().as_str());
        assert_eq!(status.header("upload-length"), png.len().to_string().as_str());

        // No outcome is published while bytes are still arriving
        let pending = client
            .get(&api_path("/uploads/result"))
            .add_query_param("correlation_id", correlation_id.to_string())
            .await;
        assert_eq!(pending.status_code(), StatusCode::NOT_FOUND);
    }

    let last = patch(client, &url, offset, pieces[2]).await;
    assert_eq!(last.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(last.header("upload-offset"), png.len().to_string().as_str());
    let media_id = last
        .header("upload-media-id")
        .to_str()
        .expect("media id header")
        .to_string();

    // Finished sessions are gone
    assert_eq!(head(client, &url).await.status_code(), StatusCode::NOT_FOUND);

    let record: Value = client.get(&api_path(&format!("/{}", media_id))).await.json();
    assert_eq!(record["original_filename"], "hull-port-bow.png");
    assert_eq!(record["size_bytes"], png.len() as u64);
    assert_eq!(record["association_id"], 17);
    assert_eq!(record["width"], 80);
    assert_eq!(record["height"], 60);

    let result = client
        .get(&api_path("/uploads/result"))
        .add_query_param("correlation_id", correlation_id.to_string())
        .await;
    assert_eq!(result.status_code(), StatusCode::OK);
    assert_eq!(result.json::<Value>()["id"].to_string(), media_id);

    let original = client
        .get(&api_path(&format!("/{}/original", media_id)))
        .await;
    assert_eq!(original.status_code(), StatusCode::OK);
    assert_eq!(original.as_bytes().as_ref(), png.as_slice());
}

#[tokio::test]
async fn test_stale_offset_is_rejected_with_server_offset() {
    let app = setup_test_app().await;
    let client = app.client();

    let png = create_test_png(32, 32);
    let url = create_upload(client, png.len(), &upload_metadata(&[("filename", "a.png")])).await;

    let first = patch(client, &url, 0, &png[..100]).await;
    assert_eq!(first.status_code(), StatusCode::NO_CONTENT);

    // A retry of the same chunk after it was applied
    let retry = patch(client, &url, 0, &png[..100]).await;
    assert_eq!(retry.status_code(), StatusCode::CONFLICT);
    assert_eq!(retry.header("upload-offset"), "100");
    assert_eq!(retry.json::<Value>()["code"], "OFFSET_CONFLICT");

    let status = head(client, &url).await;
    assert_eq!(status.header("upload-offset"), "100");

    let rest = patch(client, &url, 100, &png[100..]).await;
    assert_eq!(rest.status_code(), StatusCode::NO_CONTENT);
    assert!(rest.headers().contains_key("upload-media-id"));
}

#[tokio::test]
async fn test_patch_requires_offset_content_type() {
    let app = setup_test_app().await;
    let client = app.client();

    let url = create_upload(client, 10, &upload_metadata(&[("filename", "a.png")])).await;
    let response = client
        .patch(&url)
        .add_header("Upload-Offset", "0")
        .add_header("Content-Type", "application/octet-stream")
        .bytes(Bytes::from_static(b"0123456789"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(head(client, &url).await.header("upload-offset"), "0");
}

#[tokio::test]
async fn test_patch_past_declared_length_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();

    let url = create_upload(client, 10, &upload_metadata(&[("filename", "a.png")])).await;
    let response = patch(client, &url, 0, b"0123456789abc").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(head(client, &url).await.header("upload-offset"), "0");
}

#[tokio::test]
async fn test_create_validates_headers() {
    let app = setup_test_app().await;
    let client = app.client();

    let missing_filename = client
        .post(&api_path("/uploads"))
        .add_header("Upload-Length", "100")
        .await;
    assert_eq!(missing_filename.status_code(), StatusCode::BAD_REQUEST);

    let missing_length = client
        .post(&api_path("/uploads"))
        .add_header("Upload-Metadata", upload_metadata(&[("filename", "a.png")]))
        .await;
    assert_eq!(missing_length.status_code(), StatusCode::BAD_REQUEST);

    let too_large = client
        .post(&api_path("/uploads"))
        .add_header("Upload-Length", (MAX_UPLOAD_BYTES + 1).to_string())
        .add_header("Upload-Metadata", upload_metadata(&[("filename", "a.png")]))
        .await;
    assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let bad_metadata = client
        .post(&api_path("/uploads"))
        .add_header("Upload-Length", "100")
        .add_header("Upload-Metadata", "filename !!!not-base64")
        .await;
    assert_eq!(bad_metadata.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_content_is_reported_and_cleaned_up() {
    let app = setup_test_app().await;
    let client = app.client();

    let text = create_text_file();
    let correlation_id = Uuid::new_v4();
    let metadata = upload_metadata(&[
        ("filename", "notes.png"),
        ("correlationId", &correlation_id.to_string()),
    ]);
    let url = create_upload(client, text.len(), &metadata).await;

    let response = patch(client, &url, 0, &text).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "UPLOAD_REJECTED");
    assert!(!response.headers().contains_key("upload-media-id"));

    let result = client
        .get(&api_path("/uploads/result"))
        .add_query_param("correlation_id", correlation_id.to_string())
        .await;
    assert_eq!(result.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(result.json::<Value>()["status"], "rejected");

    let listed: Vec<Value> = client.get(&api_path("")).await.json();
    assert!(listed.is_empty());
    assert_eq!(std::fs::read_dir(app.temp_upload_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_terminate_discards_session() {
    let app = setup_test_app().await;
    let client = app.client();

    let url = create_upload(client, 1000, &upload_metadata(&[("filename", "a.png")])).await;
    patch(client, &url, 0, &[1u8; 10]).await;

    let response = client.delete(&url).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(head(client, &url).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(patch(client, &url, 10, &[1u8; 10]).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(app.temp_upload_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_result_lookup_errors() {
    let app = setup_test_app().await;
    let client = app.client();

    let unknown = client
        .get(&api_path("/uploads/result"))
        .add_query_param("correlation_id", Uuid::new_v4().to_string())
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let malformed = client
        .get(&api_path("/uploads/result"))
        .add_query_param("correlation_id", "not-a-uuid")
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chunked_upload_flow() {
    let app = setup_test_app().await;
    let client = app.client();

    let png = create_test_png(64, 64);
    let start = client
        .post(&api_path("/chunked/start"))
        .json(&serde_json::json!({
            "filename": "stern.png",
            "content_type": "image/png",
            "association_id": 4
        }))
        .await;
    assert_eq!(start.status_code(), StatusCode::OK);
    let session: Value = start.json();
    let session_id = session["session_id"].as_str().expect("session id").to_string();
    assert!(session["chunk_size"].as_u64().unwrap() > 0);

    let half = png.len() / 2;
    for (index, chunk) in [&png[..half], &png[half..]].into_iter().enumerate() {
        let ack = client
            .put(&api_path(&format!("/chunked/{}/chunk/{}", session_id, index)))
            .bytes(Bytes::copy_from_slice(chunk))
            .await;
        assert_eq!(ack.status_code(), StatusCode::OK);
        assert_eq!(ack.json::<Value>()["next_index"], index as u64 + 1);
    }

    let out_of_order = client
        .put(&api_path(&format!("/chunked/{}/chunk/5", session_id)))
        .bytes(Bytes::from_static(b"xx"))
        .await;
    assert_eq!(out_of_order.status_code(), StatusCode::CONFLICT);

    let complete = client
        .post(&api_path(&format!("/chunked/{}/complete", session_id)))
        .await;
    assert_eq!(complete.status_code(), StatusCode::CREATED);
    let record: Value = complete.json();
    assert_eq!(record["original_filename"], "stern.png");
    assert_eq!(record["size_bytes"], png.len() as u64);
    assert_eq!(record["association_id"], 4);

    // Completion closes the session
    let again = client
        .post(&api_path(&format!("/chunked/{}/complete", session_id)))
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chunked_upload_rejects_empty_chunk_and_non_image() {
    let app = setup_test_app().await;
    let client = app.client();

    let start: Value = client
        .post(&api_path("/chunked/start"))
        .json(&serde_json::json!({ "filename": "notes.png" }))
        .await
        .json();
    let session_id = start["session_id"].as_str().unwrap().to_string();

    let empty = client
        .put(&api_path(&format!("/chunked/{}/chunk/0", session_id)))
        .bytes(Bytes::new())
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    client
        .put(&api_path(&format!("/chunked/{}/chunk/0", session_id)))
        .bytes(Bytes::from(create_text_file()))
        .await;
    let complete = client
        .post(&api_path(&format!("/chunked/{}/complete", session_id)))
        .await;
    assert_eq!(complete.status_code(), StatusCode::BAD_REQUEST);

    let listed: Vec<Value> = client.get(&api_path("")).await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_chunked_cancel() {
    let app = setup_test_app().await;
    let client = app.client();

    let start: Value = client
        .post(&api_path("/chunked/start"))
        .json(&serde_json::json!({ "filename": "a.png" }))
        .await
        .json();
    let session_id = start["session_id"].as_str().unwrap().to_string();

    let cancel = client
        .delete(&api_path(&format!("/chunked/{}", session_id)))
        .await;
    assert_eq!(cancel.status_code(), StatusCode::NO_CONTENT);

    let chunk = client
        .put(&api_path(&format!("/chunked/{}/chunk/0", session_id)))
        .bytes(Bytes::from_static(b"data"))
        .await;
    assert_eq!(chunk.status_code(), StatusCode::NOT_FOUND);
}
