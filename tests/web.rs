use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use stridefit::build_app;
use tower::ServiceExt;

const BOUNDARY: &str = "stridefit-test-boundary";

fn multipart_file(bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"activity.fit\"\r\n\
          Content-Type: application/octet-stream\r\n\r\n",
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A one-record FIT file: header, a record definition with a speed field,
/// and one matching data message.
fn sample_fit() -> Vec<u8> {
    let mut data = vec![0x40, 0, 0];
    data.extend_from_slice(&20u16.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&[6, 2, 0x84]);
    data.push(0x00);
    data.extend_from_slice(&3000u16.to_le_bytes());

    let mut bytes = vec![12u8, 0x20, 0x54, 0x08];
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b".FIT");
    bytes.extend_from_slice(&data);
    bytes
}

#[tokio::test]
async fn landing_page_responds() {
    let app = build_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_returns_decoded_points_as_json() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_file(&sample_fit())))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["point_count"], 1);
    assert_eq!(json["points"][0]["speed_m_s"], 3.0);
}

#[tokio::test]
async fn upload_of_non_fit_data_is_rejected() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_file(b"definitely not a fit file")))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
