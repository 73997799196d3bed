pub mod fit;

use axum::{
    Router,
    extract::Multipart,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
};
use serde::Serialize;

pub use fit::{FitDecodeError, RunningDataPoint, decode_running_points};

/// JSON body returned for a successfully decoded upload.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub point_count: usize,
    pub points: Vec<RunningDataPoint>,
}

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/upload", post(handle_upload))
}

async fn landing_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\
         <html lang=\"en\"><head><meta charset=\"UTF-8\"><title>stridefit</title></head>\
         <body><h1>stridefit</h1>\
         <p>POST a FIT file as multipart field <code>file</code> to /upload \
         to receive its running data points as JSON.</p></body></html>",
    )
}

async fn handle_upload(mut multipart: Multipart) -> impl IntoResponse {
    let mut uploaded: Option<Vec<u8>> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            match field.bytes().await {
                Ok(bytes) => uploaded = Some(bytes.to_vec()),
                Err(err) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read uploaded file: {err}"),
                    )
                        .into_response();
                }
            }
        }
    }

    let file_bytes = match uploaded {
        Some(bytes) => bytes,
        None => return (StatusCode::BAD_REQUEST, "No file provided").into_response(),
    };

    match decode_running_points(&file_bytes) {
        Ok(points) => {
            tracing::debug!(points = points.len(), "upload decoded");
            Json(ActivityResponse {
                point_count: points.len(),
                points,
            })
            .into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}
