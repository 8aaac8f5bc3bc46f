use crate::{
    backend::{Backend, BackendReply, UploadedFile},
    server::SharedState,
};
use axum::{
    body::Body,
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;
use tracing::instrument;

#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    state.metrics.record_request("predict");

    let upload = match multipart {
        Ok(multipart) => read_file_field(multipart).await,
        Err(rejection) => {
            tracing::warn!("Rejected non-multipart request: {}", rejection.body_text());
            None
        }
    };

    let started = Instant::now();
    let response = relay_upload(state.backend.as_ref(), upload).await;
    state
        .metrics
        .record_relay_duration(started.elapsed().as_millis() as u64, "predict");

    response
}

/// Pulls the `file` part out of the multipart body. Other parts are ignored.
async fn read_file_field(mut multipart: Multipart) -> Option<UploadedFile> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.ok()?;

        return Some(UploadedFile {
            filename,
            content_type,
            data,
        });
    }
    None
}

async fn relay_upload<B: Backend>(backend: &B, upload: Option<UploadedFile>) -> Response {
    let Some(upload) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No file uploaded"})),
        )
            .into_response();
    };

    match backend.predict_file(upload).await {
        Ok(reply) if reply.status.is_success() => passthrough_response(reply),
        Ok(reply) => {
            tracing::error!(status = %reply.status, "Inference backend returned non-success");
            backend_error_response()
        }
        Err(e) => {
            tracing::error!("Failed to relay upload to inference backend: {:?}", e);
            backend_error_response()
        }
    }
}

fn passthrough_response(reply: BackendReply) -> Response {
    if reply.is_json() {
        return match Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(reply.body))
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to build passthrough response: {:?}", e);
                backend_error_response()
            }
        };
    }

    // Non-JSON success is handed back raw, with the backend's own status.
    let builder = Response::builder().status(reply.status);
    let builder = match reply.content_type {
        Some(content_type) => builder.header(header::CONTENT_TYPE, content_type),
        None => builder,
    };
    match builder.body(Body::from(reply.body)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build passthrough response: {:?}", e);
            backend_error_response()
        }
    }
}

fn backend_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Backend error"})),
    )
        .into_response()
}
