use crate::config::BackendConfig;
use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use thiserror::Error;

/// Fixed sub-path the backend exposes for file-based prediction.
const PREDICT_FILE_PATH: &str = "/predict/file";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to reach inference backend: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A file lifted out of the incoming multipart request, forwarded as-is.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The backend's response, untouched: status, content type and raw body.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendReply {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim() == "application/json")
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn predict_file(&self, upload: UploadedFile) -> Result<BackendReply, BackendError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.get_base_url(),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn predict_file(&self, upload: UploadedFile) -> Result<BackendReply, BackendError> {
        let mut part =
            reqwest::multipart::Part::bytes(upload.data.to_vec()).file_name(upload.filename);
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, PREDICT_FILE_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Ok(BackendReply {
            status,
            content_type,
            body,
        })
    }
}
