use crate::prediction::{filter_confident, DetectionResponse, Prediction};
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Upload failures as shown to the user. Display strings stay generic;
/// the attached sources carry the detail for logging.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a .png, .jpg or .jpeg image")]
    UnsupportedFileType,
    #[error("Prediction failed. Please try again.")]
    Transport(#[from] reqwest::Error),
    #[error("Prediction failed. Please try again.")]
    RelayStatus(reqwest::StatusCode),
}

/// Case-insensitive extension check. Runs before any network traffic: a
/// rejected file is never submitted.
pub fn validate_filename(filename: &str) -> Result<(), UploadError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(UploadError::UnsupportedFileType),
    }
}

pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Submits the file as multipart field `file` and returns the confident
    /// detections from the relay's response.
    #[instrument(skip(self, data))]
    pub async fn predict(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<Vec<Prediction>, UploadError> {
        validate_filename(filename)?;

        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/predict", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Relay returned non-success");
            return Err(UploadError::RelayStatus(response.status()));
        }

        let parsed: DetectionResponse = response.json().await?;
        tracing::debug!(
            filename = %parsed.filename,
            count = parsed.predictions.predictions.len(),
            "Received detections"
        );

        Ok(filter_confident(parsed.predictions.predictions))
    }
}
