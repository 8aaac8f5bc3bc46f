use serde::{Deserialize, Serialize};

/// Detections at or below this probability are dropped before they ever
/// reach session state.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// A detected region in relative units: every field is a fraction in [0, 1]
/// of the image width/height, origin top-left. `left + width <= 1` and
/// `top + height <= 1` are expected but backend-trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub tag_id: String,
    pub tag_name: String,
    pub probability: f32,
    pub bounding_box: BoundingBox,
}

/// The nested prediction payload. Only `predictions` is consumed; the rest
/// travels along for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub id: String,
    pub project: String,
    pub iteration: String,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    pub filename: String,
    pub predictions: PredictionBatch,
}

/// Keeps the detections worth showing. The boundary is exclusive: a
/// probability of exactly 0.5 is dropped.
pub fn filter_confident(predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions
        .into_iter()
        .filter(|p| p.probability > CONFIDENCE_THRESHOLD)
        .collect()
}

/// Presentation bucket for badge coloring. Lower bounds are inclusive,
/// upper bounds exclusive; callers only ever hold probabilities above the
/// confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn classify(probability: f32) -> Self {
        if probability >= 0.8 {
            ConfidenceTier::High
        } else if probability >= 0.6 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}
