use crate::media::media_file::{MediaFile, MediaKind};
use serde::Deserialize;

/// Which prediction route a file is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Image,
    Video,
}

impl Endpoint {
    /// Images go to the image route. Everything else is treated as video.
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Endpoint::Image,
            MediaKind::Video | MediaKind::Other => Endpoint::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered {status}: {message}")]
    Server { status: u16, message: String },
    #[error("server answered {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("could not encode frame: {0}")]
    Encode(String),
}

pub trait PredictionClient: Send + Sync {
    fn predict(&self, endpoint: Endpoint, file: &MediaFile) -> Result<Prediction, PredictionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_kind() {
        assert_eq!(Endpoint::for_kind(MediaKind::Image), Endpoint::Image);
        assert_eq!(Endpoint::for_kind(MediaKind::Video), Endpoint::Video);
        assert_eq!(Endpoint::for_kind(MediaKind::Other), Endpoint::Video);
    }

    #[test]
    fn decodes_prediction_with_and_without_confidence() {
        let with: Prediction =
            serde_json::from_str(r#"{"prediction": "A", "confidence": 0.75}"#).unwrap();
        assert_eq!(with.label, "A");
        assert_eq!(with.confidence, Some(0.75));

        let without: Prediction = serde_json::from_str(r#"{"prediction": "H E L L O"}"#).unwrap();
        assert_eq!(without.label, "H E L L O");
        assert_eq!(without.confidence, None);
    }
}
