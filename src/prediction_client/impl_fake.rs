use crate::library::logger::interface::Logger;
use crate::media::media_file::MediaFile;
use crate::prediction_client::interface::{
    Endpoint, Prediction, PredictionClient, PredictionError,
};
use rand::distr::{Distribution, Uniform};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

const LABELS: [&str; 8] = ["A", "B", "C", "D", "E", "Hello", "Thanks", "No Hand Detected"];

/// A call the fake received, kept for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub file_name: String,
    pub mime: String,
}

/// Answers with queued responses first, then with random labels.
#[derive(Clone)]
pub struct PredictionClientFake {
    logger: Arc<dyn Logger + Send + Sync>,
    responses: Arc<Mutex<VecDeque<Result<Prediction, PredictionError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl PredictionClientFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger
                .with_namespace("prediction_client")
                .with_namespace("fake"),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[cfg(test)]
    pub fn push_response(&self, response: Result<Prediction, PredictionError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    #[cfg(test)]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn random_prediction() -> Result<Prediction, PredictionError> {
        let mut rng = rand::rng();
        let index_dist = Uniform::new(0, LABELS.len())
            .map_err(|err| PredictionError::Decode(err.to_string()))?;
        let confidence_dist =
            Uniform::new(0.0f32, 1.0).map_err(|err| PredictionError::Decode(err.to_string()))?;

        Ok(Prediction {
            label: LABELS[index_dist.sample(&mut rng)].to_string(),
            confidence: Some(confidence_dist.sample(&mut rng)),
        })
    }
}

impl PredictionClient for PredictionClientFake {
    fn predict(&self, endpoint: Endpoint, file: &MediaFile) -> Result<Prediction, PredictionError> {
        self.logger.info(&format!(
            "Predicting {} ({}) via {:?}",
            file.name, file.mime, endpoint
        ));

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                endpoint,
                file_name: file.name.clone(),
                mime: file.mime.clone(),
            });

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match queued {
            Some(response) => response,
            None => Self::random_prediction(),
        }
    }
}
