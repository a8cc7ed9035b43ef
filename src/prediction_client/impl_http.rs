//! Prediction backend reached over HTTP with multipart uploads.

use crate::config::Config;
use crate::library::logger::interface::Logger;
use crate::media::media_file::MediaFile;
use crate::prediction_client::interface::{
    Endpoint, Prediction, PredictionClient, PredictionError,
};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Shape of the body the server sends with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct PredictionClientHttp {
    logger: Arc<dyn Logger + Send + Sync>,
    client: reqwest::blocking::Client,
    image_url: Url,
    video_url: Url,
}

impl PredictionClientHttp {
    pub fn new(
        config: &Config,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, PredictionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| PredictionError::Transport(err.to_string()))?;

        Ok(Self {
            logger: logger
                .with_namespace("prediction_client")
                .with_namespace("http"),
            client,
            image_url: endpoint_url(&config.server_url, &config.image_endpoint),
            video_url: endpoint_url(&config.server_url, &config.video_endpoint),
        })
    }

    fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Image => &self.image_url,
            Endpoint::Video => &self.video_url,
        }
    }
}

/// Appends `path` to whatever path `base` already has.
pub fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

impl PredictionClient for PredictionClientHttp {
    fn predict(&self, endpoint: Endpoint, file: &MediaFile) -> Result<Prediction, PredictionError> {
        let url = self.url(endpoint);
        self.logger.debug(&format!(
            "POST {} ({}, {} bytes)",
            url,
            file.mime,
            file.bytes.len()
        ));

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|err| PredictionError::Encode(err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .map_err(|err| PredictionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(error_body) => PredictionError::Server {
                    status: status.as_u16(),
                    message: error_body.error,
                },
                Err(_) => PredictionError::Status(status.as_u16()),
            });
        }

        let prediction = response
            .json::<Prediction>()
            .map_err(|err| PredictionError::Decode(err.to_string()))?;

        self.logger
            .debug(&format!("{} answered {:?}", url, prediction.label));

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_fake::LoggerFake;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves one canned response and hands back the raw request it received.
    fn serve_once(response: String) -> (Url, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_sender, request_receiver) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let request = read_request(&mut stream);
                let _ = stream.write_all(response.as_bytes());
                let _ = request_sender.send(request);
            }
        });
        (Url::parse(&format!("http://{}", addr)).unwrap(), request_receiver)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let read = match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(read) => read,
            };
            received.extend_from_slice(&buf[..read]);

            let text = String::from_utf8_lossy(&received);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if received.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&received).into_owned()
    }

    fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn client_for(server_url: Url) -> PredictionClientHttp {
        let config = Config {
            server_url,
            ..Config::default()
        };
        PredictionClientHttp::new(&config, Arc::new(LoggerFake::new())).unwrap()
    }

    #[test]
    fn png_upload_posts_multipart_to_the_image_route() {
        let (url, requests) = serve_once(json_response(
            "200 OK",
            r#"{"prediction": "B", "confidence": 0.9}"#,
        ));
        let client = client_for(url);
        let file = MediaFile::new("hand.png", "image/png", b"\x89PNG fake".to_vec());

        let prediction = client.predict(Endpoint::Image, &file).unwrap();

        assert_eq!(prediction.label, "B");
        assert_eq!(prediction.confidence, Some(0.9));
        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /predict_image "));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("filename=\"hand.png\""));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: image/png"));
    }

    #[test]
    fn mp4_upload_goes_to_the_video_route() {
        let (url, requests) = serve_once(json_response("200 OK", r#"{"prediction": "H I"}"#));
        let client = client_for(url);
        let file = MediaFile::new("clip.mp4", "video/mp4", vec![0u8; 32]);

        let prediction = client.predict(Endpoint::Video, &file).unwrap();

        assert_eq!(prediction.label, "H I");
        assert!(requests.recv().unwrap().starts_with("POST /predict_video "));
    }

    #[test]
    fn error_body_becomes_a_server_error() {
        let (url, _requests) = serve_once(json_response(
            "400 Bad Request",
            r#"{"error": "No file uploaded"}"#,
        ));
        let client = client_for(url);
        let file = MediaFile::new("a.png", "image/png", vec![1, 2, 3]);

        let err = client.predict(Endpoint::Image, &file).unwrap_err();

        match err {
            PredictionError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No file uploaded");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn non_json_failure_keeps_the_status() {
        let (url, _requests) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\noops"
                .to_string(),
        );
        let client = client_for(url);
        let file = MediaFile::new("a.png", "image/png", vec![1]);

        let err = client.predict(Endpoint::Image, &file).unwrap_err();

        assert!(matches!(err, PredictionError::Status(500)));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let (url, _requests) = serve_once(json_response("200 OK", r#"{"label": "A"}"#));
        let client = client_for(url);
        let file = MediaFile::new("a.png", "image/png", vec![1]);

        let err = client.predict(Endpoint::Image, &file).unwrap_err();

        assert!(matches!(err, PredictionError::Decode(_)));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(Url::parse(&format!("http://{}", addr)).unwrap());
        let file = MediaFile::new("a.png", "image/png", vec![1]);

        let err = client.predict(Endpoint::Image, &file).unwrap_err();

        assert!(matches!(err, PredictionError::Transport(_)));
    }

    #[test]
    fn endpoint_url_keeps_a_base_path() {
        let base = Url::parse("http://gpu-box:8080/api/").unwrap();
        assert_eq!(
            endpoint_url(&base, "/predict_image").as_str(),
            "http://gpu-box:8080/api/predict_image"
        );

        let root = Url::parse("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            endpoint_url(&root, "predict_video").as_str(),
            "http://127.0.0.1:5000/predict_video"
        );
    }
}
