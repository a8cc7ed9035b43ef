use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const CONFIG_DIR_NAME: &str = "media-predict";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid server url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid utc offset of {0} minutes")]
    InvalidOffset(i32),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraSource {
    Fake {
        #[serde(default)]
        deny_access: bool,
    },
    Folder {
        path: PathBuf,
    },
}

impl Default for CameraSource {
    fn default() -> Self {
        CameraSource::Fake { deny_access: false }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: Url,
    pub image_endpoint: String,
    pub video_endpoint: String,
    pub live_prediction_interval: Duration,
    pub tick_rate: Duration,
    pub request_timeout: Option<Duration>,
    pub jpeg_quality: u8,
    pub preview_max_dimension: u32,
    pub logger_timezone: chrono::FixedOffset,
    pub camera: CameraSource,
    /// Answer with canned labels instead of calling the server.
    pub fake_predictions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            image_endpoint: "/predict_image".to_string(),
            video_endpoint: "/predict_video".to_string(),
            live_prediction_interval: Duration::from_millis(500),
            tick_rate: Duration::from_millis(66),
            request_timeout: None,
            jpeg_quality: 92,
            preview_max_dimension: 1024,
            logger_timezone: local_offset(),
            camera: CameraSource::default(),
            fake_predictions: false,
        }
    }
}

/// Every key is optional; missing keys keep their default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    server_url: Option<String>,
    image_endpoint: Option<String>,
    video_endpoint: Option<String>,
    live_prediction_interval_ms: Option<u64>,
    tick_rate_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    jpeg_quality: Option<u8>,
    preview_max_dimension: Option<u32>,
    logger_utc_offset_minutes: Option<i32>,
    camera: Option<CameraSource>,
    fake_predictions: Option<bool>,
}

impl Config {
    /// `<config_dir>/media-predict/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads `path` on top of the defaults. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut config = Self::default();

        if let Some(server_url) = file.server_url {
            config.server_url =
                Url::parse(&server_url).map_err(|source| ConfigError::InvalidUrl {
                    url: server_url.clone(),
                    source,
                })?;
        }
        if let Some(image_endpoint) = file.image_endpoint {
            config.image_endpoint = image_endpoint;
        }
        if let Some(video_endpoint) = file.video_endpoint {
            config.video_endpoint = video_endpoint;
        }
        if let Some(ms) = file.live_prediction_interval_ms {
            config.live_prediction_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = file.tick_rate_ms {
            config.tick_rate = Duration::from_millis(ms.max(1));
        }
        config.request_timeout = file.request_timeout_ms.map(Duration::from_millis);
        if let Some(quality) = file.jpeg_quality {
            config.jpeg_quality = quality.clamp(1, 100);
        }
        if let Some(dimension) = file.preview_max_dimension {
            config.preview_max_dimension = dimension.max(1);
        }
        if let Some(minutes) = file.logger_utc_offset_minutes {
            config.logger_timezone = chrono::FixedOffset::east_opt(minutes * 60)
                .ok_or(ConfigError::InvalidOffset(minutes))?;
        }
        if let Some(camera) = file.camera {
            config.camera = camera;
        }
        if let Some(fake_predictions) = file.fake_predictions {
            config.fake_predictions = fake_predictions;
        }

        Ok(config)
    }
}

fn default_server_url() -> Url {
    match Url::parse("http://127.0.0.1:5000") {
        Ok(url) => url,
        Err(_) => unreachable!("literal url is valid"),
    }
}

fn local_offset() -> chrono::FixedOffset {
    *chrono::Local::now().offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_prediction_server() {
        let config = Config::default();

        assert_eq!(config.server_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.image_endpoint, "/predict_image");
        assert_eq!(config.video_endpoint, "/predict_video");
        assert_eq!(config.live_prediction_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.camera, CameraSource::Fake { deny_access: false });
    }

    #[test]
    fn file_overrides_only_the_keys_it_sets() {
        let config = Config::from_toml(
            r#"
            server_url = "http://gpu-box:8080/api/"
            live_prediction_interval_ms = 250
            request_timeout_ms = 3000
            logger_utc_offset_minutes = -420
            fake_predictions = true

            [camera]
            kind = "folder"
            path = "/tmp/frames"
            "#,
        )
        .unwrap();

        assert_eq!(config.server_url.as_str(), "http://gpu-box:8080/api/");
        assert_eq!(config.live_prediction_interval, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.logger_timezone.local_minus_utc(), -7 * 3600);
        assert_eq!(
            config.camera,
            CameraSource::Folder {
                path: PathBuf::from("/tmp/frames")
            }
        );
        assert_eq!(config.image_endpoint, "/predict_image");
        assert_eq!(config.jpeg_quality, 92);
        assert!(config.fake_predictions);
    }

    #[test]
    fn rejects_an_invalid_server_url() {
        let err = Config::from_toml(r#"server_url = "not a url""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml("polling = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.image_endpoint, "/predict_image");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera]\nkind = \"fake\"\ndeny_access = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.camera, CameraSource::Fake { deny_access: true });
    }
}
