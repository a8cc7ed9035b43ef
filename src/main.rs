use config::{CameraSource, Config};
use device_camera::impl_fake::DeviceCameraFake;
use device_camera::impl_folder::DeviceCameraFolder;
use device_camera::interface::DeviceCamera;
use library::logger::impl_tracing::LoggerTracing;
use library::logger::interface::Logger;
use prediction_client::impl_fake::PredictionClientFake;
use prediction_client::impl_http::PredictionClientHttp;
use prediction_client::interface::PredictionClient;
use predictor::main::MediaPredictor;
use std::path::PathBuf;
use std::sync::Arc;

mod app;
mod config;
mod device_camera;
mod library;
mod media;
mod prediction_client;
mod predictor;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(Config::default_path);

    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    library::logger::subscriber::init(config.logger_timezone)?;

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerTracing::new());

    if let Some(path) = &config_path {
        logger.info(&format!("Config: {}", path.display()));
    }

    let device_camera: Arc<dyn DeviceCamera + Send + Sync> = match &config.camera {
        CameraSource::Fake { deny_access } => {
            Arc::new(DeviceCameraFake::new(logger.clone(), *deny_access))
        }
        CameraSource::Folder { path } => {
            Arc::new(DeviceCameraFolder::new(logger.clone(), path.clone()))
        }
    };

    let prediction_client: Arc<dyn PredictionClient + Send + Sync> = if config.fake_predictions {
        logger.info("Using canned predictions");
        Arc::new(PredictionClientFake::new(logger.clone()))
    } else {
        logger.info(&format!("Prediction server: {}", config.server_url));
        Arc::new(PredictionClientHttp::new(&config, logger.clone())?)
    };

    let predictor = MediaPredictor::new(
        config.clone(),
        logger.clone(),
        device_camera,
        prediction_client,
    );

    app::run(&config, predictor).map_err(|err| err.to_string())?;

    logger.info("Window closed");

    Ok(())
}
