use crate::config::Config;
use crate::device_camera::interface::{CameraError, DeviceCamera};
use crate::library::logger::interface::Logger;
use crate::library::scheduled_task::ScheduledTask;
use crate::media::jpeg::encode_jpeg;
use crate::media::media_file::{mime_from_name, MediaFile};
use crate::media::preview;
use crate::prediction_client::interface::{Endpoint, PredictionClient, PredictionError};
use crate::predictor::core::{Effect, Msg};
use std::ops::ControlFlow;
use std::sync::mpsc::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const PICKER_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "mp4", "avi", "mov", "mkv",
];

/// The running live loop, plus the newest session already cancelled so a
/// start that loses the race against its own cancel never runs.
#[derive(Default)]
struct LiveSlot {
    task: Option<(u64, ScheduledTask)>,
    cancelled_up_to: Option<u64>,
}

/// Camera requests run on separate threads, so a stop may arrive before
/// the start it undoes, or after a newer start.
#[derive(Default)]
struct CameraSlot {
    started_up_to: Option<u64>,
    stopped_up_to: Option<u64>,
}

#[derive(Clone)]
pub struct RunEffect {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    prediction_client: Arc<dyn PredictionClient + Send + Sync>,
    live_slot: Arc<Mutex<LiveSlot>>,
    camera_slot: Arc<Mutex<CameraSlot>>,
    capture_failing: Arc<AtomicBool>,
}

impl RunEffect {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        prediction_client: Arc<dyn PredictionClient + Send + Sync>,
    ) -> Self {
        Self {
            config,
            logger: logger.with_namespace("run_effect"),
            device_camera,
            prediction_client,
            live_slot: Arc::new(Mutex::new(LiveSlot::default())),
            camera_slot: Arc::new(Mutex::new(CameraSlot::default())),
            capture_failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn run_effect(&self, effect: Effect, event_sender: Sender<Msg>) {
        self.logger
            .debug(&format!("Running effect: {}", effect.to_display_string()));

        match effect {
            Effect::SubscribeTick => loop {
                std::thread::sleep(self.config.tick_rate);
                if event_sender.send(Msg::Tick(Instant::now())).is_err() {
                    break;
                }
            },
            Effect::StartCamera { generation } => {
                if let Some(result) = self.start_camera(generation) {
                    let _ = event_sender.send(Msg::CameraStartDone { generation, result });
                }
            }
            Effect::StopCamera { generation } => {
                self.stop_camera(generation);
            }
            Effect::CaptureFrame => {
                let frame = self.device_camera.capture_frame().map(Arc::new);
                match &frame {
                    Ok(_) => {
                        if self.capture_failing.swap(false, Ordering::SeqCst) {
                            self.logger.info("Frame capture recovered");
                        }
                    }
                    // Warn once per failure streak, not on every tick.
                    Err(err) => {
                        if self.capture_failing.swap(true, Ordering::SeqCst) {
                            self.logger.debug(&format!("Frame capture failed: {}", err));
                        } else {
                            self.logger.warn(&format!("Frame capture failed: {}", err));
                        }
                    }
                }
                let _ = event_sender.send(Msg::FrameCaptured(frame));
            }
            Effect::OpenFileDialog => {
                let picked = rfd::FileDialog::new()
                    .set_title("Choose an image or video")
                    .add_filter("Images and videos", &PICKER_EXTENSIONS[..])
                    .pick_file();
                let _ = event_sender.send(Msg::FilePicked(picked));
            }
            Effect::LoadMediaFromPath { path } => {
                let loaded = preview::load_from_path(&path, self.config.preview_max_dimension);
                match &loaded {
                    Ok(loaded) => self.logger.info(&format!(
                        "Selected {} ({})",
                        loaded.file.name, loaded.file.mime
                    )),
                    Err(err) => self.logger.error(&err.to_string()),
                }
                let _ = event_sender.send(Msg::MediaLoaded(loaded));
            }
            Effect::LoadMediaFromBytes { name, mime, bytes } => {
                let mime = mime
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or_else(|| mime_from_name(&name).to_string());
                let loaded = preview::load_from_bytes(
                    MediaFile::new(name, mime, bytes),
                    None,
                    self.config.preview_max_dimension,
                );
                if let Err(err) = &loaded {
                    self.logger.error(&err.to_string());
                }
                let _ = event_sender.send(Msg::MediaLoaded(loaded));
            }
            Effect::OpenInSystemPlayer { path } => {
                if let Err(err) = open::that(&path) {
                    self.logger
                        .warn(&format!("Could not open {}: {}", path.display(), err));
                }
            }
            Effect::PredictUpload { endpoint, file } => {
                let result = self.prediction_client.predict(endpoint, &file);
                match &result {
                    Ok(prediction) => self.logger.info(&format!(
                        "{} predicted as {:?}",
                        file.name, prediction.label
                    )),
                    Err(err) => self
                        .logger
                        .error(&format!("Prediction for {} failed: {}", file.name, err)),
                }
                let _ = event_sender.send(Msg::UploadPredictionDone(result));
            }
            Effect::StartLiveSchedule { session, period } => {
                self.start_live_schedule(session, period, event_sender);
            }
            Effect::CancelLiveSchedule { session } => {
                self.cancel_live_schedule(session);
            }
            Effect::PredictFrame { session, frame } => {
                let result = encode_jpeg(&frame, self.config.jpeg_quality)
                    .map_err(|err| PredictionError::Encode(err.to_string()))
                    .and_then(|bytes| {
                        let file = MediaFile::new("frame.jpg", "image/jpeg", bytes);
                        self.prediction_client.predict(Endpoint::Image, &file)
                    });
                if let Err(err) = &result {
                    self.logger
                        .warn(&format!("Live prediction {} failed: {}", session, err));
                }
                let _ = event_sender.send(Msg::LivePredictionDone { session, result });
            }
        }
    }

    /// Returns `None` when the request was superseded before it ran.
    fn start_camera(&self, generation: u64) -> Option<Result<(), CameraError>> {
        let mut slot = self.camera_slot.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.stopped_up_to.is_some_and(|stopped| generation <= stopped) {
            self.logger
                .debug(&format!("Camera request {} was stopped before it ran", generation));
            return None;
        }
        if slot.started_up_to.is_some_and(|started| generation < started) {
            self.logger.debug(&format!(
                "Camera request {} is older than {:?}",
                generation, slot.started_up_to
            ));
            return None;
        }

        let started = self.device_camera.start();
        match &started {
            Ok(()) => slot.started_up_to = Some(generation),
            Err(err) => self.logger.warn(&format!("Camera unavailable: {}", err)),
        }
        Some(started)
    }

    fn stop_camera(&self, generation: u64) {
        let mut slot = self.camera_slot.lock().unwrap_or_else(PoisonError::into_inner);

        slot.stopped_up_to = Some(
            slot.stopped_up_to
                .map_or(generation, |stopped| stopped.max(generation)),
        );

        if slot.started_up_to.is_some_and(|started| started > generation) {
            self.logger.debug(&format!(
                "Camera stop {} skipped, request {:?} is newer",
                generation, slot.started_up_to
            ));
            return;
        }

        if let Err(err) = self.device_camera.stop() {
            self.logger.warn(&format!("Camera did not stop: {}", err));
        }
    }

    fn start_live_schedule(&self, session: u64, period: Duration, event_sender: Sender<Msg>) {
        let mut slot = self.live_slot.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.cancelled_up_to.is_some_and(|cancelled| session <= cancelled) {
            self.logger
                .debug(&format!("Live loop {} was cancelled before it started", session));
            return;
        }

        if let Some((running, _)) = &slot.task {
            if *running >= session {
                self.logger.debug(&format!(
                    "Live loop {} is older than running loop {}",
                    session, running
                ));
                return;
            }
        }

        self.logger.info(&format!(
            "Starting live loop {} every {}ms",
            session,
            period.as_millis()
        ));

        let task = ScheduledTask::spawn(period, move || {
            match event_sender.send(Msg::LiveTick { session }) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            }
        });

        if let Some((previous, mut previous_task)) = slot.task.replace((session, task)) {
            previous_task.cancel();
            self.logger
                .info(&format!("Replaced live loop {}", previous));
        }
    }

    fn cancel_live_schedule(&self, session: u64) {
        let mut slot = self.live_slot.lock().unwrap_or_else(PoisonError::into_inner);

        slot.cancelled_up_to = Some(
            slot.cancelled_up_to
                .map_or(session, |cancelled| cancelled.max(session)),
        );

        match slot.task.take() {
            Some((current, mut task)) if current <= session => {
                task.cancel();
                self.logger.info(&format!("Stopped live loop {}", current));
            }
            other => slot.task = other,
        }
    }

    #[cfg(test)]
    pub fn live_loop_session(&self) -> Option<u64> {
        self.live_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .as_ref()
            .map(|(session, _)| *session)
    }
}
