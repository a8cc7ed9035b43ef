use crate::config::Config;
use crate::device_camera::interface::CameraError;
use crate::media::media_file::MediaFile;
use crate::media::preview::{LoadedMedia, MediaError, Preview};
use crate::prediction_client::interface::{Endpoint, Prediction, PredictionError};
use crate::predictor::label::LabelDisplay;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const ALERT_CAMERA_DENIED: &str = "Webcam access denied!";
pub const ALERT_NO_FILE: &str = "Please upload a file first!";
pub const ALERT_SERVER_ERROR: &str = "Error contacting server!";
pub const ALERT_UNREADABLE_FILE: &str = "Could not open the selected file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Upload,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Off,
    Starting,
    Streaming,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveLoop {
    #[default]
    Idle,
    Running { session: u64, in_flight: bool },
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub mode: InputMode,
    pub camera: CameraState,
    /// Bumped on every camera request so a late answer to an older one is ignored.
    pub camera_generation: u64,
    pub selected: Option<Arc<MediaFile>>,
    pub preview: Preview,
    pub webcam_frame: Option<Arc<RgbaImage>>,
    pub capturing: bool,
    pub loading: bool,
    pub drop_zone_hovered: bool,
    pub label: LabelDisplay,
    pub confidence: Option<f32>,
    pub live: LiveLoop,
    pub next_session: u64,
    pub alert: Option<String>,
}

/// A file dropped onto the window. Native hosts give a path, others the bytes.
#[derive(Debug, Clone)]
pub struct DroppedMedia {
    pub name: String,
    pub mime: Option<String>,
    pub path: Option<PathBuf>,
    pub bytes: Option<Arc<[u8]>>,
}

#[derive(Debug)]
pub enum Msg {
    SelectMode(InputMode),
    CameraStartDone {
        generation: u64,
        result: Result<(), CameraError>,
    },
    Tick(Instant),
    FrameCaptured(Result<Arc<RgbaImage>, CameraError>),
    BrowseRequested,
    FilePicked(Option<PathBuf>),
    FileDropped(DroppedMedia),
    DropZoneHovered(bool),
    MediaLoaded(Result<LoadedMedia, MediaError>),
    PlayVideo,
    PredictPressed,
    UploadPredictionDone(Result<Prediction, PredictionError>),
    LiveTick {
        session: u64,
    },
    LivePredictionDone {
        session: u64,
        result: Result<Prediction, PredictionError>,
    },
    DismissAlert,
}

impl Msg {
    pub fn to_display_string(&self) -> String {
        match self {
            Msg::FrameCaptured(Ok(frame)) => {
                format!("FrameCaptured(Ok({}x{}))", frame.width(), frame.height())
            }
            Msg::MediaLoaded(Ok(loaded)) => format!(
                "MediaLoaded(Ok({}, {}, {} bytes))",
                loaded.file.name,
                loaded.file.mime,
                loaded.file.bytes.len()
            ),
            Msg::FileDropped(dropped) => format!("FileDropped({})", dropped.name),
            msg => format!("{:?}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Effect {
    SubscribeTick,
    StartCamera {
        generation: u64,
    },
    StopCamera {
        generation: u64,
    },
    CaptureFrame,
    OpenFileDialog,
    LoadMediaFromPath {
        path: PathBuf,
    },
    LoadMediaFromBytes {
        name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
    OpenInSystemPlayer {
        path: PathBuf,
    },
    PredictUpload {
        endpoint: Endpoint,
        file: Arc<MediaFile>,
    },
    StartLiveSchedule {
        session: u64,
        period: Duration,
    },
    CancelLiveSchedule {
        session: u64,
    },
    PredictFrame {
        session: u64,
        frame: Arc<RgbaImage>,
    },
}

impl Effect {
    pub fn to_display_string(&self) -> String {
        match self {
            Effect::LoadMediaFromBytes { name, bytes, .. } => {
                format!("LoadMediaFromBytes({}, {} bytes)", name, bytes.len())
            }
            Effect::PredictUpload { endpoint, file } => {
                format!("PredictUpload({:?}, {})", endpoint, file.name)
            }
            Effect::PredictFrame { session, frame } => format!(
                "PredictFrame(session {}, {}x{})",
                session,
                frame.width(),
                frame.height()
            ),
            effect => format!("{:?}", effect),
        }
    }
}

pub fn init() -> (Model, Vec<Effect>) {
    (Model::default(), vec![Effect::SubscribeTick])
}

pub fn transition(config: &Config, mut model: Model, msg: Msg) -> (Model, Vec<Effect>) {
    match msg {
        // Mode switch
        Msg::SelectMode(InputMode::Upload) => {
            if model.mode == InputMode::Upload {
                return (model, vec![]);
            }
            model.mode = InputMode::Upload;
            let effects = leave_live(&mut model);
            (model, effects)
        }
        Msg::SelectMode(InputMode::Live) => {
            model.mode = InputMode::Live;
            model.drop_zone_hovered = false;
            match model.camera {
                CameraState::Starting | CameraState::Streaming => (model, vec![]),
                CameraState::Off | CameraState::Denied => {
                    model.camera_generation += 1;
                    model.camera = CameraState::Starting;
                    let generation = model.camera_generation;
                    (model, vec![Effect::StartCamera { generation }])
                }
            }
        }

        // Camera
        // Answer to a request that was already superseded.
        Msg::CameraStartDone { generation, .. } if generation != model.camera_generation => {
            (model, vec![])
        }
        Msg::CameraStartDone { result: Ok(()), .. } => {
            // Leaving Live already asked the runner to stop this generation.
            if model.mode != InputMode::Live || model.camera != CameraState::Starting {
                return (model, vec![]);
            }
            model.camera = CameraState::Streaming;
            model.capturing = true;
            (model, vec![Effect::CaptureFrame])
        }
        Msg::CameraStartDone { result: Err(_), .. } => {
            if model.mode != InputMode::Live || model.camera != CameraState::Starting {
                return (model, vec![]);
            }
            model.camera = CameraState::Denied;
            model.alert = Some(ALERT_CAMERA_DENIED.to_string());
            // A loop started while the camera was still coming up has nothing to capture.
            let effects = stop_live_loop(&mut model).into_iter().collect();
            (model, effects)
        }
        Msg::Tick(_) => {
            if model.mode == InputMode::Live
                && model.camera == CameraState::Streaming
                && !model.capturing
            {
                model.capturing = true;
                (model, vec![Effect::CaptureFrame])
            } else {
                (model, vec![])
            }
        }
        Msg::FrameCaptured(result) => {
            model.capturing = false;
            if let Ok(frame) = result {
                if model.mode == InputMode::Live && model.camera == CameraState::Streaming {
                    model.webcam_frame = Some(frame);
                }
            }
            (model, vec![])
        }

        // Media intake
        Msg::BrowseRequested => {
            if model.mode == InputMode::Upload {
                (model, vec![Effect::OpenFileDialog])
            } else {
                (model, vec![])
            }
        }
        Msg::FilePicked(Some(path)) if model.mode == InputMode::Upload => {
            (model, vec![Effect::LoadMediaFromPath { path }])
        }
        Msg::FilePicked(_) => (model, vec![]),
        Msg::DropZoneHovered(hovered) => {
            model.drop_zone_hovered = hovered && model.mode == InputMode::Upload;
            (model, vec![])
        }
        Msg::FileDropped(dropped) => {
            model.drop_zone_hovered = false;
            if model.mode != InputMode::Upload {
                return (model, vec![]);
            }
            match (dropped.path, dropped.bytes) {
                (Some(path), _) => (model, vec![Effect::LoadMediaFromPath { path }]),
                (None, Some(bytes)) => (
                    model,
                    vec![Effect::LoadMediaFromBytes {
                        name: dropped.name,
                        mime: dropped.mime,
                        bytes: bytes.to_vec(),
                    }],
                ),
                (None, None) => (model, vec![]),
            }
        }
        Msg::MediaLoaded(Ok(loaded)) => {
            model.selected = Some(loaded.file);
            model.preview = loaded.preview;
            (model, vec![])
        }
        Msg::MediaLoaded(Err(_)) => {
            model.selected = None;
            model.preview = Preview::None;
            model.alert = Some(ALERT_UNREADABLE_FILE.to_string());
            (model, vec![])
        }
        Msg::PlayVideo => match &model.preview {
            Preview::Video {
                path: Some(path), ..
            } => {
                let path = path.clone();
                (model, vec![Effect::OpenInSystemPlayer { path }])
            }
            _ => (model, vec![]),
        },

        // Prediction
        Msg::PredictPressed => {
            model.label.forget_last();
            match model.mode {
                InputMode::Live => start_live(config, model),
                InputMode::Upload => start_upload(model),
            }
        }
        Msg::UploadPredictionDone(result) => {
            model.loading = false;
            match result {
                Ok(prediction) => {
                    model.label.show(&prediction.label);
                    model.confidence = prediction.confidence;
                }
                Err(_) => {
                    model.alert = Some(ALERT_SERVER_ERROR.to_string());
                }
            }
            (model, vec![])
        }
        Msg::LiveTick { session } => match model.live {
            LiveLoop::Running {
                session: current,
                in_flight,
            } if current == session && model.mode == InputMode::Live => {
                if in_flight {
                    return (model, vec![]);
                }
                let Some(frame) = model.webcam_frame.clone() else {
                    return (model, vec![]);
                };
                model.live = LiveLoop::Running {
                    session,
                    in_flight: true,
                };
                (model, vec![Effect::PredictFrame { session, frame }])
            }
            _ => (model, vec![]),
        },
        Msg::LivePredictionDone { session, result } => match model.live {
            LiveLoop::Running {
                session: current, ..
            } if current == session => {
                model.live = LiveLoop::Running {
                    session,
                    in_flight: false,
                };
                if let Ok(prediction) = result {
                    model.label.show(&prediction.label);
                    model.confidence = prediction.confidence;
                }
                (model, vec![])
            }
            // Result of a cancelled loop.
            _ => (model, vec![]),
        },

        Msg::DismissAlert => {
            model.alert = None;
            (model, vec![])
        }
    }
}

fn stop_live_loop(model: &mut Model) -> Option<Effect> {
    match model.live {
        LiveLoop::Running { session, .. } => {
            model.live = LiveLoop::Idle;
            Some(Effect::CancelLiveSchedule { session })
        }
        LiveLoop::Idle => None,
    }
}

fn leave_live(model: &mut Model) -> Vec<Effect> {
    let mut effects: Vec<Effect> = stop_live_loop(model).into_iter().collect();

    if matches!(
        model.camera,
        CameraState::Starting | CameraState::Streaming
    ) {
        effects.push(Effect::StopCamera {
            generation: model.camera_generation,
        });
    }

    model.camera = CameraState::Off;
    model.webcam_frame = None;
    model.capturing = false;

    effects
}

fn start_live(config: &Config, mut model: Model) -> (Model, Vec<Effect>) {
    model.loading = false;

    if matches!(model.live, LiveLoop::Running { .. }) {
        return (model, vec![]);
    }

    if matches!(model.camera, CameraState::Off | CameraState::Denied) {
        model.alert = Some(ALERT_CAMERA_DENIED.to_string());
        return (model, vec![]);
    }

    let session = model.next_session;
    model.next_session += 1;
    model.live = LiveLoop::Running {
        session,
        in_flight: false,
    };

    (
        model,
        vec![Effect::StartLiveSchedule {
            session,
            period: config.live_prediction_interval,
        }],
    )
}

fn start_upload(mut model: Model) -> (Model, Vec<Effect>) {
    if model.loading {
        return (model, vec![]);
    }

    let Some(file) = model.selected.clone() else {
        model.alert = Some(ALERT_NO_FILE.to_string());
        return (model, vec![]);
    };

    model.loading = true;
    let endpoint = Endpoint::for_kind(file.kind());

    (model, vec![Effect::PredictUpload { endpoint, file }])
}
