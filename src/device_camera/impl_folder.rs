use crate::device_camera::interface::{CameraError, DeviceCamera};
use crate::library::logger::interface::Logger;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const FRAME_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Replays the still images of a directory in file-name order, looping forever.
pub struct DeviceCameraFolder {
    logger: Arc<dyn Logger + Send + Sync>,
    dir: PathBuf,
    frames: Mutex<Vec<PathBuf>>,
    next_frame: AtomicUsize,
}

impl DeviceCameraFolder {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, dir: PathBuf) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("folder"),
            dir,
            frames: Mutex::new(Vec::new()),
            next_frame: AtomicUsize::new(0),
        }
    }

    fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
        let mut frames = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort();
        Ok(frames)
    }
}

impl DeviceCamera for DeviceCameraFolder {
    fn start(&self) -> Result<(), CameraError> {
        self.logger
            .info(&format!("Opening frame folder {}", self.dir.display()));

        let frames = Self::list_frames(&self.dir)
            .map_err(|err| CameraError::AccessDenied(format!("{}: {}", self.dir.display(), err)))?;

        if frames.is_empty() {
            return Err(CameraError::AccessDenied(format!(
                "no frames in {}",
                self.dir.display()
            )));
        }

        self.logger.info(&format!("Found {} frames", frames.len()));
        *self.frames.lock().unwrap_or_else(PoisonError::into_inner) = frames;
        self.next_frame.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), CameraError> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.logger.info("Frame folder closed");
        Ok(())
    }

    fn capture_frame(&self) -> Result<RgbaImage, CameraError> {
        let path = {
            let frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
            if frames.is_empty() {
                return Err(CameraError::NotStarted);
            }
            let index = self.next_frame.fetch_add(1, Ordering::SeqCst) % frames.len();
            frames[index].clone()
        };

        let frame = image::open(&path)?;
        Ok(frame.to_rgba8())
    }
}
