use crate::device_camera::interface::{CameraError, DeviceCamera};
use crate::library::logger::interface::Logger;
use image::{Rgba, RgbaImage};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

const FRAME_WIDTH: u32 = 320;
const FRAME_HEIGHT: u32 = 240;

/// Produces a moving test pattern with a little sensor noise.
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    deny_access: bool,
    started: AtomicBool,
    frame_index: AtomicU32,
}

impl DeviceCameraFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, deny_access: bool) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            deny_access,
            started: AtomicBool::new(false),
            frame_index: AtomicU32::new(0),
        }
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn start(&self) -> Result<(), CameraError> {
        self.logger.info("Starting camera...");
        if self.deny_access {
            self.logger.warn("Camera access denied");
            return Err(CameraError::AccessDenied(
                "fake camera configured to deny access".to_string(),
            ));
        }
        self.started.store(true, Ordering::SeqCst);
        self.logger.info("Camera started");
        Ok(())
    }

    fn stop(&self) -> Result<(), CameraError> {
        self.started.store(false, Ordering::SeqCst);
        self.logger.info("Camera stopped");
        Ok(())
    }

    fn capture_frame(&self) -> Result<RgbaImage, CameraError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(CameraError::NotStarted);
        }

        let index = self.frame_index.fetch_add(1, Ordering::SeqCst);
        let bar_x = (index * 4) % FRAME_WIDTH;
        let mut rng = rand::rng();

        let frame = RgbaImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
            let noise: u8 = rng.random_range(0..16);
            if x.abs_diff(bar_x) < 12 {
                Rgba([230, 230, 230 - noise, 255])
            } else {
                let r = (x * 255 / FRAME_WIDTH) as u8;
                let g = (y * 255 / FRAME_HEIGHT) as u8;
                Rgba([r.saturating_add(noise), g, 96, 255])
            }
        });

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_fake::LoggerFake;

    #[test]
    fn capture_requires_start() {
        let camera = DeviceCameraFake::new(Arc::new(LoggerFake::new()), false);

        assert!(matches!(
            camera.capture_frame(),
            Err(CameraError::NotStarted)
        ));

        camera.start().unwrap();
        let frame = camera.capture_frame().unwrap();
        assert_eq!(frame.dimensions(), (FRAME_WIDTH, FRAME_HEIGHT));

        camera.stop().unwrap();
        assert!(camera.capture_frame().is_err());
    }

    #[test]
    fn denied_camera_fails_to_start() {
        let logger = LoggerFake::new();
        let camera = DeviceCameraFake::new(Arc::new(logger.clone()), true);

        assert!(matches!(camera.start(), Err(CameraError::AccessDenied(_))));
        assert!(logger.contains("WARN", "Camera access denied"));
    }
}
