use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    AccessDenied(String),
    #[error("camera is not started")]
    NotStarted,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub trait DeviceCamera: Send + Sync {
    /// Acquires the camera. Fails with [`CameraError::AccessDenied`] when the
    /// camera cannot be used at all.
    fn start(&self) -> Result<(), CameraError>;
    fn stop(&self) -> Result<(), CameraError>;
    fn capture_frame(&self) -> Result<RgbaImage, CameraError>;
}
