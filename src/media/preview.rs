use crate::media::media_file::{MediaFile, MediaKind};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not decode {name}: {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Default)]
pub enum Preview {
    #[default]
    None,
    Image(Arc<RgbaImage>),
    Video {
        name: String,
        size_bytes: usize,
        path: Option<PathBuf>,
    },
}

/// The selected file together with what to show for it.
#[derive(Debug, Clone)]
pub struct LoadedMedia {
    pub file: Arc<MediaFile>,
    pub preview: Preview,
}

/// Reads a file from disk and builds its preview.
pub fn load_from_path(path: &std::path::Path, max_dimension: u32) -> Result<LoadedMedia, MediaError> {
    let bytes = std::fs::read(path).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mime = crate::media::media_file::mime_from_name(&name);

    load_from_bytes(
        MediaFile::new(name, mime, bytes),
        Some(path.to_path_buf()),
        max_dimension,
    )
}

/// Builds the preview for an in-memory file. Other kinds get no preview.
pub fn load_from_bytes(
    file: MediaFile,
    path: Option<PathBuf>,
    max_dimension: u32,
) -> Result<LoadedMedia, MediaError> {
    let preview = match file.kind() {
        MediaKind::Image => {
            let image = image::load_from_memory(&file.bytes).map_err(|source| {
                MediaError::Decode {
                    name: file.name.clone(),
                    source,
                }
            })?;
            let image = if image.width() > max_dimension || image.height() > max_dimension {
                image.thumbnail(max_dimension, max_dimension)
            } else {
                image
            };
            Preview::Image(Arc::new(image.to_rgba8()))
        }
        MediaKind::Video => Preview::Video {
            name: file.name.clone(),
            size_bytes: file.bytes.len(),
            path,
        },
        MediaKind::Other => Preview::None,
    };

    Ok(LoadedMedia {
        file: Arc::new(file),
        preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 200, 10, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn image_file_gets_an_image_preview() {
        let file = MediaFile::new("hand.png", "image/png", png_bytes(8, 4));

        let loaded = load_from_bytes(file, None, 1024).unwrap();

        match loaded.preview {
            Preview::Image(image) => assert_eq!(image.dimensions(), (8, 4)),
            other => panic!("unexpected preview {:?}", other),
        }
        assert_eq!(loaded.file.name, "hand.png");
    }

    #[test]
    fn large_images_are_scaled_down() {
        let file = MediaFile::new("big.png", "image/png", png_bytes(400, 100));

        let loaded = load_from_bytes(file, None, 100).unwrap();

        match loaded.preview {
            Preview::Image(image) => {
                assert!(image.width() <= 100 && image.height() <= 100);
            }
            other => panic!("unexpected preview {:?}", other),
        }
    }

    #[test]
    fn video_file_gets_a_video_preview() {
        let file = MediaFile::new("signs.mp4", "video/mp4", vec![0; 64]);

        let loaded = load_from_bytes(file, Some(PathBuf::from("/tmp/signs.mp4")), 1024).unwrap();

        match loaded.preview {
            Preview::Video {
                name,
                size_bytes,
                path,
            } => {
                assert_eq!(name, "signs.mp4");
                assert_eq!(size_bytes, 64);
                assert_eq!(path, Some(PathBuf::from("/tmp/signs.mp4")));
            }
            other => panic!("unexpected preview {:?}", other),
        }
    }

    #[test]
    fn other_types_get_no_preview_and_no_error() {
        let file = MediaFile::new("notes.txt", "text/plain", b"hello".to_vec());

        let loaded = load_from_bytes(file, None, 1024).unwrap();

        assert!(matches!(loaded.preview, Preview::None));
        assert_eq!(loaded.file.mime, "text/plain");
    }

    #[test]
    fn undecodable_image_is_an_error() {
        let file = MediaFile::new("broken.png", "image/png", b"not a png".to_vec());

        let err = load_from_bytes(file, None, 1024).unwrap_err();

        assert!(matches!(err, MediaError::Decode { .. }));
    }

    #[test]
    fn loads_from_disk_and_guesses_the_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.PNG");
        std::fs::write(&path, png_bytes(2, 2)).unwrap();

        let loaded = load_from_path(&path, 1024).unwrap();

        assert_eq!(loaded.file.mime, "image/png");
        assert!(matches!(loaded.preview, Preview::Image(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_from_path(std::path::Path::new("/definitely/missing.png"), 1024)
            .unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }
}
