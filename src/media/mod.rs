pub mod jpeg;
pub mod media_file;
pub mod preview;
