// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Photo capture errors
    Photo(PhotoError),
    /// Media store errors
    MediaStore(MediaStoreError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera device for the requested facing
    NoCameraFound,
    /// Camera could not be opened
    OpenFailed(String),
    /// No camera is open
    NotOpen,
    /// Pipeline or backend error
    BackendError(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Failed to start recording
    StartFailed(String),
    /// Failed to stop recording
    StopFailed(String),
    /// Encoder or muxer not installed
    EncoderNotAvailable(String),
    /// Recorder was not initialized for video mode
    NotInitialized,
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// No frame available for capture
    NoFrameAvailable,
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

/// Media store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStoreError {
    /// File does not exist or is not a regular file
    NotFound(String),
    /// File extension is neither a photo nor a video
    UnsupportedType(String),
    /// Reading or writing the index failed
    Index(String),
    /// A save directory cannot be created
    Directory(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::MediaStore(e) => write!(f, "Media store error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera found"),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::NotOpen => write!(f, "Camera is not open"),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordingError::StopFailed(msg) => write!(f, "Failed to stop recording: {}", msg),
            RecordingError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordingError::NotInitialized => write!(f, "Recorder not initialized"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for MediaStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaStoreError::NotFound(path) => write!(f, "File not found: {}", path),
            MediaStoreError::UnsupportedType(path) => write!(f, "Not a photo or video: {}", path),
            MediaStoreError::Index(msg) => write!(f, "Index error: {}", msg),
            MediaStoreError::Directory(msg) => write!(f, "Cannot create media directory: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for MediaStoreError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<MediaStoreError> for AppError {
    fn from(err: MediaStoreError) -> Self {
        AppError::MediaStore(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}

impl From<std::io::Error> for MediaStoreError {
    fn from(err: std::io::Error) -> Self {
        MediaStoreError::Index(err.to_string())
    }
}

impl From<serde_json::Error> for MediaStoreError {
    fn from(err: serde_json::Error) -> Self {
        MediaStoreError::Index(err.to_string())
    }
}
