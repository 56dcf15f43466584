// SPDX-License-Identifier: GPL-3.0-only

//! Media storage: save directories, the media index and thumbnails
//!
//! The controller talks to a [`MediaStore`], which answers "what is the
//! newest photo/video" and registers freshly written files. [`FsMediaStore`]
//! keeps a small JSON index next to the user's data so ids stay stable
//! between runs, and folds in files that other programs dropped into the
//! save directories.

use crate::constants::file_formats;
use crate::constants::ui::THUMBNAIL_SIZE;
use crate::errors::MediaStoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Kind of media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify a file by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if file_formats::is_image_extension(ext) {
            Some(MediaKind::Photo)
        } else if file_formats::is_video_extension(ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    fn collection(self) -> &'static str {
        match self {
            MediaKind::Photo => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// Stable id of an item in the media store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub u64);

/// Locator for a stored photo or video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUri {
    pub kind: MediaKind,
    pub id: MediaId,
    pub path: PathBuf,
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media://{}/{}", self.kind.collection(), self.id.0)
    }
}

/// Content store the controller queries for the newest media
pub trait MediaStore: Send + Sync {
    /// Newest item of `kind` by capture time, if any
    fn last_media(&self, kind: MediaKind) -> Result<Option<MediaUri>, MediaStoreError>;

    /// Register a newly written file and return its locator
    fn scan_file(&self, path: &Path) -> Result<MediaUri, MediaStoreError>;

    /// Make sure new media can be written
    fn prepare(&self) -> Result<(), MediaStoreError> {
        Ok(())
    }
}

/// Photo save directory (~/Pictures/<folder>)
pub fn photo_directory(folder: &str) -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(folder)
}

/// Video save directory (~/Videos/<folder>)
pub fn video_directory(folder: &str) -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(folder)
}

/// Timestamped output file name, e.g. `IMG_20240101_120000.jpg`
pub fn timestamped_file_name(kind: MediaKind) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    match kind {
        MediaKind::Photo => format!("IMG_{}.jpg", timestamp),
        MediaKind::Video => format!("VID_{}.mp4", timestamp),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MediaEntry {
    id: MediaId,
    kind: MediaKind,
    path: PathBuf,
    /// Capture time in milliseconds since the Unix epoch
    date_taken: i64,
}

impl MediaEntry {
    fn uri(&self) -> MediaUri {
        MediaUri {
            kind: self.kind,
            id: self.id,
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MediaIndex {
    next_id: u64,
    entries: Vec<MediaEntry>,
}

impl MediaIndex {
    fn insert(&mut self, kind: MediaKind, path: PathBuf, date_taken: i64) -> MediaUri {
        self.next_id += 1;
        let entry = MediaEntry {
            id: MediaId(self.next_id),
            kind,
            path,
            date_taken,
        };
        let uri = entry.uri();
        self.entries.push(entry);
        uri
    }

    fn find(&self, path: &Path) -> Option<&MediaEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }
}

/// Media store backed by the save directories and a JSON index
pub struct FsMediaStore {
    photos_dir: PathBuf,
    videos_dir: PathBuf,
    index_path: PathBuf,
    index: Mutex<MediaIndex>,
}

impl FsMediaStore {
    pub fn new(photos_dir: PathBuf, videos_dir: PathBuf, index_path: PathBuf) -> Self {
        let index = match std::fs::read_to_string(&index_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %index_path.display(), error = %e, "Media index corrupt, rebuilding");
                MediaIndex::default()
            }),
            Err(_) => MediaIndex::default(),
        };

        Self {
            photos_dir,
            videos_dir,
            index_path,
            index: Mutex::new(index),
        }
    }

    /// Store over the user's Pictures/Videos folders
    pub fn open_default(folder: &str) -> Self {
        let index_path = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("simple-camera")
            .join("media_index.json");
        Self::new(photo_directory(folder), video_directory(folder), index_path)
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Directory new files of `kind` are written to
    pub fn directory_for(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Photo => &self.photos_dir,
            MediaKind::Video => &self.videos_dir,
        }
    }

    /// Create the save directories if missing
    pub fn prepare_directories(&self) -> Result<(), MediaStoreError> {
        for dir in [&self.photos_dir, &self.videos_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|e| MediaStoreError::Directory(format!("{}: {}", dir.display(), e)))?;
            info!(path = %dir.display(), "Media directory ready");
        }
        Ok(())
    }

    fn lock_index(&self) -> Result<std::sync::MutexGuard<'_, MediaIndex>, MediaStoreError> {
        self.index
            .lock()
            .map_err(|_| MediaStoreError::Index("media index lock poisoned".to_string()))
    }

    /// Drop entries whose files vanished and pick up unindexed files in the save directory
    fn sync_directory(&self, index: &mut MediaIndex, kind: MediaKind) -> bool {
        let before = index.entries.len();
        index.entries.retain(|entry| entry.path.is_file());
        let mut changed = index.entries.len() != before;

        let Ok(entries) = std::fs::read_dir(self.directory_for(kind)) else {
            return changed;
        };

        let mut found: Vec<(PathBuf, i64)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && MediaKind::from_path(path) == Some(kind))
            .filter(|path| index.find(path).is_none())
            .filter_map(|path| date_taken(&path).map(|taken| (path, taken)))
            .collect();

        // Oldest first so ids follow capture order
        found.sort_by_key(|(_, taken)| *taken);
        for (path, taken) in found {
            debug!(path = %path.display(), "Indexing media file");
            index.insert(kind, path, taken);
            changed = true;
        }
        changed
    }

    fn persist(&self, index: &MediaIndex) -> Result<(), MediaStoreError> {
        if let Some(parent) = self.index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(index)?;
        std::fs::write(&self.index_path, json)?;
        Ok(())
    }
}

impl MediaStore for FsMediaStore {
    fn last_media(&self, kind: MediaKind) -> Result<Option<MediaUri>, MediaStoreError> {
        let mut index = self.lock_index()?;
        if self.sync_directory(&mut index, kind) {
            self.persist(&index)?;
        }

        Ok(index
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .max_by_key(|entry| (entry.date_taken, entry.id))
            .map(MediaEntry::uri))
    }

    fn prepare(&self) -> Result<(), MediaStoreError> {
        self.prepare_directories()
    }

    fn scan_file(&self, path: &Path) -> Result<MediaUri, MediaStoreError> {
        if !path.is_file() {
            return Err(MediaStoreError::NotFound(path.display().to_string()));
        }
        let kind = MediaKind::from_path(path)
            .ok_or_else(|| MediaStoreError::UnsupportedType(path.display().to_string()))?;

        let mut index = self.lock_index()?;
        if let Some(existing) = index.find(path) {
            return Ok(existing.uri());
        }

        let taken = date_taken(path).unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let uri = index.insert(kind, path.to_path_buf(), taken);
        self.persist(&index)?;
        info!(uri = %uri, path = %path.display(), "Media file scanned");
        Ok(uri)
    }
}

/// File modification time in epoch milliseconds
fn date_taken(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(chrono::DateTime::<chrono::Utc>::from(modified).timestamp_millis())
}

/// Decoded thumbnail for the last-media button
#[derive(Clone)]
pub struct Thumbnail {
    pub uri: MediaUri,
    /// RGBA pixels, width, height. `None` for videos.
    pub rgba: Option<(Arc<Vec<u8>>, u32, u32)>,
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("uri", &self.uri)
            .field("size", &self.rgba.as_ref().map(|(_, w, h)| (*w, *h)))
            .finish()
    }
}

/// Load a thumbnail for a stored item
///
/// Photos are decoded and downscaled on a blocking thread. Videos get a
/// thumbnail without pixels so the button still shows a placeholder.
pub async fn load_thumbnail(uri: MediaUri) -> Option<Thumbnail> {
    if uri.kind == MediaKind::Video {
        return Some(Thumbnail { uri, rgba: None });
    }

    let bytes = tokio::fs::read(&uri.path).await.ok()?;

    let rgba = tokio::task::spawn_blocking(move || {
        let img = image::load_from_memory(&bytes).ok()?;
        let thumb = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_rgba8();
        let (width, height) = thumb.dimensions();
        Some((Arc::new(thumb.into_raw()), width, height))
    })
    .await
    .ok()??;

    debug!(uri = %uri, width = rgba.1, height = rgba.2, "Thumbnail decoded");
    Some(Thumbnail {
        uri,
        rgba: Some(rgba),
    })
}
