// SPDX-License-Identifier: GPL-3.0-only

//! In-memory collaborators for driving the controller in tests

#![allow(dead_code)]

use futures::future::BoxFuture;
use simple_camera::app::{
    AppModel, CameraFacing, CaptureIntent, Flags, HostRequest, Message, Orientation, Task,
};
use simple_camera::backends::permissions::{Grants, Permission, PermissionBroker};
use simple_camera::backends::preview::Preview;
use simple_camera::backends::viewer::{MediaViewer, ViewerError};
use simple_camera::config::Config;
use simple_camera::errors::{CameraError, MediaStoreError, RecordingError};
use simple_camera::storage::{MediaId, MediaKind, MediaStore, MediaUri};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake preview was asked to do, and how it should answer
#[derive(Debug, Default)]
pub struct PreviewLog {
    pub calls: Vec<String>,
    pub open: Option<CameraFacing>,
    pub recording: bool,
    pub target_path: Option<PathBuf>,
    pub orientation: Option<Orientation>,
    /// Cameras that fail to open
    pub broken: HashSet<CameraFacing>,
    pub recorder_fails: bool,
    pub camera_count: usize,
}

#[derive(Clone)]
pub struct FakePreview(pub Arc<Mutex<PreviewLog>>);

impl FakePreview {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(PreviewLog {
            camera_count: 2,
            ..PreviewLog::default()
        })))
    }

    fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().calls.push(call.into());
    }
}

impl Preview for FakePreview {
    fn set_camera(&mut self, facing: CameraFacing) -> Result<(), CameraError> {
        self.record(format!("set_camera {:?}", facing));
        let mut log = self.0.lock().unwrap();
        if log.broken.contains(&facing) {
            return Err(CameraError::OpenFailed(format!("{:?} is broken", facing)));
        }
        log.open = Some(facing);
        Ok(())
    }

    fn release_camera(&mut self) {
        self.record("release_camera");
        let mut log = self.0.lock().unwrap();
        log.open = None;
        log.recording = false;
    }

    fn set_target_path(&mut self, path: PathBuf) {
        self.0.lock().unwrap().target_path = Some(path);
    }

    fn enable_flash(&mut self) {
        self.record("enable_flash");
    }

    fn disable_flash(&mut self) {
        self.record("disable_flash");
    }

    fn auto_flash(&mut self) {
        self.record("auto_flash");
    }

    fn take_picture(&mut self) {
        self.record("take_picture");
    }

    fn toggle_recording(&mut self) -> Result<bool, RecordingError> {
        self.record("toggle_recording");
        let mut log = self.0.lock().unwrap();
        log.recording = !log.recording;
        Ok(log.recording)
    }

    fn init_recorder(&mut self) -> Result<(), RecordingError> {
        self.record("init_recorder");
        if self.0.lock().unwrap().recorder_fails {
            return Err(RecordingError::EncoderNotAvailable("x264enc".to_string()));
        }
        Ok(())
    }

    fn init_photo_mode(&mut self) {
        self.record("init_photo_mode");
    }

    fn try_switch_to_video(&mut self) {
        self.record("try_switch_to_video");
    }

    fn device_orientation_changed(&mut self, orientation: Orientation) {
        self.0.lock().unwrap().orientation = Some(orientation);
    }

    fn focus_at(&mut self, x: f32, y: f32) {
        self.record(format!("focus_at {:.1} {:.1}", x, y));
    }

    fn cycle_resolution(&mut self) -> Option<(u32, u32)> {
        self.record("cycle_resolution");
        Some((1920, 1080))
    }

    fn camera_count(&self) -> usize {
        self.0.lock().unwrap().camera_count
    }
}

/// Media store keeping everything in a list
#[derive(Default)]
pub struct FakeStore {
    pub items: Mutex<Vec<MediaUri>>,
}

impl FakeStore {
    pub fn with(items: Vec<MediaUri>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl MediaStore for FakeStore {
    fn last_media(&self, kind: MediaKind) -> Result<Option<MediaUri>, MediaStoreError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|uri| uri.kind == kind)
            .cloned())
    }

    fn scan_file(&self, path: &Path) -> Result<MediaUri, MediaStoreError> {
        let kind = MediaKind::from_path(path)
            .ok_or_else(|| MediaStoreError::UnsupportedType(path.display().to_string()))?;
        let mut items = self.items.lock().unwrap();
        let uri = MediaUri {
            kind,
            id: MediaId(items.len() as u64 + 1),
            path: path.to_path_buf(),
        };
        items.push(uri.clone());
        Ok(uri)
    }
}

/// Permission state plus the answer given to requests
#[derive(Debug)]
pub struct PermissionState {
    pub granted: HashSet<Permission>,
    /// Permissions a request grants
    pub grant_on_request: HashSet<Permission>,
    pub requests: Vec<Vec<Permission>>,
}

#[derive(Clone)]
pub struct FakePermissions(pub Arc<Mutex<PermissionState>>);

impl FakePermissions {
    pub fn granting(granted: &[Permission], grant_on_request: &[Permission]) -> Self {
        Self(Arc::new(Mutex::new(PermissionState {
            granted: granted.iter().copied().collect(),
            grant_on_request: grant_on_request.iter().copied().collect(),
            requests: Vec::new(),
        })))
    }

    pub fn all() -> Self {
        let all = [Permission::Camera, Permission::Storage, Permission::RecordAudio];
        Self::granting(&all, &all)
    }
}

impl PermissionBroker for FakePermissions {
    fn has(&self, permission: Permission) -> bool {
        self.0.lock().unwrap().granted.contains(&permission)
    }

    fn request(&self, permissions: Vec<Permission>) -> BoxFuture<'static, Grants> {
        let state = Arc::clone(&self.0);
        Box::pin(async move {
            let mut state = state.lock().unwrap();
            state.requests.push(permissions.clone());
            permissions
                .into_iter()
                .map(|permission| {
                    let granted = state.grant_on_request.contains(&permission);
                    if granted {
                        state.granted.insert(permission);
                    }
                    (permission, granted)
                })
                .collect()
        })
    }
}

#[derive(Debug, Default)]
pub struct ViewerState {
    pub review_works: bool,
    pub view_works: bool,
    pub opened: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeViewer(pub Arc<Mutex<ViewerState>>);

impl MediaViewer for FakeViewer {
    fn review(&self, uri: &MediaUri) -> Result<(), ViewerError> {
        let mut state = self.0.lock().unwrap();
        if !state.review_works {
            return Err(ViewerError::NoHandler("review".to_string()));
        }
        state.opened.push(format!("review {}", uri));
        Ok(())
    }

    fn view(&self, uri: &MediaUri) -> Result<(), ViewerError> {
        let mut state = self.0.lock().unwrap();
        if !state.view_works {
            return Err(ViewerError::NoHandler("view".to_string()));
        }
        state.opened.push(format!("view {}", uri));
        Ok(())
    }
}

/// Controller plus handles on its fakes
pub struct Harness {
    pub model: AppModel,
    pub preview: FakePreview,
    pub store: Arc<FakeStore>,
    pub permissions: FakePermissions,
    pub viewer: FakeViewer,
}

impl Harness {
    pub fn new(intent: CaptureIntent) -> Self {
        Self::with(intent, Config::default(), FakePermissions::all(), FakeStore::default())
    }

    pub fn with(
        intent: CaptureIntent,
        config: Config,
        permissions: FakePermissions,
        store: FakeStore,
    ) -> Self {
        let preview = FakePreview::new();
        let store = Arc::new(store);
        let viewer = FakeViewer::default();
        let media_store: Arc<dyn MediaStore> = store.clone();
        let model = AppModel::new(Flags {
            config,
            config_handler: None,
            preview: Box::new(preview.clone()),
            media_store,
            permissions: Box::new(permissions.clone()),
            viewer: Box::new(viewer.clone()),
            intent,
        });
        Self {
            model,
            preview,
            store,
            permissions,
            viewer,
        }
    }

    /// Create and resume, as when the screen opens
    pub async fn open(intent: CaptureIntent) -> (Self, Outcome) {
        let mut harness = Self::new(intent);
        let mut outcome = harness.send(Message::Create).await;
        outcome.extend(harness.send(Message::Resume).await);
        (harness, outcome)
    }

    /// Run a message through `update()` together with every immediate and
    /// asynchronous follow-up. Delayed messages are collected, not sent.
    pub async fn send(&mut self, message: Message) -> Outcome {
        let mut outcome = Outcome::default();
        let mut pending = VecDeque::from([message]);
        while let Some(message) = pending.pop_front() {
            let task = self.model.update(message);
            for leaf in task.into_leaves() {
                match leaf {
                    Task::Done(message) => pending.push_back(message),
                    Task::Perform(future) => pending.push_back(future.await),
                    Task::Delay { after, message } => outcome.delayed.push((after, message)),
                    Task::Host(request) => outcome.requests.push(request),
                    Task::None | Task::Batch(_) => {}
                }
            }
        }
        outcome
    }

    pub fn calls(&self) -> Vec<String> {
        self.preview.0.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.preview.0.lock().unwrap().calls.clear();
    }
}

/// Host requests and delayed messages produced by one [`Harness::send`]
#[derive(Debug, Default)]
pub struct Outcome {
    pub requests: Vec<HostRequest>,
    pub delayed: Vec<(Duration, Message)>,
}

impl Outcome {
    pub fn extend(&mut self, other: Outcome) {
        self.requests.extend(other.requests);
        self.delayed.extend(other.delayed);
    }

    pub fn notices(&self) -> Vec<String> {
        self.requests
            .iter()
            .filter_map(|request| match request {
                HostRequest::ShowNotice(notice) => Some(notice.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Option<&simple_camera::app::CaptureResult> {
        self.requests.iter().find_map(|request| match request {
            HostRequest::Finish(result) => Some(result),
            _ => None,
        })
    }
}

pub fn photo_uri(id: u64) -> MediaUri {
    MediaUri {
        kind: MediaKind::Photo,
        id: MediaId(id),
        path: PathBuf::from(format!("/tmp/IMG_{}.jpg", id)),
    }
}

pub fn video_uri(id: u64) -> MediaUri {
    MediaUri {
        kind: MediaKind::Video,
        id: MediaId(id),
        path: PathBuf::from(format!("/tmp/VID_{}.mp4", id)),
    }
}
