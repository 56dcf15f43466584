// SPDX-License-Identifier: GPL-3.0-only

//! Controller state types

use crate::app::orientation::Orientation;
use crate::backends::permissions::{Grants, PermissionBroker};
use crate::backends::preview::{Preview, PreviewEvent};
use crate::backends::viewer::MediaViewer;
use crate::config::{Config, ConfigHandler};
use crate::constants::{self, ui};
use crate::flash::FlashState;
use crate::storage::{MediaKind, MediaStore, MediaUri, Thumbnail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Camera modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraMode {
    #[default]
    Photo,
    Video,
}

impl CameraMode {
    /// Media kind shown in the last-media thumbnail for this mode
    pub fn media_kind(self) -> MediaKind {
        match self {
            CameraMode::Photo => MediaKind::Photo,
            CameraMode::Video => MediaKind::Video,
        }
    }
}

/// Which camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

/// Request from another program to capture a single item and return it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureIntent {
    /// Regular interactive use
    #[default]
    None,
    /// Capture one photo, optionally to a caller supplied path
    Image { output: Option<PathBuf> },
    /// Capture one video
    Video,
}

impl CaptureIntent {
    pub fn is_capture(&self) -> bool {
        !matches!(self, CaptureIntent::None)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, CaptureIntent::Video)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, CaptureIntent::Image { .. })
    }
}

/// Result handed back to the caller of a capture intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Capture succeeded; videos carry the stored item
    Ok { uri: Option<MediaUri> },
    Cancelled,
}

/// Outstanding permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRequest {
    CameraStorage,
    RecordAudio,
}

/// Keys the controller cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Hardware camera/shutter key
    Camera,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterIcon {
    Shutter,
    VideoRec,
    VideoStop,
}

/// Icon of the photo/video toggle, showing the mode it switches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeToggleIcon {
    Video,
    Camera,
}

/// Icon of the camera toggle, showing the camera it switches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraToggleIcon {
    Front,
    Rear,
}

impl CameraToggleIcon {
    pub fn for_facing(facing: CameraFacing) -> Self {
        match facing {
            CameraFacing::Back => CameraToggleIcon::Front,
            CameraFacing::Front => CameraToggleIcon::Rear,
        }
    }
}

/// On-screen controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Settings,
    ModeToggle,
    ChangeResolution,
    LastMedia,
    Shutter,
    CameraToggle,
    Flash,
}

/// Focus marker drawn over the preview
#[derive(Debug, Clone, PartialEq)]
pub struct FocusMarker {
    pub x: f32,
    pub y: f32,
}

/// Widget state the front end renders
#[derive(Debug, Clone)]
pub struct Controls {
    pub shutter_icon: ShutterIcon,
    pub mode_toggle_icon: ModeToggleIcon,
    pub camera_toggle_icon: CameraToggleIcon,
    pub flash_icon: FlashState,
    pub camera_toggle_visible: bool,
    pub flash_visible: bool,
    /// Mode toggle and settings are hidden for capture intents
    pub mode_toggle_visible: bool,
    pub settings_visible: bool,
    pub timer_visible: bool,
    pub timer_text: String,
    pub settings_alpha: f32,
    pub mode_toggle_alpha: f32,
    pub resolution_alpha: f32,
    pub thumbnail_alpha: f32,
    /// Shutter, camera toggle and flash fade together around a photo
    pub bottom_alpha: f32,
    /// Rotation of every control in degrees
    pub rotation: i32,
    pub focus: Option<FocusMarker>,
    pub focus_color: String,
    pub thumbnail: Option<Thumbnail>,
    pub resolution: Option<(u32, u32)>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            shutter_icon: ShutterIcon::Shutter,
            mode_toggle_icon: ModeToggleIcon::Video,
            camera_toggle_icon: CameraToggleIcon::Front,
            flash_icon: FlashState::Off,
            camera_toggle_visible: true,
            flash_visible: true,
            mode_toggle_visible: true,
            settings_visible: true,
            timer_visible: false,
            timer_text: constants::format_duration(0),
            settings_alpha: ui::OPAQUE,
            mode_toggle_alpha: ui::OPAQUE,
            resolution_alpha: ui::OPAQUE,
            thumbnail_alpha: ui::OPAQUE,
            bottom_alpha: ui::OPAQUE,
            rotation: 0,
            focus: None,
            focus_color: Config::default().primary_color,
            thumbnail: None,
            resolution: None,
        }
    }
}

impl Controls {
    pub fn alpha(&self, control: Control) -> f32 {
        match control {
            Control::Settings => self.settings_alpha,
            Control::ModeToggle => self.mode_toggle_alpha,
            Control::ChangeResolution => self.resolution_alpha,
            Control::LastMedia => self.thumbnail_alpha,
            Control::Shutter | Control::CameraToggle | Control::Flash => self.bottom_alpha,
        }
    }

    pub fn is_visible(&self, control: Control) -> bool {
        match control {
            Control::Settings => self.settings_visible,
            Control::ModeToggle => self.mode_toggle_visible,
            Control::CameraToggle => self.camera_toggle_visible,
            Control::Flash => self.flash_visible,
            Control::ChangeResolution | Control::LastMedia | Control::Shutter => true,
        }
    }

    /// Faded-out secondary controls do not take clicks
    pub fn is_clickable(&self, control: Control) -> bool {
        let secondary = matches!(
            control,
            Control::Settings | Control::ModeToggle | Control::ChangeResolution | Control::LastMedia
        );
        self.is_visible(control) && !(secondary && self.alpha(control) == ui::HIDDEN)
    }

    pub fn set_secondary_alpha(&mut self, settings: f32, others: f32) {
        self.settings_alpha = settings;
        self.mode_toggle_alpha = others;
        self.resolution_alpha = others;
        self.thumbnail_alpha = others;
    }
}

/// Short-lived messages shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoPermissions,
    NoAudioPermissions,
    CameraSwitchError,
    CameraUnavailable,
    VideoModeError,
    NoGalleryApp,
    CaptureFailed(String),
    ResolutionChanged(u32, u32),
    /// Notes of releases the user has not seen yet
    WhatsNew(Vec<String>),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoPermissions => write!(f, "Camera and storage access are required"),
            Notice::NoAudioPermissions => write!(f, "Recording audio is required for videos"),
            Notice::CameraSwitchError => write!(f, "Switching camera failed"),
            Notice::CameraUnavailable => write!(f, "Camera unavailable"),
            Notice::VideoModeError => write!(f, "Switching to video failed"),
            Notice::NoGalleryApp => write!(f, "No gallery application available"),
            Notice::CaptureFailed(reason) => write!(f, "Capture failed: {}", reason),
            Notice::ResolutionChanged(width, height) => write!(f, "Resolution {}x{}", width, height),
            Notice::WhatsNew(notes) => write!(f, "What's new: {}", notes.join("; ")),
        }
    }
}

/// Requests the controller makes to whoever hosts it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    ShowNotice(Notice),
    /// Close the camera screen, returning this to the caller
    Finish(CaptureResult),
    OpenSettings,
    KeepScreenOn(bool),
}

/// Generations of the delayed callbacks
///
/// Bumping a generation cancels the callback already in flight: it arrives
/// carrying the old value and is ignored.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    pub recording: u64,
    pub fade: u64,
    pub bottom: u64,
    pub focus: u64,
}

/// Messages driving the controller
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Lifecycle =====
    Create,
    Resume,
    Pause,
    Destroy,
    KeyDown(Key),
    KeyUp(Key),
    PermissionsResult {
        request: PermissionRequest,
        grants: Grants,
    },

    // ===== Input =====
    ToggleCamera,
    ToggleFlash,
    Shutter,
    TogglePhotoVideo,
    ShowLastMedia,
    OpenSettings,
    ChangeResolution,
    /// Tap on the preview at relative coordinates (0.0-1.0)
    PreviewTapped { x: f32, y: f32 },

    // ===== Sensors and callbacks =====
    /// Accelerometer x axis in m/s²
    AccelerometerSample(f32),
    Preview(PreviewEvent),

    // ===== Timers and background work =====
    RecordingTick(u64),
    RestoreBottomControls(u64),
    FadeOutControls(u64),
    ClearFocusRect(u64),
    LastMediaLoaded(MediaKind, Option<MediaUri>),
    ThumbnailLoaded(Option<Thumbnail>),
    MediaScanned(Result<MediaUri, String>),
}

/// Collaborators and launch parameters for [`AppModel::new`]
pub struct Flags {
    pub config: Config,
    pub config_handler: Option<ConfigHandler>,
    pub preview: Box<dyn Preview>,
    pub media_store: Arc<dyn MediaStore>,
    pub permissions: Box<dyn PermissionBroker>,
    pub viewer: Box<dyn MediaViewer>,
    pub intent: CaptureIntent,
}

/// The camera screen controller
pub struct AppModel {
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<ConfigHandler>,
    pub preview: Box<dyn Preview>,
    pub media_store: Arc<dyn MediaStore>,
    pub permissions: Box<dyn PermissionBroker>,
    pub viewer: Box<dyn MediaViewer>,
    /// Why this screen was opened
    pub intent: CaptureIntent,
    pub mode: CameraMode,
    /// Active camera
    pub facing: CameraFacing,
    pub flash_state: FlashState,
    /// Set from the preview's availability callback
    pub is_camera_available: bool,
    /// Camera state has been set up after permissions were granted
    pub is_initialized: bool,
    /// A permission request is in flight
    pub is_asking_permissions: bool,
    /// Between resume and pause
    pub is_resumed: bool,
    /// Accelerometer samples are acted upon
    pub sensor_registered: bool,
    /// Camera key is held and already triggered the shutter
    pub hardware_shutter_handled: bool,
    pub last_handled_orientation: Orientation,
    pub is_recording: bool,
    /// Whole seconds recorded so far
    pub recording_secs: u32,
    /// Newest photo or video for the thumbnail
    pub last_media: Option<MediaUri>,
    pub controls: Controls,
    pub timers: Timers,
    /// Result already sent to the host
    pub finished: Option<CaptureResult>,
}

impl AppModel {
    pub fn new(flags: Flags) -> Self {
        let Flags {
            config,
            config_handler,
            preview,
            media_store,
            permissions,
            viewer,
            intent,
        } = flags;

        let controls = Controls {
            focus_color: config.primary_color.clone(),
            ..Controls::default()
        };

        Self {
            facing: config.last_used_camera,
            flash_state: config.flashlight_state,
            config,
            config_handler,
            preview,
            media_store,
            permissions,
            viewer,
            intent,
            mode: CameraMode::Photo,
            is_camera_available: false,
            is_initialized: false,
            is_asking_permissions: false,
            is_resumed: false,
            sensor_registered: false,
            hardware_shutter_handled: false,
            last_handled_orientation: Orientation::Portrait,
            is_recording: false,
            recording_secs: 0,
            last_media: None,
            controls,
            timers: Timers::default(),
            finished: None,
        }
    }
}
