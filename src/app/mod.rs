// SPDX-License-Identifier: GPL-3.0-only

//! Camera screen controller
//!
//! # Architecture
//!
//! - `state`: controller state types (AppModel, Message, Controls, ...)
//! - `update`: message dispatcher
//! - `handlers`: message handlers grouped by concern
//! - `task`: follow-up work returned by handlers
//! - `runtime`: executes tasks on tokio and talks to the [`Host`]
//! - `orientation`: accelerometer buckets
//!
//! The controller never blocks and never touches hardware directly. It calls
//! into the [`Preview`](crate::backends::preview::Preview),
//! [`MediaStore`](crate::storage::MediaStore),
//! [`PermissionBroker`](crate::backends::permissions::PermissionBroker) and
//! [`MediaViewer`](crate::backends::viewer::MediaViewer) collaborators.

mod handlers;
pub mod orientation;
mod runtime;
mod state;
mod task;
mod update;

pub use orientation::Orientation;
pub use runtime::{Host, Runtime};
pub use state::{
    AppModel, CameraFacing, CameraMode, CameraToggleIcon, CaptureIntent, CaptureResult, Control,
    Controls, Flags, FocusMarker, HostRequest, Key, Message, ModeToggleIcon, Notice,
    PermissionRequest, ShutterIcon, Timers,
};
pub use task::Task;

/// Application id used for the config location
pub const APP_ID: &str = "simple-camera";
