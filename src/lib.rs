// SPDX-License-Identifier: GPL-3.0-only

//! Simple Camera - a single screen camera controller
//!
//! The controller switches between photo and video mode, cycles the flash,
//! toggles front/back cameras, rotates its controls with the device and
//! fulfils one-shot capture requests from other programs.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: controller state machine and its runtime
//! - [`backends`]: camera preview, permissions, sensors and viewers
//! - [`config`]: user configuration handling
//! - [`storage`]: media directories, media index and thumbnails
//! - [`flash`]: flash states and sysfs flash LEDs
//! - [`terminal`]: terminal front end

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, CameraFacing, CameraMode, CaptureIntent, CaptureResult, Message};
pub use config::Config;
pub use flash::FlashState;
