// SPDX-License-Identifier: GPL-3.0-only

//! Hardware and desktop integration behind the controller
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            AppModel (controller)            │
//! └──────┬──────────┬─────────────┬─────────────┘
//!        │          │             │
//! ┌──────┴─────┐ ┌──┴─────────┐ ┌─┴───────────┐
//! │  Preview   │ │ Permission │ │ MediaViewer │
//! │ GStreamer  │ │   Broker   │ │ xdg-open    │
//! └──────┬─────┘ └──┬─────────┘ └─────────────┘
//!   camera (V4L2)   audio (PipeWire)
//! ```
//!
//! # Modules
//!
//! - [`audio`]: microphone discovery
//! - [`camera`]: V4L2 device enumeration
//! - [`permissions`]: runtime permission checks
//! - [`preview`]: camera preview, stills and recording
//! - [`sensor`]: accelerometer polling
//! - [`viewer`]: opening saved media in other applications

pub mod audio;
pub mod camera;
pub mod permissions;
pub mod preview;
pub mod sensor;
pub mod viewer;
