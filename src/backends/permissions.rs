// SPDX-License-Identifier: GPL-3.0-only

//! Runtime permission checks
//!
//! A desktop has no permission dialog, so "granted" means the resource is
//! actually usable: a camera node opens, the media folders are writable, a
//! microphone exists.

use crate::backends::audio;
use futures::future::BoxFuture;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    Storage,
    RecordAudio,
}

/// Grants reported for a permission request
pub type Grants = Vec<(Permission, bool)>;

pub trait PermissionBroker: Send {
    /// Whether `permission` is granted right now
    fn has(&self, permission: Permission) -> bool;

    /// Ask for `permissions`, resolving with one grant per entry
    fn request(&self, permissions: Vec<Permission>) -> BoxFuture<'static, Grants>;
}

/// Checks against the local machine
#[derive(Debug, Clone)]
pub struct SystemPermissions {
    camera_nodes: Vec<PathBuf>,
    media_dirs: Vec<PathBuf>,
}

impl SystemPermissions {
    /// `camera_nodes` empty means a synthetic source that needs no device
    pub fn new(camera_nodes: Vec<PathBuf>, media_dirs: Vec<PathBuf>) -> Self {
        Self {
            camera_nodes,
            media_dirs,
        }
    }

    fn check(camera_nodes: &[PathBuf], media_dirs: &[PathBuf], permission: Permission) -> bool {
        let granted = match permission {
            Permission::Camera => {
                camera_nodes.is_empty()
                    || camera_nodes.iter().any(|node| {
                        std::fs::OpenOptions::new()
                            .read(true)
                            .write(true)
                            .open(node)
                            .is_ok()
                    })
            }
            Permission::Storage => media_dirs.iter().all(|dir| is_writable_dir(dir)),
            Permission::RecordAudio => audio::has_audio_source(),
        };
        debug!(?permission, granted, "Permission check");
        granted
    }
}

/// Create the directory if needed and probe it with a scratch file
fn is_writable_dir(dir: &std::path::Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".simple-camera-probe");
    let writable = std::fs::write(&probe, b"").is_ok();
    let _ = std::fs::remove_file(&probe);
    writable
}

impl PermissionBroker for SystemPermissions {
    fn has(&self, permission: Permission) -> bool {
        Self::check(&self.camera_nodes, &self.media_dirs, permission)
    }

    fn request(&self, permissions: Vec<Permission>) -> BoxFuture<'static, Grants> {
        let camera_nodes = self.camera_nodes.clone();
        let media_dirs = self.media_dirs.clone();
        Box::pin(async move {
            // pw-dump and device probing block
            let grants = tokio::task::spawn_blocking(move || {
                permissions
                    .into_iter()
                    .map(|p| (p, Self::check(&camera_nodes, &media_dirs, p)))
                    .collect::<Grants>()
            })
            .await
            .unwrap_or_default();
            info!(?grants, "Permission request answered");
            grants
        })
    }
}
