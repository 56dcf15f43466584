// SPDX-License-Identifier: GPL-3.0-only

//! Last media thumbnail and opening it in a viewer

use crate::app::state::{AppModel, CameraMode, Control, Message, Notice};
use crate::app::task::Task;
use crate::storage::{self, MediaKind, MediaUri, Thumbnail};
use std::sync::Arc;
use tracing::{debug, warn};

impl AppModel {
    /// Query the newest item for `mode` off the event loop
    pub(crate) fn setup_preview_image(&self, mode: CameraMode) -> Task {
        let store = Arc::clone(&self.media_store);
        let kind = mode.media_kind();
        Task::perform(
            async move {
                match tokio::task::spawn_blocking(move || store.last_media(kind)).await {
                    Ok(Ok(uri)) => uri,
                    Ok(Err(e)) => {
                        warn!(?kind, error = %e, "Last media query failed");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "Last media query task failed");
                        None
                    }
                }
            },
            move |uri| Message::LastMediaLoaded(kind, uri),
        )
    }

    pub(crate) fn handle_last_media_loaded(
        &mut self,
        kind: MediaKind,
        uri: Option<MediaUri>,
    ) -> Task {
        // Answer for a mode we already left
        if kind != self.mode.media_kind() {
            debug!(?kind, "Dropping stale last media result");
            return Task::none();
        }
        let Some(uri) = uri else {
            return Task::none();
        };

        self.last_media = Some(uri.clone());
        Task::perform(storage::load_thumbnail(uri), Message::ThumbnailLoaded)
    }

    pub(crate) fn handle_thumbnail_loaded(&mut self, thumbnail: Option<Thumbnail>) -> Task {
        if let Some(thumbnail) = thumbnail {
            if self.last_media.as_ref() == Some(&thumbnail.uri) {
                self.controls.thumbnail = Some(thumbnail);
            }
        }
        Task::none()
    }

    /// Open the last item, first in the review app, then the default viewer
    pub(crate) fn handle_show_last_media(&mut self) -> Task {
        if !self.controls.is_clickable(Control::LastMedia) {
            return Task::none();
        }
        let Some(uri) = self.last_media.clone() else {
            return Task::none();
        };

        match self.viewer.review(&uri) {
            Ok(()) => Task::none(),
            Err(review_err) => {
                debug!(error = %review_err, "Review application unavailable");
                match self.viewer.view(&uri) {
                    Ok(()) => Task::none(),
                    Err(e) => {
                        warn!(uri = %uri, error = %e, "No viewer for last media");
                        self.notice(Notice::NoGalleryApp)
                    }
                }
            }
        }
    }
}
