// SPDX-License-Identifier: GPL-3.0-only

//! Handing saved media to other applications

use crate::storage::MediaUri;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// Nothing is installed that handles the file
    NoHandler(String),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::NoHandler(msg) => write!(f, "No application to open media: {}", msg),
        }
    }
}

impl std::error::Error for ViewerError {}

pub trait MediaViewer: Send {
    /// Open `uri` in the dedicated review application
    fn review(&self, uri: &MediaUri) -> Result<(), ViewerError>;

    /// Open `uri` with the default handler for its type
    fn view(&self, uri: &MediaUri) -> Result<(), ViewerError>;
}

/// Opens media through the desktop's file associations
#[derive(Debug, Clone, Default)]
pub struct DesktopViewer {
    review_app: Option<String>,
}

impl DesktopViewer {
    pub fn new(review_app: Option<String>) -> Self {
        Self { review_app }
    }
}

impl MediaViewer for DesktopViewer {
    fn review(&self, uri: &MediaUri) -> Result<(), ViewerError> {
        let app = self
            .review_app
            .as_deref()
            .ok_or_else(|| ViewerError::NoHandler("no review application configured".to_string()))?;
        debug!(app, uri = %uri, "Opening in review application");
        open::with(&uri.path, app).map_err(|e| ViewerError::NoHandler(e.to_string()))
    }

    fn view(&self, uri: &MediaUri) -> Result<(), ViewerError> {
        info!(path = %uri.path.display(), "Opening with default handler");
        open::that(&uri.path).map_err(|e| ViewerError::NoHandler(e.to_string()))
    }
}
