// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Preview derivation for staged media and the registry of open video handles.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use eframe::egui;
use uuid::Uuid;

use crate::error::ResourceCleanupError;

/// Edge length bound for decoded image thumbnails.
pub const THUMBNAIL_MAX: u32 = 256;

/// Decode an image and shrink it to a thumbnail-friendly `ColorImage`.
pub fn load_image_thumbnail(path: &Path) -> Result<egui::ColorImage> {
    let dyn_img =
        image::open(path).with_context(|| format!("Failed to decode image {}", path.display()))?;
    let resized = dyn_img.thumbnail(THUMBNAIL_MAX, THUMBNAIL_MAX).to_rgba8();
    let size = [resized.width() as usize, resized.height() as usize];
    let pixels = resized.into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}

/// Container family recognised from a video file's leading bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    QuickTime,
    WebM,
}

impl VideoContainer {
    pub fn label(self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "MP4",
            VideoContainer::QuickTime => "QuickTime",
            VideoContainer::WebM => "WebM",
        }
    }
}

/// Check that a video file is readable and starts like a known container.
pub fn probe_video(path: &Path) -> Result<VideoContainer> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open video {}", path.display()))?;
    let mut header = [0u8; 12];
    let mut filled = 0;
    while filled < header.len() {
        let n = file
            .read(&mut header[filled..])
            .with_context(|| format!("Failed to read video {}", path.display()))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled < 8 {
        bail!("{} is too short to be a video", path.display());
    }

    if header[..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        return Ok(VideoContainer::WebM);
    }
    match &header[4..8] {
        b"ftyp" if filled == header.len() && &header[8..12] == b"qt  " => {
            Ok(VideoContainer::QuickTime)
        }
        b"ftyp" => Ok(VideoContainer::Mp4),
        b"moov" | b"mdat" | b"wide" | b"free" | b"skip" => Ok(VideoContainer::QuickTime),
        _ => bail!("{} is not a recognised video container", path.display()),
    }
}

/// Streamable reference to a staged video, valid until revoked.
#[derive(Debug, PartialEq, Eq)]
pub struct VideoHandle {
    id: Uuid,
}

impl VideoHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Registry of live video preview handles.
///
/// Every handle handed out by `open` must come back through `revoke` when its
/// attachment leaves the staging set; whatever is still live at drop time is
/// released then.
#[derive(Debug, Default)]
pub struct PreviewHandles {
    live: HashMap<Uuid, PathBuf>,
    revoked: usize,
}

impl PreviewHandles {
    pub fn open(&mut self, path: PathBuf) -> VideoHandle {
        let id = Uuid::new_v4();
        self.live.insert(id, path);
        tracing::debug!(handle = %id, live = self.live.len(), "opened video preview handle");
        VideoHandle { id }
    }

    /// Path backing a live handle.
    pub fn resolve(&self, handle: &VideoHandle) -> Option<&Path> {
        self.live.get(&handle.id).map(PathBuf::as_path)
    }

    pub fn revoke(&mut self, handle: VideoHandle) -> Result<(), ResourceCleanupError> {
        match self.live.remove(&handle.id) {
            Some(_) => {
                self.revoked += 1;
                tracing::debug!(handle = %handle.id, live = self.live.len(), "revoked video preview handle");
                Ok(())
            }
            None => Err(ResourceCleanupError::UnknownHandle(handle.id)),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of successful revocations over the registry's lifetime.
    pub fn revoked_count(&self) -> usize {
        self.revoked
    }
}

impl Drop for PreviewHandles {
    fn drop(&mut self) {
        if !self.live.is_empty() {
            tracing::debug!(count = self.live.len(), "releasing video preview handles on teardown");
            self.live.clear();
        }
    }
}
