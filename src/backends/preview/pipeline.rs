// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer implementation of [`Preview`]
//!
//! The open camera always runs exactly one pipeline:
//!
//! ```text
//! preview:   source ! videoconvert ! tee ─┬─ videoscale ! RGBA ! appsink (stills)
//!                                         └─ videoscale ! RGBA ! appsink (view)
//! recording: source ! videoconvert ! tee ─┬─ videoscale ! RGBA ! appsink (stills)
//!                                         ├─ videoscale ! RGBA ! appsink (view)
//!                                         └─ x264enc ! mp4mux ! filesink
//!                        (autoaudiosrc ! aac ─┘ when audio is recorded)
//! ```
//!
//! The view branch is a small live image for the front end, published
//! through a [`FrameSlot`].
//!
//! A V4L2 device can only be opened once, so starting a recording replaces
//! the preview pipeline and stopping it brings the preview back once the
//! file has been finalized. Finalization waits for EOS and runs on its own
//! thread; the pipelines live behind a mutex shared with that thread.

use super::{FrameSlot, Preview, PreviewEvent, PreviewEventSender};
use crate::app::{CameraFacing, Orientation};
use crate::backends::camera::{self, CameraDevice};
use crate::constants::{self, timing};
use crate::errors::{CameraError, PhotoError, RecordingError};
use crate::flash::{FlashHardware, FlashState};
use crate::storage::{self, MediaKind, MediaStore};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSource {
    /// Real cameras through `v4l2src`
    #[default]
    V4l2,
    /// Two synthetic cameras through `videotestsrc`
    TestPattern,
}

/// AAC encoders tried in order for the audio track
const AUDIO_ENCODERS: &[&str] = &["avenc_aac", "voaacenc", "fdkaacenc"];

/// Size of the frames published for the front end
const VIEW_SIZE: (u32, u32) = (160, 90);

/// Elements the video recorder cannot work without
const REQUIRED_VIDEO_ELEMENTS: &[&str] = &["x264enc", "h264parse", "mp4mux", "filesink"];

struct PreviewPipeline {
    pipeline: gst::Pipeline,
    sink: gst_app::AppSink,
}

impl PreviewPipeline {
    /// Parse and start a pipeline that contains an appsink named `sink`
    fn start(description: &str, view: &FrameSlot) -> Result<Self, CameraError> {
        debug!(pipeline = %description, "Starting pipeline");
        let pipeline = gst::parse::launch(description)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CameraError::BackendError("not a pipeline".to_string()))?;

        let sink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<gst_app::AppSink>().ok())
            .ok_or_else(|| CameraError::BackendError("appsink missing".to_string()))?;

        attach_view(&pipeline, view);
        let this = Self { pipeline, sink };
        this.play()?;
        Ok(this)
    }

    fn play(&self) -> Result<(), CameraError> {
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        let (result, _current, _pending) = self
            .pipeline
            .state(gst::ClockTime::from_seconds(timing::START_TIMEOUT_SECS));
        result.map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        Ok(())
    }
}

impl Drop for PreviewPipeline {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

struct Recording {
    stream: PreviewPipeline,
    path: PathBuf,
}

impl Recording {
    /// Send EOS, wait for the muxer to finish the file and tear down
    fn finish(self) -> Result<PathBuf, RecordingError> {
        let pipeline = &self.stream.pipeline;
        if !pipeline.send_event(gst::event::Eos::new()) {
            warn!("Pipeline did not accept EOS");
        }

        let bus = pipeline
            .bus()
            .ok_or_else(|| RecordingError::StopFailed("pipeline has no bus".to_string()))?;
        let message = bus.timed_pop_filtered(
            gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        );

        let result = match message.as_ref().map(|m| m.view()) {
            Some(gst::MessageView::Eos(_)) => Ok(self.path.clone()),
            Some(gst::MessageView::Error(err)) => {
                Err(RecordingError::StopFailed(err.error().to_string()))
            }
            _ => Err(RecordingError::StopFailed(
                "timed out waiting for end of stream".to_string(),
            )),
        };
        // Dropping the stream sets the pipeline to Null
        drop(self.stream);
        result
    }
}

#[derive(Default)]
struct Pipelines {
    preview: Option<PreviewPipeline>,
    recording: Option<Recording>,
    /// Preview pipeline to bring back after a recording finishes
    reopen: Option<String>,
}

/// [`Preview`] backed by GStreamer pipelines and sysfs flash LEDs
pub struct GStreamerPreview {
    source: VideoSource,
    cameras: Vec<CameraDevice>,
    events: PreviewEventSender,
    media_store: Arc<dyn MediaStore>,
    photos_dir: PathBuf,
    videos_dir: PathBuf,
    flash: FlashHardware,
    flash_state: FlashState,
    facing: Option<CameraFacing>,
    shared: Arc<Mutex<Pipelines>>,
    view: FrameSlot,
    video_mode: bool,
    target_path: Option<PathBuf>,
    orientation: Orientation,
    resolution_index: usize,
}

impl GStreamerPreview {
    pub fn new(
        source: VideoSource,
        events: PreviewEventSender,
        media_store: Arc<dyn MediaStore>,
        photos_dir: PathBuf,
        videos_dir: PathBuf,
    ) -> Result<Self, CameraError> {
        gst::init().map_err(|e| CameraError::BackendError(e.to_string()))?;

        let cameras = match source {
            VideoSource::V4l2 => camera::enumerate_cameras(),
            VideoSource::TestPattern => Vec::new(),
        };
        let flash = FlashHardware::detect();
        if let Some(hint) = &flash.permission_error {
            warn!(hint = %hint, "Flash hardware not usable");
        }

        info!(?source, cameras = cameras.len(), flash_leds = flash.devices.len(), "Preview backend ready");

        Ok(Self {
            source,
            cameras,
            events,
            media_store,
            photos_dir,
            videos_dir,
            flash,
            flash_state: FlashState::Off,
            facing: None,
            shared: Arc::new(Mutex::new(Pipelines::default())),
            view: FrameSlot::default(),
            video_mode: false,
            target_path: None,
            orientation: Orientation::Portrait,
            resolution_index: 0,
        })
    }

    /// Enumerated V4L2 devices, empty for the test pattern
    pub fn cameras(&self) -> &[CameraDevice] {
        &self.cameras
    }

    /// Live low resolution frames of the open camera
    pub fn frames(&self) -> FrameSlot {
        Arc::clone(&self.view)
    }

    fn emit(&self, event: PreviewEvent) {
        if self.events.send(event).is_err() {
            debug!("Preview event receiver dropped");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Pipelines>, CameraError> {
        self.shared
            .lock()
            .map_err(|_| CameraError::BackendError("pipeline lock poisoned".to_string()))
    }

    fn resolution(&self) -> (u32, u32) {
        constants::RESOLUTION_PRESETS
            .get(self.resolution_index)
            .copied()
            .unwrap_or((1280, 720))
    }

    fn source_description(&self, facing: CameraFacing) -> Result<String, CameraError> {
        match self.source {
            VideoSource::V4l2 => camera::device_for(&self.cameras, facing)
                .map(|device| format!("v4l2src device={}", device.path.display()))
                .ok_or(CameraError::NoCameraFound),
            VideoSource::TestPattern => {
                let pattern = match facing {
                    CameraFacing::Back => "smpte",
                    CameraFacing::Front => "ball",
                };
                Ok(format!("videotestsrc is-live=true pattern={}", pattern))
            }
        }
    }

    fn appsink_branch(&self) -> String {
        let (width, height) = self.resolution();
        format!(
            "videoscale ! video/x-raw,format=RGBA,width={},height={} ! \
             appsink name=sink max-buffers=2 drop=true sync=false",
            width, height
        )
    }

    fn view_branch(&self) -> String {
        format!(
            "queue leaky=downstream ! videoscale ! \
             video/x-raw,format=RGBA,width={},height={} ! \
             appsink name=view max-buffers=1 drop=true sync=false",
            VIEW_SIZE.0, VIEW_SIZE.1
        )
    }

    fn preview_description(&self, facing: CameraFacing) -> Result<String, CameraError> {
        Ok(format!(
            "{} ! videoconvert ! tee name=t t. ! queue ! {} t. ! {}",
            self.source_description(facing)?,
            self.appsink_branch(),
            self.view_branch()
        ))
    }

    fn recording_description(&self, facing: CameraFacing) -> Result<String, CameraError> {
        let (width, height) = self.resolution();
        let mut description = format!(
            "{} ! videoconvert ! tee name=t \
             t. ! queue ! {} \
             t. ! {} \
             t. ! queue ! videoconvert ! videoscale ! video/x-raw,width={},height={} ! \
             x264enc tune=zerolatency speed-preset=veryfast ! h264parse ! queue ! \
             mp4mux name=mux ! filesink name=file",
            self.source_description(facing)?,
            self.appsink_branch(),
            self.view_branch(),
            width,
            height
        );
        if let Some(encoder) = audio_encoder() {
            description.push_str(&format!(
                " autoaudiosrc ! audioconvert ! audioresample ! {} ! queue ! mux.",
                encoder
            ));
        } else {
            warn!("No AAC encoder installed, recording without audio");
        }
        Ok(description)
    }

    fn apply_torch(&self) {
        if self.video_mode && self.facing.is_some() && self.flash_state == FlashState::On {
            self.flash.all_on();
        } else {
            self.flash.all_off();
        }
    }

    fn start_recording(&mut self, facing: CameraFacing) -> Result<(), RecordingError> {
        let description = self
            .recording_description(facing)
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
        let path = self
            .videos_dir
            .join(storage::timestamped_file_name(MediaKind::Video));
        std::fs::create_dir_all(&self.videos_dir)
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        let mut pipelines = self
            .lock()
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
        let reopen = self.preview_description(facing).ok();

        // Free the device before the recording pipeline opens it
        pipelines.preview = None;

        let started = gst::parse::launch(&description)
            .map_err(|e| RecordingError::StartFailed(e.to_string()))
            .and_then(|element| {
                element
                    .downcast::<gst::Pipeline>()
                    .map_err(|_| RecordingError::StartFailed("not a pipeline".to_string()))
            })
            .and_then(|pipeline| {
                let file = pipeline.by_name("file").ok_or_else(|| {
                    RecordingError::StartFailed("filesink missing".to_string())
                })?;
                file.set_property("location", path.to_string_lossy().as_ref());
                let sink = pipeline
                    .by_name("sink")
                    .and_then(|element| element.downcast::<gst_app::AppSink>().ok())
                    .ok_or_else(|| RecordingError::StartFailed("appsink missing".to_string()))?;
                attach_view(&pipeline, &self.view);
                let stream = PreviewPipeline { pipeline, sink };
                stream
                    .play()
                    .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
                Ok(stream)
            });

        match started {
            Ok(stream) => {
                info!(path = %path.display(), "Recording started");
                pipelines.recording = Some(Recording { stream, path });
                pipelines.reopen = reopen;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to start recording");
                if let Some(reopen) = reopen {
                    pipelines.preview = PreviewPipeline::start(&reopen, &self.view).ok();
                }
                Err(e)
            }
        }
    }

    /// Finalize the running recording off the event loop
    ///
    /// When `reopen` is set the preview pipeline is restarted afterwards.
    fn stop_recording(&mut self, reopen: bool) -> Result<(), RecordingError> {
        let recording = {
            let mut pipelines = self
                .lock()
                .map_err(|e| RecordingError::StopFailed(e.to_string()))?;
            if !reopen {
                pipelines.reopen = None;
            }
            pipelines.recording.take()
        };
        let Some(recording) = recording else {
            return Err(RecordingError::StopFailed("not recording".to_string()));
        };

        let shared = Arc::clone(&self.shared);
        let view = Arc::clone(&self.view);
        let events = self.events.clone();
        let store = Arc::clone(&self.media_store);
        std::thread::spawn(move || {
            let finished = recording.finish();

            if let Ok(mut pipelines) = shared.lock() {
                if let Some(description) = pipelines.reopen.take() {
                    match PreviewPipeline::start(&description, &view) {
                        Ok(preview) => pipelines.preview = Some(preview),
                        Err(e) => {
                            error!(error = %e, "Failed to restart preview after recording");
                            let _ = events.send(PreviewEvent::CameraAvailable(false));
                        }
                    }
                }
            }

            let event = match finished {
                Ok(path) => match store.scan_file(&path) {
                    Ok(uri) => {
                        info!(uri = %uri, "Recording saved");
                        PreviewEvent::VideoSaved(uri)
                    }
                    Err(e) => PreviewEvent::CaptureFailed(e.to_string()),
                },
                Err(e) => {
                    error!(error = %e, "Failed to finalize recording");
                    PreviewEvent::CaptureFailed(e.to_string())
                }
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.lock()
            .map(|pipelines| pipelines.recording.is_some())
            .unwrap_or(false)
    }
}

impl Preview for GStreamerPreview {
    fn set_camera(&mut self, facing: CameraFacing) -> Result<(), CameraError> {
        let description = match self.preview_description(facing) {
            Ok(description) => description,
            Err(e) => {
                self.emit(PreviewEvent::CameraAvailable(false));
                return Err(e);
            }
        };

        let started = {
            let mut pipelines = self.lock()?;
            pipelines.preview = None;
            PreviewPipeline::start(&description, &self.view).map(|preview| {
                pipelines.preview = Some(preview);
            })
        };

        match started {
            Ok(()) => {
                info!(?facing, "Camera opened");
                self.facing = Some(facing);
                self.emit(PreviewEvent::CameraAvailable(true));
                // LEDs sit next to the rear sensor
                self.emit(PreviewEvent::FlashAvailable(
                    self.flash.has_devices() && facing == CameraFacing::Back,
                ));
                self.apply_torch();
                Ok(())
            }
            Err(e) => {
                error!(?facing, error = %e, "Failed to open camera");
                self.facing = None;
                self.emit(PreviewEvent::CameraAvailable(false));
                Err(e)
            }
        }
    }

    fn release_camera(&mut self) {
        if self.is_recording() {
            if let Err(e) = self.stop_recording(false) {
                warn!(error = %e, "Failed to stop recording on release");
            }
        }
        if let Ok(mut pipelines) = self.lock() {
            pipelines.preview = None;
            pipelines.reopen = None;
        }
        if let Ok(mut frame) = self.view.lock() {
            *frame = None;
        }
        self.facing = None;
        self.flash.all_off();
        debug!("Camera released");
    }

    fn set_target_path(&mut self, path: PathBuf) {
        info!(path = %path.display(), "Stills will be written to requested target");
        self.target_path = Some(path);
    }

    fn enable_flash(&mut self) {
        self.flash_state = FlashState::On;
        self.apply_torch();
    }

    fn disable_flash(&mut self) {
        self.flash_state = FlashState::Off;
        self.flash.all_off();
    }

    fn auto_flash(&mut self) {
        self.flash_state = FlashState::Auto;
        self.apply_torch();
    }

    fn take_picture(&mut self) {
        let sink = match self.lock() {
            Ok(pipelines) => pipelines.preview.as_ref().map(|p| p.sink.clone()),
            Err(_) => None,
        };
        let Some(sink) = sink else {
            self.emit(PreviewEvent::CaptureFailed(CameraError::NotOpen.to_string()));
            return;
        };

        let path = self.target_path.clone().unwrap_or_else(|| {
            self.photos_dir
                .join(storage::timestamped_file_name(MediaKind::Photo))
        });
        let flash = self.flash.clone();
        let flash_state = self.flash_state;
        let orientation = self.orientation;
        let events = self.events.clone();

        std::thread::spawn(move || {
            let event = match capture_still(&sink, &flash, flash_state, orientation, &path) {
                Ok(()) => {
                    info!(path = %path.display(), "Photo saved");
                    PreviewEvent::MediaSaved(path)
                }
                Err(e) => {
                    error!(error = %e, "Photo capture failed");
                    PreviewEvent::CaptureFailed(e.to_string())
                }
            };
            let _ = events.send(event);
        });
    }

    fn toggle_recording(&mut self) -> Result<bool, RecordingError> {
        if self.is_recording() {
            self.stop_recording(true)?;
            return Ok(false);
        }
        if !self.video_mode {
            return Err(RecordingError::NotInitialized);
        }
        let facing = self
            .facing
            .ok_or_else(|| RecordingError::StartFailed(CameraError::NotOpen.to_string()))?;
        self.start_recording(facing)?;
        Ok(true)
    }

    fn init_recorder(&mut self) -> Result<(), RecordingError> {
        if self.facing.is_none() {
            return Err(RecordingError::NotInitialized);
        }
        if let Some(missing) = REQUIRED_VIDEO_ELEMENTS
            .iter()
            .find(|name| gst::ElementFactory::find(name).is_none())
        {
            return Err(RecordingError::EncoderNotAvailable(missing.to_string()));
        }
        self.video_mode = true;
        self.apply_torch();
        Ok(())
    }

    fn init_photo_mode(&mut self) {
        if self.is_recording() {
            if let Err(e) = self.stop_recording(true) {
                warn!(error = %e, "Failed to stop recording on photo mode switch");
            }
        }
        self.video_mode = false;
        self.apply_torch();
    }

    fn try_switch_to_video(&mut self) {
        debug!("Switching preview to video for capture request");
        self.video_mode = true;
    }

    fn device_orientation_changed(&mut self, orientation: Orientation) {
        debug!(?orientation, "Device orientation changed");
        self.orientation = orientation;
    }

    fn focus_at(&mut self, x: f32, y: f32) {
        // Continuous autofocus is left to the driver, only the marker is drawn
        self.emit(PreviewEvent::FocusRect {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        });
    }

    fn cycle_resolution(&mut self) -> Option<(u32, u32)> {
        if self.is_recording() {
            return None;
        }
        self.resolution_index = (self.resolution_index + 1) % constants::RESOLUTION_PRESETS.len();
        let resolution = self.resolution();
        if let Some(facing) = self.facing {
            if let Err(e) = self.set_camera(facing) {
                warn!(error = %e, "Failed to reopen camera at new resolution");
                return None;
            }
        }
        info!(width = resolution.0, height = resolution.1, "Resolution changed");
        Some(resolution)
    }

    fn camera_count(&self) -> usize {
        match self.source {
            VideoSource::V4l2 => self.cameras.len(),
            VideoSource::TestPattern => 2,
        }
    }
}

fn audio_encoder() -> Option<&'static str> {
    AUDIO_ENCODERS
        .iter()
        .copied()
        .find(|name| gst::ElementFactory::find(name).is_some())
}

/// Publish every sample of the `view` appsink, if the pipeline has one
fn attach_view(pipeline: &gst::Pipeline, slot: &FrameSlot) {
    let Some(view) = pipeline
        .by_name("view")
        .and_then(|element| element.downcast::<gst_app::AppSink>().ok())
    else {
        return;
    };

    let slot = Arc::clone(slot);
    view.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                if let Ok(frame) = image_from_sample(&sample) {
                    if let Ok(mut current) = slot.lock() {
                        *current = Some(frame);
                    }
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

/// Pull the newest frame from the appsink as an RGBA image
fn pull_frame(sink: &gst_app::AppSink) -> Result<image::RgbaImage, PhotoError> {
    let sample = sink
        .try_pull_sample(gst::ClockTime::from_mseconds(timing::FRAME_PULL_TIMEOUT_MS))
        .ok_or(PhotoError::NoFrameAvailable)?;
    image_from_sample(&sample)
}

/// Copy an RGBA sample into an image, dropping row padding
fn image_from_sample(sample: &gst::Sample) -> Result<image::RgbaImage, PhotoError> {
    let caps = sample.caps().ok_or(PhotoError::NoFrameAvailable)?;
    let info = gst_video::VideoInfo::from_caps(caps)
        .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
    let buffer = sample.buffer().ok_or(PhotoError::NoFrameAvailable)?;
    let map = buffer
        .map_readable()
        .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;

    let width = info.width();
    let height = info.height();
    let stride = row_stride(info.stride()[0])?;
    let row_bytes = width as usize * 4;
    let data = map.as_slice();

    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        if end > data.len() {
            return Err(PhotoError::EncodingFailed("short frame buffer".to_string()));
        }
        rgba.extend_from_slice(&data[start..end]);
    }

    image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| PhotoError::EncodingFailed("frame size mismatch".to_string()))
}

/// Byte stride of a packed plane, rejecting bottom-up layouts
fn row_stride(stride: i32) -> Result<usize, PhotoError> {
    usize::try_from(stride)
        .map_err(|_| PhotoError::EncodingFailed(format!("unsupported row stride {stride}")))
}

/// Mean BT.601 luma of a frame, 0.0-1.0, sampled on a coarse grid
fn mean_luma(frame: &image::RgbaImage) -> f32 {
    let (width, height) = frame.dimensions();
    let step = 8;
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            let [r, g, b, _] = frame.get_pixel(x, y).0;
            sum += 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f32 / 255.0
}

fn capture_still(
    sink: &gst_app::AppSink,
    flash: &FlashHardware,
    flash_state: FlashState,
    orientation: Orientation,
    path: &Path,
) -> Result<(), PhotoError> {
    let mut frame = pull_frame(sink)?;

    let fire = flash.has_devices()
        && match flash_state {
            FlashState::On => true,
            FlashState::Auto => mean_luma(&frame) < constants::flash::AUTO_FLASH_LUMA_THRESHOLD,
            FlashState::Off => false,
        };

    if fire {
        flash.all_on();
        std::thread::sleep(Duration::from_millis(constants::flash::PRE_FLASH_MS));
        // Drain frames exposed before the LED came on
        let lit = (0..3).map(|_| pull_frame(sink)).last();
        flash.all_off();
        if let Some(lit) = lit {
            frame = lit?;
        }
    }

    let frame = match orientation {
        Orientation::Portrait => frame,
        Orientation::LandscapeLeft => image::imageops::rotate270(&frame),
        Orientation::LandscapeRight => image::imageops::rotate90(&frame),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image::DynamicImage::ImageRgba8(frame).to_rgb8().save(path)?;
    Ok(())
}
