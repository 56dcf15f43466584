// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests driving the camera screen controller with fakes

mod common;

use common::{FakePermissions, FakeStore, Harness, Outcome, photo_uri, video_uri};
use simple_camera::app::{
    CameraFacing, CameraMode, CameraToggleIcon, CaptureIntent, CaptureResult, Control,
    HostRequest, Key, Message, ModeToggleIcon, Orientation, ShutterIcon,
};
use simple_camera::backends::permissions::Permission;
use simple_camera::backends::preview::PreviewEvent;
use simple_camera::config::Config;
use simple_camera::constants::{self, timing, ui};
use simple_camera::flash::FlashState;
use std::path::PathBuf;

fn delayed_generation(outcome: &Outcome, pick: fn(&Message) -> Option<u64>) -> Option<u64> {
    outcome.delayed.iter().find_map(|(_, message)| pick(message))
}

fn recording_tick(message: &Message) -> Option<u64> {
    match message {
        Message::RecordingTick(generation) => Some(*generation),
        _ => None,
    }
}

fn fade_out(message: &Message) -> Option<u64> {
    match message {
        Message::FadeOutControls(generation) => Some(*generation),
        _ => None,
    }
}

fn clear_focus(message: &Message) -> Option<u64> {
    match message {
        Message::ClearFocusRect(generation) => Some(*generation),
        _ => None,
    }
}

async fn open_in_video_mode() -> Harness {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.send(Message::TogglePhotoVideo).await;
    assert_eq!(harness.model.mode, CameraMode::Video);
    harness
}

// ===== Startup =====

#[tokio::test]
async fn test_open_sets_up_camera() {
    let (harness, outcome) = Harness::open(CaptureIntent::None).await;

    assert!(harness.model.is_initialized);
    assert!(harness.model.is_camera_available);
    assert!(harness.model.sensor_registered);
    assert_eq!(harness.model.mode, CameraMode::Photo);
    assert_eq!(harness.model.facing, CameraFacing::Back);
    assert!(harness.model.controls.camera_toggle_visible);
    assert!(harness.calls().contains(&"set_camera Back".to_string()));
    assert!(
        outcome
            .requests
            .contains(&HostRequest::KeepScreenOn(true))
    );
    assert!(delayed_generation(&outcome, fade_out).is_some());
}

#[tokio::test]
async fn test_single_camera_hides_toggle() {
    let mut harness = Harness::new(CaptureIntent::None);
    harness.preview.0.lock().unwrap().camera_count = 1;
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;

    assert!(!harness.model.controls.camera_toggle_visible);
}

#[tokio::test]
async fn test_restores_last_camera_and_flash() {
    let config = Config {
        last_used_camera: CameraFacing::Front,
        flashlight_state: FlashState::Auto,
        ..Config::default()
    };
    let mut harness = Harness::with(
        CaptureIntent::None,
        config,
        FakePermissions::all(),
        FakeStore::default(),
    );
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;

    assert_eq!(harness.model.facing, CameraFacing::Front);
    assert_eq!(harness.model.controls.camera_toggle_icon, CameraToggleIcon::Rear);
    assert_eq!(harness.model.flash_state, FlashState::Auto);
    assert!(harness.calls().contains(&"auto_flash".to_string()));
}

#[tokio::test]
async fn test_whats_new_after_upgrade() {
    let config = Config {
        is_first_run: false,
        last_seen_release: 33,
        ..Config::default()
    };
    let mut harness = Harness::with(
        CaptureIntent::None,
        config,
        FakePermissions::all(),
        FakeStore::default(),
    );
    let outcome = harness.send(Message::Create).await;

    let notices = outcome.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("auto"));
    assert!(!notices[0].contains("hardware camera key"));
    assert_eq!(
        harness.model.config.last_seen_release,
        constants::app_info::latest_release()
    );
}

#[tokio::test]
async fn test_first_run_skips_whats_new() {
    let (harness, outcome) = Harness::open(CaptureIntent::None).await;

    assert!(outcome.notices().is_empty());
    assert_eq!(
        harness.model.config.last_seen_release,
        constants::app_info::latest_release()
    );
}

// ===== Flash =====

#[tokio::test]
async fn test_flash_cycles_in_photo_mode() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    assert_eq!(harness.model.flash_state, FlashState::Off);

    let mut seen = Vec::new();
    for _ in 0..3 {
        harness.send(Message::ToggleFlash).await;
        assert_eq!(harness.model.controls.flash_icon, harness.model.flash_state);
        assert_eq!(harness.model.config.flashlight_state, harness.model.flash_state);
        seen.push(harness.model.flash_state);
    }

    assert_eq!(seen, vec![FlashState::On, FlashState::Auto, FlashState::Off]);
}

#[tokio::test]
async fn test_flash_never_auto_in_video_mode() {
    let mut harness = open_in_video_mode().await;
    assert_eq!(harness.model.flash_state, FlashState::Off);

    let mut seen = Vec::new();
    for _ in 0..4 {
        harness.send(Message::ToggleFlash).await;
        assert!(harness.model.flash_state.is_legal_for(CameraMode::Video));
        seen.push(harness.model.flash_state);
    }

    assert_eq!(
        seen,
        vec![FlashState::On, FlashState::Off, FlashState::On, FlashState::Off]
    );
}

#[tokio::test]
async fn test_mode_switch_turns_flash_off() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.send(Message::ToggleFlash).await;
    harness.send(Message::ToggleFlash).await;
    assert_eq!(harness.model.flash_state, FlashState::Auto);

    harness.send(Message::TogglePhotoVideo).await;

    assert_eq!(harness.model.mode, CameraMode::Video);
    assert_eq!(harness.model.flash_state, FlashState::Off);
}

#[tokio::test]
async fn test_flash_unavailable_hides_button() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.send(Message::ToggleFlash).await;

    harness
        .send(Message::Preview(PreviewEvent::FlashAvailable(false)))
        .await;

    assert!(!harness.model.controls.flash_visible);
    assert_eq!(harness.model.flash_state, FlashState::Off);
    assert!(!harness.model.controls.is_clickable(Control::Flash));
}

#[tokio::test]
async fn test_hidden_flash_ignores_toggle() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness
        .send(Message::Preview(PreviewEvent::FlashAvailable(false)))
        .await;
    harness.clear_calls();

    let outcome = harness.send(Message::ToggleFlash).await;

    assert!(outcome.notices().is_empty());
    assert_eq!(harness.model.flash_state, FlashState::Off);
    assert_eq!(harness.model.config.flashlight_state, FlashState::Off);
    assert!(!harness.calls().contains(&"enable_flash".to_string()));
}

// ===== Camera toggle =====

#[tokio::test]
async fn test_toggle_camera_switches_and_persists() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;

    let outcome = harness.send(Message::ToggleCamera).await;

    assert!(outcome.notices().is_empty());
    assert_eq!(harness.model.facing, CameraFacing::Front);
    assert_eq!(harness.model.controls.camera_toggle_icon, CameraToggleIcon::Rear);
    assert_eq!(harness.model.config.last_used_camera, CameraFacing::Front);
    assert_eq!(
        harness.preview.0.lock().unwrap().open,
        Some(CameraFacing::Front)
    );
}

#[tokio::test]
async fn test_failed_camera_toggle_rolls_back() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness
        .preview
        .0
        .lock()
        .unwrap()
        .broken
        .insert(CameraFacing::Front);
    harness.clear_calls();

    let outcome = harness.send(Message::ToggleCamera).await;

    assert_eq!(outcome.notices(), vec!["Switching camera failed".to_string()]);
    assert_eq!(harness.model.facing, CameraFacing::Back);
    assert_eq!(harness.model.controls.camera_toggle_icon, CameraToggleIcon::Front);
    assert_eq!(harness.model.config.last_used_camera, CameraFacing::Back);
    assert!(harness.model.is_camera_available);
    assert_eq!(
        harness.calls(),
        vec![
            "release_camera".to_string(),
            "set_camera Front".to_string(),
            "set_camera Back".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_input_while_camera_unavailable() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness
        .send(Message::Preview(PreviewEvent::CameraAvailable(false)))
        .await;
    harness.clear_calls();

    for message in [Message::Shutter, Message::ToggleFlash, Message::ToggleCamera] {
        let outcome = harness.send(message).await;
        assert_eq!(outcome.notices(), vec!["Camera unavailable".to_string()]);
    }
    assert!(harness.calls().is_empty());
}

#[tokio::test]
async fn test_hidden_camera_toggle_ignored_with_single_camera() {
    let mut harness = Harness::new(CaptureIntent::None);
    harness.preview.0.lock().unwrap().camera_count = 1;
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;
    harness.clear_calls();

    harness.send(Message::ToggleCamera).await;

    assert_eq!(harness.model.facing, CameraFacing::Back);
    assert_eq!(harness.model.config.last_used_camera, CameraFacing::Back);
    assert!(harness.calls().is_empty());
}

#[tokio::test]
async fn test_camera_toggle_ignored_while_recording() {
    let mut harness = open_in_video_mode().await;
    harness.send(Message::Shutter).await;
    harness.clear_calls();

    harness.send(Message::ToggleCamera).await;

    assert!(harness.model.is_recording);
    assert!(harness.model.controls.timer_visible);
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoStop);
    assert_eq!(harness.model.facing, CameraFacing::Back);
    let log = harness.preview.0.lock().unwrap();
    assert!(log.recording);
    assert_eq!(log.open, Some(CameraFacing::Back));
    assert!(!log.calls.contains(&"release_camera".to_string()));
    assert!(!log.calls.contains(&"set_camera Front".to_string()));
}

// ===== Orientation =====

#[tokio::test]
async fn test_orientation_buckets_rotate_controls() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;

    harness.send(Message::AccelerometerSample(7.0)).await;
    assert_eq!(harness.model.controls.rotation, 90);
    assert_eq!(
        harness.preview.0.lock().unwrap().orientation,
        Some(Orientation::LandscapeLeft)
    );

    harness.send(Message::AccelerometerSample(-7.0)).await;
    assert_eq!(harness.model.controls.rotation, -90);
    assert_eq!(harness.model.last_handled_orientation, Orientation::LandscapeRight);

    harness.send(Message::AccelerometerSample(0.0)).await;
    assert_eq!(harness.model.controls.rotation, 0);
    assert_eq!(harness.model.last_handled_orientation, Orientation::Portrait);
}

#[tokio::test]
async fn test_samples_ignored_while_paused() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.send(Message::Pause).await;

    harness.send(Message::AccelerometerSample(9.0)).await;

    assert_eq!(harness.model.controls.rotation, 0);
    assert_eq!(harness.preview.0.lock().unwrap().orientation, None);
}

// ===== Recording timer =====

#[tokio::test]
async fn test_recording_timer_counts_and_resets() {
    let mut harness = open_in_video_mode().await;
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoRec);

    let outcome = harness.send(Message::Shutter).await;
    assert!(harness.model.is_recording);
    assert!(harness.model.controls.timer_visible);
    assert_eq!(harness.model.controls.timer_text, "00:00");
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoStop);
    assert!(!harness.model.controls.camera_toggle_visible);

    let (delay, _) = &outcome.delayed[0];
    assert_eq!(*delay, timing::RECORDING_TICK);
    let generation = delayed_generation(&outcome, recording_tick).unwrap();

    for expected in ["00:01", "00:02", "00:03"] {
        let outcome = harness.send(Message::RecordingTick(generation)).await;
        assert_eq!(harness.model.controls.timer_text, expected);
        assert_eq!(delayed_generation(&outcome, recording_tick), Some(generation));
    }
    assert_eq!(harness.model.recording_secs, 3);

    harness.send(Message::Shutter).await;
    assert!(!harness.model.is_recording);
    assert!(!harness.model.controls.timer_visible);
    assert_eq!(harness.model.recording_secs, 0);
    assert_eq!(harness.model.controls.timer_text, "00:00");
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoRec);
    assert!(harness.model.controls.camera_toggle_visible);

    // A tick already in flight when recording stopped is dropped
    let outcome = harness.send(Message::RecordingTick(generation)).await;
    assert!(outcome.delayed.is_empty());
    assert_eq!(harness.model.controls.timer_text, "00:00");
}

#[tokio::test]
async fn test_new_recording_starts_from_zero() {
    let mut harness = open_in_video_mode().await;
    let first = harness.send(Message::Shutter).await;
    let old = delayed_generation(&first, recording_tick).unwrap();
    harness.send(Message::RecordingTick(old)).await;
    harness.send(Message::Shutter).await;

    let second = harness.send(Message::Shutter).await;
    let new = delayed_generation(&second, recording_tick).unwrap();
    assert_ne!(old, new);

    harness.send(Message::RecordingTick(old)).await;
    assert_eq!(harness.model.recording_secs, 0);
    harness.send(Message::RecordingTick(new)).await;
    assert_eq!(harness.model.recording_secs, 1);
}

#[tokio::test]
async fn test_pause_stops_timer_and_releases_camera() {
    let mut harness = open_in_video_mode().await;
    harness.send(Message::Shutter).await;

    let outcome = harness.send(Message::Pause).await;

    assert!(outcome.requests.contains(&HostRequest::KeepScreenOn(false)));
    assert!(!harness.model.controls.timer_visible);
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoRec);
    assert!(!harness.model.sensor_registered);
    let log = harness.preview.0.lock().unwrap();
    assert_eq!(log.open, None);
    assert!(!log.recording);
}

#[tokio::test]
async fn test_mode_switch_stops_recording() {
    let mut harness = open_in_video_mode().await;
    let started = harness.send(Message::Shutter).await;
    let generation = delayed_generation(&started, recording_tick).unwrap();
    assert!(harness.preview.0.lock().unwrap().recording);

    harness.send(Message::TogglePhotoVideo).await;

    assert_eq!(harness.model.mode, CameraMode::Photo);
    assert!(!harness.model.is_recording);
    assert!(!harness.model.controls.timer_visible);
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::Shutter);
    assert!(harness.model.controls.camera_toggle_visible);
    assert!(!harness.preview.0.lock().unwrap().recording);

    let outcome = harness.send(Message::RecordingTick(generation)).await;
    assert!(outcome.delayed.is_empty());
    assert_eq!(harness.model.recording_secs, 0);
}

// ===== Photo capture =====

#[tokio::test]
async fn test_photo_hides_bottom_controls_briefly() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;

    let outcome = harness.send(Message::Shutter).await;

    assert!(harness.calls().contains(&"take_picture".to_string()));
    assert_eq!(harness.model.controls.bottom_alpha, ui::HIDDEN);
    let (delay, message) = &outcome.delayed[0];
    assert_eq!(*delay, timing::PHOTO_PREVIEW_LENGTH);
    let Message::RestoreBottomControls(generation) = message else {
        panic!("expected restore, got {:?}", message);
    };

    harness
        .send(Message::RestoreBottomControls(*generation))
        .await;
    assert_eq!(harness.model.controls.bottom_alpha, ui::OPAQUE);
}

#[tokio::test]
async fn test_hardware_key_fires_once_per_press() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.clear_calls();

    for _ in 0..3 {
        harness.send(Message::KeyDown(Key::Camera)).await;
    }
    harness.send(Message::KeyDown(Key::Other)).await;
    assert_eq!(harness.calls(), vec!["take_picture".to_string()]);

    harness.send(Message::KeyUp(Key::Camera)).await;
    harness.send(Message::KeyDown(Key::Camera)).await;
    assert_eq!(
        harness.calls(),
        vec!["take_picture".to_string(), "take_picture".to_string()]
    );
}

#[tokio::test]
async fn test_saved_photo_refreshes_thumbnail() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    let path = PathBuf::from("/tmp/IMG_20260101_120000.jpg");

    let outcome = harness
        .send(Message::Preview(PreviewEvent::MediaSaved(path.clone())))
        .await;

    assert!(outcome.finished().is_none());
    let last = harness.model.last_media.clone().unwrap();
    assert_eq!(last.path, path);
    assert_eq!(harness.store.items.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_capture_failure_restores_controls() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.send(Message::Shutter).await;

    let outcome = harness
        .send(Message::Preview(PreviewEvent::CaptureFailed(
            "no frame".to_string(),
        )))
        .await;

    assert_eq!(outcome.notices(), vec!["Capture failed: no frame".to_string()]);
    assert_eq!(harness.model.controls.bottom_alpha, ui::OPAQUE);
}

// ===== Capture intents =====

#[tokio::test]
async fn test_image_intent_finishes_on_saved_media() {
    let output = PathBuf::from("/tmp/requested.jpg");
    let (mut harness, _) = Harness::open(CaptureIntent::Image {
        output: Some(output.clone()),
    })
    .await;

    assert_eq!(harness.preview.0.lock().unwrap().target_path, Some(output.clone()));
    assert!(!harness.model.controls.mode_toggle_visible);
    assert!(!harness.model.controls.settings_visible);

    harness.send(Message::Shutter).await;
    let outcome = harness
        .send(Message::Preview(PreviewEvent::MediaSaved(output.clone())))
        .await;

    assert_eq!(outcome.finished(), Some(&CaptureResult::Ok { uri: None }));
    assert_eq!(harness.model.finished, Some(CaptureResult::Ok { uri: None }));
    // The file is still registered
    assert_eq!(harness.store.items.lock().unwrap()[0].path, output);

    // Nothing but teardown is handled afterwards
    harness.clear_calls();
    harness.send(Message::Shutter).await;
    assert!(harness.calls().is_empty());
    harness.send(Message::Pause).await;
    assert_eq!(harness.calls(), vec!["release_camera".to_string()]);
}

#[tokio::test]
async fn test_video_intent_starts_in_video_mode_and_returns_uri() {
    let (mut harness, _) = Harness::open(CaptureIntent::Video).await;

    assert_eq!(harness.model.mode, CameraMode::Video);
    assert_eq!(harness.model.controls.shutter_icon, ShutterIcon::VideoRec);
    assert!(!harness.model.controls.mode_toggle_visible);
    assert!(harness.calls().contains(&"try_switch_to_video".to_string()));
    assert!(harness.calls().contains(&"init_recorder".to_string()));

    harness.send(Message::Shutter).await;
    harness.send(Message::Shutter).await;
    let uri = video_uri(7);
    let outcome = harness
        .send(Message::Preview(PreviewEvent::VideoSaved(uri.clone())))
        .await;

    assert_eq!(
        outcome.finished(),
        Some(&CaptureResult::Ok { uri: Some(uri) })
    );
}

#[tokio::test]
async fn test_video_intent_without_recorder_stays_quiet() {
    let mut harness = Harness::new(CaptureIntent::Video);
    harness.preview.0.lock().unwrap().recorder_fails = true;
    harness.send(Message::Create).await;
    let outcome = harness.send(Message::Resume).await;

    assert!(outcome.notices().is_empty());
}

#[tokio::test]
async fn test_recorder_failure_shows_notice() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    harness.preview.0.lock().unwrap().recorder_fails = true;

    let outcome = harness.send(Message::TogglePhotoVideo).await;

    assert_eq!(outcome.notices(), vec!["Switching to video failed".to_string()]);
    assert_eq!(harness.model.mode, CameraMode::Video);
}

// ===== Permissions =====

#[tokio::test]
async fn test_denied_camera_access_cancels() {
    let permissions = FakePermissions::granting(&[], &[]);
    let mut harness = Harness::with(
        CaptureIntent::Image { output: None },
        Config::default(),
        permissions.clone(),
        FakeStore::default(),
    );

    let outcome = harness.send(Message::Create).await;

    assert_eq!(
        permissions.0.lock().unwrap().requests,
        vec![vec![Permission::Camera, Permission::Storage]]
    );
    assert_eq!(
        outcome.notices(),
        vec!["Camera and storage access are required".to_string()]
    );
    assert_eq!(outcome.finished(), Some(&CaptureResult::Cancelled));
    assert!(!harness.model.is_initialized);
}

#[tokio::test]
async fn test_granted_camera_access_initializes() {
    let permissions =
        FakePermissions::granting(&[Permission::Storage], &[Permission::Camera]);
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        permissions.clone(),
        FakeStore::default(),
    );

    harness.send(Message::Create).await;
    assert_eq!(
        permissions.0.lock().unwrap().requests,
        vec![vec![Permission::Camera]]
    );
    assert!(harness.model.is_initialized);

    harness.send(Message::Resume).await;
    assert_eq!(
        harness.preview.0.lock().unwrap().open,
        Some(CameraFacing::Back)
    );
}

#[tokio::test]
async fn test_grant_after_resume_opens_camera() {
    let permissions = FakePermissions::granting(&[], &[Permission::Camera, Permission::Storage]);
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        permissions,
        FakeStore::default(),
    );

    // Resume arrives while the request is still pending
    let pending = harness.model.update(Message::Create);
    harness.send(Message::Resume).await;
    assert_eq!(harness.preview.0.lock().unwrap().open, None);

    for leaf in pending.into_leaves() {
        if let simple_camera::app::Task::Perform(future) = leaf {
            let answer = future.await;
            harness.send(answer).await;
        }
    }

    assert!(harness.model.is_initialized);
    assert_eq!(
        harness.preview.0.lock().unwrap().open,
        Some(CameraFacing::Back)
    );
}

#[tokio::test]
async fn test_audio_grant_switches_to_video() {
    let permissions = FakePermissions::granting(
        &[Permission::Camera, Permission::Storage],
        &[Permission::RecordAudio],
    );
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        permissions,
        FakeStore::default(),
    );
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;

    harness.send(Message::TogglePhotoVideo).await;

    assert!(!harness.model.is_asking_permissions);
    assert_eq!(harness.model.mode, CameraMode::Video);
    assert_eq!(harness.model.controls.mode_toggle_icon, ModeToggleIcon::Camera);
    assert!(harness.calls().contains(&"init_recorder".to_string()));
}

#[tokio::test]
async fn test_audio_denied_keeps_photo_mode() {
    let permissions = FakePermissions::granting(&[Permission::Camera, Permission::Storage], &[]);
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        permissions,
        FakeStore::default(),
    );
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;

    let outcome = harness.send(Message::TogglePhotoVideo).await;

    assert_eq!(
        outcome.notices(),
        vec!["Recording audio is required for videos".to_string()]
    );
    assert!(outcome.finished().is_none());
    assert_eq!(harness.model.mode, CameraMode::Photo);
}

#[tokio::test]
async fn test_audio_denied_cancels_video_intent() {
    let permissions = FakePermissions::granting(&[Permission::Camera, Permission::Storage], &[]);
    let mut harness = Harness::with(
        CaptureIntent::Video,
        Config::default(),
        permissions,
        FakeStore::default(),
    );
    harness.send(Message::Create).await;

    let outcome = harness.send(Message::Resume).await;

    assert_eq!(outcome.finished(), Some(&CaptureResult::Cancelled));
}

// ===== Fading controls =====

#[tokio::test]
async fn test_faded_controls_ignore_clicks() {
    let (mut harness, opened) = Harness::open(CaptureIntent::None).await;
    let generation = delayed_generation(&opened, fade_out).unwrap();

    harness.send(Message::FadeOutControls(generation)).await;
    let controls = &harness.model.controls;
    assert_eq!(controls.settings_alpha, ui::SETTINGS_FADED_ALPHA);
    assert_eq!(controls.mode_toggle_alpha, ui::HIDDEN);
    assert!(!controls.is_clickable(Control::ModeToggle));
    assert!(!controls.is_clickable(Control::LastMedia));
    assert!(controls.is_clickable(Control::Settings));
    assert!(controls.is_clickable(Control::Shutter));

    harness.send(Message::TogglePhotoVideo).await;
    assert_eq!(harness.model.mode, CameraMode::Photo);
    harness.send(Message::ChangeResolution).await;
    assert!(!harness.calls().contains(&"cycle_resolution".to_string()));
}

#[tokio::test]
async fn test_settings_tap_fades_controls_back_in() {
    let (mut harness, opened) = Harness::open(CaptureIntent::None).await;
    let first = delayed_generation(&opened, fade_out).unwrap();
    harness.send(Message::FadeOutControls(first)).await;

    let outcome = harness.send(Message::OpenSettings).await;
    assert!(!outcome.requests.contains(&HostRequest::OpenSettings));
    assert_eq!(harness.model.controls.settings_alpha, ui::OPAQUE);
    assert_eq!(harness.model.controls.mode_toggle_alpha, ui::OPAQUE);
    let second = delayed_generation(&outcome, fade_out).unwrap();
    assert_ne!(first, second);

    // The earlier fade no longer applies
    harness.send(Message::FadeOutControls(first)).await;
    assert_eq!(harness.model.controls.settings_alpha, ui::OPAQUE);

    let outcome = harness.send(Message::OpenSettings).await;
    assert_eq!(outcome.requests, vec![HostRequest::OpenSettings]);
}

#[tokio::test]
async fn test_resolution_change_shows_notice() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;

    let outcome = harness.send(Message::ChangeResolution).await;

    assert_eq!(harness.model.controls.resolution, Some((1920, 1080)));
    assert_eq!(outcome.notices(), vec!["Resolution 1920x1080".to_string()]);
}

// ===== Focus =====

#[tokio::test]
async fn test_focus_marker_clears_after_latest_tap() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;

    harness
        .send(Message::PreviewTapped { x: 0.3, y: 0.6 })
        .await;
    assert!(harness.calls().contains(&"focus_at 0.3 0.6".to_string()));

    let first = harness
        .send(Message::Preview(PreviewEvent::FocusRect { x: 0.3, y: 0.6 }))
        .await;
    let second = harness
        .send(Message::Preview(PreviewEvent::FocusRect { x: 0.5, y: 0.5 }))
        .await;
    let first = delayed_generation(&first, clear_focus).unwrap();
    let second = delayed_generation(&second, clear_focus).unwrap();

    harness.send(Message::ClearFocusRect(first)).await;
    let marker = harness.model.controls.focus.clone().unwrap();
    assert_eq!((marker.x, marker.y), (0.5, 0.5));

    harness.send(Message::ClearFocusRect(second)).await;
    assert!(harness.model.controls.focus.is_none());
}

// ===== Last media =====

#[tokio::test]
async fn test_last_media_follows_mode() {
    let store = FakeStore::with(vec![photo_uri(1), video_uri(2)]);
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        FakePermissions::all(),
        store,
    );
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;
    assert_eq!(harness.model.last_media, Some(photo_uri(1)));

    // Result for the mode already left
    harness
        .send(Message::LastMediaLoaded(
            simple_camera::storage::MediaKind::Video,
            Some(video_uri(2)),
        ))
        .await;
    assert_eq!(harness.model.last_media, Some(photo_uri(1)));

    harness.send(Message::TogglePhotoVideo).await;
    assert_eq!(harness.model.last_media, Some(video_uri(2)));
}

#[tokio::test]
async fn test_show_last_media_falls_back_to_default_viewer() {
    let store = FakeStore::with(vec![photo_uri(3)]);
    let mut harness = Harness::with(
        CaptureIntent::None,
        Config::default(),
        FakePermissions::all(),
        store,
    );
    harness.send(Message::Create).await;
    harness.send(Message::Resume).await;

    let outcome = harness.send(Message::ShowLastMedia).await;
    assert_eq!(
        outcome.notices(),
        vec!["No gallery application available".to_string()]
    );

    harness.viewer.0.lock().unwrap().view_works = true;
    let outcome = harness.send(Message::ShowLastMedia).await;
    assert!(outcome.notices().is_empty());

    harness.viewer.0.lock().unwrap().review_works = true;
    harness.send(Message::ShowLastMedia).await;

    assert_eq!(
        harness.viewer.0.lock().unwrap().opened,
        vec![
            "view media://images/3".to_string(),
            "review media://images/3".to_string(),
        ]
    );
}

// ===== Teardown =====

#[tokio::test]
async fn test_destroy_clears_first_run() {
    let (mut harness, _) = Harness::open(CaptureIntent::None).await;
    assert!(harness.model.config.is_first_run);

    harness.send(Message::Destroy).await;

    assert!(!harness.model.config.is_first_run);
    assert_eq!(harness.preview.0.lock().unwrap().open, None);
}
