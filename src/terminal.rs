// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Hosts the camera controller in the terminal. The preview is drawn with
//! Unicode half-block characters for improved vertical resolution, the
//! controls sit in a bar below it and notices float above the bar.
//!
//! Keys map onto the controller's inputs:
//!
//! | key         | input                                  |
//! |-------------|----------------------------------------|
//! | space/enter | shutter                                |
//! | k           | hardware camera key (press + release)  |
//! | f           | flash                                  |
//! | c           | camera toggle                          |
//! | m           | photo/video toggle                     |
//! | g           | last media                             |
//! | s           | settings                               |
//! | r           | resolution                             |
//! | arrows      | simulated device rotation              |
//! | click       | tap to focus                           |
//! | q / Ctrl+C  | quit                                   |

use crate::app::{
    APP_ID, AppModel, CaptureIntent, CaptureResult, Control, Controls, Flags, Host, HostRequest,
    Key, Message, ModeToggleIcon, Notice, Runtime, ShutterIcon,
};
use crate::backends::permissions::SystemPermissions;
use crate::backends::preview::{FrameSlot, GStreamerPreview, VideoSource};
use crate::backends::sensor::{Accelerometer, SensorHandle};
use crate::backends::viewer::DesktopViewer;
use crate::config;
use crate::constants::{timing, ui};
use crate::flash::FlashState;
use crate::storage::{FsMediaStore, MediaStore};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use std::error::Error;
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Standard gravity, used for the simulated rotation keys
const GRAVITY: f32 = 9.81;

/// Redraw interval
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// How the camera screen was opened
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub intent: CaptureIntent,
    pub source: VideoSource,
}

/// Run the camera screen in the terminal until it is closed
///
/// Returns the capture result when the screen was opened with a capture
/// intent, `None` for interactive use.
pub fn run(options: Options) -> Result<Option<CaptureResult>, Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = runtime.block_on(run_app(&mut terminal, options));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// One iteration's worth of work for the event loop
enum Step {
    Input(Event),
    Message(Message),
    Redraw,
    Quit,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    options: Options,
) -> Result<Option<CaptureResult>, Box<dyn Error>> {
    let (config_handler, config) = config::load(APP_ID);

    let store = Arc::new(FsMediaStore::open_default(&config.save_folder_name));
    let media_dirs = vec![store.photos_dir().to_path_buf(), store.videos_dir().to_path_buf()];
    let media_store: Arc<dyn MediaStore> = store.clone();

    let (event_tx, event_rx) = unbounded_channel();
    let preview = GStreamerPreview::new(
        options.source,
        event_tx,
        Arc::clone(&media_store),
        media_dirs[0].clone(),
        media_dirs[1].clone(),
    )?;
    let frames = preview.frames();
    let camera_nodes = preview
        .cameras()
        .iter()
        .map(|camera| camera.path.clone())
        .collect();

    let intent = options.intent;
    let model = AppModel::new(Flags {
        viewer: Box::new(DesktopViewer::new(config.review_app.clone())),
        permissions: Box::new(SystemPermissions::new(camera_nodes, media_dirs)),
        preview: Box::new(preview),
        media_store,
        config,
        config_handler,
        intent: intent.clone(),
    });

    let mut runtime = Runtime::new(model);
    runtime.forward_preview_events(event_rx);

    let _sensor: Option<SensorHandle> = Accelerometer::detect().map(|accelerometer| {
        let (sample_tx, sample_rx) = unbounded_channel();
        runtime.forward_samples(sample_rx);
        accelerometer.spawn(sample_tx)
    });

    let mut input = spawn_input_reader();
    let mut host = TerminalHost::default();
    let mut screen = Screen::new(frames);

    runtime.dispatch(Message::Create, &mut host);
    runtime.dispatch(Message::Resume, &mut host);

    let mut redraw = tokio::time::interval(FRAME_INTERVAL);

    while host.finished.is_none() {
        screen.refresh();
        host.expire_notices();
        terminal.draw(|f| screen.draw(f, runtime.model(), &host))?;

        let step = tokio::select! {
            event = input.recv() => event.map_or(Step::Quit, Step::Input),
            message = runtime.next_message() => message.map_or(Step::Quit, Step::Message),
            _ = redraw.tick() => Step::Redraw,
        };

        match step {
            Step::Input(event) => {
                if host.settings_open {
                    if is_key_press(&event) {
                        host.settings_open = false;
                    }
                    continue;
                }
                match input_messages(&event, screen.preview_area) {
                    InputAction::Quit => break,
                    InputAction::Messages(messages) => {
                        for message in messages {
                            runtime.dispatch(message, &mut host);
                        }
                    }
                }
            }
            Step::Message(message) => runtime.dispatch(message, &mut host),
            Step::Redraw => {}
            Step::Quit => break,
        }
    }

    info!("Closing camera screen");
    runtime.dispatch(Message::Pause, &mut host);
    runtime.dispatch(Message::Destroy, &mut host);
    runtime
        .drain(Duration::from_secs(timing::STOP_TIMEOUT_SECS))
        .await;

    Ok(host
        .finished
        .or_else(|| intent.is_capture().then_some(CaptureResult::Cancelled)))
}

/// Read terminal events on a thread and hand them to the event loop
///
/// The thread exits once the receiving side is gone.
fn spawn_input_reader() -> UnboundedReceiver<Event> {
    let (sender, receiver) = unbounded_channel();
    std::thread::spawn(move || read_input(sender));
    receiver
}

fn read_input(sender: UnboundedSender<Event>) {
    while !sender.is_closed() {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read terminal event");
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Failed to poll terminal events");
                break;
            }
        }
    }
    debug!("Input reader stopped");
}

fn is_key_press(event: &Event) -> bool {
    matches!(event, Event::Key(key) if key.kind == KeyEventKind::Press)
}

#[derive(Debug)]
enum InputAction {
    Messages(Vec<Message>),
    Quit,
}

/// Translate a terminal event into controller input
fn input_messages(event: &Event, preview_area: Rect) -> InputAction {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key_messages(key),
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            let messages = relative_position(preview_area, mouse.column, mouse.row)
                .map(|(x, y)| vec![Message::PreviewTapped { x, y }])
                .unwrap_or_default();
            InputAction::Messages(messages)
        }
        _ => InputAction::Messages(Vec::new()),
    }
}

fn key_messages(key: &KeyEvent) -> InputAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return InputAction::Quit;
    }

    let messages = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return InputAction::Quit,
        KeyCode::Char(' ') | KeyCode::Enter => vec![Message::Shutter],
        // Terminals do not report releases, so a press is a full click
        KeyCode::Char('k') => vec![
            Message::KeyDown(Key::Camera),
            Message::KeyUp(Key::Camera),
        ],
        KeyCode::Char('f') => vec![Message::ToggleFlash],
        KeyCode::Char('c') => vec![Message::ToggleCamera],
        KeyCode::Char('m') => vec![Message::TogglePhotoVideo],
        KeyCode::Char('g') => vec![Message::ShowLastMedia],
        KeyCode::Char('s') => vec![Message::OpenSettings],
        KeyCode::Char('r') => vec![Message::ChangeResolution],
        KeyCode::Left => vec![Message::AccelerometerSample(GRAVITY)],
        KeyCode::Right => vec![Message::AccelerometerSample(-GRAVITY)],
        KeyCode::Up | KeyCode::Down => vec![Message::AccelerometerSample(0.0)],
        _ => Vec::new(),
    };
    InputAction::Messages(messages)
}

/// Position of a cell inside `area` as 0.0-1.0 coordinates
fn relative_position(area: Rect, column: u16, row: u16) -> Option<(f32, f32)> {
    let inside = column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height;
    if !inside {
        return None;
    }
    let x = (column - area.x) as f32 / area.width.max(1) as f32;
    let y = (row - area.y) as f32 / area.height.max(1) as f32;
    Some((x, y))
}

/// Receives the controller's requests to the screen
#[derive(Debug, Default)]
struct TerminalHost {
    notices: Vec<(Notice, Instant)>,
    settings_open: bool,
    keep_screen_on: bool,
    finished: Option<CaptureResult>,
}

impl TerminalHost {
    fn expire_notices(&mut self) {
        self.notices
            .retain(|(_, shown)| shown.elapsed() < timing::NOTICE_DURATION);
    }
}

impl Host for TerminalHost {
    fn handle(&mut self, request: HostRequest) {
        match request {
            HostRequest::ShowNotice(notice) => self.notices.push((notice, Instant::now())),
            HostRequest::Finish(result) => self.finished = Some(result),
            HostRequest::OpenSettings => self.settings_open = true,
            HostRequest::KeepScreenOn(on) => {
                debug!(on, "Keep screen on");
                self.keep_screen_on = on;
            }
        }
    }
}

/// Everything drawn each frame
struct Screen {
    frames: FrameSlot,
    frame: FrameWidget,
    /// Where the preview was drawn last, for mapping clicks
    preview_area: Rect,
}

impl Screen {
    fn new(frames: FrameSlot) -> Self {
        Self {
            frames,
            frame: FrameWidget::default(),
            preview_area: Rect::default(),
        }
    }

    /// Pick up the newest preview frame
    fn refresh(&mut self) {
        if let Ok(slot) = self.frames.lock() {
            self.frame.image = slot.clone();
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>, model: &AppModel, host: &TerminalHost) {
        let area = f.area();
        let controls = &model.controls;

        // Reserve bottom line for the controls bar
        let camera_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        self.preview_area = camera_area;
        f.render_widget(&self.frame, camera_area);

        if let Some(marker) = &controls.focus {
            f.render_widget(
                FocusWidget {
                    x: marker.x,
                    y: marker.y,
                    color: parse_color(&controls.focus_color).unwrap_or(Color::Yellow),
                },
                camera_area,
            );
        }

        if controls.timer_visible {
            let text = format!(" ● {} ", controls.timer_text);
            let width = text.chars().count() as u16;
            let timer_area = Rect {
                x: area.x + area.width.saturating_sub(width) / 2,
                y: area.y,
                width: width.min(area.width),
                height: 1,
            };
            f.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::White).bg(Color::Red)),
                timer_area,
            );
        }

        let notices = host.notices.len() as u16;
        for (row, (notice, _)) in host.notices.iter().enumerate() {
            let notice_area = Rect {
                x: area.x,
                y: camera_area.height.saturating_sub(notices) + row as u16,
                width: area.width,
                height: 1,
            };
            f.render_widget(
                Paragraph::new(notice.to_string())
                    .style(Style::default().fg(Color::Black).bg(Color::Gray)),
                notice_area,
            );
        }

        let status_area = Rect {
            x: area.x,
            y: area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };
        f.render_widget(ControlsBar { controls }, status_area);

        if host.settings_open {
            draw_settings(f, model);
        }
    }
}

fn draw_settings(f: &mut ratatui::Frame<'_>, model: &AppModel) {
    let area = f.area();
    let popup = Rect {
        x: area.width / 4,
        y: area.height / 4,
        width: area.width / 2,
        height: area.height / 2,
    };

    let config = &model.config;
    let location = model
        .config_handler
        .as_ref()
        .map(|handler| handler.path().display().to_string())
        .unwrap_or_else(|| "not saved".to_string());
    let text = format!(
        "Save folder: {}\nReview app: {}\nLast camera: {:?}\nFlash: {:?}\nAccent: {}\n\n{}\n\nPress any key to close",
        config.save_folder_name,
        config.review_app.as_deref().unwrap_or("default"),
        config.last_used_camera,
        config.flashlight_state,
        config.primary_color,
        location,
    );

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Settings ")),
        popup,
    );
}

/// Widget that renders a preview frame using half-block characters
#[derive(Default)]
struct FrameWidget {
    image: Option<image::RgbaImage>,
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = &self.image else {
            // No frame - show placeholder
            let msg = "Camera unavailable";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let (display_width, display_height) = fit(width, height, area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                let src_top = ((ty as f64 * 2.0 * y_scale) as u32).min(height - 1);
                let src_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(height - 1);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(pixel_color(image, src_x, src_top));
                    cell.set_bg(pixel_color(image, src_x, src_bottom));
                }
            }
        }
    }
}

/// Largest cell size showing a `width`x`height` image undistorted in `area`
fn fit(width: u32, height: u32, area: Rect) -> (u16, u16) {
    let aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = area.height as f64 * 2.0;

    if term_width / term_height > aspect {
        // Terminal is wider - fit to height
        ((term_height * aspect) as u16, area.height)
    } else {
        // Terminal is taller - fit to width
        (area.width, (term_width / aspect / 2.0) as u16)
    }
}

fn pixel_color(image: &image::RgbaImage, x: u32, y: u32) -> Color {
    let [r, g, b, _] = image.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Parse a `#rrggbb` colour
fn parse_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Focus marker at relative preview coordinates
struct FocusWidget {
    x: f32,
    y: f32,
    color: Color,
}

impl Widget for FocusWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 || area.height == 0 {
            return;
        }
        let column = area.x + ((self.x * area.width as f32) as u16).min(area.width - 1);
        let row = area.y + ((self.y * area.height as f32) as u16).min(area.height - 1);
        let left = column.saturating_sub(1).max(area.x);
        buf.set_string(
            left,
            row,
            "[+]",
            Style::default().fg(self.color).add_modifier(Modifier::BOLD),
        );
    }
}

/// Bottom bar with every control the controller exposes
struct ControlsBar<'a> {
    controls: &'a Controls,
}

impl ControlsBar<'_> {
    fn items(&self) -> Vec<(Control, String)> {
        let controls = self.controls;
        let arrow = match controls.rotation {
            90 => "↺",
            -90 | 270 => "↻",
            _ => "",
        };

        let shutter = match controls.shutter_icon {
            ShutterIcon::Shutter => "( o )",
            ShutterIcon::VideoRec => "( ● )",
            ShutterIcon::VideoStop => "( ■ )",
        };
        let mode = match controls.mode_toggle_icon {
            ModeToggleIcon::Video => "[m] video",
            ModeToggleIcon::Camera => "[m] photo",
        };
        let flash = match controls.flash_icon {
            FlashState::Off => "off",
            FlashState::On => "on",
            FlashState::Auto => "auto",
        };
        let resolution = controls
            .resolution
            .map(|(w, h)| format!("[r] {}x{}", w, h))
            .unwrap_or_else(|| "[r] res".to_string());
        let thumbnail = if controls.thumbnail.is_some() {
            "[g] last"
        } else {
            "[g] --"
        };

        vec![
            (Control::Settings, format!("[s]{}", arrow)),
            (Control::ModeToggle, mode.to_string()),
            (Control::ChangeResolution, resolution),
            (Control::LastMedia, thumbnail.to_string()),
            (Control::Shutter, shutter.to_string()),
            (
                Control::CameraToggle,
                format!("[c] {:?}", controls.camera_toggle_icon).to_lowercase(),
            ),
            (Control::Flash, format!("[f] flash {}", flash)),
        ]
    }
}

impl Widget for ControlsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let mut x = area.x + 1;
        for (control, label) in self.items() {
            if !self.controls.is_visible(control) {
                continue;
            }
            let alpha = self.controls.alpha(control);
            if alpha == ui::HIDDEN {
                continue;
            }
            let fg = if alpha < ui::OPAQUE {
                Color::Gray
            } else {
                Color::White
            };
            let remaining = (area.x + area.width).saturating_sub(x) as usize;
            if remaining == 0 {
                break;
            }
            let text: String = label.chars().take(remaining).collect();
            buf.set_string(x, area.y, &text, Style::default().fg(fg).bg(Color::DarkGray));
            x += text.chars().count() as u16 + 2;
        }
    }
}
