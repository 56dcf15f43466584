// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use simple_camera::app::{CaptureIntent, CaptureResult};
use simple_camera::backends::preview::VideoSource;
use simple_camera::terminal::{self, Options};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "simple-camera")]
#[command(about = "Camera with photo and video modes, flash and capture requests")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Use two synthetic test cameras instead of real devices
    #[arg(long, global = true)]
    test_source: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a single photo and print where it was stored
    CaptureImage {
        /// Output file path (default: ~/Pictures/<folder>/IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture a single video and print where it was stored
    CaptureVideo,

    /// List cameras, flash LEDs and audio sources
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let source = if cli.test_source {
        VideoSource::TestPattern
    } else {
        VideoSource::V4l2
    };

    let intent = match cli.command {
        Some(Commands::List) => {
            init_logging(false);
            return cli::list_devices();
        }
        Some(Commands::CaptureImage { output }) => {
            if let Some(path) = &output {
                cli::check_image_output(path)?;
            }
            CaptureIntent::Image { output }
        }
        Some(Commands::CaptureVideo) => CaptureIntent::Video,
        None => CaptureIntent::None,
    };

    // The screen belongs to the UI, logs go to a file
    init_logging(true);

    let result = terminal::run(Options { intent, source })?;
    match result {
        Some(CaptureResult::Ok { uri: Some(uri) }) => println!("{}", uri.path.display()),
        Some(CaptureResult::Ok { uri: None }) => println!("Captured"),
        Some(CaptureResult::Cancelled) => {
            println!("Cancelled");
            std::process::exit(1);
        }
        None => {}
    }

    Ok(())
}

/// Set up tracing
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=simple_camera=debug, RUST_LOG=info
fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_file = to_file.then(log_file_path).flatten().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        None if to_file => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init(),
    }
}

fn log_file_path() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join(simple_camera::app::APP_ID);
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join("simple-camera.log"))
}
