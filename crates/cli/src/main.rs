use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use crossbeam_channel::{select, Receiver};

use facecam_core::detection::domain::face_detector::{DetectionParams, FaceDetector};
use facecam_core::detection::infrastructure::model_resolver::ModelResolver;
use facecam_core::detection::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use facecam_core::device::infrastructure::ffmpeg_camera::FfmpegCameraBackend;
use facecam_core::location::domain::geolocator::resolve_label;
use facecam_core::location::infrastructure::ip_info_geolocator::IpInfoGeolocator;
use facecam_core::pipeline::display_sink::{DisplaySink, NullDisplaySink};
use facecam_core::pipeline::infrastructure::image_file_display_sink::ImageFileDisplaySink;
use facecam_core::pipeline::live_session::{CommandOutcome, LiveSession, SessionParts};
use facecam_core::pipeline::tick_logger::LogTickLogger;
use facecam_core::pipeline::user_command::{parse_color, ParseCommandError, UserCommand};
use facecam_core::rendering::domain::render_state::{
    RenderState, MAX_THICKNESS, MAX_ZOOM, MIN_THICKNESS, MIN_ZOOM,
};
use facecam_core::shared::constants::{
    DEFAULT_STATS_FILE, FACE_MODEL_NAME, FACE_MODEL_URL, SECONDARY_POLL_FPS, UNKNOWN_LOCATION,
};
use facecam_core::stats::domain::stats_store::StatsStore;
use facecam_core::stats::infrastructure::json_stats_repository::JsonStatsRepository;
use facecam_core::video::domain::video_writer::{VideoWriter, VideoWriterFactory};
use facecam_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use facecam_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Live camera with face boxes, status overlays, recording and snapshots.
///
/// Commands are read from stdin, one per line; type `help` to list them.
#[derive(Parser)]
#[command(name = "facecam")]
struct Cli {
    /// Directory for recordings and snapshots (persisted in the stats file).
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// JSON file holding counters and the save directory.
    #[arg(long, default_value = DEFAULT_STATS_FILE)]
    stats_file: PathBuf,

    /// Write the live feed and thumbnails as JPEGs into this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Fixed location label instead of an IP lookup.
    #[arg(long, conflicts_with = "no_geolocation")]
    location: Option<String>,

    /// Skip the IP lookup and show an unknown location.
    #[arg(long)]
    no_geolocation: bool,

    /// Face model (ONNX). Downloaded to the cache when omitted.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Ignore faces smaller than this many pixels across.
    #[arg(long)]
    min_face_size: Option<u32>,

    /// Box color as r,g,b.
    #[arg(long, default_value = "0,255,0")]
    color: String,

    /// Box thickness in pixels (1-10).
    #[arg(long, default_value = "2")]
    thickness: u32,

    /// Zoom factor (0.1-2.0); values above 1.0 crop the centre.
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Start with the grayscale filter on.
    #[arg(long)]
    grayscale: bool,

    /// Start with the FPS counter hidden.
    #[arg(long)]
    hide_fps: bool,

    /// Start with box coordinates shown.
    #[arg(long)]
    show_coords: bool,

    /// Keep snapshots in color instead of black and white.
    #[arg(long)]
    color_snapshots: bool,

    /// Start the camera immediately.
    #[arg(long)]
    autostart: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let detector = build_detector(&cli)?;
    let render_state = build_render_state(&cli)?;
    let location = resolve_location(&cli);
    log::info!("Location: {location}");

    let mut stats = StatsStore::load(Box::new(JsonStatsRepository::new(&cli.stats_file)));
    if let Some(dir) = &cli.save_dir {
        stats.set_save_path(dir.clone());
    }

    let sink: Box<dyn DisplaySink> = match &cli.preview_dir {
        Some(dir) => {
            log::info!("Writing preview frames to {}", dir.display());
            Box::new(ImageFileDisplaySink::new(dir.clone()))
        }
        None => Box::new(NullDisplaySink),
    };
    let writer_factory: VideoWriterFactory =
        Box::new(|| Box::new(FfmpegWriter::new()) as Box<dyn VideoWriter>);

    let mut session = LiveSession::open(
        SessionParts {
            backend: Rc::new(FfmpegCameraBackend::new()),
            detector,
            detection_params: DetectionParams::default()
                .with_min_size(cli.min_face_size.map(|s| (s, s))),
            writer_factory,
            image_writer: Box::new(ImageFileWriter::new()),
            sink,
            logger: Box::new(LogTickLogger::new()),
            stats,
            render_state,
            location,
            desaturate_snapshots: !cli.color_snapshots,
        },
        Local::now(),
    )?;

    if cli.autostart {
        apply_command(&mut session, UserCommand::StartCamera);
    }
    eprintln!("Type `help` for commands.");

    run_loop(&mut session)?;
    session.shutdown(Local::now());
    Ok(())
}

/// Multiplexes ticks, stdin commands and Ctrl-C on this thread. Only this
/// thread touches the session.
fn run_loop(session: &mut LiveSession) -> Result<(), Box<dyn std::error::Error>> {
    let (interrupt_tx, interrupt_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })?;

    let mut commands = spawn_stdin_reader();
    let mut interval = session.frame_interval();
    let mut ticker = crossbeam_channel::tick(interval);
    let secondary_ticker =
        crossbeam_channel::tick(Duration::from_secs_f64(1.0 / SECONDARY_POLL_FPS));

    loop {
        let mut stdin_closed = false;
        select! {
            recv(ticker) -> _ => {
                session.tick(Local::now());
            }
            recv(secondary_ticker) -> _ => {
                session.poll_secondary();
            }
            recv(commands) -> line => match line {
                Ok(line) => {
                    if handle_line(session, &line) {
                        break;
                    }
                }
                Err(_) => stdin_closed = true,
            },
            recv(interrupt_rx) -> _ => {
                log::info!("Interrupted, shutting down");
                break;
            }
        }

        if stdin_closed {
            log::debug!("stdin closed, no further commands");
            commands = crossbeam_channel::never();
        }

        let current = session.frame_interval();
        if current != interval {
            log::debug!("Tick interval now {:.1} ms", current.as_secs_f64() * 1000.0);
            interval = current;
            ticker = crossbeam_channel::tick(interval);
        }
    }
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read command: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// Parses and applies one command line. Returns `true` on quit.
fn handle_line(session: &mut LiveSession, line: &str) -> bool {
    match line.parse::<UserCommand>() {
        Ok(command) => apply_command(session, command),
        Err(ParseCommandError::Empty) => false,
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn apply_command(session: &mut LiveSession, command: UserCommand) -> bool {
    match session.apply(command, Local::now()) {
        Ok(CommandOutcome::Message(message)) => {
            println!("{message}");
            false
        }
        Ok(CommandOutcome::Quit) => true,
        Err(e) => {
            eprintln!("Error: {e}");
            false
        }
    }
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {FACE_MODEL_NAME}");
            ModelResolver::new(bundled_models_dir())?.resolve(FACE_MODEL_NAME, FACE_MODEL_URL)?
        }
    };
    Ok(Box::new(OnnxFaceDetector::new(&model_path, cli.confidence)?))
}

/// `models/` next to the executable, for packaged builds.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
}

fn build_render_state(cli: &Cli) -> Result<RenderState, Box<dyn std::error::Error>> {
    let mut state = RenderState::default();
    state.set_rect_color(parse_color(&cli.color)?);
    state.set_rect_thickness(cli.thickness);
    state.set_zoom_factor(cli.zoom);
    state.set_grayscale(cli.grayscale);
    state.set_show_fps(!cli.hide_fps);
    state.set_show_coordinates(cli.show_coords);
    Ok(state)
}

fn resolve_location(cli: &Cli) -> String {
    if let Some(location) = &cli.location {
        return location.clone();
    }
    if cli.no_geolocation {
        return UNKNOWN_LOCATION.to_string();
    }
    resolve_label(&IpInfoGeolocator::new())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(MIN_THICKNESS..=MAX_THICKNESS).contains(&cli.thickness) {
        return Err(format!(
            "Thickness must be between {MIN_THICKNESS} and {MAX_THICKNESS}, got {}",
            cli.thickness
        )
        .into());
    }
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&cli.zoom) {
        return Err(format!(
            "Zoom must be between {MIN_ZOOM} and {MAX_ZOOM}, got {}",
            cli.zoom
        )
        .into());
    }
    if cli.min_face_size == Some(0) {
        return Err("Minimum face size must be positive".into());
    }
    if let Some(model) = &cli.model {
        if !model.is_file() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    parse_color(&cli.color)?;
    Ok(())
}
