//! Gesture CLI - Command-line interface for Synheart Gesture
//!
//! Commands:
//! - replay: Run recorded landmark frames through the detectors (batch mode)
//! - live: Capture from a camera until stopped, then save the session (feature `camera`)
//! - doctor: Diagnose configuration, inputs and capture support
//! - schema: Print input, output or configuration schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use synheart_gesture::pipeline::{parse_recording, GestureProcessor};
use synheart_gesture::types::{GestureKind, GestureSnapshot, SessionStats};
use synheart_gesture::{RecognitionError, RecognizerConfig, GESTURE_VERSION, PRODUCER_NAME};

/// Gesture - On-device gesture and posture signals from live video
#[derive(Parser)]
#[command(name = "gesture")]
#[command(author = "Synheart AI Inc")]
#[command(version = GESTURE_VERSION)]
#[command(
    about = "Detect conversational gestures from face, hand and pose landmarks",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded landmark frames (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path for per-frame snapshots (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Frame width the landmarks were normalized against
        #[arg(long)]
        width: Option<u32>,

        /// Frame height the landmarks were normalized against
        #[arg(long)]
        height: Option<u32>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save session statistics to file after processing
        #[arg(long)]
        save_stats: Option<PathBuf>,

        /// Print a session summary to stderr
        #[arg(long)]
        summary: bool,
    },

    /// Capture from a camera until Enter is pressed or the duration elapses
    #[cfg(feature = "camera")]
    Live {
        /// Camera index
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Recorded landmark frames to replay against the live frames (looped)
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Where to save the final session statistics
        #[arg(long, default_value = synheart_gesture::report::DEFAULT_REPORT_FILE)]
        save_stats: PathBuf,
    },

    /// Diagnose configuration, inputs and capture support
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a landmark recording
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON (schema for input/output, defaults for config)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
    /// Detect from the first character
    Auto,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
    /// JSON array of snapshots
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Landmark frame input
    Input,
    /// Per-frame gesture snapshot output
    Output,
    /// Recognizer configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), GestureCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            width,
            height,
            config,
            save_stats,
            summary,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            output_format,
            width,
            height,
            config.as_deref(),
            save_stats.as_deref(),
            summary,
        ),
        #[cfg(feature = "camera")]
        Commands::Live {
            camera,
            duration,
            config,
            landmarks,
            save_stats,
        } => live::cmd_live(
            camera,
            duration,
            config.as_deref(),
            landmarks.as_deref(),
            &save_stats,
        ),
        Commands::Doctor {
            config,
            landmarks,
            json,
        } => cmd_doctor(config.as_deref(), landmarks.as_deref(), json),
        Commands::Schema { schema_type, json } => cmd_schema(schema_type, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<RecognizerConfig, GestureCliError> {
    match path {
        Some(path) => Ok(RecognizerConfig::load(path)?),
        None => Ok(RecognizerConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, GestureCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    width: Option<u32>,
    height: Option<u32>,
    config_path: Option<&Path>,
    save_stats: Option<&Path>,
    summary: bool,
) -> Result<(), GestureCliError> {
    let mut config = load_config(config_path)?;
    if let Some(width) = width {
        config.capture.width = width;
    }
    if let Some(height) = height {
        config.capture.height = height;
    }
    config.validate()?;

    let input_data = read_input(input)?;
    let frames = match input_format {
        InputFormat::Ndjson => synheart_gesture::landmarks::parse_ndjson(&input_data)?,
        InputFormat::Json => synheart_gesture::landmarks::parse_array(&input_data)?,
        InputFormat::Auto => parse_recording(&input_data)?,
    };
    if frames.is_empty() {
        return Err(GestureCliError::NoFrames);
    }

    let mut processor = GestureProcessor::with_config(config);
    let snapshots: Vec<GestureSnapshot> = frames.iter().map(|f| processor.process(f)).collect();
    tracing::info!(frames = snapshots.len(), "replay complete");

    if let Some(path) = save_stats {
        processor.save_stats(path)?;
    }
    if summary {
        eprint!("{}", format_summary(&processor.stats()));
    }

    let output_data = format_output(&snapshots, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

#[cfg(feature = "camera")]
mod live {
    use std::fs;
    use std::io::{self, BufRead};
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use synheart_gesture::capture::CameraFactory;
    use synheart_gesture::landmarks::{LandmarkSource, NoLandmarks};
    use synheart_gesture::{GestureRecognizer, ReplayLandmarkSource};

    use super::{format_summary, load_config, GestureCliError};

    pub(super) fn cmd_live(
        camera: u32,
        duration: Option<u64>,
        config_path: Option<&Path>,
        landmarks_path: Option<&Path>,
        save_stats: &Path,
    ) -> Result<(), GestureCliError> {
        let config = load_config(config_path)?;

        let landmarks: Arc<dyn LandmarkSource> = match landmarks_path {
            Some(path) => {
                let recording = fs::read_to_string(path)?;
                Arc::new(ReplayLandmarkSource::from_ndjson(&recording)?.looping())
            }
            None => {
                tracing::warn!("no landmark source configured, gestures will not be detected");
                Arc::new(NoLandmarks)
            }
        };

        let factory = Arc::new(CameraFactory::new(config.capture.clone()));
        let recognizer = GestureRecognizer::new(config, factory, landmarks);
        recognizer.start(camera)?;

        match duration {
            Some(seconds) => {
                eprintln!("Capturing for {seconds}s...");
                thread::sleep(Duration::from_secs(seconds));
            }
            None => {
                eprintln!("Capturing, press Enter to stop...");
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
            }
        }

        recognizer.stop();
        recognizer.persist_session_stats(save_stats)?;

        eprint!("{}", format_summary(&recognizer.session_stats()));
        eprintln!("Session saved to {}", save_stats.display());
        Ok(())
    }
}

fn cmd_doctor(
    config: Option<&Path>,
    landmarks: Option<&Path>,
    json: bool,
) -> Result<(), GestureCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck::ok(
        "gesture_version",
        format!("Gesture version {}", GESTURE_VERSION),
    ));

    if let Some(path) = config {
        checks.push(match RecognizerConfig::load(path) {
            Ok(config) => DoctorCheck::ok(
                "config",
                format!(
                    "Config valid ({}x{} @ {} fps, jpeg quality {})",
                    config.capture.width,
                    config.capture.height,
                    config.capture.fps,
                    config.jpeg_quality
                ),
            ),
            Err(e) => DoctorCheck::error("config", format!("Invalid config: {}", e)),
        });
    }

    if let Some(path) = landmarks {
        let check = if !path.exists() {
            DoctorCheck::warning("landmarks", "Landmark recording does not exist".to_string())
        } else {
            match fs::read_to_string(path)
                .map_err(RecognitionError::from)
                .and_then(|content| parse_recording(&content))
            {
                Ok(frames) => {
                    let with_face = frames.iter().filter(|f| f.face.is_some()).count();
                    let with_hands = frames.iter().filter(|f| !f.hands.is_empty()).count();
                    let with_pose = frames.iter().filter(|f| f.pose.is_some()).count();
                    DoctorCheck::ok(
                        "landmarks",
                        format!(
                            "{} frames ({} with face, {} with hands, {} with pose)",
                            frames.len(),
                            with_face,
                            with_hands,
                            with_pose
                        ),
                    )
                }
                Err(e) => DoctorCheck::error("landmarks", format!("Invalid recording: {}", e)),
            }
        };
        checks.push(check);
    }

    checks.push(camera_check());

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck::ok("stdin", "stdin is a TTY (interactive mode)".to_string())
    } else {
        DoctorCheck::ok("stdin", "stdin is a pipe (replay from - ready)".to_string())
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: GESTURE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Gesture Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(GestureCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

#[cfg(feature = "camera")]
fn camera_check() -> DoctorCheck {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) if cameras.is_empty() => {
            DoctorCheck::warning("camera", "No cameras found".to_string())
        }
        Ok(cameras) => {
            let names: Vec<String> = cameras
                .iter()
                .map(|cam| format!("{}: {}", cam.index(), cam.human_name()))
                .collect();
            DoctorCheck::ok("camera", format!("Cameras: {}", names.join(", ")))
        }
        Err(e) => DoctorCheck::error("camera", format!("Camera query failed: {}", e)),
    }
}

#[cfg(not(feature = "camera"))]
fn camera_check() -> DoctorCheck {
    DoctorCheck::warning(
        "camera",
        "Built without the camera feature; only replay is available".to_string(),
    )
}

fn cmd_schema(schema_type: SchemaType, json: bool) -> Result<(), GestureCliError> {
    match schema_type {
        SchemaType::Input => {
            if json {
                println!("{}", input_json_schema());
            } else {
                println!("Input: landmark frames (one per line, or a JSON array)");
                println!();
                println!("Each frame may contain any of:");
                println!("- face: [{{ x, y, z? }}, ...]  468/478 point face mesh");
                println!("- hands: [{{ side: left|right, landmarks: [{{ x, y, z? }}, ...] }}]");
                println!("  21 points per hand");
                println!("- pose: [{{ x, y, z? }}, ...]  33 point body pose");
                println!();
                println!("Coordinates are normalized to the frame (0..1, y grows downward).");
                println!("A missing modality disables the detectors that depend on it.");
            }
        }
        SchemaType::Output => {
            if json {
                println!("{}", output_json_schema());
            } else {
                println!("Output: one gesture snapshot per frame");
                println!();
                println!("- smile, eye_contact, head_nod, thumbs_up: bool");
                println!("- wave, thinking, nervous: bool");
                println!("- posture: confident | slouching | unknown");
                println!();
                println!("Session statistics (--save-stats):");
                println!("- duration_seconds, total_frames, fps");
                println!("- gestures_detected: {{ <gesture>: count }}");
                println!("- gesture_rates: {{ <gesture>: count per minute }}");
                println!("- timestamp, session_id, started_at");
                println!("- producer: {{ name, version, instance_id }}");
                println!();
                let names: Vec<&str> = GestureKind::ALL.iter().map(|k| k.as_str()).collect();
                println!("Gestures: {}", names.join(", "));
            }
        }
        SchemaType::Config => {
            let defaults = RecognizerConfig::default();
            if json {
                println!("{}", defaults.to_json()?);
            } else {
                println!("Configuration (JSON, every field optional):");
                println!();
                println!("- capture: {{ width, height, fps, mirror }}");
                println!("- cycle_pause_ms: {}", defaults.cycle_pause_ms);
                println!("- stream_interval_ms: {}", defaults.stream_interval_ms);
                println!("- jpeg_quality: {}", defaults.jpeg_quality);
                println!("- overlay: {{ enabled, alpha }}");
                println!("- buffers: {{ history_capacity, position_capacity, fidget_window }}");
                println!("- thresholds: detector thresholds (see --json for defaults)");
            }
        }
    }

    Ok(())
}

// Helper functions

fn format_output(
    snapshots: &[GestureSnapshot],
    format: &OutputFormat,
) -> Result<String, GestureCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for snapshot in snapshots {
                lines.push(serde_json::to_string(snapshot)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(snapshots)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(snapshots)?),
    }
}

fn format_summary(stats: &SessionStats) -> String {
    let mut out = String::new();
    out.push_str("Session Summary\n");
    out.push_str("===============\n");
    out.push_str(&format!("Duration:     {:.1}s\n", stats.duration_seconds));
    out.push_str(&format!("Total frames: {}\n", stats.total_frames));
    out.push_str(&format!("Average FPS:  {:.1}\n", stats.fps));
    out.push_str("\nGestures detected:\n");
    for (kind, count) in stats.gestures_detected.iter() {
        out.push_str(&format!(
            "  {:<18} {:>6}  ({:.1}/min)\n",
            kind.label(),
            count,
            stats.gesture_rates.get(kind)
        ));
    }
    out
}

fn input_json_schema() -> String {
    let point = serde_json::json!({
        "type": "object",
        "required": ["x", "y"],
        "properties": {
            "x": { "type": "number" },
            "y": { "type": "number" },
            "z": { "type": "number" }
        }
    });
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Landmark frame",
        "type": "object",
        "properties": {
            "face": { "type": "array", "items": point },
            "hands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["side", "landmarks"],
                    "properties": {
                        "side": { "type": "string", "enum": ["left", "right"] },
                        "landmarks": { "type": "array", "items": point }
                    }
                }
            },
            "pose": { "type": "array", "items": point }
        }
    })
    .to_string()
}

fn output_json_schema() -> String {
    let flag = serde_json::json!({ "type": "boolean" });
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Gesture snapshot",
        "type": "object",
        "required": [
            "smile", "eye_contact", "head_nod", "thumbs_up",
            "wave", "thinking", "posture", "nervous"
        ],
        "properties": {
            "smile": flag,
            "eye_contact": flag,
            "head_nod": flag,
            "thumbs_up": flag,
            "wave": flag,
            "thinking": flag,
            "posture": { "type": "string", "enum": ["confident", "slouching", "unknown"] },
            "nervous": flag
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum GestureCliError {
    Io(io::Error),
    Recognition(RecognitionError),
    Json(serde_json::Error),
    NoFrames,
    DoctorFailed,
}

impl From<io::Error> for GestureCliError {
    fn from(e: io::Error) -> Self {
        GestureCliError::Io(e)
    }
}

impl From<RecognitionError> for GestureCliError {
    fn from(e: RecognitionError) -> Self {
        GestureCliError::Recognition(e)
    }
}

impl From<serde_json::Error> for GestureCliError {
    fn from(e: serde_json::Error) -> Self {
        GestureCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GestureCliError> for CliError {
    fn from(e: GestureCliError) -> Self {
        match e {
            GestureCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GestureCliError::Recognition(e) => {
                let (code, hint) = match &e {
                    RecognitionError::DeviceUnavailable { .. } => (
                        "DEVICE_UNAVAILABLE",
                        "Run 'gesture doctor' to list cameras",
                    ),
                    RecognitionError::InvalidLandmarks(_) => (
                        "INVALID_LANDMARKS",
                        "Run 'gesture schema input' for the frame format",
                    ),
                    RecognitionError::Config(_) => (
                        "CONFIG_ERROR",
                        "Run 'gesture schema config --json' for a valid example",
                    ),
                    RecognitionError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    _ => ("RECOGNITION_ERROR", "Re-run with -v for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GestureCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GestureCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No landmark frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            GestureCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use synheart_gesture::types::FrameSize;

    #[test]
    fn test_format_output_ndjson() {
        let snapshots = vec![GestureSnapshot::default(); 2];
        let output = format_output(&snapshots, &OutputFormat::Ndjson).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_summary_lists_every_gesture() {
        let processor = GestureProcessor::new();
        let summary = format_summary(&processor.stats());
        for kind in GestureKind::ALL {
            assert!(summary.contains(kind.label()));
        }
    }

    #[test]
    fn test_error_codes() {
        let err = CliError::from(GestureCliError::Recognition(
            RecognitionError::DeviceUnavailable {
                index: 3,
                reason: "busy".to_string(),
            },
        ));
        assert_eq!(err.code, "DEVICE_UNAVAILABLE");
        assert!(err.message.contains('3'));
    }

    #[test]
    fn test_frame_size_default_matches_config() {
        let config = RecognizerConfig::default();
        assert_eq!(
            FrameSize::new(config.capture.width, config.capture.height),
            FrameSize::default()
        );
    }
}
