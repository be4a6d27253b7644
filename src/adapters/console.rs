//! Console front end: line commands mapped onto controller operations.
//!
//! ```text
//! capture | c            capture one frame
//! upload <path|url> | u  send a file or remote image
//! auto | manual | toggle switch cycle mode
//! conf <0..1>            set detection confidence
//! iou <0..1>             set IoU threshold
//! poll | p               read the last published detection now
//! status | s             print the cycle state
//! quit | q               stop
//! ```

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::application::{CaptureOutcome, CycleController, PollOutcome};
use crate::domain::{CycleMode, DetectionParams, ImageSource};

pub const HELP: &str = "commands: capture | upload <path|url> | auto | manual | toggle | \
conf <0..1> | iou <0..1> | poll | status | help | quit";

/// Errors produced while reading or running a console command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Capture,
    Upload(String),
    SetMode(CycleMode),
    ToggleMode,
    Confidence(f64),
    Iou(f64),
    Poll,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        let number = |name: &'static str| -> Result<f64, ConsoleError> {
            let raw = arg.ok_or(ConsoleError::MissingArgument(name))?;
            raw.parse::<f64>()
                .map_err(|_| ConsoleError::InvalidNumber(raw.to_string()))
        };

        match verb.as_str() {
            "c" | "capture" => Ok(ConsoleCommand::Capture),
            "u" | "upload" => arg
                .map(|a| ConsoleCommand::Upload(a.to_string()))
                .ok_or(ConsoleError::MissingArgument("upload")),
            "a" | "auto" => Ok(ConsoleCommand::SetMode(CycleMode::Auto)),
            "m" | "manual" => Ok(ConsoleCommand::SetMode(CycleMode::Manual)),
            "t" | "toggle" => Ok(ConsoleCommand::ToggleMode),
            "conf" => number("conf").map(ConsoleCommand::Confidence),
            "iou" => number("iou").map(ConsoleCommand::Iou),
            "p" | "poll" => Ok(ConsoleCommand::Poll),
            "s" | "status" => Ok(ConsoleCommand::Status),
            "h" | "help" | "?" => Ok(ConsoleCommand::Help),
            "q" | "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}

impl ConsoleCommand {
    /// True for commands that wait on a capture or upload request.
    pub fn is_request(&self) -> bool {
        matches!(self, ConsoleCommand::Capture | ConsoleCommand::Upload(_))
    }
}

/// Turns an upload argument into an image source: http(s) URLs are sent
/// by reference, anything else is read from disk.
pub async fn image_source(target: &str) -> Result<ImageSource, ConsoleError> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(ImageSource::Url(target.to_string()));
    }

    let bytes = tokio::fs::read(target).await.map_err(|e| ConsoleError::Io {
        path: target.to_string(),
        reason: e.to_string(),
    })?;
    let file_name = Path::new(target)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string());

    Ok(ImageSource::File { file_name, bytes })
}

/// Runs one command from the input loop. Capture and upload requests run
/// on their own task so the loop keeps reading commands and signals while
/// the backend answers; everything else runs inline.
///
/// Returns `Ok(false)` when the console should stop.
pub async fn submit(
    controller: &Arc<CycleController>,
    command: ConsoleCommand,
) -> Result<bool, ConsoleError> {
    if !command.is_request() {
        return dispatch(controller, command).await;
    }

    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        if let Err(e) = dispatch(&controller, command).await {
            tracing::warn!(error = %e, "console request failed");
        }
    });
    Ok(true)
}

/// Runs one command. Returns `Ok(false)` when the console should stop.
pub async fn dispatch(
    controller: &CycleController,
    command: ConsoleCommand,
) -> Result<bool, ConsoleError> {
    match command {
        ConsoleCommand::Capture => report(controller.capture().await),
        ConsoleCommand::Upload(target) => {
            let source = image_source(&target).await?;
            report(controller.upload(source).await);
        }
        ConsoleCommand::SetMode(mode) => controller.set_mode(mode),
        ConsoleCommand::ToggleMode => {
            controller.toggle_mode();
        }
        ConsoleCommand::Confidence(confidence) => {
            let params = controller.params();
            controller.set_params(DetectionParams::new(confidence, params.iou));
        }
        ConsoleCommand::Iou(iou) => {
            let params = controller.params();
            controller.set_params(DetectionParams::new(params.confidence, iou));
        }
        ConsoleCommand::Poll => match controller.poll_once().await {
            PollOutcome::Applied { timestamp } => tracing::info!(timestamp, "published detection applied"),
            outcome => tracing::info!(?outcome, "nothing new published"),
        },
        ConsoleCommand::Status => {
            let snapshot = controller.snapshot();
            let params = controller.params();
            tracing::info!(
                mode = %snapshot.mode,
                phase = ?snapshot.phase,
                green_remaining = snapshot.green_remaining,
                confidence = params.confidence,
                iou = params.iou,
                polling = controller.is_polling(),
                "cycle status"
            );
        }
        ConsoleCommand::Help => tracing::info!("{}", HELP),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn report(outcome: CaptureOutcome) {
    if outcome == CaptureOutcome::Skipped {
        tracing::info!("a request is already in flight");
    }
}
