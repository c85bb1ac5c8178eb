//! Ingest progress reporting.
//!
//! The pipeline announces each stage it enters so users see where a
//! multi-second ingest is spending its time (usually `generating`). Progress
//! is emitted on **stderr** so stdout remains parseable for scripts.

use std::fmt;
use std::io::Write;

/// Stage of one ingest run.
///
/// `Idle → Fetching → Extracting → Rendering → Generating → Materializing
/// → Launching → Persisting → Done`. A failure is reported as
/// [`ProgressEvent::Failed`] carrying the stage it happened in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Rendering,
    Generating,
    Materializing,
    Launching,
    Persisting,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Rendering => "rendering",
            Stage::Generating => "generating",
            Stage::Materializing => "materializing",
            Stage::Launching => "launching",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress event for one ingest.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// The pipeline moved into `stage`.
    Entered { url: String, stage: Stage },
    /// The run completed and the catalog entry was written.
    Finished { url: String, workspace: String },
    /// `stage` failed; the run is over.
    Failed {
        url: String,
        stage: Stage,
        code: &'static str,
        message: String,
    },
}

/// Reports ingest progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the ingest pipeline.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "ingest https://…  generating...".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Entered { url, stage } => format!("ingest {}  {}...\n", url, stage),
            ProgressEvent::Finished { url, workspace } => {
                format!("ingest {}  done  {}\n", url, workspace)
            }
            ProgressEvent::Failed {
                url,
                stage,
                code,
                message,
            } => format!("ingest {}  failed while {} [{}]: {}\n", url, stage, code, message),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

fn event_json(event: &ProgressEvent) -> serde_json::Value {
    match event {
        ProgressEvent::Entered { url, stage } => serde_json::json!({
            "event": "progress",
            "url": url,
            "stage": stage.as_str()
        }),
        ProgressEvent::Finished { url, workspace } => serde_json::json!({
            "event": "done",
            "url": url,
            "workspace": workspace
        }),
        ProgressEvent::Failed {
            url,
            stage,
            code,
            message,
        } => serde_json::json!({
            "event": "failed",
            "url": url,
            "stage": stage.as_str(),
            "code": code,
            "message": message
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    /// Build a reporter for this mode. Caller can pass it to the pipeline.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
