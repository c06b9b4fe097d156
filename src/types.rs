//! Shared types used across the pipeline and the presenter.
//! Includes `ImageSource`, `ProcessingResult`, `FixedImage`,
//! `DownloadArtifact`, and the progress `Stage`.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

/// Where the raw image bytes come from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Bytes submitted by the user. `name` is for logs only and never part of
    /// the cache key.
    Upload { name: String, bytes: Vec<u8> },
    /// Fallback file configured by the operator.
    DefaultPath(PathBuf),
}

impl ImageSource {
    pub fn upload(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageSource::Upload {
            name: name.into(),
            bytes,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ImageSource::Upload { name, .. } => name.clone(),
            ImageSource::DefaultPath(path) => path.display().to_string(),
        }
    }
}

/// Decoded original next to its background-free counterpart.
#[derive(Debug)]
pub struct ProcessingResult {
    /// Full-size decoded input.
    pub original: DynamicImage,
    /// Resized input with background removed (RGBA).
    pub processed: DynamicImage,
}

/// A file offered for download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub const PNG_MIME: &str = "image/png";

/// Successful outcome of one pipeline run.
#[derive(Clone, Debug)]
pub struct FixedImage {
    pub result: Arc<ProcessingResult>,
    pub download: DownloadArtifact,
    pub elapsed: Duration,
    pub from_cache: bool,
}

/// Pipeline progress as shown by the presenter.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Stage {
    Loading,
    Processing,
    Displaying,
    Completed(Duration),
}

impl Stage {
    pub fn percent(&self) -> u8 {
        match self {
            Stage::Loading => 10,
            Stage::Processing => 30,
            Stage::Displaying => 80,
            Stage::Completed(_) => 100,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.percent() as f32 / 100.0
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Loading => write!(f, "Loading image..."),
            Stage::Processing => write!(f, "Processing image..."),
            Stage::Displaying => write!(f, "Displaying results..."),
            Stage::Completed(elapsed) => {
                write!(f, "Completed in {:.2} seconds", elapsed.as_secs_f64())
            }
        }
    }
}

/// Receives stage transitions from the orchestrator.
pub trait ProgressSink {
    fn stage(&mut self, stage: Stage);
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&mut self, _stage: Stage) {}
}

impl ProgressSink for Vec<Stage> {
    fn stage(&mut self, stage: Stage) {
        self.push(stage);
    }
}
