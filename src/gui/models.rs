use std::fs;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use eframe::egui::TextureHandle;
use tracing::Level;

use crate::core::params::PipelineParams;
use crate::core::processing::cache::ResultCache;
use crate::core::processing::pipeline::Pipeline;
use crate::error::{Error, Result};
use crate::gui::logging::LogEntry;
use crate::remover::{BackgroundRemover, U2NetRemover};
use crate::types::{FixedImage, Stage};

pub const PRESET_EXTENSION: &str = "cowwy";

/// Sent from the worker thread to the window.
pub enum PipelineEvent {
    Stage(Stage),
    /// The error side carries the user-facing message only.
    Finished(std::result::Result<FixedImage, String>),
}

/// Textures for the side-by-side view of the last result.
pub struct Comparison {
    pub original: TextureHandle,
    pub processed: TextureHandle,
}

pub struct CowwyGui {
    pub params: PipelineParams,
    pub cache: Arc<ResultCache>,
    /// `None` when the model could not be loaded; see `startup_error`.
    pub pipeline: Option<Arc<Pipeline>>,
    pub startup_error: Option<String>,
    pub default_image_checked: bool,

    // Current job
    pub source_label: Option<String>,
    pub stage: Option<Stage>,
    pub is_processing: bool,
    pub processing_start_time: Option<Instant>,
    pub event_receiver: Option<Receiver<PipelineEvent>>,

    // Last outcome
    pub result: Option<FixedImage>,
    pub comparison: Option<Comparison>,
    pub error_message: Option<String>,
    pub info_message: Option<String>,

    // Log panel
    pub show_logs: bool,
    pub min_log_level: Level,
    pub log_messages: Arc<Mutex<Vec<LogEntry>>>,
}

impl CowwyGui {
    /// Build the window state, loading the U2-Net model named by `params`.
    /// A model failure is kept for display rather than aborting start-up.
    pub fn new(params: PipelineParams) -> Self {
        let cache = Arc::new(ResultCache::with_capacity(params.cache_capacity));
        let mut gui = Self::empty(params, cache);
        match build_pipeline(&gui.params, gui.cache.clone()) {
            Ok(pipeline) => gui.pipeline = Some(Arc::new(pipeline)),
            Err(e) => {
                tracing::error!("Failed to start pipeline: {}", e);
                gui.startup_error = Some(e.user_message());
            }
        }
        gui
    }

    /// Window state around an already built remover.
    pub fn with_remover(params: PipelineParams, remover: Arc<dyn BackgroundRemover>) -> Result<Self> {
        let cache = Arc::new(ResultCache::with_capacity(params.cache_capacity));
        let pipeline = Pipeline::new(params.clone(), remover, cache.clone())?;
        let mut gui = Self::empty(params, cache);
        gui.pipeline = Some(Arc::new(pipeline));
        Ok(gui)
    }

    fn empty(params: PipelineParams, cache: Arc<ResultCache>) -> Self {
        Self {
            params,
            cache,
            pipeline: None,
            startup_error: None,
            default_image_checked: false,
            source_label: None,
            stage: None,
            is_processing: false,
            processing_start_time: None,
            event_receiver: None,
            result: None,
            comparison: None,
            error_message: None,
            info_message: None,
            show_logs: false,
            min_log_level: Level::INFO,
            log_messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Status line text: the error if the last run failed, else the stage.
    pub fn status_text(&self) -> Option<String> {
        if let Some(error) = &self.error_message {
            return Some(error.clone());
        }
        if let Some(error) = &self.startup_error {
            return Some(error.clone());
        }
        self.stage
            .map(|stage| stage.to_string())
            .or_else(|| self.info_message.clone())
    }

    pub fn save_preset(&self) -> Result<()> {
        let Some(save_path) = rfd::FileDialog::new()
            .add_filter("Cowwy Preset files", &[PRESET_EXTENSION])
            .set_file_name(format!("cowwy_preset.{}", PRESET_EXTENSION))
            .save_file()
        else {
            return Ok(());
        };

        fs::write(&save_path, self.params.to_preset_string()?)?;
        tracing::info!("Preset saved to: {:?}", save_path);
        Ok(())
    }

    /// Replace the parameters from a preset file. The pipeline is rebuilt and
    /// the cache cleared since cached results depend on the old parameters.
    pub fn load_preset(&mut self) -> Result<()> {
        let Some(load_path) = rfd::FileDialog::new()
            .add_filter("Cowwy Preset files", &[PRESET_EXTENSION])
            .pick_file()
        else {
            return Ok(());
        };

        let content = fs::read_to_string(&load_path)?;
        let params = PipelineParams::from_preset_str(&content)?;
        self.apply_params(params)?;
        tracing::info!("Preset loaded from: {:?}", load_path);
        Ok(())
    }

    pub fn apply_params(&mut self, params: PipelineParams) -> Result<()> {
        let remover: Arc<dyn BackgroundRemover> = match &self.pipeline {
            Some(pipeline) if pipeline.params().model_path == params.model_path => {
                pipeline.remover().clone()
            }
            _ => Arc::new(U2NetRemover::load(&params.model_path)?),
        };

        let cache = Arc::new(ResultCache::with_capacity(params.cache_capacity));
        let pipeline = Pipeline::new(params.clone(), remover, cache.clone())?;
        self.cache.clear();
        self.cache = cache;
        self.pipeline = Some(Arc::new(pipeline));
        self.params = params;
        self.startup_error = None;
        Ok(())
    }

    pub fn save_logs_to_file(&self) -> Result<()> {
        let logs = self
            .log_messages
            .lock()
            .map_err(|_| Error::processing("log buffer poisoned"))?;
        if logs.is_empty() {
            return Ok(());
        }

        let Some(save_path) = rfd::FileDialog::new()
            .add_filter("Log files", &["log"])
            .set_file_name("cowwy.log")
            .save_file()
        else {
            return Ok(());
        };

        let mut content = format!("=== Cowwy Log File ===\nGenerated: {}\n\n", chrono::Utc::now().to_rfc3339());
        for entry in logs.iter() {
            content.push_str(&format!(
                "[{}] {} {}: {}\n",
                entry.timestamp, entry.level, entry.target, entry.message
            ));
        }
        fs::write(&save_path, content)?;
        tracing::info!("Logs saved to: {:?} ({} entries)", save_path, logs.len());
        Ok(())
    }
}

fn build_pipeline(params: &PipelineParams, cache: Arc<ResultCache>) -> Result<Pipeline> {
    let remover = Arc::new(U2NetRemover::load(&params.model_path)?);
    Pipeline::new(params.clone(), remover, cache)
}
