use std::sync::mpsc::{self, Sender};
use std::time::Instant;

use eframe::egui;
use image::DynamicImage;
use tracing::{debug, error, info, trace, warn};

use super::models::{Comparison, CowwyGui, PipelineEvent};
use crate::core::processing::decode::SUPPORTED_EXTENSIONS;
use crate::core::processing::resize::resize_within_bound;
use crate::error::Result;
use crate::io::input::upload_from_path;
use crate::io::writers::write_artifact;
use crate::types::{FixedImage, ImageSource, ProgressSink, Stage};

/// Longest side of the on-screen previews.
pub const PREVIEW_MAX_SIDE: u32 = 1024;

pub const NO_IMAGE_MESSAGE: &str = "Please upload an image to get started!";

/// Forwards stages to the window and wakes it up.
struct ChannelProgress {
    sender: Sender<PipelineEvent>,
    ctx: egui::Context,
}

impl ProgressSink for ChannelProgress {
    fn stage(&mut self, stage: Stage) {
        let _ = self.sender.send(PipelineEvent::Stage(stage));
        self.ctx.request_repaint();
    }
}

impl CowwyGui {
    /// First frame: process the configured default image, if one exists.
    pub fn start_with_default(&mut self, ctx: &egui::Context) {
        if self.default_image_checked {
            return;
        }
        self.default_image_checked = true;

        let source = self.pipeline.as_ref().and_then(|p| p.default_source());
        match source {
            Some(source) => self.submit(source, ctx),
            None => {
                debug!("No default image available");
                self.info_message = Some(NO_IMAGE_MESSAGE.to_string());
            }
        }
    }

    pub fn select_upload(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &SUPPORTED_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        info!("Selected upload: {:?}", path);

        let upload = upload_from_path(&path, self.params.max_file_size);
        self.submit_upload(upload, ctx);
    }

    /// Submit a picked file, or show why it was rejected.
    pub fn submit_upload(&mut self, upload: Result<ImageSource>, ctx: &egui::Context) {
        match upload {
            Ok(source) => self.submit(source, ctx),
            Err(e) if !self.is_processing => {
                warn!("Upload rejected: {}", e);
                self.show_failure(e.user_message());
            }
            Err(e) => warn!("Upload rejected while busy: {}", e),
        }
    }

    /// Run the pipeline for `source` on a worker thread. Ignored while a job
    /// is already running.
    pub fn submit(&mut self, source: ImageSource, ctx: &egui::Context) {
        if self.is_processing {
            warn!("Ignoring {}: a job is already running", source.label());
            return;
        }
        let Some(pipeline) = self.pipeline.clone() else {
            let message = self.startup_error.clone().unwrap_or_default();
            self.show_failure(message);
            return;
        };

        self.is_processing = true;
        self.processing_start_time = Some(Instant::now());
        self.error_message = None;
        self.info_message = None;
        self.stage = None;
        self.source_label = Some(source.label());

        let (sender, receiver) = mpsc::channel();
        self.event_receiver = Some(receiver);

        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let mut progress = ChannelProgress {
                sender: sender.clone(),
                ctx: ctx.clone(),
            };
            let outcome = pipeline
                .fix_image(&source, &mut progress)
                .map_err(|e| e.user_message());
            let _ = sender.send(PipelineEvent::Finished(outcome));
            ctx.request_repaint();
        });
        trace!("Worker thread started");
    }

    /// Drain worker events; called once per frame.
    pub fn poll_events(&mut self, ctx: &egui::Context) {
        let mut events = Vec::new();
        if let Some(receiver) = &self.event_receiver {
            while let Ok(event) = receiver.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.handle_event(event, ctx);
        }
    }

    pub fn handle_event(&mut self, event: PipelineEvent, ctx: &egui::Context) {
        match event {
            PipelineEvent::Stage(stage) => self.stage = Some(stage),
            PipelineEvent::Finished(Ok(fixed)) => {
                match build_comparison(ctx, &fixed) {
                    Ok(comparison) => {
                        self.comparison = Some(comparison);
                        self.result = Some(fixed);
                    }
                    Err(e) => {
                        error!("Preview failed: {}", e);
                        self.show_failure(e.user_message());
                    }
                }
                self.finish_job();
            }
            PipelineEvent::Finished(Err(message)) => {
                self.show_failure(message);
                self.finish_job();
            }
        }
    }

    /// Both images and the download go together: on failure none is shown.
    fn show_failure(&mut self, message: String) {
        self.result = None;
        self.comparison = None;
        self.stage = None;
        self.error_message = Some(message);
    }

    fn finish_job(&mut self) {
        if let Some(start_time) = self.processing_start_time.take() {
            debug!("Job finished after {:.2?}", start_time.elapsed());
        }
        self.is_processing = false;
        self.event_receiver = None;
    }

    /// Ask where to save the PNG and write it.
    pub fn save_download(&self) -> Result<()> {
        let Some(fixed) = &self.result else {
            return Ok(());
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(fixed.download.file_name.as_str())
            .save_file()
        else {
            return Ok(());
        };
        write_artifact(&fixed.download, &path)?;
        info!("Saved {} to {:?}", fixed.download.mime_type, path);
        Ok(())
    }
}

fn build_comparison(ctx: &egui::Context, fixed: &FixedImage) -> Result<Comparison> {
    let original = preview_image(&fixed.result.original)?;
    let processed = preview_image(&fixed.result.processed)?;
    Ok(Comparison {
        original: ctx.load_texture("original", original, egui::TextureOptions::LINEAR),
        processed: ctx.load_texture("processed", processed, egui::TextureOptions::LINEAR),
    })
}

/// Bounded RGBA copy of `image` for display.
pub fn preview_image(image: &DynamicImage) -> Result<egui::ColorImage> {
    let bounded = resize_within_bound(image, PREVIEW_MAX_SIDE)?;
    let rgba = bounded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::PipelineParams;
    use crate::error::Error;
    use crate::remover::BackgroundRemover;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    struct Opaque;

    impl BackgroundRemover for Opaque {
        fn name(&self) -> &str {
            "opaque"
        }

        fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
        }
    }

    fn gui() -> CowwyGui {
        let params = PipelineParams {
            default_images: Vec::new(),
            ..Default::default()
        };
        CowwyGui::with_remover(params, Arc::new(Opaque)).unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(6, 4))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn run_to_completion(gui: &mut CowwyGui, ctx: &egui::Context) {
        let receiver = gui.event_receiver.take().unwrap();
        loop {
            let event = receiver.recv_timeout(Duration::from_secs(10)).unwrap();
            let finished = matches!(event, PipelineEvent::Finished(_));
            gui.handle_event(event, ctx);
            if finished {
                break;
            }
        }
    }

    #[test]
    fn preview_is_bounded_rgba() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(PREVIEW_MAX_SIDE * 2, 10));
        let preview = preview_image(&image).unwrap();
        assert_eq!(preview.size[0], PREVIEW_MAX_SIDE as usize);
        assert_eq!(preview.size[1], 5);
    }

    #[test]
    fn missing_default_asks_for_upload() {
        let ctx = egui::Context::default();
        let mut gui = gui();
        gui.start_with_default(&ctx);
        assert!(!gui.is_processing);
        assert_eq!(gui.status_text().as_deref(), Some(NO_IMAGE_MESSAGE));
    }

    #[test]
    fn successful_job_shows_comparison() {
        let ctx = egui::Context::default();
        let mut gui = gui();
        gui.submit(ImageSource::upload("a.png", png_bytes()), &ctx);
        assert!(gui.is_processing);

        run_to_completion(&mut gui, &ctx);
        assert!(!gui.is_processing);
        assert!(gui.comparison.is_some());
        assert_eq!(gui.result.as_ref().unwrap().download.file_name, "fixed.png");
        assert!(matches!(gui.stage, Some(Stage::Completed(_))));
    }

    #[test]
    fn rejected_upload_clears_previous_result() {
        let ctx = egui::Context::default();
        let mut gui = gui();
        gui.submit(ImageSource::upload("a.png", png_bytes()), &ctx);
        run_to_completion(&mut gui, &ctx);
        assert!(gui.result.is_some());

        let rejected = Err(Error::OversizedInput {
            size: 10 * 1024 * 1024 + 1,
            max: 10 * 1024 * 1024,
        });
        gui.submit_upload(rejected, &ctx);
        assert!(!gui.is_processing);
        assert!(gui.result.is_none());
        assert!(gui.comparison.is_none());
        assert!(gui.stage.is_none());
        assert!(gui.status_text().unwrap().contains("too large"));
    }

    #[test]
    fn missing_pipeline_clears_previous_result() {
        let ctx = egui::Context::default();
        let mut gui = gui();
        gui.submit(ImageSource::upload("a.png", png_bytes()), &ctx);
        run_to_completion(&mut gui, &ctx);

        gui.pipeline = None;
        gui.startup_error = Some(Error::model("gone").user_message());
        gui.submit(ImageSource::upload("b.png", png_bytes()), &ctx);
        assert!(!gui.is_processing);
        assert!(gui.result.is_none());
        assert!(gui.comparison.is_none());
    }

    #[test]
    fn failed_job_clears_outputs_and_shows_message() {
        let ctx = egui::Context::default();
        let mut gui = gui();
        gui.submit(ImageSource::upload("a.png", png_bytes()), &ctx);
        run_to_completion(&mut gui, &ctx);

        gui.submit(ImageSource::upload("bad.png", b"not an image".to_vec()), &ctx);
        run_to_completion(&mut gui, &ctx);
        assert!(gui.result.is_none());
        assert!(gui.comparison.is_none());
        let status = gui.status_text().unwrap();
        assert!(status.contains("could not be read"));
    }
}
