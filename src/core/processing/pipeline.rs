//! The orchestrator: resolve bytes, then decode, resize and remove the
//! background through the result cache, then encode the PNG download.
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::core::params::PipelineParams;
use crate::core::processing::cache::ResultCache;
use crate::core::processing::decode::decode_image;
use crate::core::processing::resize::resize_within_bound;
use crate::error::{Error, Result};
use crate::io::input::{first_default_source, resolve_bytes};
use crate::io::writers::png_artifact;
use crate::remover::BackgroundRemover;
use crate::types::{FixedImage, ImageSource, ProcessingResult, ProgressSink, Stage};

pub struct Pipeline {
    params: PipelineParams,
    remover: Arc<dyn BackgroundRemover>,
    cache: Arc<ResultCache>,
}

impl Pipeline {
    /// Fails if `params` do not validate.
    pub fn new(
        params: PipelineParams,
        remover: Arc<dyn BackgroundRemover>,
        cache: Arc<ResultCache>,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            remover,
            cache,
        })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn remover(&self) -> &Arc<dyn BackgroundRemover> {
        &self.remover
    }

    pub fn resolve(&self, source: &ImageSource) -> Result<Vec<u8>> {
        resolve_bytes(source, self.params.max_file_size)
    }

    /// The first configured default image that exists, if any.
    pub fn default_source(&self) -> Option<ImageSource> {
        first_default_source(&self.params.default_images)
    }

    /// Decode, resize and strip the background, without the cache.
    pub fn compute(&self, bytes: &[u8]) -> Result<ProcessingResult> {
        let original = decode_image(bytes)?;
        let processed = {
            let resized = resize_within_bound(&original, self.params.max_dimension)?;
            self.remove_background(&resized)?
        };

        Ok(ProcessingResult {
            original,
            processed,
        })
    }

    /// Run the remover and hold it to its contract: same dimensions, with an
    /// alpha channel. Output without alpha is widened to RGBA8.
    fn remove_background(&self, input: &DynamicImage) -> Result<DynamicImage> {
        let expected = (input.width(), input.height());
        let processed = self.remover.remove(input)?;
        if (processed.width(), processed.height()) != expected {
            return Err(Error::Processing(format!(
                "{} returned {}x{} for a {}x{} input",
                self.remover.name(),
                processed.width(),
                processed.height(),
                expected.0,
                expected.1
            )));
        }

        let processed = if processed.color().has_alpha() {
            processed
        } else {
            warn!(
                "{} returned {:?} without alpha, converting to RGBA8",
                self.remover.name(),
                processed.color()
            );
            DynamicImage::ImageRgba8(processed.to_rgba8())
        };
        debug!(
            "{} produced {}x{} {:?}",
            self.remover.name(),
            processed.width(),
            processed.height(),
            processed.color()
        );
        Ok(processed)
    }

    /// Cached [`compute`](Self::compute). The boolean is true on a cache hit.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<(Arc<ProcessingResult>, bool)> {
        self.cache
            .get_or_try_insert_with(bytes, |bytes| self.compute(bytes))
    }

    /// Run the whole pipeline for `source`, reporting each stage to
    /// `progress`. On error nothing is produced and the full detail is logged;
    /// show the user [`Error::user_message`] instead.
    pub fn fix_image(
        &self,
        source: &ImageSource,
        progress: &mut dyn ProgressSink,
    ) -> Result<FixedImage> {
        let start_time = Instant::now();
        let label = source.label();

        let outcome = self.run_stages(source, progress, start_time);
        match &outcome {
            Ok(fixed) => info!(
                "Processed {} in {:.2?}{}",
                label,
                fixed.elapsed,
                if fixed.from_cache { " (cached)" } else { "" }
            ),
            Err(e) => error!("Error in fix_image for {}: {}", label, e),
        }
        outcome
    }

    fn run_stages(
        &self,
        source: &ImageSource,
        progress: &mut dyn ProgressSink,
        start_time: Instant,
    ) -> Result<FixedImage> {
        progress.stage(Stage::Loading);
        let bytes = self.resolve(source)?;

        progress.stage(Stage::Processing);
        let (result, from_cache) = self.process_bytes(&bytes)?;

        progress.stage(Stage::Displaying);
        let download = png_artifact(&result.processed, &self.params.download_name)?;

        let elapsed = start_time.elapsed();
        progress.stage(Stage::Completed(elapsed));

        Ok(FixedImage {
            result,
            download,
            elapsed,
            from_cache,
        })
    }
}
