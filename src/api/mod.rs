//! High-level, ergonomic library API: strip the background from in-memory
//! bytes or from a file on disk in one call. Prefer these entrypoints over the
//! low-level processing modules when embedding the pipeline without the GUI.
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::core::params::PipelineParams;
use crate::core::processing::cache::ResultCache;
use crate::core::processing::pipeline::Pipeline;
use crate::error::Result;
use crate::io::writers::write_artifact;
use crate::remover::BackgroundRemover;
use crate::types::{FixedImage, ImageSource, NoProgress};

/// Run the full pipeline on uploaded `bytes` and return the PNG download.
///
/// Each call uses a fresh cache; hold a [`Pipeline`] instead to memoize
/// across calls.
pub fn remove_background_to_png(
    bytes: Vec<u8>,
    remover: Arc<dyn BackgroundRemover>,
    params: &PipelineParams,
) -> Result<FixedImage> {
    let pipeline = Pipeline::new(params.clone(), remover, Arc::new(ResultCache::new()))?;
    pipeline.fix_image(&ImageSource::upload("<memory>", bytes), &mut NoProgress)
}

/// Read `input` as an upload, strip its background, and write the PNG to
/// `output`.
pub fn remove_background_file(
    input: &Path,
    output: &Path,
    remover: Arc<dyn BackgroundRemover>,
    params: &PipelineParams,
) -> Result<FixedImage> {
    let source = crate::io::upload_from_path(input, params.max_file_size)?;
    let pipeline = Pipeline::new(params.clone(), remover, Arc::new(ResultCache::new()))?;
    let fixed = pipeline.fix_image(&source, &mut NoProgress)?;
    write_artifact(&fixed.download, output)?;
    info!("Successfully processed: {:?} -> {:?}", input, output);
    Ok(fixed)
}
