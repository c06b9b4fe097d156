//! U2-Net salient-object segmentation through ONNX Runtime.
//!
//! Pre/post-processing follows the common `u2net.onnx` export:
//! - input: 1x3x320x320 f32, RGB scaled by the image maximum, then
//!   normalized with ImageNet mean/std;
//! - output 0: 1x1x320x320 scores, min-max normalized into the mask.
//!
//! The mask is upsampled back to the input size with the same Lanczos3
//! resampler the pipeline uses for downscaling.

use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView, RgbImage};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{Tensor, Value};
use tracing::{debug, info, instrument};

use super::BackgroundRemover;
use super::mask::{apply_alpha_mask, normalize_mask};
use crate::core::processing::resize::resize_exact;
use crate::error::{Error, Result};

pub const MODEL_INPUT_SIZE: u32 = 320;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub struct U2NetRemover {
    // `Session::run` needs `&mut`
    session: Mutex<Session>,
}

impl U2NetRemover {
    #[instrument(skip_all, fields(model = %model_path.display()))]
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::Model(format!(
                "U2-Net model not found at {}",
                model_path.display()
            )));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| Error::Model(format!("read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| Error::Model(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Model(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| Error::Model(format!("ORT load model: {e}")))?;

        info!("U2-Net model loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn predict_scores(&self, tensor: Value) -> Result<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::processing("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Processing(format!("ORT run failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Processing(format!("ORT extract: {e}")))?;

        // Expect [1,1,H,W]; take the first channel of the first batch item
        let plane = (MODEL_INPUT_SIZE * MODEL_INPUT_SIZE) as usize;
        if shape.len() != 4 || data.len() < plane {
            return Err(Error::Processing(format!(
                "Unexpected U2-Net output shape: {:?}",
                shape
            )));
        }
        Ok(data[..plane].to_vec())
    }
}

/// RGB image of exactly `MODEL_INPUT_SIZE` squared to a normalized NCHW tensor.
fn rgb_to_chw_tensor(rgb: &RgbImage) -> Result<Value> {
    let (w, h) = rgb.dimensions();
    let max = rgb.as_raw().iter().copied().max().unwrap_or(0).max(1) as f32;

    let mut chw = Vec::with_capacity((w * h * 3) as usize);
    // HWC -> CHW
    for c in 0..3 {
        for pixel in rgb.pixels() {
            let v = pixel.0[c] as f32 / max;
            chw.push((v - MEAN[c]) / STD[c]);
        }
    }

    let shape = vec![1usize, 3, h as usize, w as usize];
    let boxed = chw.into_boxed_slice();
    Tensor::from_array((shape, boxed))
        .map(Value::from)
        .map_err(|e| Error::Processing(format!("ORT tensor: {e}")))
}

impl BackgroundRemover for U2NetRemover {
    fn name(&self) -> &str {
        "u2net"
    }

    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let (width, height) = image.dimensions();
        debug!("Running U2-Net on {}x{}", width, height);

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let model_input = resize_exact(&rgb, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE)?.to_rgb8();
        let tensor = rgb_to_chw_tensor(&model_input)?;

        let scores = self.predict_scores(tensor)?;
        let mask = normalize_mask(&scores, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE)?;
        let mask = resize_exact(&DynamicImage::ImageLuma8(mask), width, height)?.to_luma8();

        Ok(DynamicImage::ImageRgba8(apply_alpha_mask(image, &mask)?))
    }
}
