use std::borrow::Cow;

use fast_image_resize::{FilterType, IntoImageView, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Target dimensions for fitting `original_cols x original_rows` inside a
/// square of `target_size`. Never upscales.
pub fn calculate_resize_dimensions(
    original_cols: u32,
    original_rows: u32,
    target_size: u32,
) -> (u32, u32) {
    let short_side = original_rows.min(original_cols);
    let long_side = original_rows.max(original_cols);

    if long_side <= target_size {
        return (original_cols, original_rows);
    }

    let scale_factor = target_size as f64 / long_side as f64;
    let new_short_side = ((short_side as f64 * scale_factor).round() as u32).max(1);

    if original_cols >= original_rows {
        (target_size, new_short_side)
    } else {
        (new_short_side, target_size)
    }
}

/// Lanczos3 resample to exactly `target_cols x target_rows`, keeping the color
/// type of the source. Alpha is premultiplied during convolution.
pub fn resize_exact(image: &DynamicImage, target_cols: u32, target_rows: u32) -> Result<DynamicImage> {
    if target_cols == 0 || target_rows == 0 {
        return Err(Error::Processing(format!(
            "cannot resize to {}x{}",
            target_cols, target_rows
        )));
    }

    // Pixel layouts fast_image_resize has no view for are widened to RGBA8 first
    let src: Cow<'_, DynamicImage> = if image.pixel_type().is_some() {
        Cow::Borrowed(image)
    } else {
        debug!("Converting {:?} to RGBA8 before resizing", image.color());
        Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
    };

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let mut dst_image = DynamicImage::new(target_cols, target_rows, src.color());
    resizer
        .resize(&*src, &mut dst_image, &resize_options)
        .map_err(Error::processing)?;

    Ok(dst_image)
}

/// Borrow `image` when it already fits in `max_dimension`, otherwise return a
/// downsampled copy whose longest side is `max_dimension`.
pub fn resize_within_bound(image: &DynamicImage, max_dimension: u32) -> Result<Cow<'_, DynamicImage>> {
    let (original_cols, original_rows) = image.dimensions();
    let (new_cols, new_rows) =
        calculate_resize_dimensions(original_cols, original_rows, max_dimension);

    if (new_cols, new_rows) == (original_cols, original_rows) {
        debug!(
            "Image {}x{} within {} px bound, not resizing",
            original_cols, original_rows, max_dimension
        );
        return Ok(Cow::Borrowed(image));
    }

    info!(
        "Original size: {}x{}, New size: {}x{}",
        original_cols, original_rows, new_cols, new_rows
    );
    resize_exact(image, new_cols, new_rows).map(Cow::Owned)
}

/// Owned form of [`resize_within_bound`]: an image already within the bound
/// is returned as-is.
pub fn resize_to_bound(image: DynamicImage, max_dimension: u32) -> Result<DynamicImage> {
    let resized = match resize_within_bound(&image, max_dimension)? {
        Cow::Owned(resized) => Some(resized),
        Cow::Borrowed(_) => None,
    };
    Ok(resized.unwrap_or(image))
}
