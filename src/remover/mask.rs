use image::{DynamicImage, GenericImageView, GrayImage, Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Min-max normalize raw model scores into an 8-bit mask.
///
/// A flat score map (max == min) yields an all-zero mask.
pub fn normalize_mask(scores: &[f32], width: u32, height: u32) -> Result<GrayImage> {
    let expected = width as usize * height as usize;
    if scores.len() < expected {
        return Err(Error::Processing(format!(
            "mask has {} values, expected {} for {}x{}",
            scores.len(),
            expected,
            width,
            height
        )));
    }
    let scores = &scores[..expected];

    let (min, max) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    let data = scores
        .iter()
        .map(|&v| {
            if range > f32::EPSILON {
                (((v - min) / range).clamp(0.0, 1.0) * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| Error::Processing("mask buffer size mismatch".to_string()))
}

/// Cut out `image` with `mask` as its alpha channel. Fully transparent pixels
/// get zeroed color so the PNG compresses well and carries no hidden content.
/// Partially transparent pixels keep straight (unpremultiplied) color.
pub fn apply_alpha_mask(image: &DynamicImage, mask: &GrayImage) -> Result<RgbaImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(Error::Processing(format!(
            "mask {}x{} does not match image {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }

    let mut out = image.to_rgba8();
    for (pixel, alpha) in out.pixels_mut().zip(mask.pixels()) {
        let a = alpha.0[0];
        *pixel = if a == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([pixel.0[0], pixel.0[1], pixel.0[2], a])
        };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn normalize_stretches_to_full_range() {
        let mask = normalize_mask(&[-2.0, 0.0, 2.0, 1.0], 2, 2).unwrap();
        assert_eq!(mask.as_raw(), &vec![0, 128, 255, 191]);
    }

    #[test]
    fn flat_scores_give_empty_mask() {
        let mask = normalize_mask(&[0.7; 6], 3, 2).unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn short_score_buffer_is_an_error() {
        assert!(normalize_mask(&[0.0; 3], 2, 2).is_err());
    }

    #[test]
    fn mask_becomes_alpha() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 1, Rgb([9, 8, 7])));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([0]));
        mask.put_pixel(1, 0, Luma([200]));
        let out = apply_alpha_mask(&image, &mask).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [9, 8, 7, 200]);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(apply_alpha_mask(&image, &GrayImage::new(3, 4)).is_err());
    }
}
