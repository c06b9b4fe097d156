use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::{Error, Result};

/// Formats offered by the upload dialog.
pub const SUPPORTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpeg];

/// File-dialog extensions matching [`SUPPORTED_FORMATS`].
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Decode raw PNG/JPEG bytes. The format is sniffed from content, not from a
/// file name.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(Error::decode)?;

    match reader.format() {
        Some(format) if SUPPORTED_FORMATS.contains(&format) => {
            debug!("Detected {:?} input ({} bytes)", format, bytes.len());
        }
        Some(format) => {
            return Err(Error::Decode(format!("unsupported image format {:?}", format)));
        }
        None => return Err(Error::Decode("unrecognized image data".to_string())),
    }

    let image = reader.decode().map_err(Error::decode)?;
    debug!("Decoded image: {}x{} {:?}", image.width(), image.height(), image.color());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn decodes_png_and_jpeg() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 7, image::Rgb([200, 10, 30])));
        for format in SUPPORTED_FORMATS {
            let decoded = decode_image(&encode(&image, format)).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (12, 7));
        }
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn rejects_truncated_png() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(32, 32));
        let bytes = encode(&image, ImageFormat::Png);
        let err = decode_image(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn rejects_formats_outside_the_upload_filter() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let bmp = encode(&image, ImageFormat::Bmp);
        assert!(matches!(decode_image(&bmp), Err(Error::Decode(_))));
    }
}
