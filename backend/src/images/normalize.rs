use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageResult};

#[derive(Debug, Clone, Copy)]
pub struct NormalizeSettings {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

/// Decodes `bytes`, flattens to RGB, shrinks to fit the bounds and re-encodes as `format`.
/// Images already within bounds keep their dimensions.
pub fn normalize(
    bytes: &[u8],
    format: ImageFormat,
    settings: &NormalizeSettings,
) -> ImageResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let mut img = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let (width, height) = img.dimensions();
    if width > settings.max_width || height > settings.max_height {
        img = img.resize(settings.max_width, settings.max_height, FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality);
            img.write_with_encoder(encoder)?;
        }
        other => img.write_to(&mut Cursor::new(&mut out), other)?,
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const SETTINGS: NormalizeSettings = NormalizeSettings {
        max_width: 1200,
        max_height: 900,
        jpeg_quality: 85,
    };

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([200, 30, 30, 128]),
        ));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn oversized_images_shrink_keeping_aspect() {
        let out = normalize(&png(2400, 1200), ImageFormat::Png, &SETTINGS).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (1200, 600));
        assert!(matches!(img, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn small_images_keep_dimensions() {
        let out = normalize(&png(640, 480), ImageFormat::Jpeg, &SETTINGS).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (640, 480));
    }

    #[test]
    fn undecodable_input_is_an_error() {
        assert!(normalize(b"definitely not an image", ImageFormat::Png, &SETTINGS).is_err());
    }
}
