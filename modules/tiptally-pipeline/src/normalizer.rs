use std::io::Write;
use std::path::Path;

use image::{imageops::FilterType, GenericImageView};
use tempfile::NamedTempFile;
use tracing::debug;

use tiptally_common::{RawImage, TipTallyError};

/// A receipt image bounded to the configured dimensions and re-encoded as
/// JPEG, staged in a temporary file for the duration of its item's
/// processing. Dropping it removes the staging file, so release happens on
/// every exit path without explicit cleanup.
#[derive(Debug)]
pub struct NormalizedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    staging: NamedTempFile,
}

impl NormalizedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Normalization always encodes JPEG, regardless of the input format.
    pub fn media_type(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }
}

/// Resizes and recompresses uploads before they are hashed or sent upstream.
/// Output is deterministic for a given input and parameters — required for
/// fingerprint stability.
pub struct ImageNormalizer {
    max_dimension: u32,
    quality: u8,
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
        }
    }

    pub fn normalize(&self, raw: &RawImage) -> Result<NormalizedImage, TipTallyError> {
        if !raw.media_type.starts_with("image/") {
            return Err(TipTallyError::UnsupportedMediaType(raw.media_type.clone()));
        }

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| TipTallyError::NormalizationFailed(e.to_string()))?;

        let (original_width, original_height) = decoded.dimensions();
        let (width, height) =
            target_size(original_width, original_height, self.max_dimension);

        let resized = if width == original_width && height == original_height {
            decoded
        } else {
            image::DynamicImage::ImageRgba8(image::imageops::resize(
                &decoded,
                width,
                height,
                FilterType::Triangle,
            ))
        };

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = resized.to_rgb8();
        let mut bytes = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bytes);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut cursor,
                self.quality,
            );
            encoder
                .encode(rgb.as_raw(), width, height, image::ColorType::Rgb8.into())
                .map_err(|e| TipTallyError::NormalizationFailed(e.to_string()))?;
        }

        let mut staging = NamedTempFile::new()
            .map_err(|e| TipTallyError::NormalizationFailed(format!("staging file: {e}")))?;
        staging
            .as_file_mut()
            .write_all(&bytes)
            .map_err(|e| TipTallyError::NormalizationFailed(format!("staging write: {e}")))?;

        debug!(
            original_width,
            original_height,
            width,
            height,
            bytes = bytes.len(),
            "Normalized image"
        );

        Ok(NormalizedImage {
            bytes,
            width,
            height,
            staging,
        })
    }
}

/// Aspect-preserving fit within `max_edge`. Never upscales.
fn target_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }

    if width >= height {
        let scaled_height = ((height as f64) * (max_edge as f64) / (width as f64)).round() as u32;
        (max_edge, scaled_height.max(1))
    } else {
        let scaled_width = ((width as f64) * (max_edge as f64) / (height as f64)).round() as u32;
        (scaled_width.max(1), max_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    fn raw(bytes: Vec<u8>, media_type: &str) -> RawImage {
        RawImage {
            bytes,
            media_type: media_type.to_string(),
            filename: None,
        }
    }

    #[test]
    fn downscales_to_max_dimension_preserving_aspect() {
        let normalizer = ImageNormalizer::new(128, 85);
        let normalized = normalizer
            .normalize(&raw(png_fixture(256, 128), "image/png"))
            .unwrap();

        assert_eq!(normalized.dimensions(), (128, 64));
        assert_eq!(
            image::guess_format(normalized.bytes()).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn never_upscales_smaller_images() {
        let normalizer = ImageNormalizer::new(1024, 85);
        let normalized = normalizer
            .normalize(&raw(png_fixture(64, 48), "image/png"))
            .unwrap();
        assert_eq!(normalized.dimensions(), (64, 48));
    }

    #[test]
    fn repeated_normalization_is_byte_identical() {
        let normalizer = ImageNormalizer::new(128, 85);
        let input = raw(png_fixture(300, 200), "image/png");
        let first = normalizer.normalize(&input).unwrap();
        let second = normalizer.normalize(&input).unwrap();
        assert_eq!(first.bytes(), second.bytes());
    }

    #[test]
    fn rejects_non_image_media_type() {
        let normalizer = ImageNormalizer::new(128, 85);
        let err = normalizer
            .normalize(&raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .unwrap_err();
        assert!(matches!(err, TipTallyError::UnsupportedMediaType(_)));
    }

    #[test]
    fn corrupt_image_fails_normalization() {
        let normalizer = ImageNormalizer::new(128, 85);
        let err = normalizer
            .normalize(&raw(vec![0xde, 0xad, 0xbe, 0xef], "image/jpeg"))
            .unwrap_err();
        assert!(matches!(err, TipTallyError::NormalizationFailed(_)));
    }

    #[test]
    fn staging_file_removed_on_drop() {
        let normalizer = ImageNormalizer::new(128, 85);
        let normalized = normalizer
            .normalize(&raw(png_fixture(64, 64), "image/png"))
            .unwrap();
        let path = normalized.staging_path().to_path_buf();
        assert!(path.exists());
        drop(normalized);
        assert!(!path.exists());
    }

    #[test]
    fn target_size_bounds_both_axes() {
        assert_eq!(target_size(2000, 1000, 500), (500, 250));
        assert_eq!(target_size(1000, 2000, 500), (250, 500));
        assert_eq!(target_size(400, 300, 500), (400, 300));
        assert_eq!(target_size(10_000, 10, 100), (100, 1));
    }
}
