//! The shared development cover image.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::Rgba32FImage;

use crate::error::{Error, Result};

/// Well-known location of the development cover image.
pub const DEFAULT_COVER_PATH: &str = "assets/icons/CoverForDevelopment.png";

/// The fixed watermark image blended over every icon.
///
/// Loaded once, read-only afterward, shared by all compositing calls in a
/// run. The cover is never written back to any store.
#[derive(Debug, Clone)]
pub struct CoverImage {
    base: Rgba32FImage,
}

impl CoverImage {
    /// Load the cover image from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoverLoad`] if the file is missing or cannot be
    /// decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let base = image::open(path)
            .map_err(|source| Error::CoverLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba32f();
        Ok(Self { base })
    }

    /// Wrap an already-decoded image as the cover.
    #[must_use]
    pub fn from_image(base: Rgba32FImage) -> Self {
        Self { base }
    }

    /// Dimensions of the cover as loaded.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    /// The cover resampled to `width` x `height`.
    ///
    /// Returns a clone when the requested size matches the loaded size.
    /// Resampled pixels are clamped back to `[0, 1]` so filter ringing cannot
    /// leak out of range into the blend.
    #[must_use]
    pub fn resampled(&self, width: u32, height: u32) -> Rgba32FImage {
        if self.base.dimensions() == (width, height) {
            return self.base.clone();
        }

        let mut resized = imageops::resize(&self.base, width, height, FilterType::Lanczos3);
        for px in resized.pixels_mut() {
            for channel in &mut px.0 {
                *channel = channel.clamp(0.0, 1.0);
            }
        }
        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn resampled_to_native_size_is_identical() {
        let base = Rgba32FImage::from_pixel(64, 64, Rgba([0.2, 0.4, 0.6, 0.8]));
        let cover = CoverImage::from_image(base.clone());
        let out = cover.resampled(64, 64);
        assert_eq!(out.as_raw(), base.as_raw());
    }

    #[test]
    fn resampled_has_requested_dimensions() {
        let cover = CoverImage::from_image(Rgba32FImage::from_pixel(
            128,
            128,
            Rgba([1.0, 0.0, 0.0, 1.0]),
        ));
        let out = cover.resampled(48, 96);
        assert_eq!(out.dimensions(), (48, 96));
    }

    #[test]
    fn resampled_pixels_stay_within_unit_range() {
        // A hard edge provokes Lanczos ringing.
        let mut base = Rgba32FImage::from_pixel(64, 64, Rgba([0.0, 0.0, 0.0, 0.0]));
        for y in 0..64 {
            for x in 32..64 {
                base.put_pixel(x, y, Rgba([1.0, 1.0, 1.0, 1.0]));
            }
        }
        let cover = CoverImage::from_image(base);
        let out = cover.resampled(200, 200);
        for px in out.pixels() {
            for &channel in &px.0 {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn load_missing_cover_reports_path() {
        let err = CoverImage::load(Path::new("/nonexistent/cover.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cover.png"));
    }
}
