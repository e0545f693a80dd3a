//! Alpha compositing for the development cover overlay.
//!
//! The cover is blended over each icon with a subtractive alpha rule:
//! the source keeps only the alpha the cover does not claim
//! (`source.a - cover.a`), and the color weights are deliberately not
//! re-normalized. This produces a hard "cutout" where the cover is opaque
//! instead of standard over-blending.

use image::Rgba32FImage;

/// Alphas within this distance of zero are treated as fully transparent.
const ALPHA_EPSILON: f32 = 1e-6;

/// Blend `cover` over `source`, returning a new image.
///
/// Per pixel, with `sa = source.a - cover.a` and `ca = cover.a`:
///
/// ```text
/// out.rgb = source.rgb * sa + cover.rgb * ca
/// out.a   = min(1.0, sa + ca)
/// ```
///
/// When both `sa` and `ca` are approximately zero the output alpha is forced
/// to exactly `0.0` so fully transparent regions stay fully transparent.
///
/// Color channels are not clamped here; values may transiently leave `[0, 1]`
/// and are clamped by the storage layer on write. Neither input is mutated.
///
/// Both images must have identical dimensions; callers resample the cover to
/// the source's size first (see [`CoverImage::resampled`](crate::CoverImage::resampled)).
#[must_use]
pub fn combine(source: &Rgba32FImage, cover: &Rgba32FImage) -> Rgba32FImage {
    debug_assert_eq!(
        source.dimensions(),
        cover.dimensions(),
        "combine requires equal dimensions"
    );

    let (width, height) = source.dimensions();
    let mut combined = vec![0.0f32; source.as_raw().len()];

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        combined
            .par_chunks_exact_mut(4)
            .zip(
                source
                    .as_raw()
                    .par_chunks_exact(4)
                    .zip(cover.as_raw().par_chunks_exact(4)),
            )
            .for_each(|(out, (src, cov))| blend_pixel(out, src, cov));
    }

    #[cfg(not(feature = "parallel"))]
    {
        combined
            .chunks_exact_mut(4)
            .zip(
                source
                    .as_raw()
                    .chunks_exact(4)
                    .zip(cover.as_raw().chunks_exact(4)),
            )
            .for_each(|(out, (src, cov))| blend_pixel(out, src, cov));
    }

    Rgba32FImage::from_raw(width, height, combined)
        .expect("combined buffer matches source dimensions")
}

/// Blend a single RGBA pixel (4 subpixels each) into `out`.
fn blend_pixel(out: &mut [f32], source: &[f32], cover: &[f32]) {
    let source_alpha = source[3] - cover[3];
    let cover_alpha = cover[3];

    out[0] = source[0] * source_alpha + cover[0] * cover_alpha;
    out[1] = source[1] * source_alpha + cover[1] * cover_alpha;
    out[2] = source[2] * source_alpha + cover[2] * cover_alpha;
    out[3] = if source_alpha.abs() <= ALPHA_EPSILON && cover_alpha.abs() <= ALPHA_EPSILON {
        0.0
    } else {
        (source_alpha + cover_alpha).min(1.0)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgba: [f32; 4]) -> Rgba32FImage {
        Rgba32FImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn output_dimensions_match_inputs() {
        let source = solid(7, 13, [0.2, 0.4, 0.6, 0.8]);
        let cover = solid(7, 13, [1.0, 0.0, 0.0, 0.5]);
        let out = combine(&source, &cover);
        assert_eq!(out.dimensions(), (7, 13));
    }

    #[test]
    fn fully_transparent_pixels_stay_exactly_transparent() {
        let source = solid(4, 4, [0.3, 0.7, 0.1, 0.0]);
        let cover = solid(4, 4, [0.9, 0.9, 0.9, 0.0]);
        let out = combine(&source, &cover);
        for px in out.pixels() {
            assert_eq!(px[3], 0.0);
        }
    }

    #[test]
    fn output_alpha_stays_within_unit_range() {
        let alphas = [0.0f32, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &sa in &alphas {
            for &ca in &alphas {
                let source = solid(2, 2, [0.5, 0.5, 0.5, sa]);
                let cover = solid(2, 2, [0.1, 0.2, 0.3, ca]);
                let out = combine(&source, &cover);
                for px in out.pixels() {
                    assert!(
                        (0.0..=1.0).contains(&px[3]),
                        "alpha {} out of range for sa={sa} ca={ca}",
                        px[3]
                    );
                }
            }
        }
    }

    #[test]
    fn opaque_cover_region_becomes_a_cutout() {
        // Opaque colored source, cover fully opaque black in its center
        // 128x128 and transparent elsewhere.
        let source = solid(256, 256, [0.8, 0.4, 0.2, 1.0]);
        let mut cover = solid(256, 256, [0.0, 0.0, 0.0, 0.0]);
        for y in 64..192 {
            for x in 64..192 {
                cover.put_pixel(x, y, Rgba([0.0, 0.0, 0.0, 1.0]));
            }
        }

        let out = combine(&source, &cover);

        let center = out.get_pixel(128, 128);
        assert_eq!(center.0, [0.0, 0.0, 0.0, 1.0]);

        // Outside the cover, the source color is scaled by its own alpha.
        let corner = out.get_pixel(0, 0);
        assert_eq!(corner.0, [0.8, 0.4, 0.2, 1.0]);
    }

    #[test]
    fn translucent_source_scales_by_exclusive_alpha() {
        let source = solid(1, 1, [0.5, 0.25, 1.0, 0.5]);
        let cover = solid(1, 1, [0.0, 0.0, 0.0, 0.0]);
        let out = combine(&source, &cover);
        let px = out.get_pixel(0, 0);
        assert_eq!(px.0, [0.25, 0.125, 0.5, 0.5]);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let source = solid(3, 3, [0.6, 0.5, 0.4, 0.9]);
        let cover = solid(3, 3, [0.1, 0.1, 0.1, 0.7]);
        let source_raw = source.as_raw().clone();
        let cover_raw = cover.as_raw().clone();

        let _ = combine(&source, &cover);

        assert_eq!(source.as_raw(), &source_raw);
        assert_eq!(cover.as_raw(), &cover_raw);
    }
}
