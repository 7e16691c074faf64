//! Procedural effect textures
//!
//! No texture files ship with the crate; the glow and cloud puff are generated at
//! build time of the effect and released with it.

use image::{Rgba, RgbaImage};
use rand::Rng;

/// Tightly packed RGBA8 pixels
#[derive(Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for TextureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl From<RgbaImage> for TextureData {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            rgba: image.into_raw(),
        }
    }
}

impl TextureData {
    /// Single opaque white texel; sampled by untextured materials
    pub fn white() -> Self {
        RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])).into()
    }

    /// White disc whose alpha falls off quadratically from the centre
    pub fn radial_glow(size: u32) -> Self {
        let size = size.max(2);
        let half = (size - 1) as f32 * 0.5;
        RgbaImage::from_fn(size, size, |x, y| {
            let dx = (x as f32 - half) / half;
            let dy = (y as f32 - half) / half;
            let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            Rgba([255, 255, 255, (falloff * falloff * 255.0) as u8])
        })
        .into()
    }

    /// Soft, lumpy puff built from a handful of overlapping blobs
    pub fn cloud_puff(size: u32, rng: &mut impl Rng) -> Self {
        let size = size.max(2);
        let blobs: Vec<(f32, f32, f32)> = (0..6)
            .map(|_| {
                (
                    rng.gen_range(0.3..0.7),
                    rng.gen_range(0.35..0.65),
                    rng.gen_range(0.18..0.32),
                )
            })
            .collect();
        let scale = (size - 1) as f32;
        RgbaImage::from_fn(size, size, |x, y| {
            let (u, v) = (x as f32 / scale, y as f32 / scale);
            let density = blobs
                .iter()
                .map(|(cx, cy, radius)| {
                    let d = ((u - cx).powi(2) + (v - cy).powi(2)).sqrt() / radius;
                    (1.0 - d).max(0.0)
                })
                .fold(0.0_f32, |acc, d| acc.max(d));
            Rgba([255, 255, 255, (density.sqrt() * 255.0) as u8])
        })
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn alpha_at(texture: &TextureData, x: u32, y: u32) -> u8 {
        texture.rgba[((y * texture.width + x) * 4 + 3) as usize]
    }

    #[test]
    fn test_glow_is_bright_center_dark_corner() {
        let glow = TextureData::radial_glow(32);
        assert_eq!(glow.rgba.len(), 32 * 32 * 4);
        assert!(alpha_at(&glow, 16, 16) > 200);
        assert_eq!(alpha_at(&glow, 0, 0), 0);
    }

    #[test]
    fn test_cloud_puff_has_transparent_border() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let puff = TextureData::cloud_puff(32, &mut rng);
        assert_eq!(alpha_at(&puff, 0, 0), 0);
        assert!(puff.rgba.chunks(4).any(|px| px[3] > 128));
    }
}
