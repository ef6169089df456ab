//! Test images
//!
//! Fills RGB images with deterministic 16-bit content.

use oxmeta_core::{Colorspace, Image, QUANTUM_RANGE, Quantum};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Test pattern types
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Horizontal gradient black to white
    GradientH,
    /// RGB color cube corners (8 colors)
    ColorCube,
    /// Hue ramp at full saturation
    HueRamp,
    /// Random pixels with seed
    Random(u64),
    /// All zeros (black)
    Black,
    /// Every channel at full range
    White,
}

/// Generate a pattern as interleaved RGB quanta
pub fn generate_pattern(pattern: TestPattern, width: usize, height: usize) -> Vec<Quantum> {
    let pixel_count = width * height;
    let mut data = vec![0 as Quantum; pixel_count * 3];

    match pattern {
        TestPattern::GradientH => {
            for (i, chunk) in data.chunks_exact_mut(3).enumerate() {
                let x = i % width;
                let v = (x as f64 / width.max(2).saturating_sub(1) as f64 * QUANTUM_RANGE)
                    .min(QUANTUM_RANGE) as Quantum;
                chunk.fill(v);
            }
        }
        TestPattern::ColorCube => {
            for (i, chunk) in data.chunks_exact_mut(3).enumerate() {
                let corner = i % 8;
                for (c, value) in chunk.iter_mut().enumerate() {
                    *value = if corner & (1 << c) != 0 { Quantum::MAX } else { 0 };
                }
            }
        }
        TestPattern::HueRamp => {
            for (i, chunk) in data.chunks_exact_mut(3).enumerate() {
                let hue = (i as f64 / pixel_count as f64) * 360.0;
                chunk.copy_from_slice(&hue_to_rgb(hue));
            }
        }
        TestPattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for value in data.iter_mut() {
                *value = rng.r#gen();
            }
        }
        TestPattern::Black => {}
        TestPattern::White => data.fill(Quantum::MAX),
    }

    data
}

/// An RGB image holding `pattern`
pub fn pattern_image(pattern: TestPattern, width: usize, height: usize) -> Image {
    let mut image = Image::new(width, height, Colorspace::Srgb);
    image
        .pixels_mut()
        .copy_from_slice(&generate_pattern(pattern, width, height));
    image
}

fn hue_to_rgb(h: f64) -> [Quantum; 3] {
    let x = 1.0 - ((h / 60.0) % 2.0 - 1.0).abs();
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [r, g, b].map(|v: f64| (v * QUANTUM_RANGE).round() as Quantum)
}

/// Standard test sizes
pub mod sizes {
    pub const TINY: (usize, usize) = (8, 8);
    pub const SMALL: (usize, usize) = (64, 64);
    pub const MEDIUM: (usize, usize) = (256, 256);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_white() {
        let data = generate_pattern(TestPattern::White, 2, 2);
        assert!(data.iter().all(|&v| v == Quantum::MAX));
    }

    #[test]
    fn test_random_deterministic() {
        let a = generate_pattern(TestPattern::Random(42), 10, 10);
        let b = generate_pattern(TestPattern::Random(42), 10, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_gradient_reaches_white() {
        let data = generate_pattern(TestPattern::GradientH, 4, 1);
        assert_eq!(data[0], 0);
        assert_eq!(data[9], Quantum::MAX);
    }

    #[test]
    fn test_pattern_image_shape() {
        let (w, h) = sizes::TINY;
        let image = pattern_image(TestPattern::ColorCube, w, h);
        assert_eq!(image.pixel(1, 0).unwrap(), &[Quantum::MAX, 0, 0]);
    }
}
