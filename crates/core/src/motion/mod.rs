//! Idle floating motion for the channel tiles.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{config::MotionConfig, timeline::FrameTask};

/// Per-tile seed parameters, drawn once and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileMotionState {
    pub base_offset_x: f64,
    pub base_offset_y: f64,
    pub base_rotation_deg: f64,
    pub speed: f64,
}

impl TileMotionState {
    pub fn random<R: Rng>(ranges: &MotionConfig, rng: &mut R) -> Self {
        Self {
            base_offset_x: symmetric(rng, ranges.offset_x),
            base_offset_y: symmetric(rng, ranges.offset_y),
            base_rotation_deg: symmetric(rng, ranges.rotation_deg),
            speed: ranges.min_speed + rng.random::<f64>() * (ranges.max_speed - ranges.min_speed),
        }
    }

    /// Transform shown before the first animation frame.
    pub fn seed_transform(&self) -> TileTransform {
        TileTransform {
            translate_x: self.base_offset_x,
            translate_y: self.base_offset_y,
            rotate_deg: self.base_rotation_deg,
        }
    }

    /// Transform of the tile at `index` after `t` seconds.
    pub fn transform_at(&self, index: usize, t: f64) -> TileTransform {
        let i = index as f64;
        let ox = (t * self.speed + i * 1.5).sin() * (6.0 + i);
        let oy = (t * self.speed * 0.8 + i * 1.2).cos() * (6.0 + i * 0.5);
        let rot = (t * self.speed * 0.7 + i).sin() * 1.6 + self.base_rotation_deg;
        TileTransform {
            translate_x: self.base_offset_x + ox,
            translate_y: self.base_offset_y + oy,
            rotate_deg: rot,
        }
    }
}

/// Uniform draw from `[-half_width, half_width)`.
fn symmetric<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    rng.random::<f64>() * 2.0 * half_width - half_width
}

/// 2D translation in pixels followed by a rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TileTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotate_deg: f64,
}

impl fmt::Display for TileTransform {
    /// CSS transform text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate3d({}px, {}px, 0) rotate({}deg)",
            self.translate_x, self.translate_y, self.rotate_deg
        )
    }
}

/// Computes every tile's transform once per frame.
#[derive(Debug, Clone, Default)]
pub struct MotionAnimator {
    tiles: Vec<TileMotionState>,
    transforms: Vec<TileTransform>,
}

impl MotionAnimator {
    pub fn new(tiles: Vec<TileMotionState>) -> Self {
        let transforms = tiles.iter().map(TileMotionState::seed_transform).collect();
        Self { tiles, transforms }
    }

    /// Seeds `count` tiles from `rng` within `ranges`.
    pub fn seeded<R: Rng>(count: usize, ranges: &MotionConfig, rng: &mut R) -> Self {
        let tiles = (0..count)
            .map(|_| TileMotionState::random(ranges, rng))
            .collect();
        Self::new(tiles)
    }

    pub fn tiles(&self) -> &[TileMotionState] {
        &self.tiles
    }

    /// Latest transform per tile, in tile order.
    pub fn transforms(&self) -> &[TileTransform] {
        &self.transforms
    }

    pub fn update(&mut self, now_ms: f64) {
        let t = now_ms / 1000.0;
        for (index, (tile, slot)) in self.tiles.iter().zip(&mut self.transforms).enumerate() {
            *slot = tile.transform_at(index, t);
        }
    }
}

impl FrameTask for MotionAnimator {
    fn name(&self) -> &'static str {
        "tile-motion"
    }

    fn on_frame(&mut self, now_ms: f64) {
        self.update(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn tile(x: f64, y: f64, rot: f64, speed: f64) -> TileMotionState {
        TileMotionState {
            base_offset_x: x,
            base_offset_y: y,
            base_rotation_deg: rot,
            speed,
        }
    }

    #[test]
    fn first_tile_at_time_zero() {
        let transform = tile(5.0, -3.0, 1.0, 3.0).transform_at(0, 0.0);
        assert_eq!(transform.translate_x, 5.0);
        assert_eq!(transform.translate_y, 3.0);
        assert_eq!(transform.rotate_deg, 1.0);
    }

    #[test]
    fn transform_is_pure() {
        let state = tile(-2.5, 4.0, -0.75, 3.3);
        for index in 0..6 {
            for t in [0.0, 0.016, 1.5, 123.456] {
                assert_eq!(state.transform_at(index, t), state.transform_at(index, t));
            }
        }
    }

    #[test]
    fn tiles_do_not_influence_each_other() {
        let a = tile(1.0, 2.0, 0.5, 2.5);
        let b = tile(-4.0, 0.0, -1.0, 4.0);
        let mut alone = MotionAnimator::new(vec![a]);
        let mut pair = MotionAnimator::new(vec![a, b]);
        alone.update(2_500.0);
        pair.update(2_500.0);
        assert_eq!(alone.transforms()[0], pair.transforms()[0]);
    }

    #[test]
    fn zero_tiles_is_a_no_op() {
        let mut animator = MotionAnimator::new(Vec::new());
        animator.on_frame(1_000.0);
        assert!(animator.transforms().is_empty());
    }

    #[test]
    fn seeds_are_reproducible_and_in_range() {
        let ranges = MotionConfig::default();
        let first = MotionAnimator::seeded(5, &ranges, &mut Pcg64Mcg::seed_from_u64(11));
        let second = MotionAnimator::seeded(5, &ranges, &mut Pcg64Mcg::seed_from_u64(11));
        assert_eq!(first.tiles(), second.tiles());

        for state in first.tiles() {
            assert!((-8.0..=8.0).contains(&state.base_offset_x));
            assert!((-6.0..=6.0).contains(&state.base_offset_y));
            assert!((-1.5..=1.5).contains(&state.base_rotation_deg));
            assert!((2.4..=4.8).contains(&state.speed));
        }
    }

    #[test]
    fn starts_from_seed_transforms() {
        let animator = MotionAnimator::new(vec![tile(3.0, -1.0, 0.25, 3.0)]);
        assert_eq!(
            animator.transforms()[0],
            TileTransform {
                translate_x: 3.0,
                translate_y: -1.0,
                rotate_deg: 0.25,
            }
        );
    }

    #[test]
    fn formats_css_transform() {
        let transform = TileTransform {
            translate_x: 1.5,
            translate_y: -2.0,
            rotate_deg: 0.5,
        };
        assert_eq!(transform.to_string(), "translate3d(1.5px, -2px, 0) rotate(0.5deg)");
    }
}
