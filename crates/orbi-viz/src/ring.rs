//! Rotating particle rings around the core.

use std::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3};
use orbi_config::RingConfig;
use rand::Rng;

use crate::color::hex_to_linear;
use crate::particle::Particle;

/// Ring particle opacity range.
const OPACITY_MIN: f32 = 0.7;
const OPACITY_SPAN: f32 = 0.3;

/// Ring particle size: `(SIZE_BASE + U * SIZE_SPAN) / SIZE_DIVISOR`.
const SIZE_BASE: f32 = 0.06;
const SIZE_SPAN: f32 = 0.06;
const SIZE_DIVISOR: f32 = 3.0;

/// Vertical jitter relative to the band thickness.
const VERTICAL_SPREAD: f32 = 0.5;

/// Frame rate that per-frame spin rates are expressed against.
pub const REFERENCE_FPS: f32 = 60.0;

/// A point-cloud band orbiting the core.
///
/// Particles are generated once, in ring-local space. Per frame only the
/// rigid-body rotation changes.
#[derive(Debug, Clone)]
pub struct Ring {
    particles: Vec<Particle>,
    color: [f32; 3],
    offset: f32,
    /// `x` is the tilt, `y` the spin (radians).
    rotation: Vec2,
    spin_per_frame: f32,
    tilt_amplitude: f32,
    tilt_frequency: f32,
    base_tilt: f32,
}

impl Ring {
    pub fn generate<R: Rng>(config: &RingConfig, offset: f32, rng: &mut R) -> Self {
        let particles = (0..config.count)
            .map(|_| {
                let angle = rng.random::<f32>() * TAU;
                let radius = config.radius + (rng.random::<f32>() - 0.5) * config.thickness;
                let y = (rng.random::<f32>() - 0.5) * config.thickness * VERTICAL_SPREAD;
                let opacity = OPACITY_MIN + rng.random::<f32>() * OPACITY_SPAN;
                let size = (SIZE_BASE + rng.random::<f32>() * SIZE_SPAN) / SIZE_DIVISOR;
                Particle::new(
                    Vec3::new(angle.cos() * radius, y, angle.sin() * radius),
                    opacity,
                    size,
                )
            })
            .collect();

        Self {
            particles,
            color: hex_to_linear(config.color),
            offset,
            rotation: Vec2::new(config.base_tilt, config.initial_spin),
            spin_per_frame: config.spin_per_frame,
            tilt_amplitude: config.tilt_amplitude,
            tilt_frequency: config.tilt_frequency,
            base_tilt: config.base_tilt,
        }
    }

    /// Spin by the per-frame rate scaled to `dt`, and set the tilt from the
    /// absolute elapsed time.
    pub fn advance(&mut self, dt: f32, elapsed: f32) {
        self.rotation.y += self.spin_per_frame * dt * REFERENCE_FPS;
        self.rotation.x = if self.tilt_amplitude != 0.0 {
            (elapsed * self.tilt_frequency).sin() * self.tilt_amplitude
        } else {
            self.base_tilt
        };
    }

    /// Ring-local to world: translate to the core, then tilt, then spin.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.offset, 0.0, 0.0))
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Linear RGB.
    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn spin(&self) -> f32 {
        self.rotation.y
    }

    pub fn tilt(&self) -> f32 {
        self.rotation.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_particle_count_matches_config() {
        for config in RingConfig::default_set() {
            let ring = Ring::generate(&config, 3.5, &mut rng());
            assert_eq!(ring.particles().len(), config.count as usize);
        }
    }

    #[test]
    fn test_planar_radius_within_band() {
        for (i, config) in RingConfig::default_set().iter().enumerate() {
            let ring = Ring::generate(config, 3.5, &mut rng());
            let lo = config.radius - config.thickness / 2.0;
            let hi = config.radius + config.thickness / 2.0;
            for p in ring.particles() {
                let r = Vec2::new(p.position[0], p.position[2]).length();
                assert!(
                    r >= lo - 1e-5 && r <= hi + 1e-5,
                    "ring {i}: planar radius {r} outside [{lo}, {hi}]"
                );
            }
        }
    }

    #[test]
    fn test_particle_attributes_in_range() {
        let config = &RingConfig::default_set()[0];
        let ring = Ring::generate(config, 0.0, &mut rng());
        for p in ring.particles() {
            assert!((0.7..=1.0).contains(&p.opacity), "opacity {}", p.opacity);
            assert!((0.02..=0.04).contains(&p.size), "size {}", p.size);
            assert!(p.position[1].abs() <= config.thickness * 0.25 + 1e-6);
        }
    }

    #[test]
    fn test_positions_never_regenerated() {
        let config = &RingConfig::default_set()[1];
        let mut ring = Ring::generate(config, 3.5, &mut rng());
        let before = ring.particles().to_vec();
        for frame in 0..120 {
            ring.advance(1.0 / 60.0, frame as f32 / 60.0);
        }
        assert_eq!(ring.particles(), before.as_slice());
    }

    #[test]
    fn test_spin_per_tick() {
        let config = &RingConfig::default_set()[0];
        let mut ring = Ring::generate(config, 3.5, &mut rng());
        let before = ring.spin();
        ring.advance(0.016, 0.016);
        let delta = ring.spin() - before;
        assert!((delta - 0.001 * 0.016 * 60.0).abs() < 1e-7, "delta {delta}");
    }

    #[test]
    fn test_outer_ring_spins_fastest() {
        let rates: Vec<f32> = RingConfig::default_set()
            .iter()
            .map(|c| c.spin_per_frame.abs())
            .collect();
        assert!(rates[0] > rates[1] && rates[1] > rates[2], "rates {rates:?}");
    }

    #[test]
    fn test_tilt_oscillates_with_elapsed_time() {
        let config = &RingConfig::default_set()[0];
        let mut ring = Ring::generate(config, 0.0, &mut rng());
        ring.advance(0.016, 15.0);
        assert!((ring.tilt() - (1.5f32).sin() * 0.1).abs() < 1e-6);

        let inner = &RingConfig::default_set()[2];
        let mut ring = Ring::generate(inner, 0.0, &mut rng());
        ring.advance(0.016, 15.0);
        assert_eq!(ring.tilt(), 0.02);
    }

    #[test]
    fn test_model_matrix_centers_on_offset() {
        let config = &RingConfig::default_set()[0];
        let ring = Ring::generate(config, 3.5, &mut rng());
        let center = ring.model_matrix().transform_point3(Vec3::ZERO);
        assert!((center - Vec3::new(3.5, 0.0, 0.0)).length() < 1e-6);
    }
}
