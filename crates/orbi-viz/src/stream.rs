//! Radial data streams flowing into the core.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use orbi_config::StreamConfig;
use rand::Rng;

use crate::particle::Particle;
use crate::ring::REFERENCE_FPS;

/// Planar distance at which a particle is recycled.
pub const RESET_DISTANCE: f32 = 0.2;

/// Radius particles start from and return to.
pub const OUTER_RADIUS: f32 = 8.0;

pub const STREAM_COLOR: u32 = 0xff4500;

const ARC_HEIGHT: f32 = 0.5;
const VELOCITY_MIN: f32 = 0.005;
const VELOCITY_SPAN: f32 = 0.005;

/// One radial lane of particles, stored in world space.
#[derive(Debug, Clone)]
pub struct StreamLane {
    angle: f32,
    velocity: f32,
    center: Vec3,
    particles: Vec<Particle>,
}

impl StreamLane {
    pub fn generate<R: Rng>(
        angle: f32,
        count: u32,
        offset: f32,
        rng: &mut R,
    ) -> Self {
        let center = Vec3::new(offset, 0.0, 0.0);
        let particles = (0..count)
            .map(|j| {
                let t = j as f32 / count as f32;
                let r = OUTER_RADIUS * (1.0 - t);
                let local = Vec3::new(angle.cos() * r, (t * PI).sin() * ARC_HEIGHT, angle.sin() * r);
                Particle::new(center + local, 0.6 - 0.2 * t, 0.08 + 0.05 * (1.0 - t))
            })
            .collect();

        Self {
            angle,
            velocity: VELOCITY_MIN + rng.random::<f32>() * VELOCITY_SPAN,
            center,
            particles,
        }
    }

    /// Move every particle inward. Particles closer than [`RESET_DISTANCE`]
    /// jump back to the outer radius in the same step.
    pub fn step(&mut self, dt: f32) {
        let frames = dt * REFERENCE_FPS;
        for p in &mut self.particles {
            let mut pos = p.pos();
            let x = pos.x - self.center.x;
            let z = pos.z - self.center.z;
            let dist = (x * x + z * z).sqrt();

            if dist < RESET_DISTANCE {
                let angle = z.atan2(x);
                pos = self.center + Vec3::new(angle.cos() * OUTER_RADIUS, 0.0, angle.sin() * OUTER_RADIUS);
            } else {
                // Step length grows as OUTER_RADIUS / dist and never crosses the core.
                let step = (self.velocity * frames * OUTER_RADIUS / dist)
                    .min(dist - RESET_DISTANCE * 0.5);
                let k = -step / dist;
                pos.x += x * k;
                pos.z += z * k;
            }
            p.position = pos.to_array();
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

/// All lanes, evenly spaced around the core.
pub fn generate_lanes<R: Rng>(config: &StreamConfig, offset: f32, rng: &mut R) -> Vec<StreamLane> {
    if !config.enabled {
        return Vec::new();
    }
    (0..config.lanes)
        .map(|i| {
            let angle = i as f32 / config.lanes as f32 * TAU;
            StreamLane::generate(angle, config.particles_per_lane, offset, rng)
        })
        .collect()
}
