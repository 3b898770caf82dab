//! Static background starfield around the core.

use std::f32::consts::TAU;

use glam::Vec3;
use orbi_config::StarfieldConfig;
use rand::Rng;

use crate::particle::Particle;

/// Share of the nominal radius the field actually occupies.
pub const FIELD_SCALE: f32 = 0.26;

pub const STAR_COLOR: u32 = 0x5a5a5a;
pub const STAR_SIZE: f32 = 0.0035;
pub const STAR_OPACITY: f32 = 1.0;

/// Rejection sampling gives up after this many candidates per requested star.
const MAX_ATTEMPTS_PER_STAR: u32 = 64;

#[derive(Debug, Clone)]
pub struct Starfield {
    particles: Vec<Particle>,
    center: Vec3,
    exclusion_radius: f32,
}

impl Starfield {
    /// Volumetrically uniform stars in a ball around the core, skipping the
    /// exclusion shell of `exclusion_multiple * core_radius`.
    pub fn generate<R: Rng>(
        config: &StarfieldConfig,
        offset: f32,
        core_radius: f32,
        rng: &mut R,
    ) -> Self {
        let center = Vec3::new(offset, 0.0, 0.0);
        let field_radius = config.radius * FIELD_SCALE;
        let exclusion_radius = config.exclusion_multiple * core_radius;
        let wanted = config.count as usize;

        let mut particles = Vec::with_capacity(wanted);
        let mut attempts = 0u32;
        let budget = config.count.saturating_mul(MAX_ATTEMPTS_PER_STAR);
        while particles.len() < wanted && attempts < budget {
            attempts += 1;
            let local = sample_ball(field_radius, rng);
            if local.length() <= exclusion_radius {
                continue;
            }
            particles.push(Particle::new(center + local, STAR_OPACITY, STAR_SIZE));
        }

        if particles.len() < wanted {
            tracing::warn!(
                generated = particles.len(),
                requested = wanted,
                field_radius,
                exclusion_radius,
                "starfield shell too thin, generated fewer stars than requested"
            );
        }

        Self {
            particles,
            center,
            exclusion_radius,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn exclusion_radius(&self) -> f32 {
        self.exclusion_radius
    }
}

/// Uniform point in a ball: uniform direction, cube-root radius.
fn sample_ball<R: Rng>(radius: f32, rng: &mut R) -> Vec3 {
    let theta = rng.random::<f32>() * TAU;
    let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = radius * rng.random::<f32>().cbrt();
    let sin_phi = phi.sin();
    Vec3::new(
        r * sin_phi * theta.cos(),
        r * sin_phi * theta.sin(),
        r * phi.cos(),
    )
}
