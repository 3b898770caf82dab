//! Particle shading terms.
//!
//! These mirror the WGSL in [`crate::render::points`] so the brightness
//! ordering can be checked without a GPU: lit side brighter than the side
//! shadowed by the core, near particles brighter than far ones.

use glam::Vec3;

/// Point light used by ring and stream particles.
pub const PARTICLE_LIGHT_POSITION: Vec3 = Vec3::new(100.0, 20.0, 50.0);

/// Lowest Lambert term a ring particle can get.
pub const RING_MIN_INTENSITY: f32 = 0.5;

/// Multiplier for ring particles behind the core relative to the light.
pub const CORE_SHADOW_FACTOR: f32 = 0.75;

/// Cosine above which a particle counts as behind the core.
pub const CORE_SHADOW_COS: f32 = 0.8;

pub const RING_BRIGHTNESS_BOOST: f32 = 1.35;

/// View depth at which the fog term bottoms out.
pub const FOG_DEPTH: f32 = 25.0;
pub const FOG_MIN: f32 = 0.65;

/// Ring intensity for a particle at `local` (relative to the ring center).
pub fn ring_intensity(local: Vec3, light: Vec3) -> f32 {
    let normal = local.normalize_or_zero();
    let light_dir = (light - local).normalize_or_zero();
    let mut intensity = normal.dot(light_dir).max(RING_MIN_INTENSITY);

    let to_core = (-local).normalize_or_zero();
    if local.length() > 1.0 && to_core.dot(light.normalize_or_zero()) > CORE_SHADOW_COS {
        intensity *= CORE_SHADOW_FACTOR;
    }
    intensity
}

/// Depth darkening in [`FOG_MIN`, 1].
pub fn depth_factor(view_depth: f32) -> f32 {
    (1.0 - view_depth / FOG_DEPTH).clamp(FOG_MIN, 1.0)
}

/// Final ring particle color before alpha.
pub fn shade_ring(color: [f32; 3], local: Vec3, light: Vec3, view_depth: f32) -> [f32; 3] {
    let k = ring_intensity(local, light) * RING_BRIGHTNESS_BOOST * depth_factor(view_depth);
    color.map(|c| c * k)
}

/// Stream particle intensity; softer than rings and never fully dark.
pub fn stream_intensity(position: Vec3, light: Vec3) -> f32 {
    let light_dir = (light - position).normalize_or_zero();
    0.6 + 0.4 * position.normalize_or_zero().dot(light_dir)
}
