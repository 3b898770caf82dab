//! Damped orbit around a fixed target.
//!
//! Drags rotate the camera on a sphere around the target (yaw about +Y and
//! pitch toward the poles). Distance to the target never changes: there is
//! no zoom and no pan. Rotation input is queued and bled into the camera a
//! fraction per frame, which gives the coasting feel after a release.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Keeps the camera off the poles, where the up vector degenerates.
const POLE_EPSILON: f32 = 1e-4;

/// Pending rotation smaller than this is dropped.
const SETTLE_EPSILON: f32 = 1e-6;

/// Frame rate the damping factor is expressed against.
const REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Clone)]
pub struct OrbitController {
    target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    rotate_speed: f32,
    damping_factor: f32,
}

impl OrbitController {
    /// Start from an existing camera placement.
    pub fn new(position: Vec3, target: Vec3, rotate_speed: f32, damping_factor: f32) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target,
            radius,
            theta,
            phi: phi.clamp(POLE_EPSILON, PI - POLE_EPSILON),
            pending_theta: 0.0,
            pending_phi: 0.0,
            rotate_speed,
            damping_factor: damping_factor.clamp(0.0, 1.0),
        }
    }

    /// Queue a drag of `delta` logical pixels over a viewport `viewport_height` tall.
    ///
    /// A drag across the full viewport height turns a full circle at speed 1.
    pub fn rotate_by_pixels(&mut self, delta: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let scale = TAU / viewport_height * self.rotate_speed;
        self.pending_theta -= delta.x * scale;
        self.pending_phi -= delta.y * scale;
    }

    /// Apply queued rotation for a frame of `dt` seconds and return the
    /// camera position.
    pub fn update(&mut self, dt: f32) -> Vec3 {
        let step = if self.damping_factor > 0.0 {
            1.0 - (1.0 - self.damping_factor).powf(dt.max(0.0) * REFERENCE_FPS)
        } else {
            1.0
        };

        self.theta = (self.theta + self.pending_theta * step).rem_euclid(TAU);
        self.phi = (self.phi + self.pending_phi * step).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.pending_theta *= 1.0 - step;
        self.pending_phi *= 1.0 - step;

        if self.pending_theta.abs() < SETTLE_EPSILON {
            self.pending_theta = 0.0;
        }
        if self.pending_phi.abs() < SETTLE_EPSILON {
            self.pending_phi = 0.0;
        }

        self.position()
    }

    /// Current camera position.
    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Azimuth and polar angle in radians.
    pub fn angles(&self) -> (f32, f32) {
        (self.theta, self.phi)
    }

    /// Whether queued rotation is still being applied.
    pub fn is_moving(&self) -> bool {
        self.pending_theta != 0.0 || self.pending_phi != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn desktop() -> OrbitController {
        OrbitController::new(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, 0.5, 0.05)
    }

    #[test]
    fn test_initial_position_round_trips() {
        let orbit = desktop();
        assert!((orbit.position() - Vec3::new(0.0, 2.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn test_idle_update_keeps_position() {
        let mut orbit = desktop();
        let before = orbit.position();
        let after = orbit.update(FRAME);
        assert!((after - before).length() < 1e-5);
        assert!(!orbit.is_moving());
    }

    #[test]
    fn test_drag_preserves_distance() {
        let mut orbit = desktop();
        let radius = orbit.radius();
        orbit.rotate_by_pixels(Vec2::new(120.0, -40.0), 600.0);
        for _ in 0..200 {
            let pos = orbit.update(FRAME);
            assert!((pos.length() - radius).abs() < 1e-3, "zoom must stay disabled");
        }
    }

    #[test]
    fn test_damping_applies_fraction_per_frame() {
        let mut orbit = desktop();
        let (theta0, _) = orbit.angles();
        orbit.rotate_by_pixels(Vec2::new(-60.0, 0.0), 600.0);
        orbit.update(FRAME);
        let (theta1, _) = orbit.angles();
        let total = TAU / 600.0 * 0.5 * 60.0;
        assert!(
            ((theta1 - theta0) - total * 0.05).abs() < 1e-4,
            "expected 5% of {total}, got {}",
            theta1 - theta0
        );
        assert!(orbit.is_moving());
    }

    #[test]
    fn test_rotation_settles() {
        let mut orbit = desktop();
        orbit.rotate_by_pixels(Vec2::new(100.0, 0.0), 600.0);
        for _ in 0..2000 {
            orbit.update(FRAME);
        }
        assert!(!orbit.is_moving());
    }

    #[test]
    fn test_undamped_applies_immediately() {
        let mut orbit = OrbitController::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0, 0.0);
        orbit.rotate_by_pixels(Vec2::new(-150.0, 0.0), 600.0);
        let pos = orbit.update(FRAME);
        // Quarter turn toward +X.
        assert!((pos - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-3, "got {pos}");
    }

    #[test]
    fn test_pitch_clamped_at_poles() {
        let mut orbit = OrbitController::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0, 0.0);
        orbit.rotate_by_pixels(Vec2::new(0.0, 10_000.0), 600.0);
        orbit.update(FRAME);
        let (_, phi) = orbit.angles();
        assert!(phi > 0.0 && phi < PI);
        assert!(orbit.position().is_finite());
    }

    #[test]
    fn test_zero_height_viewport_ignores_drag() {
        let mut orbit = desktop();
        orbit.rotate_by_pixels(Vec2::new(300.0, 0.0), 0.0);
        assert!(!orbit.is_moving());
    }

    #[test]
    fn test_orbits_around_offset_target() {
        let target = Vec3::new(3.5, 0.0, 0.0);
        let mut orbit = OrbitController::new(target + Vec3::Z * 5.0, target, 1.0, 0.0);
        orbit.rotate_by_pixels(Vec2::new(300.0, 0.0), 600.0);
        let pos = orbit.update(FRAME);
        assert!((pos.distance(target) - 5.0).abs() < 1e-4);
    }
}
