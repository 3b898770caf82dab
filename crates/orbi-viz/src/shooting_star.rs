//! Rare shooting-star trail.
//!
//! One pooled instance alternates between [`StarState::Idle`] and
//! [`StarState::Active`]. While idle it accumulates time against an interval
//! drawn once per idle period; when the interval elapses it launches from a
//! random point around the core along a direction that misses the core.

use std::f32::consts::TAU;

use glam::Vec3;
use orbi_config::ShootingStarConfig;
use rand::Rng;

pub const TRAIL_POINTS: usize = 8;

/// Head position runs ahead of progress by this factor, clamped to the path end.
pub const HEAD_SPEEDUP: f32 = 1.5;

/// Path fraction between consecutive trail points.
pub const TRAIL_SPACING: f32 = 0.04;

pub const HEAD_INTENSITY: f32 = 1.0;
pub const TAIL_INTENSITY: f32 = 0.2;

/// Fade-in and fade-out window in seconds.
pub const FADE_SECONDS: f32 = 0.3;

pub const MAX_DIRECTION_ATTEMPTS: usize = 10;

const LIFETIME_MIN: f32 = 1.0;
const LIFETIME_SPAN: f32 = 1.0;
const SPEED_MIN: f32 = 2.0;
const SPEED_SPAN: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarState {
    Idle,
    Active,
}

/// State transitions reported by [`ShootingStar::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarEvent {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone)]
pub struct ShootingStar {
    state: StarState,
    enabled: bool,
    next_interval_secs: f32,
    elapsed_since_last_secs: f32,
    progress: f32,
    lifetime: f32,
    start: Vec3,
    direction: Vec3,
    velocity: Vec3,
    trail: [Vec3; TRAIL_POINTS],
    opacity: f32,
    center: Vec3,
    core_radius: f32,
    max_distance: f32,
    min_interval_secs: f32,
    max_interval_secs: f32,
}

impl ShootingStar {
    /// Idle star around a core at `center`, with its first interval already drawn.
    pub fn new<R: Rng>(
        config: &ShootingStarConfig,
        center: Vec3,
        core_radius: f32,
        rng: &mut R,
    ) -> Self {
        let mut star = Self {
            state: StarState::Idle,
            enabled: config.enabled,
            next_interval_secs: 0.0,
            elapsed_since_last_secs: 0.0,
            progress: 0.0,
            lifetime: LIFETIME_MIN,
            start: center,
            direction: Vec3::X,
            velocity: Vec3::ZERO,
            trail: [center; TRAIL_POINTS],
            opacity: 0.0,
            center,
            core_radius,
            max_distance: config.max_distance.max(2.0 * core_radius),
            min_interval_secs: config.min_interval_secs,
            max_interval_secs: config.max_interval_secs,
        };
        star.next_interval_secs = star.draw_interval(rng);
        star
    }

    fn draw_interval<R: Rng>(&self, rng: &mut R) -> f32 {
        self.min_interval_secs + rng.random::<f32>() * (self.max_interval_secs - self.min_interval_secs)
    }

    /// Advance by `dt` seconds.
    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Option<StarEvent> {
        match self.state {
            StarState::Idle => {
                if !self.enabled {
                    return None;
                }
                self.elapsed_since_last_secs += dt;
                if self.elapsed_since_last_secs < self.next_interval_secs {
                    return None;
                }
                self.elapsed_since_last_secs = 0.0;
                self.next_interval_secs = self.draw_interval(rng);
                self.activate(rng);
                Some(StarEvent::Activated)
            }
            StarState::Active => {
                self.progress = (self.progress + dt / self.lifetime).min(1.0);
                if self.progress >= 1.0 {
                    self.state = StarState::Idle;
                    self.opacity = 0.0;
                    return Some(StarEvent::Deactivated);
                }
                self.trail = trail_points(self.start, self.velocity, self.progress);
                self.opacity = envelope_opacity(self.progress, self.lifetime);
                None
            }
        }
    }

    /// Launch immediately. Has no effect while already active.
    pub fn activate<R: Rng>(&mut self, rng: &mut R) {
        if self.state == StarState::Active {
            return;
        }

        let distance = 2.0 * self.core_radius
            + rng.random::<f32>() * (self.max_distance - 2.0 * self.core_radius);
        let start = self.center + random_unit_vector(rng) * distance;
        let candidates: Vec<Vec3> = (0..MAX_DIRECTION_ATTEMPTS)
            .map(|_| random_unit_vector(rng))
            .collect();
        let direction = resolve_direction(start, self.center, self.core_radius, candidates);

        self.lifetime = LIFETIME_MIN + rng.random::<f32>() * LIFETIME_SPAN;
        let speed = SPEED_MIN + rng.random::<f32>() * SPEED_SPAN;

        self.start = start;
        self.direction = direction;
        self.velocity = direction * speed * self.lifetime;
        self.trail = [start; TRAIL_POINTS];
        self.progress = 0.0;
        self.opacity = 0.0;
        self.state = StarState::Active;
    }

    pub fn state(&self) -> StarState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == StarState::Active
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn trail(&self) -> &[Vec3; TRAIL_POINTS] {
        &self.trail
    }

    pub fn next_interval_secs(&self) -> f32 {
        self.next_interval_secs
    }

    pub fn elapsed_since_last_secs(&self) -> f32 {
        self.elapsed_since_last_secs
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn core_radius(&self) -> f32 {
        self.core_radius
    }
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let z = 2.0 * rng.random::<f32>() - 1.0;
    let phi = rng.random::<f32>() * TAU;
    let s = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(s * phi.cos(), s * phi.sin(), z)
}

/// Distance from `center` to the nearest point of the ray from `origin` along `direction`.
pub fn closest_approach(origin: Vec3, direction: Vec3, center: Vec3) -> f32 {
    let t = (center - origin).dot(direction).max(0.0);
    (origin + direction * t).distance(center)
}

/// First candidate whose ray clears the core, or straight away from it.
pub fn resolve_direction(
    start: Vec3,
    center: Vec3,
    core_radius: f32,
    candidates: impl IntoIterator<Item = Vec3>,
) -> Vec3 {
    candidates
        .into_iter()
        .take(MAX_DIRECTION_ATTEMPTS)
        .map(|d| d.normalize_or_zero())
        .find(|&d| d != Vec3::ZERO && closest_approach(start, d, center) > core_radius)
        .unwrap_or_else(|| (start - center).normalize_or(Vec3::Y))
}

/// Fade envelope: ramp in over the first window, out over the last.
pub fn envelope_opacity(progress: f32, lifetime: f32) -> f32 {
    let fade = FADE_SECONDS / lifetime.max(f32::EPSILON);
    let opacity = if progress < fade {
        progress / fade
    } else if progress > 1.0 - fade {
        (1.0 - progress) / fade
    } else {
        1.0
    };
    opacity.clamp(0.0, 1.0)
}

/// Trail points from head (index 0) to tail.
pub fn trail_points(start: Vec3, velocity: Vec3, progress: f32) -> [Vec3; TRAIL_POINTS] {
    let head = (progress * HEAD_SPEEDUP).min(1.0);
    std::array::from_fn(|i| {
        let t = (head - i as f32 * TRAIL_SPACING).max(0.0);
        start + velocity * t
    })
}

/// Per-point intensity falling linearly from head to tail.
pub fn trail_intensities() -> [f32; TRAIL_POINTS] {
    std::array::from_fn(|i| {
        let f = i as f32 / (TRAIL_POINTS - 1) as f32;
        HEAD_INTENSITY + (TAIL_INTENSITY - HEAD_INTENSITY) * f
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CENTER: Vec3 = Vec3::new(3.5, 0.0, 0.0);
    const RADIUS: f32 = 1.3;

    fn star(rng: &mut ChaCha8Rng) -> ShootingStar {
        ShootingStar::new(&ShootingStarConfig::default(), CENTER, RADIUS, rng)
    }

    #[test]
    fn test_first_interval_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let s = star(&mut rng);
            assert!((30.0..=90.0).contains(&s.next_interval_secs()));
            assert_eq!(s.state(), StarState::Idle);
            assert_eq!(s.opacity(), 0.0);
        }
    }

    #[test]
    fn test_every_activation_clears_core() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut s = star(&mut rng);
        for i in 0..5_000 {
            s.activate(&mut rng);
            let approach = closest_approach(s.start(), s.direction(), CENTER);
            assert!(
                approach > RADIUS,
                "activation {i}: ray from {:?} along {:?} passes {approach} from core",
                s.start(),
                s.direction()
            );
            let d = s.start().distance(CENTER);
            assert!((2.0 * RADIUS - 1e-4..=5.0 + 1e-4).contains(&d), "start distance {d}");
            assert!((1.0..=2.0).contains(&s.lifetime()));
            // Return to idle so the next activation is not ignored.
            s.update(10.0, &mut rng);
        }
    }

    #[test]
    fn test_fallback_points_away_from_core() {
        let start = CENTER + Vec3::new(0.0, 0.0, 3.0);
        let toward = (CENTER - start).normalize();
        let dir = resolve_direction(start, CENTER, RADIUS, std::iter::repeat(toward));
        assert!((dir - Vec3::Z).length() < 1e-6);
        assert!(closest_approach(start, dir, CENTER) > RADIUS);
    }

    #[test]
    fn test_first_valid_candidate_wins() {
        let start = CENTER + Vec3::new(0.0, 0.0, 3.0);
        let toward = (CENTER - start).normalize();
        let candidates = [toward, toward, Vec3::X, Vec3::Y];
        let dir = resolve_direction(start, CENTER, RADIUS, candidates);
        assert_eq!(dir, Vec3::X);
    }

    #[test]
    fn test_candidates_beyond_attempt_bound_are_ignored() {
        let start = CENTER + Vec3::new(0.0, 0.0, 3.0);
        let toward = (CENTER - start).normalize();
        let mut candidates = vec![toward; MAX_DIRECTION_ATTEMPTS];
        candidates.push(Vec3::X);
        let dir = resolve_direction(start, CENTER, RADIUS, candidates);
        assert!((dir - Vec3::Z).length() < 1e-6, "fell through to {dir:?}");
    }

    #[test]
    fn test_lifecycle_progress_and_single_deactivation() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let mut s = star(&mut rng);
        s.activate(&mut rng);

        let mut last = s.progress();
        let mut deactivations = 0;
        for _ in 0..400 {
            let event = s.update(1.0 / 60.0, &mut rng);
            if s.is_active() {
                assert!(s.progress() >= last, "progress went backwards");
                assert!(s.progress() < 1.0);
                last = s.progress();
            }
            if event == Some(StarEvent::Deactivated) {
                deactivations += 1;
                assert!(s.progress() >= 1.0);
                assert_eq!(s.opacity(), 0.0);
            }
        }
        assert_eq!(deactivations, 1);
        assert_eq!(s.state(), StarState::Idle);
    }

    #[test]
    fn test_envelope_endpoints_and_middle() {
        for lifetime in [1.0, 1.5, 2.0] {
            assert_eq!(envelope_opacity(0.0, lifetime), 0.0);
            assert_eq!(envelope_opacity(1.0, lifetime), 0.0);
            assert!(envelope_opacity(0.5, lifetime) > 0.0);
        }
        assert!(envelope_opacity(0.05, 1.0) < envelope_opacity(0.1, 1.0));
        assert!(envelope_opacity(0.95, 1.0) < envelope_opacity(0.9, 1.0));
    }

    #[test]
    fn test_idle_accumulator_schedules_activation() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut s = star(&mut rng);
        let interval = s.next_interval_secs();

        let mut elapsed = 0.0;
        while elapsed + 0.5 < interval {
            assert_eq!(s.update(0.5, &mut rng), None);
            elapsed += 0.5;
        }
        assert!((s.elapsed_since_last_secs() - elapsed).abs() < 1e-3);

        let mut fired = None;
        for _ in 0..4 {
            if let Some(e) = s.update(0.5, &mut rng) {
                fired = Some(e);
                break;
            }
        }
        assert_eq!(fired, Some(StarEvent::Activated));
        assert_eq!(s.elapsed_since_last_secs(), 0.0);
        assert!((30.0..=90.0).contains(&s.next_interval_secs()));
    }

    #[test]
    fn test_interval_drawn_once_per_idle_period() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut s = star(&mut rng);
        let interval = s.next_interval_secs();
        for _ in 0..20 {
            s.update(0.1, &mut rng);
            assert_eq!(s.next_interval_secs(), interval);
        }
    }

    #[test]
    fn test_accumulator_frozen_while_active() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut s = star(&mut rng);
        s.activate(&mut rng);
        s.update(0.1, &mut rng);
        s.update(0.1, &mut rng);
        assert_eq!(s.elapsed_since_last_secs(), 0.0);
    }

    #[test]
    fn test_activate_ignored_while_active() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut s = star(&mut rng);
        s.activate(&mut rng);
        let start = s.start();
        s.update(0.1, &mut rng);
        s.activate(&mut rng);
        assert_eq!(s.start(), start);
        assert!(s.progress() > 0.0);
    }

    #[test]
    fn test_disabled_star_never_fires() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let config = ShootingStarConfig {
            enabled: false,
            ..ShootingStarConfig::default()
        };
        let mut s = ShootingStar::new(&config, CENTER, RADIUS, &mut rng);
        for _ in 0..200 {
            assert_eq!(s.update(1.0, &mut rng), None);
        }
    }

    #[test]
    fn test_trail_head_leads_and_clamps_to_start() {
        let start = Vec3::ZERO;
        let velocity = Vec3::new(4.0, 0.0, 0.0);
        let early = trail_points(start, velocity, 0.01);
        assert_eq!(early[TRAIL_POINTS - 1], start);
        assert!(early[0].x > 0.0);

        let late = trail_points(start, velocity, 0.9);
        assert_eq!(late[0], velocity);
        for pair in late.windows(2) {
            assert!(pair[0].x > pair[1].x, "trail not ordered head to tail");
        }
    }

    #[test]
    fn test_intensity_falls_head_to_tail() {
        let k = trail_intensities();
        assert_eq!(k[0], HEAD_INTENSITY);
        assert!((k[TRAIL_POINTS - 1] - TAIL_INTENSITY).abs() < 1e-6);
        assert!(k.windows(2).all(|w| w[0] > w[1]));
    }
}
