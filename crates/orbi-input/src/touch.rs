//! Touch gesture disambiguation.
//!
//! A touch gesture orbits the camera only when it is a horizontal swipe.
//! Direction is decided once per gesture, the first time the finger travels
//! past a fixed pixel threshold along either axis, and is held until the
//! finger lifts. Vertical swipes are released so the host can scroll.

use glam::Vec2;
use winit::event::TouchPhase;

/// Default travel in logical pixels before a swipe's direction is decided.
pub const TOUCH_DIRECTION_THRESHOLD: f32 = 10.0;

/// Dominant axis of a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAxis {
    Horizontal,
    Vertical,
}

/// What happens to the rest of a gesture once its axis is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureDecision {
    /// The gesture drives the orbit and host scrolling is suppressed.
    Capture,
    /// The gesture belongs to the host (page scroll).
    Release,
}

/// Result of feeding one touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchOutcome {
    /// Direction not decided yet, or the touch is not the tracked one.
    Pending,
    /// Rotate the orbit by this many logical pixels.
    Orbit(Vec2),
    /// The gesture was handed to the host; nothing to do here.
    Released,
    /// The gesture ended.
    Ended,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    id: u64,
    start: Vec2,
    last: Vec2,
    decision: Option<GestureDecision>,
}

/// Tracks the primary touch and decides what each gesture is for.
///
/// Only the first finger down is tracked; additional fingers are ignored
/// because zoom and pan are not offered.
#[derive(Debug, Clone)]
pub struct TouchGestures {
    threshold: f32,
    /// When false (desktop), every drag orbits without a direction check.
    disambiguate: bool,
    active: Option<Gesture>,
}

impl TouchGestures {
    pub fn new(threshold: f32, disambiguate: bool) -> Self {
        Self {
            threshold: threshold.max(0.0),
            disambiguate,
            active: None,
        }
    }

    /// Axis of a displacement once it exceeds the threshold on either axis.
    /// Ties go to vertical so scrolling wins ambiguous swipes.
    pub fn classify(&self, displacement: Vec2) -> Option<SwipeAxis> {
        classify_displacement(self.threshold, displacement)
    }

    /// Feed a winit `Touch` event in logical pixels.
    pub fn on_touch(&mut self, phase: TouchPhase, id: u64, x: f64, y: f64) -> TouchOutcome {
        let pos = Vec2::new(x as f32, y as f32);
        match phase {
            TouchPhase::Started => {
                if self.active.is_none() {
                    self.active = Some(Gesture {
                        id,
                        start: pos,
                        last: pos,
                        decision: (!self.disambiguate).then_some(GestureDecision::Capture),
                    });
                }
                TouchOutcome::Pending
            }
            TouchPhase::Moved => self.on_move(id, pos),
            TouchPhase::Ended | TouchPhase::Cancelled => match self.active {
                Some(g) if g.id == id => {
                    self.active = None;
                    tracing::trace!(touch = id, "touch gesture ended");
                    TouchOutcome::Ended
                }
                _ => TouchOutcome::Pending,
            },
        }
    }

    fn on_move(&mut self, id: u64, pos: Vec2) -> TouchOutcome {
        let Some(gesture) = self.active.as_mut().filter(|g| g.id == id) else {
            return TouchOutcome::Pending;
        };

        if gesture.decision.is_none() {
            let axis = match classify_displacement(self.threshold, pos - gesture.start) {
                Some(axis) => axis,
                None => return TouchOutcome::Pending,
            };
            let decision = match axis {
                SwipeAxis::Horizontal => GestureDecision::Capture,
                SwipeAxis::Vertical => GestureDecision::Release,
            };
            tracing::debug!(touch = id, ?axis, ?decision, "touch direction decided");
            gesture.decision = Some(decision);
        }

        let delta = pos - gesture.last;
        gesture.last = pos;
        match gesture.decision {
            Some(GestureDecision::Capture) => TouchOutcome::Orbit(delta),
            Some(GestureDecision::Release) => TouchOutcome::Released,
            None => TouchOutcome::Pending,
        }
    }

    /// Decision for the gesture in progress, if one has been made.
    pub fn current_decision(&self) -> Option<GestureDecision> {
        self.active.and_then(|g| g.decision)
    }

    /// Whether host scrolling should be suppressed right now.
    pub fn is_capturing(&self) -> bool {
        self.current_decision() == Some(GestureDecision::Capture)
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

fn classify_displacement(threshold: f32, displacement: Vec2) -> Option<SwipeAxis> {
    let (dx, dy) = (displacement.x.abs(), displacement.y.abs());
    if dx <= threshold && dy <= threshold {
        return None;
    }
    Some(if dx > dy {
        SwipeAxis::Horizontal
    } else {
        SwipeAxis::Vertical
    })
}

impl Default for TouchGestures {
    fn default() -> Self {
        Self::new(TOUCH_DIRECTION_THRESHOLD, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(gestures: &mut TouchGestures, points: &[(f64, f64)]) -> Vec<TouchOutcome> {
        let mut out = Vec::new();
        let (x0, y0) = points[0];
        out.push(gestures.on_touch(TouchPhase::Started, 1, x0, y0));
        for &(x, y) in &points[1..] {
            out.push(gestures.on_touch(TouchPhase::Moved, 1, x, y));
        }
        out
    }

    #[test]
    fn test_small_motion_stays_pending() {
        let mut g = TouchGestures::default();
        let out = swipe(&mut g, &[(100.0, 100.0), (105.0, 103.0), (110.0, 108.0)]);
        assert!(out.iter().all(|o| *o == TouchOutcome::Pending), "got {out:?}");
        assert_eq!(g.current_decision(), None);
    }

    #[test]
    fn test_horizontal_swipe_orbits() {
        let mut g = TouchGestures::default();
        let out = swipe(&mut g, &[(100.0, 100.0), (112.0, 102.0), (130.0, 104.0)]);
        assert_eq!(out[1], TouchOutcome::Orbit(Vec2::new(12.0, 2.0)));
        assert_eq!(out[2], TouchOutcome::Orbit(Vec2::new(18.0, 2.0)));
        assert!(g.is_capturing());
    }

    #[test]
    fn test_vertical_swipe_is_released() {
        let mut g = TouchGestures::default();
        let out = swipe(&mut g, &[(100.0, 100.0), (102.0, 115.0)]);
        assert_eq!(out[1], TouchOutcome::Released);
        assert_eq!(g.current_decision(), Some(GestureDecision::Release));
    }

    #[test]
    fn test_decision_is_held_for_whole_gesture() {
        let mut g = TouchGestures::default();
        // Starts vertical, then turns sideways: must stay released.
        let out = swipe(
            &mut g,
            &[(100.0, 100.0), (100.0, 120.0), (200.0, 121.0), (300.0, 122.0)],
        );
        assert!(
            out[1..].iter().all(|o| *o == TouchOutcome::Released),
            "got {out:?}"
        );
    }

    #[test]
    fn test_new_gesture_decides_again() {
        let mut g = TouchGestures::default();
        swipe(&mut g, &[(0.0, 0.0), (0.0, 40.0)]);
        assert_eq!(g.on_touch(TouchPhase::Ended, 1, 0.0, 40.0), TouchOutcome::Ended);
        let out = swipe(&mut g, &[(0.0, 0.0), (40.0, 0.0)]);
        assert!(matches!(out[1], TouchOutcome::Orbit(_)));
    }

    #[test]
    fn test_diagonal_tie_goes_to_vertical() {
        let g = TouchGestures::default();
        assert_eq!(g.classify(Vec2::new(15.0, -15.0)), Some(SwipeAxis::Vertical));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let g = TouchGestures::default();
        assert_eq!(g.classify(Vec2::new(10.0, 0.0)), None);
        assert_eq!(g.classify(Vec2::new(10.5, 0.0)), Some(SwipeAxis::Horizontal));
    }

    #[test]
    fn test_second_finger_ignored() {
        let mut g = TouchGestures::default();
        g.on_touch(TouchPhase::Started, 1, 0.0, 0.0);
        g.on_touch(TouchPhase::Started, 2, 50.0, 50.0);
        assert_eq!(g.on_touch(TouchPhase::Moved, 2, 90.0, 50.0), TouchOutcome::Pending);
        assert_eq!(g.on_touch(TouchPhase::Ended, 2, 90.0, 50.0), TouchOutcome::Pending);
        assert!(matches!(
            g.on_touch(TouchPhase::Moved, 1, 30.0, 0.0),
            TouchOutcome::Orbit(_)
        ));
    }

    #[test]
    fn test_cancel_clears_gesture() {
        let mut g = TouchGestures::default();
        swipe(&mut g, &[(0.0, 0.0), (30.0, 0.0)]);
        assert_eq!(
            g.on_touch(TouchPhase::Cancelled, 1, 30.0, 0.0),
            TouchOutcome::Ended
        );
        assert!(!g.is_capturing());
    }

    #[test]
    fn test_without_disambiguation_every_drag_orbits() {
        let mut g = TouchGestures::new(TOUCH_DIRECTION_THRESHOLD, false);
        let out = swipe(&mut g, &[(0.0, 0.0), (0.0, 3.0)]);
        assert_eq!(out[1], TouchOutcome::Orbit(Vec2::new(0.0, 3.0)));
    }
}
