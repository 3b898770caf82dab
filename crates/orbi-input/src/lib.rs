//! Pointer and touch input for orbiting the camera.
//!
//! Mouse drags and horizontal touch swipes feed an [`OrbitController`].
//! Vertical touch swipes are released to the host so the page can scroll.

pub mod orbit;
pub mod pointer;
pub mod touch;

pub use orbit::OrbitController;
pub use pointer::PointerState;
pub use touch::{GestureDecision, SwipeAxis, TouchGestures, TouchOutcome};
