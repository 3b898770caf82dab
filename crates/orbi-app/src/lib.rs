//! Native host for the Orbi visualization: window, event loop and frame pacing.

pub mod frame_clock;
pub mod platform;
pub mod window;
