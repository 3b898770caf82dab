//! The Orbi planet visualization.
//!
//! A textured core body with three particle rings, a background starfield,
//! optional radial data streams and a rare shooting star. [`AnimationDriver`]
//! owns and advances the CPU-side [`Scene`]; [`Visualization`] mirrors it onto
//! the GPU and records the draw calls.

pub mod color;
pub mod core_body;
pub mod driver;
pub mod particle;
pub mod render;
pub mod ring;
pub mod scene;
pub mod shading;
pub mod shooting_star;
pub mod starfield;
pub mod stream;
pub mod texture_loader;
pub mod visualization;

pub use core_body::{CoreBody, CoreMaterial, TextureState};
pub use driver::{AnimationDriver, DriverState, FrameUpdate};
pub use particle::Particle;
pub use ring::Ring;
pub use scene::{DeviceClass, LightRig, Scene, SceneSetup};
pub use shooting_star::{ShootingStar, StarEvent, StarState};
pub use starfield::Starfield;
pub use stream::StreamLane;
pub use texture_loader::{DecodedImage, TextureLoadError, TextureLoader, TextureSource};
pub use visualization::Visualization;
