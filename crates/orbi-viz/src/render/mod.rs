//! GPU renderers for the scene entities.

pub mod body;
pub mod points;
pub mod trail;

pub use body::{CoreRenderer, CoreUniform};
pub use points::{PointCloud, PointsRenderer, PointsUniform, ShadingMode};
pub use trail::TrailRenderer;
