//! wgpu plumbing for Orbi: device and surface setup, viewport sizing, camera,
//! depth buffer, render passes, buffers and textures.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod surface;
pub mod texture;

pub use buffer::{
    BufferAllocator, IndexData, MeshBuffer, VertexPositionColor, VertexPositionNormalUv,
};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{BACKDROP, FrameEncoder, RenderPassBuilder};
pub use pipeline::{ADDITIVE_BLEND, CAMERA_GROUP, CameraBinding, create_shader};
pub use surface::{MIN_SURFACE_DIMENSION, PixelSize, Viewport, ViewportResizeEvent};
pub use texture::{COLOR_MAP_FORMAT, GpuTexture, TextureBinder, TextureError};
