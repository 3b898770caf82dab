//! Per-particle attributes shared by every point cloud.

use bytemuck::{Pod, Zeroable};

/// One point of a point cloud, laid out for direct upload as instance data.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 3],
    pub opacity: f32,
    /// World-space size before perspective attenuation.
    pub size: f32,
}

impl Particle {
    pub fn new(position: glam::Vec3, opacity: f32, size: f32) -> Self {
        Self {
            position: position.to_array(),
            opacity,
            size,
        }
    }

    pub fn pos(&self) -> glam::Vec3 {
        glam::Vec3::from_array(self.position)
    }

    /// Instance-rate vertex layout: position, opacity, size at locations 0..3.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}
