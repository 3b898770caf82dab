//! The central planet: a UV sphere with a placeholder material that is
//! swapped for a loaded texture when one arrives.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use orbi_render::VertexPositionNormalUv;

use crate::color::hex_to_linear;
use crate::texture_loader::{DecodedImage, TextureLoadError};

pub const SPHERE_SEGMENTS: u32 = 32;

const PLACEHOLDER_COLOR: u32 = 0xff4500;
const EMISSIVE_INTENSITY: f32 = 0.2;
const ROUGHNESS: f32 = 0.7;
const METALNESS: f32 = 0.3;

/// Resolution of the asynchronous color map.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreMaterial {
    /// Linear RGB multiplier for the color map.
    pub base_color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// `None` when no texture source is configured.
    pub color_map: Option<TextureState>,
}

impl CoreMaterial {
    fn placeholder() -> Self {
        let color = hex_to_linear(PLACEHOLDER_COLOR);
        Self {
            base_color: color,
            emissive: color,
            emissive_intensity: EMISSIVE_INTENSITY,
            roughness: ROUGHNESS,
            metalness: METALNESS,
            color_map: None,
        }
    }

    pub fn has_texture(&self) -> bool {
        matches!(self.color_map, Some(TextureState::Loaded { .. }))
    }
}

#[derive(Debug, Clone)]
pub struct CoreBody {
    pub radius: f32,
    pub position: Vec3,
    pub material: CoreMaterial,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

impl CoreBody {
    /// Core at `(offset, 0, 0)`. `texture_requested` marks the color map as pending.
    pub fn new(radius: f32, offset: f32, texture_requested: bool) -> Self {
        let mut material = CoreMaterial::placeholder();
        if texture_requested {
            material.color_map = Some(TextureState::Pending);
        }
        Self {
            radius,
            position: Vec3::new(offset, 0.0, 0.0),
            material,
            casts_shadow: true,
            receives_shadow: true,
        }
    }

    /// Apply the texture load outcome.
    ///
    /// On success the image is handed back for upload and the base color turns
    /// white so the texture shows its own colors. On failure the placeholder
    /// stays and the error is logged.
    pub fn resolve_texture(
        &mut self,
        result: Result<DecodedImage, TextureLoadError>,
    ) -> Option<DecodedImage> {
        match result {
            Ok(image) => {
                tracing::info!(width = image.width, height = image.height, "core texture loaded");
                self.material.base_color = [1.0; 3];
                self.material.color_map = Some(TextureState::Loaded {
                    width: image.width,
                    height: image.height,
                });
                Some(image)
            }
            Err(e) => {
                self.fail_texture(&e);
                None
            }
        }
    }

    /// Mark the color map as failed and restore the placeholder look.
    pub fn fail_texture(&mut self, reason: &dyn std::fmt::Display) {
        tracing::error!(error = %reason, "core texture failed to load, keeping placeholder");
        self.material.base_color = hex_to_linear(PLACEHOLDER_COLOR);
        self.material.color_map = Some(TextureState::Failed(reason.to_string()));
    }

    pub fn texture_state(&self) -> Option<&TextureState> {
        self.material.color_map.as_ref()
    }
}

/// UV sphere centered at the origin, `segments` around and `segments` pole to pole.
pub fn sphere_mesh(radius: f32, segments: u32) -> (Vec<VertexPositionNormalUv>, Vec<u16>) {
    let segments = segments.max(3);
    let rings = segments;
    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    for y in 0..=rings {
        let v = y as f32 / rings as f32;
        let polar = v * PI;
        for x in 0..=segments {
            let u = x as f32 / segments as f32;
            let azimuth = u * TAU;
            let normal = Vec3::new(
                -azimuth.cos() * polar.sin(),
                polar.cos(),
                azimuth.sin() * polar.sin(),
            );
            vertices.push(VertexPositionNormalUv {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
                uv: [u, v],
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for y in 0..rings {
        for x in 0..segments {
            let a = (y * stride + x) as u16;
            let b = ((y + 1) * stride + x) as u16;
            let c = ((y + 1) * stride + x + 1) as u16;
            let d = (y * stride + x + 1) as u16;
            if y != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if y != rings - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    (vertices, indices)
}
