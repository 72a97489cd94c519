//! Boundary to the draw backend.
//!
//! The pipeline never talks to a graphics context itself. A ready
//! [`Model`](crate::model::Model) describes a frame as a [`RenderState`] followed by
//! one [`DrawCall`] per compiled mesh, and a [`RenderSubmitter`] turns that into
//! actual GPU work.

use crate::data_structures::{
    compiled::CompiledMesh, light::LightUniform, texture::TextureHandle,
};

/// Fixed pipeline state for drawing a model.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub cull_back_faces: bool,
    pub smooth_shading: bool,
    pub lighting_enabled: bool,
    /// Active lights, empty when lighting is disabled.
    pub lights: Vec<LightUniform>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            cull_back_faces: true,
            smooth_shading: true,
            lighting_enabled: false,
            lights: vec![],
        }
    }
}

/// One indexed triangle-list draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    pub mesh: &'a CompiledMesh,
    pub texture: Option<TextureHandle>,
}

impl DrawCall<'_> {
    pub fn index_count(&self) -> u32 {
        self.mesh.indices.len() as u32
    }
}

pub trait RenderSubmitter {
    fn begin(&mut self, state: &RenderState);

    fn submit(&mut self, draw: DrawCall<'_>);

    fn end(&mut self) {}
}
