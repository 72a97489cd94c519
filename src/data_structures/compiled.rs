//! Render-ready mesh buffers.
//!
//! The layout of [`CompiledMesh`] is the contract with the draw backend:
//! positions are 3 x `f32` per vertex, normals 3 x `f32` per vertex with the same
//! indexing, UVs 2 x `f32` per vertex or absent, and indices are `u16`.

use crate::data_structures::{scene::Material, texture::TextureHandle};

pub const POSITION_COMPONENTS: usize = 3;
pub const NORMAL_COMPONENTS: usize = 3;
pub const UV_COMPONENTS: usize = 2;
/// Largest vertex count addressable with 16-bit indices.
pub const MAX_VERTICES: usize = u16::MAX as usize;

/// Fixed-function style surface colours used when a mesh is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// Specular exponent, already expanded from the normalized shininess.
    pub shininess: f32,
}

impl Appearance {
    /// Largest specular exponent a material may expand to.
    pub const MAX_SHININESS: f32 = 128.0;

    pub fn from_material(material: &Material) -> Self {
        let rgba = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
        Self {
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse: rgba(material.diffuse),
            specular: rgba(material.specular),
            shininess: 2f32
                .powf(10.0 * material.shininess)
                .min(Self::MAX_SHININESS),
        }
    }
}

impl Default for Appearance {
    /// Grey surface for meshes without any material.
    fn default() -> Self {
        Self {
            ambient: [0.25, 0.25, 0.25, 1.0],
            diffuse: [0.75, 0.75, 0.75, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
        }
    }
}

/// Flattened geometry of one mesh-bearing node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledMesh {
    /// Node the mesh was emitted for.
    pub node: String,
    /// Source mesh name.
    pub mesh: String,
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    /// Empty when the mesh has no texture.
    pub uvs: Vec<f32>,
    pub indices: Vec<u16>,
    pub texture: Option<TextureHandle>,
    pub texture_key: Option<String>,
    pub appearance: Appearance,
}

impl CompiledMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / POSITION_COMPONENTS
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices
            .chunks_exact(POSITION_COMPONENTS)
            .map(|p| [p[0], p[1], p[2]])
    }

    pub fn normal(&self, vertex: usize) -> Option<[f32; 3]> {
        let n = self
            .normals
            .get(vertex * NORMAL_COMPONENTS..(vertex + 1) * NORMAL_COMPONENTS)?;
        Some([n[0], n[1], n[2]])
    }

    /// Checks the buffer invariants the draw backend relies on.
    pub fn is_consistent(&self) -> bool {
        let vertex_count = self.vertex_count();
        self.vertices.len() % POSITION_COMPONENTS == 0
            && self.normals.len() == self.vertices.len()
            && (self.uvs.is_empty() || self.uvs.len() == vertex_count * UV_COMPONENTS)
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < vertex_count)
    }
}
