//! Source scene representation.
//!
//! A [`SceneTree`] is what a file adapter in [`resources`](crate::resources) produces:
//! a forest of [`Node`]s that reference [`SourceMesh`]es by name, plus flat
//! tables of [`Material`]s and [`SourceLight`]s. The tree is never mutated once
//! it is handed to a [`Model`](crate::model::Model); everything derived from it
//! lives in side tables owned by the model.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Element of the scene hierarchy. May group children and/or reference one mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub mesh: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    /// A pure group node without geometry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: None,
            children: vec![],
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh.into()),
            children: vec![],
        }
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree that reference a mesh, this node included.
    pub fn count_mesh_nodes(&self) -> usize {
        let own = usize::from(self.mesh.is_some());
        own + self
            .children
            .iter()
            .map(Node::count_mesh_nodes)
            .sum::<usize>()
    }

    /// Number of nodes in this subtree, this node included.
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(Node::count_nodes).sum::<usize>()
    }
}

/// Triangle referencing three points of its mesh and optionally a material by name.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub points: [u32; 3],
    pub material: Option<String>,
}

impl Face {
    pub fn new(points: [u32; 3]) -> Self {
        Self {
            points,
            material: None,
        }
    }

    pub fn with_material(points: [u32; 3], material: impl Into<String>) -> Self {
        Self {
            points,
            material: Some(material.into()),
        }
    }
}

/// Raw geometry keyed by name.
///
/// If `texels` is present it must hold one entry per position; the mesh
/// compiler rejects the mesh otherwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub texels: Option<Vec<[f32; 2]>>,
    pub faces: Vec<Face>,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            positions,
            texels: None,
            faces,
        }
    }

    pub fn with_texels(mut self, texels: Vec<[f32; 2]>) -> Self {
        self.texels = Some(texels);
        self
    }

    /// Names of the materials used by this mesh's faces, in face order, repeats included.
    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().filter_map(|face| face.material.as_deref())
    }
}

/// Surface description. `texture` is the key used for texture deduplication.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub texture: Option<String>,
    /// Kept from the source file only. [`Appearance`](crate::data_structures::compiled::Appearance)
    /// always uses a black ambient term; scene ambient comes from the lights.
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    /// Normalized shininess in `0.0..=1.0`.
    pub shininess: f32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
            ambient: [0.0; 3],
            diffuse: [0.75; 3],
            specular: [0.0; 3],
            shininess: 0.0,
        }
    }

    pub fn with_texture(mut self, key: impl Into<String>) -> Self {
        self.texture = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceLight {
    pub name: String,
    pub position: [f32; 3],
    pub color: [f32; 3],
    /// Point the light is aimed at, for spot lights.
    pub spot: Option<[f32; 3]>,
    pub off: bool,
}

impl SourceLight {
    pub fn new(name: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            position,
            color: [1.0; 3],
            spot: None,
            off: false,
        }
    }
}

/// Read-only scene handed from a file adapter to the model.
#[derive(Clone, Debug, Default)]
pub struct SceneTree {
    path: PathBuf,
    roots: Vec<Node>,
    meshes: Vec<SourceMesh>,
    mesh_index: HashMap<String, usize>,
    materials: Vec<Material>,
    material_index: HashMap<String, usize>,
    lights: Vec<SourceLight>,
    images: HashMap<String, Vec<u8>>,
}

impl SceneTree {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// File the scene was read from. Texture keys are resolved relative to its directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_root(&mut self, node: Node) {
        self.roots.push(node);
    }

    /// Adds a mesh. A mesh with the same name replaces the previous one.
    pub fn add_mesh(&mut self, mesh: SourceMesh) {
        match self.mesh_index.get(&mesh.name) {
            Some(&idx) => self.meshes[idx] = mesh,
            None => {
                self.mesh_index.insert(mesh.name.clone(), self.meshes.len());
                self.meshes.push(mesh);
            }
        }
    }

    /// Adds a material. A material with the same name replaces the previous one.
    pub fn add_material(&mut self, material: Material) {
        match self.material_index.get(&material.name) {
            Some(&idx) => self.materials[idx] = material,
            None => {
                self.material_index
                    .insert(material.name.clone(), self.materials.len());
                self.materials.push(material);
            }
        }
    }

    pub fn add_light(&mut self, light: SourceLight) {
        self.lights.push(light);
    }

    /// Registers encoded image bytes that live inside the scene file itself.
    pub fn add_embedded_image(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(key.into(), bytes);
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn mesh(&self, name: &str) -> Option<&SourceMesh> {
        self.mesh_index.get(name).map(|&idx| &self.meshes[idx])
    }

    /// All meshes in insertion order.
    pub fn meshes(&self) -> &[SourceMesh] {
        &self.meshes
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.material_index.get(name).map(|&idx| &self.materials[idx])
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn lights(&self) -> &[SourceLight] {
        &self.lights
    }

    pub fn embedded_image(&self, key: &str) -> Option<&[u8]> {
        self.images.get(key).map(Vec::as_slice)
    }

    pub fn count_nodes(&self) -> usize {
        self.roots.iter().map(Node::count_nodes).sum()
    }

    pub fn count_mesh_nodes(&self) -> usize {
        self.roots.iter().map(Node::count_mesh_nodes).sum()
    }
}
