//! flow-model
//!
//! Turns hierarchical 3D scene files (OBJ, glTF) into render-ready data:
//! deduplicated GPU textures, flat per-mesh position/normal/UV/index buffers, a
//! model centered at the origin with a bounding radius, and a light registry.
//! Loading is single-threaded and synchronous; a model either loads completely
//! or not at all.
//!
//! High-level modules
//! - `data_structures`: scene trees, compiled meshes, textures, bounds and lights
//! - `resources`: file adapters, the texture cache and the mesh compiler
//! - `model`: the [`Model`] aggregate driving the load -> prepare -> render lifecycle
//! - `render`: the boundary a draw backend implements to consume a ready model
//! - `gpu`: wgpu implementations of the texture upload and buffer boundary
//! - `settings`: pipeline configuration read from TOML
//! - `error`: the error taxonomy
//!

pub mod data_structures;
pub mod error;
pub mod gpu;
pub mod model;
pub mod render;
pub mod resources;
pub mod settings;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::{
    compiled::CompiledMesh,
    light::{LightRegistry, LightSource},
    scene::{Face, Material, Node, SceneTree, SourceLight, SourceMesh},
    texture::{PixelBuffer, TextureHandle, WrapMode},
};
pub use error::{CompileError, LoadError, ParseError, ResourceLoadError};
pub use model::{Model, ModelState};
pub use render::{DrawCall, RenderState, RenderSubmitter};
pub use resources::{
    parse_model_file,
    texture::{ImageDecoder, TextureCache, TextureUploader},
};
pub use settings::PipelineSettings;
