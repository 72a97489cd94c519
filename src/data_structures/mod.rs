//! Pipeline data structures: source scenes, compiled meshes, textures, bounds and lights.
//!
//! - `scene` holds the read-only tree produced by a file adapter
//! - `compiled` holds the flattened, render-ready mesh buffers
//! - `texture` holds texture handles, decoded pixels and the GPU texture wrapper
//! - `bounds` computes whole-model bounds and centers the geometry
//! - `light` holds the light registry

pub mod bounds;
pub mod compiled;
pub mod light;
pub mod scene;
pub mod texture;
