use std::path::Path;

use crate::{data_structures::scene::SceneTree, error::ParseError};

/**
 * This module contains all logic for turning external files into pipeline data:
 * scene files into [`SceneTree`]s, images into textures and source meshes into
 * compiled buffers.
 */
pub mod gltf_loader;
pub mod mesh;
pub mod obj;
pub mod texture;

/// Options for the scene file adapters.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Flip the V texture coordinate of OBJ files (OBJ has its origin bottom left).
    pub flip_texcoords_v: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            flip_texcoords_v: true,
        }
    }
}

pub fn load_string(path: &Path) -> anyhow::Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

/// Reads a scene file with default options.
pub fn parse_model_file(path: impl AsRef<Path>) -> Result<SceneTree, ParseError> {
    parse_model_file_with(path, &ParseOptions::default())
}

/// Reads a scene file, picking the adapter from the file extension.
pub fn parse_model_file_with(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<SceneTree, ParseError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let result = match extension.as_deref() {
        Some("obj") => obj::load_scene_obj(path, options),
        Some("gltf") | Some("glb") => gltf_loader::load_scene_gltf(path),
        _ => return Err(ParseError::Unsupported(path.to_path_buf())),
    };
    result.map_err(|source| ParseError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
