//! Error taxonomy of the loading pipeline.
//!
//! Every stage returns its own error type so callers can decide what is fatal:
//!
//! - [`ParseError`] the scene file could not be read or understood
//! - [`ResourceLoadError`] a referenced texture could not be decoded or uploaded
//! - [`CompileError`] a mesh could not be turned into render buffers
//! - [`LoadError`] wraps all of the above plus lifecycle misuse of a [`Model`](crate::model::Model)
//!
//! Nodes that name a missing mesh are not errors. They are recorded in
//! [`Compilation::skipped`](crate::resources::mesh::Compilation::skipped) and traversal goes on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse model file {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("unsupported model format for {0:?} (expected .obj, .gltf or .glb)")]
    Unsupported(PathBuf),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read image {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {key}: {source}")]
    Image {
        key: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image {0} does not exist")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("texture {key} has invalid dimensions {width}x{height}")]
    InvalidDimensions { key: String, width: u32, height: u32 },
    #[error("texture {key} has {actual} bytes of pixel data, expected {expected}")]
    SizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
    #[error("gpu rejected texture {key}: {reason}")]
    Device { key: String, reason: String },
}

/// A texture referenced by a material could not be produced.
#[derive(Debug, Error)]
pub enum ResourceLoadError {
    #[error("texture {key} could not be decoded")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
    #[error("texture {key} could not be uploaded")]
    Upload {
        key: String,
        #[source]
        source: UploadError,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("face {face} of mesh {mesh} uses unknown material {material}")]
    UnresolvedMaterial {
        mesh: String,
        face: usize,
        material: String,
    },
    #[error("mesh {mesh} has {vertices} vertices, 16-bit indices allow at most {limit}")]
    Capacity {
        mesh: String,
        vertices: usize,
        limit: usize,
    },
    #[error("mesh {mesh} is malformed: {reason}")]
    MalformedMesh { mesh: String, reason: String },
    #[error("mesh {mesh} uses texture {first} and {second}, only one texture per mesh is supported")]
    MixedTextures {
        mesh: String,
        first: String,
        second: String,
    },
    #[error("texture {key} used by mesh {mesh} was never loaded")]
    UnregisteredTexture { mesh: String, key: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resource(#[from] ResourceLoadError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("no model file has been loaded")]
    NotLoaded,
    #[error("model already holds {0:?}, construct a new model to load another file")]
    AlreadyLoaded(PathBuf),
    #[error("nodes are already prepared")]
    AlreadyPrepared,
    #[error("model is not ready, call prepare_nodes first")]
    NotReady,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
