#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use flow_model::{
    data_structures::{
        light::LightUniform,
        scene::{Face, Material, Node, SceneTree, SourceMesh},
        texture::{PixelBuffer, SamplerSettings, TextureHandle},
    },
    error::{DecodeError, UploadError},
    render::{DrawCall, RenderState, RenderSubmitter},
    resources::texture::{ImageDecoder, TextureUploader, validate_pixels},
};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Decoder serving images from memory and counting how often each key was requested.
pub(crate) struct MemoryDecoder {
    images: HashMap<String, PixelBuffer>,
    failing: HashSet<String>,
    calls: RefCell<HashMap<String, usize>>,
}

impl MemoryDecoder {
    pub(crate) fn new() -> Self {
        Self {
            images: HashMap::new(),
            failing: HashSet::new(),
            calls: RefCell::new(HashMap::new()),
        }
    }

    /// Serves a 2x2 image for every key in `keys`.
    pub(crate) fn with_keys(keys: &[&str]) -> Self {
        let mut decoder = Self::new();
        for (idx, key) in keys.iter().enumerate() {
            decoder.insert(key, PixelBuffer::solid(2, 2, [idx as u8, 0, 0, 255]));
        }
        decoder
    }

    pub(crate) fn insert(&mut self, key: &str, pixels: PixelBuffer) {
        self.images.insert(key.to_string(), pixels);
    }

    /// Makes decoding `key` fail with an IO error.
    pub(crate) fn fail_on(&mut self, key: &str) {
        self.failing.insert(key.to_string());
    }

    pub(crate) fn calls(&self, key: &str) -> usize {
        self.calls.borrow().get(key).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl ImageDecoder for MemoryDecoder {
    fn decode(&self, key: &str) -> Result<PixelBuffer, DecodeError> {
        *self.calls.borrow_mut().entry(key.to_string()).or_default() += 1;
        if self.failing.contains(key) {
            return Err(DecodeError::Io {
                key: key.to_string(),
                source: std::io::Error::other("decoder told to fail"),
            });
        }
        self.images
            .get(key)
            .cloned()
            .ok_or_else(|| DecodeError::NotFound(key.to_string()))
    }
}

/// Everything a [`RecordingUploader`] saw, shared so it can be inspected after
/// the uploader moved into a model.
#[derive(Debug, Default)]
pub(crate) struct UploadLog {
    pub(crate) uploads: Vec<(String, TextureHandle)>,
    pub(crate) releases: Vec<TextureHandle>,
    pub(crate) samplers: Vec<SamplerSettings>,
}

impl UploadLog {
    pub(crate) fn uploaded_keys(&self) -> Vec<&str> {
        self.uploads.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub(crate) fn live(&self) -> usize {
        self.uploads.len() - self.releases.len()
    }

    pub(crate) fn released_once(&self, handle: TextureHandle) -> bool {
        self.releases.iter().filter(|&&h| h == handle).count() == 1
    }
}

pub(crate) struct RecordingUploader {
    log: Rc<RefCell<UploadLog>>,
    next_id: u32,
    reject: HashSet<String>,
}

impl RecordingUploader {
    pub(crate) fn new() -> (Self, Rc<RefCell<UploadLog>>) {
        let log = Rc::new(RefCell::new(UploadLog::default()));
        let uploader = Self {
            log: Rc::clone(&log),
            next_id: 1,
            reject: HashSet::new(),
        };
        (uploader, log)
    }

    /// Makes uploading `key` fail as if the device refused it.
    pub(crate) fn reject(mut self, key: &str) -> Self {
        self.reject.insert(key.to_string());
        self
    }
}

impl TextureUploader for RecordingUploader {
    fn upload(
        &mut self,
        key: &str,
        pixels: &PixelBuffer,
        sampler: &SamplerSettings,
    ) -> Result<TextureHandle, UploadError> {
        validate_pixels(key, pixels)?;
        if self.reject.contains(key) {
            return Err(UploadError::Device {
                key: key.to_string(),
                reason: "out of memory".to_string(),
            });
        }
        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        let mut log = self.log.borrow_mut();
        log.uploads.push((key.to_string(), handle));
        log.samplers.push(*sampler);
        Ok(handle)
    }

    fn release(&mut self, handle: TextureHandle) {
        self.log.borrow_mut().releases.push(handle);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedDraw {
    pub(crate) node: String,
    pub(crate) texture: Option<TextureHandle>,
    pub(crate) index_count: u32,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSubmitter {
    pub(crate) states: Vec<RenderState>,
    pub(crate) draws: Vec<RecordedDraw>,
    pub(crate) frames: u32,
}

impl RecordingSubmitter {
    pub(crate) fn lights(&self) -> &[LightUniform] {
        self.states
            .last()
            .map(|state| state.lights.as_slice())
            .unwrap_or_default()
    }
}

impl RenderSubmitter for RecordingSubmitter {
    fn begin(&mut self, state: &RenderState) {
        self.states.push(state.clone());
    }

    fn submit(&mut self, draw: DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            node: draw.mesh.node.clone(),
            texture: draw.texture,
            index_count: draw.index_count(),
        });
    }

    fn end(&mut self) {
        self.frames += 1;
    }
}

/// Right triangle in the z = 0 plane spanning (0,0,0) to (2,2,0).
pub(crate) fn triangle(name: &str, material: Option<&str>) -> SourceMesh {
    let face = match material {
        Some(material) => Face::with_material([0, 1, 2], material),
        None => Face::new([0, 1, 2]),
    };
    SourceMesh::new(
        name,
        vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
        vec![face],
    )
    .with_texels(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
}

/// Scene with one root node per `(node, material)` pair, each holding its own
/// triangle, and one textured material per distinct texture key.
pub(crate) fn textured_scene(nodes: &[(&str, &str)], textures: &[(&str, &str)]) -> SceneTree {
    let mut scene = SceneTree::new("memory/scene.obj");
    for (material, key) in textures {
        scene.add_material(Material::new(*material).with_texture(*key));
    }
    for (node, material) in nodes {
        let mesh = format!("{node}_mesh");
        scene.add_mesh(triangle(&mesh, Some(material)));
        scene.add_root(Node::with_mesh(*node, mesh));
    }
    scene
}

/// Chain of `depth` nested nodes, each referencing the same mesh.
pub(crate) fn deep_chain(depth: usize) -> Node {
    let mut node = Node::with_mesh(format!("n{}", depth - 1), "tri");
    for level in (0..depth - 1).rev() {
        node = Node::with_mesh(format!("n{level}"), "tri").child(node);
    }
    node
}
