//! The model aggregate.
//!
//! A [`Model`] goes through three states and never back:
//!
//! 1. [`ModelState::Empty`] right after construction
//! 2. [`ModelState::Loaded`] once a scene file is parsed and all of its textures are uploaded
//! 3. [`ModelState::Ready`] once [`Model::prepare_nodes`] compiled and centered the meshes
//!
//! A failed load leaves the model `Empty` with no textures held; a failed
//! preparation leaves it `Loaded`. To show another file, construct a new model.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use instant::Instant;

use crate::{
    data_structures::{
        bounds::{Bounds, normalize},
        compiled::CompiledMesh,
        light::{LightRegistry, LightSource},
        scene::SceneTree,
        texture::SamplerSettings,
    },
    error::{LoadError, ResourceLoadError},
    render::{DrawCall, RenderState, RenderSubmitter},
    resources::{
        mesh::compile,
        parse_model_file_with,
        texture::{FileDecoder, ImageDecoder, TextureCache, TextureUploader},
    },
    settings::PipelineSettings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Empty,
    Loaded,
    Ready,
}

pub struct Model<U: TextureUploader> {
    settings: PipelineSettings,
    state: ModelState,
    filename: Option<PathBuf>,
    scene: Option<SceneTree>,
    textures: TextureCache<U>,
    meshes: Vec<CompiledMesh>,
    // node name -> index into `meshes`
    by_node: HashMap<String, usize>,
    skipped: Vec<String>,
    bounds: Bounds,
    lights: LightRegistry,
}

impl<U: TextureUploader> Model<U> {
    pub fn new(uploader: U, settings: PipelineSettings) -> Self {
        let sampler = SamplerSettings::new(settings.wrap_mode);
        Self {
            settings,
            state: ModelState::Empty,
            filename: None,
            scene: None,
            textures: TextureCache::new(uploader, sampler),
            meshes: Vec::new(),
            by_node: HashMap::new(),
            skipped: Vec::new(),
            bounds: Bounds::EMPTY,
            lights: LightRegistry::new(),
        }
    }

    /// Parses `path` and uploads every texture its materials reference.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        self.ensure_empty()?;
        let started = Instant::now();
        let scene = parse_model_file_with(path, &self.settings.parse_options())?;
        let decoder = FileDecoder::for_scene(&scene);
        self.acquire_textures(&scene, &decoder)?;
        self.finish_load(scene, started);
        Ok(())
    }

    /// Loads an already parsed scene, decoding its textures with `decoder`.
    pub fn load_scene(
        &mut self,
        scene: SceneTree,
        decoder: &dyn ImageDecoder,
    ) -> Result<(), LoadError> {
        self.ensure_empty()?;
        let started = Instant::now();
        self.acquire_textures(&scene, decoder)?;
        self.finish_load(scene, started);
        Ok(())
    }

    fn ensure_empty(&self) -> Result<(), LoadError> {
        match (&self.state, &self.filename) {
            (ModelState::Empty, _) => Ok(()),
            (_, Some(filename)) => Err(LoadError::AlreadyLoaded(filename.clone())),
            (_, None) => Err(LoadError::AlreadyLoaded(PathBuf::new())),
        }
    }

    /// Texture pre-pass. Any failure releases what was uploaded so far.
    fn acquire_textures(
        &mut self,
        scene: &SceneTree,
        decoder: &dyn ImageDecoder,
    ) -> Result<(), ResourceLoadError> {
        let result = acquire_scene_textures(&mut self.textures, scene, decoder);
        if let Err(err) = &result {
            log::error!("Loading {} failed: {err}", scene.path().display());
            self.textures.clear();
        }
        result
    }

    fn finish_load(&mut self, scene: SceneTree, started: Instant) {
        let mut seeded = 0;
        for light in scene.lights() {
            if light.off {
                log::warn!("Light {} is switched off in the file, ignoring it", light.name);
                continue;
            }
            self.lights.insert(LightSource::from_source(light));
            seeded += 1;
        }
        if seeded > 0 {
            self.lights.enable_by_default();
        }

        log::info!(
            "Loaded {} ({} nodes, {} textures, {} lights) in {:?}",
            scene.path().display(),
            scene.count_nodes(),
            self.textures.len(),
            seeded,
            started.elapsed()
        );
        self.filename = Some(scene.path().to_path_buf());
        self.scene = Some(scene);
        self.state = ModelState::Loaded;
    }

    /// Compiles every mesh-bearing node and centers the model around the origin.
    pub fn prepare_nodes(&mut self) -> Result<(), LoadError> {
        match self.state {
            ModelState::Empty => return Err(LoadError::NotLoaded),
            ModelState::Ready => return Err(LoadError::AlreadyPrepared),
            ModelState::Loaded => (),
        }
        let scene = self.scene.as_ref().ok_or(LoadError::NotLoaded)?;
        let started = Instant::now();

        let mut compilation = compile(scene, &self.textures)?;
        let bounds = normalize(&mut compilation.meshes, self.settings.radius_divisor);

        let mut by_node = HashMap::new();
        for (idx, mesh) in compilation.meshes.iter().enumerate() {
            by_node.entry(mesh.node.clone()).or_insert(idx);
        }

        log::info!(
            "Prepared {} of {} nodes ({} skipped), radius {} in {:?}",
            compilation.meshes.len(),
            compilation.visited,
            compilation.skipped.len(),
            bounds.radius,
            started.elapsed()
        );
        self.meshes = compilation.meshes;
        self.skipped = compilation.skipped;
        self.by_node = by_node;
        self.bounds = bounds;
        self.state = ModelState::Ready;
        Ok(())
    }

    /// Describes one frame to `submitter`: the render state, then one draw per mesh.
    pub fn render(&self, submitter: &mut dyn RenderSubmitter) -> Result<(), LoadError> {
        if self.state != ModelState::Ready {
            return Err(LoadError::NotReady);
        }
        submitter.begin(&self.render_state());
        for mesh in &self.meshes {
            submitter.submit(DrawCall {
                mesh,
                texture: mesh.texture,
            });
        }
        submitter.end();
        Ok(())
    }

    pub fn render_state(&self) -> RenderState {
        let lighting_enabled = self.lights.is_enabled() && !self.lights.is_empty();
        RenderState {
            lighting_enabled,
            lights: if lighting_enabled {
                self.lights.uniforms()
            } else {
                vec![]
            },
            ..Default::default()
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == ModelState::Ready
    }

    /// Bounding radius, only available once the model is ready.
    pub fn mesh_radius(&self) -> Option<f32> {
        self.is_valid().then_some(self.bounds.radius)
    }

    pub fn is_valid_radius(&self) -> bool {
        self.mesh_radius()
            .is_some_and(|radius| radius.is_finite() && radius > 0.0)
    }

    /// Bounds of the model before it was centered.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.is_valid().then_some(&self.bounds)
    }

    /// Translation that was subtracted from every vertex.
    pub fn center_offset(&self) -> Option<[f32; 3]> {
        self.bounds().map(|bounds| bounds.center.into())
    }

    /// Compiled meshes, empty until the model is ready.
    pub fn meshes(&self) -> &[CompiledMesh] {
        &self.meshes
    }

    pub fn compiled_for(&self, node: &str) -> Option<&CompiledMesh> {
        self.by_node.get(node).map(|&idx| &self.meshes[idx])
    }

    /// Nodes that named a mesh which does not exist.
    pub fn skipped_nodes(&self) -> &[String] {
        &self.skipped
    }

    pub fn count_of_nodes_to_prepare(&self) -> usize {
        self.scene
            .as_ref()
            .map_or(0, SceneTree::count_mesh_nodes)
    }

    pub fn textures(&self) -> &TextureCache<U> {
        &self.textures
    }

    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightRegistry {
        &mut self.lights
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn scene(&self) -> Option<&SceneTree> {
        self.scene.as_ref()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}

fn acquire_scene_textures<U: TextureUploader>(
    textures: &mut TextureCache<U>,
    scene: &SceneTree,
    decoder: &dyn ImageDecoder,
) -> Result<(), ResourceLoadError> {
    for mesh in scene.meshes() {
        let mut seen = HashSet::new();
        for name in mesh.material_names().filter(|name| seen.insert(*name)) {
            // Unknown materials are reported by the compiler.
            let Some(key) = scene.material(name).and_then(|m| m.texture.as_deref()) else {
                continue;
            };
            textures.acquire(key, decoder)?;
        }
    }
    Ok(())
}
