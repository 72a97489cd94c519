//! Light sources of a model.
//!
//! The [`LightRegistry`] is independent of mesh compilation and can be changed at
//! any point of the model's lifetime. Lights are only switched on or off as a
//! whole; there is no per-light toggle.

use std::collections::HashMap;

use crate::data_structures::scene::SourceLight;

/// Ambient contribution of a light relative to its colour.
const AMBIENT_DIVISOR: f32 = 4.5;

#[derive(Clone, Debug, PartialEq)]
pub struct LightSource {
    pub id: String,
    pub position: [f32; 3],
    pub color: [f32; 3],
    /// Direction the light points at, for spot lights.
    pub spot_direction: Option<[f32; 3]>,
    active: bool,
}

impl LightSource {
    pub fn new(id: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            id: id.into(),
            position,
            color: [1.0; 3],
            spot_direction: None,
            active: true,
        }
    }

    pub fn from_source(light: &SourceLight) -> Self {
        let spot_direction = light.spot.map(|target| {
            [
                target[0] - light.position[0],
                target[1] - light.position[1],
                target[2] - light.position[2],
            ]
        });
        Self {
            id: light.name.clone(),
            position: light.position,
            color: light.color,
            spot_direction,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn to_uniform(&self) -> LightUniform {
        let ambient = self.color.map(|c| c / AMBIENT_DIVISOR);
        let (spot, is_spot) = match self.spot_direction {
            Some(direction) => (direction, 1),
            None => ([0.0; 3], 0),
        };
        LightUniform {
            position: self.position,
            _padding: 0,
            diffuse: self.color,
            _padding2: 0,
            ambient,
            _padding3: 0,
            spot_direction: spot,
            is_spot,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    pub diffuse: [f32; 3],
    _padding2: u32,
    pub ambient: [f32; 3],
    _padding3: u32,
    pub spot_direction: [f32; 3],
    pub is_spot: u32,
}

/// Keyed collection of lights, iterated in insertion order.
#[derive(Clone, Debug, Default)]
pub struct LightRegistry {
    lights: Vec<LightSource>,
    index: HashMap<String, usize>,
    enabled: bool,
    // set once the owner switched lighting on or off explicitly
    toggled: bool,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the light `id`, registering it first if it is unknown.
    pub fn update(&mut self, id: &str, position: [f32; 3]) {
        match self.index.get(id) {
            Some(&idx) => self.lights[idx].position = position,
            None => {
                let mut light = LightSource::new(id, position);
                light.active = self.enabled;
                self.push(light);
            }
        }
    }

    /// Inserts a complete light record, replacing any light with the same id.
    pub fn insert(&mut self, mut light: LightSource) {
        light.active = self.enabled;
        match self.index.get(&light.id) {
            Some(&idx) => self.lights[idx] = light,
            None => self.push(light),
        }
    }

    fn push(&mut self, light: LightSource) {
        self.index.insert(light.id.clone(), self.lights.len());
        self.lights.push(light);
    }

    pub fn enable_all(&mut self) {
        self.toggled = true;
        self.set_all(true);
    }

    pub fn disable_all(&mut self) {
        self.toggled = true;
        self.set_all(false);
    }

    /// Switches lighting on unless `enable_all` or `disable_all` was called before.
    pub fn enable_by_default(&mut self) {
        if !self.toggled {
            self.set_all(true);
        }
    }

    fn set_all(&mut self, active: bool) {
        self.enabled = active;
        self.lights.iter_mut().for_each(|light| light.active = active);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, id: &str) -> Option<&LightSource> {
        self.index.get(id).map(|&idx| &self.lights[idx])
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightSource> {
        self.lights.iter()
    }

    /// GPU representation of the active lights.
    pub fn uniforms(&self) -> Vec<LightUniform> {
        self.lights
            .iter()
            .filter(|light| light.active)
            .map(LightSource::to_uniform)
            .collect()
    }
}
