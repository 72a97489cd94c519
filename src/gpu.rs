//! wgpu implementation of the GPU boundary.
//!
//! [`WgpuUploader`] turns decoded images into [`Texture`]s and hands out
//! [`TextureHandle`]s for them. [`GpuMesh`] uploads the buffers of a
//! [`CompiledMesh`] so a renderer can issue an indexed triangle-list draw.
//!
//! Both are only valid for the device they were created on. If the device is
//! lost the model has to be loaded again.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        compiled::CompiledMesh,
        texture::{PixelBuffer, SamplerSettings, Texture, TextureHandle},
    },
    error::UploadError,
    resources::texture::{TextureUploader, validate_pixels},
};

pub struct WgpuUploader {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: HashMap<TextureHandle, Texture>,
    next_id: u32,
}

impl WgpuUploader {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            textures: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(&handle)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
}

impl TextureUploader for WgpuUploader {
    fn upload(
        &mut self,
        key: &str,
        pixels: &PixelBuffer,
        sampler: &SamplerSettings,
    ) -> Result<TextureHandle, UploadError> {
        validate_pixels(key, pixels)?;
        let limit = self.device.limits().max_texture_dimension_2d;
        if pixels.width > limit || pixels.height > limit {
            return Err(UploadError::Device {
                key: key.to_string(),
                reason: format!(
                    "{}x{} exceeds the device limit of {}",
                    pixels.width, pixels.height, limit
                ),
            });
        }
        let texture = Texture::from_pixels(&self.device, &self.queue, pixels, Some(key), sampler);
        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn release(&mut self, handle: TextureHandle) {
        match self.textures.remove(&handle) {
            Some(texture) => texture.texture.destroy(),
            None => log::warn!("Texture {handle:?} released twice or never uploaded"),
        }
    }
}

/// GPU copies of a compiled mesh's buffers, kept separate rather than interleaved.
#[derive(Debug)]
pub struct GpuMesh {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub uvs: Option<wgpu::Buffer>,
    pub indices: wgpu::Buffer,
    pub num_elements: u32,
    pub texture: Option<TextureHandle>,
}

impl GpuMesh {
    pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

    pub fn from_compiled(device: &wgpu::Device, mesh: &CompiledMesh) -> Self {
        let buffer = |label: &str, contents: &[u8], usage| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} {}", mesh.node, label)),
                contents,
                usage,
            })
        };
        let positions = buffer(
            "Position Buffer",
            bytemuck::cast_slice(&mesh.vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let normals = buffer(
            "Normal Buffer",
            bytemuck::cast_slice(&mesh.normals),
            wgpu::BufferUsages::VERTEX,
        );
        let uvs = mesh.has_uvs().then(|| {
            buffer(
                "UV Buffer",
                bytemuck::cast_slice(&mesh.uvs),
                wgpu::BufferUsages::VERTEX,
            )
        });
        // wgpu wants copy sizes aligned to 4 bytes, an odd number of u16 indices needs a pad
        let mut indices = mesh.indices.clone();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        let index_buffer = buffer(
            "Index Buffer",
            bytemuck::cast_slice(&indices),
            wgpu::BufferUsages::INDEX,
        );

        Self {
            positions,
            normals,
            uvs,
            indices: index_buffer,
            num_elements: mesh.indices.len() as u32,
            texture: mesh.texture,
        }
    }

    /// Vertex buffer layouts matching the buffers above, in slot order: positions, normals, UVs.
    pub fn layouts(with_uvs: bool) -> Vec<wgpu::VertexBufferLayout<'static>> {
        const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        const NORMAL: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
        const UV: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];
        let layout = |stride: usize, attributes: &'static [wgpu::VertexAttribute]| {
            wgpu::VertexBufferLayout {
                array_stride: stride as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            }
        };
        let mut layouts = vec![
            layout(std::mem::size_of::<[f32; 3]>(), &POSITION),
            layout(std::mem::size_of::<[f32; 3]>(), &NORMAL),
        ];
        if with_uvs {
            layouts.push(layout(std::mem::size_of::<[f32; 2]>(), &UV));
        }
        layouts
    }
}
