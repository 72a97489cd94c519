//! Texture handles, decoded pixel data and the GPU texture wrapper.
//!
//! The pipeline core only ever sees [`TextureHandle`]s. The actual GPU objects
//! are created by a [`TextureUploader`](crate::resources::texture::TextureUploader);
//! the wgpu one stores them as [`Texture`].

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

/// Opaque identifier of an uploaded texture.
///
/// Handles are only meaningful to the uploader that issued them and stay valid
/// until the owning [`TextureCache`](crate::resources::texture::TextureCache) is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Decoded RGBA8 image, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Single colour image, handy as a placeholder.
    pub fn solid(width: u32, height: u32, colour: [u8; 4]) -> Self {
        let rgba = colour
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, rgba)
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.to_rgba8().into_raw())
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// How texture coordinates outside `0..1` are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

impl WrapMode {
    pub fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Fixed upload parameters: linear min/mag filtering and a configurable wrap mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerSettings {
    pub wrap: WrapMode,
}

impl SamplerSettings {
    pub fn new(wrap: WrapMode) -> Self {
        Self { wrap }
    }

    pub fn descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        let address_mode = self.wrap.to_wgpu();
        wgpu::SamplerDescriptor {
            label: Some("model texture sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }
    }
}

/// A GPU texture with its view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates the texture and copies `pixels` into it.
    ///
    /// `pixels` must already be validated: non-zero size and exactly
    /// `width * height * 4` bytes.
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
        label: Option<&str>,
        sampler: &SamplerSettings,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &pixels.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * pixels.width),
                rows_per_image: Some(pixels.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler.descriptor());

        Self {
            texture,
            view,
            sampler,
        }
    }
}
