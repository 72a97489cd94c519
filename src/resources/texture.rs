use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    data_structures::{
        scene::SceneTree,
        texture::{PixelBuffer, SamplerSettings, TextureHandle},
    },
    error::{DecodeError, ResourceLoadError, UploadError},
};

/// Turns a texture key into RGBA8 pixels.
pub trait ImageDecoder {
    fn decode(&self, key: &str) -> Result<PixelBuffer, DecodeError>;
}

/// Creates and destroys GPU textures.
///
/// Handles returned by `upload` must be unique among the live handles of one uploader.
pub trait TextureUploader {
    fn upload(
        &mut self,
        key: &str,
        pixels: &PixelBuffer,
        sampler: &SamplerSettings,
    ) -> Result<TextureHandle, UploadError>;

    fn release(&mut self, handle: TextureHandle);
}

/// Checks the pixel buffer before it is handed to a GPU.
pub fn validate_pixels(key: &str, pixels: &PixelBuffer) -> Result<(), UploadError> {
    if pixels.width == 0 || pixels.height == 0 {
        return Err(UploadError::InvalidDimensions {
            key: key.to_string(),
            width: pixels.width,
            height: pixels.height,
        });
    }
    if pixels.rgba.len() != pixels.expected_len() {
        return Err(UploadError::SizeMismatch {
            key: key.to_string(),
            expected: pixels.expected_len(),
            actual: pixels.rgba.len(),
        });
    }
    Ok(())
}

/// Decodes texture keys as files relative to the model's directory.
///
/// Images embedded in the scene file take precedence over the file system.
pub struct FileDecoder<'a> {
    root: PathBuf,
    scene: Option<&'a SceneTree>,
}

impl<'a> FileDecoder<'a> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scene: None,
        }
    }

    pub fn for_scene(scene: &'a SceneTree) -> Self {
        let root = scene
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            root,
            scene: Some(scene),
        }
    }

    pub fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ImageDecoder for FileDecoder<'_> {
    fn decode(&self, key: &str) -> Result<PixelBuffer, DecodeError> {
        if let Some(bytes) = self.scene.and_then(|scene| scene.embedded_image(key)) {
            let img = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
                key: key.to_string(),
                source,
            })?;
            return Ok(PixelBuffer::from_image(&img));
        }
        let path = self.resolve(key);
        if !path.exists() {
            return Err(DecodeError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path).map_err(|source| DecodeError::Io {
            key: key.to_string(),
            source,
        })?;
        let img = image::load_from_memory(&bytes).map_err(|source| DecodeError::Image {
            key: key.to_string(),
            source,
        })?;
        Ok(PixelBuffer::from_image(&img))
    }
}

/// Maps texture keys to uploaded textures so every key is decoded and uploaded once.
///
/// The cache owns its uploader. Dropping the cache releases every handle it
/// handed out, exactly once.
pub struct TextureCache<U: TextureUploader> {
    uploader: U,
    sampler: SamplerSettings,
    entries: HashMap<String, TextureHandle>,
    order: Vec<String>,
}

impl<U: TextureUploader> TextureCache<U> {
    pub fn new(uploader: U, sampler: SamplerSettings) -> Self {
        Self {
            uploader,
            sampler,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the handle for `key`, decoding and uploading the image on first use.
    pub fn acquire(
        &mut self,
        key: &str,
        decoder: &dyn ImageDecoder,
    ) -> Result<TextureHandle, ResourceLoadError> {
        if let Some(&handle) = self.entries.get(key) {
            log::debug!("texture {key} already loaded as {handle:?}");
            return Ok(handle);
        }
        let pixels = decoder
            .decode(key)
            .map_err(|source| ResourceLoadError::Decode {
                key: key.to_string(),
                source,
            })?;
        let handle = self
            .uploader
            .upload(key, &pixels, &self.sampler)
            .map_err(|source| ResourceLoadError::Upload {
                key: key.to_string(),
                source,
            })?;
        log::debug!(
            "uploaded texture {key} ({}x{}) as {handle:?}",
            pixels.width,
            pixels.height
        );
        self.entries.insert(key.to_string(), handle);
        self.order.push(key.to_string());
        Ok(handle)
    }

    /// Lookup without loading.
    pub fn get(&self, key: &str) -> Option<TextureHandle> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys and handles in load order.
    pub fn handles(&self) -> impl Iterator<Item = (&str, TextureHandle)> {
        self.order
            .iter()
            .map(|key| (key.as_str(), self.entries[key]))
    }

    pub fn sampler(&self) -> &SamplerSettings {
        &self.sampler
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Releases every texture. Handles obtained before are invalid afterwards.
    pub fn clear(&mut self) {
        for key in self.order.drain(..) {
            if let Some(handle) = self.entries.remove(&key) {
                self.uploader.release(handle);
            }
        }
    }
}

impl<U: TextureUploader> Drop for TextureCache<U> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<U: TextureUploader> fmt::Debug for TextureCache<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureCache")
            .field("sampler", &self.sampler)
            .field("entries", &self.entries)
            .finish()
    }
}
