//! Texture resolution for model materials
//!
//! Decoding and GPU upload belong to the caller, which implements
//! [`TextureLoader`]. [`TextureCache`] owns every handle it hands out and
//! releases them through the loader when cleared or dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::PhongMaterial;

/// Texture inputs of a Phong material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureSlot {
    Diffuse,
    Specular,
    Normal,
}

impl TextureSlot {
    pub const ALL: [Self; 3] = [Self::Diffuse, Self::Specular, Self::Normal];

    /// Placeholder used when a material leaves this slot empty
    pub const fn placeholder(self) -> Placeholder {
        match self {
            Self::Diffuse | Self::Specular => Placeholder::White,
            Self::Normal => Placeholder::FlatNormal,
        }
    }
}

/// Built-in 1x1 textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placeholder {
    /// Opaque white: leaves diffuse and specular coefficients unchanged
    White,
    /// Tangent-space +Z: leaves surface normals unchanged
    FlatNormal,
}

impl Placeholder {
    /// RGBA8 texel
    pub const fn rgba(self) -> [u8; 4] {
        match self {
            Self::White => [255, 255, 255, 255],
            Self::FlatNormal => [128, 128, 255, 255],
        }
    }
}

/// Where a material slot's texture comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureSource {
    File(PathBuf),
    Placeholder(Placeholder),
}

/// Resolve a material slot against the model directory
pub fn resolve_texture(material: &PhongMaterial, slot: TextureSlot, directory: &Path) -> TextureSource {
    match material.texture_name(slot) {
        "" => TextureSource::Placeholder(slot.placeholder()),
        name => TextureSource::File(directory.join(name)),
    }
}

/// Decodes and uploads textures on behalf of the cache
pub trait TextureLoader {
    type Handle: Clone;

    fn load_file(
        &mut self,
        path: &Path,
    ) -> std::result::Result<Self::Handle, Box<dyn std::error::Error + Send + Sync>>;

    fn load_placeholder(&mut self, placeholder: Placeholder) -> Self::Handle;

    /// Called once per cached handle when the cache is cleared or dropped
    fn release(&mut self, _handle: Self::Handle) {}
}

/// Handles for a material's three texture slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialTextures<H> {
    pub diffuse: H,
    pub specular: H,
    pub normal: H,
}

/// Application-scoped texture cache.
///
/// Each file is loaded once no matter how many materials reference it. A file
/// that fails to load is logged and replaced by the slot's placeholder.
pub struct TextureCache<L: TextureLoader> {
    loader: L,
    entries: HashMap<TextureSource, L::Handle>,
}

impl<L: TextureLoader> TextureCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, source: &TextureSource) -> bool {
        self.entries.contains_key(source)
    }

    /// Handle for a texture source, loading it on first use
    pub fn resolve(&mut self, source: &TextureSource, slot: TextureSlot) -> L::Handle {
        if let Some(handle) = self.entries.get(source) {
            return handle.clone();
        }

        let (key, handle) = match source {
            TextureSource::File(path) => match self.loader.load_file(path) {
                Ok(handle) => (source.clone(), handle),
                Err(e) => {
                    log::warn!(
                        "Failed to load texture {}: {}, using placeholder",
                        path.display(),
                        e
                    );
                    return self.placeholder(slot.placeholder());
                }
            },
            TextureSource::Placeholder(p) => (source.clone(), self.loader.load_placeholder(*p)),
        };

        log::debug!("Cached texture {key:?}");
        self.entries.insert(key, handle.clone());
        handle
    }

    fn placeholder(&mut self, placeholder: Placeholder) -> L::Handle {
        let source = TextureSource::Placeholder(placeholder);
        if let Some(handle) = self.entries.get(&source) {
            return handle.clone();
        }
        let handle = self.loader.load_placeholder(placeholder);
        self.entries.insert(source, handle.clone());
        handle
    }

    /// Handles for every slot of a material
    pub fn material_textures(
        &mut self,
        material: &PhongMaterial,
        directory: &Path,
    ) -> MaterialTextures<L::Handle> {
        let mut load = |slot| {
            let source = resolve_texture(material, slot, directory);
            self.resolve(&source, slot)
        };

        MaterialTextures {
            diffuse: load(TextureSlot::Diffuse),
            specular: load(TextureSlot::Specular),
            normal: load(TextureSlot::Normal),
        }
    }

    /// Release every cached handle
    pub fn clear(&mut self) {
        for (_, handle) in self.entries.drain() {
            self.loader.release(handle);
        }
    }
}

impl<L: TextureLoader> Drop for TextureCache<L> {
    fn drop(&mut self) {
        self.clear();
    }
}
