//! Loading a character from an asset directory
//!
//! A directory holds exactly one `.model`, exactly one `.skeleton` and any
//! number of `.animation` files, plus the texture images the materials name.
//! Anything else is reported and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use crate::clip::{AnimationClip, ClipInfo};
use crate::error::{AnimError, Result};
use crate::kinematics::bind_pose;
use crate::model::{DecodeOptions, MaterialLayout, ModelData};
use crate::pose::SkeletonPose;
use crate::skeleton::Skeleton;
use crate::texture::{MaterialTextures, TextureCache, TextureLoader};

pub const MODEL_EXTENSION: &str = "model";
pub const SKELETON_EXTENSION: &str = "skeleton";
pub const ANIMATION_EXTENSION: &str = "animation";
pub const TEXTURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Order of a directory's clips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClipOrder {
    /// Sorted by file name, stable across platforms
    #[default]
    ByName,
    /// Whatever order the filesystem lists the files in
    Discovery,
}

/// Options for loading an asset directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub clip_order: ClipOrder,
    pub material_layout: MaterialLayout,
}

/// The files that make up one asset directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub model: PathBuf,
    pub skeleton: PathBuf,
    pub animations: Vec<PathBuf>,
    pub textures: Vec<PathBuf>,
    /// Files with an unrecognized extension
    pub skipped: Vec<PathBuf>,
}

enum AssetKind {
    Model,
    Skeleton,
    Animation,
    Texture,
    Unknown,
}

fn classify(path: &Path) -> AssetKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return AssetKind::Unknown;
    };
    if ext.eq_ignore_ascii_case(MODEL_EXTENSION) {
        AssetKind::Model
    } else if ext.eq_ignore_ascii_case(SKELETON_EXTENSION) {
        AssetKind::Skeleton
    } else if ext.eq_ignore_ascii_case(ANIMATION_EXTENSION) {
        AssetKind::Animation
    } else if TEXTURE_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)) {
        AssetKind::Texture
    } else {
        AssetKind::Unknown
    }
}

fn set_unique(slot: &mut Option<PathBuf>, path: PathBuf, what: &str) -> Result<()> {
    if let Some(existing) = slot {
        return Err(AnimError::precondition(format!(
            "directory contains more than one {what} file: {} and {}",
            existing.display(),
            path.display()
        )));
    }
    *slot = Some(path);
    Ok(())
}

impl AssetManifest {
    /// List and classify the files of an asset directory
    pub fn scan<P: AsRef<Path>>(directory: P, clip_order: ClipOrder) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(AnimError::precondition(format!(
                "{} is not a directory",
                directory.display()
            )));
        }

        let mut model = None;
        let mut skeleton = None;
        let mut animations = Vec::new();
        let mut textures = Vec::new();
        let mut skipped = Vec::new();

        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_dir() {
                log::debug!("Skipping subdirectory {}", path.display());
                continue;
            }

            match classify(&path) {
                AssetKind::Model => set_unique(&mut model, path, "model")?,
                AssetKind::Skeleton => set_unique(&mut skeleton, path, "skeleton")?,
                AssetKind::Animation => animations.push(path),
                AssetKind::Texture => textures.push(path),
                AssetKind::Unknown => {
                    log::warn!("Unsupported file format: {}", path.display());
                    skipped.push(path);
                }
            }
        }

        let missing = |what: &str| {
            AnimError::precondition(format!(
                "{} has no {what} file",
                directory.display()
            ))
        };
        let model = model.ok_or_else(|| missing("model"))?;
        let skeleton = skeleton.ok_or_else(|| missing("skeleton"))?;

        if clip_order == ClipOrder::ByName {
            animations.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        textures.sort();

        Ok(Self {
            model,
            skeleton,
            animations,
            textures,
            skipped,
        })
    }
}

/// A model with its skeleton and clips, immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedModel {
    /// Stem of the `.model` file
    pub name: String,
    pub directory: PathBuf,
    pub model: ModelData,
    pub skeleton: Skeleton,
    pub clips: Vec<AnimationClip>,
}

impl AnimatedModel {
    /// Load every asset of a directory.
    ///
    /// Meshes are reordered so opaque meshes come before meshes whose
    /// material has alpha.
    pub fn load<P: AsRef<Path>>(directory: P, options: &LoadOptions) -> Result<Self> {
        let directory = directory.as_ref();
        let manifest = AssetManifest::scan(directory, options.clip_order)?;

        let decode = DecodeOptions {
            material_layout: options.material_layout,
        };
        let mut model = ModelData::load(&manifest.model, &decode)?;
        model.validate()?;
        model.partition_opaque_first();

        let skeleton = Skeleton::load(&manifest.skeleton)?;
        if model.is_skinned() {
            model.validate_joint_indices(skeleton.len())?;
        }

        let clips = manifest
            .animations
            .iter()
            .map(|path| AnimationClip::load(path, skeleton.len()))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Loaded '{}': {} meshes, {} joints, {} clips",
            model.name,
            model.meshes.len(),
            skeleton.len(),
            clips.len()
        );

        Ok(Self {
            name: model.name.clone(),
            directory: directory.to_path_buf(),
            model,
            skeleton,
            clips,
        })
    }

    pub fn clip(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name() == name)
    }

    pub fn find_clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clip_index(name).and_then(|i| self.clips.get(i))
    }

    pub fn clip_infos(&self) -> Vec<ClipInfo> {
        self.clips.iter().map(AnimationClip::info).collect()
    }

    pub fn bind_pose(&self) -> SkeletonPose {
        bind_pose(&self.skeleton)
    }

    /// Resolve the textures of every material through a shared cache
    pub fn material_textures<L: TextureLoader>(
        &self,
        cache: &mut TextureCache<L>,
    ) -> Vec<MaterialTextures<L::Handle>> {
        self.model
            .materials
            .iter()
            .map(|m| cache.material_textures(m, &self.directory))
            .collect()
    }
}

/// Load a directory with default options
pub fn load_directory<P: AsRef<Path>>(directory: P) -> Result<AnimatedModel> {
    AnimatedModel::load(directory, &LoadOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_scan_classifies_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "warrok.model",
            "warrok.skeleton",
            "wave.animation",
            "idle.animation",
            "skin.png",
            "notes.txt",
        ] {
            touch(dir.path(), name);
        }

        let manifest = AssetManifest::scan(dir.path(), ClipOrder::ByName).unwrap();
        assert_eq!(manifest.model.file_name().unwrap(), "warrok.model");
        let clips: Vec<_> = manifest
            .animations
            .iter()
            .map(|p| p.file_stem().unwrap().to_owned())
            .collect();
        assert_eq!(clips, vec!["idle", "wave"]);
        assert_eq!(manifest.textures.len(), 1);
        assert_eq!(manifest.skipped.len(), 1);
    }

    #[test]
    fn test_scan_requires_model_and_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "warrok.model");

        let err = AssetManifest::scan(dir.path(), ClipOrder::ByName).unwrap_err();
        assert!(matches!(err, AnimError::PreconditionViolation(ref m) if m.contains("skeleton")));
    }

    #[test]
    fn test_scan_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.skeleton");
        touch(dir.path(), "b.skeleton");
        touch(dir.path(), "a.model");

        assert!(matches!(
            AssetManifest::scan(dir.path(), ClipOrder::Discovery),
            Err(AnimError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_loaded_assets_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnimatedModel>();
        assert_send_sync::<Skeleton>();
        assert_send_sync::<AnimationClip>();
    }
}
