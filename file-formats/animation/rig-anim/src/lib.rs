//! Skeletal animation runtime for skinned character models.
//!
//! Loads a joint hierarchy, keyframe clips and a skinned model from a compact
//! native-endian binary format, and evaluates the per-joint matrices a
//! renderer needs to deform the mesh at any clip time.
//!
//! # Examples
//!
//! ```no_run
//! use rig_anim::{AnimatedModel, EvaluationOptions, LoadOptions};
//! use rig_anim::kinematics::compute_global_matrices;
//! use rig_anim::skinning::compute_skinning_matrices;
//!
//! let character = AnimatedModel::load("assets/warrok", &LoadOptions::default())?;
//! let clip = character.find_clip("wave").expect("clip exists");
//!
//! let pose = clip.evaluate(clip.wrap_time(3.7))?;
//! let globals = compute_global_matrices(&pose, &character.skeleton, EvaluationOptions::default())?;
//! let skinning = compute_skinning_matrices(&globals, &character.skeleton)?;
//! println!("{} skinning matrices", skinning.len());
//! # Ok::<(), rig_anim::AnimError>(())
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod asset_dir;
pub mod clip;
pub mod error;
pub mod io_ext;
pub mod kinematics;
pub mod model;
pub mod playback;
pub mod pose;
pub mod skeleton;
pub mod skinning;
pub mod texture;

// Re-export common types
pub use asset_dir::{AnimatedModel, AssetManifest, ClipOrder, LoadOptions, load_directory};
pub use clip::{AnimationClip, ClipInfo, ClipSample};
pub use error::{AnimError, Result};
pub use kinematics::{EvaluationOptions, RootMotion, UpAxis};
pub use model::{DecodeOptions, MaterialLayout, ModelData, PhongMaterial, VertexFlags};
pub use playback::{ClipPlayer, PlaybackState, PoseEditor};
pub use pose::{JointPose, SkeletonPose, interpolate};
pub use skeleton::{Joint, Skeleton};
pub use texture::{TextureCache, TextureLoader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
