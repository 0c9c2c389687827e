//! Skinning matrices for the renderer
//!
//! A skinning matrix takes a vertex from bind-pose model space into the
//! current pose: first into the joint's local space with the inverse bind
//! matrix, then back out with the joint's current model-space transform.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_anim::{AnimatedModel, EvaluationOptions, LoadOptions};
//! use rig_anim::skinning::{skinning_matrices_for_clip, to_column_major};
//!
//! let character = AnimatedModel::load("assets/warrok", &LoadOptions::default())?;
//! let clip = &character.clips[0];
//!
//! let matrices = skinning_matrices_for_clip(
//!     clip,
//!     &character.skeleton,
//!     clip.wrap_time(1.25),
//!     EvaluationOptions::default(),
//! )?;
//! let upload: Vec<f32> = to_column_major(&matrices);
//! assert_eq!(upload.len(), character.skeleton.len() * 16);
//! # Ok::<(), rig_anim::AnimError>(())
//! ```

use glam::Mat4;

use crate::clip::AnimationClip;
use crate::error::Result;
use crate::kinematics::{EvaluationOptions, compute_global_matrices};
use crate::pose::SkeletonPose;
use crate::skeleton::Skeleton;

/// `skinning[i] = globals[i] * inverse_bind[i]`
pub fn compute_skinning_matrices(globals: &[Mat4], skeleton: &Skeleton) -> Result<Vec<Mat4>> {
    skeleton.check_len(globals.len(), "global matrix array")?;

    Ok(globals
        .iter()
        .zip(skeleton.joints())
        .map(|(global, joint)| *global * joint.inverse_bind_matrix)
        .collect())
}

/// Forward kinematics followed by skinning composition
pub fn skinning_matrices_for_pose(
    pose: &SkeletonPose,
    skeleton: &Skeleton,
    options: EvaluationOptions,
) -> Result<Vec<Mat4>> {
    let globals = compute_global_matrices(pose, skeleton, options)?;
    compute_skinning_matrices(&globals, skeleton)
}

/// Evaluate a clip at `clip_time` and compose its skinning matrices
pub fn skinning_matrices_for_clip(
    clip: &AnimationClip,
    skeleton: &Skeleton,
    clip_time: f32,
    options: EvaluationOptions,
) -> Result<Vec<Mat4>> {
    let pose = clip.evaluate(clip_time)?;
    skinning_matrices_for_pose(&pose, skeleton, options)
}

/// Flatten matrices into one column-major `f32` array, 16 floats per matrix
pub fn to_column_major(matrices: &[Mat4]) -> Vec<f32> {
    matrices.iter().flat_map(Mat4::to_cols_array).collect()
}
