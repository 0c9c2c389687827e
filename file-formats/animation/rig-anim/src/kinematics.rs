//! Forward kinematics and its inverse
//!
//! [`compute_global_matrices`] walks the skeleton once in index order and
//! composes every joint's local transform with its parent's model-space
//! transform. [`compute_local_matrices`] undoes that, recovering a
//! parent-relative pose from model-space matrices.

use glam::{Mat4, Vec3};

use crate::error::Result;
use crate::pose::{JointPose, SkeletonPose};
use crate::skeleton::Skeleton;

/// The vertical axis of the model's coordinate frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Keep only the vertical component of a translation
    pub fn vertical_component(self, translation: Vec3) -> Vec3 {
        match self {
            Self::Y => Vec3::new(0.0, translation.y, 0.0),
            Self::Z => Vec3::new(0.0, 0.0, translation.z),
        }
    }
}

/// Whether the root joint's horizontal translation moves the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RootMotion {
    /// Apply the root's full translation
    Apply,
    /// Drop the root's horizontal translation so the model animates in place
    #[default]
    InPlace,
}

impl From<bool> for RootMotion {
    fn from(apply: bool) -> Self {
        if apply { Self::Apply } else { Self::InPlace }
    }
}

/// Options for turning a pose into matrices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationOptions {
    pub root_motion: RootMotion,
    pub up_axis: UpAxis,
}

impl EvaluationOptions {
    pub fn with_root_motion(mut self, root_motion: impl Into<RootMotion>) -> Self {
        self.root_motion = root_motion.into();
        self
    }

    pub fn with_up_axis(mut self, up_axis: UpAxis) -> Self {
        self.up_axis = up_axis;
        self
    }

    fn root_local_matrix(&self, root: &JointPose) -> Mat4 {
        match self.root_motion {
            RootMotion::Apply => root.to_matrix(),
            RootMotion::InPlace => JointPose {
                translation: self.up_axis.vertical_component(root.translation),
                ..*root
            }
            .to_matrix(),
        }
    }
}

/// Model-space matrix of every joint for a pose.
///
/// The root's local transform is used as is, except that its horizontal
/// translation is dropped unless root motion is applied. Every other joint is
/// its parent's global matrix times its local matrix.
pub fn compute_global_matrices(
    pose: &SkeletonPose,
    skeleton: &Skeleton,
    options: EvaluationOptions,
) -> Result<Vec<Mat4>> {
    skeleton.check_pose(pose)?;

    let mut globals: Vec<Mat4> = Vec::with_capacity(pose.len());
    for (joint, local) in skeleton.joints().iter().zip(pose.iter()) {
        let global = match joint.parent {
            // Topological order guarantees the parent is already computed
            Some(parent) => globals[parent] * local.to_matrix(),
            None => options.root_local_matrix(local),
        };
        globals.push(global);
    }

    Ok(globals)
}

/// Recover parent-relative poses from model-space matrices.
///
/// Each local matrix is decomposed with [`JointPose::from_matrix`], so shear
/// in the inputs is not preserved.
pub fn compute_local_matrices(globals: &[Mat4], skeleton: &Skeleton) -> Result<SkeletonPose> {
    skeleton.check_len(globals.len(), "global matrix array")?;
    Ok(decompose_locals(globals, skeleton))
}

/// Parent-relative pose that reproduces the skeleton's bind pose.
///
/// Used to seed an editable pose before any clip is applied.
pub fn bind_pose(skeleton: &Skeleton) -> SkeletonPose {
    decompose_locals(&skeleton.bind_pose_matrices(), skeleton)
}

fn decompose_locals(globals: &[Mat4], skeleton: &Skeleton) -> SkeletonPose {
    let joint_poses = skeleton
        .joints()
        .iter()
        .zip(globals)
        .map(|(joint, global)| {
            let local = match joint.parent {
                Some(parent) => globals[parent].inverse() * *global,
                None => *global,
            };
            JointPose::from_matrix(&local)
        })
        .collect();

    SkeletonPose::new(joint_poses)
}
