//! Parent-relative joint poses and pose interpolation

use glam::{Mat4, Quat, Vec3};
use std::io::{Read, Write};

use crate::error::{AnimError, Result};
use crate::io_ext::{ReadExt, WriteExt};

/// A single joint's transform relative to its parent (or the world, for the root)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointPose {
    pub rotation: Quat,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl JointPose {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Size of one record in an animation file: rotation, translation, scale
    pub const RECORD_SIZE: u64 = 40;

    pub const fn new(rotation: Quat, translation: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
            scale: Vec3::ONE,
        }
    }

    /// Local transform matrix, composed as `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix into a joint pose.
    ///
    /// Translation is the last column. Scale is the magnitude of each basis
    /// axis of the upper 3x3 block, with the X axis negated for reflections.
    /// Rotation is the quaternion of the scale-normalized 3x3 block.
    ///
    /// Shear is not representable: a sheared matrix decomposes to the nearest
    /// rotation and the per-axis lengths, so `from_matrix(m).to_matrix()`
    /// differs from `m`.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        let rotation = if rotation.is_finite() && rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            log::warn!("degenerate joint matrix, using identity rotation");
            Quat::IDENTITY
        };

        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Blend towards `other`: linear for translation and scale, spherical
    /// (shortest arc) for rotation
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            rotation: self.rotation.slerp(other.rotation, t),
            translation: self.translation.lerp(other.translation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Compare within tolerance, treating `q` and `-q` as the same rotation
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        let same_rotation = self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff);
        same_rotation
            && self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }

    pub(crate) fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let rotation = reader.read_quat_wxyz()?;
        let translation = reader.read_vec3()?;
        let scale = reader.read_vec3()?;

        Ok(Self {
            rotation,
            translation,
            scale,
        })
    }

    pub(crate) fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_quat_wxyz(self.rotation)?;
        writer.write_vec3(self.translation)?;
        writer.write_vec3(self.scale)?;
        Ok(())
    }
}

impl Default for JointPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One `JointPose` per skeleton joint, index-aligned with the skeleton
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkeletonPose {
    pub joint_poses: Vec<JointPose>,
}

impl SkeletonPose {
    pub fn new(joint_poses: Vec<JointPose>) -> Self {
        Self { joint_poses }
    }

    /// A pose with every joint at the identity transform
    pub fn identity(joint_count: usize) -> Self {
        Self {
            joint_poses: vec![JointPose::IDENTITY; joint_count],
        }
    }

    pub fn len(&self) -> usize {
        self.joint_poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joint_poses.is_empty()
    }

    pub fn get(&self, joint: usize) -> Option<&JointPose> {
        self.joint_poses.get(joint)
    }

    pub fn get_mut(&mut self, joint: usize) -> Option<&mut JointPose> {
        self.joint_poses.get_mut(joint)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JointPose> {
        self.joint_poses.iter()
    }

    /// Blend every joint towards `other`; both poses must have the same length
    pub fn interpolate(&self, other: &Self, t: f32) -> Result<Self> {
        interpolate(self, other, t)
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.abs_diff_eq(b, max_abs_diff))
    }
}

impl From<Vec<JointPose>> for SkeletonPose {
    fn from(joint_poses: Vec<JointPose>) -> Self {
        Self { joint_poses }
    }
}

/// Interpolate two poses joint by joint.
///
/// `t` is not clamped; callers pass a value in `[0, 1]` in normal use.
/// Rotations are always slerped: linear quaternion blending visibly stutters
/// on clips with large rotation deltas between frames.
pub fn interpolate(a: &SkeletonPose, b: &SkeletonPose, t: f32) -> Result<SkeletonPose> {
    if a.len() != b.len() {
        return Err(AnimError::precondition(format!(
            "cannot interpolate poses of different lengths ({} and {})",
            a.len(),
            b.len()
        )));
    }

    let joint_poses = a
        .iter()
        .zip(b.iter())
        .map(|(pa, pb)| pa.interpolate(pb, t))
        .collect();

    Ok(SkeletonPose { joint_poses })
}
