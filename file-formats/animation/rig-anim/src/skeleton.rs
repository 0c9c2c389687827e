use glam::Mat4;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::error::{AnimError, Result};
use crate::io_ext::{ReadExt, WriteExt, ensure_available, expect_magic, read_cstring};
use crate::pose::SkeletonPose;

/// Magic tag of skeleton files ('ntks' as a native integer, "sktn" on disk
/// on little-endian hosts)
pub const SKELETON_MAGIC: u32 = u32::from_be_bytes(*b"ntks");

/// Size of one joint record: 3x4 inverse bind matrix plus parent index
pub const JOINT_RECORD_SIZE: u64 = 52;

/// Skeleton file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonHeader {
    pub magic: u32,
    pub joint_count: u32,
}

impl SkeletonHeader {
    pub const SIZE: u64 = 8;

    /// Parse a skeleton header, checking the magic tag
    pub fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let magic = expect_magic(reader, SKELETON_MAGIC, "skeleton")?;
        let joint_count = reader.read_u32_ne()?;
        Ok(Self { magic, joint_count })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_ne(self.magic)?;
        writer.write_u32_ne(self.joint_count)?;
        Ok(())
    }
}

/// A joint of the skeleton hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// Transforms model space into this joint's local space at bind time
    pub inverse_bind_matrix: Mat4,
    /// Index of the parent joint, always lower than this joint's index.
    /// `None` only for the root.
    pub parent: Option<usize>,
}

impl Joint {
    pub fn new(inverse_bind_matrix: Mat4, parent: Option<usize>) -> Self {
        Self {
            inverse_bind_matrix,
            parent,
        }
    }

    /// Model-space transform of this joint at bind time
    pub fn bind_matrix(&self) -> Mat4 {
        self.inverse_bind_matrix.inverse()
    }

    fn parse<R: Read + ?Sized>(reader: &mut R, index: usize) -> Result<Self> {
        let inverse_bind_matrix = reader.read_affine_3x4()?;
        let stored_parent = reader.read_i32_ne()?;

        // The root's stored parent is never looked up
        let parent = if index == 0 {
            None
        } else {
            match usize::try_from(stored_parent) {
                Ok(p) if p < index => Some(p),
                _ => {
                    return Err(AnimError::precondition(format!(
                        "joint {index} has parent {stored_parent}, expected an earlier joint"
                    )));
                }
            }
        };

        Ok(Self {
            inverse_bind_matrix,
            parent,
        })
    }

    fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_affine_3x4(&self.inverse_bind_matrix)?;
        let parent = self.parent.map_or(-1, |p| p as i32);
        writer.write_i32_ne(parent)?;
        Ok(())
    }
}

/// An ordered joint hierarchy with a parallel list of joint names.
///
/// Joints are stored in topological order: every joint's parent precedes it,
/// so a single forward pass visits parents before children.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
    joint_names: Vec<String>,
}

impl Skeleton {
    /// Build a skeleton, checking the hierarchy invariants
    pub fn new(joints: Vec<Joint>, joint_names: Vec<String>) -> Result<Self> {
        if joints.is_empty() {
            return Err(AnimError::precondition("skeleton has no joints"));
        }
        if joints.len() != joint_names.len() {
            return Err(AnimError::precondition(format!(
                "skeleton has {} joints but {} joint names",
                joints.len(),
                joint_names.len()
            )));
        }
        if joints[0].parent.is_some() {
            return Err(AnimError::precondition("joint 0 must be the root"));
        }
        for (i, joint) in joints.iter().enumerate().skip(1) {
            match joint.parent {
                Some(p) if p < i => {}
                other => {
                    return Err(AnimError::precondition(format!(
                        "joint {i} has parent {other:?}, expected an earlier joint"
                    )));
                }
            }
        }

        Ok(Self {
            joints,
            joint_names,
        })
    }

    /// Parse a skeleton file.
    ///
    /// A skeleton with zero joints is rejected: every evaluation path reads
    /// joint 0 as the root.
    pub fn parse<R: BufRead + Seek>(reader: &mut R) -> Result<Self> {
        let header = SkeletonHeader::parse(reader)?;
        if header.joint_count == 0 {
            return Err(AnimError::precondition("skeleton file declares zero joints"));
        }

        let joint_count = header.joint_count as usize;
        // Records plus at least one terminator byte per name
        let needed = u64::from(header.joint_count) * (JOINT_RECORD_SIZE + 1);
        ensure_available(reader, needed, || {
            format!("{} skeleton joints", header.joint_count)
        })?;

        let mut joints = Vec::with_capacity(joint_count);
        for i in 0..joint_count {
            joints.push(Joint::parse(reader, i)?);
        }

        let mut joint_names = Vec::with_capacity(joint_count);
        for i in 0..joint_count {
            joint_names.push(read_cstring(reader, &format!("name of joint {i}"))?);
        }

        log::debug!("Parsed skeleton with {joint_count} joints");

        Self::new(joints, joint_names)
    }

    /// Load a skeleton file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::parse(&mut reader)
    }

    /// Write the skeleton in the file format
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        SkeletonHeader {
            magic: SKELETON_MAGIC,
            joint_count: self.joints.len() as u32,
        }
        .write(writer)?;

        for joint in &self.joints {
            joint.write(writer)?;
        }
        for name in &self.joint_names {
            writer.write_cstring(name)?;
        }

        Ok(())
    }

    /// Save the skeleton to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Always false for a constructed skeleton
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn joint_name(&self, index: usize) -> Option<&str> {
        self.joint_names.get(index).map(String::as_str)
    }

    /// Index of the first joint with the given name
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.joint_names.iter().position(|n| n == name)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.joints.get(index).and_then(|j| j.parent)
    }

    /// Direct children of a joint, in index order
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Number of ancestors between a joint and the root
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent(index);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Model-space bind matrices, the inverse of every inverse bind matrix
    pub fn bind_pose_matrices(&self) -> Vec<Mat4> {
        self.joints.iter().map(Joint::bind_matrix).collect()
    }

    pub(crate) fn check_pose(&self, pose: &SkeletonPose) -> Result<()> {
        self.check_len(pose.len(), "pose")
    }

    pub(crate) fn check_len(&self, len: usize, what: &str) -> Result<()> {
        if len != self.joints.len() {
            return Err(AnimError::precondition(format!(
                "{what} has {len} entries but the skeleton has {} joints",
                self.joints.len()
            )));
        }
        Ok(())
    }
}
