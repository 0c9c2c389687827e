//! Keyframe animation clips and clip-time sampling
//!
//! A clip stores one [`SkeletonPose`] per sampled frame at a fixed frame rate.
//! Evaluating a clip at a continuous time finds the two bracketing frames and
//! blends them. Looping clips store `frame_count` poses and wrap from the last
//! frame back to the first; non-looping clips store an extra terminal pose so
//! the final interval has something to blend towards.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::error::{AnimError, Result};
use crate::io_ext::{ReadExt, WriteExt, ensure_available, expect_magic};
use crate::pose::{JointPose, SkeletonPose, interpolate};

/// Magic tag of animation clip files ("clip" on disk on little-endian hosts)
pub const CLIP_MAGIC: u32 = u32::from_be_bytes(*b"pilc");

/// How far past the last frame a non-looping sample may land and still be
/// treated as the terminal pose, in frames
const END_TOLERANCE_FRAMES: f32 = 1e-3;

/// Animation clip file header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipHeader {
    pub magic: u32,
    pub frame_count: u32,
    pub frames_per_second: f32,
    /// Stored as a 32-bit integer, any non-zero value means looping
    pub loops: bool,
}

impl ClipHeader {
    pub const SIZE: u64 = 16;

    pub fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let magic = expect_magic(reader, CLIP_MAGIC, "animation")?;
        let frame_count = reader.read_u32_ne()?;
        let frames_per_second = reader.read_f32_ne()?;
        let loops = reader.read_u32_ne()? != 0;

        Ok(Self {
            magic,
            frame_count,
            frames_per_second,
            loops,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_ne(self.magic)?;
        writer.write_u32_ne(self.frame_count)?;
        writer.write_f32_ne(self.frames_per_second)?;
        writer.write_u32_ne(u32::from(self.loops))?;
        Ok(())
    }

    /// Number of stored poses
    pub fn pose_count(&self) -> u64 {
        pose_count(self.frame_count, self.loops) as u64
    }
}

fn pose_count(frame_count: u32, loops: bool) -> usize {
    frame_count as usize + usize::from(!loops)
}

/// Summary of a clip for listings and the playback collaborator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipInfo {
    pub name: String,
    pub frame_count: u32,
    pub frames_per_second: f32,
    pub loops: bool,
    pub duration: f32,
    pub joint_count: usize,
}

/// The two stored poses that bracket a clip time, and the blend factor
/// between them
#[derive(Debug, Clone, Copy)]
pub struct ClipSample<'a> {
    pub pose_a: &'a SkeletonPose,
    pub pose_b: &'a SkeletonPose,
    pub frame_a: usize,
    pub frame_b: usize,
    pub t: f32,
}

impl ClipSample<'_> {
    /// Blend the bracketing poses
    pub fn interpolate(&self) -> Result<SkeletonPose> {
        interpolate(self.pose_a, self.pose_b, self.t)
    }
}

/// A keyframe animation clip, immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    frames_per_second: f32,
    frame_count: u32,
    loops: bool,
    poses: Vec<SkeletonPose>,
}

impl AnimationClip {
    /// Build a clip, checking the frame rate and the stored pose count
    pub fn new(
        name: impl Into<String>,
        frames_per_second: f32,
        frame_count: u32,
        loops: bool,
        poses: Vec<SkeletonPose>,
    ) -> Result<Self> {
        let name = name.into();
        validate_header(&name, frames_per_second, frame_count)?;

        let expected = pose_count(frame_count, loops);
        if poses.len() != expected {
            return Err(AnimError::precondition(format!(
                "clip '{name}' has {} poses, expected {expected}",
                poses.len()
            )));
        }
        if let Some(first) = poses.first()
            && let Some(bad) = poses.iter().position(|p| p.len() != first.len())
        {
            return Err(AnimError::precondition(format!(
                "clip '{name}' pose {bad} has {} joints, pose 0 has {}",
                poses[bad].len(),
                first.len()
            )));
        }

        Ok(Self {
            name,
            frames_per_second,
            frame_count,
            loops,
            poses,
        })
    }

    /// Parse a clip file. The file does not record its joint count, so the
    /// count comes from the skeleton the clip animates.
    pub fn parse<R: Read + Seek>(
        reader: &mut R,
        name: impl Into<String>,
        joint_count: usize,
    ) -> Result<Self> {
        let name = name.into();
        if joint_count == 0 {
            return Err(AnimError::precondition(format!(
                "clip '{name}' requires at least one joint"
            )));
        }
        let header = ClipHeader::parse(reader)?;
        validate_header(&name, header.frames_per_second, header.frame_count)?;

        let pose_total = header.pose_count();
        let needed = pose_total
            .saturating_mul(joint_count as u64)
            .saturating_mul(JointPose::RECORD_SIZE);
        ensure_available(reader, needed, || {
            format!("{pose_total} poses of {joint_count} joints in clip '{name}'")
        })?;

        let mut non_unit = 0usize;
        let mut poses = Vec::with_capacity(pose_total as usize);
        for _ in 0..pose_total {
            let mut joint_poses = Vec::with_capacity(joint_count);
            for _ in 0..joint_count {
                let pose = JointPose::parse(reader)?;
                if !pose.rotation.is_normalized() {
                    non_unit += 1;
                }
                joint_poses.push(pose);
            }
            poses.push(SkeletonPose::new(joint_poses));
        }

        if non_unit > 0 {
            log::warn!("clip '{name}' has {non_unit} non-unit rotations");
        }
        log::debug!(
            "Parsed clip '{}': {} frames at {} fps, loops: {}",
            name,
            header.frame_count,
            header.frames_per_second,
            header.loops
        );

        Ok(Self {
            name,
            frames_per_second: header.frames_per_second,
            frame_count: header.frame_count,
            loops: header.loops,
            poses,
        })
    }

    /// Load a clip file, naming the clip after the file stem
    pub fn load<P: AsRef<Path>>(path: P, joint_count: usize) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = BufReader::new(File::open(path)?);
        Self::parse(&mut reader, name, joint_count)
    }

    /// Write the clip in the file format
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        ClipHeader {
            magic: CLIP_MAGIC,
            frame_count: self.frame_count,
            frames_per_second: self.frames_per_second,
            loops: self.loops,
        }
        .write(writer)?;

        for pose in &self.poses {
            for joint_pose in pose.iter() {
                joint_pose.write(writer)?;
            }
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn loops(&self) -> bool {
        self.loops
    }

    pub fn poses(&self) -> &[SkeletonPose] {
        &self.poses
    }

    /// Joints per stored pose
    pub fn joint_count(&self) -> usize {
        self.poses.first().map_or(0, SkeletonPose::len)
    }

    /// Length of the clip in seconds
    pub fn duration(&self) -> f32 {
        self.frame_count as f32 / self.frames_per_second
    }

    /// Reduce a time into `[0, duration)`, wrapping negative times forward
    pub fn wrap_time(&self, time: f32) -> f32 {
        let duration = self.duration();
        let wrapped = time % duration;
        let wrapped = if wrapped < 0.0 {
            wrapped + duration
        } else {
            wrapped
        };
        // A tiny negative remainder can round up to exactly `duration`
        if wrapped >= duration { 0.0 } else { wrapped }
    }

    /// Clamp a time into `[0, duration]`
    pub fn clamp_time(&self, time: f32) -> f32 {
        time.clamp(0.0, self.duration())
    }

    /// Wrap for looping clips, clamp otherwise
    pub fn normalize_time(&self, time: f32) -> f32 {
        if self.loops {
            self.wrap_time(time)
        } else {
            self.clamp_time(time)
        }
    }

    /// Find the stored poses bracketing `clip_time` and the blend factor.
    ///
    /// The time is not reduced here; callers wrap or clamp it first. Looping
    /// clips take frame indices modulo `frame_count`, so the last frame blends
    /// back into the first. For non-looping clips a time at the very end
    /// selects the final interval with `t = 1`, returning the terminal pose.
    pub fn sample(&self, clip_time: f32) -> Result<ClipSample<'_>> {
        if !clip_time.is_finite() || clip_time < 0.0 {
            return Err(AnimError::precondition(format!(
                "clip time {clip_time} is outside clip '{}'",
                self.name
            )));
        }

        let frame = clip_time * self.frames_per_second;
        let n = self.frame_count as usize;

        let (frame_a, frame_b, t) = if self.loops {
            let whole = frame.floor();
            let a = (whole as u64 % n as u64) as usize;
            (a, (a + 1) % n, frame - whole)
        } else if frame >= n as f32 {
            if frame > n as f32 + END_TOLERANCE_FRAMES {
                return Err(AnimError::precondition(format!(
                    "clip time {clip_time} is past the end of clip '{}' ({} s)",
                    self.name,
                    self.duration()
                )));
            }
            (n - 1, n, 1.0)
        } else {
            let whole = frame.floor();
            let a = whole as usize;
            (a, a + 1, frame - whole)
        };

        match (self.poses.get(frame_a), self.poses.get(frame_b)) {
            (Some(pose_a), Some(pose_b)) => Ok(ClipSample {
                pose_a,
                pose_b,
                frame_a,
                frame_b,
                t,
            }),
            _ => Err(AnimError::precondition(format!(
                "frames {frame_a} and {frame_b} are outside clip '{}' ({} poses)",
                self.name,
                self.poses.len()
            ))),
        }
    }

    /// Sample and blend the clip at `clip_time`
    pub fn evaluate(&self, clip_time: f32) -> Result<SkeletonPose> {
        self.sample(clip_time)?.interpolate()
    }

    pub fn info(&self) -> ClipInfo {
        ClipInfo {
            name: self.name.clone(),
            frame_count: self.frame_count,
            frames_per_second: self.frames_per_second,
            loops: self.loops,
            duration: self.duration(),
            joint_count: self.joint_count(),
        }
    }
}

fn validate_header(name: &str, frames_per_second: f32, frame_count: u32) -> Result<()> {
    if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
        return Err(AnimError::precondition(format!(
            "clip '{name}' has invalid frame rate {frames_per_second}"
        )));
    }
    if frame_count == 0 {
        return Err(AnimError::precondition(format!("clip '{name}' has no frames")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Cursor;
    use test_case::test_case;

    fn pose_at(x: f32) -> SkeletonPose {
        SkeletonPose::new(vec![JointPose::from_translation(Vec3::new(x, 0.0, 0.0))])
    }

    fn clip(frame_count: u32, loops: bool) -> AnimationClip {
        let poses = (0..pose_count(frame_count, loops))
            .map(|i| pose_at(i as f32))
            .collect();
        AnimationClip::new("walk", 2.0, frame_count, loops, poses).unwrap()
    }

    #[test]
    fn test_pose_count_depends_on_looping() {
        assert_eq!(clip(4, true).poses().len(), 4);
        assert_eq!(clip(4, false).poses().len(), 5);

        let result = AnimationClip::new("bad", 2.0, 4, true, vec![pose_at(0.0); 5]);
        assert!(matches!(result, Err(AnimError::PreconditionViolation(_))));
    }

    #[test_case(0.0, 0, 1, 0.0 ; "start")]
    #[test_case(0.75, 1, 2, 0.5 ; "between frames")]
    #[test_case(1.75, 3, 0, 0.5 ; "last frame wraps to first")]
    fn test_looping_sample(time: f32, a: usize, b: usize, t: f32) {
        let clip = clip(4, true);
        let sample = clip.sample(time).unwrap();
        assert_eq!((sample.frame_a, sample.frame_b), (a, b));
        assert!((sample.t - t).abs() < 1e-6);
    }

    #[test]
    fn test_looping_duration_matches_start() {
        let clip = clip(4, true);
        let at_end = clip.evaluate(clip.duration()).unwrap();
        let at_start = clip.evaluate(0.0).unwrap();
        assert!(at_end.abs_diff_eq(&at_start, 1e-6));
    }

    #[test]
    fn test_non_looping_end_returns_terminal_pose() {
        let clip = clip(4, false);
        let sample = clip.sample(clip.duration()).unwrap();
        assert_eq!((sample.frame_a, sample.frame_b), (3, 4));

        let pose = clip.evaluate(clip.duration()).unwrap();
        assert!(pose.abs_diff_eq(&pose_at(4.0), 1e-6));
    }

    #[test_case(-0.1 ; "negative")]
    #[test_case(2.6 ; "past the end")]
    #[test_case(f32::NAN ; "nan")]
    #[test_case(f32::INFINITY ; "infinite")]
    fn test_out_of_domain_time_rejected(time: f32) {
        let clip = clip(4, false);
        assert!(matches!(
            clip.sample(time),
            Err(AnimError::PreconditionViolation(_))
        ));
    }

    #[test_case(0.5, 0.5 ; "inside")]
    #[test_case(2.5, 0.5 ; "one lap")]
    #[test_case(-0.5, 1.5 ; "negative wraps forward")]
    #[test_case(2.0, 0.0 ; "exactly duration")]
    fn test_wrap_time(time: f32, expected: f32) {
        let clip = clip(4, true);
        assert!((clip.wrap_time(time) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_time_clamps_non_looping() {
        let clip = clip(4, false);
        assert_eq!(clip.normalize_time(5.0), 2.0);
        assert_eq!(clip.normalize_time(-1.0), 0.0);
    }

    #[test]
    fn test_zero_frame_clip_rejected() {
        let mut data = Vec::new();
        ClipHeader {
            magic: CLIP_MAGIC,
            frame_count: 0,
            frames_per_second: 30.0,
            loops: true,
        }
        .write(&mut data)
        .unwrap();

        let err = AnimationClip::parse(&mut Cursor::new(data), "empty", 3).unwrap_err();
        assert!(matches!(err, AnimError::PreconditionViolation(_)));
    }

    #[test]
    fn test_zero_joint_clip_rejected() {
        let mut data = Vec::new();
        ClipHeader {
            magic: CLIP_MAGIC,
            frame_count: u32::MAX,
            frames_per_second: 30.0,
            loops: true,
        }
        .write(&mut data)
        .unwrap();

        let err = AnimationClip::parse(&mut Cursor::new(data), "empty", 0).unwrap_err();
        assert!(matches!(err, AnimError::PreconditionViolation(ref m) if m.contains("joint")));
    }

    #[test]
    fn test_parse_checks_pose_bytes() {
        let clip = clip(4, false);
        let mut data = Vec::new();
        clip.write(&mut data).unwrap();
        assert_eq!(data.len() as u64, ClipHeader::SIZE + 5 * JointPose::RECORD_SIZE);

        let parsed = AnimationClip::parse(&mut Cursor::new(data.clone()), "walk", 1).unwrap();
        assert_eq!(parsed, clip);

        // Two joints per pose need twice the bytes
        let err = AnimationClip::parse(&mut Cursor::new(data), "walk", 2).unwrap_err();
        assert!(matches!(err, AnimError::TruncatedStream { .. }));
    }

    #[test]
    fn test_skeleton_magic_rejected() {
        let mut data = Vec::new();
        data.write_u32_ne(crate::skeleton::SKELETON_MAGIC).unwrap();
        data.extend_from_slice(&[0; 12]);

        let err = AnimationClip::parse(&mut Cursor::new(data), "walk", 1).unwrap_err();
        assert!(matches!(err, AnimError::MalformedHeader { format: "animation", .. }));
    }
}
