//! Per-character playback state
//!
//! A character is either playing one of its clips or holding a hand-edited
//! pose. Both produce a [`SkeletonPose`] that goes through the same forward
//! kinematics and skinning path. The state never owns the character's assets;
//! every call takes the [`AnimatedModel`] it animates.

use glam::Mat4;

use crate::asset_dir::AnimatedModel;
use crate::clip::AnimationClip;
use crate::error::{AnimError, Result};
use crate::kinematics::{EvaluationOptions, RootMotion, bind_pose, compute_global_matrices};
use crate::pose::{JointPose, SkeletonPose};
use crate::skeleton::Skeleton;
use crate::skinning::compute_skinning_matrices;

/// Transport for clip playback
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlayer {
    clip_index: usize,
    clip_time: f32,
    speed: f32,
    paused: bool,
    pub options: EvaluationOptions,
}

impl ClipPlayer {
    /// Start the clip at `clip_index` from time zero
    pub fn new(model: &AnimatedModel, clip_index: usize) -> Result<Self> {
        let mut player = Self {
            clip_index: 0,
            clip_time: 0.0,
            speed: 1.0,
            paused: false,
            options: EvaluationOptions::default(),
        };
        player.select_clip(model, clip_index)?;
        Ok(player)
    }

    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    pub fn clip<'a>(&self, model: &'a AnimatedModel) -> Result<&'a AnimationClip> {
        model.clip(self.clip_index).ok_or_else(|| {
            AnimError::precondition(format!(
                "'{}' has no clip {} ({} clips)",
                model.name,
                self.clip_index,
                model.clips.len()
            ))
        })
    }

    /// Switch clips, restarting from time zero
    pub fn select_clip(&mut self, model: &AnimatedModel, clip_index: usize) -> Result<()> {
        if clip_index >= model.clips.len() {
            return Err(AnimError::precondition(format!(
                "'{}' has no clip {} ({} clips)",
                model.name,
                clip_index,
                model.clips.len()
            )));
        }
        self.clip_index = clip_index;
        self.clip_time = 0.0;
        Ok(())
    }

    pub fn clip_time(&self) -> f32 {
        self.clip_time
    }

    /// Scrub to a time. Scrubbing pauses playback.
    pub fn set_clip_time(&mut self, model: &AnimatedModel, clip_time: f32) -> Result<()> {
        let clip = self.clip(model)?;
        if !clip_time.is_finite() {
            return Err(AnimError::precondition(format!(
                "cannot scrub to clip time {clip_time}"
            )));
        }
        self.clip_time = clip.normalize_time(clip_time);
        self.paused = true;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Playback rate; negative plays backwards
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_root_motion(&mut self, root_motion: impl Into<RootMotion>) {
        self.options.root_motion = root_motion.into();
    }

    /// Move the clock by `dt` seconds scaled by the speed. Looping clips wrap
    /// around in either direction; other clips stop at their ends.
    pub fn advance(&mut self, model: &AnimatedModel, dt: f32) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        let clip = self.clip(model)?;
        let next = self.clip_time + self.speed * dt;
        if !next.is_finite() {
            return Err(AnimError::precondition(format!(
                "clip time became {next} after advancing by {dt}"
            )));
        }
        self.clip_time = clip.normalize_time(next);
        Ok(())
    }

    /// Fraction of the clip played, in `[0, 1]`
    pub fn progress(&self, model: &AnimatedModel) -> Result<f32> {
        Ok(self.clip_time / self.clip(model)?.duration())
    }

    pub fn pose(&self, model: &AnimatedModel) -> Result<SkeletonPose> {
        self.clip(model)?.evaluate(self.clip_time)
    }
}

/// A hand-editable pose seeded from the bind pose
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEditor {
    pose: SkeletonPose,
    pub options: EvaluationOptions,
}

impl PoseEditor {
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            pose: bind_pose(skeleton),
            options: EvaluationOptions::default().with_root_motion(RootMotion::Apply),
        }
    }

    pub fn pose(&self) -> &SkeletonPose {
        &self.pose
    }

    pub fn joint_pose(&self, joint: usize) -> Option<&JointPose> {
        self.pose.get(joint)
    }

    pub fn joint_pose_mut(&mut self, joint: usize) -> Option<&mut JointPose> {
        self.pose.get_mut(joint)
    }

    /// Return every joint to the bind pose
    pub fn reset(&mut self, skeleton: &Skeleton) {
        self.pose = bind_pose(skeleton);
    }
}

/// What a character is currently showing
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    ClipPlayer(ClipPlayer),
    PoseEditor(PoseEditor),
}

impl PlaybackState {
    /// Play the first clip, or edit the bind pose if there are no clips
    pub fn for_model(model: &AnimatedModel) -> Result<Self> {
        if model.clips.is_empty() {
            Ok(Self::PoseEditor(PoseEditor::new(&model.skeleton)))
        } else {
            ClipPlayer::new(model, 0).map(Self::ClipPlayer)
        }
    }

    /// Advance time; a pose editor has no clock
    pub fn update(&mut self, model: &AnimatedModel, dt: f32) -> Result<()> {
        match self {
            Self::ClipPlayer(player) => player.advance(model, dt),
            Self::PoseEditor(_) => Ok(()),
        }
    }

    pub fn options(&self) -> EvaluationOptions {
        match self {
            Self::ClipPlayer(player) => player.options,
            Self::PoseEditor(editor) => editor.options,
        }
    }

    pub fn current_pose(&self, model: &AnimatedModel) -> Result<SkeletonPose> {
        match self {
            Self::ClipPlayer(player) => player.pose(model),
            Self::PoseEditor(editor) => Ok(editor.pose().clone()),
        }
    }

    /// Model-space joint matrices, e.g. for drawing the skeleton
    pub fn global_matrices(&self, model: &AnimatedModel) -> Result<Vec<Mat4>> {
        let pose = self.current_pose(model)?;
        compute_global_matrices(&pose, &model.skeleton, self.options())
    }

    pub fn skinning_matrices(&self, model: &AnimatedModel) -> Result<Vec<Mat4>> {
        let globals = self.global_matrices(model)?;
        compute_skinning_matrices(&globals, &model.skeleton)
    }
}
