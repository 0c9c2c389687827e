//! Clip evaluation command

use anyhow::{Context, Result, anyhow};
use clap::{Args, ValueEnum};
use glam::Mat4;

use rig_anim::kinematics::compute_global_matrices;
use rig_anim::skinning::compute_skinning_matrices;
use rig_anim::{AnimatedModel, EvaluationOptions, JointPose, SkeletonPose};

use crate::commands::{AssetArgs, UpAxisArg};
use crate::utils::{add_table_row, create_table, format_matrix, format_quat, format_vec3};

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[command(flatten)]
    pub assets: AssetArgs,

    /// Clip name or index (defaults to the first clip)
    #[arg(short, long)]
    pub clip: Option<String>,

    /// Clip time in seconds
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub time: f32,

    /// Wrap looping clips and clamp other clips into their time range first
    #[arg(long)]
    pub normalize: bool,

    /// Keep the root joint's horizontal translation
    #[arg(long)]
    pub root_motion: bool,

    /// Vertical axis kept when root motion is off
    #[arg(long, value_enum, default_value_t = UpAxisArg::Y)]
    pub up_axis: UpAxisArg,

    /// What to print per joint
    #[arg(short, long, value_enum, default_value_t = SampleOutput::Pose)]
    pub output: SampleOutput,

    /// Only show this joint
    #[arg(short, long)]
    pub joint: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutput {
    /// Local joint transforms
    Pose,
    /// Model-space joint matrices
    Global,
    /// Matrices that deform bind-pose vertices
    Skinning,
}

#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
struct SampleReport<'a> {
    model: &'a str,
    clip: &'a str,
    clip_time: f32,
    frame_a: usize,
    frame_b: usize,
    blend: f32,
    joints: Vec<JointReport<'a>>,
}

#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
struct JointReport<'a> {
    index: usize,
    name: &'a str,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pose: Option<JointPose>,
    /// Column-major
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    matrix: Option<[f32; 16]>,
}

pub fn execute(args: SampleArgs) -> Result<()> {
    let character = args.assets.load()?;
    let clip_index = resolve_clip(&character, args.clip.as_deref())?;
    let clip = &character.clips[clip_index];

    let time = if args.normalize {
        clip.normalize_time(args.time)
    } else {
        args.time
    };
    let sample = clip
        .sample(time)
        .with_context(|| format!("Failed to sample '{}' at {time}s", clip.name()))?;
    let pose = sample.interpolate()?;

    let options = EvaluationOptions::default()
        .with_root_motion(args.root_motion)
        .with_up_axis(args.up_axis.into());
    let matrices = evaluate_matrices(&character, &pose, options, args.output)?;

    let joint_filter = match args.joint.as_deref() {
        Some(name) => Some(
            character
                .skeleton
                .find_joint(name)
                .ok_or_else(|| anyhow!("'{}' has no joint named '{name}'", character.name))?,
        ),
        None => None,
    };

    let joints = character
        .skeleton
        .joint_names()
        .iter()
        .enumerate()
        .filter(|(i, _)| joint_filter.is_none_or(|j| j == *i))
        .map(|(i, name)| JointReport {
            index: i,
            name,
            pose: matrices.is_none().then(|| pose.joint_poses[i]),
            matrix: matrices.as_ref().map(|m| m[i].to_cols_array()),
        })
        .collect();

    let report = SampleReport {
        model: &character.name,
        clip: clip.name(),
        clip_time: time,
        frame_a: sample.frame_a,
        frame_b: sample.frame_b,
        blend: sample.t,
        joints,
    };

    if args.json {
        #[cfg(feature = "serde")]
        return crate::commands::print_json(&serde_json::to_value(&report)?);
        #[cfg(not(feature = "serde"))]
        return crate::commands::json_unsupported();
    }

    print_report(&report);
    Ok(())
}

/// Look a clip up by name, then by index
fn resolve_clip(character: &AnimatedModel, clip: Option<&str>) -> Result<usize> {
    if character.clips.is_empty() {
        anyhow::bail!("'{}' has no clips", character.name);
    }
    let Some(clip) = clip else {
        return Ok(0);
    };

    character
        .clip_index(clip)
        .or_else(|| clip.parse::<usize>().ok().filter(|&i| i < character.clips.len()))
        .ok_or_else(|| {
            let names: Vec<&str> = character.clips.iter().map(|c| c.name()).collect();
            anyhow!("No clip '{clip}' (available: {})", names.join(", "))
        })
}

fn evaluate_matrices(
    character: &AnimatedModel,
    pose: &SkeletonPose,
    options: EvaluationOptions,
    output: SampleOutput,
) -> Result<Option<Vec<Mat4>>> {
    let globals = match output {
        SampleOutput::Pose => return Ok(None),
        _ => compute_global_matrices(pose, &character.skeleton, options)?,
    };
    Ok(Some(match output {
        SampleOutput::Skinning => compute_skinning_matrices(&globals, &character.skeleton)?,
        _ => globals,
    }))
}

fn print_report(report: &SampleReport<'_>) {
    println!("Model: {}", report.model);
    println!("Clip: {} at {:.3}s", report.clip, report.clip_time);
    println!(
        "Frames: {} -> {} (blend {:.3})",
        report.frame_a, report.frame_b, report.blend
    );
    println!();

    let mut table = match report.joints.first().and_then(|j| j.matrix) {
        Some(_) => create_table(&["#", "Joint", "Matrix"]),
        None => create_table(&["#", "Joint", "Translation", "Rotation (w, x, y, z)", "Scale"]),
    };
    for joint in &report.joints {
        let mut cells = vec![joint.index.to_string(), joint.name.to_string()];
        if let Some(pose) = joint.pose {
            cells.push(format_vec3(pose.translation));
            cells.push(format_quat(pose.rotation));
            cells.push(format_vec3(pose.scale));
        }
        if let Some(cols) = joint.matrix {
            cells.push(format_matrix(&Mat4::from_cols_array(&cols)));
        }
        add_table_row(&mut table, cells);
    }
    table.printstd();
}
