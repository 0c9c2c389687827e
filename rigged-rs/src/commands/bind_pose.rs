//! Bind pose command

use anyhow::Result;
use clap::Args;
use glam::Mat4;

use rig_anim::EvaluationOptions;
use rig_anim::RootMotion;
use rig_anim::skinning::skinning_matrices_for_pose;

use crate::commands::AssetArgs;
use crate::utils::{add_table_row, create_table, format_quat, format_vec3};

#[derive(Args, Debug)]
pub struct BindPoseArgs {
    #[command(flatten)]
    pub assets: AssetArgs,

    /// Print the pose as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: BindPoseArgs) -> Result<()> {
    let character = args.assets.load()?;
    let skeleton = &character.skeleton;
    let pose = character.bind_pose();

    if args.json {
        #[cfg(feature = "serde")]
        return crate::commands::print_json(&serde_json::json!({
            "model": character.name,
            "joint_names": skeleton.joint_names(),
            "pose": pose,
        }));
        #[cfg(not(feature = "serde"))]
        return crate::commands::json_unsupported();
    }

    let mut table = create_table(&["#", "Joint", "Parent", "Translation", "Rotation (w, x, y, z)", "Scale"]);
    for (i, local) in pose.iter().enumerate() {
        let parent = skeleton
            .parent(i)
            .and_then(|p| skeleton.joint_name(p))
            .unwrap_or("-");
        add_table_row(
            &mut table,
            vec![
                i.to_string(),
                skeleton.joint_name(i).unwrap_or_default().to_string(),
                parent.to_string(),
                format_vec3(local.translation),
                format_quat(local.rotation),
                format_vec3(local.scale),
            ],
        );
    }
    table.printstd();

    // The bind pose must skin every vertex to where it already is
    let options = EvaluationOptions::default().with_root_motion(RootMotion::Apply);
    let skinning = skinning_matrices_for_pose(&pose, skeleton, options)?;
    let deviation = max_deviation_from_identity(&skinning);
    println!("\nMax bind skinning deviation from identity: {deviation:.6}");
    if deviation > 1e-3 {
        log::warn!(
            "Inverse bind matrices of '{}' contain shear or non-invertible transforms",
            character.name
        );
    }

    Ok(())
}

fn max_deviation_from_identity(matrices: &[Mat4]) -> f32 {
    let identity = Mat4::IDENTITY.to_cols_array();
    matrices
        .iter()
        .flat_map(|m| {
            m.to_cols_array()
                .into_iter()
                .zip(identity)
                .map(|(a, b)| (a - b).abs())
        })
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_max_deviation() {
        assert_eq!(max_deviation_from_identity(&[Mat4::IDENTITY]), 0.0);
        let shifted = Mat4::from_translation(Vec3::new(0.0, 0.25, 0.0));
        assert_eq!(max_deviation_from_identity(&[Mat4::IDENTITY, shifted]), 0.25);
    }
}
