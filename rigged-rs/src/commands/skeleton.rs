//! Joint hierarchy command

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use rig_anim::kinematics::bind_pose;
use rig_anim::{AssetManifest, ClipOrder, Skeleton, SkeletonPose};

use crate::utils::{NodeType, TreeNode, TreeOptions, format_quat, format_vec3, render_tree};

#[derive(Args, Debug)]
pub struct SkeletonArgs {
    /// A .skeleton file or an asset directory containing one
    pub path: PathBuf,

    /// Maximum depth to display
    #[arg(long)]
    pub depth: Option<usize>,

    /// Show each joint's local bind transform
    #[arg(long)]
    pub bind: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print joint details on one line
    #[arg(long)]
    pub compact: bool,
}

pub fn execute(args: SkeletonArgs) -> Result<()> {
    let (name, skeleton) = load_skeleton(&args.path)?;

    let mut root = TreeNode::new(format!("{name} ({} joints)", skeleton.len()), NodeType::Root);
    let bind = args.bind.then(|| bind_pose(&skeleton));
    root = root.add_child(joint_node(&skeleton, 0, bind.as_ref()));

    let options = TreeOptions {
        max_depth: args.depth,
        no_color: args.no_color,
        show_metadata: true,
        compact: args.compact,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

fn load_skeleton(path: &Path) -> Result<(String, Skeleton)> {
    let file = if path.is_dir() {
        AssetManifest::scan(path, ClipOrder::ByName)
            .with_context(|| format!("Failed to scan {}", path.display()))?
            .skeleton
    } else {
        path.to_path_buf()
    };

    let skeleton = Skeleton::load(&file)
        .with_context(|| format!("Failed to load skeleton {}", file.display()))?;
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, skeleton))
}

fn joint_node(skeleton: &Skeleton, index: usize, bind: Option<&SkeletonPose>) -> TreeNode {
    let children: Vec<usize> = skeleton.children(index).collect();
    let node_type = if children.is_empty() {
        NodeType::Leaf
    } else {
        NodeType::Joint
    };

    let name = skeleton.joint_name(index).unwrap_or("<unnamed>");
    let mut node = TreeNode::new(name, node_type).with_metadata("index", index.to_string());

    if let Some(local) = bind.and_then(|pose| pose.get(index)) {
        node = node
            .with_metadata("translation", format_vec3(local.translation))
            .with_metadata("rotation", format_quat(local.rotation))
            .with_metadata("scale", format_vec3(local.scale));
    }

    children
        .into_iter()
        .fold(node, |node, child| node.add_child(joint_node(skeleton, child, bind)))
}
