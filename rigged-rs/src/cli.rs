//! Root CLI structure for rigged

use clap::{Parser, Subcommand};

use crate::commands::bind_pose::BindPoseArgs;
use crate::commands::clips::ClipsArgs;
use crate::commands::info::InfoArgs;
use crate::commands::sample::SampleArgs;
use crate::commands::skeleton::SkeletonArgs;

#[derive(Parser)]
#[command(name = "rigged")]
#[command(about = "Inspect and evaluate skeletal animation asset directories", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a model: meshes, materials, vertex layout and textures
    Info(InfoArgs),

    /// Show the joint hierarchy as a tree
    Skeleton(SkeletonArgs),

    /// List the animation clips of a directory
    Clips(ClipsArgs),

    /// Evaluate a clip at a point in time
    Sample(SampleArgs),

    /// Show the bind pose recovered from the skeleton
    BindPose(BindPoseArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
