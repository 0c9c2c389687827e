//! Command implementations

pub mod bind_pose;
pub mod clips;
pub mod info;
pub mod sample;
pub mod skeleton;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use rig_anim::{AnimatedModel, ClipOrder, LoadOptions, MaterialLayout, UpAxis};

/// Arguments shared by every command that loads an asset directory
#[derive(Args, Debug, Clone)]
pub struct AssetArgs {
    /// Directory holding one .model, one .skeleton and any .animation files
    pub directory: PathBuf,

    /// Order in which clips are indexed
    #[arg(long, value_enum, default_value_t = ClipOrderArg::Name)]
    pub clip_order: ClipOrderArg,

    /// Decode materials without the flags word
    #[arg(long)]
    pub legacy_materials: bool,
}

impl AssetArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            clip_order: self.clip_order.into(),
            material_layout: if self.legacy_materials {
                MaterialLayout::Legacy
            } else {
                MaterialLayout::Flagged
            },
        }
    }

    pub fn load(&self) -> Result<AnimatedModel> {
        AnimatedModel::load(&self.directory, &self.load_options())
            .with_context(|| format!("Failed to load assets from {}", self.directory.display()))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOrderArg {
    /// Sorted by file name
    Name,
    /// As listed by the filesystem
    Discovery,
}

impl From<ClipOrderArg> for ClipOrder {
    fn from(order: ClipOrderArg) -> Self {
        match order {
            ClipOrderArg::Name => ClipOrder::ByName,
            ClipOrderArg::Discovery => ClipOrder::Discovery,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpAxisArg {
    Y,
    Z,
}

impl From<UpAxisArg> for UpAxis {
    fn from(axis: UpAxisArg) -> Self {
        match axis {
            UpAxisArg::Y => UpAxis::Y,
            UpAxisArg::Z => UpAxis::Z,
        }
    }
}

/// Print a value as pretty JSON
#[cfg(feature = "serde")]
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "serde"))]
pub fn json_unsupported() -> Result<()> {
    anyhow::bail!("JSON output requires the 'serde' feature")
}
