//! Clip listing command

use anyhow::Result;
use clap::Args;

use crate::commands::AssetArgs;
use crate::utils::{add_table_row, create_table, format_seconds, yes_no};

#[derive(Args, Debug)]
pub struct ClipsArgs {
    #[command(flatten)]
    pub assets: AssetArgs,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ClipsArgs) -> Result<()> {
    let character = args.assets.load()?;
    let infos = character.clip_infos();

    if args.json {
        #[cfg(feature = "serde")]
        return crate::commands::print_json(&serde_json::to_value(&infos)?);
        #[cfg(not(feature = "serde"))]
        return crate::commands::json_unsupported();
    }

    if infos.is_empty() {
        println!("'{}' has no clips", character.name);
        return Ok(());
    }

    let mut table = create_table(&["#", "Name", "Frames", "FPS", "Duration", "Loops"]);
    for (i, info) in infos.iter().enumerate() {
        add_table_row(
            &mut table,
            vec![
                i.to_string(),
                info.name.clone(),
                info.frame_count.to_string(),
                format!("{:.2}", info.frames_per_second),
                format_seconds(info.duration),
                yes_no(info.loops).to_string(),
            ],
        );
    }
    table.printstd();
    Ok(())
}
