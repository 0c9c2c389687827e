//! Model summary command

use anyhow::{Context, Result};
use clap::Args;
use std::fs;

use rig_anim::AnimatedModel;
use rig_anim::texture::{TextureSlot, TextureSource, resolve_texture};

use crate::commands::AssetArgs;
use crate::utils::{add_table_row, create_table, format_bytes, format_vec3, yes_no};

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub assets: AssetArgs,

    /// Also list the interleaved vertex layout
    #[arg(long)]
    pub layout: bool,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let character = args.assets.load()?;
    let model = &character.model;

    let directory_size = fs::read_dir(&character.directory)
        .with_context(|| format!("Failed to list {}", character.directory.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum::<u64>();

    println!("Model: {}", character.name);
    println!("Directory: {} ({})", character.directory.display(), format_bytes(directory_size));
    println!(
        "Vertices: {} ({} bytes each, skinned: {})",
        model.vertex_count(),
        model.stride(),
        yes_no(model.is_skinned())
    );
    println!("Indices: {}", model.indices.len());
    println!("Joints: {}", character.skeleton.len());
    println!("Clips: {}", character.clips.len());

    println!("\nMeshes (draw order):");
    let mut table = create_table(&["#", "Indices", "Triangles", "Material", "Alpha"]);
    for (i, mesh) in model.meshes.iter().enumerate() {
        let alpha = model.material(mesh).is_some_and(|m| m.has_alpha());
        add_table_row(
            &mut table,
            vec![
                i.to_string(),
                format!("{}..={}", mesh.index_begin, mesh.index_end),
                (mesh.index_count() / 3).to_string(),
                mesh.material_index.to_string(),
                yes_no(alpha).to_string(),
            ],
        );
    }
    table.printstd();

    print_materials(&character);

    if args.layout {
        println!("\nVertex layout (stride {}):", model.stride());
        let mut table = create_table(&["Attribute", "Format", "Offset", "Size"]);
        for attribute in model.layout().attributes {
            add_table_row(
                &mut table,
                vec![
                    format!("{:?}", attribute.kind),
                    format!("{:?}", attribute.format),
                    attribute.offset.to_string(),
                    attribute.format.size().to_string(),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn print_materials(character: &AnimatedModel) {
    println!("\nMaterials:");
    let mut table = create_table(&["#", "Diffuse", "Specular", "Shininess", "Slot", "Texture"]);
    for (i, material) in character.model.materials.iter().enumerate() {
        for (n, slot) in TextureSlot::ALL.into_iter().enumerate() {
            let texture = match resolve_texture(material, slot, &character.directory) {
                TextureSource::File(path) if path.is_file() => material.texture_name(slot).to_string(),
                TextureSource::File(_) => format!("{} (missing)", material.texture_name(slot)),
                TextureSource::Placeholder(p) => format!("<{p:?}>"),
            };
            let (index, diffuse, specular, shininess) = if n == 0 {
                (
                    i.to_string(),
                    format_vec3(material.diffuse),
                    format_vec3(material.specular),
                    format!("{:.1}", material.shininess),
                )
            } else {
                Default::default()
            };
            add_table_row(
                &mut table,
                vec![index, diffuse, specular, shininess, format!("{slot:?}"), texture],
            );
        }
    }
    table.printstd();
}
