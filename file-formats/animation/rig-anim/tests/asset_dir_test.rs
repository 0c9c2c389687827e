//! Loading complete asset directories from disk

mod common;

use std::fs;

use common::write_asset_dir;
use rig_anim::texture::{Placeholder, TextureLoader};
use rig_anim::{AnimError, AnimatedModel, ClipOrder, LoadOptions, TextureCache, load_directory};

#[test]
fn test_load_directory() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");

    let character = load_directory(dir.path()).unwrap();
    assert_eq!(character.name, "quad");
    assert_eq!(character.skeleton.len(), 3);

    // Sorted by file name
    let names: Vec<_> = character.clips.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["slide", "spin"]);
    assert_eq!(character.clip_index("spin"), Some(1));
    assert!(character.find_clip("walk").is_none());

    // Opaque mesh first
    assert_eq!(character.model.meshes[0].material_index, 0);
    assert!(!character.model.material(&character.model.meshes[0]).unwrap().has_alpha());
}

#[test]
fn test_unknown_files_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");
    fs::write(dir.path().join("readme.md"), b"notes").unwrap();
    fs::write(dir.path().join("LICENSE"), b"").unwrap();

    assert!(load_directory(dir.path()).is_ok());
}

#[test]
fn test_missing_model_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");
    fs::remove_file(dir.path().join("quad.model")).unwrap();

    let err = load_directory(dir.path()).unwrap_err();
    assert!(matches!(err, AnimError::PreconditionViolation(_)));
}

#[test]
fn test_clip_from_wrong_format_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");
    fs::copy(
        dir.path().join("quad.skeleton"),
        dir.path().join("broken.animation"),
    )
    .unwrap();

    let err = load_directory(dir.path()).unwrap_err();
    assert!(matches!(err, AnimError::MalformedHeader { format: "animation", .. }));
}

#[test]
fn test_discovery_order_keeps_every_clip() {
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");

    let options = LoadOptions {
        clip_order: ClipOrder::Discovery,
        ..LoadOptions::default()
    };
    let character = AnimatedModel::load(dir.path(), &options).unwrap();
    let mut names: Vec<_> = character.clips.iter().map(|c| c.name().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["slide", "spin"]);
}

struct PathLoader;

impl TextureLoader for PathLoader {
    type Handle = String;

    fn load_file(
        &mut self,
        path: &std::path::Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        fs::read(path)?;
        Ok(path.file_name().unwrap().to_string_lossy().into_owned())
    }

    fn load_placeholder(&mut self, placeholder: Placeholder) -> String {
        format!("{placeholder:?}")
    }
}

#[test]
fn test_material_textures_fall_back_for_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    write_asset_dir(dir.path(), "quad");
    let character = load_directory(dir.path()).unwrap();

    let mut cache = TextureCache::new(PathLoader);
    let textures = character.material_textures(&mut cache);

    assert_eq!(textures[0].diffuse, "skin.png");
    assert_eq!(textures[0].normal, "FlatNormal");
    // hair.png was never written
    assert_eq!(textures[1].diffuse, "White");
}
