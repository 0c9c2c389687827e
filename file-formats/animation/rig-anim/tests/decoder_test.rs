//! Decoding the three asset formats from bytes

mod common;

use pretty_assertions::assert_eq;
use std::io::Cursor;
use test_case::test_case;

use common::{quad_model, spin_clip, three_joint_skeleton};
use rig_anim::clip::{CLIP_MAGIC, ClipHeader};
use rig_anim::io_ext::WriteExt;
use rig_anim::model::{MODEL_MAGIC, ModelHeader};
use rig_anim::skeleton::{SKELETON_MAGIC, SkeletonHeader};
use rig_anim::{AnimError, AnimationClip, DecodeOptions, MaterialLayout, ModelData, Skeleton};

fn skeleton_bytes() -> Vec<u8> {
    let mut data = Vec::new();
    three_joint_skeleton().write(&mut data).unwrap();
    data
}

#[test]
fn test_skeleton_decodes() {
    let skeleton = Skeleton::parse(&mut Cursor::new(skeleton_bytes())).unwrap();
    assert_eq!(skeleton.len(), 3);
    assert_eq!(skeleton.joint_names(), ["hips", "spine", "head"]);
    assert_eq!(skeleton.parent(2), Some(1));
}

#[test]
fn test_empty_skeleton_rejected() {
    let mut data = Vec::new();
    SkeletonHeader {
        magic: SKELETON_MAGIC,
        joint_count: 0,
    }
    .write(&mut data)
    .unwrap();

    let err = Skeleton::parse(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, AnimError::PreconditionViolation(_)));
    assert!(!err.is_load_failure());
}

#[test_case(4 ; "inside the header")]
#[test_case(60 ; "inside the joint records")]
#[test_case(8 + 3 * 52 + 3 ; "inside the names")]
fn test_truncated_skeleton(len: usize) {
    let mut data = skeleton_bytes();
    data.truncate(len);

    let err = Skeleton::parse(&mut Cursor::new(data)).unwrap_err();
    assert!(
        matches!(
            err,
            AnimError::TruncatedStream { .. } | AnimError::Io(_)
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn test_clip_quaternions_are_reordered() {
    let mut data = Vec::new();
    ClipHeader {
        magic: CLIP_MAGIC,
        frame_count: 1,
        frames_per_second: 24.0,
        loops: true,
    }
    .write(&mut data)
    .unwrap();
    // w, x, y, z: a half turn about X
    for c in [0.0f32, 1.0, 0.0, 0.0] {
        data.write_f32_ne(c).unwrap();
    }
    data.write_vec3(glam::Vec3::new(1.0, 2.0, 3.0)).unwrap();
    data.write_vec3(glam::Vec3::ONE).unwrap();

    let clip = AnimationClip::parse(&mut Cursor::new(data), "flip", 1).unwrap();
    let rotation = clip.poses()[0].joint_poses[0].rotation;
    assert_eq!(rotation, glam::Quat::from_xyzw(1.0, 0.0, 0.0, 0.0));
    assert!(clip.loops());
}

#[test]
fn test_clip_decodes_with_skeleton_joint_count() {
    let skeleton = three_joint_skeleton();
    let clip = spin_clip(&skeleton, 6);
    let mut data = Vec::new();
    clip.write(&mut data).unwrap();

    let parsed = AnimationClip::parse(&mut Cursor::new(data), "spin", skeleton.len()).unwrap();
    assert_eq!(parsed, clip);
    assert_eq!(parsed.info().joint_count, 3);
}

#[test]
fn test_model_decodes() {
    let model = quad_model("quad");
    let mut data = Vec::new();
    model.write(&mut data, MaterialLayout::Flagged).unwrap();

    let parsed = ModelData::parse(&mut Cursor::new(data), "quad", &DecodeOptions::default())
        .unwrap();
    assert_eq!(parsed, model);
    assert!(parsed.is_skinned());
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_model_header_counts_checked_before_allocation() {
    let mut data = Vec::new();
    ModelHeader {
        magic: MODEL_MAGIC,
        mesh_count: 1,
        vertex_count: u32::MAX,
        index_count: 3,
        material_count: 1,
        vertex_flags: rig_anim::VertexFlags::all(),
    }
    .write(&mut data)
    .unwrap();

    let err = ModelData::parse(&mut Cursor::new(data), "huge", &DecodeOptions::default())
        .unwrap_err();
    assert!(err.is_load_failure());
}

#[test_case(SKELETON_MAGIC ; "skeleton magic")]
#[test_case(CLIP_MAGIC ; "clip magic")]
#[test_case(0 ; "zero")]
fn test_model_magic_mismatch(magic: u32) {
    let mut data = Vec::new();
    data.write_u32_ne(magic).unwrap();
    data.extend_from_slice(&[0; 20]);

    let err = ModelData::parse(&mut Cursor::new(data), "bad", &DecodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, AnimError::MalformedHeader { format: "model", .. }));
}

#[test]
fn test_material_name_without_terminator() {
    let model = quad_model("quad");
    let mut data = Vec::new();
    model.write(&mut data, MaterialLayout::Flagged).unwrap();
    // Cut the final normal-map terminator
    data.pop();

    let err = ModelData::parse(&mut Cursor::new(data), "quad", &DecodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, AnimError::TruncatedStream { .. }));
}
