//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use std::path::Path;

use rig_anim::model::{JointInfluence, MeshDescriptor, Vertex};
use rig_anim::{
    AnimationClip, Joint, JointPose, MaterialLayout, ModelData, PhongMaterial, Skeleton,
    SkeletonPose, VertexFlags,
};

/// Root with two children stacked along +Y, one unit apart
pub fn three_joint_skeleton() -> Skeleton {
    Skeleton::new(
        vec![
            Joint::new(Mat4::IDENTITY, None),
            Joint::new(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), Some(0)),
            Joint::new(
                Mat4::from_rotation_translation(Quat::from_rotation_x(0.5), Vec3::ZERO)
                    * Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
                Some(1),
            ),
        ],
        vec!["hips".into(), "spine".into(), "head".into()],
    )
    .unwrap()
}

/// Root with two sibling legs one unit either side of it along X; the right
/// leg is also turned about Z
pub fn forked_skeleton() -> Skeleton {
    let right_bind =
        Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)) * Mat4::from_rotation_z(0.3);
    Skeleton::new(
        vec![
            Joint::new(Mat4::IDENTITY, None),
            Joint::new(Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)), Some(0)),
            Joint::new(right_bind.inverse(), Some(0)),
        ],
        vec!["hips".into(), "left_leg".into(), "right_leg".into()],
    )
    .unwrap()
}

/// Non-looping clip at 2 fps whose root reaches x = 1 on frame 1 and holds
pub fn stride_clip(skeleton: &Skeleton) -> AnimationClip {
    let start = rig_anim::kinematics::bind_pose(skeleton);
    let poses = [0.0, 1.0, 1.0]
        .into_iter()
        .map(|x| {
            let mut pose = start.clone();
            pose.joint_poses[0].translation = Vec3::new(x, 0.0, 0.0);
            pose
        })
        .collect();
    AnimationClip::new("stride", 2.0, 2, false, poses).unwrap()
}

/// Two frames at 2 fps, non-looping, root moving from the origin to +X
pub fn root_slide_clip(skeleton: &Skeleton) -> AnimationClip {
    let start = rig_anim::kinematics::bind_pose(skeleton);
    let poses = (0..3)
        .map(|i| {
            let mut pose = start.clone();
            pose.joint_poses[0].translation = Vec3::new(i as f32 * 0.5, 0.0, 0.0);
            pose
        })
        .collect();
    AnimationClip::new("slide", 2.0, 2, false, poses).unwrap()
}

/// Looping clip that spins the spine about Y
pub fn spin_clip(skeleton: &Skeleton, frame_count: u32) -> AnimationClip {
    let start = rig_anim::kinematics::bind_pose(skeleton);
    let poses = (0..frame_count)
        .map(|i| {
            let mut pose = start.clone();
            let angle = std::f32::consts::TAU * i as f32 / frame_count as f32;
            pose.joint_poses[1].rotation = Quat::from_rotation_y(angle);
            pose
        })
        .collect();
    AnimationClip::new("spin", 30.0, frame_count, true, poses).unwrap()
}

pub fn quad_model(name: &str) -> ModelData {
    let vertex = |x: f32, y: f32, joint: u8| Vertex {
        position: Vec3::new(x, y, 0.0),
        normal: Vec3::Z,
        tex_coords: Vec2::new(x, y),
        tangent: Some(Vec3::X),
        joints: Some(JointInfluence {
            indices: [joint, 0, 0, 0],
            weights: Vec4::new(1.0, 0.0, 0.0, 0.0),
        }),
    };
    let vertices = [
        vertex(0.0, 0.0, 0),
        vertex(1.0, 0.0, 0),
        vertex(1.0, 2.0, 2),
        vertex(0.0, 2.0, 2),
    ];

    ModelData::from_vertices(
        name,
        VertexFlags::all(),
        &vertices,
        vec![
            MeshDescriptor {
                index_begin: 0,
                index_end: 2,
                material_index: 1,
            },
            MeshDescriptor {
                index_begin: 3,
                index_end: 5,
                material_index: 0,
            },
        ],
        vec![0, 1, 2, 0, 2, 3],
        vec![
            PhongMaterial {
                diffuse: Vec3::ONE,
                specular: Vec3::splat(0.2),
                shininess: 16.0,
                diffuse_map: "skin.png".into(),
                ..PhongMaterial::default()
            },
            PhongMaterial {
                diffuse: Vec3::ONE,
                flags: rig_anim::model::MaterialFlags::DIFFUSE_WITH_ALPHA,
                diffuse_map: "hair.png".into(),
                ..PhongMaterial::default()
            },
        ],
    )
    .unwrap()
}

/// Write a complete asset directory for `name`
pub fn write_asset_dir(dir: &Path, name: &str) {
    let skeleton = three_joint_skeleton();
    quad_model(name)
        .save(dir.join(format!("{name}.model")), MaterialLayout::Flagged)
        .unwrap();
    skeleton.save(dir.join(format!("{name}.skeleton"))).unwrap();
    spin_clip(&skeleton, 8)
        .save(dir.join("spin.animation"))
        .unwrap();
    root_slide_clip(&skeleton)
        .save(dir.join("slide.animation"))
        .unwrap();
    std::fs::write(dir.join("skin.png"), b"not really a png").unwrap();
}

pub fn pose_from(translations: &[Vec3]) -> SkeletonPose {
    translations
        .iter()
        .map(|&t| JointPose::from_translation(t))
        .collect::<Vec<_>>()
        .into()
}
