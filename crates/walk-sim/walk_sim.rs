//! Headless walk over rolling terrain.
//!
//! Usage: `walk_sim [rig.json]`
//!
//! Drives a two-legged rig along a weaving path for a few seconds, logging
//! every foot landing. IK is switched off briefly halfway through to show the
//! legs freezing and picking up again. Set `RUST_LOG=debug` to see each step
//! start and chain initialization.

use glam::{Quat, Vec2, Vec3};
use stride::prelude::*;

const PELVIS_HEIGHT: f32 = 0.88;
const THIGH_OFFSET: f32 = 0.1;
const WALK_SPEED: f32 = 1.2;
const FRAME_DT: f32 = 1.0 / 60.0;
const SECONDS: f32 = 10.0;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading rig config from {}", path);
            RigConfig::from_json_str(&std::fs::read_to_string(&path)?)?
        }
        None => RigConfig::default(),
    };
    log::info!("Rig config:\n{}", config.to_json_string()?);

    let terrain = HeightfieldGround::from_fn(128, 128, 0.25, Vec2::new(-16.0, -16.0), |x, z| {
        0.12 * (x * 0.7).sin() * (z * 0.5).cos() + 0.05 * z
    })?;
    let ground_at = |p: Vec3| terrain.height_at(p.x, p.z).unwrap_or(0.0);

    let mut scene = TransformHierarchy::new();
    let pelvis = scene.add_node(
        "pelvis",
        None,
        Transform::from_position(Vec3::new(0.0, PELVIS_HEIGHT + ground_at(Vec3::ZERO), 0.0)),
    )?;
    let left = add_leg(&mut scene, pelvis, "l", -THIGH_OFFSET)?;
    let right = add_leg(&mut scene, pelvis, "r", THIGH_OFFSET)?;
    let targets = [(Foot::Left, left.target), (Foot::Right, right.target)];

    let mut rig = LegRig::from_config(&config, left, right, Some(pelvis), &scene)?;
    let mut scheduler = FrameScheduler::new(1.0 / 50.0, 5)?;

    let mut position = Vec3::ZERO;
    let mut landings = 0u32;
    let frames = (SECONDS / FRAME_DT) as u32;
    for frame in 0..frames {
        let t = frame as f32 * FRAME_DT;
        let heading = Quat::from_rotation_y(0.35 * (t * 0.8).sin());
        position += heading * Vec3::Z * WALK_SPEED * FRAME_DT;
        let pelvis_pose = Transform::new(
            Vec3::new(position.x, PELVIS_HEIGHT + ground_at(position), position.z),
            heading,
        );
        scene.set_world(pelvis, pelvis_pose)?;

        let pause = (4.0..4.5).contains(&t);
        if pause == rig.is_ik_enabled() {
            rig.set_ik_enabled(!pause);
        }

        scheduler.advance(FRAME_DT, &mut rig, &mut scene, &terrain);

        let events = rig.last_events();
        for (foot, target) in targets {
            if !events.landed(foot) {
                continue;
            }
            landings += 1;
            if let Some(at) = scene.world_position(target) {
                log::info!(
                    "t={:.2}s {:?} foot landed at ({:.2}, {:.2}, {:.2}), terrain {:.2}",
                    t,
                    foot,
                    at.x,
                    at.y,
                    at.z,
                    ground_at(at)
                );
            }
        }
    }

    for foot in [Foot::Left, Foot::Right] {
        let report = rig.limb(foot).last_report();
        log::info!(
            "{:?}: {} steps, last solve {:?}",
            foot,
            rig.gait().foot(foot).steps_taken(),
            report
        );
    }
    log::info!(
        "Walked {:.2}m in {:.1}s with {} landings",
        position.length(),
        SECONDS,
        landings
    );
    Ok(())
}

fn add_leg(
    scene: &mut TransformHierarchy,
    pelvis: NodeId,
    side: &str,
    x: f32,
) -> Result<LegNodes> {
    let thigh = scene.add_node(
        format!("thigh_{side}"),
        Some(pelvis),
        Transform::from_position(Vec3::new(x, 0.0, 0.0)),
    )?;
    let shin = scene.add_node(
        format!("shin_{side}"),
        Some(thigh),
        Transform::from_position(Vec3::new(0.0, -0.44, 0.05)),
    )?;
    let foot = scene.add_node(
        format!("foot_{side}"),
        Some(shin),
        Transform::from_position(Vec3::new(0.0, -0.44, -0.05)),
    )?;
    let knee_pole = scene.add_node(
        format!("knee_pole_{side}"),
        Some(pelvis),
        Transform::from_position(Vec3::new(x, -0.45, 1.0)),
    )?;
    let home = scene.add_node(
        format!("home_{side}"),
        Some(pelvis),
        Transform::from_position(Vec3::new(x, -PELVIS_HEIGHT, 0.0)),
    )?;
    let foot_world = scene
        .world(foot)
        .ok_or(StrideError::UnknownNode(foot))?;
    let target = scene.add_world_node(format!("target_{side}"), None, foot_world)?;

    Ok(LegNodes {
        joints: vec![thigh, shin, foot],
        target,
        home,
        pole: Some(knee_pole),
    })
}
