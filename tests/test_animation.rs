use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::Arc;

use glam::{Quat, Vec3};

use robot_shooter::animation::*;
use robot_shooter::entities::RobotAction;

fn mixer() -> AnimationMixer {
    AnimationMixer::new(Arc::new(ClipSet::standard()))
}

fn close(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < 1e-4
}

// ── QuaternionTrack ───────────────────────────────────────────────────────────

#[test]
fn die_track_falls_over_in_one_second() {
    let clips = ClipSet::standard();
    let die = &clips.die;
    assert_eq!(die.name, "die");
    assert_eq!(die.duration, 4.0);

    let start = die.sample(Bone::Spine, 0.0).expect("die has a spine track");
    assert!(start.abs_diff_eq(Quat::IDENTITY, 1e-6));

    let fallen = Quat::from_axis_angle(Vec3::Z, -FRAC_PI_2);
    for t in [1.0, 2.0, 3.9] {
        let q = die.sample(Bone::Spine, t).expect("die has a spine track");
        assert!(q.abs_diff_eq(fallen, 1e-6));
    }
}

#[test]
fn track_slerps_between_keyframes() {
    let clips = ClipSet::standard();
    let half = clips.die.sample(Bone::Spine, 0.5).expect("die has a spine track");
    let expected = Quat::from_axis_angle(Vec3::Z, -FRAC_PI_4);
    assert!(half.abs_diff_eq(expected, 1e-5));
}

#[test]
fn clip_without_track_for_bone_samples_none() {
    let clips = ClipSet::standard();
    assert!(clips.run.sample(Bone::Spine, 0.2).is_none());
    assert!(clips.run.sample(Bone::LeftLeg, 0.2).is_some());
}

#[test]
fn empty_track_is_identity() {
    let track = QuaternionTrack::new(Bone::Spine, Vec::new(), Vec::new());
    assert_eq!(track.sample(1.0), Quat::IDENTITY);
}

#[test]
fn clip_lookup_by_action() {
    let clips = ClipSet::standard();
    assert_eq!(clips.clip(RobotAction::Run).name, "run");
    assert_eq!(clips.clip(RobotAction::Attack).name, "attack");
    assert_eq!(clips.clip(RobotAction::Die).name, "die");
}

// ── AnimationMixer ────────────────────────────────────────────────────────────

#[test]
fn new_action_waits_for_play() {
    let mut m = mixer();
    m.clip_action(RobotAction::Run, 1);
    m.update(0.5);
    let action = m.action(1).expect("action exists");
    assert!(!action.playing);
    assert_eq!(action.time, 0.0);
}

#[test]
fn repeat_wraps_around_clip_end() {
    let mut m = mixer();
    m.clip_action(RobotAction::Run, 1).play();
    m.update(1.0);
    let action = m.action(1).expect("action exists");
    assert!((action.time - 0.2).abs() < 1e-5);
    assert!(action.playing);
}

#[test]
fn once_clamps_at_end_and_stops() {
    let mut m = mixer();
    let action = m.clip_action(RobotAction::Die, 1);
    action.loop_mode = LoopMode::Once;
    action.play();
    m.update(5.0);
    let action = m.action(1).expect("action exists");
    assert_eq!(action.time, 4.0);
    assert!(!action.playing);

    // Lying on its side: the spine's up axis now points along +X.
    let up = m.pose(1).rotation(Bone::Spine) * Vec3::Y;
    assert!(close(up, Vec3::X));
}

#[test]
fn clip_action_replaces_previous_action() {
    let mut m = mixer();
    m.clip_action(RobotAction::Run, 1).play();
    m.update(0.3);
    m.clip_action(RobotAction::Attack, 1).play();
    let action = m.action(1).expect("action exists");
    assert_eq!(action.clip, RobotAction::Attack);
    assert_eq!(action.time, 0.0);
    assert_eq!(m.active_count(), 1);
}

#[test]
fn stop_returns_robot_to_rest_pose() {
    let mut m = mixer();
    m.clip_action(RobotAction::Attack, 3).play();
    m.update(0.5);
    let arm = m.pose(3).rotation(Bone::RightArm) * Vec3::Y;
    assert!(arm.y < 0.1);

    m.stop(3);
    assert!(m.action(3).is_none());
    assert_eq!(m.pose(3), Pose::default());
    assert_eq!(m.pose(3).rotation(Bone::RightArm), Quat::IDENTITY);
}

#[test]
fn actions_are_independent_per_robot() {
    let mut m = mixer();
    m.clip_action(RobotAction::Run, 1).play();
    m.update(0.2);
    m.clip_action(RobotAction::Run, 2).play();
    m.update(0.1);
    let a = m.action(1).expect("robot 1");
    let b = m.action(2).expect("robot 2");
    assert!((a.time - 0.3).abs() < 1e-5);
    assert!((b.time - 0.1).abs() < 1e-5);
}
