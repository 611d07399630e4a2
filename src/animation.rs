//! Skeletal animation: keyframed bone rotations and a per-robot mixer.
//!
//! Clips are built once and shared read-only by every robot through an
//! `Arc<ClipSet>`. The mixer keeps at most one active action per robot.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::entities::RobotAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bone {
    Spine,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

/// Rotation keyframes for a single bone.
#[derive(Clone, Debug)]
pub struct QuaternionTrack {
    pub bone: Bone,
    /// Keyframe times in seconds, ascending.
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
}

impl QuaternionTrack {
    pub fn new(bone: Bone, times: Vec<f32>, values: Vec<Quat>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { bone, times, values }
    }

    /// Slerp between the keyframes bracketing `t`, clamped at both ends.
    pub fn sample(&self, t: f32) -> Quat {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return Quat::IDENTITY;
        };
        if t <= first {
            return self.values[0];
        }
        if t >= last {
            return self.values[self.values.len() - 1];
        }
        // times[i] <= t < times[i + 1]
        let i = self.times.partition_point(|&k| k <= t) - 1;
        let span = self.times[i + 1] - self.times[i];
        let alpha = if span > 0.0 {
            (t - self.times[i]) / span
        } else {
            0.0
        };
        self.values[i].slerp(self.values[i + 1], alpha)
    }
}

#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: &'static str,
    /// Clip length in seconds. May exceed the last keyframe.
    pub duration: f32,
    pub tracks: Vec<QuaternionTrack>,
}

impl AnimationClip {
    pub fn sample(&self, bone: Bone, t: f32) -> Option<Quat> {
        self.tracks
            .iter()
            .find(|track| track.bone == bone)
            .map(|track| track.sample(t))
    }
}

/// The three clips every robot draws from.
#[derive(Clone, Debug)]
pub struct ClipSet {
    pub attack: AnimationClip,
    pub run: AnimationClip,
    pub die: AnimationClip,
}

fn rot_x(angle: f32) -> Quat {
    Quat::from_rotation_x(angle)
}

impl ClipSet {
    pub fn standard() -> Self {
        let attack = AnimationClip {
            name: "attack",
            duration: 1.0,
            tracks: vec![
                QuaternionTrack::new(
                    Bone::RightArm,
                    vec![0.0, 0.5, 1.0],
                    vec![Quat::IDENTITY, rot_x(-FRAC_PI_2), Quat::IDENTITY],
                ),
                QuaternionTrack::new(
                    Bone::LeftArm,
                    vec![0.0, 0.5, 1.0],
                    vec![rot_x(-FRAC_PI_2), Quat::IDENTITY, rot_x(-FRAC_PI_2)],
                ),
            ],
        };

        let stride = 0.6;
        let run = AnimationClip {
            name: "run",
            duration: 0.8,
            tracks: vec![
                QuaternionTrack::new(
                    Bone::LeftLeg,
                    vec![0.0, 0.4, 0.8],
                    vec![rot_x(stride), rot_x(-stride), rot_x(stride)],
                ),
                QuaternionTrack::new(
                    Bone::RightLeg,
                    vec![0.0, 0.4, 0.8],
                    vec![rot_x(-stride), rot_x(stride), rot_x(-stride)],
                ),
                QuaternionTrack::new(
                    Bone::LeftArm,
                    vec![0.0, 0.4, 0.8],
                    vec![rot_x(-stride), rot_x(stride), rot_x(-stride)],
                ),
                QuaternionTrack::new(
                    Bone::RightArm,
                    vec![0.0, 0.4, 0.8],
                    vec![rot_x(stride), rot_x(-stride), rot_x(stride)],
                ),
            ],
        };

        // Falls over sideways within the first second, then lies still.
        let die = AnimationClip {
            name: "die",
            duration: 4.0,
            tracks: vec![QuaternionTrack::new(
                Bone::Spine,
                vec![0.0, 1.0],
                vec![
                    Quat::IDENTITY,
                    Quat::from_axis_angle(Vec3::Z, -PI / 2.0),
                ],
            )],
        };

        Self { attack, run, die }
    }

    pub fn clip(&self, action: RobotAction) -> &AnimationClip {
        match action {
            RobotAction::Run => &self.run,
            RobotAction::Die => &self.die,
            RobotAction::Attack => &self.attack,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    Repeat,
    Once,
}

/// Playback state of one clip on one robot.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationAction {
    pub clip: RobotAction,
    pub time: f32,
    pub loop_mode: LoopMode,
    pub playing: bool,
}

impl AnimationAction {
    pub fn play(&mut self) {
        self.playing = true;
    }
}

/// Bone rotations of one robot at the current mixer time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    rotations: BTreeMap<Bone, Quat>,
}

impl Pose {
    pub fn rotation(&self, bone: Bone) -> Quat {
        self.rotations.get(&bone).copied().unwrap_or(Quat::IDENTITY)
    }
}

#[derive(Clone, Debug)]
pub struct AnimationMixer {
    clips: Arc<ClipSet>,
    actions: BTreeMap<u64, AnimationAction>,
}

impl AnimationMixer {
    pub fn new(clips: Arc<ClipSet>) -> Self {
        Self {
            clips,
            actions: BTreeMap::new(),
        }
    }

    /// Bind `clip` to `robot_id`, replacing any previous action. The new
    /// action starts at time zero, looping, and paused until `play`.
    pub fn clip_action(&mut self, clip: RobotAction, robot_id: u64) -> &mut AnimationAction {
        let action = AnimationAction {
            clip,
            time: 0.0,
            loop_mode: LoopMode::Repeat,
            playing: false,
        };
        match self.actions.entry(robot_id) {
            Entry::Occupied(mut slot) => {
                slot.insert(action);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(action),
        }
    }

    pub fn stop(&mut self, robot_id: u64) {
        self.actions.remove(&robot_id);
    }

    pub fn action(&self, robot_id: u64) -> Option<&AnimationAction> {
        self.actions.get(&robot_id)
    }

    pub fn active_count(&self) -> usize {
        self.actions.len()
    }

    /// Advance every playing action by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for action in self.actions.values_mut() {
            if !action.playing {
                continue;
            }
            let duration = self.clips.clip(action.clip).duration;
            let t = action.time + dt;
            match action.loop_mode {
                LoopMode::Repeat => {
                    action.time = if duration > 0.0 { t % duration } else { 0.0 };
                }
                LoopMode::Once => {
                    if t >= duration {
                        action.time = duration;
                        action.playing = false;
                    } else {
                        action.time = t;
                    }
                }
            }
        }
    }

    /// Sample the robot's active clip. Robots without an action are in
    /// their rest pose.
    pub fn pose(&self, robot_id: u64) -> Pose {
        let Some(action) = self.actions.get(&robot_id) else {
            return Pose::default();
        };
        let clip = self.clips.clip(action.clip);
        let rotations = clip
            .tracks
            .iter()
            .map(|track| (track.bone, track.sample(action.time)))
            .collect();
        Pose { rotations }
    }
}
