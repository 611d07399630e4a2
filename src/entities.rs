//! All game entity types: pure data, no logic.

use glam::Vec3;

use crate::animation::AnimationMixer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobotAction {
    Run,
    Attack,
    Die,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    Playing,
    TimeUp,
}

// ── Round & session ───────────────────────────────────────────────────────────

/// One timed round. The score is fractional because attacking robots
/// drain it a little every frame; it is rounded only for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    pub score: f64,
    /// Milliseconds on the game clock when the round started.
    pub start_ms: u64,
}

/// Every round played this session, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Game {
    pub rounds: Vec<Round>,
}

// ── Robots ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Robot {
    /// Stable handle for the animation mixer; never reused within a round.
    pub id: u64,
    pub position: Vec3,
    /// Rotation about the Y axis, radians.
    pub yaw: f32,
    /// Uniform scale applied to the model-space dimensions.
    pub scale: f32,
    pub next_action: RobotAction,
    pub current_action: Option<RobotAction>,
    /// Game-clock time of death, if shot.
    pub died: Option<u64>,
    /// Robot count at the moment this one was spawned.
    pub index: usize,
}

impl Robot {
    pub fn is_dead(&self) -> bool {
        self.died.is_some()
    }
}

// ── Scene furniture ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub intensity: f32,
}

/// Square textured ground centred on the origin, lying in the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlane {
    pub size: f32,
    /// Texture tiles per side.
    pub repeat: u32,
}

// ── Master game state ─────────────────────────────────────────────────────────

/// Everything one round needs. Cloneable so update functions can return a
/// new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub round: Round,
    pub robots: Vec<Robot>,
    pub mixer: AnimationMixer,
    pub main_light: PointLight,
    pub ambient_light: AmbientLight,
    pub plane: GroundPlane,
    pub status: RoundStatus,
    /// Game-clock time of the previous frame, for the mixer delta.
    pub last_frame_ms: u64,
    pub next_robot_id: u64,
    pub max_robots: usize,
    pub round_ms: u64,
    pub frame: u64,
}
