//! Game-logic functions.
//!
//! The frame-level entry points (`init_state`, `tick`, `click`) take an
//! immutable `GameState` and return a brand-new one. The per-robot building
//! blocks they are made of mutate the pieces they are handed. Side effects
//! are limited to the injected RNG and the game clock passed in as `now_ms`.

use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::Rng;
use tracing::{debug, info};

use crate::animation::{AnimationMixer, ClipSet, LoopMode};
use crate::camera::{PerspectiveCamera, Raycaster};
use crate::config::Config;
use crate::entities::{
    AmbientLight, Game, GameState, GroundPlane, PointLight, Robot, RobotAction, Round,
    RoundStatus,
};

// ── Tuning ───────────────────────────────────────────────────────────────────

/// Where every robot is headed: just in front of the camera.
pub const TARGET: Vec3 = Vec3::new(-100.0, 0.0, 0.0);
pub const SPAWN_X: f32 = 95.0;
/// Spawn z is uniform in `-SPAWN_Z_HALF_RANGE..SPAWN_Z_HALF_RANGE`.
pub const SPAWN_Z_HALF_RANGE: f32 = 100.0;
pub const ROBOT_SCALE: f32 = 0.005;
/// World units walked per frame.
pub const ROBOT_STEP: f32 = 0.2;
pub const ATTACK_RANGE: f32 = 10.0;
/// Score lost per frame for each robot attacking.
pub const ATTACK_DRAIN: f64 = 0.05;
pub const KILL_SCORE: f64 = 10.0;
/// How long a corpse stays on the field.
pub const CORPSE_MS: u64 = 3500;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Set up the scene for a new round starting at `now_ms`.
pub fn init_state(config: &Config, now_ms: u64) -> GameState {
    info!(
        round_secs = config.round_secs,
        max_robots = config.max_robots,
        "round started"
    );
    GameState {
        round: Round {
            score: 0.0,
            start_ms: now_ms,
        },
        robots: Vec::new(),
        mixer: AnimationMixer::new(Arc::new(ClipSet::standard())),
        main_light: PointLight {
            position: Vec3::new(-150.0, 50.0, 0.0),
            intensity: 1.0,
        },
        ambient_light: AmbientLight { intensity: 0.25 },
        plane: GroundPlane {
            size: 200.0,
            repeat: 8,
        },
        status: RoundStatus::Playing,
        last_frame_ms: now_ms,
        next_robot_id: 0,
        max_robots: config.max_robots,
        round_ms: config.round_ms(),
        frame: 0,
    }
}

fn spawn_robot(state: &mut GameState, rng: &mut impl Rng) {
    let z = rng.gen_range(-SPAWN_Z_HALF_RANGE..SPAWN_Z_HALF_RANGE);
    let robot = Robot {
        id: state.next_robot_id,
        position: Vec3::new(SPAWN_X, 0.0, z),
        yaw: (SPAWN_X - TARGET.x).atan2(z) + PI,
        scale: ROBOT_SCALE,
        next_action: RobotAction::Run,
        current_action: None,
        died: None,
        index: state.robots.len(),
    };
    debug!(id = robot.id, z, "robot spawned");
    state.next_robot_id += 1;
    state.robots.push(robot);
}

// ── Per-robot state machine ─────────────────────────────────────────────────

/// Clear out corpses older than `CORPSE_MS`, then top the field back up to
/// `max_robots`.
pub fn update_robots(state: &mut GameState, rng: &mut impl Rng, now_ms: u64) {
    let mixer = &mut state.mixer;
    state.robots.retain(|robot| match robot.died {
        Some(died) if now_ms > died + CORPSE_MS => {
            mixer.stop(robot.id);
            debug!(id = robot.id, "corpse removed");
            false
        }
        _ => true,
    });

    while state.robots.len() < state.max_robots {
        spawn_robot(state, rng);
    }
}

/// Walk a living robot toward `TARGET`; once in range it attacks, costing
/// the round `ATTACK_DRAIN` per frame.
pub fn update_robot(robot: &mut Robot, round: &mut Round) {
    if robot.is_dead() {
        return;
    }
    let to_target = Vec2::new(TARGET.x - robot.position.x, TARGET.z - robot.position.z);
    let remaining = to_target.length();
    if remaining > ATTACK_RANGE {
        let step = to_target * ROBOT_STEP / remaining;
        robot.position = Vec3::new(robot.position.x + step.x, 0.0, robot.position.z + step.y);
    } else {
        if robot.next_action != RobotAction::Attack {
            debug!(id = robot.id, "robot reached the target");
        }
        robot.next_action = RobotAction::Attack;
        round.score -= ATTACK_DRAIN;
    }
}

/// Switch the robot's animation when its requested action changed. Dying
/// plays once; running and attacking loop.
pub fn manage_actions(robot: &mut Robot, mixer: &mut AnimationMixer) {
    if robot.current_action == Some(robot.next_action) {
        return;
    }
    mixer.stop(robot.id);
    let action = mixer.clip_action(robot.next_action, robot.id);
    if robot.next_action == RobotAction::Die {
        action.loop_mode = LoopMode::Once;
    }
    action.play();
    robot.current_action = Some(robot.next_action);
}

// ── Clock & scoring ─────────────────────────────────────────────────────────

/// Milliseconds left in the round; negative once it has run over.
pub fn time_left_ms(round: &Round, now_ms: u64, round_ms: u64) -> i64 {
    round_ms as i64 - now_ms.saturating_sub(round.start_ms) as i64
}

/// Round half up, so -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Best rounded score of the session, if any round was played.
pub fn high_score(game: &Game) -> Option<i64> {
    game.rounds
        .iter()
        .map(|round| round.score)
        .reduce(f64::max)
        .map(round_half_up)
}

// ── Input ────────────────────────────────────────────────────────────────────

/// Shoot at `ndc`. The nearest robot under the pointer dies if it was
/// still alive, scoring `KILL_SCORE`. Clicks after time-up are ignored.
pub fn click(state: &GameState, camera: &PerspectiveCamera, ndc: Vec2, now_ms: u64) -> GameState {
    let mut next = state.clone();
    if state.status == RoundStatus::TimeUp {
        return next;
    }

    let hits = Raycaster::set_from_camera(ndc, camera).intersect_robots(&state.robots, &state.mixer);
    let Some(hit) = hits.first() else {
        return next;
    };

    let robot = &mut next.robots[hit.robot_index];
    if !robot.is_dead() {
        robot.next_action = RobotAction::Die;
        robot.died = Some(now_ms);
        next.round.score += KILL_SCORE;
        info!(
            id = hit.robot_id,
            distance = hit.distance,
            score = next.round.score,
            "robot destroyed"
        );
    }
    next
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the round by one frame at game-clock time `now_ms`.
pub fn tick(state: &GameState, rng: &mut impl Rng, now_ms: u64) -> GameState {
    let mut next = state.clone();
    if next.status == RoundStatus::TimeUp {
        return next;
    }
    next.frame += 1;

    // ── 1. Despawn & spawn ───────────────────────────────────────────────────
    update_robots(&mut next, rng, now_ms);

    // ── 2. Move robots and sync their animations ─────────────────────────────
    for robot in next.robots.iter_mut() {
        update_robot(robot, &mut next.round);
        manage_actions(robot, &mut next.mixer);
    }

    // ── 3. Advance animations by wall time ───────────────────────────────────
    let dt = now_ms.saturating_sub(next.last_frame_ms) as f32 * 0.001;
    next.mixer.update(dt);
    next.last_frame_ms = now_ms;

    // ── 4. Clock ─────────────────────────────────────────────────────────────
    if time_left_ms(&next.round, now_ms, next.round_ms) <= 0 {
        next.status = RoundStatus::TimeUp;
        info!(
            score = round_half_up(next.round.score),
            frames = next.frame,
            "time up"
        );
    }

    next
}
