//! Scene rasterisation into a grid of terminal cells.
//!
//! The ground is ray-cast per cell; robots are drawn afterwards, farthest
//! first, as thick projected segments. Nothing here touches the terminal.

use crossterm::style::Color;
use glam::{Vec2, Vec3};

use crate::animation::{Bone, Pose};
use crate::camera::{
    pointer_to_ndc, robot_axis, PerspectiveCamera, Raycaster, ROBOT_MODEL_HALF_WIDTH,
};
use crate::entities::{GameState, Robot, RobotAction};

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 0.5;

const C_SKY: Color = Color::Black;
const C_TILE_LIT: [Color; 2] = [Color::Grey, Color::Green];
const C_TILE_DIM: [Color; 2] = [Color::DarkGrey, Color::DarkGreen];
const C_SHADOW: Color = Color::Black;
const C_ROBOT_RUN: Color = Color::Cyan;
const C_ROBOT_ATTACK: Color = Color::Red;
const C_ROBOT_DEAD: Color = Color::DarkGrey;

/// Lit fraction above which a ground tile uses its bright colour.
const LIT_THRESHOLD: f32 = 0.55;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: C_SKY,
    };
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; usize::from(width) * usize::from(height)],
        }
    }

    fn offset(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= i32::from(self.width) || row >= i32::from(self.height) {
            return None;
        }
        Some(row as usize * usize::from(self.width) + col as usize)
    }

    pub fn get(&self, col: u16, row: u16) -> Option<&Cell> {
        self.offset(i32::from(col), i32::from(row))
            .map(|i| &self.cells[i])
    }

    /// Out-of-bounds writes are dropped.
    pub fn set(&mut self, col: i32, row: i32, cell: Cell) {
        if let Some(i) = self.offset(col, row) {
            self.cells[i] = cell;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(usize::from(self.width.max(1)))
    }
}

/// Camera matching a terminal of `width` x `height` cells.
pub fn camera_for_terminal(width: u16, height: u16) -> PerspectiveCamera {
    let aspect = f32::from(width.max(1)) * CELL_ASPECT / f32::from(height.max(1));
    PerspectiveCamera::with_aspect(aspect)
}

fn ndc_to_screen(ndc: Vec3, width: u16, height: u16) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * f32::from(width),
        (1.0 - ndc.y) * 0.5 * f32::from(height),
    )
}

/// Ground-plane segment covered by a robot's shadow, cast away from the
/// main light.
struct Shadow {
    from: Vec2,
    to: Vec2,
    half_width: f32,
}

impl Shadow {
    fn cast(robot: &Robot, pose: &Pose, light: Vec3) -> Option<Self> {
        let (feet, head) = robot_axis(robot, pose);
        let drop = head - light;
        if drop.y >= 0.0 {
            return None;
        }
        let tip = light + drop * (light.y / -drop.y);
        Some(Self {
            from: Vec2::new(feet.x, feet.z),
            to: Vec2::new(tip.x, tip.z),
            half_width: ROBOT_MODEL_HALF_WIDTH * robot.scale,
        })
    }

    fn covers(&self, p: Vec2) -> bool {
        let seg = self.to - self.from;
        let len2 = seg.length_squared();
        let t = if len2 > 0.0 {
            ((p - self.from).dot(seg) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (self.from + seg * t).distance(p) <= self.half_width
    }
}

fn draw_ground(frame: &mut Frame, state: &GameState, camera: &PerspectiveCamera) {
    let half = state.plane.size * 0.5;
    let tile = state.plane.size / state.plane.repeat.max(1) as f32;
    let light = state.main_light;

    let shadows: Vec<Shadow> = state
        .robots
        .iter()
        .filter_map(|robot| Shadow::cast(robot, &state.mixer.pose(robot.id), light.position))
        .collect();

    for row in 0..frame.height {
        for col in 0..frame.width {
            let ndc = pointer_to_ndc(col, row, frame.width, frame.height);
            let ray = Raycaster::set_from_camera(ndc, camera).ray;
            let Some(t) = ray.intersect_ground() else {
                continue;
            };
            let hit = ray.at(t);
            if hit.x.abs() > half || hit.z.abs() > half {
                continue;
            }

            let parity = (((hit.x + half) / tile).floor() + ((hit.z + half) / tile).floor()) as i64;
            let tile_index = parity.rem_euclid(2) as usize;

            let to_light = (light.position - hit).normalize_or_zero();
            let lit = state.ambient_light.intensity + light.intensity * to_light.y.max(0.0);
            let p = Vec2::new(hit.x, hit.z);
            let bg = if shadows.iter().any(|s| s.covers(p)) {
                C_SHADOW
            } else if lit >= LIT_THRESHOLD {
                C_TILE_LIT[tile_index]
            } else {
                C_TILE_DIM[tile_index]
            };

            frame.set(i32::from(col), i32::from(row), Cell { ch: ' ', fg: bg, bg });
        }
    }
}

fn robot_color(robot: &Robot) -> Color {
    match robot.current_action {
        Some(RobotAction::Die) => C_ROBOT_DEAD,
        Some(RobotAction::Attack) => C_ROBOT_ATTACK,
        Some(RobotAction::Run) | None => C_ROBOT_RUN,
    }
}

/// Glyph for the part of the body at `along` (0 = feet, 1 = head).
fn body_glyph(along: f32, pose: &Pose, dead: bool) -> char {
    if dead {
        return '▓';
    }
    if along > 0.85 {
        '█'
    } else if along > 0.6 {
        let arm = pose.rotation(Bone::RightArm) * Vec3::Y;
        if arm.y < 0.5 {
            '╪'
        } else {
            '█'
        }
    } else if along > 0.35 {
        '▌'
    } else {
        let leg = pose.rotation(Bone::LeftLeg) * Vec3::Y;
        if leg.z > 0.0 {
            '╱'
        } else {
            '╲'
        }
    }
}

fn draw_robot(frame: &mut Frame, robot: &Robot, pose: &Pose, camera: &PerspectiveCamera) {
    let (feet, head) = robot_axis(robot, pose);
    let (Some(feet_ndc), Some(head_ndc)) = (camera.project(feet), camera.project(head)) else {
        return;
    };

    let right = (camera.target - camera.position).cross(Vec3::Y).normalize_or_zero();
    let half_width = ROBOT_MODEL_HALF_WIDTH * robot.scale;
    let Some(edge_ndc) = camera.project(feet + right * half_width) else {
        return;
    };

    let a = ndc_to_screen(feet_ndc, frame.width, frame.height);
    let b = ndc_to_screen(head_ndc, frame.width, frame.height);
    let edge = ndc_to_screen(edge_ndc, frame.width, frame.height);
    let half_cols = (edge.x - a.x).abs().round() as i32;

    let fg = robot_color(robot);
    let dead = robot.is_dead();
    let steps = ((b - a).abs().max_element() * 2.0).ceil().max(1.0) as i32;
    for i in 0..=steps {
        let along = i as f32 / steps as f32;
        let p = a.lerp(b, along);
        let glyph = body_glyph(along, pose, dead);
        let (col, row) = (p.x.floor() as i32, p.y.floor() as i32);
        for dc in -half_cols..=half_cols {
            frame.set(
                col + dc,
                row,
                Cell {
                    ch: glyph,
                    fg,
                    bg: C_SKY,
                },
            );
        }
    }
}

/// Rasterise the whole scene as seen from `camera`.
pub fn render_scene(state: &GameState, camera: &PerspectiveCamera, width: u16, height: u16) -> Frame {
    let mut frame = Frame::new(width, height);
    draw_ground(&mut frame, state, camera);

    let mut order: Vec<&Robot> = state.robots.iter().collect();
    order.sort_by(|a, b| {
        let da = a.position.distance_squared(camera.position);
        let db = b.position.distance_squared(camera.position);
        db.total_cmp(&da)
    });
    for robot in order {
        draw_robot(&mut frame, robot, &state.mixer.pose(robot.id), camera);
    }
    frame
}
