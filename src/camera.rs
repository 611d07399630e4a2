//! Perspective camera, picking rays and robot hit volumes.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::animation::{AnimationMixer, Bone, Pose};
use crate::entities::Robot;

/// Robot model height before scaling, in model units.
pub const ROBOT_MODEL_HEIGHT: f32 = 1600.0;
/// Half the robot's body width before scaling, in model units.
pub const ROBOT_MODEL_HALF_WIDTH: f32 = 400.0;

pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(-100.0, 3.0, 0.0),
            target: Vec3::new(100.0, 0.0, 0.0),
            fov_y: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 4000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to normalized device coordinates. `None` when the point
    /// is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let world: Vec4 = self.view_projection().inverse() * ndc.extend(1.0);
        world.truncate() / world.w
    }
}

/// Map a terminal cell to NDC, using the cell centre.
pub fn pointer_to_ndc(col: u16, row: u16, width: u16, height: u16) -> Vec2 {
    let w = f32::from(width.max(1));
    let h = f32::from(height.max(1));
    let x = (f32::from(col) + 0.5) / w * 2.0 - 1.0;
    let y = -((f32::from(row) + 0.5) / h) * 2.0 + 1.0;
    Vec2::new(x, y)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the y = 0 plane, if it is hit in front.
    pub fn intersect_ground(&self) -> Option<f32> {
        if self.direction.y.abs() < f32::EPSILON {
            return None;
        }
        let t = -self.origin.y / self.direction.y;
        (t >= 0.0).then_some(t)
    }

    /// Slab test. Returns the entry distance, or zero when the origin is
    /// already inside the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (aabb.min - self.origin) * inv;
        let t2 = (aabb.max - self.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_far < 0.0 || t_near > t_far {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Feet and head of a robot in world space, following its spine pose.
pub fn robot_axis(robot: &Robot, pose: &Pose) -> (Vec3, Vec3) {
    let height = ROBOT_MODEL_HEIGHT * robot.scale;
    let up = Quat::from_rotation_y(robot.yaw) * pose.rotation(Bone::Spine) * Vec3::Y;
    (robot.position, robot.position + up * height)
}

pub fn robot_bounds(robot: &Robot, pose: &Pose) -> Aabb {
    let half_width = ROBOT_MODEL_HALF_WIDTH * robot.scale;
    let (feet, head) = robot_axis(robot, pose);
    let mut min = feet.min(head) - Vec3::splat(half_width);
    let max = feet.max(head) + Vec3::splat(half_width);
    min.y = min.y.max(0.0);
    Aabb { min, max }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Position of the robot in the slice passed to `intersect_robots`.
    pub robot_index: usize,
    pub robot_id: u64,
    pub distance: f32,
}

pub struct Raycaster {
    pub ray: Ray,
}

impl Raycaster {
    pub fn set_from_camera(ndc: Vec2, camera: &PerspectiveCamera) -> Self {
        let through = camera.unproject(ndc.extend(0.5));
        let direction = (through - camera.position).normalize_or_zero();
        Self {
            ray: Ray {
                origin: camera.position,
                direction,
            },
        }
    }

    /// All robots under the ray, nearest first. Dead robots are included so
    /// a corpse still blocks the robot behind it.
    pub fn intersect_robots(&self, robots: &[Robot], mixer: &AnimationMixer) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = robots
            .iter()
            .enumerate()
            .filter_map(|(robot_index, robot)| {
                let bounds = robot_bounds(robot, &mixer.pose(robot.id));
                self.ray.intersect_aabb(&bounds).map(|distance| Intersection {
                    robot_index,
                    robot_id: robot.id,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
