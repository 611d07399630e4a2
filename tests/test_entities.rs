use glam::Vec3;

use robot_shooter::compute::init_state;
use robot_shooter::config::Config;
use robot_shooter::entities::*;

#[test]
fn entity_clone_and_eq() {
    assert_eq!(RobotAction::Run, RobotAction::Run);
    assert_ne!(RobotAction::Run, RobotAction::Die);
    assert_eq!(RoundStatus::Playing, RoundStatus::Playing);
    assert_ne!(RoundStatus::Playing, RoundStatus::TimeUp);

    let round = Round {
        score: 12.5,
        start_ms: 3,
    };
    assert_eq!(round.clone(), round);
}

#[test]
fn robot_is_dead_once_died_is_set() {
    let mut robot = Robot {
        id: 0,
        position: Vec3::ZERO,
        yaw: 0.0,
        scale: 1.0,
        next_action: RobotAction::Run,
        current_action: None,
        died: None,
        index: 0,
    };
    assert!(!robot.is_dead());
    robot.died = Some(0);
    assert!(robot.is_dead());
}

#[test]
fn new_game_has_no_rounds() {
    assert!(Game::default().rounds.is_empty());
}

#[test]
fn game_state_clone_is_independent() {
    let original = init_state(&Config::default(), 0);
    let mut cloned = original.clone();

    // Mutating the clone must not affect the original
    cloned.round.score = 999.0;
    cloned.robots.push(Robot {
        id: 5,
        position: Vec3::new(5.0, 0.0, 5.0),
        yaw: 0.0,
        scale: 0.005,
        next_action: RobotAction::Run,
        current_action: None,
        died: None,
        index: 0,
    });
    cloned.mixer.clip_action(RobotAction::Run, 5).play();

    assert_eq!(original.round.score, 0.0);
    assert!(original.robots.is_empty());
    assert_eq!(original.mixer.active_count(), 0);
}
