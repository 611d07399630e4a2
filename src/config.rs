use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line configuration for a play session.
#[derive(Parser, Debug, Clone)]
#[command(name = "robot_shooter", about = "Shoot the robots before the clock runs out")]
pub struct Config {
    /// Round length in seconds
    #[arg(long, default_value_t = 60)]
    pub round_secs: u64,

    /// Number of robots kept on the field
    #[arg(long, default_value_t = 10)]
    pub max_robots: usize,

    /// Target frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// RNG seed for a reproducible spawn sequence
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write logs to this file (the terminal is taken by the game)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("round length must be at least one second")]
    ZeroRoundLength,
    #[error("at least one robot is required")]
    NoRobots,
    #[error("fps must be between 1 and {max}, got {got}")]
    FpsOutOfRange { got: u32, max: u32 },
}

const MAX_FPS: u32 = 240;

impl Default for Config {
    fn default() -> Self {
        Self {
            round_secs: 60,
            max_robots: 10,
            fps: 60,
            seed: None,
            log_file: None,
            verbose: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_secs == 0 {
            return Err(ConfigError::ZeroRoundLength);
        }
        if self.max_robots == 0 {
            return Err(ConfigError::NoRobots);
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::FpsOutOfRange {
                got: self.fps,
                max: MAX_FPS,
            });
        }
        Ok(())
    }

    pub fn round_ms(&self) -> u64 {
        self.round_secs * 1000
    }

    /// Wall-clock budget of one frame.
    pub fn frame(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }
}
