//! Robot shooter: a terminal-rendered 3D wave shooter.
//!
//! Game logic lives in [`compute`] as functions over a cloneable
//! [`entities::GameState`]; [`raster`] turns that state into a character
//! frame that the binary writes to the terminal.

pub mod animation;
pub mod camera;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod raster;

pub use config::Config;
pub use error::GameError;
