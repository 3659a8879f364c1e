//! Banger Player Library
//!
//! Headless client wiring the catalog, the playlist store and a playback
//! session with console presentation surfaces.
//!
//! This library exposes the application components for testing purposes.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod presenter;

// Re-export commonly used types for convenience
pub use app::{App, QueueSource};
pub use config::PlayerConfig;
pub use engine::SimulatedEngine;
pub use error::{PlayerError, Result};
pub use player::{Input, PlayOptions, Player};
