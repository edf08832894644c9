//! Configuration, CLI handling and tracker profiles

pub mod cli;
pub mod profile;
pub mod settings;

pub use cli::{Cli, CollisionPolicy};
pub use profile::{ProfileStore, TrackerProfile};
pub use settings::Settings;
