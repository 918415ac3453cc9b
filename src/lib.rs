//! OSC-driven LED animation engine: scenes of non-overlapping segments, each
//! running a palette-based effect, rendered at a fixed rate and published as
//! OSC blobs. Control arrives over OSC and is applied atomically at tick
//! boundaries, crossfaded through a configurable dissolve.

pub mod effects;
pub mod engine;
pub mod error;
pub mod model;
pub mod osc;
pub mod settings;

pub use engine::{Command, CommandQueue, Engine, EngineConfig, EngineStatus};
pub use error::{EngineError, ValidationError};
pub use model::{Color, Palette, Scene};
pub use settings::Settings;
