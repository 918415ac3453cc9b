pub mod color;
pub mod palette;
pub mod scene;

// Re-export commonly used types at the model level.
pub use color::Color;
pub use palette::Palette;
pub use scene::{
    parse_scene_payload, EffectDef, EffectKind, EffectParams, Scene, SceneDocument, Segment,
};
