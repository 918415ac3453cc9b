use indexmap::IndexMap;
use serde::Serialize;

/// Transition state as reported on the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TransitionStatus {
    Steady,
    Dissolving { alpha: f64 },
}

/// Read-only snapshot of the engine for the monitor/administrative layer.
/// Refreshed by the render loop every tick; never mutated externally.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub active_scene: Option<u32>,
    pub loaded_scenes: Vec<u32>,
    /// Active scene's palette bindings (slot → palette id).
    pub palette_bindings: IndexMap<String, String>,
    pub master_brightness: u8,
    pub speed_percent: u16,
    pub dissolve_seconds: f64,
    pub transition: TransitionStatus,
    pub target_fps: f64,
    /// Observed rate over the last measurement window.
    pub actual_fps: f64,
    /// How far the most recent tick started after its scheduled time.
    pub last_jitter_ms: f64,
    pub frame_count: u64,
    pub frames_dropped: u64,
    pub active_leds: usize,
    pub total_leds: usize,
}

impl EngineStatus {
    pub fn new(target_fps: f64, total_leds: usize) -> Self {
        Self {
            active_scene: None,
            loaded_scenes: Vec::new(),
            palette_bindings: IndexMap::new(),
            master_brightness: 255,
            speed_percent: 100,
            dissolve_seconds: 0.0,
            transition: TransitionStatus::Steady,
            target_fps,
            actual_fps: 0.0,
            last_jitter_ms: 0.0,
            frame_count: 0,
            frames_dropped: 0,
            active_leds: 0,
            total_leds,
        }
    }
}
