use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Network endpoints for the OSC control and output surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscSettings {
    /// Address the control receiver binds to.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// UDP destinations every rendered frame is sent to.
    #[serde(default = "default_destinations")]
    pub destinations: Vec<String>,
}

impl Default for OscSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            destinations: default_destinations(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:9000".to_owned()
}

fn default_destinations() -> Vec<String> {
    vec!["127.0.0.1:7000".to_owned()]
}

/// Render-loop and strip configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSettings {
    #[serde(default = "default_fps")]
    pub target_fps: f64,
    #[serde(default = "default_led_count")]
    pub led_count: u32,
    #[serde(default = "default_brightness")]
    pub master_brightness: u8,
    /// Crossfade duration applied to configuration changes, in seconds.
    #[serde(default = "default_dissolve")]
    pub dissolve_seconds: f64,
    #[serde(default = "default_speed")]
    pub speed_percent: u16,
    /// Pending-command bound; floods coalesce past this.
    #[serde(default = "default_queue_capacity")]
    pub command_queue_capacity: usize,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            target_fps: default_fps(),
            led_count: default_led_count(),
            master_brightness: default_brightness(),
            dissolve_seconds: default_dissolve(),
            speed_percent: default_speed(),
            command_queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_fps() -> f64 {
    60.0
}

fn default_led_count() -> u32 {
    225
}

fn default_brightness() -> u8 {
    255
}

fn default_dissolve() -> f64 {
    1.0
}

fn default_speed() -> u16 {
    100
}

fn default_queue_capacity() -> usize {
    64
}

/// Top-level configuration, loadable from a JSON file. Every field has a
/// default so a partial (or absent) file still yields a working engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub osc: OscSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.animation.target_fps.is_finite() || self.animation.target_fps <= 0.0 {
            return Err(EngineError::invalid(format!(
                "target_fps must be positive, got {}",
                self.animation.target_fps
            )));
        }
        if self.animation.led_count == 0 {
            return Err(EngineError::invalid("led_count must be at least 1"));
        }
        if self.animation.dissolve_seconds < 0.0 {
            return Err(EngineError::invalid("dissolve_seconds must not be negative"));
        }
        Ok(())
    }
}
