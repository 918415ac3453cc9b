use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::Palette;

/// Closed set of effect waveforms. Adding a variant (plus its render
/// function) is the extension point; unknown kinds in a scene file fail
/// deserialization and surface as [`ValidationError::Malformed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Solid,
    Chase,
    Fade,
    Rainbow,
    Pulse,
    Strobe,
}

/// Per-kind numeric parameters. Every field has a default so scene files only
/// spell out what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Seconds per full waveform cycle.
    pub cycle_seconds: f64,
    /// Lit window length in LEDs (chase).
    pub width: u32,
    /// Palette index of the base color (solid, pulse, strobe).
    pub color_index: u32,
    /// Fraction of each cycle that is "on", 0.0-1.0 (strobe).
    pub duty_cycle: f64,
    /// Hue spread across the segment, in full rotations (rainbow).
    pub spread: f64,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            cycle_seconds: 2.0,
            width: 3,
            color_index: 0,
            duty_cycle: 0.5,
            spread: 1.0,
        }
    }
}

/// A deterministic time-to-color function applied to a segment. Pure: all
/// state is the owning segment's phase clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    pub id: u32,
    pub kind: EffectKind,
    /// Palette slot this effect reads from (resolved through the scene's
    /// bindings). Rainbow ignores it but still names one for uniformity.
    #[serde(default = "default_slot")]
    pub palette: String,
    #[serde(default)]
    pub params: EffectParams,
}

fn default_slot() -> String {
    "A".to_owned()
}

/// Contiguous range of LEDs within a scene, independently animated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: u32,
    pub start: u32,
    pub length: u32,
    pub effect: u32,
    /// Seconds of effect time consumed so far. Advanced each tick by
    /// `dt * speed_factor`; reset to zero when the effect assignment changes.
    #[serde(skip)]
    pub phase: f64,
}

impl Segment {
    pub fn range(&self) -> std::ops::Range<u32> {
        self.start..self.start + self.length
    }

    pub fn advance(&mut self, dt: f64) {
        self.phase += dt;
    }
}

/// A complete animation configuration: segments, the effects they run, and
/// the palettes those effects read. Immutable once active except through the
/// explicit palette/effect-change commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub segments: Vec<Segment>,
    pub effects: Vec<EffectDef>,
    pub palettes: Vec<Palette>,
    /// Default palette bindings: slot name → palette id.
    pub bindings: IndexMap<String, String>,
}

impl Scene {
    pub fn effect(&self, id: u32) -> Option<&EffectDef> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn palette(&self, id: &str) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.id == id)
    }

    pub fn palette_mut(&mut self, id: &str) -> Option<&mut Palette> {
        self.palettes.iter_mut().find(|p| p.id == id)
    }

    pub fn segment_mut(&mut self, id: u32) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    /// Resolve a palette slot through the bindings to the palette itself.
    pub fn palette_for_slot(&self, slot: &str) -> Option<&Palette> {
        let id = self.bindings.get(slot)?;
        self.palette(id)
    }

    /// Construction-time invariant checks. Runs once at load; the render
    /// loop relies on these holding and does not re-check per tick.
    pub fn validate(&self, strip_len: u32) -> Result<(), ValidationError> {
        for seg in &self.segments {
            if seg.length == 0 || seg.start.saturating_add(seg.length) > strip_len {
                return Err(ValidationError::BadRange {
                    segment: seg.id,
                    start: seg.start,
                    length: seg.length,
                    strip_len,
                });
            }
            if self.effect(seg.effect).is_none() {
                return Err(ValidationError::UnknownEffect {
                    segment: seg.id,
                    effect: seg.effect,
                });
            }
        }

        let mut spans: Vec<&Segment> = self.segments.iter().collect();
        spans.sort_by_key(|s| s.start);
        for pair in spans.windows(2) {
            if let [a, b] = pair {
                if a.range().end > b.range().start {
                    return Err(ValidationError::OverlappingSegments {
                        first: a.id,
                        second: b.id,
                    });
                }
            }
        }

        for palette in &self.palettes {
            if palette.is_empty() {
                return Err(ValidationError::EmptyPalette {
                    palette: palette.id.clone(),
                });
            }
        }

        for (slot, id) in &self.bindings {
            if self.palette(id).is_none() {
                return Err(ValidationError::UnknownPalette {
                    what: format!("binding {slot} -> {id}"),
                });
            }
        }

        for effect in &self.effects {
            if !self.bindings.contains_key(&effect.palette) {
                return Err(ValidationError::UnknownPalette {
                    what: format!("effect {} slot {}", effect.id, effect.palette),
                });
            }
            let p = &effect.params;
            if !(p.cycle_seconds.is_finite() && p.cycle_seconds > 0.0) {
                return Err(ValidationError::BadParameter {
                    effect: effect.id,
                    message: format!("cycle_seconds must be > 0, got {}", p.cycle_seconds),
                });
            }
            if !(0.0..=1.0).contains(&p.duty_cycle) {
                return Err(ValidationError::BadParameter {
                    effect: effect.id,
                    message: format!("duty_cycle must be in [0, 1], got {}", p.duty_cycle),
                });
            }
            if effect.kind == EffectKind::Chase && p.width == 0 {
                return Err(ValidationError::BadParameter {
                    effect: effect.id,
                    message: "width must be >= 1".to_owned(),
                });
            }
            if !p.spread.is_finite() {
                return Err(ValidationError::BadParameter {
                    effect: effect.id,
                    message: "spread must be finite".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// A `load_json` payload: either one scene object or `{"scenes": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SceneDocument {
    Bundle { scenes: Vec<Scene> },
    Single(Box<Scene>),
}

impl SceneDocument {
    pub fn into_scenes(self) -> Vec<Scene> {
        match self {
            SceneDocument::Bundle { scenes } => scenes,
            SceneDocument::Single(scene) => vec![*scene],
        }
    }
}

/// Parse and validate a scene payload. Every scene must pass [`Scene::validate`]
/// for the load to succeed; a bad scene fails the whole payload.
pub fn parse_scene_payload(json: &str, strip_len: u32) -> Result<Vec<Scene>, ValidationError> {
    let doc: SceneDocument =
        serde_json::from_str(json).map_err(|e| ValidationError::Malformed {
            message: e.to_string(),
        })?;
    let scenes = doc.into_scenes();
    if scenes.is_empty() {
        return Err(ValidationError::Malformed {
            message: "payload contains no scenes".to_owned(),
        });
    }
    for scene in &scenes {
        scene.validate(strip_len)?;
    }
    Ok(scenes)
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use crate::model::Color;

    /// Two segments (10 and 5 LEDs) on a 32-LED strip, three effects, two
    /// palettes. Used across engine tests.
    pub fn two_segment_scene() -> Scene {
        let mut bindings = IndexMap::new();
        bindings.insert("A".to_owned(), "warm".to_owned());
        bindings.insert("B".to_owned(), "cool".to_owned());
        Scene {
            id: 1,
            name: "fixture".to_owned(),
            segments: vec![
                Segment {
                    id: 1,
                    start: 0,
                    length: 10,
                    effect: 1,
                    phase: 0.0,
                },
                Segment {
                    id: 2,
                    start: 10,
                    length: 5,
                    effect: 2,
                    phase: 0.0,
                },
            ],
            effects: vec![
                EffectDef {
                    id: 1,
                    kind: EffectKind::Solid,
                    palette: "A".to_owned(),
                    params: EffectParams::default(),
                },
                EffectDef {
                    id: 2,
                    kind: EffectKind::Chase,
                    palette: "B".to_owned(),
                    params: EffectParams {
                        cycle_seconds: 1.0,
                        width: 2,
                        ..EffectParams::default()
                    },
                },
                EffectDef {
                    id: 3,
                    kind: EffectKind::Strobe,
                    palette: "A".to_owned(),
                    params: EffectParams {
                        cycle_seconds: 0.5,
                        ..EffectParams::default()
                    },
                },
            ],
            palettes: vec![
                Palette::new("warm", vec![Color::rgb(255, 80, 0), Color::rgb(255, 0, 40)]),
                Palette::new("cool", vec![Color::rgb(0, 80, 255), Color::rgb(0, 255, 200)]),
            ],
            bindings,
        }
    }
}
