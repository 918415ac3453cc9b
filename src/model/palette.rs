use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::Color;

/// An ordered, mutable set of colors referenced by effects through palette
/// slots. Colors are editable by index; the length is fixed after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub id: String,
    pub colors: Vec<Color>,
}

impl Palette {
    pub fn new<T: Into<String>>(id: T, colors: Vec<Color>) -> Self {
        Self {
            id: id.into(),
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color at `index`, wrapping. Effects use this so any index is valid
    /// during evaluation; only edits are bounds-checked.
    pub fn color_at(&self, index: usize) -> Color {
        if self.colors.is_empty() {
            return Color::BLACK;
        }
        self.colors
            .get(index % self.colors.len())
            .copied()
            .unwrap_or(Color::BLACK)
    }

    /// Replace the color at `index`. An out-of-range index is rejected, not
    /// auto-extended, and the palette is left unchanged.
    pub fn set_color(&mut self, index: usize, color: Color) -> Result<(), EngineError> {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                Ok(())
            }
            None => Err(EngineError::invalid(format!(
                "palette {} has {} colors, index {index} out of range",
                self.id,
                self.colors.len()
            ))),
        }
    }
}
