use crate::model::{Color, EffectParams, Palette};

/// Fills the whole segment with one palette color.
pub fn render(_elapsed: f64, dest: &mut [Color], palette: &Palette, params: &EffectParams) {
    let color = palette.color_at(params.color_index as usize);
    for pixel in dest.iter_mut() {
        *pixel = color;
    }
}
