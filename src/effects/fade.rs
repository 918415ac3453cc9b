use std::f64::consts::PI;

use crate::model::{Color, EffectParams, Palette};

/// Cross-blends the whole segment through the palette: the phase walks one
/// palette entry per `cycle_seconds`, easing between neighbors on a raised
/// cosine so color changes have no visible corner.
pub fn render(elapsed: f64, dest: &mut [Color], palette: &Palette, params: &EffectParams) {
    let pos = (elapsed / params.cycle_seconds).max(0.0);
    let index = pos.floor() as usize;
    let t = 0.5 * (1.0 - (PI * pos.fract()).cos());

    let from = palette.color_at(index);
    let to = palette.color_at(index + 1);
    let color = from.lerp(to, t);

    for pixel in dest.iter_mut() {
        *pixel = color;
    }
}
