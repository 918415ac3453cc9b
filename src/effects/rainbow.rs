use crate::model::{Color, EffectParams, Palette};

/// Palette-free hue rotation: one full rotation per `cycle_seconds`, with
/// `spread` rotations of hue laid out across the segment.
pub fn render(elapsed: f64, dest: &mut [Color], _palette: &Palette, params: &EffectParams) {
    let len = dest.len();
    if len == 0 {
        return;
    }

    let time_offset = elapsed / params.cycle_seconds * 360.0;
    let spatial_scale = if len > 1 {
        params.spread / len as f64 * 360.0
    } else {
        0.0
    };

    for (i, pixel) in dest.iter_mut().enumerate() {
        let hue = (time_offset + i as f64 * spatial_scale).rem_euclid(360.0);
        *pixel = Color::from_hsv(hue, 1.0, 1.0);
    }
}
