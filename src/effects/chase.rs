use crate::model::{Color, EffectParams, Palette};

/// A lit window of `width` LEDs whose head travels the full segment once per
/// `cycle_seconds`, wrapping at the end. Window pixels cycle through the
/// palette (head gets color 0); everything else is black.
pub fn render(elapsed: f64, dest: &mut [Color], palette: &Palette, params: &EffectParams) {
    let len = dest.len();
    if len == 0 {
        return;
    }

    let pos = (elapsed / params.cycle_seconds).rem_euclid(1.0);
    let head = ((pos * len as f64) as usize).min(len - 1);
    let width = (params.width as usize).max(1).min(len);

    for pixel in dest.iter_mut() {
        *pixel = Color::BLACK;
    }
    // Window trails behind the head, wrapping around the segment start.
    for k in 0..width {
        let idx = (head + len - k) % len;
        if let Some(pixel) = dest.get_mut(idx) {
            *pixel = palette.color_at(k);
        }
    }
}
