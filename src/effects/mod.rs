pub mod chase;
pub mod fade;
pub mod pulse;
pub mod rainbow;
pub mod solid;
pub mod strobe;

use crate::model::{Color, EffectKind, EffectParams, Palette};

/// Evaluate one effect over a whole segment.
///
/// Pure in `(elapsed, dest.len(), palette, params)`: the same inputs always
/// produce the same pixels. All animation state lives in the caller's phase
/// clock, which is what makes the dissolve manager able to re-evaluate any
/// configuration at any time.
///
/// Dispatch is a closed match over [`EffectKind`] — one render function per
/// kind, extended by adding a variant and a module.
pub fn render(
    kind: EffectKind,
    elapsed: f64,
    dest: &mut [Color],
    palette: &Palette,
    params: &EffectParams,
) {
    match kind {
        EffectKind::Solid => solid::render(elapsed, dest, palette, params),
        EffectKind::Chase => chase::render(elapsed, dest, palette, params),
        EffectKind::Fade => fade::render(elapsed, dest, palette, params),
        EffectKind::Rainbow => rainbow::render(elapsed, dest, palette, params),
        EffectKind::Pulse => pulse::render(elapsed, dest, palette, params),
        EffectKind::Strobe => strobe::render(elapsed, dest, palette, params),
    }
}
