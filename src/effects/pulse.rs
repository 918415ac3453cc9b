use std::f64::consts::TAU;

use crate::model::{Color, EffectParams, Palette};

/// One palette color under a raised-cosine brightness envelope: dark at the
/// cycle boundaries, full brightness at the midpoint.
pub fn render(elapsed: f64, dest: &mut [Color], palette: &Palette, params: &EffectParams) {
    let phase = (elapsed / params.cycle_seconds).rem_euclid(1.0);
    let intensity = 0.5 * (1.0 - (TAU * phase).cos());
    let color = palette.color_at(params.color_index as usize).scale(intensity);

    for pixel in dest.iter_mut() {
        *pixel = color;
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new("p", vec![Color::rgb(200, 100, 50)])
    }

    #[test]
    fn dark_at_cycle_start() {
        let mut dest = vec![Color::WHITE; 4];
        render(0.0, &mut dest, &palette(), &EffectParams::default());
        assert!(dest.iter().all(|c| *c == Color::BLACK));
    }

    #[test]
    fn full_brightness_at_midpoint() {
        let params = EffectParams {
            cycle_seconds: 2.0,
            ..EffectParams::default()
        };
        let mut dest = vec![Color::BLACK; 4];
        render(1.0, &mut dest, &palette(), &params);
        assert_eq!(dest[0], Color::rgb(200, 100, 50));
    }

    #[test]
    fn envelope_never_exceeds_base_color() {
        let params = EffectParams::default();
        let p = palette();
        for step in 0..40 {
            let mut dest = vec![Color::BLACK; 1];
            render(f64::from(step) * 0.1, &mut dest, &p, &params);
            assert!(dest[0].r <= 200 && dest[0].g <= 100 && dest[0].b <= 50);
        }
    }
}
