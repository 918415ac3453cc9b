use crate::model::{Color, EffectParams, Palette};

/// Flashes between a palette color and black: "on" for the first
/// `duty_cycle` fraction of every cycle.
pub fn render(elapsed: f64, dest: &mut [Color], palette: &Palette, params: &EffectParams) {
    let phase = (elapsed / params.cycle_seconds).rem_euclid(1.0);
    let color = if phase < params.duty_cycle {
        palette.color_at(params.color_index as usize)
    } else {
        Color::BLACK
    };

    for pixel in dest.iter_mut() {
        *pixel = color;
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new("p", vec![Color::rgb(255, 255, 0)])
    }

    #[test]
    fn on_phase_shows_color() {
        let params = EffectParams {
            cycle_seconds: 1.0,
            duty_cycle: 0.5,
            ..EffectParams::default()
        };
        let mut dest = vec![Color::BLACK; 3];
        render(0.25, &mut dest, &palette(), &params);
        assert!(dest.iter().all(|c| *c == Color::rgb(255, 255, 0)));
    }

    #[test]
    fn off_phase_is_black() {
        let params = EffectParams {
            cycle_seconds: 1.0,
            duty_cycle: 0.5,
            ..EffectParams::default()
        };
        let mut dest = vec![Color::WHITE; 3];
        render(0.75, &mut dest, &palette(), &params);
        assert!(dest.iter().all(|c| *c == Color::BLACK));
    }

    #[test]
    fn zero_duty_never_lights() {
        let params = EffectParams {
            duty_cycle: 0.0,
            ..EffectParams::default()
        };
        for step in 0..20 {
            let mut dest = vec![Color::WHITE; 1];
            render(f64::from(step) * 0.13, &mut dest, &palette(), &params);
            assert_eq!(dest[0], Color::BLACK);
        }
    }
}
