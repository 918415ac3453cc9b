use crate::model::Color;

/// An in-flight crossfade: a frozen snapshot of what the strip showed when
/// the configuration changed, blended toward the live render.
#[derive(Debug, Clone)]
struct Dissolve {
    outgoing: Vec<Color>,
    elapsed: f64,
    duration: f64,
}

/// Two-state machine: `Steady` (no dissolve) or `Dissolving`. Entered by any
/// configuration-changing command while a dissolve time is set; collapses
/// back to steady once `elapsed >= duration`.
#[derive(Debug, Default)]
pub struct DissolveManager {
    active: Option<Dissolve>,
}

impl DissolveManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dissolving(&self) -> bool {
        self.active.is_some()
    }

    /// Blend progress in [0, 1], or `None` when steady.
    pub fn progress(&self) -> Option<f64> {
        self.active
            .as_ref()
            .map(|d| (d.elapsed / d.duration).clamp(0.0, 1.0))
    }

    /// Begin (or re-target) a dissolve from `outgoing`. When a dissolve is
    /// already running the caller passes the current blended frame, so the
    /// visible output is continuous; the clock restarts against the new
    /// target. A non-positive duration is ignored — changes apply instantly.
    pub fn begin(&mut self, outgoing: Vec<Color>, duration: f64) {
        if duration <= 0.0 || outgoing.is_empty() {
            self.active = None;
            return;
        }
        self.active = Some(Dissolve {
            outgoing,
            elapsed: 0.0,
            duration,
        });
    }

    /// Advance the dissolve clock by `dt` and blend the live render in
    /// place: `out*(1-alpha) + in*alpha` per channel, outgoing frozen.
    /// Collapses to steady when the clock runs out.
    pub fn blend(&mut self, dt: f64, frame: &mut [Color]) {
        let Some(dissolve) = self.active.as_mut() else {
            return;
        };
        dissolve.elapsed += dt;
        let alpha = (dissolve.elapsed / dissolve.duration).clamp(0.0, 1.0);

        for (pixel, out) in frame.iter_mut().zip(&dissolve.outgoing) {
            *pixel = out.lerp(*pixel, alpha);
        }

        if dissolve.elapsed >= dissolve.duration {
            self.active = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn steady_blend_is_identity() {
        let mut manager = DissolveManager::new();
        let mut frame = vec![Color::rgb(10, 20, 30); 4];
        manager.blend(0.1, &mut frame);
        assert!(frame.iter().all(|c| *c == Color::rgb(10, 20, 30)));
        assert!(!manager.is_dissolving());
    }

    #[test]
    fn zero_duration_never_enters_dissolving() {
        let mut manager = DissolveManager::new();
        manager.begin(vec![Color::WHITE; 4], 0.0);
        assert!(!manager.is_dissolving());
        assert_eq!(manager.progress(), None);
    }

    #[test]
    fn blended_channels_stay_between_endpoints() {
        let mut manager = DissolveManager::new();
        let outgoing = Color::rgb(200, 10, 0);
        let incoming = Color::rgb(20, 240, 128);
        manager.begin(vec![outgoing; 8], 1.0);

        for _ in 0..25 {
            let mut frame = vec![incoming; 8];
            manager.blend(0.05, &mut frame);
            for c in &frame {
                assert!(c.r >= 20 && c.r <= 200);
                assert!(c.g >= 10 && c.g <= 240);
                assert!(c.b <= 128);
            }
        }
    }

    #[test]
    fn completes_once_elapsed_reaches_duration() {
        let mut manager = DissolveManager::new();
        manager.begin(vec![Color::BLACK; 2], 1.0);

        let mut frame = vec![Color::WHITE; 2];
        manager.blend(0.5, &mut frame);
        assert!(manager.is_dissolving());
        assert_eq!(frame[0], Color::rgb(128, 128, 128));

        let mut frame = vec![Color::WHITE; 2];
        manager.blend(0.5, &mut frame);
        assert!(!manager.is_dissolving());
        assert_eq!(frame[0], Color::WHITE);
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut manager = DissolveManager::new();
        manager.begin(vec![Color::BLACK; 1], 2.0);
        let mut frame = vec![Color::WHITE; 1];
        manager.blend(0.5, &mut frame);
        let p = manager.progress().unwrap();
        assert!((p - 0.25).abs() < 1e-9);
    }

    #[test]
    fn retarget_restarts_clock_from_new_snapshot() {
        let mut manager = DissolveManager::new();
        manager.begin(vec![Color::BLACK; 1], 1.0);
        let mut frame = vec![Color::WHITE; 1];
        manager.blend(0.9, &mut frame);

        // Re-target using the current blended frame as the new outgoing.
        manager.begin(frame.clone(), 1.0);
        let p = manager.progress().unwrap();
        assert!((p - 0.0).abs() < 1e-9);

        // First tick after the re-target starts from the blended snapshot,
        // not from black.
        let mut next = vec![Color::WHITE; 1];
        manager.blend(0.01, &mut next);
        assert!(next[0].r >= frame[0].r);
    }
}
