pub mod command;
pub mod status;
pub mod transition;

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::effects;
use crate::error::EngineError;
use crate::model::{Color, Scene};

pub use command::{Command, CommandKind, CommandQueue, PushOutcome, SegmentSelector};
pub use status::{EngineStatus, TransitionStatus};
pub use transition::DissolveManager;

/// Engine tuning knobs, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub strip_len: u32,
    pub target_fps: f64,
    pub master_brightness: u8,
    pub dissolve_seconds: f64,
    pub speed_percent: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strip_len: 225,
            target_fps: 60.0,
            master_brightness: 255,
            dissolve_seconds: 1.0,
            speed_percent: 100,
        }
    }
}

/// The sole mutable root of the animation state. Owned exclusively by the
/// render loop; everything else sees it through the status snapshot.
#[derive(Debug)]
pub struct EngineState {
    pub scenes: IndexMap<u32, Scene>,
    pub active_scene: Option<u32>,
    pub master_brightness: u8,
    pub speed_percent: u16,
    pub dissolve_seconds: f64,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            scenes: IndexMap::new(),
            active_scene: None,
            master_brightness: config.master_brightness,
            speed_percent: config.speed_percent.min(200),
            dissolve_seconds: config.dissolve_seconds.max(0.0),
        }
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active_scene.and_then(|id| self.scenes.get(&id))
    }

    fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active_scene.and_then(|id| self.scenes.get_mut(&id))
    }
}

/// Pack a frame into the wire format: 4 bytes per LED (`r, g, b, 0`).
pub fn frame_bytes(frame: &[Color]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * 4);
    for c in frame {
        bytes.extend_from_slice(&[c.r, c.g, c.b, 0]);
    }
    bytes
}

/// The animation engine: applies queued commands at tick boundaries, advances
/// segment phase clocks, evaluates effects into frames, crossfades through
/// configuration changes, and hands finished frames to the output boundary.
pub struct Engine {
    config: EngineConfig,
    state: EngineState,
    dissolve: DissolveManager,
    queue: Arc<CommandQueue>,
    status: Arc<Mutex<EngineStatus>>,
    frame_tx: Option<mpsc::Sender<Vec<u8>>>,
    /// Last blended (pre-brightness) frame; the dissolve snapshot source.
    last_frame: Vec<Color>,
    frame_count: u64,
    frames_dropped: u64,
    fps_window_start: Option<Instant>,
    fps_window_frames: u32,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        queue: Arc<CommandQueue>,
        frame_tx: Option<mpsc::Sender<Vec<u8>>>,
    ) -> Self {
        let status = Arc::new(Mutex::new(EngineStatus::new(
            config.target_fps,
            config.strip_len as usize,
        )));
        let state = EngineState::new(&config);
        let strip_len = config.strip_len as usize;
        Self {
            config,
            state,
            dissolve: DissolveManager::new(),
            queue,
            status,
            frame_tx,
            last_frame: vec![Color::BLACK; strip_len],
            frame_count: 0,
            frames_dropped: 0,
            fps_window_start: None,
            fps_window_frames: 0,
        }
    }

    /// Shared handle for the status surface.
    pub fn status_handle(&self) -> Arc<Mutex<EngineStatus>> {
        Arc::clone(&self.status)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Run one tick: apply the pending command batch, advance phase clocks,
    /// render, blend, scale. Returns the finished (post-brightness) frame.
    ///
    /// Pure of wall-clock time — the caller supplies `dt` — so the whole
    /// pipeline is testable without a scheduler.
    pub fn tick(&mut self, dt: f64) -> Vec<Color> {
        self.apply_pending();

        // Phase clocks advance in effect time, scaled by playback speed.
        let effect_dt = dt * f64::from(self.state.speed_percent) / 100.0;
        for scene in self.state.scenes.values_mut() {
            for segment in &mut scene.segments {
                segment.advance(effect_dt);
            }
        }

        let mut frame = self.render_raw();
        self.dissolve.blend(dt, &mut frame);
        self.last_frame.clone_from(&frame);
        self.frame_count += 1;

        if self.state.master_brightness < 255 {
            let factor = f64::from(self.state.master_brightness) / 255.0;
            for pixel in &mut frame {
                *pixel = pixel.scale(factor);
            }
        }

        self.refresh_status(&frame);
        frame
    }

    /// Drain the queue and apply the whole batch in arrival order, before
    /// anything renders this tick. Reference failures reject the one command
    /// and leave state untouched.
    ///
    /// The dissolve starts only after a command actually applied: a rejected
    /// command changes nothing and must not crossfade the animation against
    /// its own snapshot. `apply` never touches `last_frame`, so the snapshot
    /// taken after a successful apply is the frame the strip showed before
    /// the change.
    fn apply_pending(&mut self) {
        let batch = self.queue.drain();
        let mut snapshotted = false;
        for command in batch {
            let wants_dissolve = self.state.dissolve_seconds > 0.0
                && self.frame_count > 0
                && self.changes_visible_output(&command);
            let kind = command.kind();
            match self.apply(command) {
                Ok(()) => {
                    if wants_dissolve && !snapshotted {
                        // The snapshot is the current blended frame, so an
                        // in-flight dissolve re-targets without a visual jump.
                        self.dissolve
                            .begin(self.last_frame.clone(), self.state.dissolve_seconds);
                        snapshotted = true;
                    }
                }
                Err(e) => {
                    warn!(command = ?kind, error = %e, "command rejected");
                }
            }
        }
    }

    /// Whether a successful apply of this command changes what the strip
    /// shows. `LoadScene` counts only when it replaces the scene currently
    /// on the strip; loading or replacing inactive scenes is invisible.
    fn changes_visible_output(&self, command: &Command) -> bool {
        match command {
            Command::LoadScene(scenes) => self
                .state
                .active_scene
                .is_some_and(|active| scenes.iter().any(|s| s.id == active)),
            other => other.reconfigures(),
        }
    }

    fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::LoadScene(scenes) => {
                for scene in scenes {
                    let id = scene.id;
                    info!(scene = id, name = %scene.name, "scene loaded");
                    self.state.scenes.insert(id, scene);
                    if self.state.active_scene.is_none() {
                        self.state.active_scene = Some(id);
                    }
                }
                Ok(())
            }
            Command::ChangeScene(id) => {
                if !self.state.scenes.contains_key(&id) {
                    return Err(EngineError::invalid(format!("scene {id} is not loaded")));
                }
                self.state.active_scene = Some(id);
                info!(scene = id, "scene changed");
                Ok(())
            }
            Command::ChangePalette { slot, palette_id } => {
                let scene = self
                    .state
                    .active_scene_mut()
                    .ok_or_else(|| EngineError::invalid("no active scene"))?;
                if scene.palette(&palette_id).is_none() {
                    return Err(EngineError::invalid(format!(
                        "palette {palette_id} is not loaded"
                    )));
                }
                info!(slot = %slot, palette = %palette_id, "palette binding changed");
                scene.bindings.insert(slot, palette_id);
                Ok(())
            }
            Command::SetPaletteColor {
                palette_id,
                index,
                color,
            } => {
                let scene = self
                    .state
                    .active_scene_mut()
                    .ok_or_else(|| EngineError::invalid("no active scene"))?;
                let palette = scene.palette_mut(&palette_id).ok_or_else(|| {
                    EngineError::invalid(format!("palette {palette_id} is not loaded"))
                })?;
                palette.set_color(index, color)
            }
            Command::ChangeEffect { segment, effect_id } => {
                let scene = self
                    .state
                    .active_scene_mut()
                    .ok_or_else(|| EngineError::invalid("no active scene"))?;
                if scene.effect(effect_id).is_none() {
                    return Err(EngineError::invalid(format!(
                        "effect {effect_id} is not defined in the active scene"
                    )));
                }
                match segment {
                    SegmentSelector::All => {
                        for seg in &mut scene.segments {
                            seg.effect = effect_id;
                            seg.phase = 0.0;
                        }
                    }
                    SegmentSelector::Id(id) => {
                        let seg = scene.segment_mut(id).ok_or_else(|| {
                            EngineError::invalid(format!("segment {id} does not exist"))
                        })?;
                        seg.effect = effect_id;
                        seg.phase = 0.0;
                    }
                }
                info!(effect = effect_id, segment = ?segment, "effect changed");
                Ok(())
            }
            Command::SetDissolveTime(seconds) => {
                self.state.dissolve_seconds = seconds;
                Ok(())
            }
            Command::SetSpeedPercent(percent) => {
                self.state.speed_percent = percent;
                Ok(())
            }
            Command::SetMasterBrightness(level) => {
                self.state.master_brightness = level;
                Ok(())
            }
        }
    }

    /// Evaluate the active scene's segments into a raw frame. Unclaimed LEDs
    /// stay black; segment non-overlap was validated at load so segments
    /// write disjoint ranges.
    fn render_raw(&self) -> Vec<Color> {
        let mut frame = vec![Color::BLACK; self.config.strip_len as usize];
        let Some(scene) = self.state.active_scene() else {
            return frame;
        };

        for segment in &scene.segments {
            let Some(effect) = scene.effect(segment.effect) else {
                continue;
            };
            let Some(palette) = scene.palette_for_slot(&effect.palette) else {
                continue;
            };
            let start = segment.start as usize;
            let end = start + segment.length as usize;
            if let Some(dest) = frame.get_mut(start..end) {
                effects::render(effect.kind, segment.phase, dest, palette, &effect.params);
            }
        }
        frame
    }

    fn refresh_status(&mut self, frame: &[Color]) {
        let mut status = self.status.lock();
        status.active_scene = self.state.active_scene;
        status.loaded_scenes = self.state.scenes.keys().copied().collect();
        status.palette_bindings = self
            .state
            .active_scene()
            .map(|s| s.bindings.clone())
            .unwrap_or_default();
        status.master_brightness = self.state.master_brightness;
        status.speed_percent = self.state.speed_percent;
        status.dissolve_seconds = self.state.dissolve_seconds;
        status.transition = match self.dissolve.progress() {
            Some(alpha) => TransitionStatus::Dissolving { alpha },
            None => TransitionStatus::Steady,
        };
        status.frame_count = self.frame_count;
        status.frames_dropped = self.frames_dropped;
        status.active_leds = frame.iter().filter(|c| c.is_lit()).count();
    }

    /// Fixed-rate driver. Wall-clock-anchored: each target is the previous
    /// target plus the period, so a slow tick shortens the following waits
    /// (down to zero, never negative) instead of letting drift accumulate.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs_f64(1.0 / self.config.target_fps);
        info!(
            fps = self.config.target_fps,
            leds = self.config.strip_len,
            "render loop started"
        );

        let mut next = Instant::now() + period;
        let mut last_tick = Instant::now();
        self.fps_window_start = Some(last_tick);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    match changed {
                        // A dropped sender can never signal again; stop
                        // rather than spin on the dead channel.
                        Err(_) => break,
                        Ok(()) if *shutdown.borrow() => break,
                        // Spurious notification; wait out the tick.
                        Ok(()) => continue,
                    }
                }
                () = tokio::time::sleep_until(next.into()) => {}
            }

            let tick_start = Instant::now();
            let jitter = tick_start.saturating_duration_since(next);
            let dt = tick_start.duration_since(last_tick).as_secs_f64();
            last_tick = tick_start;

            let frame = self.tick(dt);

            if let Some(tx) = &self.frame_tx {
                match tx.try_send(frame_bytes(&frame)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Slow downstream receiver must not stall the loop.
                        self.frames_dropped += 1;
                        debug!(dropped = self.frames_dropped, "outbound queue full, frame dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("output channel closed");
                    }
                }
            }

            let elapsed = tick_start.elapsed();
            if elapsed > period {
                warn!(
                    tick_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = period.as_secs_f64() * 1000.0,
                    "tick overran its budget"
                );
            }
            self.status.lock().last_jitter_ms = jitter.as_secs_f64() * 1000.0;

            self.fps_window_frames += 1;
            if self.fps_window_frames >= 60 {
                if let Some(start) = self.fps_window_start {
                    let window = start.elapsed().as_secs_f64();
                    if window > 0.0 {
                        self.status.lock().actual_fps =
                            f64::from(self.fps_window_frames) / window;
                    }
                }
                self.fps_window_start = Some(Instant::now());
                self.fps_window_frames = 0;
            }

            next += period;
        }

        info!("render loop stopped");
    }
}
