use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::model::{Color, Scene};

/// Which segments a `ChangeEffect` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSelector {
    All,
    Id(u32),
}

/// A validated control command awaiting application at a tick boundary.
///
/// Type/range validation happens before construction (in the OSC layer);
/// reference validation (does this scene/palette/effect exist?) happens when
/// the render loop applies the command, because only the loop owns the state.
#[derive(Debug, Clone)]
pub enum Command {
    /// Scenes already parsed and validated against the strip length.
    LoadScene(Vec<Scene>),
    ChangeScene(u32),
    ChangePalette { slot: String, palette_id: String },
    SetPaletteColor {
        palette_id: String,
        index: usize,
        color: Color,
    },
    ChangeEffect {
        segment: SegmentSelector,
        effect_id: u32,
    },
    /// Seconds; validated >= 0 before enqueue.
    SetDissolveTime(f64),
    /// Already clamped to 0-200.
    SetSpeedPercent(u16),
    /// Already clamped to 0-255.
    SetMasterBrightness(u8),
}

/// Fieldless mirror of [`Command`] used for per-kind coalescing under
/// backpressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    LoadScene,
    ChangeScene,
    ChangePalette,
    SetPaletteColor,
    ChangeEffect,
    SetDissolveTime,
    SetSpeedPercent,
    SetMasterBrightness,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::LoadScene(_) => CommandKind::LoadScene,
            Command::ChangeScene(_) => CommandKind::ChangeScene,
            Command::ChangePalette { .. } => CommandKind::ChangePalette,
            Command::SetPaletteColor { .. } => CommandKind::SetPaletteColor,
            Command::ChangeEffect { .. } => CommandKind::ChangeEffect,
            Command::SetDissolveTime(_) => CommandKind::SetDissolveTime,
            Command::SetSpeedPercent(_) => CommandKind::SetSpeedPercent,
            Command::SetMasterBrightness(_) => CommandKind::SetMasterBrightness,
        }
    }

    /// Whether applying this command changes what the strip shows, i.e.
    /// whether it should trigger a dissolve when one is configured.
    pub fn reconfigures(&self) -> bool {
        matches!(
            self,
            Command::LoadScene(_)
                | Command::ChangeScene(_)
                | Command::ChangePalette { .. }
                | Command::SetPaletteColor { .. }
                | Command::ChangeEffect { .. }
        )
    }
}

/// Outcome of a queue push, so the caller can log backpressure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queue was full; the oldest command of this kind was dropped to make
    /// room (only the newest of a kind needs to survive).
    CoalescedSameKind(CommandKind),
    /// Queue was full with no same-kind entry; the oldest command overall
    /// was dropped.
    DroppedOldest(CommandKind),
}

/// The single shared-mutable boundary between the inbound actor and the
/// render loop: bounded, never blocks the pusher, drained whole at tick
/// boundaries so the loop always sees full batches in arrival order.
pub struct CommandQueue {
    inner: Mutex<VecDeque<Command>>,
    capacity: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Push a command, coalescing under backpressure instead of blocking.
    pub fn push(&self, command: Command) -> PushOutcome {
        let mut queue = self.inner.lock();
        let mut outcome = PushOutcome::Queued;
        if queue.len() >= self.capacity {
            let kind = command.kind();
            if let Some(pos) = queue.iter().position(|c| c.kind() == kind) {
                queue.remove(pos);
                outcome = PushOutcome::CoalescedSameKind(kind);
            } else if let Some(oldest) = queue.pop_front() {
                outcome = PushOutcome::DroppedOldest(oldest.kind());
            }
        }
        queue.push_back(command);
        outcome
    }

    /// Pop the entire pending batch in arrival order.
    pub fn drain(&self) -> Vec<Command> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_arrival_order() {
        let queue = CommandQueue::new(8);
        queue.push(Command::SetSpeedPercent(50));
        queue.push(Command::SetMasterBrightness(10));
        queue.push(Command::ChangeScene(2));
        let batch = queue.drain();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].kind(), CommandKind::SetSpeedPercent);
        assert_eq!(batch[1].kind(), CommandKind::SetMasterBrightness);
        assert_eq!(batch[2].kind(), CommandKind::ChangeScene);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_coalesces_same_kind() {
        let queue = CommandQueue::new(3);
        queue.push(Command::SetSpeedPercent(10));
        queue.push(Command::ChangeScene(1));
        queue.push(Command::SetMasterBrightness(99));
        let outcome = queue.push(Command::SetSpeedPercent(90));
        assert_eq!(
            outcome,
            PushOutcome::CoalescedSameKind(CommandKind::SetSpeedPercent)
        );

        let batch = queue.drain();
        assert_eq!(batch.len(), 3);
        // The older SetSpeedPercent is gone; the newest survives at the back.
        match &batch[2] {
            Command::SetSpeedPercent(v) => assert_eq!(*v, 90),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn full_queue_without_same_kind_drops_oldest() {
        let queue = CommandQueue::new(2);
        queue.push(Command::ChangeScene(1));
        queue.push(Command::SetMasterBrightness(1));
        let outcome = queue.push(Command::SetSpeedPercent(70));
        assert_eq!(
            outcome,
            PushOutcome::DroppedOldest(CommandKind::ChangeScene)
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn flood_of_one_kind_never_exceeds_bound() {
        let queue = CommandQueue::new(4);
        for v in 0..100 {
            queue.push(Command::SetSpeedPercent(v));
        }
        assert!(queue.len() <= 4);
        let batch = queue.drain();
        match batch.last().unwrap() {
            Command::SetSpeedPercent(v) => assert_eq!(*v, 99),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reconfiguring_commands_flagged() {
        assert!(Command::ChangeScene(1).reconfigures());
        assert!(Command::ChangeEffect {
            segment: SegmentSelector::All,
            effect_id: 1
        }
        .reconfigures());
        assert!(!Command::SetSpeedPercent(100).reconfigures());
        assert!(!Command::SetDissolveTime(1.0).reconfigures());
        assert!(!Command::SetMasterBrightness(9).reconfigures());
    }
}
