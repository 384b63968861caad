//! Controller vibration, posted as fire-and-forget work.
//!
//! The caller never waits for a pulse. It posts a one-shot task to the host's
//! queue and carries on with the current tick; the host runs the task later
//! against whatever haptic device it owns.
use std::{collections::VecDeque, fmt};

/// Which controller.
pub type HandId = usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HapticPulse {
    pub duration_secs: f32,
    pub frequency: f32,
    pub amplitude: f32,
}

impl HapticPulse {
    /// Short buzz played when a hand starts hovering over a part.
    pub const HOVER: HapticPulse = HapticPulse {
        duration_secs: 0.15,
        frequency: 5.0,
        amplitude: 1.0,
    };
}

pub trait HapticSink {
    fn trigger_pulse(&mut self, hand: HandId, pulse: HapticPulse);
}

pub type Task<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Somewhere to post work that runs later, exactly once.
pub trait TaskQueue<C: ?Sized> {
    fn post(&mut self, task: Task<C>);
}

/// Queue of one-shot tasks run by the host when it sees fit.
pub struct DeferredTasks<C: ?Sized> {
    pending: VecDeque<Task<C>>,
}

impl<C: ?Sized> Default for DeferredTasks<C> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for DeferredTasks<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTasks")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<C: ?Sized> DeferredTasks<C> {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run everything posted so far and return how many tasks ran. Tasks
    /// posted while running wait for the next call.
    pub fn run_pending(&mut self, ctx: &mut C) -> usize {
        let tasks = std::mem::take(&mut self.pending);
        let count = tasks.len();
        for task in tasks {
            task(ctx);
        }
        count
    }
}

impl<C: ?Sized> TaskQueue<C> for DeferredTasks<C> {
    fn post(&mut self, task: Task<C>) {
        self.pending.push_back(task);
    }
}

/// Schedule a pulse on `hand` without blocking.
pub fn vibrate_controller<Q>(tasks: &mut Q, hand: HandId, pulse: HapticPulse)
where
    Q: TaskQueue<dyn HapticSink> + ?Sized,
{
    let task: Task<dyn HapticSink> = Box::new(move |sink: &mut (dyn HapticSink + 'static)| {
        sink.trigger_pulse(hand, pulse)
    });
    tasks.post(task);
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(HandId, HapticPulse)>);

    impl HapticSink for Recorder {
        fn trigger_pulse(&mut self, hand: HandId, pulse: HapticPulse) {
            self.0.push((hand, pulse));
        }
    }

    #[test]
    fn pulse_is_deferred_and_runs_once() {
        let mut tasks = DeferredTasks::<dyn HapticSink>::default();
        let mut recorder = Recorder::default();
        vibrate_controller(&mut tasks, 1, HapticPulse::HOVER);
        assert!(recorder.0.is_empty());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks.run_pending(&mut recorder), 1);
        assert_eq!(tasks.run_pending(&mut recorder), 0);
        assert_eq!(recorder.0, vec![(1, HapticPulse::HOVER)]);
    }
}
