use std::cell::Cell;
use std::rc::Rc;

/// Affordance state of the generate/insert triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NoCode,
    CodeReady,
    Busy,
}

impl Phase {
    pub fn generate_enabled(self) -> bool {
        self != Phase::Busy
    }

    pub fn insert_enabled(self) -> bool {
        self == Phase::CodeReady
    }
}

/// Shared view of the trigger state; clones observe the same cell.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    phase: Rc<Cell<Phase>>,
}

impl Controls {
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn generate_enabled(&self) -> bool {
        self.phase().generate_enabled()
    }

    pub fn insert_enabled(&self) -> bool {
        self.phase().insert_enabled()
    }

    pub(crate) fn set(&self, phase: Phase) {
        self.phase.set(phase);
    }

    /// Disables both triggers until the returned guard is finished or dropped.
    pub fn enter_busy(&self) -> BusyGuard {
        let restore = self.phase.replace(Phase::Busy);
        BusyGuard {
            controls: self.clone(),
            restore: Some(restore),
        }
    }
}

/// Scoped busy state. Dropping it without [`BusyGuard::finish`] restores the
/// phase held before the operation started.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the busy state"]
pub struct BusyGuard {
    controls: Controls,
    restore: Option<Phase>,
}

impl BusyGuard {
    /// Ends the busy state in `next`.
    pub fn finish(mut self, next: Phase) {
        self.restore = None;
        self.controls.set(next);
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.restore.take() {
            self.controls.set(previous);
        }
    }
}
