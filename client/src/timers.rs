//! Delayed map follow-ups that must not outlive the map.

use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

use crate::engine::PathStyle;

/// Work scheduled after a camera flight or a popup action.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUp {
    OpenPlacePopup { place_id: String },
    RevertTerritoryPulse { territory_id: String, style: PathStyle },
    ClosePopups,
}

/// A started one-shot timer. Dropping the handle cancels it.
pub trait TimerHandle: Sized {
    fn start(delay_ms: u32, callback: impl FnOnce() + 'static) -> Self;
}

impl TimerHandle for Timeout {
    fn start(delay_ms: u32, callback: impl FnOnce() + 'static) -> Self {
        Timeout::new(delay_ms, callback)
    }
}

/// Owns every pending timeout. Dropping the scope or calling `cancel_all`
/// cancels whatever has not fired yet.
pub struct TimerScope<H = Timeout> {
    pending: Vec<(Rc<Cell<bool>>, H)>,
}

impl<H> Default for TimerScope<H> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<H: TimerHandle> TimerScope<H> {
    pub fn schedule(&mut self, delay_ms: u32, callback: impl FnOnce() + 'static) {
        self.pending.retain(|(fired, _)| !fired.get());

        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = H::start(delay_ms, move || {
            flag.set(true);
            callback();
        });
        self.pending.push((fired, handle));
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }
}
