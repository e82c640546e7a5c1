//! # Application lifecycle state machine.
//!
//! ```text
//!                 bring-up ok            initialize ok
//! Uninitialized ───────────► Initializing ───────────► Running
//!       │                        │                        │
//!       │ bring-up failed        │ initialize/run fault   │ fault
//!       ▼                        ▼                        ▼
//!    Faulted ◄───────────────────┴────────────────────────┘
//!       │                                                 │ shutdown request
//!       ▼                                                 ▼
//!  ShuttingDown ◄─────────────────────────────────────────┘
//!       │
//!       ▼
//!  Terminated
//! ```
//!
//! Only the supervisor's control flow drives a [`Lifecycle`]; observers read
//! a [`LifecycleView`] (current state plus every state entered) through a
//! [`tokio::sync::watch`] receiver. Every edge moves forward in declaration
//! order, so a state behind the current one can no longer be entered.

use std::fmt;

use tokio::sync::watch;

use crate::error::StateError;
use crate::events::{Bus, Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Running,
    Faulted,
    ShuttingDown,
    Terminated,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Running => "running",
            LifecycleState::Faulted => "faulted",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
        }
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Initializing)
                | (Uninitialized, Faulted)
                | (Initializing, Running)
                | (Initializing, Faulted)
                | (Running, Faulted)
                | (Running, ShuttingDown)
                | (Faulted, ShuttingDown)
                | (ShuttingDown, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Terminated
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a lifecycle watcher sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleView {
    current: LifecycleState,
    visited: u8,
}

impl LifecycleView {
    fn start() -> Self {
        Self {
            current: LifecycleState::Uninitialized,
            visited: LifecycleState::Uninitialized.bit(),
        }
    }

    pub fn current(&self) -> LifecycleState {
        self.current
    }

    /// Whether `state` has been entered at some point.
    pub fn visited(&self, state: LifecycleState) -> bool {
        self.visited & state.bit() != 0
    }

    /// Whether `state` was entered or can no longer be.
    pub fn settled(&self, state: LifecycleState) -> bool {
        self.visited(state) || self.current > state
    }
}

/// Owned state machine with its transition history.
pub struct Lifecycle {
    tx: watch::Sender<LifecycleView>,
    history: Vec<LifecycleState>,
    bus: Bus,
}

impl Lifecycle {
    pub fn new(bus: Bus) -> Self {
        let (tx, _) = watch::channel(LifecycleView::start());
        Self {
            tx,
            history: vec![LifecycleState::Uninitialized],
            bus,
        }
    }

    pub fn current(&self) -> LifecycleState {
        self.tx.borrow().current
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    pub fn visited(&self, state: LifecycleState) -> bool {
        self.history.contains(&state)
    }

    pub fn watch(&self) -> watch::Receiver<LifecycleView> {
        self.tx.subscribe()
    }

    /// Moves to `to` and publishes [`EventKind::StateChanged`].
    pub fn transition(&mut self, to: LifecycleState) -> Result<(), StateError> {
        let from = self.current();
        if !from.can_transition_to(to) {
            return Err(StateError::InvalidTransition { from, to });
        }
        self.tx.send_modify(|view| {
            view.current = to;
            view.visited |= to.bit();
        });
        self.history.push(to);
        self.bus
            .publish(Event::new(EventKind::StateChanged).with_transition(from, to));
        Ok(())
    }
}
