//! InputDevice trait and in-process implementations

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::InputConfig;
use tracing::debug;

use crate::error::Result;
use crate::mapping::InputSnapshot;

/// Joystick-like input device
///
/// Polled once per loop iteration from the main task.
pub trait InputDevice {
    /// Human readable device name
    fn name(&self) -> &str;

    /// Read the current state of every mapped axis and button
    fn poll(&mut self) -> Result<InputSnapshot>;

    /// Release the device; later polls may fail
    fn release(&mut self);
}

impl<D: InputDevice + ?Sized> InputDevice for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        (**self).poll()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Device that replays a fixed script of snapshots
///
/// Once the script is exhausted the last snapshot is held.
pub struct ScriptedInput {
    script: VecDeque<InputSnapshot>,
    current: InputSnapshot,
    polls: usize,
    releases: Arc<AtomicUsize>,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            script: script.into_iter().collect(),
            current: InputSnapshot::default(),
            polls: 0,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of `release` calls, readable after the device is moved away
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        self.releases.clone()
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl InputDevice for ScriptedInput {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        self.polls += 1;
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
        Ok(self.current.clone())
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Device that never moves
///
/// Used when the binary is built without a gamepad backend.
pub struct IdleInput {
    snapshot: InputSnapshot,
}

impl IdleInput {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            snapshot: InputSnapshot::neutral(config),
        }
    }
}

impl InputDevice for IdleInput {
    fn name(&self) -> &str {
        "idle"
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn release(&mut self) {
        debug!("idle input released");
    }
}
