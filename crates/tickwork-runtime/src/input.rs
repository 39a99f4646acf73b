//! Operator input as lock-free samplers.
//!
//! Buttons and axes are shared atomics: an input thread (the REPL, a
//! gamepad reader) writes them whenever it likes and the tick loop samples
//! them through the closures returned by [`Button::sampler`] and
//! [`Axis::above`].  Neither side ever blocks the other.
//!
//! # Example
//!
//! ```
//! use tickwork_runtime::input::ButtonBoard;
//!
//! let board = ButtonBoard::new();
//! let a = board.button("a");
//! let mut sample = a.sampler();
//!
//! assert!(!sample());
//! board.button("a").press();
//! assert!(sample());
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// How far an analog trigger must be pulled to count as pressed.
pub const TRIGGER_THRESHOLD: f32 = 0.5;

/// Name of the operator's right analog trigger on the board.
pub const RIGHT_TRIGGER: &str = "right-trigger";

// ─────────────────────────────────────────────────────────────────────────────
// Button
// ─────────────────────────────────────────────────────────────────────────────

/// A digital input.  Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Button(Arc<AtomicBool>);

impl Button {
    pub fn press(&self) {
        self.set(true);
    }

    pub fn release(&self) {
        self.set(false);
    }

    pub fn set(&self, pressed: bool) {
        self.0.store(pressed, Ordering::SeqCst);
    }

    pub fn is_pressed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn sampler(&self) -> impl FnMut() -> bool + Send + use<> {
        let state = Arc::clone(&self.0);
        move || state.load(Ordering::SeqCst)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Axis
// ─────────────────────────────────────────────────────────────────────────────

/// An analog input in `-1.0..=1.0`, stored as `f32` bits.  Clones share
/// state.
#[derive(Debug, Clone, Default)]
pub struct Axis(Arc<AtomicU32>);

impl Axis {
    pub fn set(&self, value: f32) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::SeqCst))
    }

    /// Sampler that is true while the axis is strictly above `threshold`.
    pub fn above(&self, threshold: f32) -> impl FnMut() -> bool + Send + use<> {
        let state = Arc::clone(&self.0);
        move || f32::from_bits(state.load(Ordering::SeqCst)) > threshold
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ButtonBoard
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Inputs {
    buttons: BTreeMap<String, Button>,
    axes: BTreeMap<String, Axis>,
}

/// Named inputs of one operator station.  Clones share the same inputs.
///
/// The map itself is only locked when an input is looked up by name, never
/// by a sampler.
#[derive(Debug, Clone, Default)]
pub struct ButtonBoard {
    inputs: Arc<Mutex<Inputs>>,
}

impl ButtonBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The button called `name`, created released on first use.
    pub fn button(&self, name: &str) -> Button {
        let mut inputs = self.inputs.lock().unwrap_or_else(|e| e.into_inner());
        inputs.buttons.entry(name.to_string()).or_default().clone()
    }

    /// The axis called `name`, created at rest on first use.
    pub fn axis(&self, name: &str) -> Axis {
        let mut inputs = self.inputs.lock().unwrap_or_else(|e| e.into_inner());
        inputs.axes.entry(name.to_string()).or_default().clone()
    }

    /// Looks up an existing button or axis without creating one and returns
    /// whether it is currently active.
    pub fn is_active(&self, name: &str) -> Option<bool> {
        let inputs = self.inputs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(button) = inputs.buttons.get(name) {
            return Some(button.is_pressed());
        }
        inputs
            .axes
            .get(name)
            .map(|axis| axis.value() > TRIGGER_THRESHOLD)
    }

    /// Drive a named input fully on or fully off.  Axes go to `1.0` / `0.0`.
    /// Returns `false` if no input has that name.
    pub fn set_active(&self, name: &str, active: bool) -> bool {
        let inputs = self.inputs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(button) = inputs.buttons.get(name) {
            button.set(active);
            return true;
        }
        if let Some(axis) = inputs.axes.get(name) {
            axis.set(if active { 1.0 } else { 0.0 });
            return true;
        }
        false
    }

    /// Every input name, buttons first, each group sorted.
    pub fn names(&self) -> Vec<String> {
        let inputs = self.inputs.lock().unwrap_or_else(|e| e.into_inner());
        inputs
            .buttons
            .keys()
            .chain(inputs.axes.keys())
            .cloned()
            .collect()
    }

    /// Sampler for the right trigger pulled past [`TRIGGER_THRESHOLD`].
    pub fn right_trigger(&self) -> impl FnMut() -> bool + Send + use<> {
        self.axis(RIGHT_TRIGGER).above(TRIGGER_THRESHOLD)
    }
}
