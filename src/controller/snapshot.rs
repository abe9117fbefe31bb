//! In-memory device state for one frame
//!
//! Holds which digital inputs are down, which went down this frame and the
//! current value of every axis in the address space. The gilrs sampler
//! refreshes one of these per frame; tests drive one by hand.

use std::collections::HashSet;
use tracing::debug;

use crate::controller::sampler::{
    AxisAddress, DigitalInput, RawSampler, AXES_PER_DEVICE, DEVICE_COUNT,
};

/// Per-frame snapshot of every device
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    /// Inputs currently held down
    held: HashSet<DigitalInput>,
    /// Inputs that went down since the last `end_frame`
    just_pressed: HashSet<DigitalInput>,
    /// Dense axis table, indexed by `AxisAddress::index`
    axes: Vec<f32>,
    device_names: Vec<String>,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            axes: vec![0.0; DEVICE_COUNT * AXES_PER_DEVICE],
            device_names: Vec::new(),
        }
    }

    pub fn press(&mut self, input: DigitalInput) {
        if self.held.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub fn release(&mut self, input: DigitalInput) {
        self.held.remove(&input);
    }

    pub fn set_held(&mut self, input: DigitalInput, held: bool) {
        if held {
            self.press(input);
        } else {
            self.release(input);
        }
    }

    /// Stores an axis value, clamped to [-1, 1]
    pub fn set_axis(&mut self, address: AxisAddress, value: f32) {
        self.axes[address.index()] = value.clamp(-1.0, 1.0);
    }

    pub fn axis(&self, address: AxisAddress) -> f32 {
        self.axes[address.index()]
    }

    pub fn set_device_names(&mut self, names: Vec<String>) {
        self.device_names = names;
    }

    /// Call at end of frame to clear per-frame edges
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }

    /// Releases every pad button and zeroes every axis, keyboard and mouse
    /// state stays untouched
    pub fn clear_gamepads(&mut self) {
        debug!("Clearing gamepad state in device snapshot");
        self.held
            .retain(|input| !matches!(input, DigitalInput::Button(_)));
        self.just_pressed
            .retain(|input| !matches!(input, DigitalInput::Button(_)));
        self.axes.iter_mut().for_each(|value| *value = 0.0);
    }

    /// Drops the edges of pad buttons only. Used after a re-enumeration,
    /// where buttons that were already held come back as fresh presses.
    pub fn forget_gamepad_edges(&mut self) {
        self.just_pressed
            .retain(|input| !matches!(input, DigitalInput::Button(_)));
    }
}

impl RawSampler for DeviceSnapshot {
    fn digital_held(&self, input: DigitalInput) -> bool {
        self.held.contains(&input)
    }

    fn digital_just_pressed(&self, input: DigitalInput) -> bool {
        self.just_pressed.contains(&input)
    }

    fn axis_raw(&self, address: AxisAddress) -> f32 {
        self.axis(address)
    }

    fn any_digital_held(&self) -> bool {
        !self.held.is_empty()
    }

    fn any_digital_just_pressed(&self) -> bool {
        !self.just_pressed.is_empty()
    }

    fn connected_device_names(&self) -> Vec<String> {
        self.device_names.clone()
    }
}
