use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use crate::controller::sampler::{
    AxisAddress, ButtonAddress, DigitalInput, RawSampler, ANY_GAMEPAD, AXES_PER_DEVICE,
    BUTTONS_PER_DEVICE, DEVICE_COUNT,
};
use crate::controller::snapshot::DeviceSnapshot;

// Axis index -> gilrs axis and whether it gets flipped.
// Vertical sticks are flipped so "down" reads positive, the default bindings
// expect that layout.
const AXIS_LAYOUT: [Option<(Axis, bool)>; AXES_PER_DEVICE] = [
    Some((Axis::LeftStickX, false)),
    Some((Axis::LeftStickY, true)),
    Some((Axis::LeftZ, false)),
    Some((Axis::RightStickX, false)),
    Some((Axis::RightStickY, true)),
    Some((Axis::RightZ, false)),
    Some((Axis::DPadX, false)),
    Some((Axis::DPadY, false)),
    None,
    None,
];

// Button index -> gilrs button
const BUTTON_LAYOUT: [Button; BUTTONS_PER_DEVICE] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::Mode,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::C,
    Button::Z,
    Button::Unknown,
];

// Sampler errors
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Failed to initialize sampler: {0}")]
    InitializationError(String),
}

// Define sampler states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Initializing,
    Sampling,
}

#[machine]
#[derive(Debug)]
pub struct GilrsSampler<S: SamplerState> {
    // Gilrs context
    gilrs: Gilrs,

    // Connected pads, slot n is device n + 1
    pads: Vec<GamepadId>,

    // State of the current frame
    snapshot: DeviceSnapshot,
}

// Implementation of methods available in all states
impl<S: SamplerState> GilrsSampler<S> {
    // Get a reference to the current frame
    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    // Re-enumerate connected pads and hand out device indices 1..=8
    fn assign_devices(&mut self) {
        let connected: Vec<(GamepadId, String)> = self
            .gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        if connected.is_empty() {
            warn!("No gamepad connected, continuing with keyboard state only");
        } else {
            info!("Found {} gamepads:", connected.len());
            for (slot, (id, name)) in connected.iter().enumerate() {
                info!("  [device {}] ID: {}, Name: {}", slot + 1, id, name);
            }
        }

        if connected.len() > DEVICE_COUNT - 1 {
            warn!(
                "{} gamepads connected, only the first {} get a device index",
                connected.len(),
                DEVICE_COUNT - 1
            );
        }

        let (pads, names): (Vec<_>, Vec<_>) =
            connected.into_iter().take(DEVICE_COUNT - 1).unzip();
        self.pads = pads;
        self.snapshot.clear_gamepads();
        self.snapshot.set_device_names(names);
    }
}

// Implementation for Initializing state
impl GilrsSampler<Initializing> {
    pub fn create() -> Result<Self, SamplerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SamplerError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, Vec::new(), DeviceSnapshot::new()))
    }

    // Enumerate pads and transition to Sampling state
    pub fn initialize(mut self) -> GilrsSampler<Sampling> {
        self.assign_devices();
        info!("Gilrs sampler initialized, transitioning to Sampling state");
        self.transition()
    }
}

// Implementation for Sampling state
impl GilrsSampler<Sampling> {
    /// Drains pending gilrs events and rebuilds the frame snapshot.
    ///
    /// Call once per frame before querying the remapper.
    pub fn refresh(&mut self) {
        let mut topology_changed = false;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    info!("Controller {} connected", id);
                    topology_changed = true;
                }
                EventType::Disconnected => {
                    warn!("Controller {} disconnected", id);
                    topology_changed = true;
                }
                _ => {}
            }
        }
        if topology_changed {
            self.assign_devices();
        }

        self.snapshot.end_frame();

        let mut merged_axes = [0.0f32; AXES_PER_DEVICE];
        let mut merged_buttons = [false; BUTTONS_PER_DEVICE];

        for (slot, id) in self.pads.iter().enumerate() {
            let device = (slot + 1) as u8;
            let gamepad = self.gilrs.gamepad(*id);

            for (axis, layout) in AXIS_LAYOUT.iter().enumerate() {
                let value = layout.map_or(0.0, |(gilrs_axis, flip)| {
                    let value = gamepad.value(gilrs_axis);
                    if flip {
                        -value
                    } else {
                        value
                    }
                });
                self.snapshot
                    .set_axis(AxisAddress::new(device, axis as u8), value);
                if value.abs() > merged_axes[axis].abs() {
                    merged_axes[axis] = value;
                }
            }

            for (button, gilrs_button) in BUTTON_LAYOUT.iter().enumerate() {
                let held = gamepad.is_pressed(*gilrs_button);
                self.snapshot.set_held(
                    DigitalInput::Button(ButtonAddress::new(device, button as u8)),
                    held,
                );
                merged_buttons[button] |= held;
            }
        }

        // Device 0 sees every pad at once
        for (axis, value) in merged_axes.iter().enumerate() {
            self.snapshot
                .set_axis(AxisAddress::new(ANY_GAMEPAD, axis as u8), *value);
        }
        for (button, held) in merged_buttons.iter().enumerate() {
            self.snapshot.set_held(
                DigitalInput::Button(ButtonAddress::new(ANY_GAMEPAD, button as u8)),
                *held,
            );
        }

        if topology_changed {
            self.snapshot.forget_gamepad_edges();
        }

        debug!("Sampled {} gamepads", self.pads.len());
    }
}

impl RawSampler for GilrsSampler<Sampling> {
    fn digital_held(&self, input: DigitalInput) -> bool {
        self.snapshot.digital_held(input)
    }

    fn digital_just_pressed(&self, input: DigitalInput) -> bool {
        self.snapshot.digital_just_pressed(input)
    }

    fn axis_raw(&self, address: AxisAddress) -> f32 {
        self.snapshot.axis_raw(address)
    }

    fn any_digital_held(&self) -> bool {
        self.snapshot.any_digital_held()
    }

    fn any_digital_just_pressed(&self) -> bool {
        self.snapshot.any_digital_just_pressed()
    }

    fn connected_device_names(&self) -> Vec<String> {
        self.snapshot.connected_device_names()
    }
}
