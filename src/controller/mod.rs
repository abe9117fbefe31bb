//! Device side of the remapper
//!
//! Implements everything that deals with physical inputs:
//!
//! 1. [`sampler`] - fixed address space and the raw device sampler seam
//! 2. [`snapshot`] - in-memory per-frame device state
//! 3. [`event_collector`] - gilrs-backed sampler
//! 4. [`calibrator`] - rest-point estimation and the calibration flow
//!
//! # Architecture
//!
//! ```text
//! Gamepads ──► GilrsSampler ──► DeviceSnapshot ──► RawSampler queries
//!                                     │
//!                                     ▼
//!                                Calibrator (rest values)
//! ```
//!
//! Device 0 is the virtual "any gamepad" device, devices 1..=8 are the
//! connected pads in connection order.

pub mod calibrator;
pub mod event_collector;
pub mod sampler;
pub mod snapshot;

pub use calibrator::{CalibrationFlow, CalibrationStatus, Calibrator, QuietGate};
pub use event_collector::{GilrsSampler, Initializing, SamplerError, SamplerState, Sampling};
pub use sampler::{
    AddressError, AxisAddress, ButtonAddress, DigitalInput, Key, MouseButton, RawSampler,
    ANY_GAMEPAD, AXES_PER_DEVICE, BUTTONS_PER_DEVICE, DEVICE_COUNT,
};
pub use snapshot::DeviceSnapshot;
