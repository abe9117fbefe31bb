//! Input remapping for keyboard, mouse and up to eight gamepads.
//!
//! - [`controller`]: raw device state, the gilrs sampler and axis calibration
//! - [`mapping`]: actions, bindings, the three mapping columns, the resolver
//!   and interactive rebinding, behind [`mapping::InputRemapper`]
//! - [`persistence`]: column text format and the key/value store
//! - [`config`]: tunable thresholds

pub mod config;
pub mod controller;
pub mod mapping;
pub mod persistence;

pub use config::RemapSettings;
pub use mapping::{Action, Column, InputRemapper, RemapError};
