//! Raw device sampler seam and the fixed device address space
//!
//! Everything above this module only ever sees typed addresses. A pad axis is
//! `joystick {device} axis {axis}`, a pad button `joystick {device} button {button}`;
//! device 0 is the virtual "any gamepad" device that merges every pad.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of gamepad devices, including the virtual device 0
pub const DEVICE_COUNT: usize = 9;
/// Axes per gamepad device
pub const AXES_PER_DEVICE: usize = 10;
/// Buttons per gamepad device
pub const BUTTONS_PER_DEVICE: usize = 20;
/// Device index that receives input from every connected pad
pub const ANY_GAMEPAD: u8 = 0;
/// Number of mouse buttons that can be bound
pub const MOUSE_BUTTONS: u8 = 7;

// Address errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input address: {0}")]
pub struct AddressError(pub String);

/// One analog axis on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisAddress {
    device: u8,
    axis: u8,
}

impl AxisAddress {
    /// Panics if the address lies outside the fixed address space.
    pub const fn new(device: u8, axis: u8) -> Self {
        assert!((device as usize) < DEVICE_COUNT, "gamepad device out of range");
        assert!((axis as usize) < AXES_PER_DEVICE, "gamepad axis out of range");
        Self { device, axis }
    }

    pub fn device(self) -> u8 {
        self.device
    }

    pub fn axis(self) -> u8 {
        self.axis
    }

    /// Dense index into a `DEVICE_COUNT * AXES_PER_DEVICE` table
    pub fn index(self) -> usize {
        self.device as usize * AXES_PER_DEVICE + self.axis as usize
    }

    pub fn is_virtual(self) -> bool {
        self.device == ANY_GAMEPAD
    }

    /// Every axis of every device, device-major
    pub fn all() -> impl Iterator<Item = AxisAddress> {
        (0..DEVICE_COUNT as u8)
            .flat_map(|device| (0..AXES_PER_DEVICE as u8).map(move |axis| Self::new(device, axis)))
    }

    /// Every axis of the concrete pads, skipping the virtual device
    pub fn concrete() -> impl Iterator<Item = AxisAddress> {
        Self::all().filter(|address| !address.is_virtual())
    }
}

impl fmt::Display for AxisAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joystick {} axis {}", self.device, self.axis)
    }
}

impl FromStr for AxisAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (device, axis) = parse_joystick(s, "axis", AXES_PER_DEVICE)?;
        Ok(Self::new(device, axis))
    }
}

/// One digital button on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonAddress {
    device: u8,
    button: u8,
}

impl ButtonAddress {
    /// Panics if the address lies outside the fixed address space.
    pub const fn new(device: u8, button: u8) -> Self {
        assert!((device as usize) < DEVICE_COUNT, "gamepad device out of range");
        assert!((button as usize) < BUTTONS_PER_DEVICE, "gamepad button out of range");
        Self { device, button }
    }

    pub fn device(self) -> u8 {
        self.device
    }

    pub fn button(self) -> u8 {
        self.button
    }

    pub fn is_virtual(self) -> bool {
        self.device == ANY_GAMEPAD
    }

    pub fn all() -> impl Iterator<Item = ButtonAddress> {
        (0..DEVICE_COUNT as u8).flat_map(|device| {
            (0..BUTTONS_PER_DEVICE as u8).map(move |button| Self::new(device, button))
        })
    }

    pub fn concrete() -> impl Iterator<Item = ButtonAddress> {
        Self::all().filter(|address| !address.is_virtual())
    }
}

impl fmt::Display for ButtonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joystick {} button {}", self.device, self.button)
    }
}

impl FromStr for ButtonAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (device, button) = parse_joystick(s, "button", BUTTONS_PER_DEVICE)?;
        Ok(Self::new(device, button))
    }
}

// Parses "joystick <device> <kind> <index>" with range checks
fn parse_joystick(s: &str, kind: &str, limit: usize) -> Result<(u8, u8), AddressError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let [prefix, device, found_kind, index] = parts.as_slice() else {
        return Err(AddressError(format!("'{}' is not a joystick {} address", s, kind)));
    };
    if *prefix != "joystick" || *found_kind != kind {
        return Err(AddressError(format!("'{}' is not a joystick {} address", s, kind)));
    }

    let device: u8 = device
        .parse()
        .map_err(|_| AddressError(format!("bad device in '{}'", s)))?;
    let index: u8 = index
        .parse()
        .map_err(|_| AddressError(format!("bad {} in '{}'", kind, s)))?;

    if device as usize >= DEVICE_COUNT || index as usize >= limit {
        return Err(AddressError(format!("'{}' is out of range", s)));
    }
    Ok((device, index))
}

macro_rules! keys {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Keyboard keys that can be bound
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $($variant),*
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name),*
                }
            }
        }

        impl FromStr for Key {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Key::$variant),)*
                    _ => Err(AddressError(format!("unknown key '{}'", s))),
                }
            }
        }
    };
}

keys! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Digit0 => "0", Digit1 => "1", Digit2 => "2", Digit3 => "3", Digit4 => "4",
    Digit5 => "5", Digit6 => "6", Digit7 => "7", Digit8 => "8", Digit9 => "9",
    Space => "Space",
    Return => "Return",
    Escape => "Escape",
    Tab => "Tab",
    Backspace => "Backspace",
    UpArrow => "UpArrow",
    DownArrow => "DownArrow",
    LeftArrow => "LeftArrow",
    RightArrow => "RightArrow",
    LeftShift => "LeftShift",
    RightShift => "RightShift",
    LeftControl => "LeftControl",
    RightControl => "RightControl",
    LeftAlt => "LeftAlt",
    RightAlt => "RightAlt",
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mouse button, 0 is the primary button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MouseButton(u8);

impl MouseButton {
    /// Panics on indices past the last bindable mouse button.
    pub const fn new(index: u8) -> Self {
        assert!(index < MOUSE_BUTTONS, "mouse button out of range");
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = MouseButton> {
        (0..MOUSE_BUTTONS).map(Self::new)
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mouse{}", self.0)
    }
}

impl FromStr for MouseButton {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix("Mouse")
            .and_then(|rest| rest.parse::<u8>().ok())
            .filter(|index| *index < MOUSE_BUTTONS)
            .ok_or_else(|| AddressError(format!("unknown mouse button '{}'", s)))?;
        Ok(Self(index))
    }
}

/// Any source that is either held or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigitalInput {
    Key(Key),
    Mouse(MouseButton),
    Button(ButtonAddress),
}

impl DigitalInput {
    /// Parses the key id of a keyboard key or mouse button ("W", "Mouse1")
    pub fn from_key_id(id: &str) -> Result<Self, AddressError> {
        if id.starts_with("Mouse") {
            return id.parse().map(DigitalInput::Mouse);
        }
        id.parse().map(DigitalInput::Key)
    }

    /// Every keyboard key and mouse button
    pub fn keys_and_mouse() -> impl Iterator<Item = DigitalInput> {
        Key::ALL
            .iter()
            .copied()
            .map(DigitalInput::Key)
            .chain(MouseButton::all().map(DigitalInput::Mouse))
    }
}

impl fmt::Display for DigitalInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigitalInput::Key(key) => write!(f, "{}", key),
            DigitalInput::Mouse(button) => write!(f, "{}", button),
            DigitalInput::Button(address) => write!(f, "{}", address),
        }
    }
}

/// Source of raw device state, polled once per frame by the remapper.
///
/// Missing devices never fail; they report released buttons and a constant
/// axis value (usually 0).
pub trait RawSampler {
    /// Whether the input is held right now
    fn digital_held(&self, input: DigitalInput) -> bool;

    /// Whether the input went from released to held since the last frame
    fn digital_just_pressed(&self, input: DigitalInput) -> bool;

    /// Raw axis value in [-1, 1]
    fn axis_raw(&self, address: AxisAddress) -> f32;

    fn any_digital_held(&self) -> bool;

    fn any_digital_just_pressed(&self) -> bool;

    fn connected_device_names(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_render_and_parse() {
        let axis = AxisAddress::new(3, 7);
        assert_eq!(axis.to_string(), "joystick 3 axis 7");
        assert_eq!("joystick 3 axis 7".parse::<AxisAddress>(), Ok(axis));

        let button = ButtonAddress::new(0, 19);
        assert_eq!(button.to_string(), "joystick 0 button 19");
        assert_eq!("joystick 0 button 19".parse::<ButtonAddress>(), Ok(button));
    }

    #[test]
    fn out_of_range_addresses_are_rejected() {
        assert!("joystick 9 axis 0".parse::<AxisAddress>().is_err());
        assert!("joystick 1 axis 10".parse::<AxisAddress>().is_err());
        assert!("joystick 1 button 20".parse::<ButtonAddress>().is_err());
        assert!("joystick 1 button 2".parse::<AxisAddress>().is_err());
        assert!("gamepad 1 axis 2".parse::<AxisAddress>().is_err());
    }

    #[test]
    fn address_space_is_dense() {
        assert_eq!(AxisAddress::all().count(), DEVICE_COUNT * AXES_PER_DEVICE);
        assert_eq!(
            AxisAddress::concrete().count(),
            (DEVICE_COUNT - 1) * AXES_PER_DEVICE
        );
        for (i, address) in AxisAddress::all().enumerate() {
            assert_eq!(address.index(), i);
        }
        assert_eq!(
            ButtonAddress::concrete().count(),
            (DEVICE_COUNT - 1) * BUTTONS_PER_DEVICE
        );
    }

    #[test]
    fn key_ids_round_trip() {
        for input in DigitalInput::keys_and_mouse() {
            let id = input.to_string();
            assert_eq!(DigitalInput::from_key_id(&id), Ok(input));
        }
        assert!(DigitalInput::from_key_id("Mouse7").is_err());
        assert!(DigitalInput::from_key_id("NotAKey").is_err());
    }
}
