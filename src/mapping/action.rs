//! Katalog der logischen Aktionen
//!
//! Die Reihenfolge ist fest: jede Belegungsspalte hat genau einen Slot pro
//! Aktion, in genau dieser Reihenfolge.

use std::fmt;

use crate::mapping::error::RemapError;

/// Logische Eingabe, unabhängig vom physischen Gerät
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Accept,
    Reset,
    Pause,
    MouseCamera,
    CameraLeft,
    CameraRight,
    CameraUp,
    CameraDown,
    ResetCamera,
}

impl Action {
    pub const COUNT: usize = 13;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Accept,
        Action::Reset,
        Action::Pause,
        Action::MouseCamera,
        Action::CameraLeft,
        Action::CameraRight,
        Action::CameraUp,
        Action::CameraDown,
        Action::ResetCamera,
    ];

    /// Position im Katalog
    pub fn index(self) -> usize {
        self as usize
    }

    /// Panics bei einem Index außerhalb des Katalogs
    pub fn from_index(index: usize) -> Self {
        match Self::ALL.get(index) {
            Some(action) => *action,
            None => panic!("Invalid action ({index})"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Left => "Left",
            Action::Right => "Right",
            Action::Up => "Up",
            Action::Down => "Down",
            Action::Accept => "Action",
            Action::Reset => "Reset",
            Action::Pause => "Pause",
            Action::MouseCamera => "MouseCamera",
            Action::CameraLeft => "CameraLeft",
            Action::CameraRight => "CameraRight",
            Action::CameraUp => "CameraUp",
            Action::CameraDown => "CameraDown",
            Action::ResetCamera => "ResetCamera",
        }
    }

    /// Kurzer Name für Menüzeilen
    pub fn menu_label(self) -> &'static str {
        match self {
            Action::MouseCamera => "Use Mouse",
            Action::CameraLeft => "Left",
            Action::CameraRight => "Right",
            Action::CameraUp => "Up",
            Action::CameraDown => "Down",
            Action::ResetCamera => "ResetCam.",
            other => other.name(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Left => "Press input to move the character left",
            Action::Right => "Press input to move the character right",
            Action::Up => "Press input to move the character up",
            Action::Down => "Press input to move the character down",
            Action::Accept => "Press input to jump/accept",
            Action::Reset => "Press input to reset to the start of the level",
            Action::Pause => "Press input to pause the game",
            Action::MouseCamera => "Press input to enable mouse-based camera control",
            Action::CameraLeft => "Press input to move the camera left",
            Action::CameraRight => "Press input to move the camera right",
            Action::CameraUp => "Press input to move the camera up",
            Action::CameraDown => "Press input to move the camera down",
            Action::ResetCamera => "Press input to reset the camera",
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = RemapError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(RemapError::InvalidActionIndex(index))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
