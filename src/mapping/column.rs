//! Belegungsspalten und die Tabelle aus drei parallelen Spalten

use std::sync::Arc;
use tracing::info;

use crate::controller::{AxisAddress, ButtonAddress, Calibrator, DigitalInput, Key, MouseButton};
use crate::mapping::action::Action;
use crate::mapping::binding::{AxisBinding, Binding, Polarity};
use crate::mapping::error::RemapError;

/// Feste Spalten, eine pro Eingabeschema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    KeyboardMouse,
    PrimaryPad,
    SecondaryPad,
}

impl Column {
    pub const COUNT: usize = 3;

    pub const ALL: [Column; Column::COUNT] =
        [Column::KeyboardMouse, Column::PrimaryPad, Column::SecondaryPad];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Panics bei einem Index außerhalb von 0..3
    pub fn from_index(index: usize) -> Self {
        match Self::ALL.get(index) {
            Some(column) => *column,
            None => panic!("Invalid input column ({index})"),
        }
    }
}

impl TryFrom<usize> for Column {
    type Error = RemapError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(RemapError::InvalidColumnIndex(index))
    }
}

type Slot = Option<Arc<Binding>>;

/// Eine Spalte mit genau einem Slot pro Aktion
#[derive(Debug, Clone, Default)]
pub struct MappingColumn {
    slots: [Slot; Action::COUNT],
}

impl MappingColumn {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: [Slot; Action::COUNT]) -> Self {
        Self { slots }
    }

    pub fn get(&self, action: Action) -> Option<&Binding> {
        self.slots[action.index()].as_deref()
    }

    /// Gemeinsamer Zeiger auf die Belegung, für Leser während eines Neubelegens
    pub fn slot(&self, action: Action) -> Option<Arc<Binding>> {
        self.slots[action.index()].clone()
    }

    /// Ersetzt den Slot als Ganzes
    pub fn bind(&mut self, action: Action, binding: Binding) {
        self.slots[action.index()] = Some(Arc::new(binding));
    }

    pub fn clear(&mut self, action: Action) {
        self.slots[action.index()] = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, Option<&Binding>)> {
        Action::ALL
            .iter()
            .zip(self.slots.iter())
            .map(|(action, slot)| (*action, slot.as_deref()))
    }

    /// Werkseinstellung einer Spalte.
    ///
    /// Analoge Achsen des ersten Pads übernehmen den kalibrierten Ruhewert
    /// von Gerät 0.
    pub fn defaults(column: Column, calibrator: &Calibrator) -> Self {
        let key = |key: Key| Some(Binding::Digital(DigitalInput::Key(key)));
        let mouse = |index: u8| Some(Binding::Digital(DigitalInput::Mouse(MouseButton::new(index))));
        let button = |device: u8, index: u8| {
            Some(Binding::Digital(DigitalInput::Button(ButtonAddress::new(
                device, index,
            ))))
        };
        let axis = |device: u8, index: u8, polarity: Polarity| {
            let address = AxisAddress::new(device, index);
            Some(Binding::Axis(AxisBinding::with_rest(
                address,
                polarity,
                calibrator.rest(address),
            )))
        };

        let bindings: [Option<Binding>; Action::COUNT] = match column {
            Column::KeyboardMouse => [
                key(Key::A),
                key(Key::D),
                key(Key::W),
                key(Key::S),
                key(Key::Space),
                key(Key::R),
                key(Key::Escape),
                mouse(1),
                key(Key::H),
                key(Key::K),
                key(Key::U),
                key(Key::J),
                mouse(2),
            ],
            Column::PrimaryPad => [
                axis(0, 0, Polarity::Negative),
                axis(0, 0, Polarity::Positive),
                axis(0, 1, Polarity::Negative),
                axis(0, 1, Polarity::Positive),
                button(0, 0),
                button(0, 3),
                button(0, 7),
                None,
                axis(0, 3, Polarity::Negative),
                axis(0, 3, Polarity::Positive),
                axis(0, 4, Polarity::Negative),
                axis(0, 4, Polarity::Positive),
                button(0, 5),
            ],
            Column::SecondaryPad => [
                axis(0, 6, Polarity::Negative),
                axis(0, 6, Polarity::Positive),
                axis(0, 7, Polarity::Positive),
                axis(0, 7, Polarity::Negative),
                None,
                None,
                None,
                None,
                None,
                None,
                None,
                None,
                None,
            ],
        };

        Self {
            slots: bindings.map(|binding| binding.map(Arc::new)),
        }
    }
}

/// Alle drei Spalten
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    columns: [MappingColumn; Column::COUNT],
}

impl MappingTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults(calibrator: &Calibrator) -> Self {
        Self {
            columns: Column::ALL.map(|column| MappingColumn::defaults(column, calibrator)),
        }
    }

    pub fn column(&self, column: Column) -> &MappingColumn {
        &self.columns[column.index()]
    }

    pub fn column_mut(&mut self, column: Column) -> &mut MappingColumn {
        &mut self.columns[column.index()]
    }

    pub fn replace_column(&mut self, column: Column, replacement: MappingColumn) {
        self.columns[column.index()] = replacement;
    }

    /// Spalten in fester Reihenfolge 0, 1, 2
    pub fn columns(&self) -> impl Iterator<Item = (Column, &MappingColumn)> {
        Column::ALL.iter().copied().zip(self.columns.iter())
    }

    /// Setzt eine Spalte auf die Werkseinstellung zurück
    pub fn revert(&mut self, column: Column, calibrator: &Calibrator) {
        info!("Reverting column {:?} to defaults", column);
        self.replace_column(column, MappingColumn::defaults(column, calibrator));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_defaults() {
        let column = MappingColumn::defaults(Column::KeyboardMouse, &Calibrator::new());
        let labels: Vec<String> = column
            .iter()
            .map(|(_, binding)| binding.map(Binding::label).unwrap_or_default())
            .collect();

        assert_eq!(labels[0], "Key: A");
        assert_eq!(labels[Action::MouseCamera.index()], "Key: Mouse1");
        assert_eq!(labels[Action::ResetCamera.index()], "Key: Mouse2");
        assert_eq!(labels.len(), Action::COUNT);
    }

    #[test]
    fn primary_pad_defaults() {
        let column = MappingColumn::defaults(Column::PrimaryPad, &Calibrator::new());

        assert_eq!(
            column.get(Action::Up).map(Binding::label).as_deref(),
            Some("joystick 0 axis 1 -")
        );
        assert_eq!(
            column.get(Action::Pause).map(Binding::label).as_deref(),
            Some("joystick 0 button 7")
        );
        assert!(column.get(Action::MouseCamera).is_none());
    }

    #[test]
    fn secondary_pad_has_only_movement() {
        let column = MappingColumn::defaults(Column::SecondaryPad, &Calibrator::new());
        let bound = column.iter().filter(|(_, binding)| binding.is_some()).count();
        assert_eq!(bound, 4);
    }

    #[test]
    fn rebinding_replaces_the_slot() {
        let mut column = MappingColumn::defaults(Column::KeyboardMouse, &Calibrator::new());
        let before = column.slot(Action::Left);

        column.bind(Action::Left, Binding::Digital(DigitalInput::Key(Key::LeftArrow)));

        let before = before.map(|binding| binding.label());
        assert_eq!(before.as_deref(), Some("Key: A"));
        assert_eq!(
            column.get(Action::Left).map(Binding::label).as_deref(),
            Some("Key: LeftArrow")
        );

        column.clear(Action::Left);
        assert!(column.get(Action::Left).is_none());
    }

    #[test]
    fn column_index_bounds() {
        assert_eq!(Column::from_index(2), Column::SecondaryPad);
        assert!(matches!(
            Column::try_from(3),
            Err(RemapError::InvalidColumnIndex(3))
        ));
    }

    #[test]
    #[should_panic(expected = "Invalid input column (5)")]
    fn from_index_panics() {
        Column::from_index(5);
    }
}
