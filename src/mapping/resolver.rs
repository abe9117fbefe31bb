//! Zusammenführung der drei Spalten zu logischen Werten
//!
//! Achsen: die erste Spalte mit einem Wert ungleich null gewinnt, es wird
//! nicht summiert. Knöpfe: ODER über alle Spalten.

use glam::Vec2;

use crate::config::DeadzoneSettings;
use crate::controller::RawSampler;
use crate::mapping::action::Action;
use crate::mapping::column::{Column, MappingTable};

/// Schwelle, ab der eine Belegung als gedrückt gilt
pub const BUTTON_THRESHOLD: f32 = 0.5;

/// Lesende Sicht auf Tabelle und Gerätezustand für einen Frame
pub struct Resolver<'a, S: RawSampler + ?Sized> {
    table: &'a MappingTable,
    sampler: &'a S,
    deadzone: DeadzoneSettings,
}

impl<'a, S: RawSampler + ?Sized> Resolver<'a, S> {
    pub fn new(table: &'a MappingTable, sampler: &'a S, deadzone: DeadzoneSettings) -> Self {
        Self {
            table,
            sampler,
            deadzone,
        }
    }

    /// Wert einer einzelnen Zelle, 0 für leere Slots
    pub fn value(&self, column: Column, action: Action) -> f32 {
        self.table
            .column(column)
            .get(action)
            .map_or(0.0, |binding| binding.value(self.sampler, &self.deadzone))
    }

    pub fn column_axis(&self, column: Column, positive: Action, negative: Action) -> f32 {
        self.value(column, positive) - self.value(column, negative)
    }

    /// Kombinierte Achse in [-1, 1]
    pub fn axis(&self, positive: Action, negative: Action) -> f32 {
        Column::ALL
            .iter()
            .map(|column| self.column_axis(*column, positive, negative))
            .find(|value| *value != 0.0)
            .map_or(0.0, |value| value.clamp(-1.0, 1.0))
    }

    /// Normierter Vektor aus zwei Achsenpaaren, (0, 0) bleibt (0, 0)
    pub fn vector(&self, left: Action, right: Action, up: Action, down: Action) -> Vec2 {
        Vec2::new(self.axis(right, left), self.axis(up, down)).normalize_or_zero()
    }

    pub fn movement(&self) -> Vec2 {
        self.vector(Action::Left, Action::Right, Action::Up, Action::Down)
    }

    pub fn camera(&self) -> Vec2 {
        self.vector(
            Action::CameraLeft,
            Action::CameraRight,
            Action::CameraUp,
            Action::CameraDown,
        )
    }

    pub fn button(&self, action: Action) -> bool {
        Column::ALL
            .iter()
            .any(|column| self.value(*column, action) > BUTTON_THRESHOLD)
    }

    /// Flanke seit dem letzten Frame, analoge Quellen liefern nie eine
    pub fn just_pressed(&self, action: Action) -> bool {
        self.table.columns().any(|(_, column)| {
            column
                .get(action)
                .is_some_and(|binding| binding.just_pressed(self.sampler))
        })
    }
}
