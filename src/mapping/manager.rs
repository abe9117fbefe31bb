//! Fassade über Tabelle, Kalibrierung, Neubelegen und Persistenz
//!
//! Spiel- und Menülogik fragt den `InputRemapper` einmal pro Frame ab. Vor
//! den Abfragen eines Frames wird `update` aufgerufen, das laufende
//! Kalibrierungen und Neubelegungen um einen Schritt weiterschaltet.

use glam::Vec2;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::RemapSettings;
use crate::controller::{
    AxisAddress, ButtonAddress, CalibrationFlow, CalibrationStatus, Calibrator, DigitalInput, Key,
    RawSampler, ANY_GAMEPAD,
};
use crate::mapping::action::Action;
use crate::mapping::capture::{
    CaptureOptions, CaptureStatus, RebindCapture, RebindSequence, SequenceStatus,
};
use crate::mapping::column::{Column, MappingTable};
use crate::mapping::resolver::Resolver;
use crate::persistence::{self, column_key, BindingStore, FormatError};

/// Schwelle der Menüabfragen
pub const MENU_THRESHOLD: f32 = 0.7;

/// Was `update` in diesem Frame getan hat
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    pub calibration: Option<CalibrationStatus>,
    pub sequence: Option<SequenceStatus>,
    /// Nur gesetzt, wenn eine einzelne Sitzung direkt weitergeschaltet wurde
    pub capture: Option<CaptureStatus>,
}

/// Eingabe-Remapper für einen Sampler
pub struct InputRemapper<S: RawSampler> {
    sampler: S,
    settings: RemapSettings,
    table: MappingTable,
    calibrator: Calibrator,
    capture: RebindCapture,
    calibration: Option<CalibrationFlow>,
    /// Spalten nach der Kalibrierung auf Werkseinstellung setzen
    revert_after_calibration: bool,
    sequence: Option<RebindSequence>,
}

impl<S: RawSampler> InputRemapper<S> {
    /// Erstellt einen Remapper mit Werkseinstellungen in allen Spalten
    pub fn new(sampler: S, settings: RemapSettings) -> Self {
        info!("Creating new InputRemapper");
        let calibrator = Calibrator::new();

        Self {
            sampler,
            settings,
            table: MappingTable::with_defaults(&calibrator),
            calibrator,
            capture: RebindCapture::new(settings.capture),
            calibration: None,
            revert_after_calibration: true,
            sequence: None,
        }
    }

    /// Schaltet Kalibrierung und Neubelegen um einen Frame weiter
    pub fn update(&mut self, elapsed: Duration) -> FrameReport {
        let mut report = FrameReport::default();

        if let Some(flow) = &mut self.calibration {
            let status = flow.poll(&mut self.calibrator, &self.sampler);
            report.calibration = Some(status);
            if status == CalibrationStatus::Finished {
                self.calibration = None;
                if self.revert_after_calibration {
                    self.revert_all();
                }
            }
            return report;
        }

        if let Some(sequence) = &mut self.sequence {
            let status = sequence.poll(
                &mut self.capture,
                &mut self.table,
                &mut self.calibrator,
                &self.sampler,
                elapsed,
            );
            report.sequence = Some(status);
            if status == SequenceStatus::Finished {
                self.sequence = None;
            }
            return report;
        }

        if self.capture.is_busy() {
            report.capture = Some(self.capture.poll(
                &mut self.table,
                &self.calibrator,
                &self.sampler,
                elapsed,
            ));
        }
        report
    }

    /// Lesende Sicht für diesen Frame
    pub fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(&self.table, &self.sampler, self.settings.deadzone)
    }

    pub fn movement(&self) -> Vec2 {
        self.resolver().movement()
    }

    /// Normierter Kameravektor, Invertierung laut Einstellungen
    pub fn camera_vector(&self) -> Vec2 {
        let mut camera = self.resolver().camera();
        if self.settings.camera.invert_x {
            camera.x = -camera.x;
        }
        if self.settings.camera.invert_y {
            camera.y = -camera.y;
        }
        camera
    }

    pub fn axis(&self, positive: Action, negative: Action) -> f32 {
        self.resolver().axis(positive, negative)
    }

    pub fn button(&self, action: Action) -> bool {
        self.resolver().button(action)
    }

    pub fn just_pressed(&self, action: Action) -> bool {
        self.resolver().just_pressed(action)
    }

    pub fn is_mouse_camera_enabled(&self) -> bool {
        self.button(Action::MouseCamera)
    }

    pub fn horizontal_axis(&self) -> f32 {
        self.axis(Action::Right, Action::Left)
    }

    pub fn vertical_axis(&self) -> f32 {
        self.axis(Action::Up, Action::Down)
    }

    pub fn camera_x(&self) -> f32 {
        self.axis(Action::CameraRight, Action::CameraLeft)
    }

    pub fn camera_y(&self) -> f32 {
        self.axis(Action::CameraUp, Action::CameraDown)
    }

    // Menüabfragen: Stick von Gerät 0, feste Taste oder aufgelöste Achse

    fn any_stick(&self, axis: u8) -> f32 {
        self.sampler.axis_raw(AxisAddress::new(ANY_GAMEPAD, axis))
    }

    fn key_held(&self, key: Key) -> bool {
        self.sampler.digital_held(DigitalInput::Key(key))
    }

    fn any_button_held(&self, button: u8) -> bool {
        self.sampler
            .digital_held(DigitalInput::Button(ButtonAddress::new(ANY_GAMEPAD, button)))
    }

    pub fn menu_left(&self) -> bool {
        self.any_stick(0) < -MENU_THRESHOLD
            || self.key_held(Key::LeftArrow)
            || self.horizontal_axis() < -MENU_THRESHOLD
    }

    pub fn menu_right(&self) -> bool {
        self.any_stick(0) > MENU_THRESHOLD
            || self.key_held(Key::RightArrow)
            || self.horizontal_axis() > MENU_THRESHOLD
    }

    pub fn menu_up(&self) -> bool {
        self.any_stick(1) < -MENU_THRESHOLD
            || self.key_held(Key::UpArrow)
            || self.vertical_axis() > MENU_THRESHOLD
    }

    pub fn menu_down(&self) -> bool {
        self.any_stick(1) > MENU_THRESHOLD
            || self.key_held(Key::DownArrow)
            || self.vertical_axis() < -MENU_THRESHOLD
    }

    pub fn menu_select(&self) -> bool {
        self.any_button_held(0) || self.key_held(Key::Return) || self.button(Action::Accept)
    }

    pub fn menu_cancel(&self) -> bool {
        self.any_button_held(1) || self.key_held(Key::Escape)
    }

    /// Startet das Neubelegen einer Zelle. Während einer laufenden Sitzung
    /// oder Kalibrierung passiert nichts.
    pub fn begin_rebind(&mut self, column: Column, action: Action) -> bool {
        self.begin_rebind_with(column, action, CaptureOptions::default())
    }

    pub fn begin_rebind_with(
        &mut self,
        column: Column,
        action: Action,
        options: CaptureOptions,
    ) -> bool {
        if self.is_calibrating() || self.sequence.is_some() {
            warn!("Cannot rebind {:?}/{} right now", column, action);
            return false;
        }
        self.capture.begin(column, action, options)
    }

    /// Reicht eine außerhalb des Samplers gesehene Taste an die Sitzung weiter
    pub fn observe_digital(&mut self, input: DigitalInput) {
        self.capture.observe(input);
    }

    pub fn is_rebind_busy(&self) -> bool {
        self.capture.is_busy() || self.sequence.is_some()
    }

    /// Bricht die laufende Sitzung ab, inklusive einer laufenden Sequenz
    pub fn cancel_rebind(&mut self) -> CaptureStatus {
        match self.sequence.take() {
            Some(mut sequence) => {
                let status = self.capture.cancel();
                sequence.cancel(&mut self.capture);
                status
            }
            None => self.capture.cancel(),
        }
    }

    /// Belegt `actions` in `column` nacheinander neu
    pub fn start_rebind_sequence(&mut self, column: Column, actions: Vec<Action>) -> bool {
        if self.is_rebind_busy() || self.is_calibrating() {
            warn!("Cannot start rebind sequence on {:?} right now", column);
            return false;
        }
        self.sequence = Some(RebindSequence::new(column, actions));
        true
    }

    pub fn sequence_status(&self) -> Option<SequenceStatus> {
        self.sequence.as_ref().map(RebindSequence::status)
    }

    /// Anzeigename einer Zelle, leer wenn nicht belegt
    pub fn label_for(&self, column: Column, action: Action) -> String {
        self.table
            .column(column)
            .get(action)
            .map(|binding| binding.label())
            .unwrap_or_default()
    }

    /// Alle Belegungen einer Aktion, z.B. "Key: A or joystick 0 axis 0 -"
    pub fn action_labels(&self, action: Action) -> String {
        self.table
            .columns()
            .filter_map(|(_, column)| column.get(action).map(|binding| binding.label()))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    pub fn clear_binding(&mut self, column: Column, action: Action) {
        debug!("Clearing {:?}/{}", column, action);
        self.table.column_mut(column).clear(action);
    }

    pub fn revert_column_to_default(&mut self, column: Column) {
        self.table.revert(column, &self.calibrator);
    }

    pub fn revert_all(&mut self) {
        for column in Column::ALL {
            self.revert_column_to_default(column);
        }
    }

    /// Verwirft die Kalibrierung und wartet auf einen Tastendruck.
    ///
    /// Eine laufende Neubelegung wird abgebrochen. Nach Abschluss werden alle
    /// Spalten auf die Werkseinstellung mit den neuen Ruhewerten gesetzt.
    pub fn start_calibration(&mut self) {
        self.begin_calibration(true);
    }

    /// Wie `start_calibration`, lässt aber alle Belegungen unverändert.
    /// Geladene Achsbelegungen behalten ihre gespeicherten Ruhewerte.
    pub fn recalibrate(&mut self) {
        self.begin_calibration(false);
    }

    fn begin_calibration(&mut self, revert: bool) {
        if self.is_rebind_busy() {
            self.cancel_rebind();
        }
        self.revert_after_calibration = revert;
        self.calibration = Some(CalibrationFlow::start(
            &mut self.calibrator,
            self.settings.calibration.min_polls,
        ));
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn encode_column(&self, column: Column) -> String {
        persistence::encode_column(self.table.column(column))
    }

    /// Ersetzt die Spalte nur, wenn der ganze Text gültig ist
    pub fn decode_column(&mut self, column: Column, text: &str) -> Result<(), FormatError> {
        let decoded = persistence::decode_column(text)?;
        self.table.replace_column(column, decoded);
        Ok(())
    }

    /// Lädt alle Spalten. Fehlende oder ungültige Einträge fallen auf die
    /// Werkseinstellung zurück.
    pub fn load_bindings(&mut self, store: &dyn BindingStore) {
        for column in Column::ALL {
            let key = column_key(column);
            match store.get(&key) {
                Some(text) => match self.decode_column(column, &text) {
                    Ok(()) => info!("Loaded column {:?} from '{}'", column, key),
                    Err(e) => {
                        warn!("Stored column {:?} is invalid ({}), using defaults", column, e);
                        self.revert_column_to_default(column);
                    }
                },
                None => {
                    debug!("No stored entry '{}', using defaults", key);
                    self.revert_column_to_default(column);
                }
            }
        }
    }

    /// Speichert alle Spalten, ohne Fehler weiterzureichen.
    /// Liefert false, wenn mindestens ein Eintrag nicht geschrieben wurde.
    pub fn save_bindings(&self, store: &mut dyn BindingStore) -> bool {
        let mut saved = true;
        for column in Column::ALL {
            if let Err(e) = store.set(&column_key(column), self.encode_column(column)) {
                error!("Failed to save column {:?}: {}", column, e);
                saved = false;
            }
        }
        saved
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn settings(&self) -> &RemapSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RemapSettings) {
        self.capture.set_settings(settings.capture);
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DeviceSnapshot;

    fn remapper() -> InputRemapper<DeviceSnapshot> {
        InputRemapper::new(DeviceSnapshot::new(), RemapSettings::default())
    }

    #[test]
    fn action_labels_join_columns() {
        let remapper = remapper();
        assert_eq!(
            remapper.action_labels(Action::Left),
            "Key: A or joystick 0 axis 0 - or joystick 0 axis 6 -"
        );
        assert_eq!(remapper.action_labels(Action::MouseCamera), "Key: Mouse1");
        assert_eq!(remapper.label_for(Column::SecondaryPad, Action::Pause), "");
    }

    #[test]
    fn camera_inversion_keeps_unit_length() {
        let mut remapper = remapper();
        let mut settings = RemapSettings::default();
        settings.camera.invert_y = true;
        remapper.set_settings(settings);

        remapper.sampler_mut().press(DigitalInput::Key(Key::U));
        remapper.sampler_mut().press(DigitalInput::Key(Key::K));

        let camera = remapper.camera_vector();
        assert!((camera.length() - 1.0).abs() < 1e-6);
        assert!(camera.x > 0.0 && camera.y < 0.0);
    }

    #[test]
    fn menu_queries() {
        let mut remapper = remapper();
        assert!(!remapper.menu_left());

        remapper
            .sampler_mut()
            .set_axis(AxisAddress::new(ANY_GAMEPAD, 1), -0.75);
        assert!(remapper.menu_up());
        assert!(!remapper.menu_down());

        remapper.sampler_mut().press(DigitalInput::Key(Key::Escape));
        assert!(remapper.menu_cancel());

        remapper.sampler_mut().press(DigitalInput::Key(Key::Space));
        assert!(remapper.menu_select());
    }

    #[test]
    fn rebind_is_refused_during_calibration() {
        let mut remapper = remapper();
        remapper.start_calibration();
        assert!(!remapper.begin_rebind(Column::KeyboardMouse, Action::Left));
        assert!(!remapper.start_rebind_sequence(Column::PrimaryPad, Action::ALL.to_vec()));
    }

    #[test]
    fn cancel_rebind_stops_a_sequence() {
        let mut remapper = remapper();
        assert!(remapper.start_rebind_sequence(Column::PrimaryPad, vec![Action::Accept]));
        assert!(remapper.is_rebind_busy());
        assert!(!remapper.begin_rebind(Column::PrimaryPad, Action::Reset));

        remapper.cancel_rebind();
        assert!(!remapper.is_rebind_busy());
        assert_eq!(remapper.sequence_status(), None);
    }
}
