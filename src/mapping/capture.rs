//! Interaktives Neubelegen
//!
//! ```text
//! Idle ──begin──► Waiting ──► Captured | TimedOut | Canceled ──► Idle
//! ```
//!
//! Es gibt höchstens eine laufende Sitzung. Die Maschine wird pro Frame
//! über `poll` weitergeschaltet und liefert jedes Mal ihren Zustand.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::CaptureSettings;
use crate::controller::{
    AxisAddress, ButtonAddress, Calibrator, DigitalInput, QuietGate, RawSampler,
};
use crate::mapping::action::Action;
use crate::mapping::binding::{travel_from, AxisBinding, Binding, Polarity};
use crate::mapping::column::{Column, MappingTable};

/// Optionen einer einzelnen Sitzung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Leert den Ziel-Slot, wenn die Zeit abläuft
    pub clear_on_timeout: bool,
}

/// Ergebnis eines `poll`
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    Idle,
    Waiting {
        remaining: Duration,
    },
    Captured {
        column: Column,
        action: Action,
        binding: Binding,
    },
    TimedOut {
        column: Column,
        action: Action,
        cleared: bool,
    },
    Canceled {
        column: Column,
        action: Action,
    },
}

impl CaptureStatus {
    pub fn is_waiting(&self) -> bool {
        matches!(self, CaptureStatus::Waiting { .. })
    }
}

#[derive(Debug, Clone)]
struct Session {
    column: Column,
    action: Action,
    options: CaptureOptions,
    observed: Option<DigitalInput>,
    elapsed: Duration,
}

/// Wartet auf die nächste eindeutige Eingabe und legt sie auf eine Zelle
#[derive(Debug, Clone)]
pub struct RebindCapture {
    settings: CaptureSettings,
    session: Option<Session>,
}

impl RebindCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    /// Startet eine Sitzung. Liefert false und ändert nichts, solange
    /// bereits eine Sitzung läuft.
    pub fn begin(&mut self, column: Column, action: Action, options: CaptureOptions) -> bool {
        if let Some(session) = &self.session {
            warn!(
                "Rebind of {:?}/{} still running, ignoring request for {:?}/{}",
                session.column, session.action, column, action
            );
            return false;
        }

        info!("Waiting for input for {:?}/{}", column, action);
        self.session = Some(Session {
            column,
            action,
            options,
            observed: None,
            elapsed: Duration::ZERO,
        });
        true
    }

    /// Meldet eine außerhalb des Samplers beobachtete Taste
    pub fn observe(&mut self, input: DigitalInput) {
        if let Some(session) = &mut self.session {
            debug!("Observed {} during rebind", input);
            session.observed = Some(input);
        }
    }

    pub fn cancel(&mut self) -> CaptureStatus {
        match self.session.take() {
            Some(session) => {
                info!("Rebind of {:?}/{} canceled", session.column, session.action);
                CaptureStatus::Canceled {
                    column: session.column,
                    action: session.action,
                }
            }
            None => CaptureStatus::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_some()
    }

    pub fn target(&self) -> Option<(Column, Action)> {
        self.session
            .as_ref()
            .map(|session| (session.column, session.action))
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CaptureSettings) {
        self.settings = settings;
    }

    /// Schaltet die Sitzung um einen Frame weiter
    pub fn poll<S: RawSampler + ?Sized>(
        &mut self,
        table: &mut MappingTable,
        calibrator: &Calibrator,
        sampler: &S,
        elapsed: Duration,
    ) -> CaptureStatus {
        let Some(session) = &mut self.session else {
            return CaptureStatus::Idle;
        };

        if let Some(binding) = detect(session.observed, &self.settings, calibrator, sampler) {
            let (column, action) = (session.column, session.action);
            info!("Captured {} for {:?}/{}", binding.label(), column, action);
            table.column_mut(column).bind(action, binding.clone());
            self.session = None;
            return CaptureStatus::Captured {
                column,
                action,
                binding,
            };
        }

        session.elapsed += elapsed;
        let timeout = self.settings.timeout();
        if session.elapsed < timeout {
            return CaptureStatus::Waiting {
                remaining: timeout - session.elapsed,
            };
        }

        let (column, action) = (session.column, session.action);
        let cleared = session.options.clear_on_timeout;
        if cleared {
            table.column_mut(column).clear(action);
        }
        info!(
            "Rebind of {:?}/{} timed out{}",
            column,
            action,
            if cleared { ", slot cleared" } else { "" }
        );
        self.session = None;
        CaptureStatus::TimedOut {
            column,
            action,
            cleared,
        }
    }
}

// Reihenfolge: Tastatur/Maus, Achsen, Knöpfe. Gerät 0 wird nie belegt.
fn detect<S: RawSampler + ?Sized>(
    observed: Option<DigitalInput>,
    settings: &CaptureSettings,
    calibrator: &Calibrator,
    sampler: &S,
) -> Option<Binding> {
    let digital = observed.or_else(|| {
        DigitalInput::keys_and_mouse().find(|input| sampler.digital_just_pressed(*input))
    });
    if let Some(input) = digital {
        return Some(Binding::Digital(input));
    }

    for address in AxisAddress::concrete() {
        let raw = sampler.axis_raw(address);
        let rest = calibrator.rest(address);
        let travel = travel_from(raw, rest);

        if (raw - rest).abs() > settings.travel && travel.abs() >= settings.magnitude {
            debug!("Axis {} moved to {} (rest {})", address, raw, rest);
            return Some(Binding::Axis(AxisBinding::with_rest(
                address,
                Polarity::of(travel),
                rest,
            )));
        }
    }

    ButtonAddress::concrete()
        .map(DigitalInput::Button)
        .find(|input| sampler.digital_held(*input))
        .map(Binding::Digital)
}

/// Fortschritt einer `RebindSequence`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    Settling(Action),
    Capturing(Action),
    Finished,
}

#[derive(Debug, Clone)]
enum Phase {
    Settling(QuietGate),
    Capturing,
}

/// Belegt mehrere Aktionen einer Spalte nacheinander neu.
///
/// Vor jeder Aktion wartet ein `QuietGate`, bis alles losgelassen ist.
/// Läuft die Zeit ab, wird der Slot geleert und die nächste Aktion folgt.
#[derive(Debug, Clone)]
pub struct RebindSequence {
    column: Column,
    actions: Vec<Action>,
    next: usize,
    phase: Phase,
}

impl RebindSequence {
    pub fn new(column: Column, actions: Vec<Action>) -> Self {
        info!(
            "Starting rebind sequence on {:?} ({} actions)",
            column,
            actions.len()
        );
        Self {
            column,
            actions,
            next: 0,
            phase: Phase::Settling(QuietGate::new()),
        }
    }

    /// Alle Aktionen in Katalogreihenfolge
    pub fn all(column: Column) -> Self {
        Self::new(column, Action::ALL.to_vec())
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn status(&self) -> SequenceStatus {
        match (self.actions.get(self.next), &self.phase) {
            (None, _) => SequenceStatus::Finished,
            (Some(action), Phase::Settling(_)) => SequenceStatus::Settling(*action),
            (Some(action), Phase::Capturing) => SequenceStatus::Capturing(*action),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.actions.len()
    }

    pub fn poll<S: RawSampler + ?Sized>(
        &mut self,
        capture: &mut RebindCapture,
        table: &mut MappingTable,
        calibrator: &mut Calibrator,
        sampler: &S,
        elapsed: Duration,
    ) -> SequenceStatus {
        let Some(action) = self.actions.get(self.next).copied() else {
            return SequenceStatus::Finished;
        };

        match &mut self.phase {
            Phase::Settling(gate) => {
                if gate.poll(calibrator, sampler) {
                    let options = CaptureOptions {
                        clear_on_timeout: true,
                    };
                    if capture.begin(self.column, action, options) {
                        self.phase = Phase::Capturing;
                    }
                }
            }
            Phase::Capturing => {
                if !capture.poll(table, calibrator, sampler, elapsed).is_waiting() {
                    self.advance();
                }
            }
        }

        self.status()
    }

    /// Bricht die laufende Sitzung und alle folgenden Aktionen ab
    pub fn cancel(&mut self, capture: &mut RebindCapture) {
        if matches!(self.phase, Phase::Capturing) {
            capture.cancel();
        }
        info!("Rebind sequence on {:?} canceled", self.column);
        self.next = self.actions.len();
        self.phase = Phase::Settling(QuietGate::new());
    }

    fn advance(&mut self) {
        self.next += 1;
        self.phase = Phase::Settling(QuietGate::new());
        if self.is_finished() {
            info!("Rebind sequence on {:?} finished", self.column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{DeviceSnapshot, Key, MouseButton};

    const FRAME: Duration = Duration::from_millis(16);

    struct Fixture {
        capture: RebindCapture,
        table: MappingTable,
        calibrator: Calibrator,
        snapshot: DeviceSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            let calibrator = Calibrator::new();
            Self {
                capture: RebindCapture::new(CaptureSettings::default()),
                table: MappingTable::with_defaults(&calibrator),
                calibrator,
                snapshot: DeviceSnapshot::new(),
            }
        }

        fn poll(&mut self, elapsed: Duration) -> CaptureStatus {
            let status = self
                .capture
                .poll(&mut self.table, &self.calibrator, &self.snapshot, elapsed);
            self.snapshot.end_frame();
            status
        }

        fn label(&self, column: Column, action: Action) -> Option<String> {
            self.table.column(column).get(action).map(Binding::label)
        }
    }

    #[test]
    fn begin_while_waiting_is_ignored() {
        let mut fx = Fixture::new();
        assert!(fx.capture.begin(Column::PrimaryPad, Action::Accept, CaptureOptions::default()));
        assert!(!fx.capture.begin(Column::KeyboardMouse, Action::Left, CaptureOptions::default()));
        assert_eq!(fx.capture.target(), Some((Column::PrimaryPad, Action::Accept)));
    }

    #[test]
    fn held_key_is_captured_immediately() {
        let mut fx = Fixture::new();
        fx.capture
            .begin(Column::KeyboardMouse, Action::Accept, CaptureOptions::default());
        fx.snapshot.press(DigitalInput::Key(Key::E));

        let status = fx.poll(FRAME);
        assert!(matches!(status, CaptureStatus::Captured { .. }));
        assert!(!fx.capture.is_busy());
        assert_eq!(
            fx.label(Column::KeyboardMouse, Action::Accept).as_deref(),
            Some("Key: E")
        );
    }

    #[test]
    fn observed_input_wins() {
        let mut fx = Fixture::new();
        fx.capture
            .begin(Column::KeyboardMouse, Action::Pause, CaptureOptions::default());
        fx.capture.observe(DigitalInput::Mouse(MouseButton::new(3)));
        fx.snapshot.set_axis(AxisAddress::new(2, 0), 1.0);

        fx.poll(FRAME);
        assert_eq!(
            fx.label(Column::KeyboardMouse, Action::Pause).as_deref(),
            Some("Key: Mouse3")
        );
    }

    #[test]
    fn deliberate_axis_motion_is_captured_with_polarity() {
        let mut fx = Fixture::new();
        fx.capture
            .begin(Column::SecondaryPad, Action::CameraUp, CaptureOptions::default());

        fx.snapshot.set_axis(AxisAddress::new(2, 4), -0.5);
        assert!(fx.poll(FRAME).is_waiting());

        fx.snapshot.set_axis(AxisAddress::new(2, 4), -0.85);
        let status = fx.poll(FRAME);
        let CaptureStatus::Captured { binding, .. } = &status else {
            panic!("expected capture, got {:?}", status);
        };
        assert_eq!(
            *binding,
            Binding::Axis(AxisBinding::new(AxisAddress::new(2, 4), Polarity::Negative))
        );
    }

    #[test]
    fn full_travel_from_a_high_rest_is_not_enough() {
        let mut fx = Fixture::new();
        let trigger = AxisAddress::new(2, 5);
        fx.snapshot.set_axis(trigger, 0.8);
        for _ in 0..12 {
            fx.calibrator.sample(&fx.snapshot, false);
        }
        assert!((fx.calibrator.rest(trigger) - 0.8).abs() < 1e-3);

        fx.capture
            .begin(Column::PrimaryPad, Action::Accept, CaptureOptions::default());
        // travel 1.0 but only 0.2 away from rest
        fx.snapshot.set_axis(trigger, 1.0);
        assert!(fx.poll(FRAME).is_waiting());
        assert_eq!(
            fx.label(Column::PrimaryPad, Action::Accept).as_deref(),
            Some("joystick 0 button 0")
        );
    }

    #[test]
    fn virtual_device_is_never_captured() {
        let mut fx = Fixture::new();
        fx.capture
            .begin(Column::PrimaryPad, Action::Left, CaptureOptions::default());
        fx.snapshot.set_axis(AxisAddress::new(0, 0), -1.0);
        fx.snapshot
            .press(DigitalInput::Button(ButtonAddress::new(0, 2)));

        assert!(fx.poll(FRAME).is_waiting());

        fx.snapshot
            .press(DigitalInput::Button(ButtonAddress::new(3, 2)));
        fx.poll(FRAME);
        assert_eq!(
            fx.label(Column::PrimaryPad, Action::Left).as_deref(),
            Some("joystick 3 button 2")
        );
    }

    #[test]
    fn timeout_keeps_the_slot_unless_asked_to_clear() {
        let mut fx = Fixture::new();
        fx.capture
            .begin(Column::KeyboardMouse, Action::Left, CaptureOptions::default());
        assert!(fx.poll(Duration::from_millis(3999)).is_waiting());
        assert!(matches!(
            fx.poll(Duration::from_millis(1)),
            CaptureStatus::TimedOut { cleared: false, .. }
        ));
        assert_eq!(
            fx.label(Column::KeyboardMouse, Action::Left).as_deref(),
            Some("Key: A")
        );

        fx.capture.begin(
            Column::KeyboardMouse,
            Action::Left,
            CaptureOptions {
                clear_on_timeout: true,
            },
        );
        assert!(matches!(
            fx.poll(Duration::from_secs(5)),
            CaptureStatus::TimedOut { cleared: true, .. }
        ));
        assert_eq!(fx.label(Column::KeyboardMouse, Action::Left), None);
    }

    #[test]
    fn cancel_leaves_the_slot_alone() {
        let mut fx = Fixture::new();
        assert_eq!(fx.capture.cancel(), CaptureStatus::Idle);

        fx.capture
            .begin(Column::KeyboardMouse, Action::Right, CaptureOptions::default());
        assert!(matches!(fx.capture.cancel(), CaptureStatus::Canceled { .. }));
        assert!(!fx.capture.is_busy());

        fx.snapshot.press(DigitalInput::Key(Key::Q));
        assert_eq!(fx.poll(FRAME), CaptureStatus::Idle);
        assert_eq!(
            fx.label(Column::KeyboardMouse, Action::Right).as_deref(),
            Some("Key: D")
        );
    }

    #[test]
    fn sequence_waits_for_release_between_actions() {
        let mut fx = Fixture::new();
        let mut sequence =
            RebindSequence::new(Column::KeyboardMouse, vec![Action::Left, Action::Right]);
        let poll = |fx: &mut Fixture, sequence: &mut RebindSequence| {
            let status = sequence.poll(
                &mut fx.capture,
                &mut fx.table,
                &mut fx.calibrator,
                &fx.snapshot,
                FRAME,
            );
            fx.snapshot.end_frame();
            status
        };

        for _ in 0..3 {
            assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Settling(Action::Left));
        }
        assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Capturing(Action::Left));

        fx.snapshot.press(DigitalInput::Key(Key::J));
        assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Settling(Action::Right));

        // J is still held, the gate stays closed
        for _ in 0..5 {
            assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Settling(Action::Right));
        }
        fx.snapshot.release(DigitalInput::Key(Key::J));
        assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Capturing(Action::Right));

        fx.snapshot.press(DigitalInput::Key(Key::L));
        assert_eq!(poll(&mut fx, &mut sequence), SequenceStatus::Finished);

        assert_eq!(fx.label(Column::KeyboardMouse, Action::Left).as_deref(), Some("Key: J"));
        assert_eq!(fx.label(Column::KeyboardMouse, Action::Right).as_deref(), Some("Key: L"));
    }

    #[test]
    fn canceled_sequence_stops() {
        let mut fx = Fixture::new();
        let mut sequence = RebindSequence::all(Column::PrimaryPad);
        for _ in 0..4 {
            sequence.poll(
                &mut fx.capture,
                &mut fx.table,
                &mut fx.calibrator,
                &fx.snapshot,
                FRAME,
            );
        }
        assert!(fx.capture.is_busy());

        sequence.cancel(&mut fx.capture);
        assert!(!fx.capture.is_busy());
        assert_eq!(sequence.status(), SequenceStatus::Finished);
    }
}
