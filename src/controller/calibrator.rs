//! Rest-point estimation for every axis in the address space
//!
//! Some pads do not rest at 0.0 (a few report 0.5 untouched and travel over
//! [0.0, 1.0]). The calibrator keeps an exponential moving average of every
//! axis and reports whether the whole table has stopped moving.
//!
//! # Calibration flow
//!
//! ```text
//! AwaitingPress ──(any input held)──► Training ──(stable, released, min polls)──► Finished
//! ```
//!
//! Callers must sample for a few consecutive polls before `trained` means
//! anything. [`QuietGate`] and [`CalibrationFlow`] encode that contract.

use tracing::{debug, info};

use crate::controller::sampler::{AxisAddress, RawSampler, AXES_PER_DEVICE, DEVICE_COUNT};

/// Weight of the newest sample in the moving average
const SAMPLE_WEIGHT: f32 = 0.75;
/// Largest per-poll change an axis may show and still count as stable
const STABLE_EPSILON: f32 = 0.05;
/// Polls a quiet gate waits before it may open
const QUIET_POLLS: u32 = 3;

/// Smoothed rest value per (device, axis) pair
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    /// `None` until the first sample after a reset
    rest: Option<Vec<f32>>,
    trained: bool,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every estimate; the next samples rebuild the table from zero.
    pub fn reset(&mut self) {
        debug!("Resetting axis calibration");
        self.rest = None;
        self.trained = false;
    }

    /// Samples every axis once and folds it into the rest estimates.
    ///
    /// The virtual device 0 is skipped unless `include_virtual` is set.
    /// Returns true when no sampled axis moved more than the stability
    /// epsilon away from its previous estimate.
    pub fn sample<S: RawSampler + ?Sized>(&mut self, sampler: &S, include_virtual: bool) -> bool {
        let rest = self
            .rest
            .get_or_insert_with(|| vec![0.0; DEVICE_COUNT * AXES_PER_DEVICE]);

        let mut stable = true;
        for address in AxisAddress::all() {
            if address.is_virtual() && !include_virtual {
                continue;
            }

            let current = sampler.axis_raw(address);
            let estimate = &mut rest[address.index()];
            let diff = (*estimate - current).abs();

            *estimate = current * SAMPLE_WEIGHT + *estimate * (1.0 - SAMPLE_WEIGHT);
            stable = stable && diff < STABLE_EPSILON;
        }

        self.trained = stable;
        stable
    }

    /// Current rest estimate, 0.0 while nothing was sampled
    pub fn rest(&self, address: AxisAddress) -> f32 {
        self.rest
            .as_ref()
            .map_or(0.0, |rest| rest[address.index()])
    }

    /// Result of the most recent `sample`
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn has_estimates(&self) -> bool {
        self.rest.is_some()
    }
}

/// Waits until nothing is pressed and every concrete axis rests.
///
/// Run before each capture so the input that opened the rebind is not
/// captured itself.
#[derive(Debug, Clone)]
pub struct QuietGate {
    remaining: u32,
}

impl Default for QuietGate {
    fn default() -> Self {
        Self {
            remaining: QUIET_POLLS,
        }
    }
}

impl QuietGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the gate is open
    pub fn poll<S: RawSampler + ?Sized>(&mut self, calibrator: &mut Calibrator, sampler: &S) -> bool {
        let stable = calibrator.sample(sampler, false);
        if !stable || sampler.any_digital_held() || self.remaining > 0 {
            self.remaining = self.remaining.saturating_sub(1);
            return false;
        }
        true
    }
}

/// Progress of a [`CalibrationFlow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    AwaitingPress,
    Training,
    Finished,
}

/// Full recalibration: reset, wait for a press, train until quiet.
#[derive(Debug, Clone)]
pub struct CalibrationFlow {
    status: CalibrationStatus,
    min_polls: u32,
    remaining: u32,
}

impl CalibrationFlow {
    /// Resets the calibrator and starts waiting for the first press.
    pub fn start(calibrator: &mut Calibrator, min_polls: u32) -> Self {
        info!("Starting axis calibration (min {} polls)", min_polls);
        calibrator.reset();
        Self {
            status: CalibrationStatus::AwaitingPress,
            min_polls,
            remaining: min_polls,
        }
    }

    pub fn status(&self) -> CalibrationStatus {
        self.status
    }

    pub fn poll<S: RawSampler + ?Sized>(
        &mut self,
        calibrator: &mut Calibrator,
        sampler: &S,
    ) -> CalibrationStatus {
        if self.status == CalibrationStatus::AwaitingPress {
            if !sampler.any_digital_held() {
                return self.status;
            }
            debug!("Input detected, training axes");
            self.status = CalibrationStatus::Training;
            self.remaining = self.min_polls;
        }

        if self.status == CalibrationStatus::Training {
            let stable = calibrator.sample(sampler, true);
            if !stable || sampler.any_digital_held() || self.remaining > 0 {
                self.remaining = self.remaining.saturating_sub(1);
            } else {
                info!("Axis calibration finished");
                self.status = CalibrationStatus::Finished;
            }
        }

        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::sampler::{DigitalInput, Key};
    use crate::controller::snapshot::DeviceSnapshot;

    #[test]
    fn constant_input_converges_and_trains() {
        let mut snapshot = DeviceSnapshot::new();
        let address = AxisAddress::new(1, 2);
        snapshot.set_axis(address, 0.5);

        let mut calibrator = Calibrator::new();
        let results: Vec<bool> = (0..10).map(|_| calibrator.sample(&snapshot, false)).collect();

        // diffs: 0.5, 0.125, 0.03125, ...
        assert_eq!(&results[..3], &[false, false, true]);
        assert!(results[3..].iter().all(|trained| *trained));
        assert!((calibrator.rest(address) - 0.5).abs() < 1e-4);
        assert!(calibrator.is_trained());
    }

    #[test]
    fn resting_at_zero_is_trained_immediately() {
        let snapshot = DeviceSnapshot::new();
        let mut calibrator = Calibrator::new();
        assert!(calibrator.sample(&snapshot, true));
    }

    #[test]
    fn virtual_device_is_skipped_unless_requested() {
        let mut snapshot = DeviceSnapshot::new();
        let any = AxisAddress::new(0, 0);
        snapshot.set_axis(any, 0.8);

        let mut calibrator = Calibrator::new();
        assert!(calibrator.sample(&snapshot, false));
        assert_eq!(calibrator.rest(any), 0.0);

        assert!(!calibrator.sample(&snapshot, true));
        assert!((calibrator.rest(any) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn reset_discards_estimates() {
        let mut snapshot = DeviceSnapshot::new();
        let address = AxisAddress::new(4, 0);
        snapshot.set_axis(address, -0.4);

        let mut calibrator = Calibrator::new();
        for _ in 0..6 {
            calibrator.sample(&snapshot, false);
        }
        assert!(calibrator.rest(address) < -0.39);

        calibrator.reset();
        assert!(!calibrator.has_estimates());
        assert!(!calibrator.is_trained());
        assert_eq!(calibrator.rest(address), 0.0);
    }

    #[test]
    fn quiet_gate_waits_for_release_and_minimum_polls() {
        let mut snapshot = DeviceSnapshot::new();
        let key = DigitalInput::Key(Key::Return);
        snapshot.press(key);

        let mut calibrator = Calibrator::new();
        let mut gate = QuietGate::new();
        for _ in 0..5 {
            assert!(!gate.poll(&mut calibrator, &snapshot));
        }

        snapshot.release(key);
        assert!(gate.poll(&mut calibrator, &snapshot));
    }

    #[test]
    fn calibration_flow_waits_for_press_then_trains() {
        let mut snapshot = DeviceSnapshot::new();
        let any_x = AxisAddress::new(0, 0);
        snapshot.set_axis(any_x, 0.5);

        let mut calibrator = Calibrator::new();
        let mut flow = CalibrationFlow::start(&mut calibrator, 5);

        for _ in 0..3 {
            assert_eq!(
                flow.poll(&mut calibrator, &snapshot),
                CalibrationStatus::AwaitingPress
            );
        }
        assert!(!calibrator.has_estimates());

        let key = DigitalInput::Key(Key::Space);
        snapshot.press(key);
        assert_eq!(
            flow.poll(&mut calibrator, &snapshot),
            CalibrationStatus::Training
        );
        snapshot.release(key);

        let mut polls = 0;
        while flow.poll(&mut calibrator, &snapshot) != CalibrationStatus::Finished {
            polls += 1;
            assert!(polls < 20, "calibration never finished");
        }
        assert!((calibrator.rest(any_x) - 0.5).abs() < 0.01);
    }
}
