//! Physische Quelle einer Aktion
//!
//! Eine Belegung ist nach dem Anlegen unveränderlich. Neubelegen ersetzt den
//! ganzen Slot (`Arc<Binding>`), Felder werden nie an Ort und Stelle geändert.

use std::fmt;
use std::str::FromStr;

use crate::config::DeadzoneSettings;
use crate::controller::{AxisAddress, DigitalInput, RawSampler};

/// Unterhalb dieses Nenners gilt der Ruhewert als Anschlag
const TRAVEL_EPSILON: f32 = 1e-6;

/// Welche Hälfte einer Achse ausgewertet wird
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
    /// Ganze Achse mit Vorzeichen. Unterhalb des Ruhewerts wird nicht auf 0
    /// gekappt, sondern ein negativer Wert geliefert.
    Raw,
}

impl Polarity {
    /// Kennung im gespeicherten Format
    pub fn tag(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Raw => "raw",
        }
    }

    /// Endung des Anzeigenamens
    pub fn suffix(self) -> &'static str {
        match self {
            Polarity::Positive => " +",
            Polarity::Negative => " -",
            Polarity::Raw => "",
        }
    }

    /// Prüft, ob die Auslenkung in die erlaubte Richtung zeigt
    pub fn accepts(self, travel: f32) -> bool {
        match self {
            Polarity::Positive => travel > 0.0,
            Polarity::Negative => travel < 0.0,
            Polarity::Raw => travel != 0.0,
        }
    }

    /// Polarität einer beobachteten Auslenkung
    pub fn of(travel: f32) -> Self {
        if travel < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Polarity::Positive),
            "negative" => Ok(Polarity::Negative),
            "raw" => Ok(Polarity::Raw),
            other => Err(format!("unknown polarity '{}'", other)),
        }
    }
}

/// Analoge Achse mit Polarität und kalibriertem Ruhewert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBinding {
    address: AxisAddress,
    polarity: Polarity,
    rest: f32,
}

impl AxisBinding {
    pub fn new(address: AxisAddress, polarity: Polarity) -> Self {
        Self::with_rest(address, polarity, 0.0)
    }

    pub fn with_rest(address: AxisAddress, polarity: Polarity, rest: f32) -> Self {
        Self {
            address,
            polarity,
            rest: rest.clamp(-1.0, 1.0),
        }
    }

    pub fn address(&self) -> AxisAddress {
        self.address
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn rest(&self) -> f32 {
        self.rest
    }

    /// Normierte, vorzeichenbehaftete Auslenkung relativ zum Ruhewert.
    ///
    /// Der nutzbare Weg vom Ruhewert bis zum jeweiligen Anschlag wird auf
    /// [0, 1] abgebildet, damit Achsen mit verschobener Ruhelage den vollen
    /// Bereich liefern.
    pub fn travel(&self, raw: f32) -> f32 {
        travel_from(raw, self.rest)
    }

    /// Wert der Belegung für einen Rohwert, inklusive Deadzone
    pub fn value(&self, raw: f32, deadzone: &DeadzoneSettings) -> f32 {
        let travel = self.travel(raw);
        if !self.polarity.accepts(travel) {
            return 0.0;
        }

        let magnitude = deadzone.apply(travel.abs());
        match self.polarity {
            Polarity::Raw => magnitude.copysign(travel),
            Polarity::Positive | Polarity::Negative => magnitude,
        }
    }
}

/// Normierte Auslenkung eines Rohwerts gegenüber `rest`
pub fn travel_from(raw: f32, rest: f32) -> f32 {
    let diff = raw - rest;
    let range = if diff >= 0.0 { 1.0 - rest } else { 1.0 + rest };

    if range <= TRAVEL_EPSILON {
        return if diff == 0.0 { 0.0 } else { diff.signum() };
    }
    (diff / range).clamp(-1.0, 1.0)
}

/// Eine belegte Quelle: digital oder analog
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Digital(DigitalInput),
    Axis(AxisBinding),
}

impl Binding {
    pub fn is_digital(&self) -> bool {
        matches!(self, Binding::Digital(_))
    }

    /// Aktueller Wert in [0, 1], bei `Polarity::Raw` in [-1, 1]
    pub fn value<S: RawSampler + ?Sized>(&self, sampler: &S, deadzone: &DeadzoneSettings) -> f32 {
        match self {
            Binding::Digital(input) => {
                if sampler.digital_held(*input) {
                    1.0
                } else {
                    0.0
                }
            }
            Binding::Axis(axis) => axis.value(sampler.axis_raw(axis.address()), deadzone),
        }
    }

    /// Flankenerkennung, nur für digitale Quellen
    pub fn just_pressed<S: RawSampler + ?Sized>(&self, sampler: &S) -> bool {
        match self {
            Binding::Digital(input) => sampler.digital_just_pressed(*input),
            Binding::Axis(_) => false,
        }
    }

    /// Anzeigename, z.B. "Key: W" oder "joystick 1 axis 3 +"
    pub fn label(&self) -> String {
        match self {
            Binding::Digital(input @ (DigitalInput::Key(_) | DigitalInput::Mouse(_))) => {
                format!("Key: {}", input)
            }
            Binding::Digital(input) => input.to_string(),
            Binding::Axis(axis) => format!("{}{}", axis.address, axis.polarity.suffix()),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ButtonAddress, DeviceSnapshot, Key, MouseButton};
    use rstest::rstest;

    const DEADZONE: DeadzoneSettings = DeadzoneSettings { min: 0.5, max: 1.0 };

    fn axis(polarity: Polarity, rest: f32) -> AxisBinding {
        AxisBinding::with_rest(AxisAddress::new(1, 0), polarity, rest)
    }

    #[rstest]
    #[case(Polarity::Raw, 0.0, 0.5, 0.0)]
    #[case(Polarity::Raw, 0.0, 0.51, 0.51)]
    #[case(Polarity::Raw, 0.0, -0.8, -0.8)]
    #[case(Polarity::Positive, 0.0, -0.9, 0.0)]
    #[case(Polarity::Negative, 0.0, -0.9, 0.9)]
    #[case(Polarity::Negative, 0.0, 0.9, 0.0)]
    #[case(Polarity::Positive, 0.5, 0.9, 0.8)]
    #[case(Polarity::Negative, 0.5, -0.4, 0.6)]
    #[case(Polarity::Positive, 0.0, 1.0, 1.0)]
    fn axis_value(
        #[case] polarity: Polarity,
        #[case] rest: f32,
        #[case] raw: f32,
        #[case] expected: f32,
    ) {
        let value = axis(polarity, rest).value(raw, &DEADZONE);
        assert!(
            (value - expected).abs() < 1e-5,
            "{:?} rest {} raw {} -> {}",
            polarity,
            rest,
            raw,
            value
        );
    }

    #[test]
    fn rest_at_the_end_stop_does_not_divide_by_zero() {
        assert_eq!(travel_from(1.0, 1.0), 0.0);
        assert_eq!(travel_from(-1.0, 1.0), -1.0);
        assert_eq!(travel_from(0.0, -1.0), 0.5);
    }

    #[test]
    fn labels() {
        let key = Binding::Digital(DigitalInput::Key(Key::W));
        let mouse = Binding::Digital(DigitalInput::Mouse(MouseButton::new(1)));
        let button = Binding::Digital(DigitalInput::Button(ButtonAddress::new(1, 0)));
        let stick = Binding::Axis(AxisBinding::new(AxisAddress::new(1, 3), Polarity::Positive));
        let raw = Binding::Axis(AxisBinding::new(AxisAddress::new(2, 3), Polarity::Raw));

        assert_eq!(key.label(), "Key: W");
        assert_eq!(mouse.label(), "Key: Mouse1");
        assert_eq!(button.label(), "joystick 1 button 0");
        assert_eq!(stick.label(), "joystick 1 axis 3 +");
        assert_eq!(raw.to_string(), "joystick 2 axis 3");
    }

    #[test]
    fn axes_never_report_edges() {
        let mut snapshot = DeviceSnapshot::new();
        let address = AxisAddress::new(1, 0);
        snapshot.set_axis(address, 1.0);

        let binding = Binding::Axis(AxisBinding::new(address, Polarity::Positive));
        assert_eq!(binding.value(&snapshot, &DEADZONE), 1.0);
        assert!(!binding.just_pressed(&snapshot));
    }

    #[test]
    fn polarity_tags_parse_back() {
        for polarity in [Polarity::Positive, Polarity::Negative, Polarity::Raw] {
            assert_eq!(polarity.tag().parse::<Polarity>(), Ok(polarity));
        }
        assert!("sideways".parse::<Polarity>().is_err());
    }
}
