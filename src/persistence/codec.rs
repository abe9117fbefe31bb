//! Text format of one mapping column
//!
//! A column is a JSON array with exactly one object per action, in catalog
//! order. `{}` marks an absent slot. Other objects carry:
//!
//! ```text
//! { "input": "joystick 1 axis 3", "key": "", "polarity": "positive",
//!   "digital": false, "label": "joystick 1 axis 3 +", "rest": 0.012 }
//! ```
//!
//! `input` holds gamepad addresses, `key` holds keyboard and mouse ids.
//! `label` is written for humans and ignored when reading.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::controller::{AxisAddress, ButtonAddress, DigitalInput};
use crate::mapping::{Action, AxisBinding, Binding, MappingColumn, Polarity};

// Format errors
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected {expected} binding records, found {found}")]
    RecordCount { expected: usize, found: usize },

    #[error("malformed binding list: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("invalid record for {action}: {reason}")]
    Field { action: Action, reason: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Record {
    input: Option<String>,
    key: Option<String>,
    polarity: Option<String>,
    digital: Option<bool>,
    label: Option<String>,
    rest: Option<f64>,
}

impl Record {
    fn is_empty(&self) -> bool {
        self.input.is_none()
            && self.key.is_none()
            && self.polarity.is_none()
            && self.digital.is_none()
            && self.label.is_none()
            && self.rest.is_none()
    }
}

fn round_rest(rest: f32) -> f64 {
    (f64::from(rest) * 1000.0).round() / 1000.0
}

fn encode_binding(binding: &Binding) -> Value {
    let label = binding.label();
    match binding {
        Binding::Digital(input @ (DigitalInput::Key(_) | DigitalInput::Mouse(_))) => json!({
            "input": "",
            "key": input.to_string(),
            "polarity": Polarity::Raw.tag(),
            "digital": true,
            "label": label,
            "rest": 0.0,
        }),
        Binding::Digital(input) => json!({
            "input": input.to_string(),
            "key": "",
            "polarity": Polarity::Raw.tag(),
            "digital": true,
            "label": label,
            "rest": 0.0,
        }),
        Binding::Axis(axis) => json!({
            "input": axis.address().to_string(),
            "key": "",
            "polarity": axis.polarity().tag(),
            "digital": false,
            "label": label,
            "rest": round_rest(axis.rest()),
        }),
    }
}

/// Encodes every slot of `column`, in action order
pub fn encode_column(column: &MappingColumn) -> String {
    let records: Vec<Value> = column
        .iter()
        .map(|(_, binding)| binding.map_or_else(|| json!({}), encode_binding))
        .collect();
    Value::Array(records).to_string()
}

fn decode_record(action: Action, record: Record) -> Result<Option<Binding>, FormatError> {
    if record.is_empty() {
        return Ok(None);
    }

    let field = |reason: String| FormatError::Field { action, reason };
    let digital = record
        .digital
        .ok_or_else(|| field("missing 'digital'".to_string()))?;
    let key = record.key.unwrap_or_default();
    let input = record.input.unwrap_or_default();

    if digital {
        let source = if !key.is_empty() {
            DigitalInput::from_key_id(&key)
        } else {
            input.parse::<ButtonAddress>().map(DigitalInput::Button)
        };
        return source
            .map(|input| Some(Binding::Digital(input)))
            .map_err(|e| field(e.to_string()));
    }

    let address = input
        .parse::<AxisAddress>()
        .map_err(|e| field(e.to_string()))?;
    let polarity = record
        .polarity
        .as_deref()
        .unwrap_or_default()
        .parse::<Polarity>()
        .map_err(field)?;
    let rest = record.rest.unwrap_or(0.0);
    if !rest.is_finite() || !(-1.0..=1.0).contains(&rest) {
        return Err(field(format!("rest value {} out of range", rest)));
    }

    Ok(Some(Binding::Axis(AxisBinding::with_rest(
        address,
        polarity,
        rest as f32,
    ))))
}

/// Decodes a full column. Nothing is returned unless every record is valid.
pub fn decode_column(text: &str) -> Result<MappingColumn, FormatError> {
    let records: Vec<Record> = serde_json::from_str(text)?;
    if records.len() != Action::COUNT {
        return Err(FormatError::RecordCount {
            expected: Action::COUNT,
            found: records.len(),
        });
    }

    let mut slots: [Option<Arc<Binding>>; Action::COUNT] = Default::default();
    for ((slot, action), record) in slots.iter_mut().zip(Action::ALL).zip(records) {
        *slot = decode_record(action, record)?.map(Arc::new);
    }
    Ok(MappingColumn::from_slots(slots))
}
