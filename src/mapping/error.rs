//! Fehlerdefinitionen für das Mapping-Modul

use thiserror::Error;

use crate::config::SettingsError;
use crate::controller::SamplerError;
use crate::persistence::{FormatError, StoreError};

/// Fehlertypen des Remappers
#[derive(Debug, Error)]
pub enum RemapError {
    /// Spaltenindex außerhalb von 0..3
    #[error("Ungültige Eingabespalte: {0}")]
    InvalidColumnIndex(usize),

    /// Aktionsindex außerhalb des Aktionskatalogs
    #[error("Ungültige Aktion: {0}")]
    InvalidActionIndex(usize),

    /// Gespeicherte Belegung konnte nicht gelesen werden
    #[error("Formatfehler: {0}")]
    Format(#[from] FormatError),

    #[error("Speicherfehler: {0}")]
    Store(#[from] StoreError),

    #[error("Einstellungsfehler: {0}")]
    Settings(#[from] SettingsError),

    #[error("Gerätefehler: {0}")]
    Sampler(#[from] SamplerError),
}
