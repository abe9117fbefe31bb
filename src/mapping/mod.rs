//! Modul für die Abbildung physischer Eingaben auf logische Aktionen.
//!
//! Drei parallele Belegungsspalten (Tastatur/Maus, erstes Pad, zweites Pad)
//! ordnen jeder Aktion höchstens eine Quelle zu. Der `Resolver` führt die
//! Spalten pro Frame zusammen, `RebindCapture` belegt Zellen interaktiv neu
//! und `InputRemapper` bündelt alles hinter einer Fassade.

pub mod action;
pub mod binding;
pub mod capture;
pub mod column;
pub mod error;
pub mod manager;
pub mod resolver;

// Re-exports für einfacheren Zugriff
pub use action::Action;
pub use binding::{AxisBinding, Binding, Polarity};
pub use capture::{CaptureOptions, CaptureStatus, RebindCapture, RebindSequence, SequenceStatus};
pub use column::{Column, MappingColumn, MappingTable};
pub use error::RemapError;
pub use manager::{FrameReport, InputRemapper, MENU_THRESHOLD};
pub use resolver::{Resolver, BUTTON_THRESHOLD};
