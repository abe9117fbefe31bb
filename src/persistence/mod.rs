//! # Persistence Module
//!
//! Saves and restores the three mapping columns.
//!
//! ## Key Abstractions
//! - **Codec**: one column becomes one string. The encoding is positional:
//!   record `n` belongs to action `n`, so a string with the wrong number of
//!   records is rejected as a whole.
//! - **Store**: a key/value string store (`BindingStore`). Each column lives
//!   under its own key, see [`column_key`].
//!
//! ## Error Handling Strategy
//! Decoding never applies half a column. Callers fall back to the column's
//! defaults on any `FormatError`; saving is best-effort.

pub mod codec;
pub mod store;

pub use codec::{decode_column, encode_column, FormatError};
pub use store::{BindingStore, MemoryStore, StoreError, TomlFileStore, BINDINGS_FILE};

use crate::mapping::Column;

/// Store key of one column, e.g. `bindings.column.1`
pub fn column_key(column: Column) -> String {
    format!("bindings.column.{}", column.index())
}
