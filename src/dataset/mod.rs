//! Dataset acquisition and tabular adaptation.
//!
//! Split into submodules:
//! - `provider`: resolving a dataset identifier to a local data file
//! - `table`: the typed in-memory table the pipeline works against

mod provider;
mod table;

pub use provider::{DatasetProvider, HttpProvider, LocalProvider};
pub use table::{Column, ColumnData, ColumnRange, Row, Table, Value, ValueKind};
