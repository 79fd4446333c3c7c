//! Vector construction.
//!
//! Vectors are plain `Vec<f64>` in value-column order. The same ordered
//! column list must be used at load time and query time; both entry points
//! here take it explicitly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::{ColumnRange, Row, Value};
use crate::error::{Error, Result};

/// Project a row onto `columns`, in the given order.
pub fn build_vector(row: &Row<'_>, columns: &[String]) -> Result<Vec<f64>> {
    columns
        .iter()
        .map(|name| {
            let value = row.get(name).ok_or_else(|| Error::MissingField {
                column: name.clone(),
            })?;
            numeric(name, &value)
        })
        .collect()
}

/// Draw one value per range, independently and uniformly.
///
/// Integer ranges draw inclusively, float ranges uniformly over [min, max],
/// categorical ranges pick one of the observed distinct values. Callers own
/// the RNG, so tests can pass a seeded one.
pub fn build_random_vector<R: Rng>(
    ranges: &[(String, ColumnRange)],
    rng: &mut R,
) -> Result<Vec<f64>> {
    ranges
        .iter()
        .map(|(name, range)| match range {
            ColumnRange::Int { min, max } => Ok(rng.gen_range(*min..=*max) as f64),
            ColumnRange::Float { min, max } => Ok(rng.gen_range(*min..=*max)),
            ColumnRange::Categorical(values) => {
                let value = values.choose(rng).ok_or_else(|| {
                    Error::DataFormat(format!("column {name} has no observed values"))
                })?;
                numeric(name, value)
            }
        })
        .collect()
}

fn numeric(column: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        Error::DataFormat(format!(
            "non-numeric value {value} cannot enter the vector for column {column}"
        ))
    })
}
