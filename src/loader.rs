//! Bulk loading of table rows into the vector store.

use crate::dataset::Table;
use crate::error::{Error, Result};
use crate::store::{Record, VectorStore};
use crate::vector::build_vector;

/// Build one record per row and submit them in a single bulk insert.
///
/// The whole table goes in one call to bound network overhead. There is no
/// transactional guarantee: records the store already acknowledged before a
/// failure stay inserted.
pub async fn load<S: VectorStore + ?Sized>(
    store: &S,
    collection: &str,
    table: &Table,
    value_columns: &[String],
) -> Result<usize> {
    let mut records = Vec::with_capacity(table.row_count());
    for row in table.rows() {
        let vector = build_vector(&row, value_columns)?;
        records.push(Record {
            properties: row.properties(),
            vector,
        });
    }

    let count = records.len();
    store
        .insert_many(collection, records)
        .await
        .map_err(|e| Error::Insertion(Box::new(e)))?;
    tracing::info!(collection, rows = count, "bulk insert complete");
    Ok(count)
}
