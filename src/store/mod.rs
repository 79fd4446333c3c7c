//! Vector-store boundary.
//!
//! The pipeline only ever talks to the store through [`VectorStore`]:
//! collection CRUD, one bulk insert, nearest-vector queries, and an
//! aggregate count. `lance` implements it against LanceDB; tests use an
//! in-memory mock.

mod lance;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

pub use lance::LanceStore;

use crate::dataset::{Table, Value, ValueKind};
use crate::error::{Error, Result};

// Column names reserved by the store layer.
pub(crate) const COLUMN_VECTOR: &str = "vector";
pub(crate) const COLUMN_DISTANCE: &str = "_distance";

/// One insert unit: the full row as metadata plus its caller-supplied vector.
#[derive(Debug, Clone)]
pub struct Record {
    pub properties: Vec<(String, Value)>,
    pub vector: Vec<f64>,
}

impl Record {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// One nearest-vector query result, distance included.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub properties: Vec<(String, Value)>,
    pub distance: f64,
}

impl QueryHit {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Property layout for a collection to be created.
///
/// Collections created through this layout accept externally supplied
/// vectors only; the store never computes its own.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub columns: Vec<(String, ValueKind)>,
    pub vector_dim: usize,
}

impl CollectionSchema {
    pub fn from_table(table: &Table, vector_dim: usize) -> Result<Self> {
        for name in table.column_names() {
            if name == COLUMN_VECTOR || name == COLUMN_DISTANCE {
                return Err(Error::DataFormat(format!(
                    "column name {name} is reserved by the vector store"
                )));
            }
        }
        Ok(Self {
            columns: table
                .columns()
                .map(|c| (c.name.clone(), c.kind()))
                .collect(),
            vector_dim,
        })
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()>;

    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Submit all records in one bulk call.
    async fn insert_many(&self, name: &str, records: Vec<Record>) -> Result<()>;

    async fn count(&self, name: &str) -> Result<usize>;

    /// Distance-ranked nearest-vector query, closest first.
    async fn nearest_vector(
        &self,
        name: &str,
        vector: &[f64],
        limit: usize,
    ) -> Result<Vec<QueryHit>>;

    /// Release the connection. Called exactly once per pipeline run.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::dataset::Column;

    use super::*;

    #[test]
    fn schema_from_table_carries_column_kinds() {
        let table = Table::from_columns(vec![
            Column::int("N", vec![Some(1)]),
            Column::float("ph", vec![Some(6.5)]),
            Column::text("label", vec![Some("rice".to_string())]),
        ])
        .unwrap();

        let schema = CollectionSchema::from_table(&table, 2).unwrap();
        assert_eq!(schema.vector_dim, 2);
        assert_eq!(
            schema.columns,
            vec![
                ("N".to_string(), ValueKind::Int),
                ("ph".to_string(), ValueKind::Float),
                ("label".to_string(), ValueKind::Text),
            ]
        );
    }

    #[test]
    fn reserved_column_names_are_rejected() {
        let table = Table::from_columns(vec![Column::int("vector", vec![Some(1)])]).unwrap();
        let err = CollectionSchema::from_table(&table, 1).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }
}
