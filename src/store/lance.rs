//! LanceDB implementation of the vector-store boundary.

use std::sync::Arc;

use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Float64Array, Int64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use futures_util::TryStreamExt;
use lancedb::arrow::SendableRecordBatchStream;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table as LanceTable};

use crate::dataset::{Value, ValueKind};
use crate::error::{Error, Result};

use super::{CollectionSchema, QueryHit, Record, VectorStore, COLUMN_DISTANCE, COLUMN_VECTOR};

pub struct LanceStore {
    conn: Connection,
}

impl LanceStore {
    pub async fn connect(uri: &str) -> Result<Self> {
        let conn = connect(uri).execute().await.map_err(|e| Error::store(e))?;
        tracing::info!(uri, "connected to lancedb");
        Ok(Self { conn })
    }

    async fn open(&self, name: &str) -> Result<LanceTable> {
        self.conn
            .open_table(name)
            .execute()
            .await
            .map_err(|e| Error::store(e))
    }
}

#[async_trait::async_trait]
impl VectorStore for LanceStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let names = self
            .conn
            .table_names()
            .execute()
            .await
            .map_err(|e| Error::store(e))?;
        Ok(names.iter().any(|n| n == name))
    }

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        let schema = arrow_schema(schema)?;
        self.conn
            .create_empty_table(name, schema)
            .execute()
            .await
            .map_err(|e| Error::store(e))?;
        tracing::info!(collection = name, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.conn
            .drop_table(name)
            .await
            .map_err(|e| Error::store(e))?;
        tracing::info!(collection = name, "deleted collection");
        Ok(())
    }

    async fn insert_many(&self, name: &str, records: Vec<Record>) -> Result<()> {
        let table = self.open(name).await?;
        let schema = table.schema().await.map_err(|e| Error::store(e))?;
        let batch = build_record_batch(schema.clone(), &records)?;
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(batches)
            .execute()
            .await
            .map_err(|e| Error::store(e))?;
        Ok(())
    }

    async fn count(&self, name: &str) -> Result<usize> {
        self.open(name)
            .await?
            .count_rows(None)
            .await
            .map_err(|e| Error::store(e))
    }

    async fn nearest_vector(
        &self,
        name: &str,
        vector: &[f64],
        limit: usize,
    ) -> Result<Vec<QueryHit>> {
        let table = self.open(name).await?;
        let query_vector: Vec<f32> = vector.iter().map(|v| *v as f32).collect();
        let stream = table
            .query()
            .nearest_to(query_vector)
            .map_err(|e| Error::store(e))?
            .column(COLUMN_VECTOR)
            .distance_type(DistanceType::L2)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| Error::store(e))?;
        collect_query_hits(stream).await
    }

    async fn close(&self) -> Result<()> {
        // LanceDB connections release their resources on drop; there is
        // nothing to flush, but the call marks the end of store usage.
        tracing::debug!("closing lancedb connection");
        Ok(())
    }
}

fn arrow_schema(schema: &CollectionSchema) -> Result<SchemaRef> {
    let dim = i32::try_from(schema.vector_dim)
        .map_err(|_| Error::DataFormat("vector dimension overflow".to_string()))?;

    let mut fields = Vec::with_capacity(schema.columns.len() + 1);
    for (name, kind) in &schema.columns {
        let data_type = match kind {
            ValueKind::Int => DataType::Int64,
            ValueKind::Float => DataType::Float64,
            ValueKind::Text => DataType::Utf8,
        };
        fields.push(Field::new(name, data_type, true));
    }
    fields.push(Field::new(
        COLUMN_VECTOR,
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
        false,
    ));
    Ok(Arc::new(Schema::new(fields)))
}

fn build_record_batch(schema: SchemaRef, records: &[Record]) -> Result<RecordBatch> {
    let dim = match schema
        .field_with_name(COLUMN_VECTOR)
        .map_err(|e| Error::store(e))?
        .data_type()
    {
        DataType::FixedSizeList(_, size) => *size as usize,
        _ => return Err(Error::store("vector column is not a fixed size list")),
    };

    let mut arrays: Vec<Arc<dyn Array>> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        if field.name() == COLUMN_VECTOR {
            arrays.push(Arc::new(build_vector_column(records, dim)?));
            continue;
        }
        let name = field.name().as_str();
        let array: Arc<dyn Array> = match field.data_type() {
            DataType::Int64 => Arc::new(Int64Array::from_iter(
                records.iter().map(|r| r.property(name).and_then(|v| v.as_i64())),
            )),
            DataType::Float64 => Arc::new(Float64Array::from_iter(
                records.iter().map(|r| r.property(name).and_then(|v| v.as_f64())),
            )),
            DataType::Utf8 => Arc::new(StringArray::from_iter(
                records.iter().map(|r| r.property(name).map(|v| v.to_string())),
            )),
            other => {
                return Err(Error::DataFormat(format!(
                    "unsupported column type {other} for column {name}"
                )))
            }
        };
        arrays.push(array);
    }

    RecordBatch::try_new(schema, arrays).map_err(|e| Error::store(e))
}

fn build_vector_column(records: &[Record], dim: usize) -> Result<FixedSizeListArray> {
    let mut builder = FixedSizeListBuilder::with_capacity(
        Float32Builder::with_capacity(records.len() * dim),
        dim as i32,
        records.len(),
    );

    for record in records {
        if record.vector.len() != dim {
            return Err(Error::DataFormat(format!(
                "vector size mismatch: expected {dim}, got {}",
                record.vector.len()
            )));
        }
        for v in &record.vector {
            builder.values().append_value(*v as f32);
        }
        builder.append(true);
    }

    Ok(builder.finish())
}

async fn collect_query_hits(mut stream: SendableRecordBatchStream) -> Result<Vec<QueryHit>> {
    let mut hits = Vec::new();
    while let Some(batch) = stream.try_next().await.map_err(|e| Error::store(e))? {
        if batch.num_rows() == 0 {
            continue;
        }
        decode_batch(&batch, &mut hits)?;
    }
    Ok(hits)
}

fn decode_batch(batch: &RecordBatch, hits: &mut Vec<QueryHit>) -> Result<()> {
    let distances = batch
        .column_by_name(COLUMN_DISTANCE)
        .ok_or_else(|| Error::store("query result missing _distance column"))?
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| Error::store("_distance column type mismatch"))?;

    let schema = batch.schema();
    for row_idx in 0..batch.num_rows() {
        let mut properties = Vec::new();
        for (col_idx, field) in schema.fields().iter().enumerate() {
            if field.name() == COLUMN_VECTOR || field.name() == COLUMN_DISTANCE {
                continue;
            }
            let column = batch.column(col_idx);
            if column.is_null(row_idx) {
                continue;
            }
            let value = match field.data_type() {
                DataType::Int64 => column
                    .as_any()
                    .downcast_ref::<Int64Array>()
                    .map(|a| Value::Int(a.value(row_idx))),
                DataType::Float64 => column
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .map(|a| Value::Float(a.value(row_idx))),
                DataType::Utf8 => column
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .map(|a| Value::Text(a.value(row_idx).to_string())),
                // Internal columns (_rowid etc.) are not part of the record.
                _ => None,
            };
            if let Some(value) = value {
                properties.push((field.name().clone(), value));
            }
        }
        hits.push(QueryHit {
            properties,
            distance: f64::from(distances.value(row_idx)),
        });
    }
    Ok(())
}
