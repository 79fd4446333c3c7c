//! Tabular dataset adapter.
//!
//! Reads a CSV file into a typed columnar model via arrow-csv schema
//! inference and exposes the views the rest of the pipeline needs: ordered
//! column names, per-column value ranges, and row iteration.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_csv::reader::Format;
use arrow_csv::ReaderBuilder;
use arrow_schema::DataType;
use serde::Serialize;

use crate::error::{Error, Result};

/// A single cell value taken from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(_) | Value::Text(_) => None,
        }
    }

    /// Numeric view used when the value enters a vector. Text never coerces.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// Inferred column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Text,
}

/// Column payload; a `None` cell means the value is absent from that row.
#[derive(Debug, Clone)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn int(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Int(values),
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Float(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self.data {
            ColumnData::Int(_) => ValueKind::Int,
            ColumnData::Float(_) => ValueKind::Float,
            ColumnData::Text(_) => ValueKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, idx: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Int(v) => v.get(idx).copied().flatten().map(Value::Int),
            ColumnData::Float(v) => v.get(idx).copied().flatten().map(Value::Float),
            ColumnData::Text(v) => v
                .get(idx)
                .and_then(|cell| cell.clone())
                .map(Value::Text),
        }
    }
}

/// Observed value range for one column, tagged by column type.
///
/// Built once during range analysis; random vector generation matches on the
/// variant instead of re-inspecting column dtypes per draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRange {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    /// Distinct observed values in first-seen order.
    Categorical(Vec<Value>),
}

/// An in-memory table: ordered named columns over a fixed row count.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    idx: usize,
}

impl Row<'_> {
    pub fn get(&self, column: &str) -> Option<Value> {
        self.table.column(column).and_then(|c| c.value(self.idx))
    }

    /// Every present (column, value) pair, label included, in column order.
    pub fn properties(&self) -> Vec<(String, Value)> {
        self.table
            .columns
            .iter()
            .filter_map(|c| c.value(self.idx).map(|v| (c.name.clone(), v)))
            .collect()
    }
}

impl Table {
    /// Build a table from pre-typed columns. Fails on zero rows or ragged
    /// column lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if row_count == 0 {
            return Err(Error::DataFormat("dataset contains no rows".to_string()));
        }
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(Error::DataFormat(
                "columns have mismatched lengths".to_string(),
            ));
        }
        Ok(Self { columns, row_count })
    }

    /// Read a CSV file, inferring per-column types from its contents.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let format = Format::default().with_header(true);
        let (schema, _) = format
            .infer_schema(&mut file, None)
            .map_err(|e| Error::DataFormat(format!("failed to infer csv schema: {e}")))?;
        file.rewind()?;

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(schema.clone())
            .with_format(format)
            .build(BufReader::new(file))
            .map_err(|e| Error::DataFormat(format!("failed to open csv reader: {e}")))?;

        let mut columns: Vec<Column> = schema
            .fields()
            .iter()
            .map(|field| match field.data_type() {
                DataType::Int64 => Ok(Column::int(field.name(), Vec::new())),
                DataType::Float64 => Ok(Column::float(field.name(), Vec::new())),
                DataType::Utf8 => Ok(Column::text(field.name(), Vec::new())),
                other => Err(Error::DataFormat(format!(
                    "unsupported type {other} inferred for column {}",
                    field.name()
                ))),
            })
            .collect::<Result<_>>()?;

        for batch in reader {
            let batch =
                batch.map_err(|e| Error::DataFormat(format!("failed to read csv batch: {e}")))?;
            append_batch(&mut columns, &batch)?;
        }

        Self::from_columns(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row(&self, idx: usize) -> Row<'_> {
        Row { table: self, idx }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.row_count).map(move |idx| Row { table: self, idx })
    }

    /// Column names in original order, minus the label column.
    ///
    /// This list is the single source of vector ordering: it is computed
    /// once and reused for load-time and query-time vector construction.
    pub fn value_columns(&self, label_column: &str) -> Result<Vec<String>> {
        if self.column(label_column).is_none() {
            return Err(Error::ColumnNotFound {
                column: label_column.to_string(),
            });
        }
        Ok(self
            .columns
            .iter()
            .filter(|c| c.name != label_column)
            .map(|c| c.name.clone())
            .collect())
    }

    /// Observed (min, max) per numeric column, distinct value set per
    /// categorical column, in the order given.
    pub fn value_ranges(&self, columns: &[String]) -> Result<Vec<(String, ColumnRange)>> {
        columns
            .iter()
            .map(|name| {
                let column = self.column(name).ok_or_else(|| Error::ColumnNotFound {
                    column: name.clone(),
                })?;
                Ok((name.clone(), column_range(column)?))
            })
            .collect()
    }
}

fn column_range(column: &Column) -> Result<ColumnRange> {
    let empty = || Error::DataFormat(format!("column {} has no values", column.name));
    match &column.data {
        ColumnData::Int(values) => {
            let mut present = values.iter().flatten().copied();
            let first = present.next().ok_or_else(empty)?;
            let (min, max) = present.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            Ok(ColumnRange::Int { min, max })
        }
        ColumnData::Float(values) => {
            let mut present = values.iter().flatten().copied();
            let first = present.next().ok_or_else(empty)?;
            let (min, max) =
                present.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            Ok(ColumnRange::Float { min, max })
        }
        ColumnData::Text(values) => {
            let mut distinct: Vec<Value> = Vec::new();
            for value in values.iter().flatten() {
                let value = Value::Text(value.clone());
                if !distinct.contains(&value) {
                    distinct.push(value);
                }
            }
            if distinct.is_empty() {
                return Err(empty());
            }
            Ok(ColumnRange::Categorical(distinct))
        }
    }
}

fn append_batch(columns: &mut [Column], batch: &RecordBatch) -> Result<()> {
    for (idx, column) in columns.iter_mut().enumerate() {
        let array = batch.column(idx);
        match &mut column.data {
            ColumnData::Int(values) => {
                let array = downcast::<Int64Array>(array, &column.name)?;
                values.extend(array.iter());
            }
            ColumnData::Float(values) => {
                let array = downcast::<Float64Array>(array, &column.name)?;
                values.extend(array.iter());
            }
            ColumnData::Text(values) => {
                let array = downcast::<StringArray>(array, &column.name)?;
                values.extend(array.iter().map(|v| v.map(str::to_string)));
            }
        }
    }
    Ok(())
}

fn downcast<'a, T: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::DataFormat(format!("column {name} type mismatch in csv batch")))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn infers_column_types_from_csv() {
        let (_dir, path) =
            write_csv("N,P,temperature,label\n90,40,20.5,rice\n20,60,18.2,maize\n");
        let table = Table::from_csv_path(&path).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["N", "P", "temperature", "label"]);
        assert_eq!(table.column("N").unwrap().kind(), ValueKind::Int);
        assert_eq!(table.column("temperature").unwrap().kind(), ValueKind::Float);
        assert_eq!(table.column("label").unwrap().kind(), ValueKind::Text);
        assert_eq!(
            table.row(0).get("label"),
            Some(Value::Text("rice".to_string()))
        );
        assert_eq!(table.row(1).get("N"), Some(Value::Int(20)));
    }

    #[test]
    fn empty_csv_is_a_data_format_error() {
        let (_dir, path) = write_csv("N,P,label\n");
        let err = Table::from_csv_path(&path).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)), "got {err:?}");
    }

    #[test]
    fn value_columns_exclude_label_and_keep_order() {
        let (_dir, path) = write_csv("N,P,temperature,label\n90,40,20.5,rice\n");
        let table = Table::from_csv_path(&path).unwrap();

        let columns = table.value_columns("label").unwrap();
        assert_eq!(columns, vec!["N", "P", "temperature"]);
        assert_eq!(columns.len(), table.column_names().len() - 1);
        assert!(!columns.contains(&"label".to_string()));
    }

    #[test]
    fn missing_label_column_is_reported() {
        let (_dir, path) = write_csv("N,P\n1,2\n");
        let table = Table::from_csv_path(&path).unwrap();
        let err = table.value_columns("label").unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { column } if column == "label"));
    }

    #[test]
    fn value_ranges_are_type_tagged() {
        let table = Table::from_columns(vec![
            Column::int("N", vec![Some(90), Some(20), Some(40)]),
            Column::float("ph", vec![Some(6.5), Some(5.1), Some(7.2)]),
            Column::text(
                "soil",
                vec![
                    Some("loam".to_string()),
                    Some("clay".to_string()),
                    Some("loam".to_string()),
                ],
            ),
        ])
        .unwrap();

        let ranges = table
            .value_ranges(&["N".to_string(), "ph".to_string(), "soil".to_string()])
            .unwrap();
        assert_eq!(ranges[0].1, ColumnRange::Int { min: 20, max: 90 });
        assert_eq!(ranges[1].1, ColumnRange::Float { min: 5.1, max: 7.2 });
        assert_eq!(
            ranges[2].1,
            ColumnRange::Categorical(vec![
                Value::Text("loam".to_string()),
                Value::Text("clay".to_string()),
            ])
        );
    }

    #[test]
    fn null_cells_are_absent_from_rows() {
        let table = Table::from_columns(vec![
            Column::int("a", vec![Some(1), None]),
            Column::text("b", vec![Some("x".to_string()), Some("y".to_string())]),
        ])
        .unwrap();

        assert_eq!(table.row(1).get("a"), None);
        let properties = table.row(1).properties();
        assert_eq!(
            properties,
            vec![("b".to_string(), Value::Text("y".to_string()))]
        );
    }
}
