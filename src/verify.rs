//! Retrieval verification via nearest-vector queries.

use crate::dataset::Value;
use crate::error::{Error, Result};
use crate::store::VectorStore;

/// The single closest record returned for a verification query.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub properties: Vec<(String, Value)>,
    pub label: String,
    pub distance: f64,
}

impl QueryMatch {
    /// Properties as a JSON object, for diagnostics.
    pub fn properties_json(&self) -> serde_json::Value {
        self.properties
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

/// Query for the `limit` nearest records and return the closest one.
pub async fn nearest<S: VectorStore + ?Sized>(
    store: &S,
    collection: &str,
    vector: &[f64],
    limit: usize,
    label_column: &str,
) -> Result<QueryMatch> {
    let hits = store.nearest_vector(collection, vector, limit).await?;
    let hit = hits.into_iter().next().ok_or_else(|| Error::EmptyResult {
        collection: collection.to_string(),
    })?;

    let label = hit
        .property(label_column)
        .map(|v| v.to_string())
        .ok_or_else(|| Error::MissingField {
            column: label_column.to_string(),
        })?;

    let matched = QueryMatch {
        properties: hit.properties,
        label,
        distance: hit.distance,
    };
    tracing::debug!(
        collection,
        label = %matched.label,
        distance = matched.distance,
        properties = %matched.properties_json(),
        "nearest-vector query"
    );
    Ok(matched)
}

/// Compare the nearest record's label against an expected one.
///
/// A single sample is a sanity check, not a statistical guarantee: when
/// label boundaries sit close together in feature space, one query can pass
/// or fail by chance.
pub async fn verify_known_sample<S: VectorStore + ?Sized>(
    store: &S,
    collection: &str,
    vector: &[f64],
    expected_label: &str,
    label_column: &str,
) -> Result<bool> {
    let matched = nearest(store, collection, vector, 1, label_column).await?;
    let label_matches = matched.label == expected_label;
    tracing::info!(
        collection,
        expected = expected_label,
        obtained = %matched.label,
        distance = matched.distance,
        label_matches,
        "known-sample verification"
    );
    Ok(label_matches)
}

#[cfg(test)]
mod tests {
    use crate::dataset::{Column, Table};
    use crate::loader;
    use crate::store::mock::MockStore;

    use super::*;

    fn crop_table() -> Table {
        Table::from_columns(vec![
            Column::int("N", vec![Some(90), Some(20)]),
            Column::int("P", vec![Some(40), Some(60)]),
            Column::int("K", vec![Some(40), Some(20)]),
            Column::text(
                "label",
                vec![Some("rice".to_string()), Some("maize".to_string())],
            ),
        ])
        .unwrap()
    }

    fn value_columns() -> Vec<String> {
        vec!["N".to_string(), "P".to_string(), "K".to_string()]
    }

    #[tokio::test]
    async fn known_sample_matches_itself_at_distance_zero() {
        let store = MockStore::with_collection("crops", Vec::new());
        let table = crop_table();
        loader::load(&store, "crops", &table, &value_columns())
            .await
            .unwrap();

        let matched = verify_known_sample(&store, "crops", &[90.0, 40.0, 40.0], "rice", "label")
            .await
            .unwrap();
        assert!(matched);

        let hit = nearest(&store, "crops", &[90.0, 40.0, 40.0], 1, "label")
            .await
            .unwrap();
        assert_eq!(hit.label, "rice");
        assert_eq!(hit.distance, 0.0);
    }

    #[tokio::test]
    async fn mismatched_label_reports_false_without_failing() {
        let store = MockStore::with_collection("crops", Vec::new());
        loader::load(&store, "crops", &crop_table(), &value_columns())
            .await
            .unwrap();

        let matched = verify_known_sample(&store, "crops", &[21.0, 59.0, 20.0], "rice", "label")
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_result_error() {
        let store = MockStore::with_collection("crops", Vec::new());
        let err = nearest(&store, "crops", &[1.0, 2.0, 3.0], 1, "label")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResult { collection } if collection == "crops"));
    }
}
