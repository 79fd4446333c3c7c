//! Pipeline orchestration.
//!
//! Sequences reconcile → bulk load → count check → known-sample
//! verification → range analysis → synthetic-vector query. The store
//! connection is closed exactly once on every exit path; the staged result
//! is surfaced afterwards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PipelineConfig;
use crate::dataset::Table;
use crate::error::{Error, Result};
use crate::loader;
use crate::reconcile;
use crate::store::{CollectionSchema, VectorStore};
use crate::vector::{build_random_vector, build_vector};
use crate::verify;

/// Run the full ingestion-and-verification pipeline against a loaded table.
pub async fn run<S: VectorStore>(config: &PipelineConfig, table: &Table, store: &S) -> Result<()> {
    let result = run_stages(config, table, store).await;
    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "failed to close vector store connection");
    }
    result
}

async fn run_stages<S: VectorStore>(
    config: &PipelineConfig,
    table: &Table,
    store: &S,
) -> Result<()> {
    let mut rng = StdRng::from_entropy();

    // Computed once; load-time and query-time vectors share this ordering.
    let value_columns = table.value_columns(&config.label_column)?;
    let schema = CollectionSchema::from_table(table, value_columns.len())?;
    tracing::info!(
        rows = table.row_count(),
        columns = value_columns.len(),
        label = %config.label_column,
        "dataset ready for ingestion"
    );

    let freshly_created =
        reconcile::reconcile(store, &config.collection, &schema, config.intent).await?;

    if freshly_created {
        loader::load(store, &config.collection, table, &value_columns).await?;
        check_row_count(store, config, table).await?;
    } else {
        tracing::info!(
            collection = %config.collection,
            "reusing existing collection, skipping bulk load"
        );
    }

    verify_with_known_sample(store, config, table, &value_columns, &mut rng).await?;
    query_with_random_vector(store, config, table, &value_columns, &mut rng).await?;

    tracing::info!("pipeline complete");
    Ok(())
}

/// Cross-check the collection count against the source row count.
///
/// Only meaningful right after creation; an insert failure has already
/// aborted the run by this point, so a mismatch here is advisory.
async fn check_row_count<S: VectorStore>(
    store: &S,
    config: &PipelineConfig,
    table: &Table,
) -> Result<()> {
    let stored = store.count(&config.collection).await?;
    let expected = table.row_count();
    if stored == expected {
        tracing::info!(rows = stored, "collection count matches dataset row count");
    } else {
        tracing::warn!(
            expected,
            stored,
            "collection count does not match dataset row count"
        );
    }
    Ok(())
}

/// Query with a randomly chosen source row and expect its own label back.
async fn verify_with_known_sample<S: VectorStore>(
    store: &S,
    config: &PipelineConfig,
    table: &Table,
    value_columns: &[String],
    rng: &mut StdRng,
) -> Result<()> {
    let row = table.row(rng.gen_range(0..table.row_count()));
    let vector = build_vector(&row, value_columns)?;
    let expected_label = row
        .get(&config.label_column)
        .map(|v| v.to_string())
        .ok_or_else(|| Error::MissingField {
            column: config.label_column.clone(),
        })?;

    verify::verify_known_sample(
        store,
        &config.collection,
        &vector,
        &expected_label,
        &config.label_column,
    )
    .await?;
    Ok(())
}

/// Query with a synthetic vector drawn from the observed per-column ranges.
/// The returned label is reported, not checked against anything.
async fn query_with_random_vector<S: VectorStore>(
    store: &S,
    config: &PipelineConfig,
    table: &Table,
    value_columns: &[String],
    rng: &mut StdRng,
) -> Result<()> {
    let ranges = table.value_ranges(value_columns)?;
    tracing::info!(?ranges, "observed value ranges");

    let vector = build_random_vector(&ranges, rng)?;
    tracing::info!(?vector, "generated random query vector");

    let matched = verify::nearest(store, &config.collection, &vector, 1, &config.label_column).await?;
    tracing::info!(
        label = %matched.label,
        distance = matched.distance,
        "random-vector query result"
    );
    Ok(())
}
