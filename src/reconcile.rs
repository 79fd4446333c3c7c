//! Collection lifecycle reconciliation.
//!
//! Decides, from the collection's existence state and the caller's intent,
//! whether to create, delete-then-create, or reuse the remote collection.
//! An existing collection with no stated intent is a hard error rather than
//! a guess between duplication and loss.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{CollectionSchema, VectorStore};

/// Caller intent towards a pre-existing collection. Delete and append are
/// mutually exclusive; the CLI enforces this before construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionIntent {
    Neither,
    Delete,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Create,
    DeleteThenCreate,
    Reuse,
}

/// Pure transition function; issues no remote calls.
pub fn plan(exists: bool, intent: CollectionIntent, collection: &str) -> Result<ReconcileAction> {
    if !exists {
        return Ok(ReconcileAction::Create);
    }
    match intent {
        CollectionIntent::Delete => Ok(ReconcileAction::DeleteThenCreate),
        CollectionIntent::Append => Ok(ReconcileAction::Reuse),
        CollectionIntent::Neither => Err(Error::CollectionConflict {
            collection: collection.to_string(),
        }),
    }
}

/// Execute the planned action. Returns whether the collection is freshly
/// created, which later decides if a row-count sanity check is meaningful.
pub async fn reconcile<S: VectorStore + ?Sized>(
    store: &S,
    collection: &str,
    schema: &CollectionSchema,
    intent: CollectionIntent,
) -> Result<bool> {
    let exists = store.collection_exists(collection).await?;
    let action = plan(exists, intent, collection)?;
    tracing::info!(collection, exists, ?intent, ?action, "reconciling collection");

    match action {
        ReconcileAction::Create => {
            store.create_collection(collection, schema).await?;
            Ok(true)
        }
        ReconcileAction::DeleteThenCreate => {
            store.delete_collection(collection).await?;
            store.create_collection(collection, schema).await?;
            Ok(true)
        }
        ReconcileAction::Reuse => Ok(false),
    }
}
