//! Pipeline configuration.
//!
//! Built once from the command line and passed by reference into the
//! orchestrator; never mutated after construction.

use serde::{Deserialize, Serialize};

use crate::reconcile::CollectionIntent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Dataset identifier, e.g. `atharvaingle/crop-recommendation-dataset`.
    pub dataset: String,
    /// Data filename within the dataset.
    pub data_file: String,
    /// Column holding the outcome to predict/verify; excluded from vectors.
    pub label_column: String,
    /// Target collection name in the vector store.
    pub collection: String,
    /// LanceDB database location.
    pub db_uri: String,
    /// What to do when the collection already exists.
    pub intent: CollectionIntent,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: "atharvaingle/crop-recommendation-dataset".to_string(),
            data_file: "Crop_recommendation.csv".to_string(),
            label_column: "label".to_string(),
            collection: "CropRecommendations".to_string(),
            db_uri: "data/lancedb".to_string(),
            intent: CollectionIntent::Neither,
        }
    }
}
