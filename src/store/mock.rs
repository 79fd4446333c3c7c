//! In-memory vector store used by unit tests.
//!
//! Implements a real L2 nearest-neighbor scan and counts lifecycle calls so
//! tests can assert how many create/delete/insert/close calls a stage made.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{CollectionSchema, QueryHit, Record, VectorStore};

#[derive(Default)]
struct MockState {
    collections: HashMap<String, Vec<Record>>,
    create_calls: usize,
    delete_calls: usize,
    insert_calls: usize,
    close_calls: usize,
    fail_insert: bool,
}

#[derive(Default)]
pub(crate) struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where `name` already exists, holding `records`.
    pub fn with_collection(name: &str, records: Vec<Record>) -> Self {
        let store = Self::new();
        store
            .state
            .lock()
            .unwrap()
            .collections
            .insert(name.to_string(), records);
        store
    }

    pub fn fail_inserts(&self) {
        self.state.lock().unwrap().fail_insert = true;
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn records(&self, name: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[async_trait]
impl VectorStore for MockStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, _schema: &CollectionSchema) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        state.collections.remove(name);
        Ok(())
    }

    async fn insert_many(&self, name: &str, records: Vec<Record>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_insert {
            return Err(Error::store("simulated insert failure"));
        }
        state
            .collections
            .get_mut(name)
            .ok_or_else(|| Error::store(format!("collection {name} not found")))?
            .extend(records);
        Ok(())
    }

    async fn count(&self, name: &str) -> Result<usize> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(name)
            .map(Vec::len)
            .ok_or_else(|| Error::store(format!("collection {name} not found")))
    }

    async fn nearest_vector(
        &self,
        name: &str,
        vector: &[f64],
        limit: usize,
    ) -> Result<Vec<QueryHit>> {
        let state = self.state.lock().unwrap();
        let records = state
            .collections
            .get(name)
            .ok_or_else(|| Error::store(format!("collection {name} not found")))?;

        let mut hits: Vec<QueryHit> = records
            .iter()
            .map(|record| QueryHit {
                properties: record.properties.clone(),
                distance: l2_distance(&record.vector, vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}
