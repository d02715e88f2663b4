//! In-memory record store for unit testing.
//!
//! This module provides a store that behaves like the Supabase tables
//! (assigning `id` and `created_at` on insert) without network requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StoreError;

use super::{RecordStore, Table};

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail list requests.
    pub fail_list: bool,
    /// Whether to fail insert requests.
    pub fail_insert: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// A stored row with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    row: Value,
}

/// In-memory store keyed by table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Mock configuration.
    config: MockConfig,
    /// Rows by table.
    tables: Arc<Mutex<HashMap<Table, Vec<StoredRow>>>>,
    /// Next row id.
    next_id: Arc<AtomicU64>,
    /// Number of list/insert calls that reached the store.
    calls: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<Table, Vec<StoredRow>>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every row in `table`, in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables()
            .get(&table)
            .map(|rows| rows.iter().map(|r| r.row.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, table: Table, user_id: &str) -> Result<Vec<Value>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.config.fail_list {
            return Err(StoreError::Simulated(format!(
                "relation \"public.{table}\" is unavailable"
            )));
        }

        let tables = self.tables();
        let mut rows: Vec<&StoredRow> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.row.get("user_id").and_then(Value::as_str) == Some(user_id))
                    .collect()
            })
            .unwrap_or_default();

        // Newest first; the sequence breaks ties between equal timestamps.
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(rows.into_iter().map(|r| r.row.clone()).collect())
    }

    async fn insert(
        &self,
        table: Table,
        mut row: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.config.fail_insert {
            return Err(StoreError::Simulated(format!(
                "new row for relation \"{table}\" violates check constraint"
            )));
        }

        let seq = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| StoreError::Simulated(e.to_string()))?;

        row.insert("id".to_string(), Value::from(seq));
        row.insert("created_at".to_string(), Value::String(created_at));
        let row = Value::Object(row);

        self.tables()
            .entry(table)
            .or_default()
            .push(StoredRow {
                seq,
                row: row.clone(),
            });

        Ok(vec![row])
    }
}
