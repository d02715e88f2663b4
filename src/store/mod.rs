//! Per-user record storage backed by a managed data store.
//!
//! This module handles:
//! - The `RecordStore` abstraction used by the data endpoints
//! - Supabase (PostgREST) client
//! - In-memory store for testing

pub mod mock;
pub mod supabase;
pub mod types;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use mock::{MemoryStore, MockConfig};
pub use supabase::SupabaseStore;
pub use types::{nutrition_row, SessionInput, Table};

/// A store holding rows partitioned by `user_id`.
///
/// Implementations never return rows belonging to another user from
/// `list`, and return rows newest-first by `created_at`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List the rows of `table` owned by `user_id`, newest first.
    async fn list(&self, table: Table, user_id: &str) -> Result<Vec<Value>, StoreError>;

    /// Insert one row and return the inserted row(s) as stored.
    async fn insert(&self, table: Table, row: Map<String, Value>)
        -> Result<Vec<Value>, StoreError>;
}
