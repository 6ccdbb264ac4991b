//! Store boundary for range scans.
//!
//! The radius search needs exactly one capability from a document store: run
//! a [`Query`] and return every matching snapshot. Synchronous and
//! asynchronous stores implement separate traits so each collection type can
//! fan out in the way that suits it.
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: in-memory collection, implements both traits
//! - Apps wrap their own client (Firestore, DynamoDB, a SQL table with an
//!   index on the geohash column) behind one of these traits
//!
//! ## Example
//!
//! ```ignore
//! use geoquery::store::{AsyncDocumentStore, StoreResult};
//!
//! struct MyStore { /* client handle */ }
//!
//! #[async_trait::async_trait]
//! impl AsyncDocumentStore for MyStore {
//!     async fn run_query_async(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
//!         // translate `query` and execute it
//!     }
//! }
//! ```

pub mod memory;

pub use memory::{MemoryStore, MemoryStoreStats};

pub use crate::error::StoreError;
use crate::query::Query;
use crate::types::DocumentSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type returned by store implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A store that executes queries on the calling thread.
pub trait DocumentStore: Send + Sync {
    /// Run `query` and return all matching snapshots in query order.
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;
}

/// A store whose queries are futures.
#[async_trait]
pub trait AsyncDocumentStore: Send + Sync {
    /// Run `query` and return all matching snapshots in query order.
    async fn run_query_async(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        (**self).run_query(query)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn run_query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        (**self).run_query(query)
    }
}

#[async_trait]
impl<S: AsyncDocumentStore + ?Sized> AsyncDocumentStore for Arc<S> {
    async fn run_query_async(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        (**self).run_query_async(query).await
    }
}
