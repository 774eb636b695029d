//! Query engine adapter.
//!
//! The trace/query engine lives outside this crate. It accepts SQL-like query
//! strings and answers with typed columnar results or an error string.

mod result;

pub use result::{Column, ColumnValues, QueryResponse, QueryResult};

use futures::future::BoxFuture;

/// Contract implemented by any query engine backend.
///
/// Implementations must be shareable across tracks: controllers of different
/// tracks issue queries concurrently through the same engine.
pub trait QueryEngine: Send + Sync {
    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, QueryResponse>;
}
