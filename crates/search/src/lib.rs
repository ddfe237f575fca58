//! Document-store client layer.
//! - `DocumentStore` is the narrow interface the service layer talks to.
//! - `query` builds Elasticsearch-style search bodies.
//! - `elasticsearch` speaks the REST API over reqwest; `memory` keeps documents in-process.

pub mod errors;
pub mod query;
pub mod store;
pub mod elasticsearch;
pub mod memory;

pub use errors::StoreError;
pub use query::{relevance_query, BoolQuery, FieldClause, Fuzziness, MatchKind, Query, SearchRequest, SortField, SortOrder};
pub use store::{DocumentStore, Hit, WriteAck};
pub use elasticsearch::{ElasticsearchOptions, ElasticsearchStore, Refresh};
pub use memory::MemoryStore;
