use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use search::{relevance_query, DocumentStore, FieldClause, Query, SearchRequest, SortField, StoreError};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{CreateProductDto, Product, SeedSummary, UpdateAck, UpdateProductDto};
use super::seed::DemoProducts;
use crate::errors::ServiceError;

pub const DEFAULT_INDEX: &str = "products";
pub const LIST_LIMIT: usize = 100;
pub const NAME_SORT_FIELD: &str = "name.keyword";
pub const DEFAULT_SEED_COUNT: usize = 100;
pub const MAX_SEED_COUNT: usize = 10_000;

/// Fields searched by `list`: typo-tolerant on description, analyzed match on name.
pub const PRODUCT_FIELDS: &[FieldClause<'static>] = &[FieldClause::fuzzy("description"), FieldClause::matches("name")];

const ENTITY: &str = "product";

/// Index mappings: analyzed `name` with a `keyword` sub-field for sorting.
pub fn product_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": {
                "type": "text",
                "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
            },
            "price": { "type": "double" },
            "stock": { "type": "integer" },
            "description": { "type": "text" }
        }
    })
}

/// Search request used by `list`. No term matches everything.
pub fn list_request(term: Option<&str>) -> SearchRequest {
    let query = match term {
        Some(t) => relevance_query(t, PRODUCT_FIELDS),
        None => Query::match_all(),
    };
    SearchRequest::new(query)
        .size(LIST_LIMIT)
        .sort_by(SortField::asc(NAME_SORT_FIELD))
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::StoreWrite(e.to_string()))
}

/// Product operations over an injected document store.
/// Each call issues one store request; nothing is cached between calls.
pub struct ProductService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    index: String,
}

impl<S: DocumentStore + ?Sized> ProductService<S> {
    pub fn new(store: Arc<S>, index: impl Into<String>) -> Self {
        Self { store, index: index.into() }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create the product index if missing. Returns whether it was created.
    #[instrument(skip(self), fields(index = %self.index))]
    pub async fn ensure_index(&self) -> Result<bool, ServiceError> {
        let created = self
            .store
            .create_index(&self.index, &product_mappings())
            .await
            .map_err(|e| ServiceError::StoreWrite(e.to_string()))?;
        info!(created, "product index ready");
        Ok(created)
    }

    /// Index a new product under a fresh id and return that id.
    ///
    /// # Examples
    /// ```
    /// use search::MemoryStore;
    /// use service::product::{CreateProductDto, ProductService};
    /// use std::sync::Arc;
    /// let svc = ProductService::new(Arc::new(MemoryStore::new()), "products");
    /// let dto = CreateProductDto { name: "Tomato Paste".into(), price: 3.5, stock: 10, description: "Canned tomato paste".into() };
    /// let id = tokio_test::block_on(svc.create(dto)).unwrap();
    /// let all = tokio_test::block_on(svc.list(None)).unwrap();
    /// assert_eq!(all[0].id, id);
    /// ```
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductDto) -> Result<Uuid, ServiceError> {
        let product = Product::create(input);
        let doc = to_document(&product)?;
        self.store
            .index_document(&self.index, &product.id.to_string(), &doc)
            .await
            .map_err(|e| ServiceError::from_write(ENTITY, e))?;
        info!(id = %product.id, "product_created");
        Ok(product.id)
    }

    /// Merge every dto field onto the stored product.
    #[instrument(skip(self, input), fields(id = %input.id))]
    pub async fn update(&self, input: UpdateProductDto) -> Result<UpdateAck, ServiceError> {
        let patch = to_document(&input)?;
        let ack = self
            .store
            .update_document(&self.index, &input.id.to_string(), &patch)
            .await
            .map_err(|e| ServiceError::from_write(ENTITY, e))?;
        info!(result = %ack.result, "product_updated");
        Ok(UpdateAck { id: input.id, result: ack.result, version: ack.version })
    }

    /// Delete by id; an absent id is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existed = self
            .store
            .delete_document(&self.index, &id.to_string())
            .await
            .map_err(|e| ServiceError::from_write(ENTITY, e))?;
        if !existed {
            return Err(ServiceError::not_found(ENTITY, id));
        }
        info!("product_deleted");
        Ok(())
    }

    /// Up to `LIST_LIMIT` products sorted by name, optionally filtered by `term`.
    #[instrument(skip(self))]
    pub async fn list(&self, term: Option<&str>) -> Result<Vec<Product>, ServiceError> {
        let hits = self
            .store
            .search(&self.index, &list_request(term))
            .await
            .map_err(ServiceError::from_query)?;
        hits.into_iter()
            .map(|h| {
                serde_json::from_value::<Product>(h.source)
                    .map_err(|e| ServiceError::from_query(StoreError::Decode(format!("document {}: {e}", h.id))))
            })
            .collect()
    }

    /// Index `count` generated products one after another.
    pub async fn seed(&self, count: usize) -> Result<SeedSummary, ServiceError> {
        self.seed_with(count, StdRng::from_entropy()).await
    }

    /// Sequential seeding with a caller-chosen RNG. Failed writes are counted and
    /// the loop carries on; dropping the future stops further writes.
    #[instrument(skip(self, rng), fields(index = %self.index))]
    pub async fn seed_with<R: Rng + Send>(&self, count: usize, rng: R) -> Result<SeedSummary, ServiceError> {
        if count == 0 || count > MAX_SEED_COUNT {
            return Err(ServiceError::Validation(format!("seed count must be in 1..={MAX_SEED_COUNT}")));
        }
        let mut products = DemoProducts::new(rng);
        let mut summary = SeedSummary { requested: count, created: 0, failed: 0, ids: Vec::with_capacity(count) };
        for _ in 0..count {
            match self.create(products.next_product()).await {
                Ok(id) => {
                    summary.created += 1;
                    summary.ids.push(id);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(error = %e, "seed write failed");
                }
            }
        }
        info!(created = summary.created, failed = summary.failed, "seed finished");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search::{Hit, MemoryStore, WriteAck};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dto(name: &str, description: &str) -> CreateProductDto {
        CreateProductDto { name: name.into(), price: 3.5, stock: 10, description: description.into() }
    }

    async fn service() -> anyhow::Result<ProductService<MemoryStore>> {
        let svc = ProductService::new(Arc::new(MemoryStore::new()), DEFAULT_INDEX);
        svc.ensure_index().await?;
        Ok(svc)
    }

    /// Store wrapper that counts writes and fails every `fail_every`-th one.
    struct FlakyStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        fail_every: usize,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn create_index(&self, index: &str, mappings: &Value) -> Result<bool, StoreError> {
            self.inner.create_index(index, mappings).await
        }
        async fn index_document(&self, index: &str, id: &str, doc: &Value) -> Result<WriteAck, StoreError> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && n % self.fail_every == 0 {
                return Err(StoreError::Transport("connection reset".into()));
            }
            self.inner.index_document(index, id, doc).await
        }
        async fn update_document(&self, _: &str, _: &str, _: &Value) -> Result<WriteAck, StoreError> {
            Err(StoreError::Rejected { status: 503, reason: "unavailable".into() })
        }
        async fn delete_document(&self, _: &str, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Transport("timeout".into()))
        }
        async fn search(&self, _: &str, _: &SearchRequest) -> Result<Vec<Hit>, StoreError> {
            Err(StoreError::Transport("timeout".into()))
        }
    }

    fn flaky(fail_every: usize) -> ProductService<FlakyStore> {
        let store = FlakyStore { inner: MemoryStore::new(), writes: AtomicUsize::new(0), fail_every };
        ProductService::new(Arc::new(store), DEFAULT_INDEX)
    }

    #[test]
    fn list_request_shape() {
        let req = list_request(Some("domates"));
        assert_eq!(req.size, 100);
        assert_eq!(req.sort, vec![SortField::asc("name.keyword")]);
        assert_eq!(
            req.query.to_json(),
            json!({
                "bool": { "should": [
                    { "fuzzy": { "description": { "value": "domates", "fuzziness": "AUTO" } } },
                    { "match": { "name": { "query": "domates" } } }
                ] }
            })
        );
        assert_eq!(list_request(None).query, Query::MatchAll);
    }

    #[tokio::test]
    async fn create_returns_fresh_ids() -> anyhow::Result<()> {
        let svc = service().await?;
        let a = svc.create(dto("A", "first")).await?;
        let b = svc.create(dto("B", "second")).await?;
        assert_ne!(a, b);
        let stored = svc.store().get(DEFAULT_INDEX, &a.to_string()).await.unwrap();
        assert_eq!(stored["id"], a.to_string());
        assert_eq!(stored["name"], "A");
        Ok(())
    }

    #[tokio::test]
    async fn list_finds_tomato_paste_by_term() -> anyhow::Result<()> {
        let svc = service().await?;
        let id = svc.create(dto("Tomato Paste", "Canned tomato paste")).await?;
        svc.create(dto("Apple Juice", "Fresh pressed apples")).await?;
        let found = svc.list(Some("tomato")).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].price, 3.5);
        Ok(())
    }

    #[tokio::test]
    async fn list_tolerates_typos_in_description() -> anyhow::Result<()> {
        let svc = service().await?;
        let id = svc.create(dto("Salca", "domates salcasi")).await?;
        let found = svc.list(Some("domatse")).await?;
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![id]);
        Ok(())
    }

    #[tokio::test]
    async fn list_is_capped_and_sorted_by_name() -> anyhow::Result<()> {
        let svc = service().await?;
        for i in (0..120).rev() {
            svc.create(dto(&format!("item {i:03}"), "bulk")).await?;
        }
        let all = svc.list(None).await?;
        assert_eq!(all.len(), LIST_LIMIT);
        assert_eq!(all[0].name, "item 000");
        assert!(all.windows(2).all(|w| w[0].name <= w[1].name));
        Ok(())
    }

    #[tokio::test]
    async fn update_merges_fields() -> anyhow::Result<()> {
        let svc = service().await?;
        let id = svc.create(dto("Old", "old description")).await?;
        let ack = svc
            .update(UpdateProductDto { id, name: "New".into(), price: 9.99, stock: 2, description: "new description".into() })
            .await?;
        assert_eq!(ack.id, id);
        assert_eq!(ack.result, "updated");
        let all = svc.list(None).await?;
        assert_eq!(all, vec![Product { id, name: "New".into(), price: 9.99, stock: 2, description: "new description".into() }]);
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_is_not_found() -> anyhow::Result<()> {
        let svc = service().await?;
        let err = svc
            .update(UpdateProductDto { id: Uuid::new_v4(), name: "x".into(), price: 1.0, stock: 1, description: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(svc.list(None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_then_list_excludes_id() -> anyhow::Result<()> {
        let svc = service().await?;
        let id = svc.create(dto("Gone", "soon")).await?;
        let kept = svc.create(dto("Kept", "stays")).await?;
        svc.delete(id).await?;
        let ids: Vec<Uuid> = svc.list(None).await?.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![kept]);
        assert!(matches!(svc.delete(id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn seed_issues_exactly_count_creates() -> anyhow::Result<()> {
        let svc = service().await?;
        let summary = svc.seed_with(100, StdRng::seed_from_u64(1)).await?;
        assert_eq!(summary.requested, 100);
        assert_eq!(summary.created, 100);
        assert_eq!(summary.failed, 0);
        assert_eq!(svc.store().count(DEFAULT_INDEX).await, 100);
        for p in svc.list(None).await? {
            assert!((1.0..=1000.0).contains(&p.price));
            assert!((1..=20).contains(&p.stock));
        }
        Ok(())
    }

    #[tokio::test]
    async fn seed_continues_past_failed_writes() -> anyhow::Result<()> {
        let svc = flaky(4);
        let summary = svc.seed_with(10, StdRng::seed_from_u64(2)).await?;
        assert_eq!(summary.created, 8);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.ids.len(), 8);
        assert_eq!(svc.store().writes.load(Ordering::SeqCst), 10);
        Ok(())
    }

    #[tokio::test]
    async fn seed_rejects_out_of_range_counts() {
        let svc = flaky(0);
        assert!(matches!(svc.seed(0).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.seed(MAX_SEED_COUNT + 1).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn store_failures_map_to_taxonomy() {
        let svc = flaky(1);
        assert!(matches!(svc.create(dto("x", "y")).await, Err(ServiceError::StoreWrite(_))));
        let upd = UpdateProductDto { id: Uuid::new_v4(), name: "x".into(), price: 1.0, stock: 1, description: "y".into() };
        assert!(matches!(svc.update(upd).await, Err(ServiceError::StoreWrite(_))));
        assert!(matches!(svc.delete(Uuid::new_v4()).await, Err(ServiceError::StoreWrite(_))));
        assert!(matches!(svc.list(Some("x")).await, Err(ServiceError::StoreQuery(_))));
    }
}
