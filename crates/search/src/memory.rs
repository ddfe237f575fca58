//! In-process document store.
//!
//! Keeps the same observable contract as the Elasticsearch client: create-only
//! writes, merge updates, 404-style misses, and a small query evaluator
//! (standard-analyzer tokens, `AUTO` fuzziness, keyword sort). Writes are
//! visible to the next search immediately.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::query::{Query, SearchRequest, SortOrder};
use crate::store::{DocumentStore, Hit, WriteAck};

struct StoredDoc {
    source: Value,
    version: i64,
    seq: u64,
}

#[derive(Default)]
struct Index {
    docs: HashMap<String, StoredDoc>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    indices: RwLock<HashMap<String, Index>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `index`.
    pub async fn count(&self, index: &str) -> usize {
        let indices = self.indices.read().await;
        indices.get(index).map(|i| i.docs.len()).unwrap_or(0)
    }

    /// Stored source of a single document.
    pub async fn get(&self, index: &str, id: &str) -> Option<Value> {
        let indices = self.indices.read().await;
        indices.get(index)?.docs.get(id).map(|d| d.source.clone())
    }
}

/// Lowercased alphanumeric tokens, roughly what the standard analyzer yields.
fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Optimal-string-alignment distance: adjacent transpositions count as one edit.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        d[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }
    d[a.len()][b.len()]
}

/// Resolve a dotted field path; `x.keyword` falls back to `x`.
fn field_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    let walk = move |path: &str| path.split('.').try_fold(doc, |v, key| v.get(key));
    walk(field).or_else(|| field.strip_suffix(".keyword").and_then(walk))
}

fn field_text(doc: &Value, field: &str) -> Option<String> {
    match field_value(doc, field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Relevance score of `doc` for `query`, `None` when it does not match.
fn score(query: &Query, doc: &Value) -> Option<f64> {
    match query {
        Query::MatchAll => Some(1.0),
        Query::Match { field, query } => {
            let tokens = analyze(&field_text(doc, field)?);
            let hits = analyze(query).iter().filter(|t| tokens.contains(t)).count();
            (hits > 0).then_some(hits as f64)
        }
        Query::Fuzzy { field, value, fuzziness } => {
            let max = fuzziness.max_edits(value.chars().count());
            analyze(&field_text(doc, field)?)
                .iter()
                .map(|t| edit_distance(t, value))
                .filter(|d| *d <= max)
                .min()
                .map(|d| 1.0 / (1.0 + d as f64))
        }
        Query::Bool(b) => {
            let mut total = 0.0;
            for q in &b.must {
                total += score(q, doc)?;
            }
            let mut matched = 0;
            for q in &b.should {
                if let Some(s) = score(q, doc) {
                    matched += 1;
                    total += s;
                }
            }
            if matched < b.required_should() {
                return None;
            }
            Some(total.max(1.0))
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    // Missing values sort last in either direction.
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };
    let ord = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    };
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Merge `patch` into `target`, descending into nested objects.
fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(t), Value::Object(p)) => {
            for (k, v) in p {
                let nested = v.is_object() && t.get(k).map_or(false, Value::is_object);
                match t.get_mut(k) {
                    Some(existing) if nested => merge(existing, v),
                    _ => {
                        t.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (t, p) => *t = p.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_index(&self, index: &str, _mappings: &Value) -> Result<bool, StoreError> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(index) {
            return Ok(false);
        }
        indices.insert(index.to_string(), Index::default());
        Ok(true)
    }

    async fn index_document(&self, index: &str, id: &str, doc: &Value) -> Result<WriteAck, StoreError> {
        let mut indices = self.indices.write().await;
        let idx = indices.entry(index.to_string()).or_default();
        if idx.docs.contains_key(id) {
            return Err(StoreError::Conflict(id.to_string()));
        }
        let seq = idx.next_seq;
        idx.next_seq += 1;
        idx.docs.insert(id.to_string(), StoredDoc { source: doc.clone(), version: 1, seq });
        Ok(WriteAck { id: id.to_string(), result: "created".into(), version: Some(1) })
    }

    async fn update_document(&self, index: &str, id: &str, patch: &Value) -> Result<WriteAck, StoreError> {
        let mut indices = self.indices.write().await;
        let stored = indices
            .get_mut(index)
            .and_then(|i| i.docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut merged = stored.source.clone();
        merge(&mut merged, patch);
        let result = if merged == stored.source {
            "noop"
        } else {
            stored.source = merged;
            stored.version += 1;
            "updated"
        };
        Ok(WriteAck { id: id.to_string(), result: result.into(), version: Some(stored.version) })
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, StoreError> {
        let mut indices = self.indices.write().await;
        Ok(indices
            .get_mut(index)
            .map(|i| i.docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, StoreError> {
        let indices = self.indices.read().await;
        let idx = indices.get(index).ok_or_else(|| StoreError::Rejected {
            status: 404,
            reason: format!("no such index [{index}]"),
        })?;

        let mut matched: Vec<(&String, &StoredDoc, f64)> = idx
            .docs
            .iter()
            .filter_map(|(id, d)| score(&request.query, &d.source).map(|s| (id, d, s)))
            .collect();

        matched.sort_by(|(_, a, sa), (_, b, sb)| {
            let by_fields = request.sort.iter().fold(Ordering::Equal, |acc, s| {
                acc.then_with(|| {
                    compare_values(field_value(&a.source, &s.field), field_value(&b.source, &s.field), s.order)
                })
            });
            let by_score = if request.sort.is_empty() {
                sb.partial_cmp(sa).unwrap_or(Ordering::Equal)
            } else {
                Ordering::Equal
            };
            by_fields.then(by_score).then(a.seq.cmp(&b.seq))
        });

        Ok(matched
            .into_iter()
            .take(request.size)
            .map(|(id, d, _)| Hit { id: id.clone(), source: d.source.clone() })
            .collect())
    }
}
