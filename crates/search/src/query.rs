//! Search request building.
//!
//! Produces the Elasticsearch query DSL for the small set of clauses the
//! service needs: `match_all`, `match`, `fuzzy` and `bool`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Edit-distance tolerance of a fuzzy clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fuzziness {
    #[default]
    Auto,
    Edits(u8),
}

impl Fuzziness {
    /// Maximum edits allowed for a term of `term_len` characters.
    pub fn max_edits(&self, term_len: usize) -> usize {
        match self {
            Fuzziness::Auto => match term_len {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
            Fuzziness::Edits(n) => (*n).min(2) as usize,
        }
    }

    fn to_json(self) -> Value {
        match self {
            Fuzziness::Auto => Value::String("AUTO".into()),
            Fuzziness::Edits(n) => json!(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    /// Number of `should` clauses a document has to satisfy.
    /// Mirrors the store default: one when there is no `must`, otherwise zero.
    pub fn required_should(&self) -> usize {
        match self.minimum_should_match {
            Some(n) => n as usize,
            None if self.must.is_empty() && !self.should.is_empty() => 1,
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Match { field: String, query: String },
    Fuzzy { field: String, value: String, fuzziness: Fuzziness },
    Bool(BoolQuery),
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll
    }

    /// Full-text match; the query is analyzed and any term may match.
    pub fn matches(field: impl Into<String>, query: impl Into<String>) -> Self {
        Query::Match { field: field.into(), query: query.into() }
    }

    /// Term-level approximate match with `AUTO` fuzziness.
    pub fn fuzzy(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Fuzzy { field: field.into(), value: value.into(), fuzziness: Fuzziness::Auto }
    }

    pub fn should(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery { should: clauses, ..Default::default() })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Match { field, query } => json!({ "match": { field.as_str(): { "query": query } } }),
            Query::Fuzzy { field, value, fuzziness } => json!({
                "fuzzy": { field.as_str(): { "value": value, "fuzziness": fuzziness.to_json() } }
            }),
            Query::Bool(b) => {
                let mut body = Map::new();
                if !b.must.is_empty() {
                    body.insert("must".into(), Value::Array(b.must.iter().map(Query::to_json).collect()));
                }
                if !b.should.is_empty() {
                    body.insert("should".into(), Value::Array(b.should.iter().map(Query::to_json).collect()));
                }
                if let Some(n) = b.minimum_should_match {
                    body.insert("minimum_should_match".into(), json!(n));
                }
                json!({ "bool": body })
            }
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Desc }
    }

    fn to_json(&self) -> Value {
        json!({ self.field.as_str(): { "order": self.order } })
    }
}

/// A complete `_search` body.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    pub sort: Vec<SortField>,
    pub size: usize,
}

impl SearchRequest {
    /// Store default page size.
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(query: Query) -> Self {
        Self { query, sort: Vec::new(), size: Self::DEFAULT_SIZE }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({ "query": self.query.to_json(), "size": self.size });
        if !self.sort.is_empty() {
            body["sort"] = Value::Array(self.sort.iter().map(SortField::to_json).collect());
        }
        body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Match,
    Fuzzy,
}

/// One field taking part in a relevance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldClause<'a> {
    pub field: &'a str,
    pub kind: MatchKind,
}

impl<'a> FieldClause<'a> {
    pub const fn matches(field: &'a str) -> Self {
        Self { field, kind: MatchKind::Match }
    }

    pub const fn fuzzy(field: &'a str) -> Self {
        Self { field, kind: MatchKind::Fuzzy }
    }
}

/// Boolean-OR relevance query over `fields` for a caller-supplied `term`.
///
/// A blank term or an empty field list yields `match_all`. Fuzzy clauses are
/// term-level and compared against analyzed (lowercased) tokens, so their value
/// is lowercased here.
pub fn relevance_query(term: &str, fields: &[FieldClause<'_>]) -> Query {
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return Query::MatchAll;
    }
    let clauses = fields
        .iter()
        .map(|f| match f.kind {
            MatchKind::Match => Query::matches(f.field, term),
            MatchKind::Fuzzy => Query::fuzzy(f.field, term.to_lowercase()),
        })
        .collect();
    Query::should(clauses)
}
