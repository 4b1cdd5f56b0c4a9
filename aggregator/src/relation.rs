//! Parent/child joins across two upstream collections.
//!
//! Both collections are always fetched concurrently and both outcomes are
//! awaited before anything is decided, so a failure report can name every
//! source that failed rather than just the first one.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::errors::{AggregatorError, Result, SourceFailures};
use crate::fetch::{Fetch, FetchError};
use crate::payload::expect_sequence;

const ID_FIELD: &str = "id";

/// A named upstream collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub name: String,
    pub url: Url,
}

impl Source {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }
}

/// One parent record and the children that reference it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregation {
    pub parent: Value,
    pub children: Vec<Value>,
}

/// Parses a requested record id; only integers are accepted.
pub fn parse_record_id(raw: &str) -> Option<Value> {
    raw.trim().parse::<i64>().ok().map(Value::from)
}

type Records = std::result::Result<Vec<Value>, FetchError>;

/// A 1:N relation between a parent and a child collection.
///
/// Children reference their parent through `foreign_key`, compared by strict
/// JSON equality against the parent's `id`.
pub struct Relation {
    parent: Source,
    child: Source,
    foreign_key: String,
    fetcher: Arc<dyn Fetch>,
}

impl Relation {
    pub fn new(
        parent: Source,
        child: Source,
        foreign_key: impl Into<String>,
        fetcher: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            parent,
            child,
            foreign_key: foreign_key.into(),
            fetcher,
        }
    }

    pub fn parent(&self) -> &Source {
        &self.parent
    }

    /// Finds the parent with the given id along with its children.
    ///
    /// The foreign key is removed from the returned children, since it only
    /// repeats the parent's id. Fails before fetching anything if `raw_id` is
    /// missing or not an integer.
    pub async fn resolve_one(&self, raw_id: Option<&str>) -> Result<Aggregation> {
        let id = self.parse_id(raw_id)?;

        let (parents, children) = match self.fetch_both().await {
            (Ok(parents), Ok(children)) => (parents, children),
            (parents, children) => {
                return Err(self.report(parents.err().as_ref(), children.err().as_ref()));
            }
        };

        let parent = parents
            .into_iter()
            .find(|record| record.get(ID_FIELD) == Some(&id))
            .ok_or_else(|| AggregatorError::NotFound {
                source_name: self.parent.name.clone(),
                id: id.to_string(),
            })?;

        let children = children
            .into_iter()
            .filter(|record| record.get(&self.foreign_key) == Some(&id))
            .map(|record| self.strip_foreign_key(record))
            .collect();

        Ok(Aggregation { parent, children })
    }

    /// Returns every child whose parent matches `predicate`, in child order.
    ///
    /// When no parent matches, the result is empty even if the child source
    /// failed: the child outcome is only looked at once there is something to
    /// join against.
    pub async fn resolve_by_predicate<P>(&self, predicate: P) -> Result<Vec<Value>>
    where
        P: Fn(&Value) -> bool + Send,
    {
        let (parents, children) = self.fetch_both().await;

        let parents = match parents {
            Ok(parents) => parents,
            Err(e) => return Err(self.report(Some(&e), children.err().as_ref())),
        };

        let parent_ids: Vec<&Value> = parents
            .iter()
            .filter(|&record| predicate(record))
            .filter_map(|record| record.get(ID_FIELD))
            .filter(|id| !id.is_null())
            .collect();

        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let children = children.map_err(|e| self.report(None, Some(&e)))?;

        Ok(children
            .into_iter()
            .filter(|record| {
                record
                    .get(&self.foreign_key)
                    .is_some_and(|key| parent_ids.contains(&key))
            })
            .collect())
    }

    async fn fetch_both(&self) -> (Records, Records) {
        tokio::join!(
            self.fetch_records(&self.parent),
            self.fetch_records(&self.child)
        )
    }

    async fn fetch_records(&self, source: &Source) -> Records {
        let value = self.fetcher.fetch(&source.url).await?;
        expect_sequence(value)
    }

    fn report(
        &self,
        parent_error: Option<&FetchError>,
        child_error: Option<&FetchError>,
    ) -> AggregatorError {
        let mut failures = SourceFailures::new();
        if let Some(e) = parent_error {
            failures.record(&self.parent, e);
        }
        if let Some(e) = child_error {
            failures.record(&self.child, e);
        }
        failures.into_error()
    }

    fn parse_id(&self, raw_id: Option<&str>) -> Result<Value> {
        raw_id.and_then(parse_record_id).ok_or_else(|| {
            AggregatorError::validation(format!(
                "Need the integer id of the {} record to fetch.",
                self.parent.name
            ))
        })
    }

    fn strip_foreign_key(&self, mut record: Value) -> Value {
        if let Value::Object(fields) = &mut record {
            fields.shift_remove(&self.foreign_key);
        }
        record
    }
}
