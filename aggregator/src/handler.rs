use async_trait::async_trait;
use http::Uri;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::errors::Result;

/// Decoded query string of a request.
///
/// When a parameter repeats, the last occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(IndexMap<String, String>);

impl Query {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Query(pairs.into_iter().collect())
    }

    pub fn from_uri(uri: &Uri) -> Self {
        let raw = uri.query().unwrap_or_default();
        Self::from_pairs(url::form_urlencoded::parse(raw.as_bytes()).into_owned())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parameters as a JSON object, for error reports.
    pub fn to_params(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

/// Serves one configured route.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, query: &Query) -> Result<Envelope>;
}
