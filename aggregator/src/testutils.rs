use crate::fetch::{Fetch, FetchError};
use crate::relation::Source;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Canned [`Fetch`] implementation that counts every call.
///
/// URLs without a canned answer fail with a 404 status.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Result<Value, FetchError>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, source: &Source, value: Value) -> Self {
        self.responses.insert(source.url.to_string(), Ok(value));
        self
    }

    pub fn with_failure(mut self, source: &Source, error: FetchError) -> Self {
        self.responses.insert(source.url.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url.as_str())
            .cloned()
            .unwrap_or(Err(FetchError::Status { status: 404 }))
    }
}

pub fn source(name: &str) -> Source {
    Source::new(
        name,
        Url::parse(&format!("http://upstream.test/{name}")).unwrap(),
    )
}

pub fn refused() -> FetchError {
    FetchError::Transport {
        message: "connection refused".to_string(),
        code: Some("os error 111".to_string()),
    }
}

pub fn mock_users() -> Value {
    json!([
        {
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "company": {"name": "Romaguera-Crona", "catchPhrase": "Multi-layered client-server neural-net"}
        },
        {
            "id": 2,
            "name": "Ervin Howell",
            "username": "Antonette",
            "company": {"name": "Deckow-Crist", "catchPhrase": "Proactive didactic contingency"}
        }
    ])
}

pub fn mock_posts() -> Value {
    json!([
        {"userId": 1, "id": 8, "title": "dolorem dolore est ipsam", "body": "dignissimos aperiam"},
        {"userId": 1, "id": 9, "title": "nesciunt iure omnis", "body": "consectetur animi"},
        {"userId": 2, "id": 11, "title": "et ea vero quia", "body": "delectus reiciendis"},
        {"userId": 2, "id": 12, "title": "in quibusdam tempore", "body": "itaque id aut magnam"}
    ])
}
