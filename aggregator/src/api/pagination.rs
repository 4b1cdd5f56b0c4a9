use async_trait::async_trait;
use std::sync::Arc;

use crate::envelope::Envelope;
use crate::errors::{Result, SourceFailures};
use crate::fetch::Fetch;
use crate::handler::{Handler, Query};
use crate::paginate::{PageRequest, paginate};
use crate::payload::Payload;
use crate::relation::Source;

/// Serves one page of a single upstream collection per request.
pub struct PaginateHandler {
    source: Source,
    default_size: usize,
    fetcher: Arc<dyn Fetch>,
}

impl PaginateHandler {
    pub fn new(source: Source, default_size: usize, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            source,
            default_size,
            fetcher,
        }
    }
}

#[async_trait]
impl Handler for PaginateHandler {
    fn name(&self) -> &'static str {
        "paginate"
    }

    async fn handle(&self, query: &Query) -> Result<Envelope> {
        let page = PageRequest::from_query(query, self.default_size)?;

        let value = self.fetcher.fetch(&self.source.url).await.map_err(|e| {
            let mut failures = SourceFailures::new();
            failures.record(&self.source, &e);
            failures.into_error()
        })?;

        let payload = Payload::from(value);
        tracing::debug!(
            source = %self.source.name,
            size = page.size,
            offset = page.offset,
            total = payload.items().map(<[_]>::len),
            wrapped_in = payload.wrapper(),
            "Paginating upstream collection"
        );

        Ok(Envelope::Pagination(paginate(payload, page)))
    }
}
