pub mod api;
pub mod config;
pub mod envelope;
pub mod error_report;
pub mod errors;
pub mod fetch;
pub mod handler;
pub mod metrics_defs;
pub mod paginate;
pub mod payload;
pub mod predicate;
pub mod relation;
pub mod router;

#[cfg(test)]
mod testutils;

use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::{into_boxed, run_http_service};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::HttpFetcher;
use crate::router::Router;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ValidationError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub async fn run(config: config::Config) -> Result<(), ServerError> {
    config.validate()?;

    let fetcher = HttpFetcher::new(Duration::from_secs(config.upstream.timeout_secs))?;
    let router = Router::from_config(&config, Arc::new(fetcher));
    tracing::info!(
        routes = router.len(),
        environment = ?config.environment,
        "Starting aggregator"
    );

    let aggregator_service = AggregatorService { router };
    run_http_service(
        &config.listener.host,
        config.listener.port,
        aggregator_service,
    )
    .await
}

struct AggregatorService {
    router: Router,
}

impl Service<Request<Incoming>> for AggregatorService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = ServerError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move { Ok(into_boxed(router.route(req).await)) })
    }
}
