use crate::api::build_handler;
use crate::config::{Config, Environment};
use crate::error_report::{ErrorContext, normalize};
use crate::fetch::Fetch;
use crate::handler::{Handler, Query};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use shared::http::{json_response, text_response};
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

const VERSION_INFO: VersionInfo = VersionInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

/// Router that dispatches `GET` requests to the handler configured for their path
#[derive(Clone)]
pub struct Router {
    routes: Arc<IndexMap<String, Arc<dyn Handler>>>,
    environment: Environment,
}

impl Router {
    /// Creates a new router with the given routes
    pub fn new(
        routes: impl IntoIterator<Item = (String, Arc<dyn Handler>)>,
        environment: Environment,
    ) -> Self {
        Self {
            routes: Arc::new(routes.into_iter().collect()),
            environment,
        }
    }

    /// Creates a router with one handler per configured route, all fetching through `fetcher`
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetch>) -> Self {
        Self::new(
            config.routes.iter().map(|route| {
                (
                    route.path.clone(),
                    build_handler(&route.action, fetcher.clone()),
                )
            }),
            config.environment,
        )
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// Handler errors go through the error normalizer; this never fails.
    pub async fn route<B>(&self, req: Request<B>) -> Response<Bytes> {
        let (parts, _) = req.into_parts();

        if parts.method != Method::GET {
            tracing::warn!(method = %parts.method, path = %parts.uri.path(), "Unsupported method");
            return Self::handle_no_route();
        }

        let path = normalize_path(parts.uri.path());
        match path {
            "/ping" => return text_response(StatusCode::OK, "pong!"),
            "/version" => return json_response(StatusCode::OK, &VERSION_INFO),
            _ => {}
        }

        let Some(handler) = self.routes.get(path) else {
            tracing::warn!(path = %path, "No route matched");
            return Self::handle_no_route();
        };

        let query = Query::from_uri(&parts.uri);
        tracing::debug!(path = %path, handler = handler.name(), "Matched route");

        match handler.handle(&query).await {
            Ok(envelope) => json_response(StatusCode::OK, &envelope),
            Err(error) => {
                let context = ErrorContext {
                    route: path.to_string(),
                    params: query.to_params(),
                };
                normalize(&context, &error, self.environment).into_response()
            }
        }
    }

    /// Handles an unmatched request
    fn handle_no_route() -> Response<Bytes> {
        json_response(
            StatusCode::NOT_FOUND,
            &json!({"message": "Route not found"}),
        )
    }
}

/// Ignores a trailing slash, except on the root path.
fn normalize_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}
