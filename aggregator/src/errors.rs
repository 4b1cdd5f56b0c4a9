use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::relation::Source;

/// Result type alias for aggregator operations
pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;

/// Errors surfaced by handlers, paginator and relation resolver.
///
/// These are always turned into a response by the error normalizer in
/// [`crate::error_report`]; nothing below the router writes a response itself.
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// Bad caller input. Raised before any upstream request is made.
    #[error("Invalid query parameters.")]
    Validation { solution: String },

    /// Input was valid but no parent record matched it.
    #[error("No record in {source_name} with id {id}")]
    NotFound { source_name: String, id: String },

    /// One or more upstream sources failed or returned a malformed payload.
    #[error("Failed to fetch data from external API.")]
    UpstreamFailed(SourceFailures),
}

impl AggregatorError {
    pub fn validation(solution: impl Into<String>) -> Self {
        AggregatorError::Validation {
            solution: solution.into(),
        }
    }

    /// Stable name of the error class, shown to clients in every environment.
    pub fn kind(&self) -> &'static str {
        match self {
            AggregatorError::Validation { .. } => "ValidationError",
            AggregatorError::NotFound { .. } => "NotFoundError",
            AggregatorError::UpstreamFailed(_) => "AggregateFetchError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AggregatorError::Validation { .. } => StatusCode::BAD_REQUEST,
            AggregatorError::NotFound { .. } => StatusCode::NOT_FOUND,
            AggregatorError::UpstreamFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Guidance for the caller, without the error id.
    pub fn solution(&self) -> &str {
        match self {
            AggregatorError::Validation { solution } => solution,
            AggregatorError::NotFound { .. } => "Try a different id.",
            AggregatorError::UpstreamFailed(_) => "Try again later or contact support.",
        }
    }

    /// Per-source failure detail, only present for upstream failures.
    pub fn source_failures(&self) -> Option<&SourceFailures> {
        match self {
            AggregatorError::UpstreamFailed(failures) => Some(failures),
            _ => None,
        }
    }
}

/// Failure detail for a single upstream source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceFailure {
    pub url: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Failures keyed by source name, in the order the sources were declared.
///
/// Sources that succeeded never appear here.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourceFailures(IndexMap<String, SourceFailure>);

impl SourceFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, source: &Source, error: &crate::fetch::FetchError) {
        self.0.insert(
            source.name.clone(),
            SourceFailure {
                url: source.url.to_string(),
                error: error.to_string(),
                code: error.code().map(str::to_string),
            },
        );
    }

    pub fn get(&self, source_name: &str) -> Option<&SourceFailure> {
        self.0.get(source_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceFailure)> {
        self.0.iter()
    }

    /// The first transport code reported by any failed source.
    pub fn first_code(&self) -> Option<&str> {
        self.0.values().find_map(|failure| failure.code.as_deref())
    }

    pub fn into_error(self) -> AggregatorError {
        AggregatorError::UpstreamFailed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use url::Url;

    fn source(name: &str) -> Source {
        Source::new(name, Url::parse(&format!("http://upstream.test/{name}")).unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AggregatorError::validation("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AggregatorError::NotFound {
                source_name: "users".into(),
                id: "9".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SourceFailures::new().into_error().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_source_failures_keep_declaration_order() {
        let mut failures = SourceFailures::new();
        failures.record(&source("users"), &FetchError::Shape { found: "object" });
        failures.record(
            &source("posts"),
            &FetchError::Transport {
                message: "connection refused".into(),
                code: Some("ECONNREFUSED".into()),
            },
        );

        let names: Vec<&String> = failures.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["users", "posts"]);
        assert_eq!(failures.first_code(), Some("ECONNREFUSED"));

        let json = serde_json::to_value(&failures).unwrap();
        assert_eq!(json["users"]["url"], "http://upstream.test/users");
        assert_eq!(
            json["users"]["error"],
            "expected a sequence of records, got object"
        );
        assert!(json["users"].get("code").is_none());
        assert_eq!(json["posts"]["code"], "ECONNREFUSED");
    }
}
