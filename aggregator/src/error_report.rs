//! Turns an [`AggregatorError`] into a log record and a client response.
//!
//! The full record is always logged. Clients in production only get the
//! error kind, the solution and an error id that links back to the log entry.

use http::{Response, StatusCode};
use hyper::body::Bytes;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as _;

use crate::config::Environment;
use crate::envelope::Envelope;
use crate::errors::{AggregatorError, SourceFailures};
use crate::metrics_defs::REQUEST_ERROR;

const ERROR_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ERROR_ID_LEN: usize = 7;

/// Where the error happened.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorContext {
    pub route: String,
    pub params: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_kind: &'static str,
    pub solution: String,
    pub error_id: String,
    /// Omitted in production.
    #[serde(flatten)]
    pub details: Option<ErrorDetails>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub route: String,
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<SourceFailures>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedError {
    pub status: StatusCode,
    /// What was logged; always carries details.
    pub record: ErrorBody,
    /// What the client receives.
    pub response: ErrorBody,
}

impl NormalizedError {
    pub fn into_response(self) -> Response<Bytes> {
        shared::http::json_response(self.status, &Envelope::Error(self.response))
    }
}

pub fn generate_error_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ERROR_ID_LEN)
        .map(|_| ERROR_ID_ALPHABET[rng.gen_range(0..ERROR_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn normalize(
    context: &ErrorContext,
    error: &AggregatorError,
    environment: Environment,
) -> NormalizedError {
    let status = error.status();
    let error_id = generate_error_id();

    let failures = error.source_failures();
    let details = ErrorDetails {
        message: error.to_string(),
        trace: source_chain(error),
        code: failures
            .and_then(SourceFailures::first_code)
            .map(str::to_string),
        route: context.route.clone(),
        params: context.params.clone(),
        extra: failures.cloned(),
    };

    let record = ErrorBody {
        error_kind: error.kind(),
        solution: format!("{} (Error ID: {error_id})", error.solution()),
        error_id,
        details: Some(details),
    };

    log_record(status, &record);
    shared::counter!(REQUEST_ERROR, "kind" => error.kind()).increment(1);

    let response = if environment.is_production() {
        ErrorBody {
            details: None,
            ..record.clone()
        }
    } else {
        record.clone()
    };

    NormalizedError {
        status,
        record,
        response,
    }
}

fn source_chain(error: &AggregatorError) -> Vec<String> {
    let mut chain = Vec::new();
    let mut source = error.source();
    while let Some(inner) = source {
        chain.push(inner.to_string());
        source = inner.source();
    }
    chain
}

fn log_record(status: StatusCode, record: &ErrorBody) {
    let serialized = serde_json::to_string(record)
        .unwrap_or_else(|e| format!("<unserializable error record: {e}>"));
    let route = record
        .details
        .as_ref()
        .map(|details| details.route.as_str())
        .unwrap_or_default();

    if status.is_server_error() {
        tracing::error!(
            error_id = %record.error_id,
            kind = record.error_kind,
            status = status.as_u16(),
            route,
            record = %serialized,
            "Request failed"
        );
    } else {
        tracing::warn!(
            error_id = %record.error_id,
            kind = record.error_kind,
            status = status.as_u16(),
            route,
            record = %serialized,
            "Request rejected"
        );
    }
}
